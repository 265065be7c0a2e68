//! The media normalisation pipeline, one stage per submodule.
//!
//! Data flow for a single invocation:
//!
//! ```text
//! base64 payload
//!       │  decode
//!       ▼
//!   raw bytes ──┬─ pdf:   page text, joined and trimmed      → String
//!               ├─ image: resize → enhance → blur → JPEG     → Vec<u8>
//!               └─ audio: normalise → pre-emphasis → 16 kHz  → Vec<u8>
//! ```
//!
//! 1. [`decode`] — strict base64 to raw bytes; the only input-validation
//!    boundary in the crate.
//! 2. [`pdf`] — text extraction in ascending page order (feature `pdf`).
//! 3. [`image`] — deterministic visual normalisation (feature `image`).
//! 4. [`audio`] — deterministic waveform normalisation (feature `audio`).
//!
//! Every stage is a function from input bytes to output bytes or text with
//! no filesystem side effects beyond scoped scratch files. Persistence lives
//! in [`crate::store`], dispatch in [`crate::process`].

pub mod decode;

#[cfg(feature = "audio")]
pub mod audio;
#[cfg(feature = "image")]
pub mod image;
#[cfg(feature = "pdf")]
pub mod pdf;
