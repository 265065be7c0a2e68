//! # mediaprep
//!
//! Normalise PDF, image, and audio uploads for multimodal model input.
//!
//! ## Why this crate?
//!
//! Uploads arrive as base64 blobs in whatever shape the client had: PDFs with
//! their text locked inside the page tree, photos at phone resolution with
//! flat contrast, audio as 48 kHz stereo in any container a browser can
//! record. Multimodal services want none of that. This crate applies one
//! deterministic preparation pass per media family and persists both the
//! original and the prepared artifact into mirrored `backend`/`frontend`
//! trees, so the model always reads a canonical format and the UI can show
//! exactly what was kept.
//!
//! ## Pipeline Overview
//!
//! ```text
//! base64 upload
//!  │
//!  ├─ 1. Dispatch   declared media type checked against capabilities
//!  ├─ 2. Decode     strict base64 → raw bytes
//!  ├─ 3. Transform  pdf:   per-page text extraction
//!  │                image: downscale ≤ 1024 px, contrast ×1.2,
//!  │                       sharpen ×1.1, denoise, JPEG q85
//!  │                audio: decode + downmix, peak-normalise,
//!  │                       pre-emphasis, resample → 16 kHz 16-bit WAV
//!  └─ 4. Persist    original + prepared into backend/ and frontend/ trees
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mediaprep::{MediaType, ProcessingConfig, UploadPayload, UploadProcessor};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ProcessingConfig::builder().upload_root("uploads").build()?;
//!     let processor = UploadProcessor::new(&config)?;
//!
//!     let payload = UploadPayload::new("aGVsbG8=", MediaType::Image, "photo.png");
//!     let outcome = processor.process(&payload);
//!     println!("{}", serde_json::to_string_pretty(&outcome.report())?);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `pdf`   | on      | PDF text extraction (lopdf) |
//! | `image` | on      | Image preparation (image) |
//! | `audio` | on      | Audio preparation (symphonia + rubato + hound) |
//! | `cli`   | on      | Enables the `mediaprep` binary (clap + anyhow + tracing-subscriber) |
//!
//! A media family compiled out is still a valid request target: processing
//! such an upload yields an `UnsupportedMedia` failure rather than a compile
//! error. Library-only use:
//! ```toml
//! mediaprep = { version = "0.1", default-features = false, features = ["pdf"] }
//! ```
//!
//! ## Artifact Layout
//!
//! ```text
//! uploads/
//! ├── backend/          what the model reads
//! │   ├── pdf/
//! │   ├── images/
//! │   ├── audio/
//! │   └── text/
//! └── frontend/         what the UI shows, same four categories
//! ```
//!
//! Artifacts are named `{basename}_{timestamp}.{ext}`, with an `_original` /
//! `_processed` variant tag where both forms of one upload are kept. All
//! artifact paths of a single invocation share the same prefix.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod inference;
pub mod outcome;
pub mod pipeline;
pub mod process;
pub mod store;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConfigError, MediaType, ProcessingConfig, ProcessingConfigBuilder};
pub use error::{ErrorKind, ProcessError};
pub use inference::{
    analyze_upload, Analysis, AnalysisError, InferenceConfig, InferenceError, InferenceReply,
    InferenceRequest, InferenceService,
};
pub use outcome::{ArtifactPair, ProcessingOutcome, UploadArtifacts, UploadReport};
pub use process::{Capabilities, UploadPayload, UploadProcessor};
pub use store::{ArtifactCategory, ArtifactStore, NamingKey, Variant};

#[cfg(feature = "audio")]
pub use pipeline::audio::AudioPreprocessor;
#[cfg(feature = "image")]
pub use pipeline::image::ImagePreprocessor;
#[cfg(feature = "pdf")]
pub use pipeline::pdf::PdfExtractor;
