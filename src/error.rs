//! Error types for the mediaprep library.
//!
//! A single enum, [`ProcessError`], covers every fallible pipeline stage.
//! The orchestrator catches it at its boundary and folds it into a
//! [`crate::outcome::ProcessingOutcome::Failure`], so library callers always
//! receive a structured outcome — no stage error ever escapes `process()`.
//!
//! Variants carry `String` details instead of `#[source]` errors so the type
//! stays `Clone + Serialize + Deserialize` end to end (outcomes and reports
//! embed it).

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Any failure raised while decoding, transforming, or persisting an upload.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
pub enum ProcessError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The payload is not valid base64, or the decoded bytes are not a
    /// readable image/audio stream.
    #[error("Failed to decode input: {detail}")]
    Decode { detail: String },

    /// The declared media type has no matching processor, either because the
    /// tag is unknown or because the capability was not compiled in.
    #[error("Unsupported media: {detail}")]
    UnsupportedMedia { detail: String },

    // ── Content errors ────────────────────────────────────────────────────
    /// The container parsed but its content could not be transformed
    /// (corrupt or encrypted PDF, resampler failure).
    #[error("Failed to extract content: {detail}")]
    Extraction { detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Filesystem failure while staging or persisting an artifact.
    #[error("I/O error: {detail}")]
    Io { detail: String },
}

impl ProcessError {
    /// Coarse category tag, stable across message wording changes.
    ///
    /// Outcome consumers match on this instead of parsing `Display` text.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProcessError::Decode { .. } => ErrorKind::Decode,
            ProcessError::UnsupportedMedia { .. } => ErrorKind::UnsupportedMedia,
            ProcessError::Extraction { .. } => ErrorKind::Extraction,
            ProcessError::Io { .. } => ErrorKind::Io,
        }
    }
}

/// One tag per [`ProcessError`] variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Decode,
    UnsupportedMedia,
    Extraction,
    Io,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tag = match self {
            ErrorKind::Decode => "decode",
            ErrorKind::UnsupportedMedia => "unsupported_media",
            ErrorKind::Extraction => "extraction",
            ErrorKind::Io => "io",
        };
        f.write_str(tag)
    }
}

impl From<std::io::Error> for ProcessError {
    fn from(e: std::io::Error) -> Self {
        ProcessError::Io {
            detail: e.to_string(),
        }
    }
}

impl From<base64::DecodeError> for ProcessError {
    fn from(e: base64::DecodeError) -> Self {
        ProcessError::Decode {
            detail: e.to_string(),
        }
    }
}

#[cfg(feature = "pdf")]
impl From<lopdf::Error> for ProcessError {
    fn from(e: lopdf::Error) -> Self {
        ProcessError::Extraction {
            detail: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_display() {
        let e = ProcessError::Decode {
            detail: "invalid padding".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("decode"), "got: {msg}");
        assert!(msg.contains("invalid padding"), "got: {msg}");
    }

    #[test]
    fn unsupported_media_display() {
        let e = ProcessError::UnsupportedMedia {
            detail: "unrecognized media type 'webm'".into(),
        };
        assert!(e.to_string().contains("webm"));
    }

    #[test]
    fn kind_matches_variant() {
        let e = ProcessError::Io {
            detail: "disk full".into(),
        };
        assert_eq!(e.kind(), ErrorKind::Io);
        assert_eq!(e.kind().to_string(), "io");
    }

    #[test]
    fn io_error_converts_to_io_variant() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let e = ProcessError::from(io);
        assert_eq!(e.kind(), ErrorKind::Io);
        assert!(e.to_string().contains("denied"));
    }

    #[test]
    fn error_round_trips_through_json() {
        let e = ProcessError::Extraction {
            detail: "encrypted document".into(),
        };
        let json = serde_json::to_string(&e).unwrap();
        let back: ProcessError = serde_json::from_str(&json).unwrap();
        assert_eq!(back.kind(), ErrorKind::Extraction);
    }
}
