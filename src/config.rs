//! Configuration types for upload processing.
//!
//! Processor behaviour is controlled through [`ProcessingConfig`], built via
//! its [`ProcessingConfigBuilder`] or taken from
//! [`ProcessingConfig::default()`]. The media families themselves form the
//! closed [`MediaType`] enum: dispatch over it is an exhaustive `match`, and
//! an unrecognised tag is rejected when the payload is constructed, never
//! silently skipped at processing time.

use crate::error::ProcessError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// Configuration for [`crate::process::UploadProcessor`].
///
/// Built via [`ProcessingConfig::builder()`] or using
/// [`ProcessingConfig::default()`].
///
/// # Example
/// ```rust
/// use mediaprep::ProcessingConfig;
///
/// let config = ProcessingConfig::builder()
///     .upload_root("var/uploads")
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct ProcessingConfig {
    /// Root directory of the artifact store. Default: `uploads`.
    ///
    /// Both consumer trees live beneath it:
    /// `<upload_root>/backend/{pdf,images,audio,text}` and the same four
    /// subdirectories under `frontend`. The layout is created when the
    /// processor is constructed and re-ensured on every write, so a root on
    /// a fresh volume needs no manual setup.
    pub upload_root: PathBuf,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            upload_root: PathBuf::from("uploads"),
        }
    }
}

impl ProcessingConfig {
    /// Create a new builder for `ProcessingConfig`.
    pub fn builder() -> ProcessingConfigBuilder {
        ProcessingConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ProcessingConfig`].
#[derive(Debug)]
pub struct ProcessingConfigBuilder {
    config: ProcessingConfig,
}

impl ProcessingConfigBuilder {
    pub fn upload_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.config.upload_root = root.into();
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ProcessingConfig, ConfigError> {
        if self.config.upload_root.as_os_str().is_empty() {
            return Err(ConfigError("upload_root must not be empty".into()));
        }
        Ok(self.config)
    }
}

/// Builder validation failure.
///
/// Distinct from [`ProcessError`]: a bad configuration is a caller bug caught
/// before any upload is touched, so it never appears inside a processing
/// outcome.
#[derive(Debug, Clone, Error)]
#[error("Invalid configuration: {0}")]
pub struct ConfigError(pub String);

// ── Enums ────────────────────────────────────────────────────────────────

/// The closed set of media families the pipeline knows how to process.
///
/// Parsing accepts the aliases upload clients actually send (bare tags, MIME
/// types, a few container names) and maps them onto these three variants.
/// Anything else fails with [`ProcessError::UnsupportedMedia`] at parse time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Pdf,
    Image,
    Audio,
}

impl MediaType {
    /// Canonical lowercase tag, as used in logs and directory names.
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Pdf => "pdf",
            MediaType::Image => "image",
            MediaType::Audio => "audio",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaType {
    type Err = ProcessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim().to_ascii_lowercase();
        match tag.as_str() {
            "pdf" | "application/pdf" => Ok(MediaType::Pdf),
            "image" => Ok(MediaType::Image),
            "audio" | "voice" | "wav" | "mp3" | "m4a" | "ogg" => Ok(MediaType::Audio),
            t if t.starts_with("image/") => Ok(MediaType::Image),
            t if t.starts_with("audio/") => Ok(MediaType::Audio),
            _ => Err(ProcessError::UnsupportedMedia {
                detail: format!(
                    "unrecognized media type '{s}' (expected pdf, image, audio, or a matching MIME type)"
                ),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn default_upload_root() {
        let config = ProcessingConfig::default();
        assert_eq!(config.upload_root, PathBuf::from("uploads"));
    }

    #[test]
    fn builder_overrides_root() {
        let config = ProcessingConfig::builder()
            .upload_root("/tmp/artifacts")
            .build()
            .unwrap();
        assert_eq!(config.upload_root, PathBuf::from("/tmp/artifacts"));
    }

    #[test]
    fn empty_root_rejected() {
        let result = ProcessingConfig::builder().upload_root("").build();
        assert!(result.is_err());
    }

    #[test]
    fn media_type_canonical_tags() {
        assert_eq!("pdf".parse::<MediaType>().unwrap(), MediaType::Pdf);
        assert_eq!("image".parse::<MediaType>().unwrap(), MediaType::Image);
        assert_eq!("audio".parse::<MediaType>().unwrap(), MediaType::Audio);
    }

    #[test]
    fn media_type_aliases() {
        assert_eq!(
            "application/pdf".parse::<MediaType>().unwrap(),
            MediaType::Pdf
        );
        assert_eq!("image/png".parse::<MediaType>().unwrap(), MediaType::Image);
        assert_eq!("IMAGE/JPEG".parse::<MediaType>().unwrap(), MediaType::Image);
        assert_eq!("voice".parse::<MediaType>().unwrap(), MediaType::Audio);
        assert_eq!("audio/mpeg".parse::<MediaType>().unwrap(), MediaType::Audio);
        assert_eq!("wav".parse::<MediaType>().unwrap(), MediaType::Audio);
        assert_eq!(" mp3 ".parse::<MediaType>().unwrap(), MediaType::Audio);
    }

    #[test]
    fn unknown_tag_rejected_at_parse_time() {
        let err = "webm".parse::<MediaType>().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedMedia);
        assert!(err.to_string().contains("webm"));
    }

    #[test]
    fn display_matches_as_str() {
        assert_eq!(MediaType::Audio.to_string(), "audio");
    }
}
