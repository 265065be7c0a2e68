//! Processing outcomes and the flat JSON report.
//!
//! Two views of the same result serve two audiences:
//!
//! * [`ProcessingOutcome`] — the typed view for Rust callers: a `Success`
//!   carries the artifact paths grouped by media family, a `Failure` carries
//!   the originating [`ProcessError`]. Exactly one outcome per invocation,
//!   never a partial success.
//!
//! * [`UploadReport`] — the flat, serialisable view emitted over the JSON
//!   boundary (CLI stdout, upstream web handlers). Fields that do not apply
//!   to a given media family are omitted from the serialised form entirely.

use crate::error::ProcessError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Backend and frontend copies of one persisted artifact.
///
/// The two files hold identical content and are written by a single store
/// primitive, so a pair in hand means both halves exist. A half-written pair
/// never escapes as a value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactPair {
    /// Path under `<root>/backend/`.
    pub backend: PathBuf,
    /// Path under `<root>/frontend/`.
    pub frontend: PathBuf,
}

/// Everything a successful invocation persisted, grouped by media family.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum UploadArtifacts {
    /// Extracted text plus the original document bytes.
    Pdf {
        /// Page text joined with newlines and trimmed. May legally be empty
        /// (scanned documents); emptiness is not a failure.
        text_content: String,
        text: ArtifactPair,
        document: ArtifactPair,
    },
    /// Untouched original bytes plus the normalised JPEG.
    Image {
        original: ArtifactPair,
        processed: ArtifactPair,
    },
    /// Untouched original bytes plus the normalised 16 kHz WAV.
    Audio {
        original: ArtifactPair,
        processed: ArtifactPair,
    },
    /// Plain text stored verbatim, no transformation.
    Text {
        text_content: String,
        text: ArtifactPair,
    },
}

/// Result of one pipeline invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ProcessingOutcome {
    Success {
        /// Original filename as submitted.
        filename: String,
        artifacts: UploadArtifacts,
    },
    Failure {
        filename: String,
        error: ProcessError,
    },
}

impl ProcessingOutcome {
    pub fn success(&self) -> bool {
        matches!(self, ProcessingOutcome::Success { .. })
    }

    pub fn filename(&self) -> &str {
        match self {
            ProcessingOutcome::Success { filename, .. } => filename,
            ProcessingOutcome::Failure { filename, .. } => filename,
        }
    }

    /// The originating error, if this outcome is a failure.
    pub fn error(&self) -> Option<&ProcessError> {
        match self {
            ProcessingOutcome::Success { .. } => None,
            ProcessingOutcome::Failure { error, .. } => Some(error),
        }
    }

    /// The persisted artifacts, if this outcome is a success.
    pub fn artifacts(&self) -> Option<&UploadArtifacts> {
        match self {
            ProcessingOutcome::Success { artifacts, .. } => Some(artifacts),
            ProcessingOutcome::Failure { .. } => None,
        }
    }

    /// Flatten into the wire-format [`UploadReport`].
    pub fn report(&self) -> UploadReport {
        match self {
            ProcessingOutcome::Failure { filename, error } => UploadReport {
                success: false,
                error: Some(error.to_string()),
                filename: filename.clone(),
                ..UploadReport::default()
            },
            ProcessingOutcome::Success {
                filename,
                artifacts,
            } => {
                let mut report = UploadReport {
                    success: true,
                    filename: filename.clone(),
                    ..UploadReport::default()
                };
                match artifacts {
                    UploadArtifacts::Pdf {
                        text_content,
                        text,
                        document,
                    } => {
                        report.text_content = Some(text_content.clone());
                        report.backend_text_path = Some(display(&text.backend));
                        report.frontend_text_path = Some(display(&text.frontend));
                        report.backend_pdf_path = Some(display(&document.backend));
                        report.frontend_pdf_path = Some(display(&document.frontend));
                    }
                    UploadArtifacts::Image {
                        original,
                        processed,
                    }
                    | UploadArtifacts::Audio {
                        original,
                        processed,
                    } => {
                        report.backend_orig_path = Some(display(&original.backend));
                        report.frontend_orig_path = Some(display(&original.frontend));
                        report.backend_processed_path = Some(display(&processed.backend));
                        report.frontend_processed_path = Some(display(&processed.frontend));
                    }
                    UploadArtifacts::Text { text_content, text } => {
                        report.text_content = Some(text_content.clone());
                        report.backend_text_path = Some(display(&text.backend));
                        report.frontend_text_path = Some(display(&text.frontend));
                    }
                }
                report
            }
        }
    }
}

fn display(path: &Path) -> String {
    path.display().to_string()
}

/// Flat result schema for the JSON boundary.
///
/// `success` and `filename` are always present; `error` only on failure; the
/// remaining fields only where the media family produces them. Optional
/// fields serialise as absent keys, not `null`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UploadReport {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub filename: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend_text_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frontend_text_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend_pdf_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frontend_pdf_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend_orig_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frontend_orig_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend_processed_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frontend_processed_path: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(tag: &str) -> ArtifactPair {
        ArtifactPair {
            backend: PathBuf::from(format!("uploads/backend/{tag}")),
            frontend: PathBuf::from(format!("uploads/frontend/{tag}")),
        }
    }

    #[test]
    fn pdf_report_carries_text_and_both_pairs() {
        let outcome = ProcessingOutcome::Success {
            filename: "report.pdf".into(),
            artifacts: UploadArtifacts::Pdf {
                text_content: "hello".into(),
                text: pair("text/report_1.txt"),
                document: pair("pdf/report_1.pdf"),
            },
        };
        let report = outcome.report();
        assert!(report.success);
        assert_eq!(report.text_content.as_deref(), Some("hello"));
        assert_eq!(
            report.backend_pdf_path.as_deref(),
            Some("uploads/backend/pdf/report_1.pdf")
        );
        assert_eq!(
            report.frontend_text_path.as_deref(),
            Some("uploads/frontend/text/report_1.txt")
        );
        assert!(report.backend_orig_path.is_none());
    }

    #[test]
    fn image_report_carries_original_and_processed() {
        let outcome = ProcessingOutcome::Success {
            filename: "photo.png".into(),
            artifacts: UploadArtifacts::Image {
                original: pair("images/photo_1_original.jpg"),
                processed: pair("images/photo_1_processed.jpg"),
            },
        };
        let report = outcome.report();
        assert!(report.success);
        assert!(report.backend_processed_path.is_some());
        assert!(report.text_content.is_none());
        assert!(report.backend_pdf_path.is_none());
    }

    #[test]
    fn failure_report_has_error_and_nothing_else() {
        let outcome = ProcessingOutcome::Failure {
            filename: "bad.png".into(),
            error: ProcessError::Decode {
                detail: "invalid padding".into(),
            },
        };
        let report = outcome.report();
        assert!(!report.success);
        assert!(report.error.as_deref().unwrap().contains("invalid padding"));
        assert!(report.backend_orig_path.is_none());

        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"success\":false"));
        // Absent fields are omitted, not serialised as null.
        assert!(!json.contains("text_content"));
    }

    #[test]
    fn outcome_accessors() {
        let outcome = ProcessingOutcome::Failure {
            filename: "x.wav".into(),
            error: ProcessError::Io {
                detail: "disk full".into(),
            },
        };
        assert!(!outcome.success());
        assert_eq!(outcome.filename(), "x.wav");
        assert!(outcome.error().is_some());
        assert!(outcome.artifacts().is_none());
    }
}
