//! Inference boundary: hand prepared uploads to an opaque multimodal service.
//!
//! The crate deliberately ships no client. [`InferenceService`] is the seam:
//! callers implement it over whatever transport they use, and
//! [`analyze_upload`] composes it with [`UploadProcessor`] so the service
//! only ever sees prepared inputs. Text extracted from a PDF travels inline
//! in the request; images and audio travel as the backend path of the
//! processed artifact, which is where the service is expected to read from.

use crate::error::ProcessError;
use crate::outcome::{ProcessingOutcome, UploadArtifacts};
use crate::process::{UploadPayload, UploadProcessor};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

// ── Service contract ──────────────────────────────────────────────────────

/// A single prepared request to the multimodal service.
#[derive(Debug)]
pub enum InferenceRequest<'a> {
    /// Self-contained textual request; extracted document text is already
    /// inlined after the caller's instruction.
    Instruction { text: String },
    /// Instruction plus the backend path of a processed artifact (JPEG or
    /// 16 kHz mono WAV) for the service to read.
    Artifact {
        path: &'a Path,
        instruction: &'a str,
    },
}

/// What the service answered.
#[derive(Debug, Clone, PartialEq)]
pub enum InferenceReply {
    Text(String),
    Structured(serde_json::Value),
}

/// Failure reported by an [`InferenceService`] implementation.
#[derive(Debug, Clone, Error)]
#[error("Inference request failed: {message}")]
pub struct InferenceError {
    message: String,
}

impl InferenceError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// The opaque multimodal service.
///
/// Implementations own transport, authentication, and retries. The
/// processing pipeline never constructs one; it only forwards prepared
/// requests through this trait.
pub trait InferenceService {
    fn infer(&self, request: InferenceRequest<'_>) -> Result<InferenceReply, InferenceError>;
}

/// Explicit configuration for whoever builds a real service client.
///
/// The key is carried as a plain value handed to the client constructor;
/// nothing in this crate reads it and no process-global state is mutated.
#[derive(Debug, Clone)]
pub struct InferenceConfig {
    pub api_key: String,
}

impl InferenceConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
        }
    }
}

// ── Calling layer ─────────────────────────────────────────────────────────

/// A processed upload together with the service's answer to it.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub outcome: ProcessingOutcome,
    pub reply: InferenceReply,
}

/// Why [`analyze_upload`] failed.
#[derive(Debug, Clone, Error)]
pub enum AnalysisError {
    /// Processing failed; the service was never called.
    #[error("Upload processing failed: {0}")]
    Process(#[from] ProcessError),
    /// Processing succeeded but the service rejected the request.
    #[error("{0}")]
    Inference(#[from] InferenceError),
}

/// Process one upload, then ask the service about the result.
///
/// PDF uploads forward their extracted text inline; image and audio uploads
/// forward the backend path of the processed artifact. A processing
/// `Failure` short-circuits before the service sees anything.
pub fn analyze_upload(
    processor: &UploadProcessor,
    payload: &UploadPayload,
    instruction: &str,
    service: &dyn InferenceService,
) -> Result<Analysis, AnalysisError> {
    let outcome = processor.process(payload);
    let artifacts = match &outcome {
        ProcessingOutcome::Success { artifacts, .. } => artifacts,
        ProcessingOutcome::Failure { error, .. } => return Err(error.clone().into()),
    };

    let reply = match artifacts {
        UploadArtifacts::Pdf { text_content, .. } | UploadArtifacts::Text { text_content, .. } => {
            debug!("Forwarding inline text request for '{}'", payload.filename());
            service.infer(InferenceRequest::Instruction {
                text: document_request(instruction, text_content),
            })?
        }
        UploadArtifacts::Image { processed, .. } | UploadArtifacts::Audio { processed, .. } => {
            debug!(
                "Forwarding artifact request for '{}' ({})",
                payload.filename(),
                processed.backend.display()
            );
            service.infer(InferenceRequest::Artifact {
                path: &processed.backend,
                instruction,
            })?
        }
    };

    Ok(Analysis { outcome, reply })
}

/// Inline extracted document text after the instruction, blank-line
/// separated, so the service receives one self-contained prompt.
fn document_request(instruction: &str, text_content: &str) -> String {
    format!("{instruction}\n\n{text_content}")
}
