//! Upload orchestration: dispatch, transformation, persistence.
//!
//! [`UploadProcessor`] owns the artifact store and an injected set of
//! [`Capabilities`]. One call to [`UploadProcessor::process`] walks a payload
//! through decode → type-specific transform → persist and always lands on a
//! terminal [`ProcessingOutcome`] — stage errors are caught at this boundary
//! and folded into `Failure`, never propagated to the caller.
//!
//! Per invocation there is no retry and no rollback: if persistence fails
//! after a successful transform, the invocation is a `Failure` and the
//! transform's output is discarded.

use crate::config::{MediaType, ProcessingConfig};
use crate::error::ProcessError;
use crate::outcome::{ProcessingOutcome, UploadArtifacts};
use crate::pipeline::decode::decode_base64;
use crate::store::{ArtifactCategory, ArtifactStore, NamingKey, Variant};
use std::time::Instant;
use tracing::{info, warn};

#[cfg(feature = "audio")]
use crate::pipeline::audio::AudioPreprocessor;
#[cfg(feature = "image")]
use crate::pipeline::image::ImagePreprocessor;
#[cfg(feature = "pdf")]
use crate::pipeline::pdf::PdfExtractor;

// ── Payload ───────────────────────────────────────────────────────────────

/// One upload exactly as received: base64 content, declared media type, and
/// the original filename. Immutable once constructed.
#[derive(Debug, Clone)]
pub struct UploadPayload {
    content: String,
    media_type: MediaType,
    filename: String,
}

impl UploadPayload {
    pub fn new(
        content: impl Into<String>,
        media_type: MediaType,
        filename: impl Into<String>,
    ) -> Self {
        Self {
            content: content.into(),
            media_type,
            filename: filename.into(),
        }
    }

    /// Construct from a raw media tag (`"pdf"`, `"image/png"`, `"voice"`, ...).
    ///
    /// Unknown tags fail here, before any processing starts.
    pub fn from_tag(
        content: impl Into<String>,
        media_tag: &str,
        filename: impl Into<String>,
    ) -> Result<Self, ProcessError> {
        let media_type: MediaType = media_tag.parse()?;
        Ok(Self::new(content, media_type, filename))
    }

    /// Base64 content as submitted.
    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn media_type(&self) -> MediaType {
        self.media_type
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }
}

// ── Capabilities ──────────────────────────────────────────────────────────

/// The optional media processors available to a processor instance.
///
/// Resolved once at startup with [`Capabilities::detect`] (everything the
/// build carries) or assembled explicitly, e.g. [`Capabilities::none`] plus
/// the `with_*` setters, to pin behaviour down in tests. A missing
/// capability surfaces as [`ProcessError::UnsupportedMedia`] at dispatch
/// time, before any decoding.
#[derive(Debug, Clone, Copy, Default)]
pub struct Capabilities {
    #[cfg(feature = "pdf")]
    pdf: Option<PdfExtractor>,
    #[cfg(feature = "image")]
    image: Option<ImagePreprocessor>,
    #[cfg(feature = "audio")]
    audio: Option<AudioPreprocessor>,
}

impl Capabilities {
    /// Every capability compiled into this build.
    pub fn detect() -> Self {
        Self {
            #[cfg(feature = "pdf")]
            pdf: Some(PdfExtractor::new()),
            #[cfg(feature = "image")]
            image: Some(ImagePreprocessor::new()),
            #[cfg(feature = "audio")]
            audio: Some(AudioPreprocessor::new()),
        }
    }

    /// No capabilities at all; every media family is unsupported.
    pub fn none() -> Self {
        Self::default()
    }

    #[cfg(feature = "pdf")]
    pub fn with_pdf(mut self, extractor: PdfExtractor) -> Self {
        self.pdf = Some(extractor);
        self
    }

    #[cfg(feature = "image")]
    pub fn with_image(mut self, preprocessor: ImagePreprocessor) -> Self {
        self.image = Some(preprocessor);
        self
    }

    #[cfg(feature = "audio")]
    pub fn with_audio(mut self, preprocessor: AudioPreprocessor) -> Self {
        self.audio = Some(preprocessor);
        self
    }
}

fn unsupported(media_type: MediaType) -> ProcessError {
    ProcessError::UnsupportedMedia {
        detail: format!("no processor available for media type '{media_type}'"),
    }
}

// ── Processor ─────────────────────────────────────────────────────────────

/// Walks uploads through decode → transform → persist.
#[derive(Debug, Clone)]
pub struct UploadProcessor {
    store: ArtifactStore,
    capabilities: Capabilities,
}

impl UploadProcessor {
    /// Build a processor carrying every capability of this build.
    ///
    /// Opens the artifact store under `config.upload_root`, creating the
    /// directory layout; that is the only fallible part of construction.
    pub fn new(config: &ProcessingConfig) -> Result<Self, ProcessError> {
        Self::with_capabilities(config, Capabilities::detect())
    }

    /// Build with an explicit capability set.
    pub fn with_capabilities(
        config: &ProcessingConfig,
        capabilities: Capabilities,
    ) -> Result<Self, ProcessError> {
        let store = ArtifactStore::open(&config.upload_root)?;
        Ok(Self {
            store,
            capabilities,
        })
    }

    /// Process one upload to its terminal outcome.
    ///
    /// Never returns `Err`; every stage failure becomes a
    /// [`ProcessingOutcome::Failure`] carrying the originating error.
    pub fn process(&self, payload: &UploadPayload) -> ProcessingOutcome {
        let started = Instant::now();
        info!(
            "Processing {} upload '{}'",
            payload.media_type(),
            payload.filename()
        );

        let run = match payload.media_type() {
            MediaType::Pdf => self.run_pdf(payload),
            MediaType::Image => self.run_image(payload),
            MediaType::Audio => self.run_audio(payload),
        };

        match run {
            Ok(artifacts) => {
                info!(
                    "Upload '{}' processed in {:?}",
                    payload.filename(),
                    started.elapsed()
                );
                ProcessingOutcome::Success {
                    filename: payload.filename().to_owned(),
                    artifacts,
                }
            }
            Err(error) => {
                warn!("Upload '{}' failed: {}", payload.filename(), error);
                ProcessingOutcome::Failure {
                    filename: payload.filename().to_owned(),
                    error,
                }
            }
        }
    }

    /// Persist plain text without transformation.
    ///
    /// Text is not a [`MediaType`]; it skips decode and transform entirely
    /// and lands in the `text/` trees under the usual naming scheme.
    pub fn store_text(&self, text: &str, filename: &str) -> ProcessingOutcome {
        let key = NamingKey::for_upload(filename);
        match self
            .store
            .put_text(ArtifactCategory::Text, &key.file_name("txt"), text)
        {
            Ok(pair) => ProcessingOutcome::Success {
                filename: filename.to_owned(),
                artifacts: UploadArtifacts::Text {
                    text_content: text.to_owned(),
                    text: pair,
                },
            },
            Err(error) => {
                warn!("Text upload '{}' failed: {}", filename, error);
                ProcessingOutcome::Failure {
                    filename: filename.to_owned(),
                    error,
                }
            }
        }
    }

    #[cfg(feature = "pdf")]
    fn run_pdf(&self, payload: &UploadPayload) -> Result<UploadArtifacts, ProcessError> {
        let extractor = self
            .capabilities
            .pdf
            .ok_or_else(|| unsupported(MediaType::Pdf))?;
        let bytes = decode_base64(payload.content())?;
        let text_content = extractor.extract_text(&bytes)?;

        let key = NamingKey::for_upload(payload.filename());
        let text =
            self.store
                .put_text(ArtifactCategory::Text, &key.file_name("txt"), &text_content)?;
        let document = self
            .store
            .put_bytes(ArtifactCategory::Pdf, &key.file_name("pdf"), &bytes)?;
        Ok(UploadArtifacts::Pdf {
            text_content,
            text,
            document,
        })
    }

    #[cfg(not(feature = "pdf"))]
    fn run_pdf(&self, _payload: &UploadPayload) -> Result<UploadArtifacts, ProcessError> {
        Err(unsupported(MediaType::Pdf))
    }

    #[cfg(feature = "image")]
    fn run_image(&self, payload: &UploadPayload) -> Result<UploadArtifacts, ProcessError> {
        let preprocessor = self
            .capabilities
            .image
            .ok_or_else(|| unsupported(MediaType::Image))?;
        let bytes = decode_base64(payload.content())?;
        let processed_bytes = preprocessor.preprocess(&bytes)?;

        let key = NamingKey::for_upload(payload.filename());
        let original = self.store.put_bytes(
            ArtifactCategory::Images,
            &key.variant_file_name(Variant::Original, "jpg"),
            &bytes,
        )?;
        let processed = self.store.put_bytes(
            ArtifactCategory::Images,
            &key.variant_file_name(Variant::Processed, "jpg"),
            &processed_bytes,
        )?;
        Ok(UploadArtifacts::Image {
            original,
            processed,
        })
    }

    #[cfg(not(feature = "image"))]
    fn run_image(&self, _payload: &UploadPayload) -> Result<UploadArtifacts, ProcessError> {
        Err(unsupported(MediaType::Image))
    }

    #[cfg(feature = "audio")]
    fn run_audio(&self, payload: &UploadPayload) -> Result<UploadArtifacts, ProcessError> {
        let preprocessor = self
            .capabilities
            .audio
            .ok_or_else(|| unsupported(MediaType::Audio))?;
        let bytes = decode_base64(payload.content())?;
        let processed_bytes = preprocessor.preprocess(&bytes, payload.filename())?;

        let key = NamingKey::for_upload(payload.filename());
        let original = self.store.put_bytes(
            ArtifactCategory::Audio,
            &key.variant_file_name(Variant::Original, "wav"),
            &bytes,
        )?;
        let processed = self.store.put_bytes(
            ArtifactCategory::Audio,
            &key.variant_file_name(Variant::Processed, "wav"),
            &processed_bytes,
        )?;
        Ok(UploadArtifacts::Audio {
            original,
            processed,
        })
    }

    #[cfg(not(feature = "audio"))]
    fn run_audio(&self, _payload: &UploadPayload) -> Result<UploadArtifacts, ProcessError> {
        Err(unsupported(MediaType::Audio))
    }
}
