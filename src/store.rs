//! Dual-tree artifact persistence.
//!
//! Every artifact is written twice, once under `<root>/backend/` and once
//! under `<root>/frontend/`, because two independent consumers read the same
//! files. The duplication is deliberate and enforced here: [`ArtifactStore`]
//! is the only component that writes artifacts, and its primitives return an
//! [`ArtifactPair`] or an error — a single-sided path never escapes, even
//! when one of the two writes nominally succeeded.
//!
//! File names come from [`NamingKey`], which captures the upload's basename
//! and a Unix timestamp once per invocation so every artifact of that
//! invocation shares one `{basename}_{timestamp}` prefix. Names are
//! append-only: a new invocation never overwrites an older file.

use crate::error::ProcessError;
use crate::outcome::ArtifactPair;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

/// Subdirectory an artifact lands in, identical under both trees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactCategory {
    Pdf,
    Images,
    Audio,
    Text,
}

impl ArtifactCategory {
    /// Every category, in tree-creation order.
    pub const ALL: [ArtifactCategory; 4] = [
        ArtifactCategory::Pdf,
        ArtifactCategory::Images,
        ArtifactCategory::Audio,
        ArtifactCategory::Text,
    ];

    /// On-disk directory name.
    pub fn dir_name(&self) -> &'static str {
        match self {
            ArtifactCategory::Pdf => "pdf",
            ArtifactCategory::Images => "images",
            ArtifactCategory::Audio => "audio",
            ArtifactCategory::Text => "text",
        }
    }
}

/// Writes artifacts to the backend and frontend trees.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    backend_root: PathBuf,
    frontend_root: PathBuf,
}

impl ArtifactStore {
    /// Open (and lay out) a store rooted at `root`.
    ///
    /// Creates `<root>/{backend,frontend}/{pdf,images,audio,text}/` eagerly.
    /// Safe to call repeatedly and from concurrent processes; directory
    /// creation is idempotent.
    pub fn open(root: impl AsRef<Path>) -> Result<Self, ProcessError> {
        let root = root.as_ref();
        let store = Self {
            backend_root: root.join("backend"),
            frontend_root: root.join("frontend"),
        };
        for category in ArtifactCategory::ALL {
            fs::create_dir_all(store.backend_dir(category))?;
            fs::create_dir_all(store.frontend_dir(category))?;
        }
        debug!("Artifact store ready at {}", root.display());
        Ok(store)
    }

    /// Write `bytes` under `category` in both trees.
    ///
    /// Backend first, then frontend; any failure returns
    /// [`ProcessError::Io`] and no pair.
    pub fn put_bytes(
        &self,
        category: ArtifactCategory,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<ArtifactPair, ProcessError> {
        let backend_dir = self.backend_dir(category);
        let frontend_dir = self.frontend_dir(category);
        fs::create_dir_all(&backend_dir)?;
        fs::create_dir_all(&frontend_dir)?;

        let backend = backend_dir.join(file_name);
        let frontend = frontend_dir.join(file_name);
        fs::write(&backend, bytes)?;
        fs::write(&frontend, bytes)?;
        debug!(
            "Persisted {} ({} bytes) to {}/ in both trees",
            file_name,
            bytes.len(),
            category.dir_name()
        );
        Ok(ArtifactPair { backend, frontend })
    }

    /// Write `text` under `category` in both trees.
    pub fn put_text(
        &self,
        category: ArtifactCategory,
        file_name: &str,
        text: &str,
    ) -> Result<ArtifactPair, ProcessError> {
        self.put_bytes(category, file_name, text.as_bytes())
    }

    fn backend_dir(&self, category: ArtifactCategory) -> PathBuf {
        self.backend_root.join(category.dir_name())
    }

    fn frontend_dir(&self, category: ArtifactCategory) -> PathBuf {
        self.frontend_root.join(category.dir_name())
    }
}

// ── Naming ────────────────────────────────────────────────────────────────

/// Distinguishes the untouched upload from its normalised sibling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    Original,
    Processed,
}

impl Variant {
    pub fn as_str(&self) -> &'static str {
        match self {
            Variant::Original => "original",
            Variant::Processed => "processed",
        }
    }
}

/// The `{basename}_{timestamp}` prefix shared by all artifacts of one
/// invocation.
///
/// The timestamp is captured exactly once, when the key is created, so the
/// text, document, original, and processed files of a single upload always
/// sort and group together.
#[derive(Debug, Clone)]
pub struct NamingKey {
    stem: String,
    timestamp: u64,
}

impl NamingKey {
    /// Derive a key from the submitted filename, capturing the current Unix
    /// timestamp.
    ///
    /// Only the final path component's stem is kept; an empty or unusable
    /// stem falls back to `"upload"`.
    pub fn for_upload(filename: &str) -> Self {
        let stem = Path::new(filename)
            .file_stem()
            .and_then(|s| s.to_str())
            .map(str::to_owned)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "upload".to_owned());
        Self {
            stem,
            timestamp: unix_timestamp(),
        }
    }

    /// `{basename}_{timestamp}.{ext}` — for artifacts without a variant
    /// suffix (PDF text, PDF bytes, plain text).
    pub fn file_name(&self, ext: &str) -> String {
        format!("{}_{}.{}", self.stem, self.timestamp, ext)
    }

    /// `{basename}_{timestamp}_{variant}.{ext}` — for original/processed
    /// siblings (image, audio).
    pub fn variant_file_name(&self, variant: Variant, ext: &str) -> String {
        format!("{}_{}_{}.{}", self.stem, self.timestamp, variant.as_str(), ext)
    }

    /// The shared `{basename}_{timestamp}` prefix.
    pub fn prefix(&self) -> String {
        format!("{}_{}", self.stem, self.timestamp)
    }
}

fn unix_timestamp() -> u64 {
    // A clock before 1970 yields 0 rather than a panic.
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn open_creates_full_layout() {
        let root = TempDir::new().unwrap();
        ArtifactStore::open(root.path()).unwrap();
        for tree in ["backend", "frontend"] {
            for dir in ["pdf", "images", "audio", "text"] {
                assert!(
                    root.path().join(tree).join(dir).is_dir(),
                    "missing {tree}/{dir}"
                );
            }
        }
    }

    #[test]
    fn open_is_idempotent() {
        let root = TempDir::new().unwrap();
        ArtifactStore::open(root.path()).unwrap();
        ArtifactStore::open(root.path()).unwrap();
    }

    #[test]
    fn put_bytes_writes_identical_pair() {
        let root = TempDir::new().unwrap();
        let store = ArtifactStore::open(root.path()).unwrap();
        let pair = store
            .put_bytes(ArtifactCategory::Images, "x_1_original.jpg", b"\xff\xd8jpeg")
            .unwrap();
        assert_eq!(
            std::fs::read(&pair.backend).unwrap(),
            std::fs::read(&pair.frontend).unwrap()
        );
        assert!(pair.backend.to_string_lossy().contains("backend/images"));
        assert!(pair.frontend.to_string_lossy().contains("frontend/images"));
    }

    #[test]
    fn put_text_writes_identical_pair() {
        let root = TempDir::new().unwrap();
        let store = ArtifactStore::open(root.path()).unwrap();
        let pair = store
            .put_text(ArtifactCategory::Text, "note_1.txt", "hello upload")
            .unwrap();
        assert_eq!(
            std::fs::read_to_string(&pair.backend).unwrap(),
            "hello upload"
        );
        assert_eq!(
            std::fs::read_to_string(&pair.frontend).unwrap(),
            "hello upload"
        );
    }

    #[test]
    fn naming_key_formats() {
        let key = NamingKey {
            stem: "report".into(),
            timestamp: 1_700_000_000,
        };
        assert_eq!(key.file_name("txt"), "report_1700000000.txt");
        assert_eq!(
            key.variant_file_name(Variant::Original, "jpg"),
            "report_1700000000_original.jpg"
        );
        assert_eq!(
            key.variant_file_name(Variant::Processed, "wav"),
            "report_1700000000_processed.wav"
        );
        assert_eq!(key.prefix(), "report_1700000000");
    }

    #[test]
    fn naming_key_strips_directories_and_extension() {
        let key = NamingKey::for_upload("/tmp/somewhere/quarterly report.pdf");
        assert!(key.file_name("pdf").starts_with("quarterly report_"));
    }

    #[test]
    fn naming_key_empty_stem_falls_back() {
        let key = NamingKey::for_upload("");
        assert!(key.file_name("txt").starts_with("upload_"));
    }
}
