//! Diagnostic artifact sinks.
//!
//! Strategies hand raw markup and page captures to a [`DiagnosticSink`] when
//! extraction fails. Artifacts are write-once and best-effort: a failing sink
//! never affects retrieval. [`DirectorySink`] keeps one file per artifact kind
//! and overwrites it on each write, so the directory never grows.

use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Kind of diagnostic artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    /// Raw profile document from the static strategy.
    StaticMarkup,
    /// Rendered DOM from the browser strategy.
    RenderedMarkup,
    /// Full-page screenshot from the browser strategy.
    Screenshot,
}

impl ArtifactKind {
    /// Returns the fixed file name for this kind.
    pub fn file_name(&self) -> &'static str {
        match self {
            Self::StaticMarkup => "static-profile.html",
            Self::RenderedMarkup => "browser-page.html",
            Self::Screenshot => "browser-page.png",
        }
    }
}

/// Receives diagnostic artifacts.
pub trait DiagnosticSink: Send + Sync {
    /// Returns true if artifacts should be produced at all.
    ///
    /// Strategies check this before doing extra work such as screenshots.
    fn enabled(&self) -> bool;

    /// Stores an artifact. Errors are logged, never returned.
    fn write(&self, kind: ArtifactKind, bytes: &[u8]);
}

/// Discards all artifacts.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl DiagnosticSink for NoopSink {
    fn enabled(&self) -> bool {
        false
    }

    fn write(&self, _kind: ArtifactKind, _bytes: &[u8]) {}
}

/// Writes artifacts into a directory, one file per kind.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    /// Creates a sink writing into `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Returns the target directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the default artifact directory under the user cache dir.
    pub fn default_dir() -> Option<PathBuf> {
        dirs::cache_dir().map(|d| d.join("postgrab").join("artifacts"))
    }
}

impl DiagnosticSink for DirectorySink {
    fn enabled(&self) -> bool {
        true
    }

    fn write(&self, kind: ArtifactKind, bytes: &[u8]) {
        if let Err(e) = std::fs::create_dir_all(&self.dir) {
            warn!(dir = %self.dir.display(), error = %e, "Cannot create artifact directory");
            return;
        }
        let path = self.dir.join(kind.file_name());
        match std::fs::write(&path, bytes) {
            Ok(()) => debug!(path = %path.display(), bytes = bytes.len(), "Wrote artifact"),
            Err(e) => warn!(path = %path.display(), error = %e, "Failed to write artifact"),
        }
    }
}
