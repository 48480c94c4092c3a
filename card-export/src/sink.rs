//! Where finished artifacts go.
//!
//! [`DownloadSink`] receives PDF and PNG bytes; [`PrintHost`] opens print
//! contexts for HTML documents.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use crate::compose::print::with_auto_print;
use crate::error::{ExportError, ExportResult};

/// A finished export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// File name including extension.
    pub file_name: String,
    /// MIME type.
    pub mime: &'static str,
    /// Encoded contents.
    pub bytes: Vec<u8>,
}

impl Artifact {
    /// A PDF named `{stem}.pdf`.
    #[must_use]
    pub fn pdf(stem: &str, bytes: Vec<u8>) -> Self {
        Self {
            file_name: format!("{stem}.pdf"),
            mime: "application/pdf",
            bytes,
        }
    }

    /// A PNG named `{stem}.png`.
    #[must_use]
    pub fn png(stem: &str, bytes: Vec<u8>) -> Self {
        Self {
            file_name: format!("{stem}.png"),
            mime: "image/png",
            bytes,
        }
    }
}

/// Receives downloads.
pub trait DownloadSink: Send + Sync {
    /// Deliver one artifact.
    ///
    /// # Errors
    ///
    /// Returns an error if the artifact could not be stored.
    fn save(&self, artifact: &Artifact) -> ExportResult<()>;
}

/// Writes artifacts into a directory.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    /// Sink writing into `dir`, created on first save if missing.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Target directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl DownloadSink for DirectorySink {
    fn save(&self, artifact: &Artifact) -> ExportResult<()> {
        let name = Path::new(&artifact.file_name)
            .file_name()
            .ok_or_else(|| {
                ExportError::Sink(format!("invalid file name: {}", artifact.file_name))
            })?;
        std::fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(name);
        std::fs::write(&path, &artifact.bytes)?;
        tracing::info!(path = %path.display(), bytes = artifact.bytes.len(), "artifact saved");
        Ok(())
    }
}

/// Keeps artifacts in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    saved: Mutex<Vec<Artifact>>,
}

impl MemorySink {
    /// Empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything saved so far, in order.
    #[must_use]
    pub fn artifacts(&self) -> Vec<Artifact> {
        self.saved
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// File names saved so far, in order.
    #[must_use]
    pub fn file_names(&self) -> Vec<String> {
        self.artifacts().into_iter().map(|a| a.file_name).collect()
    }
}

impl DownloadSink for MemorySink {
    fn save(&self, artifact: &Artifact) -> ExportResult<()> {
        self.saved
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(artifact.clone());
        Ok(())
    }
}

/// Opens print contexts.
pub trait PrintHost: Send + Sync {
    /// A fresh print context, or `None` if the host refused (popup blocked).
    fn open(&self) -> Option<Box<dyn PrintWindow>>;
}

/// One print context.
#[async_trait]
pub trait PrintWindow: Send + Sync {
    /// Append HTML to the document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be written.
    fn write(&mut self, html: &str) -> ExportResult<()>;

    /// Close the document stream; loading starts.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be finalized.
    fn close_document(&mut self) -> ExportResult<()>;

    /// Resolve once the document and its resources have loaded.
    async fn loaded(&self);

    /// Send the document to the printer.
    fn print(&mut self);

    /// Close the context.
    fn close(&mut self);
}

/// Print host that writes each document to `print-{uuid}.html` in a
/// directory.
///
/// With [`FilePrintHost::with_auto_print`] the written file carries a
/// script that prints it when opened in a browser.
#[derive(Debug, Clone)]
pub struct FilePrintHost {
    dir: PathBuf,
    auto_print: Option<Duration>,
}

impl FilePrintHost {
    /// Host writing into `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            auto_print: None,
        }
    }

    /// Embed an auto-print script firing `delay` after load.
    #[must_use]
    pub fn with_auto_print(mut self, delay: Duration) -> Self {
        self.auto_print = Some(delay);
        self
    }
}

impl PrintHost for FilePrintHost {
    fn open(&self) -> Option<Box<dyn PrintWindow>> {
        if let Err(e) = std::fs::create_dir_all(&self.dir) {
            tracing::warn!(dir = %self.dir.display(), error = %e, "cannot open print directory");
            return None;
        }
        let path = self.dir.join(format!("print-{}.html", uuid::Uuid::new_v4()));
        Some(Box::new(FilePrintWindow {
            path,
            buffer: String::new(),
            auto_print: self.auto_print,
        }))
    }
}

/// A print document being written to disk.
#[derive(Debug)]
pub struct FilePrintWindow {
    path: PathBuf,
    buffer: String,
    auto_print: Option<Duration>,
}

#[async_trait]
impl PrintWindow for FilePrintWindow {
    fn write(&mut self, html: &str) -> ExportResult<()> {
        self.buffer.push_str(html);
        Ok(())
    }

    fn close_document(&mut self) -> ExportResult<()> {
        if let Some(delay) = self.auto_print {
            self.buffer = with_auto_print(&self.buffer, delay);
        }
        std::fs::write(&self.path, self.buffer.as_bytes())?;
        tracing::info!(path = %self.path.display(), "print document written");
        Ok(())
    }

    async fn loaded(&self) {}

    fn print(&mut self) {
        tracing::debug!(path = %self.path.display(), "print requested");
    }

    fn close(&mut self) {
        self.buffer.clear();
    }
}
