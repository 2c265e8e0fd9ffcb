use std::io;
use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, instrument};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("PDF renderer `{binary}` not found on PATH (install wkhtmltopdf or set [pdf].renderer)")]
    BinaryNotFound { binary: String },

    #[error("Failed to start PDF renderer `{binary}`: {source}")]
    Spawn {
        binary: String,
        #[source]
        source: io::Error,
    },

    #[error("PDF renderer `{binary}` failed ({status}): {stderr}")]
    Failed {
        binary: String,
        status: String,
        stderr: String,
    },

    #[error("I/O error while rendering PDF: {0}")]
    Io(#[from] io::Error),
}

/// Converts an HTML document into a PDF file.
#[async_trait]
pub trait PdfRenderer: Send + Sync {
    /// Human-readable name of the backend (e.g., "wkhtmltopdf")
    fn name(&self) -> &str;

    /// Write `html` as a PDF to `output`, replacing any existing file.
    async fn render(&self, html: &str, output: &Path) -> Result<(), ExportError>;
}

/// Shells out to wkhtmltopdf (or any binary with the same `<in> <out>` interface),
/// streaming the document through stdin.
pub struct Wkhtmltopdf {
    binary: String,
    args: Vec<String>,
}

impl Wkhtmltopdf {
    pub fn new(binary: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            binary: binary.into(),
            args,
        }
    }
}

#[async_trait]
impl PdfRenderer for Wkhtmltopdf {
    fn name(&self) -> &str {
        &self.binary
    }

    #[instrument(skip(self, html), fields(binary = %self.binary, output = %output.display()))]
    async fn render(&self, html: &str, output: &Path) -> Result<(), ExportError> {
        let mut child = Command::new(&self.binary)
            .args(&self.args)
            .arg("--quiet")
            .arg("-")
            .arg(output)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| map_spawn_error(&self.binary, source))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| io::Error::new(io::ErrorKind::BrokenPipe, "renderer stdin unavailable"))?;
        let feed = async move {
            stdin.write_all(html.as_bytes()).await?;
            stdin.shutdown().await?;
            Ok::<_, io::Error>(())
        };

        debug!(bytes = html.len(), "streaming HTML to renderer");
        let (fed, finished) = tokio::join!(feed, child.wait_with_output());
        let finished = finished?;

        if !finished.status.success() {
            return Err(ExportError::Failed {
                binary: self.binary.clone(),
                status: finished.status.to_string(),
                stderr: String::from_utf8_lossy(&finished.stderr).trim().to_string(),
            });
        }
        fed?;

        debug!("renderer finished");
        Ok(())
    }
}

fn map_spawn_error(binary: &str, source: io::Error) -> ExportError {
    if source.kind() == io::ErrorKind::NotFound {
        ExportError::BinaryNotFound {
            binary: binary.to_string(),
        }
    } else {
        ExportError::Spawn {
            binary: binary.to_string(),
            source,
        }
    }
}
