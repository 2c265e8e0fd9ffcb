use std::io;
use std::path::{Path, PathBuf};

use chrono::Local;
use futures::future::join_all;
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::auth::{AuthError, Token};
use crate::config::{Config, ConfigError};
use crate::export::{ExportError, PdfRenderer, Wkhtmltopdf};
use crate::pr::{self, GitHubClient, PrError, PullRequest};
use crate::render::{self, RenderError};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Client(#[from] PrError),

    #[error("None of the {} pull request(s) could be fetched; no PDF written", .failures.len())]
    NothingToRender { failures: Vec<PrFailure> },

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("Failed to write HTML to {path}: {source}")]
    HtmlWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Export(#[from] ExportError),
}

/// A pull request that was left out of the document.
#[derive(Debug)]
pub struct PrFailure {
    pub url: String,
    pub error: PrError,
}

/// Result of a batch that produced a PDF. `failures` may be non-empty:
/// partial output is preferred over all-or-nothing.
#[derive(Debug)]
pub struct BatchOutcome {
    pub output: PathBuf,
    pub rendered: Vec<PullRequest>,
    pub failures: Vec<PrFailure>,
}

/// `<YYYY-MM-DD>.pdf` in the current directory, using the local date.
pub fn default_output_path() -> PathBuf {
    PathBuf::from(format!("{}.pdf", Local::now().format("%Y-%m-%d")))
}

/// Drives fetch → render → export for one batch of PR URLs.
pub struct Pipeline {
    client: GitHubClient,
    renderer: Box<dyn PdfRenderer>,
    html_path: Option<PathBuf>,
}

impl Pipeline {
    pub fn new(client: GitHubClient, renderer: Box<dyn PdfRenderer>) -> Self {
        Self {
            client,
            renderer,
            html_path: None,
        }
    }

    /// Build the production pipeline: GitHub REST client plus the configured renderer binary.
    pub fn from_config(config: &Config, token: Token) -> Result<Self, PipelineError> {
        let client = GitHubClient::new(&config.github.api_url, token)?;
        let renderer = Wkhtmltopdf::new(config.pdf.renderer.clone(), config.pdf.args.clone());
        Ok(Self::new(client, Box::new(renderer)))
    }

    /// Also write the rendered HTML to `path` before exporting.
    pub fn with_html_copy(mut self, path: Option<PathBuf>) -> Self {
        self.html_path = path;
        self
    }

    /// Fetch every URL, render the ones that succeeded in input order and export
    /// them to `output`.
    ///
    /// Invalid URLs are rejected before any request is made. Per-PR fetch errors
    /// are collected into the outcome; the batch fails only when nothing could
    /// be fetched or when rendering/export fails.
    #[instrument(skip_all, fields(prs = urls.len(), output = %output.display()))]
    pub async fn run(&self, urls: &[String], output: &Path) -> Result<BatchOutcome, PipelineError> {
        let parsed: Vec<_> = urls
            .iter()
            .map(|url| (url.clone(), pr::parse_pr_url(url)))
            .collect();

        // join_all yields results in input order regardless of completion order.
        let results = join_all(parsed.into_iter().map(|(url, parsed)| async move {
            let fetched = match parsed {
                Ok(pr_url) => self.client.fetch_pull_request(&pr_url).await,
                Err(e) => Err(e),
            };
            (url, fetched)
        }))
        .await;

        let mut rendered = Vec::new();
        let mut failures = Vec::new();
        for (url, result) in results {
            match result {
                Ok(pull_request) => {
                    info!(pr = %url, files = pull_request.files.len(), "fetched pull request");
                    rendered.push(pull_request);
                }
                Err(error) => {
                    warn!(pr = %url, %error, "skipping pull request");
                    failures.push(PrFailure { url, error });
                }
            }
        }

        if rendered.is_empty() {
            return Err(PipelineError::NothingToRender { failures });
        }

        let html = render::render_document(&rendered)?;

        if let Some(path) = &self.html_path {
            tokio::fs::write(path, &html)
                .await
                .map_err(|source| PipelineError::HtmlWrite {
                    path: path.clone(),
                    source,
                })?;
            info!(path = %path.display(), "wrote HTML copy");
        }

        info!(renderer = self.renderer.name(), "exporting PDF");
        self.renderer.render(&html, output).await?;

        Ok(BatchOutcome {
            output: output.to_path_buf(),
            rendered,
            failures,
        })
    }
}
