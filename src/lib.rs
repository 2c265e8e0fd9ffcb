//! Export GitHub Pull Requests (description, reviewers, commits and diffs) to a
//! single PDF.
//!
//! ```no_run
//! # async fn demo() -> Result<(), pr2pdf::PipelineError> {
//! let urls = vec!["https://github.com/owner/repo/pull/123".to_string()];
//! let outcome = pr2pdf::generate_pdf(&urls, None, "review.pdf".as_ref()).await?;
//! for failure in &outcome.failures {
//!     eprintln!("skipped {}: {}", failure.url, failure.error);
//! }
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod config;
pub mod export;
pub mod pipeline;
pub mod pr;
pub mod render;
pub mod time;

use std::path::Path;

pub use pipeline::{BatchOutcome, Pipeline, PipelineError, PrFailure};

/// Resolve credentials, then fetch, render and export `pr_urls` to `output`.
///
/// Reads `.pr2pdf.toml` from the current directory if present. Token
/// precedence: `token`, then the configured environment variable (`GHP_TOKEN`),
/// then `gh auth token`.
pub async fn generate_pdf(
    pr_urls: &[String],
    token: Option<&str>,
    output: &Path,
) -> Result<BatchOutcome, PipelineError> {
    let config = config::Config::load()?;
    let token = auth::resolve_from_host(token, &config.github.token_env).await?;
    Pipeline::from_config(&config, token)?
        .run(pr_urls, output)
        .await
}
