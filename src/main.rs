use clap::Parser;
use colored::Colorize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, info, info_span, Instrument};
use tracing_subscriber::EnvFilter;

use pr2pdf::{auth, config, pipeline, Pipeline, PipelineError};

/// pr2pdf — export one or more GitHub Pull Requests (description, reviewers,
/// commits and diffs) into a single PDF.
#[derive(Parser, Debug)]
#[command(name = "pr2pdf", version, about)]
struct Cli {
    /// GitHub Pull Request URLs (e.g., https://github.com/org/repo/pull/42)
    #[arg(required = true, num_args = 1..)]
    pr_urls: Vec<String>,

    /// GitHub token. Falls back to the GHP_TOKEN env var, then `gh auth token`
    #[arg(long)]
    token: Option<String>,

    /// Output PDF path (default: <today>.pdf)
    #[arg(short, long)]
    output_path: Option<PathBuf>,

    /// Also write the rendered HTML to this path
    #[arg(long)]
    html_path: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let span = info_span!("pr2pdf", prs = cli.pr_urls.len());
    match run(cli).instrument(span).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if let PipelineError::NothingToRender { failures } = &err {
                for failure in failures {
                    eprintln!("{} {}: {}", "✗".red().bold(), failure.url, failure.error);
                }
            }
            eprintln!("{} {}", "error:".red().bold(), err);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), PipelineError> {
    info!("loading configuration");
    let config = config::Config::load()?;
    debug!(api_url = %config.github.api_url, renderer = %config.pdf.renderer, "configuration loaded");

    info!("resolving GitHub token");
    let token = auth::resolve_from_host(cli.token.as_deref(), &config.github.token_env).await?;
    info!(source = %token.source(), "using GitHub token");

    let output = cli.output_path.unwrap_or_else(pipeline::default_output_path);
    let outcome = Pipeline::from_config(&config, token)?
        .with_html_copy(cli.html_path)
        .run(&cli.pr_urls, &output)
        .await?;

    for pr in &outcome.rendered {
        println!("{} #{} {}", "✓".green().bold(), pr.number, pr.title);
    }
    for failure in &outcome.failures {
        eprintln!("{} {}: {}", "✗".red().bold(), failure.url, failure.error);
    }
    println!("PDF successfully generated: {}", outcome.output.display());
    info!(
        rendered = outcome.rendered.len(),
        failed = outcome.failures.len(),
        "done"
    );

    Ok(())
}
