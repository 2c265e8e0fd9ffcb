use minijinja::{context, AutoEscape, Environment};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::pr::PullRequest;

const DOCUMENT_TEMPLATE: &str = include_str!("../templates/document.html.j2");
const STYLESHEET: &str = include_str!("../templates/styles.css");
const TEMPLATE_NAME: &str = "document.html";

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Failed to render document template: {0}")]
    Template(#[from] minijinja::Error),
}

#[derive(Serialize)]
struct Section<'a> {
    pr: &'a PullRequest,
    description_html: Option<String>,
}

/// Render pull requests into a single HTML document, one section per record
/// in input order, separated by page breaks.
///
/// Pure function of its input: the same records always produce the same bytes.
#[instrument(skip_all, fields(sections = pull_requests.len()))]
pub fn render_document(pull_requests: &[PullRequest]) -> Result<String, RenderError> {
    let mut env = Environment::new();
    env.set_auto_escape_callback(|_| AutoEscape::Html);
    env.add_template(TEMPLATE_NAME, DOCUMENT_TEMPLATE)?;

    let sections: Vec<Section> = pull_requests
        .iter()
        .map(|pr| Section {
            pr,
            description_html: pr
                .description
                .as_deref()
                .filter(|body| !body.trim().is_empty())
                .map(markdown_to_html),
        })
        .collect();

    let html = env.get_template(TEMPLATE_NAME)?.render(context! {
        title => document_title(pull_requests),
        styles => STYLESHEET,
        sections => sections,
    })?;
    debug!(bytes = html.len(), "rendered document");
    Ok(html)
}

/// Convert a PR description to HTML with GitHub-flavoured extensions.
/// Raw HTML in the description is escaped rather than passed through.
pub fn markdown_to_html(markdown: &str) -> String {
    let mut options = comrak::Options::default();
    options.extension.strikethrough = true;
    options.extension.table = true;
    options.extension.autolink = true;
    options.extension.tasklist = true;
    options.render.hardbreaks = true;
    options.render.escape = true;
    comrak::markdown_to_html(markdown, &options)
}

fn document_title(pull_requests: &[PullRequest]) -> String {
    match pull_requests {
        [single] => single.title.clone(),
        many => format!("{} pull requests", many.len()),
    }
}
