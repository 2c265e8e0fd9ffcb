pub mod diff;
pub mod types;

pub use types::{Commit, DiffLine, FileChange, LineKind, PrUrl, PullRequest, User};

use reqwest::header::ACCEPT;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::auth::Token;
use crate::time;

/// GitHub caps list endpoints at 100 items per page.
const PER_PAGE: usize = 100;

#[derive(Debug, Error)]
pub enum PrError {
    #[error("Invalid PR URL: {0} (expected https://github.com/owner/repo/pull/number)")]
    InvalidUrl(String),

    #[error("Pull request {pr} not found")]
    NotFound { pr: String },

    #[error("GitHub rejected the token while fetching {pr} (HTTP {status})")]
    Authentication { pr: String, status: u16 },

    #[error("GitHub API error for {pr}: HTTP {status}: {body}")]
    Api { pr: String, status: u16, body: String },

    #[error("Network error while fetching {pr}: {source}")]
    Network {
        pr: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Unexpected GitHub response for {pr}: {source}")]
    Decode {
        pr: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Invalid timestamp in {pr}: {source}")]
    Timestamp {
        pr: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

/// Parse a GitHub PR URL into its component parts.
///
/// Expected format: https://github.com/{owner}/{repo}/pull/{number}.
/// A trailing slash or trailing sub-path (`/files`, `/commits`) is ignored.
pub fn parse_pr_url(url: &str) -> Result<PrUrl, PrError> {
    let invalid = || PrError::InvalidUrl(url.to_string());
    let parsed = reqwest::Url::parse(url.trim()).map_err(|_| invalid())?;

    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str() != Some("github.com") {
        return Err(invalid());
    }

    let segments: Vec<_> = parsed
        .path_segments()
        .ok_or_else(invalid)?
        .filter(|segment| !segment.is_empty())
        .collect();

    if segments.len() < 4 || segments[2] != "pull" {
        return Err(invalid());
    }

    let number = segments[3];
    if !number.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let pr_number = number.parse::<u64>().map_err(|_| invalid())?;
    if pr_number == 0 {
        return Err(invalid());
    }

    Ok(PrUrl {
        owner: segments[0].to_string(),
        repo: segments[1].to_string(),
        pr_number,
    })
}

#[derive(Deserialize)]
struct UserResponse {
    login: String,
    html_url: String,
}

impl From<UserResponse> for User {
    fn from(user: UserResponse) -> Self {
        User {
            login: user.login,
            html_url: user.html_url,
        }
    }
}

#[derive(Deserialize)]
struct PullResponse {
    number: u64,
    title: String,
    body: Option<String>,
    created_at: String,
    user: UserResponse,
}

#[derive(Deserialize)]
struct ReviewResponse {
    // null for deleted ("ghost") accounts
    user: Option<UserResponse>,
}

#[derive(Deserialize)]
struct CommitResponse {
    sha: String,
    commit: GitCommit,
    author: Option<UserResponse>,
}

#[derive(Deserialize)]
struct GitCommit {
    message: String,
    author: Option<GitSignature>,
}

#[derive(Deserialize)]
struct GitSignature {
    date: String,
}

#[derive(Deserialize)]
struct FileResponse {
    filename: String,
    status: String,
    // absent for binary files and very large diffs
    patch: Option<String>,
}

/// Thin GitHub REST client bound to one token.
pub struct GitHubClient {
    http: reqwest::Client,
    api_url: String,
    token: Token,
}

impl GitHubClient {
    pub fn new(api_url: &str, token: Token) -> Result<Self, PrError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("pr2pdf/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(PrError::Client)?;
        Ok(Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    /// Fetch metadata, reviewers, commits and files of one pull request.
    ///
    /// The four reads are independent and run concurrently; the first failure
    /// fails the whole record.
    #[instrument(skip(self), fields(pr = %pr_url))]
    pub async fn fetch_pull_request(&self, pr_url: &PrUrl) -> Result<PullRequest, PrError> {
        let base_url = format!(
            "{}/repos/{}/{}/pulls/{}",
            self.api_url, pr_url.owner, pr_url.repo, pr_url.pr_number
        );
        let reviews_url = format!("{base_url}/reviews");
        let commits_url = format!("{base_url}/commits");
        let files_url = format!("{base_url}/files");

        debug!("fetching PR metadata, reviews, commits and files");
        let (metadata, reviews, commits, files) = tokio::try_join!(
            self.get::<PullResponse>(&base_url, pr_url),
            self.get_paginated::<ReviewResponse>(&reviews_url, pr_url),
            self.get_paginated::<CommitResponse>(&commits_url, pr_url),
            self.get_paginated::<FileResponse>(&files_url, pr_url),
        )?;
        debug!(
            title = %metadata.title,
            reviews = reviews.len(),
            commits = commits.len(),
            files = files.len(),
            "received PR data"
        );

        let kst = |timestamp: &str| {
            time::to_kst(timestamp).map_err(|source| PrError::Timestamp {
                pr: pr_url.to_string(),
                source,
            })
        };

        let commits = commits
            .into_iter()
            .map(|c| -> Result<Commit, PrError> {
                let (subject, body) = split_commit_message(&c.commit.message);
                let date_kst = c.commit.author.map(|a| kst(&a.date)).transpose()?;
                Ok(Commit {
                    sha: c.sha,
                    subject,
                    body,
                    author: c.author.map(User::from),
                    date_kst,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let files = files
            .into_iter()
            .map(|f| FileChange {
                lines: f.patch.as_deref().map(diff::parse_patch).unwrap_or_default(),
                path: f.filename,
                status: f.status,
            })
            .collect();

        Ok(PullRequest {
            url: pr_url.web_url(),
            number: metadata.number,
            created_at_kst: kst(&metadata.created_at)?,
            title: metadata.title,
            author: metadata.user.into(),
            description: metadata.body,
            reviewers: reviews
                .into_iter()
                .filter_map(|r| r.user.map(User::from))
                .collect(),
            commits,
            files,
        })
    }

    async fn get<T: DeserializeOwned>(&self, url: &str, pr_url: &PrUrl) -> Result<T, PrError> {
        debug!(url, "GET");
        let response = self
            .http
            .get(url)
            .bearer_auth(self.token.expose())
            .header(ACCEPT, "application/vnd.github+json")
            .send()
            .await
            .map_err(|source| PrError::Network {
                pr: pr_url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_status(pr_url, status, body));
        }

        response.json::<T>().await.map_err(|source| PrError::Decode {
            pr: pr_url.to_string(),
            source,
        })
    }

    async fn get_paginated<T: DeserializeOwned>(
        &self,
        url: &str,
        pr_url: &PrUrl,
    ) -> Result<Vec<T>, PrError> {
        let mut items = Vec::new();
        for page in 1.. {
            let batch: Vec<T> = self
                .get(&format!("{url}?per_page={PER_PAGE}&page={page}"), pr_url)
                .await?;
            let last_page = batch.len() < PER_PAGE;
            items.extend(batch);
            if last_page {
                break;
            }
        }
        Ok(items)
    }
}

fn map_status(pr_url: &PrUrl, status: StatusCode, body: String) -> PrError {
    let pr = pr_url.to_string();
    match status {
        StatusCode::NOT_FOUND => PrError::NotFound { pr },
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => PrError::Authentication {
            pr,
            status: status.as_u16(),
        },
        _ => PrError::Api {
            pr,
            status: status.as_u16(),
            body,
        },
    }
}

/// Split a commit message into its subject line and the non-blank remainder.
fn split_commit_message(message: &str) -> (String, Option<String>) {
    let mut lines = message.trim().lines();
    let subject = lines.next().unwrap_or_default().to_string();
    let body = lines
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n");
    (subject, (!body.is_empty()).then_some(body))
}
