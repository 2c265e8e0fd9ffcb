use serde::Serialize;

/// A pull request as it will be rendered into the document.
/// Note: Not Deserialize — PullRequest is assembled manually from the
/// metadata, reviews, commits and files endpoints of the GitHub API.
#[derive(Debug, Clone, Serialize)]
pub struct PullRequest {
    /// Web URL the record was fetched for
    pub url: String,
    /// PR number (e.g., 42)
    pub number: u64,
    /// PR title
    pub title: String,
    /// PR author
    pub author: User,
    /// Creation time, already converted to KST for display
    pub created_at_kst: String,
    /// Raw Markdown description (GitHub returns null for an empty body)
    pub description: Option<String>,
    /// One entry per submitted review, in API order
    pub reviewers: Vec<User>,
    /// Commits on the PR branch
    pub commits: Vec<Commit>,
    /// Changed files with classified diff lines
    pub files: Vec<FileChange>,
}

/// A GitHub account reference (author or reviewer).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub login: String,
    pub html_url: String,
}

/// A single commit of the pull request.
#[derive(Debug, Clone, Serialize)]
pub struct Commit {
    pub sha: String,
    /// First line of the commit message
    pub subject: String,
    /// Remaining non-blank lines of the message, if any
    pub body: Option<String>,
    /// GitHub account of the author; None when the commit email is not linked
    pub author: Option<User>,
    /// Author date in KST; None when GitHub omits the git author
    pub date_kst: Option<String>,
}

/// A single changed file within the PR.
#[derive(Debug, Clone, Serialize)]
pub struct FileChange {
    /// File path (e.g., "src/auth/config.rs")
    pub path: String,
    /// GitHub file status: added, modified, removed, renamed, ...
    pub status: String,
    /// Classified patch lines in hunk order. Empty for binary files.
    pub lines: Vec<DiffLine>,
}

/// Classification of a single patch line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LineKind {
    Context,
    Added,
    Removed,
    Marker,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffLine {
    pub kind: LineKind,
    pub text: String,
}

/// Represents the parsed components of a GitHub PR URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrUrl {
    pub owner: String,
    pub repo: String,
    pub pr_number: u64,
}

impl PrUrl {
    /// Canonical web URL of the pull request.
    pub fn web_url(&self) -> String {
        format!(
            "https://github.com/{}/{}/pull/{}",
            self.owner, self.repo, self.pr_number
        )
    }
}

impl std::fmt::Display for PrUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}#{}", self.owner, self.repo, self.pr_number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pr_url_display() {
        let url = PrUrl {
            owner: "org".to_string(),
            repo: "repo".to_string(),
            pr_number: 42,
        };
        assert_eq!(url.to_string(), "org/repo#42");
        assert_eq!(url.web_url(), "https://github.com/org/repo/pull/42");
    }

    #[test]
    fn test_line_kind_serializes_lowercase() {
        // The document template builds CSS classes from these names.
        assert_eq!(serde_json::to_value(LineKind::Added).unwrap(), "added");
        assert_eq!(serde_json::to_value(LineKind::Marker).unwrap(), "marker");
    }
}
