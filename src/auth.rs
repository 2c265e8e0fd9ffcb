use std::fmt;
use std::io;
use std::process::Command;

use thiserror::Error;
use tracing::{debug, instrument};

/// Environment variable consulted when no `--token` is given.
pub const DEFAULT_TOKEN_ENV: &str = "GHP_TOKEN";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("No GitHub token available ({reasons}). Pass --token, set the token environment variable, or run `gh auth login`")]
    Unavailable { reasons: String },

    #[error("Token lookup task failed: {0}")]
    Lookup(#[from] tokio::task::JoinError),
}

/// Where a token came from, in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    Argument,
    Environment,
    GhCli,
}

impl fmt::Display for TokenSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenSource::Argument => write!(f, "--token"),
            TokenSource::Environment => write!(f, "environment"),
            TokenSource::GhCli => write!(f, "gh CLI"),
        }
    }
}

const PRECEDENCE: [TokenSource; 3] = [
    TokenSource::Argument,
    TokenSource::Environment,
    TokenSource::GhCli,
];

/// A resolved bearer token. Debug output never contains the secret.
#[derive(Clone)]
pub struct Token {
    secret: String,
    source: TokenSource,
}

impl Token {
    pub fn new(secret: impl Into<String>, source: TokenSource) -> Self {
        Self {
            secret: secret.into(),
            source,
        }
    }

    pub fn expose(&self) -> &str {
        &self.secret
    }

    pub fn source(&self) -> TokenSource {
        self.source
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("secret", &"<redacted>")
            .field("source", &self.source)
            .finish()
    }
}

/// Captured result of an external command.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

/// Trait for running commands, allowing the `gh` CLI to be faked in tests.
pub trait CommandRunner {
    fn run(&self, program: &str, args: &[&str]) -> io::Result<CommandOutput>;
}

/// Runs commands on the host.
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, program: &str, args: &[&str]) -> io::Result<CommandOutput> {
        let output = Command::new(program).args(args).output()?;
        Ok(CommandOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Resolve the GitHub token from the first source that yields a non-empty value:
/// explicit argument, then `env_var`, then `gh auth token`.
#[instrument(skip_all, fields(env_var = %env_var))]
pub fn resolve_token(
    explicit: Option<&str>,
    env_var: &str,
    env: &dyn Fn(&str) -> Option<String>,
    gh: &dyn CommandRunner,
) -> Result<Token, AuthError> {
    let mut reasons = Vec::new();

    for source in PRECEDENCE {
        let attempt = match source {
            TokenSource::Argument => Ok(explicit.map(str::to_owned)),
            TokenSource::Environment => Ok(env(env_var)),
            TokenSource::GhCli => token_from_gh(gh),
        };

        match attempt {
            Ok(Some(value)) if !value.trim().is_empty() => {
                debug!(%source, "resolved GitHub token");
                return Ok(Token::new(value.trim(), source));
            }
            Ok(_) => reasons.push(format!("{source}: not set")),
            Err(reason) => reasons.push(format!("{source}: {reason}")),
        }
    }

    Err(AuthError::Unavailable {
        reasons: reasons.join("; "),
    })
}

/// Resolve against the real process environment and the installed `gh`.
///
/// `gh` is a blocking subprocess, so the lookup runs on tokio's blocking pool.
pub async fn resolve_from_host(explicit: Option<&str>, env_var: &str) -> Result<Token, AuthError> {
    let explicit = explicit.map(str::to_owned);
    let env_var = env_var.to_owned();
    tokio::task::spawn_blocking(move || {
        resolve_token(
            explicit.as_deref(),
            &env_var,
            &|name: &str| std::env::var(name).ok(),
            &SystemRunner,
        )
    })
    .await?
}

fn token_from_gh(gh: &dyn CommandRunner) -> Result<Option<String>, String> {
    let status = gh.run("gh", &["auth", "status"]).map_err(describe_io_error)?;
    if !status.success {
        return Err(format!("not logged in ({})", status.stderr.trim()));
    }

    let token = gh.run("gh", &["auth", "token"]).map_err(describe_io_error)?;
    if !token.success {
        return Err(format!("`gh auth token` failed ({})", token.stderr.trim()));
    }

    Ok(Some(token.stdout.trim().to_string()))
}

fn describe_io_error(e: io::Error) -> String {
    if e.kind() == io::ErrorKind::NotFound {
        "gh not found, install it from https://cli.github.com/".to_string()
    } else {
        format!("failed to run gh: {e}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct FakeGh {
        logged_in: bool,
        token: &'static str,
        installed: bool,
        calls: RefCell<Vec<String>>,
    }

    impl FakeGh {
        fn logged_in(token: &'static str) -> Self {
            Self {
                logged_in: true,
                token,
                installed: true,
                calls: RefCell::new(Vec::new()),
            }
        }

        fn logged_out() -> Self {
            Self {
                logged_in: false,
                ..Self::logged_in("")
            }
        }

        fn missing() -> Self {
            Self {
                installed: false,
                ..Self::logged_in("")
            }
        }
    }

    impl CommandRunner for FakeGh {
        fn run(&self, program: &str, args: &[&str]) -> io::Result<CommandOutput> {
            self.calls
                .borrow_mut()
                .push(format!("{program} {}", args.join(" ")));
            if !self.installed {
                return Err(io::Error::new(io::ErrorKind::NotFound, "no such file"));
            }
            let output = match args {
                ["auth", "status"] if self.logged_in => CommandOutput {
                    success: true,
                    stdout: String::new(),
                    stderr: "Logged in to github.com".to_string(),
                },
                ["auth", "status"] => CommandOutput {
                    success: false,
                    stdout: String::new(),
                    stderr: "You are not logged into any GitHub hosts".to_string(),
                },
                ["auth", "token"] => CommandOutput {
                    success: true,
                    stdout: format!("{}\n", self.token),
                    stderr: String::new(),
                },
                _ => unreachable!("unexpected gh invocation"),
            };
            Ok(output)
        }
    }

    fn env_with(value: Option<&'static str>) -> impl Fn(&str) -> Option<String> {
        move |name| {
            assert_eq!(name, DEFAULT_TOKEN_ENV);
            value.map(str::to_string)
        }
    }

    #[test]
    fn test_explicit_token_wins_over_all_sources() {
        let gh = FakeGh::logged_in("from-gh");
        let token = resolve_token(
            Some("from-arg"),
            DEFAULT_TOKEN_ENV,
            &env_with(Some("from-env")),
            &gh,
        )
        .unwrap();
        assert_eq!(token.expose(), "from-arg");
        assert_eq!(token.source(), TokenSource::Argument);
        assert!(gh.calls.borrow().is_empty());
    }

    #[test]
    fn test_env_wins_over_gh() {
        let gh = FakeGh::logged_in("from-gh");
        let token =
            resolve_token(None, DEFAULT_TOKEN_ENV, &env_with(Some("from-env")), &gh).unwrap();
        assert_eq!(token.expose(), "from-env");
        assert_eq!(token.source(), TokenSource::Environment);
        assert!(gh.calls.borrow().is_empty());
    }

    #[test]
    fn test_blank_sources_fall_through_to_gh() {
        let gh = FakeGh::logged_in("from-gh");
        let token =
            resolve_token(Some("  "), DEFAULT_TOKEN_ENV, &env_with(Some("")), &gh).unwrap();
        assert_eq!(token.expose(), "from-gh");
        assert_eq!(token.source(), TokenSource::GhCli);
        assert_eq!(
            *gh.calls.borrow(),
            vec!["gh auth status".to_string(), "gh auth token".to_string()]
        );
    }

    #[test]
    fn test_logged_out_gh_is_an_auth_error() {
        let gh = FakeGh::logged_out();
        let err = resolve_token(None, DEFAULT_TOKEN_ENV, &env_with(None), &gh).unwrap_err();
        match err {
            AuthError::Unavailable { reasons } => assert!(reasons.contains("not logged in")),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(gh.calls.borrow().len(), 1);
    }

    #[test]
    fn test_missing_gh_is_an_auth_error() {
        let gh = FakeGh::missing();
        let err = resolve_token(None, DEFAULT_TOKEN_ENV, &env_with(None), &gh).unwrap_err();
        assert!(err.to_string().contains("gh not found"));
    }

    #[test]
    fn test_empty_gh_token_is_rejected() {
        let gh = FakeGh::logged_in("");
        assert!(resolve_token(None, DEFAULT_TOKEN_ENV, &env_with(None), &gh).is_err());
    }

    #[tokio::test]
    async fn test_resolve_from_host_runs_inside_runtime() {
        let token = resolve_from_host(Some(" from-arg "), "PR2PDF_TEST_UNSET_TOKEN_VAR")
            .await
            .unwrap();
        assert_eq!(token.expose(), "from-arg");
        assert_eq!(token.source(), TokenSource::Argument);
    }

    #[test]
    fn test_token_debug_is_redacted() {
        let token = Token::new("ghp_secret", TokenSource::Argument);
        let debug = format!("{token:?}");
        assert!(!debug.contains("ghp_secret"));
        assert!(debug.contains("redacted"));
    }
}
