//! Error taxonomy for obtaining sections and articles.
//!
//! User-actionable errors are printed plainly and never treated as a crash.
//! `NotRunning` only travels between the daemon client and the orchestrator,
//! which handles it by falling back; it is never shown to the end user.

use thiserror::Error;

/// Remediation shown when a paywall blocks the article body.
pub const PAYWALL_HINT: &str =
    "paywall detected - set api_key in config.toml to read full articles";

/// Message used when a fetch succeeds but yields no body.
pub const CONTENT_MISSING: &str =
    "no article content found - try again later or check api_key";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// The source served a teaser instead of the article.
    #[error("paywall detected - set api_key in config.toml to read full articles")]
    Paywall,

    /// Something the user can fix or needs to know: missing content, no credentials.
    #[error("{0}")]
    User(String),

    /// The fetch daemon is not running, not ready, refused or timed out.
    #[error("fetch daemon not running")]
    NotRunning,

    /// Network, protocol or parsing failure, carried with its cause.
    #[error("{0}")]
    Transport(String),
}

impl FetchError {
    pub fn content_missing() -> Self {
        Self::User(CONTENT_MISSING.to_string())
    }

    pub fn transport(err: impl std::fmt::Display) -> Self {
        Self::Transport(err.to_string())
    }

    /// Paywall and plain user errors: show the message, not a failure report.
    pub fn is_user_actionable(&self) -> bool {
        matches!(self, Self::Paywall | Self::User(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paywall_carries_remediation() {
        let err = FetchError::Paywall;
        assert!(err.is_user_actionable());
        assert_eq!(err.to_string(), PAYWALL_HINT);
    }

    #[test]
    fn test_content_missing_is_user_actionable() {
        let err = FetchError::content_missing();
        assert!(err.is_user_actionable());
        assert_eq!(err.to_string(), CONTENT_MISSING);
    }

    #[test]
    fn test_transport_and_not_running_are_not_user_errors() {
        assert!(!FetchError::transport("connection reset").is_user_actionable());
        assert!(!FetchError::NotRunning.is_user_actionable());
    }
}
