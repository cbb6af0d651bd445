use thiserror::Error;

/// Error types for building a circle report.
///
/// Errors fall into two groups. Per-target errors ([`Retrieval`](Self::Retrieval),
/// [`RateLimit`](Self::RateLimit) and [`Extraction`](Self::Extraction)) only knock
/// a single user out of the ranking; the coordinator logs them and carries on.
/// Everything else stops the run.
///
/// ```rust
/// use lfcircle::LfCircleError;
///
/// let err = LfCircleError::Extraction("no scrobble total".to_string());
/// assert!(err.is_target_failure());
///
/// let err = LfCircleError::Configuration("unknown format 'yaml'".to_string());
/// assert!(!err.is_target_failure());
/// ```
#[derive(Error, Debug)]
pub enum LfCircleError {
    /// A user's listening report page could not be fetched.
    ///
    /// This covers connection failures, invalid URLs and any non-success
    /// HTTP status (for instance a 404 for a user that does not exist).
    #[error("Failed to retrieve page: {0}")]
    Retrieval(String),

    /// Rate limiting from Last.fm.
    ///
    /// Raised for HTTP 429 responses and for pages whose body looks like a
    /// throttling notice. The fetcher retries these before giving up.
    #[error("Rate limited, retry after {retry_after} seconds")]
    RateLimit {
        /// Number of seconds to wait before retrying
        retry_after: u64,
    },

    /// The page was fetched but did not look like a listening report.
    ///
    /// Only raised when the scrobble total cannot be located; every other
    /// figure on the page is optional.
    #[error("Failed to extract listening report: {0}")]
    Extraction(String),

    /// Invalid caller-supplied option, such as an unknown output format.
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// Every requested target failed, so there is nothing to rank.
    #[error("No listening reports could be retrieved for any of the {attempted} target(s)")]
    AllTargetsFailed {
        /// Number of distinct targets that were attempted
        attempted: usize,
    },
}

impl LfCircleError {
    /// Whether this error only affects a single target and should be
    /// recovered from by dropping that target.
    pub fn is_target_failure(&self) -> bool {
        matches!(
            self,
            Self::Retrieval(_) | Self::RateLimit { .. } | Self::Extraction(_)
        )
    }
}
