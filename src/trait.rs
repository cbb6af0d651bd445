use crate::types::{report_url, DEFAULT_BASE_URL};
use crate::Result;
use async_trait::async_trait;

/// Source of raw listening report pages.
///
/// This is the seam between the report pipeline and the network. The pipeline
/// only ever asks for the markup of one user's page at a time, so tests can
/// substitute canned pages and alternative transports can be plugged in.
///
/// # Mocking Support
///
/// When the `mock` feature is enabled, this crate provides `MockReportFetcher`
/// that implements this trait using the `mockall` library.
#[cfg_attr(feature = "mock", mockall::automock)]
#[async_trait(?Send)]
pub trait ReportFetcher {
    /// Fetch the raw markup of a user's weekly listening report page.
    ///
    /// Fails with [`LfCircleError::Retrieval`](crate::LfCircleError::Retrieval)
    /// or [`LfCircleError::RateLimit`](crate::LfCircleError::RateLimit).
    async fn fetch(&self, user: &str) -> Result<String>;

    /// Base URL that fetched pages link relative to.
    fn base_url(&self) -> String {
        DEFAULT_BASE_URL.to_string()
    }

    /// Canonical report link for a user.
    fn report_url(&self, user: &str) -> String {
        report_url(&self.base_url(), user)
    }
}
