//! # lfcircle
//!
//! Last.fm statistics for your friend circle: fetches each user's weekly
//! listening report, ranks everyone against each other on scrobbles and
//! distinct artists, albums and tracks, and renders a single leaderboard.
//!
//! ```rust,no_run
//! use lfcircle::{Circle, LastFmClient, OutputFormat, RenderOptions};
//!
//! #[tokio::main]
//! async fn main() -> lfcircle::Result<()> {
//!     let client = LastFmClient::new(Box::new(http_client::native::NativeClient::new()));
//!     let options = RenderOptions {
//!         header: "this week".to_string(),
//!         format: OutputFormat::Markdown,
//!         ..Default::default()
//!     };
//!
//!     let outcome = Circle::new(client).run(&["user1", "user2"], &options).await?;
//!     print!("{}", outcome.text);
//!     Ok(())
//! }
//! ```

pub mod circle;
pub mod client;
pub mod error;
pub mod events;
pub mod headers;
pub mod parsing;
pub mod ranking;
pub mod render;
pub mod retry;
pub mod r#trait;
pub mod types;

pub use circle::{dedup_targets, Circle, CircleOutcome, CollectedReports, SkippedTarget};
pub use client::LastFmClient;
pub use error::LfCircleError;
pub use events::{create_event_channel, CircleEvent, CircleEventReceiver, CircleEventSender};
pub use parsing::{extract, ReportParser};
pub use ranking::{rank, Metric, RankedUser, Ranking, Standing};
pub use render::{render, OutputFormat, RenderOptions};
pub use retry::RetryConfig;
pub use types::{EntityKind, ListeningReport, TopEntity};

#[cfg(feature = "mock")]
pub use r#trait::MockReportFetcher;
pub use r#trait::ReportFetcher;

// Re-export scraper types for testing
pub use scraper::Html;

pub type Result<T> = std::result::Result<T, LfCircleError>;
