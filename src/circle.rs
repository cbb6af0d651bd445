//! The report pipeline: fetch every target, parse, rank and render.
//!
//! Fetches are issued concurrently; everything after them is sequential and
//! works on the reports in target order, whatever order the fetches finished in.

use crate::events::{CircleEventEmitter, CircleEventSender};
use crate::parsing::ReportParser;
use crate::r#trait::ReportFetcher;
use crate::ranking::{rank, Ranking};
use crate::render::{render, RenderOptions};
use crate::types::ListeningReport;
use crate::{LfCircleError, Result};
use futures::future::join_all;
use serde::Serialize;

/// A target that was dropped from the ranking, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedTarget {
    pub user: String,
    pub reason: String,
}

/// Reports gathered for a list of targets.
#[derive(Debug, Clone, Default)]
pub struct CollectedReports {
    /// Successfully parsed reports, in target order
    pub reports: Vec<ListeningReport>,
    /// Targets that could not be fetched or parsed, in target order
    pub skipped: Vec<SkippedTarget>,
}

/// The result of a complete run.
#[derive(Debug, Clone)]
pub struct CircleOutcome {
    /// The rendered document
    pub text: String,
    /// The ranking the document was rendered from
    pub ranking: Ranking,
    /// Targets left out of the ranking
    pub skipped: Vec<SkippedTarget>,
}

/// Remove repeated targets, keeping the first occurrence of each.
pub fn dedup_targets<S: AsRef<str>>(targets: &[S]) -> Vec<String> {
    let mut unique: Vec<String> = Vec::with_capacity(targets.len());
    for target in targets {
        let target = target.as_ref();
        if unique.iter().any(|seen| seen == target) {
            log::debug!("Ignoring repeated target '{target}'");
            continue;
        }
        unique.push(target.to_string());
    }
    unique
}

/// Coordinates a circle report run over an injected [`ReportFetcher`].
///
/// # Examples
///
/// ```rust,no_run
/// use lfcircle::{Circle, LastFmClient, RenderOptions};
///
/// # tokio_test::block_on(async {
/// let client = LastFmClient::new(Box::new(http_client::native::NativeClient::new()));
/// let circle = Circle::new(client);
///
/// let outcome = circle
///     .run(&["user1", "user2", "user3"], &RenderOptions::default())
///     .await?;
/// print!("{}", outcome.text);
/// # Ok::<(), lfcircle::LfCircleError>(())
/// # });
/// ```
pub struct Circle<F: ReportFetcher> {
    fetcher: F,
    parser: ReportParser,
    events: Option<CircleEventSender>,
}

impl<F: ReportFetcher> Circle<F> {
    /// Create a coordinator. Links in parsed pages resolve against the fetcher's base URL.
    pub fn new(fetcher: F) -> Self {
        let parser = ReportParser::with_base_url(fetcher.base_url());
        Self {
            fetcher,
            parser,
            events: None,
        }
    }

    /// Publish progress and skip notices on this channel.
    pub fn with_events(mut self, events: CircleEventSender) -> Self {
        self.events = Some(events);
        self
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Fetch and parse every target. Per-target failures are recorded, not returned.
    pub async fn collect_reports<S: AsRef<str>>(&self, targets: &[S]) -> CollectedReports {
        let targets = dedup_targets(targets);
        let total = targets.len();

        let pages = join_all(targets.iter().map(|user| self.fetcher.fetch(user))).await;

        let mut collected = CollectedReports::default();

        for (index, (user, page)) in targets.into_iter().zip(pages).enumerate() {
            let parsed = page.and_then(|markup| self.parser.parse_markup(&markup, &user));

            match parsed {
                Ok(report) => {
                    log::info!("got {user}'s report ({}/{total})", index + 1);
                    if log::log_enabled!(log::Level::Debug) {
                        if let Ok(json) = serde_json::to_string(&report) {
                            log::debug!("{json}");
                        }
                    }
                    self.events.emit_target_fetched(&user, index + 1, total);
                    collected.reports.push(report);
                }
                Err(e) => {
                    log::warn!("skipping target '{user}': {e}");
                    let reason = e.to_string();
                    self.events.emit_target_skipped(&user, &reason);
                    collected.skipped.push(SkippedTarget { user, reason });
                }
            }
        }

        collected
    }

    /// Build the complete circle report for the given targets.
    ///
    /// Fails with [`LfCircleError::Configuration`] when no targets are given and
    /// with [`LfCircleError::AllTargetsFailed`] when none of them could be
    /// retrieved. Individual failures only shrink the report.
    pub async fn run<S: AsRef<str>>(
        &self,
        targets: &[S],
        options: &RenderOptions,
    ) -> Result<CircleOutcome> {
        if targets.is_empty() {
            return Err(LfCircleError::Configuration(
                "at least one target user is required".to_string(),
            ));
        }

        let CollectedReports { reports, skipped } = self.collect_reports(targets).await;

        if reports.is_empty() {
            return Err(LfCircleError::AllTargetsFailed {
                attempted: skipped.len(),
            });
        }

        if !skipped.is_empty() {
            log::warn!(
                "{} of {} target(s) left out of the report",
                skipped.len(),
                skipped.len() + reports.len()
            );
        }

        let ranking = rank(&reports);
        let text = render(&ranking, options);

        Ok(CircleOutcome {
            text,
            ranking,
            skipped,
        })
    }
}
