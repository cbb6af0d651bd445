//! HTML parsing for Last.fm weekly listening report pages.
//!
//! This module is the only place that knows what a listening report page looks
//! like. Everything it finds is turned into a [`ListeningReport`] so a redesign
//! of the page only ever touches this file.

use crate::types::{report_url, EntityKind, ListeningReport, TopEntity, DEFAULT_BASE_URL};
use crate::{LfCircleError, Result};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

const LISTENING_TIME_NEEDLE: &str = "Listening time";

static COUNT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d[\d,]*").expect("count pattern is valid"));

/// Compile a CSS selector, reporting failures as extraction errors.
fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css)
        .map_err(|e| LfCircleError::Extraction(format!("invalid selector '{css}': {e:?}")))
}

/// Text content of an element with runs of whitespace collapsed.
fn element_text(element: ElementRef) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parse the first number in a piece of page text.
///
/// Thousands separators are ignored, so `"2,053 scrobbles"` yields `2053`.
///
/// ```rust
/// use lfcircle::parsing::parse_count;
///
/// assert_eq!(parse_count(" 2,053 scrobbles "), Some(2053));
/// assert_eq!(parse_count("5 hours"), Some(5));
/// assert_eq!(parse_count("none"), None);
/// ```
pub fn parse_count(text: &str) -> Option<u64> {
    let found = COUNT_PATTERN.find(text)?;
    found.as_str().replace(',', "").parse::<u64>().ok()
}

/// Extract a listening report from raw page markup, resolving links against
/// the public Last.fm site.
///
/// Fails with [`LfCircleError::Extraction`] only when the scrobble total
/// cannot be found.
pub fn extract(markup: &str, user: &str) -> Result<ListeningReport> {
    ReportParser::new().parse_markup(markup, user)
}

/// Parser for weekly listening report pages.
///
/// The parser is stateless apart from the base URL used to resolve relative
/// links, so a single instance can be shared across all targets of a run.
#[derive(Debug, Clone)]
pub struct ReportParser {
    base_url: String,
}

impl Default for ReportParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportParser {
    /// Create a parser resolving links against [`DEFAULT_BASE_URL`].
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Create a parser resolving links against a custom base URL.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Parse raw markup for one user's report page.
    pub fn parse_markup(&self, markup: &str, user: &str) -> Result<ListeningReport> {
        let document = Html::parse_document(markup);
        self.parse_listening_report(&document, user)
    }

    /// Parse an already-parsed report page into a [`ListeningReport`].
    pub fn parse_listening_report(&self, document: &Html, user: &str) -> Result<ListeningReport> {
        let url = report_url(&self.base_url, user);
        let scrobble_count = self.parse_scrobble_total(document)?;

        if scrobble_count == 0 {
            log::debug!("{user} has no scrobbles this week");
            return Ok(ListeningReport::inactive(user, url));
        }

        let report = ListeningReport {
            user: user.to_string(),
            report_url: url,
            scrobble_count,
            artist_count: self.parse_distinct_count(document, EntityKind::Artist)?,
            album_count: self.parse_distinct_count(document, EntityKind::Album)?,
            track_count: self.parse_distinct_count(document, EntityKind::Track)?,
            top_artist: self.parse_top_entity(document, EntityKind::Artist)?,
            top_album: self.parse_top_entity(document, EntityKind::Album)?,
            top_track: self.parse_top_entity(document, EntityKind::Track)?,
            listening_hours: self.parse_listening_hours(document)?,
        };

        log::debug!(
            "Parsed report for {user}: {} scrobbles, {}/{}/{} artists/albums/tracks",
            report.scrobble_count,
            report.artist_count,
            report.album_count,
            report.track_count
        );

        Ok(report)
    }

    /// The headline scrobble total. This is the one figure every report page has.
    fn parse_scrobble_total(&self, document: &Html) -> Result<u64> {
        let total_selector = selector(".report-headline-total")?;

        let element = document.select(&total_selector).next().ok_or_else(|| {
            LfCircleError::Extraction("scrobble total not found on page".to_string())
        })?;

        let text = element_text(element);
        parse_count(&text).ok_or_else(|| {
            LfCircleError::Extraction(format!("scrobble total '{text}' is not a number"))
        })
    }

    /// Distinct artists, albums or tracks. Missing overviews count as zero.
    fn parse_distinct_count(&self, document: &Html, kind: EntityKind) -> Result<u64> {
        let overview_selector = selector(&format!(
            ".top-item-overview--{} .top-item-overview__scrobbles",
            kind.as_str()
        ))?;

        let count = document
            .select(&overview_selector)
            .next()
            .and_then(|element| parse_count(&element_text(element)));

        if count.is_none() {
            log::debug!("No {} overview found, assuming 0", kind.plural());
        }

        Ok(count.unwrap_or(0))
    }

    /// The top artist, album or track from its modal block, if the page has one.
    fn parse_top_entity(&self, document: &Html, kind: EntityKind) -> Result<Option<TopEntity>> {
        let block_selector = selector(&format!("#top-{}", kind.as_str()))?;
        let header_selector = selector(".top-item-modal-header")?;
        let value_selector = selector(".top-item-modal-data-item-value")?;
        let link_selector = selector(".top-item-modal-link-text")?;

        let Some(block) = document.select(&block_selector).next() else {
            log::debug!("No top {kind} block found");
            return Ok(None);
        };

        let name = block
            .select(&header_selector)
            .next()
            .map(element_text)
            .unwrap_or_default();
        if name.is_empty() {
            log::debug!("Top {kind} block has no name");
            return Ok(None);
        }

        let scrobbles = block
            .select(&value_selector)
            .next()
            .and_then(|element| parse_count(&element_text(element)))
            .unwrap_or(0);

        let href = block
            .select(&link_selector)
            .find_map(|element| element.value().attr("href"));

        Ok(Some(TopEntity::from_link(
            kind,
            &name,
            scrobbles,
            href,
            &self.base_url,
        )))
    }

    /// Listening time from the "Listening time" quick fact, in whole hours.
    ///
    /// The fact is shown as days in the main value and remaining hours in the
    /// detail line.
    fn parse_listening_hours(&self, document: &Html) -> Result<Option<u64>> {
        let fact_selector = selector(".report-box-container--quick-fact")?;
        let value_selector = selector(".quick-fact-data-value")?;
        let detail_selector = selector(".quick-fact-data-detail")?;

        let Some(fact) = document
            .select(&fact_selector)
            .find(|fact| element_text(*fact).contains(LISTENING_TIME_NEEDLE))
        else {
            log::debug!("No listening time fact found");
            return Ok(None);
        };

        let Some(value_text) = fact.select(&value_selector).next().map(element_text) else {
            return Ok(None);
        };
        let Some(value) = parse_count(&value_text) else {
            return Ok(None);
        };

        let detail_hours = fact
            .select(&detail_selector)
            .next()
            .and_then(|element| parse_count(&element_text(element)))
            .unwrap_or(0);

        if value_text.to_lowercase().contains("hour") {
            return Ok(Some(value));
        }

        let hours = value
            .checked_mul(24)
            .and_then(|hours| hours.checked_add(detail_hours));
        if hours.is_none() {
            log::debug!("Listening time '{value_text}' is out of range, ignoring it");
        }

        Ok(hours)
    }
}
