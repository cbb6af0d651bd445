//! Data types for Last.fm weekly listening reports.
//!
//! These are the strongly-typed records produced by the report parser. Nothing
//! downstream of [`crate::parsing`] ever looks at page markup again.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Default base URL of the Last.fm website.
pub const DEFAULT_BASE_URL: &str = "https://www.last.fm";

/// Length of the reporting period of a weekly listening report, in days.
pub const REPORT_PERIOD_DAYS: u64 = 7;

/// Separator between an artist and the album or track they released.
pub const QUALIFIED_SEPARATOR: &str = " — ";

/// Build the canonical weekly listening report URL for a user.
///
/// ```rust
/// assert_eq!(
///     lfcircle::types::report_url("https://www.last.fm", "user1"),
///     "https://www.last.fm/user/user1/listening-report/week"
/// );
/// ```
pub fn report_url(base_url: &str, user: &str) -> String {
    format!(
        "{}/user/{}/listening-report/week",
        base_url.trim_end_matches('/'),
        urlencoding::encode(user)
    )
}

/// Encode a path segment the way Last.fm does in its `/music/` links.
fn encode_segment(segment: &str) -> String {
    urlencoding::encode(segment).replace("%20", "+")
}

/// Decode a `/music/` path segment back into display text.
fn decode_segment(segment: &str) -> String {
    let spaced = segment.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|s| s.into_owned())
        .unwrap_or(spaced)
}

/// The kind of entity a top item refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Artist,
    Album,
    Track,
}

impl EntityKind {
    /// Lowercase singular noun, as used in CSS class names on the report page.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Artist => "artist",
            EntityKind::Album => "album",
            EntityKind::Track => "track",
        }
    }

    /// Plural noun used next to the distinct-entity count.
    pub fn plural(&self) -> &'static str {
        match self {
            EntityKind::Artist => "artists",
            EntityKind::Album => "albums",
            EntityKind::Track => "tracks",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The most-played artist, album or track of a reporting period.
///
/// # Examples
///
/// ```rust
/// use lfcircle::types::{EntityKind, TopEntity};
///
/// let album = TopEntity::from_link(
///     EntityKind::Album,
///     "In Rainbows",
///     23,
///     Some("https://www.last.fm/music/Radiohead/In+Rainbows"),
///     "https://www.last.fm",
/// );
///
/// assert_eq!(album.artist.as_deref(), Some("Radiohead"));
/// assert_eq!(album.label(), "Radiohead — In Rainbows");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TopEntity {
    /// What kind of entity this is
    pub kind: EntityKind,
    /// The entity name as shown on the page
    pub name: String,
    /// The artist, recovered from the entity link (always `None` for artists)
    pub artist: Option<String>,
    /// Scrobbles of this entity within the period
    pub scrobbles: u64,
    /// Absolute link to the entity page
    pub url: String,
}

impl TopEntity {
    /// Build a top entity from the name and (optional) link found on the page.
    ///
    /// Links may be absolute or site-relative. When no link is available one is
    /// constructed from the name, in which case album and track entities have no
    /// known artist.
    pub fn from_link(
        kind: EntityKind,
        name: &str,
        scrobbles: u64,
        href: Option<&str>,
        base_url: &str,
    ) -> Self {
        let base_url = base_url.trim_end_matches('/');
        let name = name.trim().to_string();

        let url = match href.map(str::trim).filter(|h| !h.is_empty()) {
            Some(h) if h.starts_with("http://") || h.starts_with("https://") => h.to_string(),
            Some(h) if h.starts_with('/') => format!("{base_url}{h}"),
            Some(h) => format!("{base_url}/{h}"),
            None => match kind {
                EntityKind::Artist => format!("{base_url}/music/{}", encode_segment(&name)),
                _ => format!("{base_url}/search?q={}", encode_segment(&name)),
            },
        };

        let artist = match kind {
            EntityKind::Artist => None,
            _ => artist_from_url(&url),
        };

        Self {
            kind,
            name,
            artist,
            scrobbles,
            url,
        }
    }

    /// Display label: the artist name for artists, `artist — name` otherwise.
    pub fn label(&self) -> String {
        match &self.artist {
            Some(artist) => format!("{artist}{QUALIFIED_SEPARATOR}{}", self.name),
            None => self.name.clone(),
        }
    }
}

impl fmt::Display for TopEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Recover the artist name from a `/music/<artist>/...` link.
///
/// ```rust
/// use lfcircle::types::artist_from_url;
///
/// assert_eq!(
///     artist_from_url("https://www.last.fm/music/Black+Country,+New+Road/_/Concorde"),
///     Some("Black Country, New Road".to_string())
/// );
/// assert_eq!(artist_from_url("https://www.last.fm/user/someone"), None);
/// ```
pub fn artist_from_url(url: &str) -> Option<String> {
    let (_, rest) = url.split_once("/music/")?;
    let segment = rest.split(['/', '?', '#']).next()?;
    if segment.is_empty() {
        return None;
    }
    Some(decode_segment(segment))
}

/// One user's weekly listening report.
///
/// A report with a scrobble count of zero never carries distinct-entity counts
/// or top entities; [`ListeningReport::inactive`] builds exactly that.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListeningReport {
    /// The user identifier, as requested
    pub user: String,
    /// Canonical link to the report page
    pub report_url: String,
    /// Total scrobbles within the period
    pub scrobble_count: u64,
    /// Distinct artists listened to
    pub artist_count: u64,
    /// Distinct albums listened to
    pub album_count: u64,
    /// Distinct tracks listened to
    pub track_count: u64,
    pub top_artist: Option<TopEntity>,
    pub top_album: Option<TopEntity>,
    pub top_track: Option<TopEntity>,
    /// Total listening time in whole hours, when the page reports it
    pub listening_hours: Option<u64>,
}

impl ListeningReport {
    /// A report for a user with no activity in the period.
    pub fn inactive(user: impl Into<String>, report_url: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            report_url: report_url.into(),
            scrobble_count: 0,
            artist_count: 0,
            album_count: 0,
            track_count: 0,
            top_artist: None,
            top_album: None,
            top_track: None,
            listening_hours: None,
        }
    }

    /// Average scrobbles per day over the period, rounded to the nearest whole number.
    pub fn daily_average(&self) -> u64 {
        (self.scrobble_count + REPORT_PERIOD_DAYS / 2) / REPORT_PERIOD_DAYS
    }

    /// Distinct-entity count for the given kind.
    pub fn count(&self, kind: EntityKind) -> u64 {
        match kind {
            EntityKind::Artist => self.artist_count,
            EntityKind::Album => self.album_count,
            EntityKind::Track => self.track_count,
        }
    }

    /// Top entity for the given kind.
    pub fn top(&self, kind: EntityKind) -> Option<&TopEntity> {
        match kind {
            EntityKind::Artist => self.top_artist.as_ref(),
            EntityKind::Album => self.top_album.as_ref(),
            EntityKind::Track => self.top_track.as_ref(),
        }
    }
}
