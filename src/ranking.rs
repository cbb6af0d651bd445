//! Cross-user ranking of listening reports.
//!
//! Every metric is ranked with standard competition ranking ("1224"): users
//! with equal values share a rank and the following rank skips the tied
//! positions. All orderings are computed from the input slice alone, so the
//! result is fully determined by the order the reports are passed in.

use crate::types::{EntityKind, ListeningReport, TopEntity};
use serde::Serialize;
use std::cmp::Ordering;

/// A countable metric users are ranked on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Metric {
    Scrobbles,
    Artists,
    Albums,
    Tracks,
}

impl Metric {
    pub const ALL: [Metric; 4] = [
        Metric::Scrobbles,
        Metric::Artists,
        Metric::Albums,
        Metric::Tracks,
    ];

    /// The value of this metric in a report.
    pub fn value(&self, report: &ListeningReport) -> u64 {
        match self.entity_kind() {
            Some(kind) => report.count(kind),
            None => report.scrobble_count,
        }
    }

    /// The entity kind whose top item accompanies this metric, if any.
    pub fn entity_kind(&self) -> Option<EntityKind> {
        match self {
            Metric::Scrobbles => None,
            Metric::Artists => Some(EntityKind::Artist),
            Metric::Albums => Some(EntityKind::Album),
            Metric::Tracks => Some(EntityKind::Track),
        }
    }
}

/// Competition ranks for a list of values, highest value first.
///
/// The returned vector is parallel to `values`.
///
/// ```rust
/// use lfcircle::ranking::competition_ranks;
///
/// assert_eq!(competition_ranks(&[10, 30, 30, 20]), vec![4, 1, 1, 3]);
/// assert!(competition_ranks(&[]).is_empty());
/// ```
pub fn competition_ranks(values: &[u64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    // Stable sort keeps input order among equal values
    order.sort_by(|&a, &b| values[b].cmp(&values[a]));

    let mut ranks = vec![0; values.len()];
    let mut previous: Option<(u64, usize)> = None;

    for (position, &index) in order.iter().enumerate() {
        let rank = match previous {
            Some((value, rank)) if value == values[index] => rank,
            _ => position + 1,
        };
        ranks[index] = rank;
        previous = Some((values[index], rank));
    }

    ranks
}

/// A user's standing on one metric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Standing {
    /// The metric value
    pub count: u64,
    /// Competition rank among all ranked users (1 = highest)
    pub rank: usize,
    /// The top entity shown next to the count, if any
    pub top: Option<TopEntity>,
}

/// One user's row in the final leaderboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedUser {
    /// 1-based position in display order
    pub position: usize,
    pub user: String,
    pub report_url: String,
    pub listening_hours: Option<u64>,
    pub daily_average: u64,
    pub scrobbles: Standing,
    pub artists: Standing,
    pub albums: Standing,
    pub tracks: Standing,
}

impl RankedUser {
    /// Standing for the given metric.
    pub fn standing(&self, metric: Metric) -> &Standing {
        match metric {
            Metric::Scrobbles => &self.scrobbles,
            Metric::Artists => &self.artists,
            Metric::Albums => &self.albums,
            Metric::Tracks => &self.tracks,
        }
    }
}

/// Users in display order together with their per-metric standings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Ranking {
    users: Vec<RankedUser>,
}

impl Ranking {
    pub fn users(&self) -> &[RankedUser] {
        &self.users
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RankedUser> {
        self.users.iter()
    }

    /// Number of ranked users, which is also the worst possible rank.
    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl<'a> IntoIterator for &'a Ranking {
    type Item = &'a RankedUser;
    type IntoIter = std::slice::Iter<'a, RankedUser>;

    fn into_iter(self) -> Self::IntoIter {
        self.users.iter()
    }
}

/// Display order: scrobble rank first, then longer listening time, then input order.
///
/// Reports without a listening time sort after those with one on the second key.
fn display_order(a: &ListeningReport, b: &ListeningReport) -> Ordering {
    b.scrobble_count
        .cmp(&a.scrobble_count)
        .then_with(|| b.listening_hours.cmp(&a.listening_hours))
}

/// Rank all reports against each other.
///
/// The slice order is the input order used to break remaining ties.
pub fn rank(reports: &[ListeningReport]) -> Ranking {
    let ranks = Metric::ALL.map(|metric| {
        let values: Vec<u64> = reports.iter().map(|r| metric.value(r)).collect();
        competition_ranks(&values)
    });

    let mut order: Vec<usize> = (0..reports.len()).collect();
    order.sort_by(|&a, &b| display_order(&reports[a], &reports[b]));

    let users = order
        .into_iter()
        .enumerate()
        .map(|(position, index)| {
            let report = &reports[index];
            let [scrobbles, artists, albums, tracks] = std::array::from_fn(|slot| {
                let metric = Metric::ALL[slot];
                Standing {
                    count: metric.value(report),
                    rank: ranks[slot][index],
                    top: metric
                        .entity_kind()
                        .and_then(|kind| report.top(kind))
                        .cloned(),
                }
            });

            RankedUser {
                position: position + 1,
                user: report.user.clone(),
                report_url: report.report_url.clone(),
                listening_hours: report.listening_hours,
                daily_average: report.daily_average(),
                scrobbles,
                artists,
                albums,
                tracks,
            }
        })
        .collect();

    Ranking { users }
}
