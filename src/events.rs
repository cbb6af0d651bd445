//! # Circle Events
//!
//! Progress and failure notices emitted while a circle report is assembled.
//! The coordinator never prints anything itself; consumers subscribe to a
//! broadcast channel and decide how to surface these.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Events emitted by the report pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CircleEvent {
    /// A target's report was fetched and parsed.
    TargetFetched {
        /// The timestamp when the report became available
        timestamp: DateTime<Utc>,
        /// The target user
        user: String,
        /// 1-based position of the target in the de-duplicated target list
        index: usize,
        /// Number of targets in the run
        total: usize,
    },
    /// A target was dropped from the ranking.
    TargetSkipped {
        /// The timestamp when the target was dropped
        timestamp: DateTime<Utc>,
        /// The target user
        user: String,
        /// Why the target was dropped
        reason: String,
    },
    /// The fetcher hit a rate limit and is about to wait.
    RateLimited {
        /// The timestamp when the rate limit was detected
        timestamp: DateTime<Utc>,
        /// The target whose fetch was rate limited
        user: String,
        /// Number of seconds before the next attempt
        delay_seconds: u64,
    },
}

impl CircleEvent {
    /// The user this event is about.
    pub fn user(&self) -> &str {
        match self {
            CircleEvent::TargetFetched { user, .. }
            | CircleEvent::TargetSkipped { user, .. }
            | CircleEvent::RateLimited { user, .. } => user,
        }
    }
}

/// A handle for receiving circle events.
pub type CircleEventReceiver = broadcast::Receiver<CircleEvent>;

/// A handle for sending circle events.
pub type CircleEventSender = broadcast::Sender<CircleEvent>;

/// Creates a new broadcast channel for circle events.
///
/// The channel has a capacity of 100 events.
pub fn create_event_channel() -> (CircleEventSender, CircleEventReceiver) {
    broadcast::channel(100)
}

/// Helper trait for emitting circle events.
pub trait CircleEventEmitter {
    fn emit_target_fetched(&self, user: &str, index: usize, total: usize);

    fn emit_target_skipped(&self, user: &str, reason: &str);

    fn emit_rate_limited(&self, user: &str, delay_seconds: u64);
}

impl CircleEventEmitter for Option<CircleEventSender> {
    fn emit_target_fetched(&self, user: &str, index: usize, total: usize) {
        if let Some(sender) = self {
            let event = CircleEvent::TargetFetched {
                timestamp: Utc::now(),
                user: user.to_string(),
                index,
                total,
            };
            let _ = sender.send(event); // Ignore send errors (no receivers)
        }
    }

    fn emit_target_skipped(&self, user: &str, reason: &str) {
        if let Some(sender) = self {
            let event = CircleEvent::TargetSkipped {
                timestamp: Utc::now(),
                user: user.to_string(),
                reason: reason.to_string(),
            };
            let _ = sender.send(event); // Ignore send errors (no receivers)
        }
    }

    fn emit_rate_limited(&self, user: &str, delay_seconds: u64) {
        if let Some(sender) = self {
            let event = CircleEvent::RateLimited {
                timestamp: Utc::now(),
                user: user.to_string(),
                delay_seconds,
            };
            let _ = sender.send(event); // Ignore send errors (no receivers)
        }
    }
}
