//! Event types and the in-process event bus
//!
//! The analysis lifecycle publishes an event at every state change. Events
//! are observational: publishing with no subscribers is not an error.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Rumble event types
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RumbleEvent {
    /// Detectors are about to run for a song
    AnalysisStarted {
        song_id: String,
        timestamp: DateTime<Utc>,
    },

    /// Both detectors succeeded and initial combos were generated
    AnalysisCompleted {
        song_id: String,
        bpm: f64,
        segment_count: usize,
        combo_count: usize,
        timestamp: DateTime<Utc>,
    },

    /// A detector failed; the record is terminal
    AnalysisFailed {
        song_id: String,
        error: String,
        timestamp: DateTime<Utc>,
    },

    /// Uploaded audio file removed after the cleanup delay
    UploadPurged {
        song_id: String,
        timestamp: DateTime<Utc>,
    },
}

impl RumbleEvent {
    pub fn song_id(&self) -> &str {
        match self {
            RumbleEvent::AnalysisStarted { song_id, .. }
            | RumbleEvent::AnalysisCompleted { song_id, .. }
            | RumbleEvent::AnalysisFailed { song_id, .. }
            | RumbleEvent::UploadPurged { song_id, .. } => song_id,
        }
    }

    /// Event name for logging
    pub fn event_type(&self) -> &'static str {
        match self {
            RumbleEvent::AnalysisStarted { .. } => "AnalysisStarted",
            RumbleEvent::AnalysisCompleted { .. } => "AnalysisCompleted",
            RumbleEvent::AnalysisFailed { .. } => "AnalysisFailed",
            RumbleEvent::UploadPurged { .. } => "UploadPurged",
        }
    }
}

/// Broadcast channel for [`RumbleEvent`]s
///
/// Uses `tokio::sync::broadcast`: publishing never blocks, slow subscribers
/// observe `Lagged` instead of stalling producers.
///
/// ```
/// use rumble_common::events::{EventBus, RumbleEvent};
///
/// let bus = EventBus::new(16);
/// let mut rx = bus.subscribe();
/// bus.emit_lossy(RumbleEvent::UploadPurged {
///     song_id: "abc".to_string(),
///     timestamp: chrono::Utc::now(),
/// });
/// assert_eq!(rx.try_recv().unwrap().song_id(), "abc");
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<RumbleEvent>,
}

impl EventBus {
    /// Creates a new EventBus buffering up to `capacity` events per subscriber
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<RumbleEvent> {
        self.tx.subscribe()
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: RumbleEvent) {
        let _ = self.tx.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_without_subscribers_is_silent() {
        let bus = EventBus::new(4);
        bus.emit_lossy(RumbleEvent::AnalysisStarted {
            song_id: "s".to_string(),
            timestamp: Utc::now(),
        });

        // Late subscribers only see later events
        let mut rx = bus.subscribe();
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_subscribers_receive_in_order() {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();

        bus.emit_lossy(RumbleEvent::AnalysisStarted {
            song_id: "s".to_string(),
            timestamp: Utc::now(),
        });
        bus.emit_lossy(RumbleEvent::AnalysisFailed {
            song_id: "s".to_string(),
            error: "boom".to_string(),
            timestamp: Utc::now(),
        });

        assert_eq!(rx.recv().await.unwrap().event_type(), "AnalysisStarted");
        let second = rx.recv().await.unwrap();
        assert_eq!(second.event_type(), "AnalysisFailed");
        assert_eq!(second.song_id(), "s");
    }

    #[test]
    fn test_event_serializes_with_type_tag() {
        let event = RumbleEvent::UploadPurged {
            song_id: "s".to_string(),
            timestamp: Utc::now(),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "UploadPurged");
        assert_eq!(value["song_id"], "s");
    }
}
