//! Timestamp utilities

use chrono::{DateTime, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Convert milliseconds to duration
pub fn millis_to_duration(millis: u64) -> std::time::Duration {
    std::time::Duration::from_millis(millis)
}

/// Format seconds as `m:ss` for track positions
///
/// Negative and non-finite inputs clamp to `0:00`.
pub fn format_track_position(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    format!("{}:{:02}", total / 60, total % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_now_returns_valid_timestamp() {
        let timestamp = now();
        // Should be a reasonable timestamp (after year 2000)
        assert!(timestamp.timestamp() > 946_684_800);
    }

    #[tokio::test]
    async fn test_now_successive_calls_advance() {
        let time1 = now();
        tokio::time::sleep(Duration::from_millis(10)).await;
        let time2 = now();
        assert!(time2 > time1);
    }

    #[test]
    fn test_millis_to_duration() {
        assert_eq!(millis_to_duration(0), Duration::ZERO);
        assert_eq!(millis_to_duration(1500), Duration::from_millis(1500));
        assert_eq!(millis_to_duration(300_000), Duration::from_secs(300));
    }

    #[test]
    fn test_format_track_position() {
        assert_eq!(format_track_position(0.0), "0:00");
        assert_eq!(format_track_position(30.0), "0:30");
        assert_eq!(format_track_position(90.4), "1:30");
        assert_eq!(format_track_position(210.0), "3:30");
        assert_eq!(format_track_position(-5.0), "0:00");
        assert_eq!(format_track_position(f64::NAN), "0:00");
    }
}
