//! Trading-Window Check
//!
//! Answers whether the upstream feed should currently be considered active.
//! The exchange trades 09:15-15:30 local time, a fixed UTC+05:30 offset.
//!
//! This is a deliberately simplified trading-calendar check: no holiday
//! calendar, no daylight-saving adjustment. Callers must not assume
//! exchange-calendar correctness.

use chrono::{DateTime, Timelike, Utc};

/// Fixed offset of the exchange's local time from UTC, in minutes.
const UTC_OFFSET_MINUTES: u32 = 330;

/// Session open, minutes since local midnight (09:15).
const SESSION_OPEN_MINUTE: u32 = 9 * 60 + 15;

/// Session close, minutes since local midnight (15:30).
const SESSION_CLOSE_MINUTE: u32 = 15 * 60 + 30;

/// Check whether the feed is inside the trading window at `now`.
///
/// Inclusive on both boundaries: 09:15 and 15:30 local time both count
/// as open.
#[must_use]
pub fn is_market_open(now: DateTime<Utc>) -> bool {
    let utc_minutes = now.hour() * 60 + now.minute();
    let local_minutes = (utc_minutes + UTC_OFFSET_MINUTES) % 1440;
    (SESSION_OPEN_MINUTE..=SESSION_CLOSE_MINUTE).contains(&local_minutes)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use test_case::test_case;

    use super::*;

    /// Build a UTC instant from exchange-local wall-clock time.
    fn local_time(hour: u32, minute: u32) -> DateTime<Utc> {
        let local_minutes = hour * 60 + minute;
        // Wrap backwards across midnight for early local hours.
        let utc_minutes = (local_minutes + 1440 - UTC_OFFSET_MINUTES) % 1440;
        Utc.with_ymd_and_hms(2024, 6, 3, utc_minutes / 60, utc_minutes % 60, 0)
            .unwrap()
    }

    #[test_case(9, 15, true; "open boundary inclusive")]
    #[test_case(15, 30, true; "close boundary inclusive")]
    #[test_case(9, 14, false; "one minute before open")]
    #[test_case(15, 31, false; "one minute after close")]
    #[test_case(12, 0, true; "midsession")]
    #[test_case(0, 30, false; "overnight")]
    #[test_case(23, 59, false; "late evening")]
    fn window_boundaries(hour: u32, minute: u32, expected: bool) {
        assert_eq!(is_market_open(local_time(hour, minute)), expected);
    }

    #[test]
    fn seconds_do_not_matter() {
        // 15:30:59 local is still inside the window; only minutes count.
        let at_close = local_time(15, 30) + chrono::Duration::seconds(59);
        assert!(is_market_open(at_close));
    }
}
