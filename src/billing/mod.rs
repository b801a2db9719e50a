//! Parking cost computation.
//!
//! Billing is duration-based: hours between entry and exit, floored at the
//! minimum billable duration, times the lot's hourly rate, rounded to two
//! decimals.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

/// Minimum billable duration in hours. A stay shorter than this is billed
/// as half an hour.
pub const MIN_BILLABLE_HOURS: f64 = 0.5;

/// Billable duration in hours between entry and exit, floored at
/// [`MIN_BILLABLE_HOURS`]. A clock skew that puts exit before entry also
/// collapses to the floor.
pub fn billable_hours(entry: DateTime<Utc>, exit: DateTime<Utc>) -> f64 {
    let hours = (exit - entry).num_seconds() as f64 / 3600.0;
    hours.max(MIN_BILLABLE_HOURS)
}

/// Round a currency amount to two decimals
pub fn round_currency(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// Total cost for a stay
pub fn parking_cost(entry: DateTime<Utc>, exit: DateTime<Utc>, price_per_hour: f64) -> f64 {
    round_currency(billable_hours(entry, exit) * price_per_hour)
}

/// Parse an RFC3339 timestamp as stored in the database
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("Invalid timestamp in database: {raw}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn entry() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-06-01T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_short_stay_billed_at_floor() {
        // 20 minutes at 20/hr bills the half-hour floor: 10.00
        let exit = entry() + Duration::minutes(20);
        assert_eq!(parking_cost(entry(), exit, 20.0), 10.0);
    }

    #[test]
    fn test_longer_stay_billed_by_duration() {
        // 90 minutes at 20/hr: 1.5h * 20 = 30.00
        let exit = entry() + Duration::minutes(90);
        assert_eq!(parking_cost(entry(), exit, 20.0), 30.0);
    }

    #[test]
    fn test_exact_half_hour() {
        let exit = entry() + Duration::minutes(30);
        assert_eq!(billable_hours(entry(), exit), 0.5);
    }

    #[test]
    fn test_negative_duration_clamps_to_floor() {
        let exit = entry() - Duration::minutes(10);
        assert_eq!(billable_hours(entry(), exit), MIN_BILLABLE_HOURS);
    }

    #[test]
    fn test_cost_rounds_to_two_decimals() {
        // 40 minutes at 10.55/hr: 0.666..h * 10.55 = 7.0333.. -> 7.03
        let exit = entry() + Duration::minutes(40);
        assert_eq!(parking_cost(entry(), exit, 10.55), 7.03);
    }

    #[test]
    fn test_parse_timestamp_round_trip() {
        let now = entry();
        let parsed = parse_timestamp(&now.to_rfc3339()).unwrap();
        assert_eq!(parsed, now);
        assert!(parse_timestamp("yesterday").is_err());
    }
}
