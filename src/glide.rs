//! Glide slope math and time formatting
//!
//! The glide slope is the fraction of a category's window that has
//! already elapsed, as a percentage. Compared against utilization it
//! tells whether quota is burning faster than the window: utilization
//! above the glide slope means over budget.

use chrono::{DateTime, Local, Timelike, Utc};
use std::time::Instant;

/// Percentage of the window elapsed at `now`, clamped to [0, 100].
///
/// Returns 0.0 when the reset time is unknown or the window length is
/// degenerate.
pub fn glide_slope(resets_at: Option<DateTime<Utc>>, window_seconds: i64, now: DateTime<Utc>) -> f64 {
    let Some(resets_at) = resets_at else {
        return 0.0;
    };
    if window_seconds <= 0 {
        return 0.0;
    }
    let remaining = (resets_at - now).num_seconds();
    let elapsed = window_seconds - remaining;
    let pct = elapsed as f64 / window_seconds as f64 * 100.0;
    pct.clamp(0.0, 100.0)
}

/// Human-readable reset countdown, tiered by how far away it is.
///
/// Each threshold is an exclusive upper bound on the lower tier:
/// exactly 3600 s renders in the hour tier, exactly 86400 s in the
/// absolute day/time tier.
pub fn format_reset_time(resets_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Option<String> {
    let resets_at = resets_at?;
    let remaining = (resets_at - now).num_seconds();
    if remaining <= 0 {
        return Some("Resetting now".to_string());
    }
    if remaining < 3600 {
        return Some(format!("Resets in {} min", remaining / 60));
    }
    if remaining < 24 * 3600 {
        let hrs = remaining / 3600;
        let mins = (remaining % 3600) / 60;
        if mins > 0 {
            return Some(format!("Resets in {} hr {} min", hrs, mins));
        }
        return Some(format!("Resets in {} hr", hrs));
    }
    Some(format_reset_day(resets_at.with_timezone(&Local)))
}

/// Absolute tier: weekday plus 12-hour clock in the viewer's zone,
/// no leading zero on the hour, zero-padded minutes.
fn format_reset_day<Tz: chrono::TimeZone>(local_reset: DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let day = local_reset.format("%a");
    let hour24 = local_reset.hour();
    let hour = match hour24 % 12 {
        0 => 12,
        h => h,
    };
    let ampm = if hour24 < 12 { "AM" } else { "PM" };
    format!("Resets {} {}:{:02} {}", day, hour, local_reset.minute(), ampm)
}

/// "Updated: ..." header string from the last successful fetch
pub fn format_updated_ago(last_success: Option<Instant>) -> String {
    let Some(at) = last_success else {
        return "Updated: never".to_string();
    };
    let elapsed = at.elapsed().as_secs();
    if elapsed < 5 {
        "Updated: just now".to_string()
    } else if elapsed < 60 {
        format!("Updated: {}s ago", elapsed)
    } else if elapsed < 3600 {
        format!("Updated: {}m ago", elapsed / 60)
    } else {
        format!("Updated: {}h ago", elapsed / 3600)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(secs_from_now: i64, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        Some(now + Duration::seconds(secs_from_now))
    }

    #[test]
    fn glide_is_full_at_reset_time() {
        let now = Utc::now();
        assert_eq!(glide_slope(Some(now), 3600, now), 100.0);
        assert_eq!(glide_slope(Some(now), 1, now), 100.0);
    }

    #[test]
    fn glide_is_zero_a_full_window_out() {
        let now = Utc::now();
        assert_eq!(glide_slope(at(18_000, now), 18_000, now), 0.0);
    }

    #[test]
    fn glide_midpoint() {
        let now = Utc::now();
        let pct = glide_slope(at(9_000, now), 18_000, now);
        assert!((pct - 50.0).abs() < 0.01);
    }

    #[test]
    fn glide_clamps_when_overdue_or_far_future() {
        let now = Utc::now();
        assert_eq!(glide_slope(at(-600, now), 3600, now), 100.0);
        assert_eq!(glide_slope(at(7200, now), 3600, now), 0.0);
    }

    #[test]
    fn glide_degenerate_inputs_are_zero() {
        let now = Utc::now();
        assert_eq!(glide_slope(None, 3600, now), 0.0);
        assert_eq!(glide_slope(at(100, now), 0, now), 0.0);
        assert_eq!(glide_slope(at(100, now), -5, now), 0.0);
    }

    #[test]
    fn glide_five_hour_window_one_hour_remaining() {
        // elapsed = 18000 - 3600 = 14400 of 18000, i.e. 80%

        let now = Utc::now();
        let pct = glide_slope(at(3600, now), 18_000, now);
        assert!((pct - 80.0).abs() < 0.01);
    }

    #[test]
    fn glide_half_elapsed_under_heavy_usage_is_over_budget() {
        // 5h window at its halfway point: glide 50, so 80% utilization
        // reads as ahead of schedule.
        let now = Utc::now();
        let glide = glide_slope(at(9_000, now), 18_000, now);
        assert!((glide - 50.0).abs() < 0.01);
        assert!(80.0 > glide);
    }

    #[test]
    fn reset_now_and_overdue() {
        let now = Utc::now();
        assert_eq!(format_reset_time(at(0, now), now).unwrap(), "Resetting now");
        assert_eq!(format_reset_time(at(-30, now), now).unwrap(), "Resetting now");
    }

    #[test]
    fn reset_minutes_tier() {
        let now = Utc::now();
        assert_eq!(format_reset_time(at(90, now), now).unwrap(), "Resets in 1 min");
        assert_eq!(
            format_reset_time(at(3599, now), now).unwrap(),
            "Resets in 59 min"
        );
    }

    #[test]
    fn exactly_one_hour_selects_hour_tier() {
        let now = Utc::now();
        assert_eq!(format_reset_time(at(3600, now), now).unwrap(), "Resets in 1 hr");
    }

    #[test]
    fn hours_tier_with_and_without_minutes() {
        let now = Utc::now();
        assert_eq!(
            format_reset_time(at(2 * 3600 + 300, now), now).unwrap(),
            "Resets in 2 hr 5 min"
        );
        assert_eq!(
            format_reset_time(at(5 * 3600, now), now).unwrap(),
            "Resets in 5 hr"
        );
        assert_eq!(
            format_reset_time(at(24 * 3600 - 1, now), now).unwrap(),
            "Resets in 23 hr 59 min"
        );
    }

    #[test]
    fn exactly_one_day_selects_absolute_tier() {
        let now = Utc::now();
        let s = format_reset_time(at(24 * 3600, now), now).unwrap();
        assert!(s.starts_with("Resets "));
        assert!(!s.starts_with("Resets in"));
        assert!(s.ends_with("AM") || s.ends_with("PM"));
    }

    #[test]
    fn absent_reset_has_no_countdown() {
        assert!(format_reset_time(None, Utc::now()).is_none());
    }

    #[test]
    fn absolute_tier_formatting() {
        // Fixed UTC instants so the 12-hour conversion is deterministic
        let midnight = Utc.with_ymd_and_hms(2026, 8, 12, 0, 5, 0).unwrap();
        assert_eq!(format_reset_day(midnight), "Resets Wed 12:05 AM");
        let noon = Utc.with_ymd_and_hms(2026, 8, 12, 12, 0, 0).unwrap();
        assert_eq!(format_reset_day(noon), "Resets Wed 12:00 PM");
        let evening = Utc.with_ymd_and_hms(2026, 8, 13, 21, 7, 0).unwrap();
        assert_eq!(format_reset_day(evening), "Resets Thu 9:07 PM");
    }

    #[test]
    fn updated_ago_tiers() {
        assert_eq!(format_updated_ago(None), "Updated: never");
        assert_eq!(
            format_updated_ago(Some(Instant::now())),
            "Updated: just now"
        );
    }
}
