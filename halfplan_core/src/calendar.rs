//! Calendar mapping between plan coordinates and dates.
//!
//! Plan weeks run Sunday through Saturday and are anchored backwards from
//! the Sunday of the race's calendar week. All arithmetic happens on
//! `NaiveDate` values: timestamps are first reduced to their local calendar
//! day, so time of day and UTC offsets never shift a workout onto the
//! neighbouring day.

use crate::{Error, Result};
use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, TimeZone};

/// Local calendar day of a timestamp
pub fn local_day<Tz: TimeZone>(instant: &DateTime<Tz>) -> NaiveDate {
    instant.with_timezone(&Local).date_naive()
}

/// Today's local calendar day, read from the system clock
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Parse a user-supplied date
///
/// Accepts a bare `YYYY-MM-DD` (taken as that local calendar day) or an
/// RFC 3339 timestamp (reduced to its local calendar day).
pub fn parse_day(input: &str) -> Result<NaiveDate> {
    let trimmed = input.trim();
    if let Ok(day) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(day);
    }
    if let Ok(instant) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(local_day(&instant));
    }
    Err(Error::Validation(format!(
        "'{}' is not a date (expected YYYY-MM-DD or an RFC 3339 timestamp)",
        input
    )))
}

/// Sunday that begins the calendar week containing `day`
pub fn week_sunday(day: NaiveDate) -> NaiveDate {
    day - Duration::days(i64::from(day.weekday().num_days_from_sunday()))
}

/// Day-of-week index with 0 = Sunday
pub fn day_of_week(day: NaiveDate) -> u8 {
    // num_days_from_sunday is always < 7
    day.weekday().num_days_from_sunday() as u8
}

/// Sunday that begins plan week `week_number`
///
/// `week_start_date(race, n, n)` is always the Sunday of the race week.
pub fn week_start_date(race_date: NaiveDate, week_number: u32, total_weeks: u32) -> NaiveDate {
    let weeks_before_race = i64::from(total_weeks) - i64::from(week_number);
    week_sunday(race_date) - Duration::weeks(weeks_before_race)
}

/// Calendar date of the workout at (week_number, day_of_week)
pub fn workout_date(
    race_date: NaiveDate,
    week_number: u32,
    day_of_week: u8,
    total_weeks: u32,
) -> NaiveDate {
    week_start_date(race_date, week_number, total_weeks) + Duration::days(i64::from(day_of_week))
}

/// Whole weeks between the Sunday of `today`'s week and the Sunday of race week
///
/// Negative once the race week has passed.
pub fn weeks_until_race(race_date: NaiveDate, today: NaiveDate) -> i64 {
    let days = (week_sunday(race_date) - week_sunday(today)).num_days();
    days.div_euclid(7)
}

/// Plan week that `today` falls in, clamped to `[1, total_weeks]`
pub fn current_week_number(race_date: NaiveDate, total_weeks: u32, today: NaiveDate) -> u32 {
    let total = total_weeks.max(1);
    let current = i64::from(total) - weeks_until_race(race_date, today);
    // clamped into u32 range by construction
    current.clamp(1, i64::from(total)) as u32
}

/// Plan week whose Sunday-to-Saturday span contains `day`
///
/// Scans weeks `1..=total_weeks` in order; `None` when the day lies outside
/// the plan.
pub fn resolve_week(race_date: NaiveDate, total_weeks: u32, day: NaiveDate) -> Option<u32> {
    (1..=total_weeks).find(|&week| {
        let start = week_start_date(race_date, week, total_weeks);
        day >= start && day < start + Duration::days(7)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Weekday};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_week_sunday() {
        // 2026-03-18 is a Wednesday
        assert_eq!(week_sunday(date(2026, 3, 18)), date(2026, 3, 15));
        assert_eq!(week_sunday(date(2026, 3, 15)), date(2026, 3, 15));
        assert_eq!(week_sunday(date(2026, 3, 21)), date(2026, 3, 15));
    }

    #[test]
    fn test_race_week_start_is_race_sunday_for_any_weekday() {
        let sunday = date(2026, 5, 3);
        for offset in 0..7 {
            let race = sunday + Duration::days(offset);
            assert_eq!(week_start_date(race, 12, 12), sunday);
            assert_eq!(week_start_date(race, 6, 6), sunday);
        }
    }

    #[test]
    fn test_race_week_sunday_workout_shares_race_calendar_week() {
        let sunday = date(2026, 5, 3);
        for offset in 0..7 {
            let race = sunday + Duration::days(offset);
            for total in 1..=12 {
                let first_day = workout_date(race, total, 0, total);
                assert_eq!(first_day.weekday(), Weekday::Sun);
                assert!(first_day <= race);
                assert!(race - first_day < Duration::days(7));
            }
        }
    }

    #[test]
    fn test_workout_date_counts_back_from_race() {
        // Race on Sunday 2026-05-03, 12 week plan
        let race = date(2026, 5, 3);
        assert_eq!(workout_date(race, 1, 0, 12), date(2026, 2, 15));
        assert_eq!(workout_date(race, 1, 1, 12), date(2026, 2, 16));
        assert_eq!(workout_date(race, 12, 0, 12), race);
        assert_eq!(workout_date(race, 11, 6, 12), date(2026, 5, 2));
    }

    #[test]
    fn test_weeks_until_race() {
        let race = date(2026, 5, 3);
        assert_eq!(weeks_until_race(race, race), 0);
        assert_eq!(weeks_until_race(race, date(2026, 5, 9)), 0);
        assert_eq!(weeks_until_race(race, date(2026, 5, 2)), 1);
        assert_eq!(weeks_until_race(race, date(2026, 2, 9)), 12);
        assert_eq!(weeks_until_race(race, date(2026, 5, 10)), -1);
    }

    #[test]
    fn test_current_week_number_clamped() {
        let race = date(2026, 5, 3);
        assert_eq!(current_week_number(race, 12, date(2025, 1, 1)), 1);
        assert_eq!(current_week_number(race, 12, date(2027, 1, 1)), 12);
        assert_eq!(current_week_number(race, 12, date(2026, 4, 29)), 11);
        assert_eq!(current_week_number(race, 12, race), 12);
        assert_eq!(current_week_number(race, 0, race), 1);
    }

    #[test]
    fn test_current_week_number_monotonic() {
        let race = date(2026, 5, 6);
        for total in [1u32, 4, 6, 12] {
            let mut previous = 0;
            let mut day = date(2025, 12, 1);
            while day <= date(2026, 6, 30) {
                let week = current_week_number(race, total, day);
                assert!((1..=total).contains(&week));
                assert!(week >= previous);
                previous = week;
                day = day + Duration::days(1);
            }
        }
    }

    #[test]
    fn test_resolve_week() {
        let race = date(2026, 5, 3);
        assert_eq!(resolve_week(race, 12, date(2026, 2, 15)), Some(1));
        assert_eq!(resolve_week(race, 12, date(2026, 2, 21)), Some(1));
        assert_eq!(resolve_week(race, 12, date(2026, 2, 22)), Some(2));
        assert_eq!(resolve_week(race, 12, date(2026, 5, 9)), Some(12));
        assert_eq!(resolve_week(race, 12, date(2026, 5, 10)), None);
        assert_eq!(resolve_week(race, 12, date(2026, 2, 14)), None);
    }

    #[test]
    fn test_parse_day_formats() {
        assert_eq!(parse_day("2026-05-03").unwrap(), date(2026, 5, 3));
        assert_eq!(parse_day(" 2026-05-03 ").unwrap(), date(2026, 5, 3));
        assert!(parse_day("May 3rd").is_err());

        let stamp = "2026-05-03T12:00:00Z";
        let expected = local_day(&DateTime::parse_from_rfc3339(stamp).unwrap());
        assert_eq!(parse_day(stamp).unwrap(), expected);
    }

    #[test]
    fn test_local_day_ignores_time_of_day() {
        let offset = FixedOffset::east_opt(0).unwrap();
        let morning = offset.with_ymd_and_hms(2026, 5, 3, 11, 0, 0).unwrap();
        let afternoon = offset.with_ymd_and_hms(2026, 5, 3, 13, 0, 0).unwrap();
        assert_eq!(local_day(&morning), local_day(&afternoon));
    }

    #[test]
    fn test_day_of_week() {
        assert_eq!(day_of_week(date(2026, 5, 3)), 0);
        assert_eq!(day_of_week(date(2026, 5, 9)), 6);
    }
}
