//! Field validators and calendar helpers.
//!
//! Every parser here returns [`AppError::InvalidInput`] on rejection so an
//! interactive caller can ask again until the value passes.

use crate::error::AppError;
use crate::model::{Difficulty, Priority, TaskStatus};
use time::macros::time;
use time::{Date, Duration, Month, OffsetDateTime, Time, UtcOffset};

/// Time of day used when a date-only value becomes a timestamp.
pub const REFERENCE_TIME: Time = time!(03:00);

pub fn check_year_format(year: &str) -> bool {
    year.len() == 4 && year.bytes().all(|b| b.is_ascii_digit())
}

pub fn check_month_format(month: &str) -> bool {
    two_digits_within(month, 1, 12)
}

pub fn check_day_format(day: &str) -> bool {
    two_digits_within(day, 1, 31)
}

fn two_digits_within(value: &str, min: u8, max: u8) -> bool {
    if value.len() != 2 || !value.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }

    value
        .parse::<u8>()
        .map(|number| (min..=max).contains(&number))
        .unwrap_or(false)
}

/// Whether the triple names a day that exists (no Feb 30, no Apr 31).
pub fn is_valid_date(year: i32, month: u8, day: u8) -> bool {
    calendar_date(year, month, day).is_some()
}

fn calendar_date(year: i32, month: u8, day: u8) -> Option<Date> {
    let month = Month::try_from(month).ok()?;
    Date::from_calendar_date(year, month, day).ok()
}

pub fn validate_date_parts(year: &str, month: &str, day: &str) -> bool {
    date_from_parts(year, month, day).is_some()
}

pub fn date_from_parts(year: &str, month: &str, day: &str) -> Option<Date> {
    if !check_year_format(year) || !check_month_format(month) || !check_day_format(day) {
        return None;
    }

    calendar_date(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)
}

pub fn date_to_string(year: &str, month: &str, day: &str) -> String {
    format!("{year}-{month:0>2}-{day:0>2}")
}

/// Parse a `YYYY-MM-DD` date, checking each component before the triple.
pub fn parse_date(input: &str) -> Result<Date, AppError> {
    let trimmed = input.trim();
    let mut parts = trimmed.splitn(3, '-');
    let (Some(year), Some(month), Some(day)) = (parts.next(), parts.next(), parts.next()) else {
        return Err(AppError::invalid_input("date must be YYYY-MM-DD"));
    };

    if !check_year_format(year) {
        return Err(AppError::invalid_input("year must be four digits (YYYY)"));
    }
    if !check_month_format(month) {
        return Err(AppError::invalid_input("month must be 01-12 (MM)"));
    }
    if !check_day_format(day) {
        return Err(AppError::invalid_input("day must be 01-31 (DD)"));
    }

    date_from_parts(year, month, day).ok_or_else(|| {
        AppError::invalid_input(format!("{} is not a calendar date", date_to_string(year, month, day)))
    })
}

pub fn at_reference_hour(date: Date) -> OffsetDateTime {
    date.with_time(REFERENCE_TIME).assume_utc()
}

pub fn local_offset() -> UtcOffset {
    UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC)
}

pub fn today() -> Date {
    OffsetDateTime::now_utc().to_offset(local_offset()).date()
}

/// The local calendar day of `now`, stamped at the reference hour.
pub fn day_stamp(now: OffsetDateTime) -> OffsetDateTime {
    at_reference_hour(now.to_offset(local_offset()).date())
}

/// UTC with whole-second precision, the resolution timestamps are stored at.
pub fn normalize_timestamp(value: OffsetDateTime) -> OffsetDateTime {
    let utc = value.to_offset(UtcOffset::UTC);
    utc - Duration::nanoseconds(i64::from(utc.nanosecond()))
}

pub fn now() -> OffsetDateTime {
    normalize_timestamp(OffsetDateTime::now_utc())
}

pub fn validate_due_date(date: Date, today: Date) -> Result<OffsetDateTime, AppError> {
    if date <= today {
        return Err(AppError::invalid_input("due date must be after today"));
    }
    Ok(at_reference_hour(date))
}

pub fn parse_due_date(input: &str, today: Date) -> Result<OffsetDateTime, AppError> {
    validate_due_date(parse_date(input)?, today)
}

pub fn require_text(field: &str, input: &str) -> Result<String, AppError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(AppError::invalid_input(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

fn parse_choice(input: &str, max: u8) -> Result<u8, AppError> {
    input
        .trim()
        .parse::<u8>()
        .ok()
        .filter(|choice| (1..=max).contains(choice))
        .ok_or_else(|| AppError::invalid_input(format!("choose a number between 1 and {max}")))
}

pub fn parse_priority_choice(input: &str) -> Result<Priority, AppError> {
    let choice = parse_choice(input, Priority::ALL.len() as u8)?;
    Priority::from_choice(choice).ok_or_else(|| AppError::invalid_input("unknown priority"))
}

pub fn parse_status_choice(input: &str) -> Result<TaskStatus, AppError> {
    let choice = parse_choice(input, TaskStatus::ALL.len() as u8)?;
    TaskStatus::from_choice(choice).ok_or_else(|| AppError::invalid_input("unknown status"))
}

pub fn parse_difficulty(input: &str) -> Result<Difficulty, AppError> {
    let choice = parse_choice(input, Difficulty::MAX)?;
    Difficulty::new(choice).ok_or_else(|| AppError::invalid_input("difficulty must be 1-5"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime};

    #[test]
    fn component_formats() {
        assert!(check_year_format("2026"));
        assert!(!check_year_format("26"));
        assert!(!check_year_format("2O26"));

        assert!(check_month_format("01"));
        assert!(check_month_format("12"));
        assert!(!check_month_format("1"));
        assert!(!check_month_format("13"));
        assert!(!check_month_format("00"));

        assert!(check_day_format("31"));
        assert!(!check_day_format("32"));
        assert!(!check_day_format("7"));
    }

    #[test]
    fn rejects_dates_that_do_not_exist() {
        assert!(is_valid_date(2028, 2, 29));
        assert!(!is_valid_date(2027, 2, 29));
        assert!(!validate_date_parts("2026", "02", "30"));
        assert!(!validate_date_parts("2026", "04", "31"));
        assert_eq!(
            date_from_parts("2026", "12", "31"),
            Some(date!(2026 - 12 - 31))
        );
    }

    #[test]
    fn date_to_string_pads_components() {
        assert_eq!(date_to_string("2026", "3", "7"), "2026-03-07");
        assert_eq!(date_to_string("2026", "11", "21"), "2026-11-21");
    }

    #[test]
    fn parse_date_reports_the_failing_component() {
        assert_eq!(parse_date(" 2026-10-19 ").unwrap(), date!(2026 - 10 - 19));

        let err = parse_date("2026-13-01").unwrap_err();
        assert!(err.message().contains("month"));

        let err = parse_date("2026-02-30").unwrap_err();
        assert!(err.message().contains("calendar date"));

        assert_eq!(parse_date("tomorrow").unwrap_err().code(), "invalid_input");
    }

    #[test]
    fn reference_hour_stamp() {
        let stamp = at_reference_hour(date!(2026 - 10 - 20));
        assert_eq!(stamp, datetime!(2026-10-20 03:00 UTC));
    }

    #[test]
    fn due_date_must_be_strictly_after_today() {
        let today = date!(2026 - 10 - 18);
        assert!(validate_due_date(today, today).is_err());
        assert!(validate_due_date(date!(2026 - 10 - 17), today).is_err());
        assert_eq!(
            parse_due_date("2026-10-19", today).unwrap(),
            datetime!(2026-10-19 03:00 UTC)
        );
    }

    #[test]
    fn normalize_timestamp_drops_subseconds_and_offset() {
        let value = datetime!(2026-10-18 12:30:15.987 +02:00);
        assert_eq!(normalize_timestamp(value), datetime!(2026-10-18 10:30:15 UTC));
    }

    #[test]
    fn require_text_rejects_blank_input() {
        assert_eq!(require_text("title", "  ").unwrap_err().code(), "invalid_input");
        assert_eq!(require_text("title", " Buy milk ").unwrap(), "Buy milk");
    }

    #[test]
    fn menu_choices() {
        assert_eq!(parse_priority_choice("3").unwrap(), Priority::High);
        assert!(parse_priority_choice("4").is_err());
        assert!(parse_priority_choice("0").is_err());
        assert_eq!(parse_status_choice("2").unwrap(), TaskStatus::InProgress);
        assert!(parse_status_choice("5").is_err());
        assert_eq!(parse_difficulty("5").unwrap().value(), 5);
        assert!(parse_difficulty("6").is_err());
        assert!(parse_difficulty("x").is_err());
    }
}
