//! Date and time formatting for views.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use std::fmt::Display;

/// Value format of `<input type="date">`
pub const DATE_INPUT_FORMAT: &str = "%Y-%m-%d";
/// Value format of `<input type="datetime-local">`
pub const DATETIME_INPUT_FORMAT: &str = "%Y-%m-%dT%H:%M";

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// "March 5, 2024 at 2:00 PM" in the viewer's time zone
pub fn format_session_date(instant: &DateTime<Utc>) -> String {
    format_session_date_in(instant, &Local)
}

pub fn format_session_date_in<Tz>(instant: &DateTime<Utc>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    instant
        .with_timezone(tz)
        .format("%B %-d, %Y at %-I:%M %p")
        .to_string()
}

/// "2:00 PM" in the viewer's time zone
pub fn format_time_in<Tz>(instant: &DateTime<Utc>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    instant.with_timezone(tz).format("%-I:%M %p").to_string()
}

pub fn format_time(instant: &DateTime<Utc>) -> String {
    format_time_in(instant, &Local)
}

/// "Mar 5, 2024"
pub fn format_short_date(date: NaiveDate) -> String {
    date.format("%b %-d, %Y").to_string()
}

/// "Tuesday, March 5, 2024"
pub fn format_long_date(date: NaiveDate) -> String {
    date.format("%A, %B %-d, %Y").to_string()
}

/// Label of an `HH:MM` slot, e.g. "2:00 PM"; unparsable values pass through
pub fn format_slot_label(value: &str) -> String {
    NaiveTime::parse_from_str(value, "%H:%M")
        .map(|time| time.format("%-I:%M %p").to_string())
        .unwrap_or_else(|_| value.to_string())
}

pub fn parse_date_input(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_INPUT_FORMAT).ok()
}

pub fn date_input_value(date: NaiveDate) -> String {
    date.format(DATE_INPUT_FORMAT).to_string()
}

/// Parse a `datetime-local` value as wall-clock time in the viewer's zone
pub fn parse_datetime_local(value: &str) -> Option<DateTime<Utc>> {
    parse_datetime_local_in(value, &Local)
}

pub fn parse_datetime_local_in<Tz: TimeZone>(value: &str, tz: &Tz) -> Option<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(value.trim(), DATETIME_INPUT_FORMAT).ok()?;
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
}

/// Check if a date is today in the viewer's zone
pub fn is_today(date: NaiveDate) -> bool {
    date == today()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    #[test]
    fn test_session_date_in_zone() {
        let instant = Utc.with_ymd_and_hms(2024, 3, 5, 14, 0, 0).unwrap();
        assert_eq!(format_session_date_in(&instant, &Utc), "March 5, 2024 at 2:00 PM");

        let east = FixedOffset::east_opt(3 * 3600).unwrap();
        assert_eq!(format_time_in(&instant, &east), "5:00 PM");
    }

    #[test]
    fn test_input_round_trip() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(date_input_value(date), "2024-02-29");
        assert_eq!(parse_date_input(" 2024-02-29 "), Some(date));
        assert_eq!(parse_date_input("29/02/2024"), None);
    }

    #[test]
    fn test_datetime_local_uses_zone() {
        let west = FixedOffset::west_opt(5 * 3600).unwrap();
        let parsed = parse_datetime_local_in("2024-03-05T09:30", &west).unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 3, 5, 14, 30, 0).unwrap());
        assert_eq!(parse_datetime_local_in("", &west), None);
    }

    #[test]
    fn test_labels() {
        assert_eq!(format_slot_label("09:00"), "9:00 AM");
        assert_eq!(format_slot_label("17:00"), "5:00 PM");
        assert_eq!(format_slot_label("later"), "later");
        let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        assert_eq!(format_short_date(date), "Mar 5, 2024");
        assert_eq!(format_long_date(date), "Tuesday, March 5, 2024");
    }
}
