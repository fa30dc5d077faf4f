//! Calendar domain logic for the availability settings page.
//!
//! Builds month and week grids, handles month/week navigation and groups
//! sessions by calendar day. All functions are pure; the UI only renders
//! what is computed here.

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use log::debug;
use shared::Session;

/// One cell of a month grid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalendarCell {
    /// Blank cell before the first day of the month
    Padding,
    Day(NaiveDate),
}

impl CalendarCell {
    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            CalendarCell::Padding => None,
            CalendarCell::Day(date) => Some(*date),
        }
    }
}

/// Calendar service that handles all calendar-related computations
#[derive(Debug, Clone, Copy, Default)]
pub struct CalendarService;

impl CalendarService {
    pub fn new() -> Self {
        Self
    }

    /// Month grid for the month containing `reference`: one padding cell per
    /// weekday before the 1st, then one cell per day
    pub fn month_grid(&self, reference: NaiveDate) -> Vec<CalendarCell> {
        let month = reference.month();
        let year = reference.year();
        let days_in_month = self.days_in_month(month, year);
        let first_day = self.first_day_of_month(month, year);

        debug!(
            "🗓️ CALENDAR: Generating grid for {}/{} ({} days, first weekday {})",
            month, year, days_in_month, first_day
        );

        let mut cells = Vec::with_capacity((first_day + days_in_month) as usize);
        cells.extend((0..first_day).map(|_| CalendarCell::Padding));
        cells.extend(
            (1..=days_in_month)
                .filter_map(|day| NaiveDate::from_ymd_opt(year, month, day))
                .map(CalendarCell::Day),
        );
        cells
    }

    /// The 7 consecutive dates of the week containing `reference`, starting on Sunday
    pub fn week_grid(&self, reference: NaiveDate) -> Vec<NaiveDate> {
        let start = self.week_start(reference);
        (0..7).map(|offset| start + Duration::days(offset)).collect()
    }

    pub fn week_start(&self, reference: NaiveDate) -> NaiveDate {
        reference - Duration::days(reference.weekday().num_days_from_sunday() as i64)
    }

    /// Get the number of days in a given month and year
    pub fn days_in_month(&self, month: u32, year: i32) -> u32 {
        match month {
            2 => {
                if self.is_leap_year(year) {
                    29
                } else {
                    28
                }
            }
            4 | 6 | 9 | 11 => 30,
            _ => 31,
        }
    }

    pub fn is_leap_year(&self, year: i32) -> bool {
        year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
    }

    /// Get the first day of month (0 = Sunday, 1 = Monday, etc.)
    pub fn first_day_of_month(&self, month: u32, year: i32) -> u32 {
        NaiveDate::from_ymd_opt(year, month, 1)
            .map(|date| date.weekday().num_days_from_sunday())
            .unwrap_or(0)
    }

    pub fn month_name(&self, month: u32) -> &'static str {
        match month {
            1 => "January",
            2 => "February",
            3 => "March",
            4 => "April",
            5 => "May",
            6 => "June",
            7 => "July",
            8 => "August",
            9 => "September",
            10 => "October",
            11 => "November",
            12 => "December",
            _ => "Invalid Month",
        }
    }

    /// "March 2024"
    pub fn month_title(&self, reference: NaiveDate) -> String {
        format!("{} {}", self.month_name(reference.month()), reference.year())
    }

    /// "Mar 3 - Mar 9, 2024"
    pub fn week_title(&self, reference: NaiveDate) -> String {
        let days = self.week_grid(reference);
        let first = days[0];
        let last = days[6];
        format!(
            "{} - {}, {}",
            first.format("%b %-d"),
            last.format("%b %-d"),
            last.year()
        )
    }

    /// First day of the previous month
    pub fn previous_month(&self, reference: NaiveDate) -> NaiveDate {
        let (year, month) = if reference.month() == 1 {
            (reference.year() - 1, 12)
        } else {
            (reference.year(), reference.month() - 1)
        };
        NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(reference)
    }

    /// First day of the next month
    pub fn next_month(&self, reference: NaiveDate) -> NaiveDate {
        let (year, month) = if reference.month() == 12 {
            (reference.year() + 1, 1)
        } else {
            (reference.year(), reference.month() + 1)
        };
        NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(reference)
    }

    pub fn previous_week(&self, reference: NaiveDate) -> NaiveDate {
        reference - Duration::days(7)
    }

    pub fn next_week(&self, reference: NaiveDate) -> NaiveDate {
        reference + Duration::days(7)
    }

    /// Sessions whose start falls on `date` in the viewer's time zone
    pub fn sessions_on<'a, Tz: TimeZone>(
        &self,
        sessions: &'a [Session],
        date: NaiveDate,
        tz: &Tz,
    ) -> Vec<&'a Session> {
        sessions
            .iter()
            .filter(|session| local_date(&session.date, tz) == date)
            .collect()
    }
}

pub fn local_date<Tz: TimeZone>(instant: &DateTime<Utc>, tz: &Tz) -> NaiveDate {
    instant.with_timezone(tz).date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;
    use shared::SessionStatus;
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn session_at(rfc3339: &str) -> Session {
        Session {
            id: Uuid::new_v4(),
            title: "Check-in".to_string(),
            description: None,
            date: DateTime::parse_from_rfc3339(rfc3339).unwrap().with_timezone(&Utc),
            mentor_id: Uuid::new_v4(),
            mentee_id: Uuid::new_v4(),
            status: SessionStatus::Upcoming,
        }
    }

    #[test]
    fn test_month_grid_cell_count_matches_offset_plus_days() {
        let calendar = CalendarService::new();
        for year in [2023, 2024, 2100] {
            for month in 1..=12 {
                let reference = date(year, month, 15);
                let cells = calendar.month_grid(reference);
                let first = calendar.first_day_of_month(month, year);
                let padding = cells
                    .iter()
                    .take_while(|c| **c == CalendarCell::Padding)
                    .count();

                assert_eq!(padding as u32, first);
                assert_eq!(
                    cells.len() as u32,
                    first + calendar.days_in_month(month, year)
                );
            }
        }
    }

    #[test]
    fn test_month_grid_march_2024() {
        let calendar = CalendarService::new();
        let cells = calendar.month_grid(date(2024, 3, 20));
        // March 1st 2024 is a Friday
        assert_eq!(cells.len(), 5 + 31);
        assert_eq!(cells[5], CalendarCell::Day(date(2024, 3, 1)));
        assert_eq!(cells.last().and_then(|c| c.date()), Some(date(2024, 3, 31)));
    }

    #[test]
    fn test_week_grid_starts_on_sunday() {
        let calendar = CalendarService::new();
        let mut day = date(2023, 12, 25);
        for _ in 0..40 {
            let week = calendar.week_grid(day);
            assert_eq!(week.len(), 7);
            assert_eq!(week[0].weekday().num_days_from_sunday(), 0);
            assert!(week.contains(&day));
            for pair in week.windows(2) {
                assert_eq!(pair[1] - pair[0], Duration::days(1));
            }
            day = day + Duration::days(1);
        }
    }

    #[test]
    fn test_leap_years() {
        let calendar = CalendarService::new();
        assert_eq!(calendar.days_in_month(2, 2024), 29);
        assert_eq!(calendar.days_in_month(2, 2023), 28);
        assert_eq!(calendar.days_in_month(2, 2000), 29);
        assert_eq!(calendar.days_in_month(2, 1900), 28);
    }

    #[test]
    fn test_month_navigation_wraps_years() {
        let calendar = CalendarService::new();
        assert_eq!(calendar.previous_month(date(2024, 1, 31)), date(2023, 12, 1));
        assert_eq!(calendar.next_month(date(2024, 12, 5)), date(2025, 1, 1));
        assert_eq!(calendar.next_week(date(2024, 2, 26)), date(2024, 3, 4));
        assert_eq!(calendar.month_title(date(2024, 3, 1)), "March 2024");
    }

    #[test]
    fn test_week_title() {
        let calendar = CalendarService::new();
        assert_eq!(calendar.week_title(date(2024, 3, 6)), "Mar 3 - Mar 9, 2024");
    }

    #[test]
    fn test_sessions_on_uses_viewer_time_zone() {
        let calendar = CalendarService::new();
        let sessions = vec![
            session_at("2024-03-05T23:30:00Z"),
            session_at("2024-03-05T10:00:00Z"),
        ];

        let utc_matches = calendar.sessions_on(&sessions, date(2024, 3, 5), &Utc);
        assert_eq!(utc_matches.len(), 2);

        // UTC+2: the late session moves to the next day
        let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
        let local_matches = calendar.sessions_on(&sessions, date(2024, 3, 5), &plus_two);
        assert_eq!(local_matches.len(), 1);
        assert_eq!(calendar.sessions_on(&sessions, date(2024, 3, 6), &plus_two).len(), 1);
    }
}
