use chrono::NaiveDate;
use mentor_match_domain::calendar::{CalendarCell, CalendarService};
use yew::prelude::*;

use crate::services::date_utils::today;

/// How the availability page shows the schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AvailabilityView {
    Month,
    Week,
    List,
}

impl AvailabilityView {
    pub const ALL: [AvailabilityView; 3] = [
        AvailabilityView::Month,
        AvailabilityView::Week,
        AvailabilityView::List,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            AvailabilityView::Month => "Calendar",
            AvailabilityView::Week => "Week",
            AvailabilityView::List => "List",
        }
    }
}

#[derive(Clone, PartialEq)]
pub struct CalendarState {
    pub reference: NaiveDate,
    pub view: AvailabilityView,
    pub title: String,
    pub month_cells: Vec<CalendarCell>,
    pub week_days: Vec<NaiveDate>,
}

pub struct UseCalendarResult {
    pub state: CalendarState,
    pub actions: UseCalendarActions,
}

#[derive(Clone, PartialEq)]
pub struct UseCalendarActions {
    pub previous: Callback<MouseEvent>,
    pub next: Callback<MouseEvent>,
    pub go_today: Callback<MouseEvent>,
    pub set_view: Callback<AvailabilityView>,
}

/// Reference date one step back or forward in the current view
pub fn step(reference: NaiveDate, view: AvailabilityView, forward: bool) -> NaiveDate {
    let calendar = CalendarService::new();
    match (view, forward) {
        (AvailabilityView::Week, false) => calendar.previous_week(reference),
        (AvailabilityView::Week, true) => calendar.next_week(reference),
        (_, false) => calendar.previous_month(reference),
        (_, true) => calendar.next_month(reference),
    }
}

#[hook]
pub fn use_calendar() -> UseCalendarResult {
    let reference = use_state(today);
    let view = use_state(|| AvailabilityView::Month);

    let previous = {
        let reference = reference.clone();
        let view = view.clone();
        use_callback((*reference, *view), move |_: MouseEvent, (current, mode)| {
            reference.set(step(*current, *mode, false));
        })
    };

    let next = {
        let reference = reference.clone();
        let view = view.clone();
        use_callback((*reference, *view), move |_: MouseEvent, (current, mode)| {
            reference.set(step(*current, *mode, true));
        })
    };

    let go_today = {
        let reference = reference.clone();
        use_callback((), move |_: MouseEvent, _| reference.set(today()))
    };

    let set_view = {
        let view = view.clone();
        use_callback((), move |mode: AvailabilityView, _| view.set(mode))
    };

    let calendar = CalendarService::new();
    let title = match *view {
        AvailabilityView::Week => calendar.week_title(*reference),
        _ => calendar.month_title(*reference),
    };

    let state = CalendarState {
        reference: *reference,
        view: *view,
        title,
        month_cells: calendar.month_grid(*reference),
        week_days: calendar.week_grid(*reference),
    };

    let actions = UseCalendarActions {
        previous,
        next,
        go_today,
        set_view,
    };

    UseCalendarResult { state, actions }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_follows_view() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        assert_eq!(
            step(date, AvailabilityView::Week, true),
            NaiveDate::from_ymd_opt(2024, 2, 7).unwrap()
        );
        assert_eq!(
            step(date, AvailabilityView::Month, true).format("%Y-%m").to_string(),
            "2024-02"
        );
        assert_eq!(
            step(date, AvailabilityView::List, false).format("%Y-%m").to_string(),
            "2023-12"
        );
    }
}
