use chrono::{Datelike, Local, NaiveDate};
use mentor_match_domain::availability_service::is_available_on;
use mentor_match_domain::calendar::{CalendarCell, CalendarService};
use shared::{AvailabilityRule, Session, DAY_NAMES};
use uuid::Uuid;
use yew::prelude::*;

use crate::hooks::use_calendar::AvailabilityView;
use crate::services::date_utils::{format_session_date, format_time, is_today};

#[derive(Properties, PartialEq)]
pub struct CalendarProps {
    pub view: AvailabilityView,
    pub month_cells: Vec<CalendarCell>,
    pub week_days: Vec<NaiveDate>,
    pub rules: Vec<AvailabilityRule>,
    pub sessions: Vec<Session>,
    pub on_toggle_day: Callback<NaiveDate>,
    pub on_select_session: Callback<Uuid>,
}

fn session_chip(session: &Session, on_select: &Callback<Uuid>) -> Html {
    let id = session.id;
    let on_select = on_select.clone();
    let onclick = Callback::from(move |e: MouseEvent| {
        // Keep the click from toggling the day underneath
        e.stop_propagation();
        on_select.emit(id);
    });
    let tooltip = format!("{}\n{}", session.title, format_session_date(&session.date));

    html! {
        <div key={session.id.to_string()}
             class={classes!("session-chip", format!("status-{}", session.status.as_str()))}
             title={tooltip}
             {onclick}>
            <span class="session-time">{ format_time(&session.date) }</span>
            <span class="session-title">{ &session.title }</span>
        </div>
    }
}

fn day_cell(props: &CalendarProps, date: NaiveDate, extended: bool) -> Html {
    let available = is_available_on(&props.rules, date);
    let sessions = CalendarService::new().sessions_on(&props.sessions, date, &Local);
    let onclick = {
        let on_toggle = props.on_toggle_day.clone();
        Callback::from(move |_: MouseEvent| on_toggle.emit(date))
    };
    let class = classes!(
        "calendar-day",
        if available { "available" } else { "unavailable" },
        is_today(date).then_some("today"),
        extended.then_some("week-day"),
    );

    html! {
        <div key={date.to_string()} {class} {onclick}
             title={if available { "Available - click to mark unavailable" } else { "Unavailable - click to mark available" }}>
            <div class="day-header">
                if extended {
                    <div class="day-name">{ DAY_NAMES[date.weekday().num_days_from_sunday() as usize] }</div>
                }
                <div class="day-number">{ date.day() }</div>
            </div>
            <div class="day-sessions">
                { for sessions.into_iter().map(|session| session_chip(session, &props.on_select_session)) }
            </div>
        </div>
    }
}

/// Month or week grid; clicking a day toggles that weekday's availability
#[function_component(Calendar)]
pub fn calendar(props: &CalendarProps) -> Html {
    let cells: Html = match props.view {
        AvailabilityView::Week => props
            .week_days
            .iter()
            .map(|date| day_cell(props, *date, true))
            .collect(),
        _ => props
            .month_cells
            .iter()
            .enumerate()
            .map(|(index, cell)| match cell {
                CalendarCell::Padding => html! { <div key={format!("pad-{}", index)} class="calendar-day empty"></div> },
                CalendarCell::Day(date) => day_cell(props, *date, false),
            })
            .collect(),
    };

    html! {
        <div class="calendar">
            if props.view == AvailabilityView::Month {
                <div class="calendar-weekdays">
                    { for DAY_NAMES.iter().map(|name| html! { <div class="weekday">{ &name[..3] }</div> }) }
                </div>
            }
            <div class={classes!("calendar-grid", (props.view == AvailabilityView::Week).then_some("week-grid"))}>
                { cells }
            </div>
        </div>
    }
}
