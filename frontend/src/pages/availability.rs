//! Mentor availability settings: calendar, weekly rules, sessions, templates
//! and analytics on one page.

use chrono::{Local, NaiveDate, Utc};
use mentor_match_domain::analytics_service::{AnalyticsService, DateRange};
use mentor_match_domain::availability_service::{
    apply_preset, edit_rule, toggle_day, AvailabilityPreset, AvailabilityService, RuleEdit,
};
use mentor_match_domain::export_service::ExportService;
use mentor_match_domain::profile_service::{ProfileService, RoleGate};
use mentor_match_domain::session_service::SessionService;
use mentor_match_domain::template_service::TemplateService;
use shared::{
    AvailabilityRule, ChecklistTemplate, DashboardMetrics, Session, TemplateStats,
    TemplateUsageTrend,
};
use std::rc::Rc;
use uuid::Uuid;
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

use crate::components::analytics_panel::AnalyticsPanel;
use crate::components::availability_editor::AvailabilityEditor;
use crate::components::calendar::Calendar;
use crate::components::dashboard_overview::DashboardOverview;
use crate::components::form_fields::Spinner;
use crate::components::session_modal::{SessionModal, SessionModalView};
use crate::components::template_panel::TemplatePanel;
use crate::context::AppContext;
use crate::hooks::use_calendar::{use_calendar, AvailabilityView};
use crate::route::Route;
use crate::services::date_utils::{format_session_date, today};
use crate::services::download::open_printable;
use crate::services::logging::Logger;

/// Weekly rules as edited on the page. Saving is only possible once the
/// stored rules arrived, so a failed load can never overwrite them.
#[derive(Debug, Clone, PartialEq, Default)]
enum RuleDraft {
    #[default]
    Loading,
    Failed,
    Loaded(Vec<AvailabilityRule>),
}

enum RuleAction {
    Loaded(Vec<AvailabilityRule>),
    LoadFailed,
    ToggleDay(NaiveDate),
    Edit(u8, RuleEdit),
    Preset(AvailabilityPreset),
}

impl RuleDraft {
    fn rules(&self) -> &[AvailabilityRule] {
        match self {
            RuleDraft::Loaded(rules) => rules,
            RuleDraft::Loading | RuleDraft::Failed => &[],
        }
    }

    fn savable(&self) -> Option<&[AvailabilityRule]> {
        match self {
            RuleDraft::Loaded(rules) => Some(rules),
            RuleDraft::Loading | RuleDraft::Failed => None,
        }
    }
}

impl Reducible for RuleDraft {
    type Action = RuleAction;

    fn reduce(self: Rc<Self>, action: Self::Action) -> Rc<Self> {
        let edit = match action {
            RuleAction::Loaded(rules) => return Rc::new(RuleDraft::Loaded(rules)),
            RuleAction::LoadFailed => return Rc::new(RuleDraft::Failed),
            edit => edit,
        };
        // Edits before the rules loaded are dropped
        if self.savable().is_none() {
            return self;
        }

        let mut rules = self.rules().to_vec();
        match edit {
            RuleAction::ToggleDay(date) => toggle_day(&mut rules, date),
            RuleAction::Edit(day_of_week, change) => edit_rule(&mut rules, day_of_week, change),
            RuleAction::Preset(preset) => apply_preset(&mut rules, preset),
            RuleAction::Loaded(_) | RuleAction::LoadFailed => {}
        }
        Rc::new(RuleDraft::Loaded(rules))
    }
}

fn bump(counter: &UseStateHandle<u32>) -> Callback<()> {
    let counter = counter.clone();
    Callback::from(move |_: ()| counter.set(*counter + 1))
}

#[function_component(AvailabilityPage)]
pub fn availability_page() -> Html {
    let Some(ctx) = use_context::<AppContext>() else {
        return html! {};
    };

    let gate_passed = use_state(|| false);
    let rule_draft = use_reducer(RuleDraft::default);
    let sessions = use_state(Vec::<Session>::new);
    let templates = use_state(Vec::<ChecklistTemplate>::new);
    let metrics = use_state(DashboardMetrics::default);
    let sessions_reload = use_state(|| 0u32);
    let templates_reload = use_state(|| 0u32);
    let saving = use_state(|| false);
    let modal = use_state(|| SessionModal::Closed);

    let range_days = use_state(|| ctx.config.analytics_default_days);
    let stats = use_state(Vec::<TemplateStats>::new);
    let trends = use_state(Vec::<TemplateUsageTrend>::new);
    let analytics_loading = use_state(|| true);

    let calendar = use_calendar();
    let mentor_id = ctx.auth.user_id();

    // Only mentors may stay on this page
    {
        let ctx = ctx.clone();
        let gate_passed = gate_passed.clone();
        use_effect_with(mentor_id, move |mentor_id| {
            if let Some(mentor_id) = *mentor_id {
                spawn_local(async move {
                    match ProfileService::new(ctx.client.clone()).require_mentor(mentor_id).await {
                        Ok(RoleGate::Allowed(_)) => gate_passed.set(true),
                        Ok(RoleGate::Denied) => {
                            ctx.toasts.error("Only mentors can manage availability");
                            ctx.navigate.emit(Route::Dashboard);
                        }
                        Err(e) => {
                            ctx.toasts.failure("Role check failed", &e, "Failed to load profile");
                            ctx.navigate.emit(Route::Dashboard);
                        }
                    }
                });
            }
            || ()
        });
    }

    // Rules load once; template and session reloads leave unsaved edits alone
    {
        let client = ctx.client.clone();
        let toasts = ctx.toasts.clone();
        let rule_draft = rule_draft.clone();
        use_effect_with((mentor_id, *gate_passed), move |(mentor_id, gate_passed)| {
            if let (Some(mentor_id), true) = (*mentor_id, *gate_passed) {
                spawn_local(async move {
                    match AvailabilityService::new(client).load(mentor_id).await {
                        Ok(rules) => rule_draft.dispatch(RuleAction::Loaded(rules)),
                        Err(e) => {
                            toasts.failure("Load availability failed", &e, "Failed to load availability");
                            rule_draft.dispatch(RuleAction::LoadFailed);
                        }
                    }
                });
            }
            || ()
        });
    }

    {
        let client = ctx.client.clone();
        let toasts = ctx.toasts.clone();
        let sessions = sessions.clone();
        use_effect_with(
            (mentor_id, *gate_passed, *sessions_reload),
            move |(mentor_id, gate_passed, _)| {
                if let (Some(mentor_id), true) = (*mentor_id, *gate_passed) {
                    spawn_local(async move {
                        match SessionService::new(client)
                            .list_upcoming_for_mentor(mentor_id, Utc::now())
                            .await
                        {
                            Ok(loaded) => sessions.set(loaded),
                            Err(e) => toasts.failure("Load sessions failed", &e, "Failed to load sessions"),
                        }
                    });
                }
                || ()
            },
        );
    }

    {
        let client = ctx.client.clone();
        let toasts = ctx.toasts.clone();
        let templates = templates.clone();
        use_effect_with(
            (mentor_id, *gate_passed, *templates_reload),
            move |(mentor_id, gate_passed, _)| {
                if let (Some(mentor_id), true) = (*mentor_id, *gate_passed) {
                    spawn_local(async move {
                        match TemplateService::new(client).list(mentor_id).await {
                            Ok(loaded) => templates.set(loaded),
                            Err(e) => toasts.failure("Load templates failed", &e, "Failed to load templates"),
                        }
                    });
                }
                || ()
            },
        );
    }

    // Metrics count both sessions and templates
    {
        let client = ctx.client.clone();
        let toasts = ctx.toasts.clone();
        let metrics = metrics.clone();
        use_effect_with(
            (mentor_id, *gate_passed, *sessions_reload, *templates_reload),
            move |(mentor_id, gate_passed, _, _)| {
                if let (Some(mentor_id), true) = (*mentor_id, *gate_passed) {
                    spawn_local(async move {
                        match AnalyticsService::new(client)
                            .dashboard_metrics(mentor_id, Utc::now())
                            .await
                        {
                            Ok(loaded) => metrics.set(loaded),
                            Err(e) => toasts.failure("Load dashboard metrics failed", &e, "Failed to load metrics"),
                        }
                    });
                }
                || ()
            },
        );
    }

    let range = DateRange::last_days(*range_days, Utc::now());
    {
        let client = ctx.client.clone();
        let toasts = ctx.toasts.clone();
        let stats = stats.clone();
        let trends = trends.clone();
        let analytics_loading = analytics_loading.clone();
        use_effect_with((*gate_passed, *range_days), move |(gate_passed, days)| {
            if *gate_passed {
                let range = DateRange::last_days(*days, Utc::now());
                analytics_loading.set(true);
                spawn_local(async move {
                    let service = AnalyticsService::new(client);
                    match service.usage_stats(&range).await {
                        Ok(loaded) => stats.set(loaded),
                        Err(e) => toasts.failure("Load template statistics failed", &e, "Failed to load analytics"),
                    }
                    match service.usage_trends(&range).await {
                        Ok(loaded) => trends.set(loaded),
                        Err(e) => toasts.failure("Load usage trends failed", &e, "Failed to load analytics"),
                    }
                    analytics_loading.set(false);
                });
            }
            || ()
        });
    }

    let reload_templates = bump(&templates_reload);
    // The session modal can change sessions and save templates
    let reload_from_modal = {
        let reload_sessions = bump(&sessions_reload);
        let reload_templates = reload_templates.clone();
        Callback::from(move |_: ()| {
            reload_sessions.emit(());
            reload_templates.emit(());
        })
    };

    let on_toggle_day = {
        let rule_draft = rule_draft.clone();
        Callback::from(move |date: NaiveDate| rule_draft.dispatch(RuleAction::ToggleDay(date)))
    };

    let on_edit_rule = {
        let rule_draft = rule_draft.clone();
        Callback::from(move |(day_of_week, edit): (u8, RuleEdit)| {
            rule_draft.dispatch(RuleAction::Edit(day_of_week, edit))
        })
    };

    let on_preset = {
        let rule_draft = rule_draft.clone();
        Callback::from(move |preset: AvailabilityPreset| rule_draft.dispatch(RuleAction::Preset(preset)))
    };

    let on_save = {
        let ctx = ctx.clone();
        let rule_draft = rule_draft.clone();
        let saving = saving.clone();
        Callback::from(move |_: ()| {
            let (Some(mentor_id), Some(rules)) = (ctx.auth.user_id(), rule_draft.savable()) else {
                return;
            };
            let ctx = ctx.clone();
            let rules = rules.to_vec();
            let saving = saving.clone();
            saving.set(true);
            spawn_local(async move {
                match AvailabilityService::new(ctx.client.clone()).save(mentor_id, &rules).await {
                    Ok(()) => ctx.toasts.success("Availability saved successfully"),
                    Err(e) => ctx.toasts.failure("Save availability failed", &e, "Failed to save availability"),
                }
                saving.set(false);
            });
        })
    };

    let on_select_session = {
        let modal = modal.clone();
        Callback::from(move |session_id: Uuid| modal.set(SessionModal::Open(session_id)))
    };

    let on_close_modal = {
        let modal = modal.clone();
        Callback::from(move |_: ()| modal.set(SessionModal::Closed))
    };

    let on_print_week = {
        let ctx = ctx.clone();
        let rule_draft = rule_draft.clone();
        let sessions = sessions.clone();
        let reference = calendar.state.reference;
        Callback::from(move |_: MouseEvent| {
            let file = ExportService::new().week_schedule_html(
                reference,
                rule_draft.rules(),
                &sessions,
                &Local,
                today(),
            );
            if let Err(e) = open_printable(&file.content) {
                Logger::error_with_component("availability", &format!("Failed to open schedule: {:?}", e));
                ctx.toasts.error("Failed to export schedule");
            }
        })
    };

    let on_range_days = {
        let range_days = range_days.clone();
        Callback::from(move |days: i64| range_days.set(days))
    };

    let Some(mentor_id) = mentor_id else {
        return html! { <Spinner /> };
    };
    if !*gate_passed || *rule_draft == RuleDraft::Loading {
        return html! { <Spinner label="Loading availability..." /> };
    }

    let view = calendar.state.view;
    let view_switcher = html! {
        <div class="view-switcher">
            { for AvailabilityView::ALL.iter().map(|candidate| {
                let set_view = calendar.actions.set_view.clone();
                let candidate = *candidate;
                let class = if view == candidate { "view-button active" } else { "view-button" };
                html! {
                    <button {class} onclick={Callback::from(move |_: MouseEvent| set_view.emit(candidate))}>
                        { candidate.label() }
                    </button>
                }
            }) }
        </div>
    };

    let schedule = match view {
        AvailabilityView::List => html! {
            <div class="session-list">
                if sessions.is_empty() {
                    <p class="empty-state">{ "No upcoming sessions" }</p>
                }
                { for sessions.iter().map(|session| {
                    let on_select_session = on_select_session.clone();
                    let id = session.id;
                    html! {
                        <div key={id.to_string()} class="session-row"
                             onclick={Callback::from(move |_: MouseEvent| on_select_session.emit(id))}>
                            <span class="session-title">{ &session.title }</span>
                            <span class="session-date">{ format_session_date(&session.date) }</span>
                            <span class={classes!("status-badge", format!("status-{}", session.status.as_str()))}>
                                { session.status.label() }
                            </span>
                        </div>
                    }
                }) }
            </div>
        },
        _ => html! {
            <>
                <div class="calendar-nav">
                    <button class="secondary-button" onclick={calendar.actions.previous.clone()}>{ "‹" }</button>
                    <h2>{ calendar.state.title.clone() }</h2>
                    <button class="secondary-button" onclick={calendar.actions.next.clone()}>{ "›" }</button>
                    <button class="secondary-button" onclick={calendar.actions.go_today.clone()}>{ "Today" }</button>
                    if view == AvailabilityView::Week {
                        <button class="secondary-button" onclick={on_print_week}>{ "Print Week" }</button>
                    }
                </div>
                <Calendar
                    view={view}
                    month_cells={calendar.state.month_cells.clone()}
                    week_days={calendar.state.week_days.clone()}
                    rules={rule_draft.rules().to_vec()}
                    sessions={(*sessions).clone()}
                    on_toggle_day={on_toggle_day}
                    on_select_session={on_select_session.clone()}
                />
            </>
        },
    };

    html! {
        <div class="availability-page">
            <div class="page-header">
                <h1>{ "Availability Settings" }</h1>
                { view_switcher }
            </div>

            <DashboardOverview metrics={(*metrics).clone()} />

            <div class="availability-layout">
                <section class="schedule">{ schedule }</section>
                <AvailabilityEditor
                    rules={rule_draft.rules().to_vec()}
                    saving={*saving}
                    loaded={rule_draft.savable().is_some()}
                    on_edit={on_edit_rule}
                    on_preset={on_preset}
                    on_save={on_save}
                />
            </div>

            <TemplatePanel
                mentor_id={mentor_id}
                templates={(*templates).clone()}
                stats={(*stats).clone()}
                on_changed={reload_templates}
            />

            <AnalyticsPanel
                range={range}
                stats={(*stats).clone()}
                trends={(*trends).clone()}
                loading={*analytics_loading}
                on_range_days={on_range_days}
            />

            if let SessionModal::Open(session_id) = *modal {
                <SessionModalView
                    session_id={session_id}
                    mentor_id={mentor_id}
                    templates={(*templates).clone()}
                    on_close={on_close_modal}
                    on_changed={reload_from_modal}
                />
            }
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loaded() -> Rc<RuleDraft> {
        Rc::new(RuleDraft::default()).reduce(RuleAction::Loaded(AvailabilityRule::default_week()))
    }

    #[test]
    fn test_failed_load_is_never_savable() {
        let draft = Rc::new(RuleDraft::default()).reduce(RuleAction::LoadFailed);
        assert_eq!(draft.savable(), None);

        let draft = draft.reduce(RuleAction::Preset(AvailabilityPreset::WeekendsOnly));
        assert_eq!(*draft, RuleDraft::Failed);
        assert!(draft.rules().is_empty());
    }

    #[test]
    fn test_edits_wait_for_loaded_rules() {
        let draft = Rc::new(RuleDraft::default())
            .reduce(RuleAction::Edit(1, RuleEdit::Available(false)));
        assert_eq!(*draft, RuleDraft::Loading);
        assert_eq!(draft.savable(), None);
    }

    #[test]
    fn test_edits_accumulate_on_loaded_rules() {
        let monday = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        let draft = loaded()
            .reduce(RuleAction::ToggleDay(monday))
            .reduce(RuleAction::Edit(2, RuleEdit::Available(false)));

        let rules = draft.savable().unwrap();
        assert!(!rules[1].is_available);
        assert!(!rules[2].is_available);
        assert!(rules[3].is_available);
    }
}
