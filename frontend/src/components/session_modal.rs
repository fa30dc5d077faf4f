use chrono::Local;
use mentor_match_domain::booking_service::{
    parse_time, BookingService, RescheduleOutcome, SLOT_UNAVAILABLE_MESSAGE,
};
use mentor_match_domain::error::{ServiceError, ServiceResult};
use mentor_match_domain::export_service::ExportService;
use mentor_match_domain::session_service::{SessionOverview, SessionService};
use mentor_match_domain::template_service::TemplateService;
use shared::{
    ChecklistItem, ChecklistTemplate, SessionDetails, SessionFeedback, SessionNote,
    SessionStatus, SessionSummary, SummaryDraft,
};
use std::str::FromStr;
use uuid::Uuid;
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

use crate::components::form_fields::{bind_input, bind_textarea, select_value, RatingInput, Spinner};
use crate::components::modal::Modal;
use crate::context::AppContext;
use crate::services::date_utils::{format_session_date, parse_date_input};
use crate::services::download::open_printable;
use crate::services::logging::Logger;

/// Which session, if any, the availability page shows in the modal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionModal {
    Closed,
    Open(Uuid),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionTab {
    Details,
    Notes,
    Feedback,
    Checklist,
    Summary,
}

impl SessionTab {
    pub const ALL: [SessionTab; 5] = [
        SessionTab::Details,
        SessionTab::Notes,
        SessionTab::Feedback,
        SessionTab::Checklist,
        SessionTab::Summary,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            SessionTab::Details => "Details",
            SessionTab::Notes => "Notes",
            SessionTab::Feedback => "Feedback",
            SessionTab::Checklist => "Checklist",
            SessionTab::Summary => "Summary",
        }
    }
}

/// Secondary form shown inside the details tab
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DetailsForm {
    None,
    Reschedule,
    SaveAsTemplate,
}

#[derive(Debug, Clone, PartialEq, Default)]
struct SessionData {
    details: Option<SessionDetails>,
    notes: Vec<SessionNote>,
    feedback: Option<SessionFeedback>,
    checklist: Vec<ChecklistItem>,
    summary: Option<SessionSummary>,
}

impl SessionData {
    /// Keep every section that loaded; `on_error` is told about the rest
    fn from_overview(
        overview: SessionOverview,
        on_error: impl Fn(&'static str, &ServiceError, &'static str),
    ) -> Self {
        fn section<T: Default>(
            result: ServiceResult<T>,
            on_error: &impl Fn(&'static str, &ServiceError, &'static str),
            context: &'static str,
            fallback: &'static str,
        ) -> T {
            result.unwrap_or_else(|err| {
                on_error(context, &err, fallback);
                T::default()
            })
        }

        let details = match overview.details {
            Ok(details) => Some(details),
            Err(err) => {
                on_error("Load session details failed", &err, "Failed to load session details");
                None
            }
        };
        Self {
            details,
            notes: section(overview.notes, &on_error, "Load notes failed", "Failed to load notes"),
            feedback: section(overview.feedback, &on_error, "Load feedback failed", "Failed to load feedback"),
            checklist: section(overview.checklist, &on_error, "Load checklist failed", "Failed to load checklist"),
            summary: section(overview.summary, &on_error, "Load summary failed", "Failed to load summary"),
        }
    }
}

fn draft_from(summary: Option<&SessionSummary>) -> SummaryDraft {
    summary
        .map(|summary| SummaryDraft {
            key_points: summary.key_points.join("\n"),
            action_items: summary.action_items.join("\n"),
            next_steps: summary.next_steps.join("\n"),
        })
        .unwrap_or_default()
}

#[derive(Properties, PartialEq)]
pub struct SessionModalProps {
    pub session_id: Uuid,
    pub mentor_id: Uuid,
    pub templates: Vec<ChecklistTemplate>,
    pub on_close: Callback<()>,
    /// Sessions or templates changed and the page should reload them
    pub on_changed: Callback<()>,
}

#[function_component(SessionModalView)]
pub fn session_modal(props: &SessionModalProps) -> Html {
    let Some(ctx) = use_context::<AppContext>() else {
        return html! {};
    };

    let data = use_state(SessionData::default);
    let loading = use_state(|| true);
    let reload_counter = use_state(|| 0u32);
    let tab = use_state(|| SessionTab::Details);
    let form = use_state(|| DetailsForm::None);

    let note_text = use_state(String::new);
    let rating = use_state(|| 0u8);
    let comment = use_state(String::new);
    let item_text = use_state(String::new);
    let template_name = use_state(String::new);
    let key_points = use_state(String::new);
    let action_items = use_state(String::new);
    let next_steps = use_state(String::new);
    let new_date = use_state(String::new);
    let new_time = use_state(String::new);

    // Load the tabs whenever the session or a reload changes; each tab fails on its own
    {
        let client = ctx.client.clone();
        let toasts = ctx.toasts.clone();
        let data = data.clone();
        let loading = loading.clone();
        let rating = rating.clone();
        let comment = comment.clone();
        let key_points = key_points.clone();
        let action_items = action_items.clone();
        let next_steps = next_steps.clone();
        use_effect_with((props.session_id, *reload_counter), move |(session_id, _)| {
            let session_id = *session_id;
            spawn_local(async move {
                loading.set(true);
                let overview = SessionService::new(client).overview(session_id).await;
                let loaded = SessionData::from_overview(overview, |context, err, fallback| {
                    toasts.failure(context, err, fallback)
                });
                if let Some(feedback) = &loaded.feedback {
                    rating.set(feedback.rating);
                    comment.set(feedback.comment.clone());
                }
                let draft = draft_from(loaded.summary.as_ref());
                key_points.set(draft.key_points);
                action_items.set(draft.action_items);
                next_steps.set(draft.next_steps);
                data.set(loaded);
                loading.set(false);
            });
            || ()
        });
    }

    let reload = {
        let reload_counter = reload_counter.clone();
        Callback::from(move |_: ()| reload_counter.set(*reload_counter + 1))
    };

    let on_add_note = {
        let ctx = ctx.clone();
        let note_text = note_text.clone();
        let reload = reload.clone();
        let session_id = props.session_id;
        let author = props.mentor_id;
        Callback::from(move |e: SubmitEvent| {
            e.prevent_default();
            let ctx = ctx.clone();
            let note_text = note_text.clone();
            let reload = reload.clone();
            spawn_local(async move {
                let service = SessionService::new(ctx.client.clone());
                match service.add_note(session_id, author, &note_text).await {
                    Ok(_) => {
                        note_text.set(String::new());
                        ctx.toasts.success("Note added");
                        reload.emit(());
                    }
                    Err(e) => ctx.toasts.failure("Add note failed", &e, "Failed to add note"),
                }
            });
        })
    };

    let on_submit_feedback = {
        let ctx = ctx.clone();
        let rating = rating.clone();
        let comment = comment.clone();
        let reload = reload.clone();
        let session_id = props.session_id;
        let author = props.mentor_id;
        Callback::from(move |e: SubmitEvent| {
            e.prevent_default();
            let ctx = ctx.clone();
            let reload = reload.clone();
            let rating = *rating;
            let comment = (*comment).clone();
            spawn_local(async move {
                let service = SessionService::new(ctx.client.clone());
                match service.submit_feedback(session_id, author, rating, &comment).await {
                    Ok(()) => {
                        ctx.toasts.success("Feedback submitted");
                        reload.emit(());
                    }
                    Err(e) => ctx.toasts.failure("Submit feedback failed", &e, "Failed to submit feedback"),
                }
            });
        })
    };

    let on_add_item = {
        let ctx = ctx.clone();
        let item_text = item_text.clone();
        let reload = reload.clone();
        let session_id = props.session_id;
        Callback::from(move |e: SubmitEvent| {
            e.prevent_default();
            let ctx = ctx.clone();
            let item_text = item_text.clone();
            let reload = reload.clone();
            spawn_local(async move {
                let service = SessionService::new(ctx.client.clone());
                match service.add_checklist_item(session_id, &item_text).await {
                    Ok(_) => {
                        item_text.set(String::new());
                        reload.emit(());
                    }
                    Err(e) => ctx.toasts.failure("Add checklist item failed", &e, "Failed to add item"),
                }
            });
        })
    };

    let on_toggle_item = {
        let ctx = ctx.clone();
        let data = data.clone();
        Callback::from(move |(item_id, completed): (Uuid, bool)| {
            let ctx = ctx.clone();
            let data = data.clone();
            spawn_local(async move {
                let service = SessionService::new(ctx.client.clone());
                match service.toggle_checklist_item(item_id, completed).await {
                    Ok(now_completed) => {
                        let mut next = (*data).clone();
                        if let Some(item) = next.checklist.iter_mut().find(|item| item.id == item_id) {
                            item.completed = now_completed;
                        }
                        data.set(next);
                    }
                    Err(e) => ctx.toasts.failure("Toggle checklist item failed", &e, "Failed to update item"),
                }
            });
        })
    };

    let on_apply_template = {
        let ctx = ctx.clone();
        let data = data.clone();
        let templates = props.templates.clone();
        let session_id = props.session_id;
        Callback::from(move |e: Event| {
            let Ok(template_id) = Uuid::from_str(&select_value(&e)) else {
                return;
            };
            let Some(template) = templates.iter().find(|t| t.id == template_id).cloned() else {
                return;
            };
            let ctx = ctx.clone();
            let data = data.clone();
            spawn_local(async move {
                let service = SessionService::new(ctx.client.clone());
                match service.apply_template(session_id, &template).await {
                    Ok(checklist) => {
                        let mut next = (*data).clone();
                        next.checklist = checklist;
                        data.set(next);
                        ctx.toasts.success(format!("Applied template \"{}\"", template.name));
                    }
                    Err(e) => ctx.toasts.failure("Apply template failed", &e, "Failed to apply template"),
                }
            });
        })
    };

    let on_save_template = {
        let ctx = ctx.clone();
        let data = data.clone();
        let template_name = template_name.clone();
        let form = form.clone();
        let on_changed = props.on_changed.clone();
        let mentor_id = props.mentor_id;
        Callback::from(move |e: SubmitEvent| {
            e.prevent_default();
            let ctx = ctx.clone();
            let checklist = data.checklist.clone();
            let template_name = template_name.clone();
            let form = form.clone();
            let on_changed = on_changed.clone();
            spawn_local(async move {
                let service = TemplateService::new(ctx.client.clone());
                match service
                    .create_from_checklist(mentor_id, &template_name, &checklist, None)
                    .await
                {
                    Ok(template) => {
                        ctx.toasts.success(format!("Template \"{}\" saved", template.name));
                        template_name.set(String::new());
                        form.set(DetailsForm::None);
                        on_changed.emit(());
                    }
                    Err(e) => ctx.toasts.failure("Save template failed", &e, "Failed to save template"),
                }
            });
        })
    };

    let on_submit_summary = {
        let ctx = ctx.clone();
        let reload = reload.clone();
        let key_points = key_points.clone();
        let action_items = action_items.clone();
        let next_steps = next_steps.clone();
        let session_id = props.session_id;
        Callback::from(move |e: SubmitEvent| {
            e.prevent_default();
            let ctx = ctx.clone();
            let reload = reload.clone();
            let draft = SummaryDraft {
                key_points: (*key_points).clone(),
                action_items: (*action_items).clone(),
                next_steps: (*next_steps).clone(),
            };
            spawn_local(async move {
                let service = SessionService::new(ctx.client.clone());
                match service.submit_summary(session_id, &draft).await {
                    Ok(()) => {
                        ctx.toasts.success("Summary saved");
                        reload.emit(());
                    }
                    Err(e) => ctx.toasts.failure("Save summary failed", &e, "Failed to save summary"),
                }
            });
        })
    };

    let on_export_summary = {
        let ctx = ctx.clone();
        let data = data.clone();
        Callback::from(move |_: MouseEvent| {
            let (Some(details), Some(summary)) = (&data.details, &data.summary) else {
                ctx.toasts.error("Save a summary before exporting it");
                return;
            };
            let file = ExportService::new().summary_report_html(details, summary, &Local);
            if let Err(e) = open_printable(&file.content) {
                Logger::error_with_component("session-modal", &format!("Failed to open report: {:?}", e));
                ctx.toasts.error("Failed to export summary");
            }
        })
    };

    let on_share_summary = {
        let ctx = ctx.clone();
        let data = data.clone();
        Callback::from(move |_: MouseEvent| {
            let (Some(details), Some(summary)) = (data.details.clone(), data.summary.clone()) else {
                ctx.toasts.error("Save a summary before sharing it");
                return;
            };
            let ctx = ctx.clone();
            spawn_local(async move {
                let service = SessionService::new(ctx.client.clone());
                match service.share_summary(&details, &summary).await {
                    Ok(()) => ctx.toasts.success("Summary sent to mentee"),
                    Err(e) => ctx.toasts.failure("Share summary failed", &e, "Failed to share summary"),
                }
            });
        })
    };

    let on_reschedule = {
        let ctx = ctx.clone();
        let data = data.clone();
        let new_date = new_date.clone();
        let new_time = new_time.clone();
        let form = form.clone();
        let reload = reload.clone();
        let on_changed = props.on_changed.clone();
        Callback::from(move |e: SubmitEvent| {
            e.prevent_default();
            let Some(details) = data.details.clone() else {
                return;
            };
            let (Some(date), Some(time)) = (parse_date_input(&new_date), parse_time(&new_time)) else {
                ctx.toasts.error("Please choose a new date and time");
                return;
            };
            let ctx = ctx.clone();
            let form = form.clone();
            let reload = reload.clone();
            let on_changed = on_changed.clone();
            spawn_local(async move {
                let service = BookingService::new(ctx.client.clone());
                match service.reschedule(&details, date, time, &Local).await {
                    Ok(RescheduleOutcome::Rescheduled { date, email_error }) => {
                        ctx.toasts.success(format!("Session rescheduled to {}", format_session_date(&date)));
                        if let Some(err) = email_error {
                            ctx.toasts.failure("Reschedule e-mail failed", &err, "Failed to notify the mentee by e-mail");
                        }
                        form.set(DetailsForm::None);
                        reload.emit(());
                        on_changed.emit(());
                    }
                    Ok(RescheduleOutcome::Unavailable) => ctx.toasts.error(SLOT_UNAVAILABLE_MESSAGE),
                    Err(e) => ctx.toasts.failure("Reschedule failed", &e, "Failed to reschedule session"),
                }
            });
        })
    };

    let on_cancel_session = {
        let ctx = ctx.clone();
        let on_changed = props.on_changed.clone();
        let on_close = props.on_close.clone();
        let session_id = props.session_id;
        Callback::from(move |_: MouseEvent| {
            let ctx = ctx.clone();
            let on_changed = on_changed.clone();
            let on_close = on_close.clone();
            spawn_local(async move {
                match SessionService::new(ctx.client.clone()).cancel(session_id).await {
                    Ok(()) => {
                        ctx.toasts.success("Session cancelled");
                        on_changed.emit(());
                        on_close.emit(());
                    }
                    Err(e) => ctx.toasts.failure("Cancel session failed", &e, "Failed to cancel session"),
                }
            });
        })
    };

    let show_form = |target: DetailsForm| {
        let form = form.clone();
        Callback::from(move |_: MouseEvent| form.set(target))
    };

    let title = data
        .details
        .as_ref()
        .map(|details| details.session.title.clone())
        .unwrap_or_else(|| "Session".to_string());

    let body = if *loading && data.details.is_none() {
        html! { <Spinner label="Loading session..." /> }
    } else {
        match *tab {
            SessionTab::Details => match &data.details {
                Some(details) => html! {
                    <div class="session-details">
                        <p><strong>{ "When: " }</strong>{ format_session_date(&details.session.date) }</p>
                        <p><strong>{ "Status: " }</strong>{ details.session.status.label() }</p>
                        <p><strong>{ "Mentee: " }</strong>{ details.mentee.full_name.clone().unwrap_or_else(|| "Unknown".to_string()) }</p>
                        <p><strong>{ "Email: " }</strong>{ details.mentee.email.clone().unwrap_or_default() }</p>
                        if let Some(description) = &details.session.description {
                            <p class="session-description">{ description }</p>
                        }
                        <div class="button-row">
                            <button class="secondary-button" onclick={show_form(DetailsForm::Reschedule)}>{ "Reschedule" }</button>
                            <button class="secondary-button" onclick={show_form(DetailsForm::SaveAsTemplate)}>{ "Save Checklist as Template" }</button>
                            if details.session.status != SessionStatus::Cancelled {
                                <button class="danger-button" onclick={on_cancel_session}>{ "Cancel Session" }</button>
                            }
                        </div>
                        {
                            match *form {
                                DetailsForm::Reschedule => html! {
                                    <form class="inline-form" onsubmit={on_reschedule}>
                                        <input type="date" value={(*new_date).clone()} oninput={bind_input(&new_date)} />
                                        <input type="time" step="3600" value={(*new_time).clone()} oninput={bind_input(&new_time)} />
                                        <button type="submit" class="primary-button">{ "Confirm" }</button>
                                        <button type="button" class="secondary-button" onclick={show_form(DetailsForm::None)}>{ "Cancel" }</button>
                                    </form>
                                },
                                DetailsForm::SaveAsTemplate => html! {
                                    <form class="inline-form" onsubmit={on_save_template}>
                                        <input type="text" placeholder="Template name" value={(*template_name).clone()} oninput={bind_input(&template_name)} />
                                        <button type="submit" class="primary-button">{ "Save" }</button>
                                        <button type="button" class="secondary-button" onclick={show_form(DetailsForm::None)}>{ "Cancel" }</button>
                                    </form>
                                },
                                DetailsForm::None => html! {},
                            }
                        }
                    </div>
                },
                None => html! { <p class="empty-state">{ "Session not found" }</p> },
            },
            SessionTab::Notes => html! {
                <div class="session-notes">
                    <form class="inline-form" onsubmit={on_add_note}>
                        <textarea placeholder="Add a note..." value={(*note_text).clone()} oninput={bind_textarea(&note_text)} />
                        <button type="submit" class="primary-button">{ "Add Note" }</button>
                    </form>
                    if data.notes.is_empty() {
                        <p class="empty-state">{ "No notes yet" }</p>
                    }
                    <ul class="note-list">
                        { for data.notes.iter().map(|note| html! {
                            <li key={note.id.to_string()} class={classes!("note", (note.created_by == "system").then_some("system-note"))}>
                                <p>{ &note.content }</p>
                                <span class="note-date">{ format_session_date(&note.created_at) }</span>
                            </li>
                        }) }
                    </ul>
                </div>
            },
            SessionTab::Feedback => html! {
                <form class="feedback-form" onsubmit={on_submit_feedback}>
                    if data.feedback.is_none() {
                        <p class="empty-state">{ "No feedback yet" }</p>
                    }
                    <RatingInput value={*rating} on_change={
                        let rating = rating.clone();
                        Callback::from(move |value: u8| rating.set(value))
                    } />
                    <textarea placeholder="Comment" value={(*comment).clone()} oninput={bind_textarea(&comment)} />
                    <button type="submit" class="primary-button">{ "Submit Feedback" }</button>
                </form>
            },
            SessionTab::Checklist => html! {
                <div class="session-checklist">
                    <div class="checklist-toolbar">
                        <select onchange={on_apply_template}>
                            <option value="" selected=true>{ "Apply template..." }</option>
                            { for props.templates.iter().map(|template| html! {
                                <option value={template.id.to_string()}>{ &template.name }</option>
                            }) }
                        </select>
                    </div>
                    <ul class="checklist">
                        { for data.checklist.iter().map(|item| {
                            let on_toggle_item = on_toggle_item.clone();
                            let id = item.id;
                            let completed = item.completed;
                            html! {
                                <li key={item.id.to_string()} class={classes!(completed.then_some("completed"))}>
                                    <label>
                                        <input type="checkbox" checked={completed}
                                               onchange={Callback::from(move |_: Event| on_toggle_item.emit((id, completed)))} />
                                        { &item.content }
                                    </label>
                                </li>
                            }
                        }) }
                    </ul>
                    <form class="inline-form" onsubmit={on_add_item}>
                        <input type="text" placeholder="New checklist item" value={(*item_text).clone()} oninput={bind_input(&item_text)} />
                        <button type="submit" class="primary-button">{ "Add" }</button>
                    </form>
                </div>
            },
            SessionTab::Summary => html! {
                <div class="session-summary">
                    <form class="summary-form" onsubmit={on_submit_summary}>
                        <label>{ "Key points (one per line)" }</label>
                        <textarea value={(*key_points).clone()} oninput={bind_textarea(&key_points)} />
                        <label>{ "Action items (one per line)" }</label>
                        <textarea value={(*action_items).clone()} oninput={bind_textarea(&action_items)} />
                        <label>{ "Next steps (one per line)" }</label>
                        <textarea value={(*next_steps).clone()} oninput={bind_textarea(&next_steps)} />
                        <button type="submit" class="primary-button">{ "Save Summary" }</button>
                    </form>
                    <div class="button-row">
                        <button class="secondary-button" disabled={data.summary.is_none()} onclick={on_export_summary}>{ "Export PDF" }</button>
                        <button class="secondary-button" disabled={data.summary.is_none()} onclick={on_share_summary}>{ "Share with Mentee" }</button>
                    </div>
                </div>
            },
        }
    };

    html! {
        <Modal title={title} on_close={props.on_close.clone()} wide=true>
            <div class="tabs">
                { for SessionTab::ALL.iter().map(|candidate| {
                    let tab = tab.clone();
                    let candidate = *candidate;
                    let class = if *tab == candidate { "tab active" } else { "tab" };
                    html! {
                        <button {class} onclick={Callback::from(move |_: MouseEvent| tab.set(candidate))}>
                            { candidate.label() }
                        </button>
                    }
                }) }
            </div>
            { body }
        </Modal>
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mentor_match_domain::error::GatewayError;
    use std::cell::RefCell;

    #[test]
    fn test_failed_sections_do_not_blank_the_rest() {
        let denied = ServiceError::from(GatewayError::backend("permission denied"));
        let overview = SessionOverview {
            details: Err(ServiceError::from(GatewayError::NoRows)),
            notes: Ok(Vec::new()),
            feedback: Err(denied),
            checklist: Ok(Vec::new()),
            summary: Ok(None),
        };
        let reported = RefCell::new(Vec::new());

        let data = SessionData::from_overview(overview, |context, err, fallback| {
            reported.borrow_mut().push((context, err.user_message(fallback)));
        });

        assert_eq!(data.details, None);
        assert_eq!(data.feedback, None);
        assert_eq!(
            reported.into_inner(),
            vec![
                ("Load session details failed", "Failed to load session details".to_string()),
                ("Load feedback failed", "permission denied".to_string()),
            ]
        );
    }
}
