use mentor_match_domain::counselling_service::{
    replace_counselling_status, CounsellingRequest, CounsellingService,
};
use shared::{CounsellingSession, CounsellingStatus, Profile};
use std::str::FromStr;
use uuid::Uuid;
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

use crate::components::form_fields::{bind_input, bind_select, bind_textarea, select_value, Spinner};
use crate::components::modal::Modal;
use crate::context::AppContext;
use crate::route::Route;
use crate::services::date_utils::{format_session_date, parse_datetime_local};

#[function_component(CounsellingPage)]
pub fn counselling_page() -> Html {
    let Some(ctx) = use_context::<AppContext>() else {
        return html! {};
    };

    let sessions = use_state(Vec::<CounsellingSession>::new);
    let mentors = use_state(Vec::<Profile>::new);
    let loading = use_state(|| true);
    let reload_counter = use_state(|| 0u32);
    let show_modal = use_state(|| false);

    let mentor_id = use_state(String::new);
    let date_time = use_state(String::new);
    let notes = use_state(String::new);

    {
        let client = ctx.client.clone();
        let toasts = ctx.toasts.clone();
        let sessions = sessions.clone();
        let mentors = mentors.clone();
        let loading = loading.clone();
        use_effect_with(*reload_counter, move |_| {
            spawn_local(async move {
                let service = CounsellingService::new(client);
                match service.list().await {
                    Ok(loaded) => sessions.set(loaded),
                    Err(e) => toasts.failure("Load counselling sessions failed", &e, "Failed to load sessions"),
                }
                match service.mentors().await {
                    Ok(loaded) => mentors.set(loaded),
                    Err(e) => toasts.failure("Load mentors failed", &e, "Failed to load mentors"),
                }
                loading.set(false);
            });
            || ()
        });
    }

    let on_schedule = {
        let ctx = ctx.clone();
        let show_modal = show_modal.clone();
        let reload_counter = reload_counter.clone();
        let notes_state = notes.clone();
        let request = CounsellingRequest {
            mentor_id: Uuid::from_str(&mentor_id).ok(),
            date_time: parse_datetime_local(&date_time),
            notes: (*notes).clone(),
        };
        Callback::from(move |e: SubmitEvent| {
            e.prevent_default();
            let Some(student_id) = ctx.auth.user_id() else {
                ctx.navigate.emit(Route::Login);
                return;
            };
            let ctx = ctx.clone();
            let show_modal = show_modal.clone();
            let reload_counter = reload_counter.clone();
            let notes_state = notes_state.clone();
            let request = request.clone();
            spawn_local(async move {
                match CounsellingService::new(ctx.client.clone()).schedule(student_id, &request).await {
                    Ok(_) => {
                        ctx.toasts.success("Session scheduled successfully");
                        show_modal.set(false);
                        notes_state.set(String::new());
                        reload_counter.set(*reload_counter + 1);
                    }
                    Err(e) => ctx.toasts.failure("Schedule counselling failed", &e, "Failed to schedule session"),
                }
            });
        })
    };

    let on_status = {
        let ctx = ctx.clone();
        let sessions = sessions.clone();
        Callback::from(move |(session_id, status): (Uuid, CounsellingStatus)| {
            let ctx = ctx.clone();
            let sessions = sessions.clone();
            spawn_local(async move {
                match CounsellingService::new(ctx.client.clone()).set_status(session_id, status).await {
                    Ok(()) => {
                        let mut next = (*sessions).clone();
                        replace_counselling_status(&mut next, session_id, status);
                        sessions.set(next);
                        ctx.toasts.success("Session status updated successfully");
                    }
                    Err(e) => ctx.toasts.failure("Update counselling status failed", &e, "Failed to update session status"),
                }
            });
        })
    };

    if *loading {
        return html! { <Spinner /> };
    }

    let open_modal = {
        let show_modal = show_modal.clone();
        Callback::from(move |_: MouseEvent| show_modal.set(true))
    };
    let close_modal = {
        let show_modal = show_modal.clone();
        Callback::from(move |_: ()| show_modal.set(false))
    };

    html! {
        <div class="counselling-page">
            <div class="page-header">
                <h1>{ "Counselling Sessions" }</h1>
                <button class="primary-button" onclick={open_modal}>{ "Schedule Session" }</button>
            </div>
            if sessions.is_empty() {
                <p class="empty-state">{ "No counselling sessions yet" }</p>
            }
            <div class="counselling-list">
                { for sessions.iter().map(|session| {
                    let id = session.id;
                    let on_status = on_status.clone();
                    let on_change = Callback::from(move |e: Event| {
                        if let Ok(status) = CounsellingStatus::from_str(&select_value(&e)) {
                            on_status.emit((id, status));
                        }
                    });
                    let mentor_name = session
                        .mentor
                        .as_ref()
                        .map(|m| m.name_or("Unknown mentor").to_string())
                        .unwrap_or_else(|| "Unknown mentor".to_string());
                    html! {
                        <div key={id.to_string()} class="counselling-card">
                            <div>
                                <h3>{ format!("Session with {}", mentor_name) }</h3>
                                <p>{ format_session_date(&session.date_time) }</p>
                                if let Some(student) = &session.student {
                                    <p>{ format!("Student: {}", student.name_or("Unknown")) }</p>
                                }
                                if let Some(note) = &session.notes {
                                    <p class="counselling-notes">{ note }</p>
                                }
                            </div>
                            <div class="counselling-status">
                                <span class={classes!("status-badge", format!("status-{}", session.status.as_str()))}>
                                    { session.status.as_str() }
                                </span>
                                <select onchange={on_change}>
                                    { for CounsellingStatus::ALL.iter().map(|status| html! {
                                        <option value={status.as_str()} selected={*status == session.status}>
                                            { status.label() }
                                        </option>
                                    }) }
                                </select>
                            </div>
                        </div>
                    }
                }) }
            </div>
            if *show_modal {
                <Modal title="Schedule Counselling Session" on_close={close_modal}>
                    <form onsubmit={on_schedule}>
                        <label for="mentor">{ "Mentor" }</label>
                        <select id="mentor" required=true onchange={bind_select(&mentor_id)}>
                            <option value="" selected={mentor_id.is_empty()}>{ "Select a mentor" }</option>
                            { for mentors.iter().map(|mentor| html! {
                                <option key={mentor.id.to_string()} value={mentor.id.to_string()}
                                        selected={*mentor_id == mentor.id.to_string()}>
                                    { mentor.display_name() }
                                </option>
                            }) }
                        </select>
                        <label for="date_time">{ "Date and Time" }</label>
                        <input id="date_time" type="datetime-local" required=true
                               value={(*date_time).clone()} oninput={bind_input(&date_time)} />
                        <label for="notes">{ "Notes" }</label>
                        <textarea id="notes" rows="3" value={(*notes).clone()} oninput={bind_textarea(&notes)} />
                        <button type="submit" class="primary-button">{ "Schedule" }</button>
                    </form>
                </Modal>
            }
        </div>
    }
}
