use chrono::Local;
use mentor_match_domain::session_service::{replace_status, SessionService};
use shared::{Role, SessionListing, SessionStatus};
use std::rc::Rc;
use uuid::Uuid;
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

use crate::components::form_fields::Spinner;
use crate::context::AppContext;
use crate::route::Route;
use crate::services::date_utils::{format_short_date, format_time};

/// Listings shown on the page. Status changes land on the latest list, not
/// the one captured when the button was rendered.
#[derive(Debug, Clone, PartialEq, Default)]
struct SessionList {
    items: Vec<SessionListing>,
}

enum SessionListAction {
    Loaded(Vec<SessionListing>),
    StatusChanged(Uuid, SessionStatus),
}

impl Reducible for SessionList {
    type Action = SessionListAction;

    fn reduce(self: Rc<Self>, action: Self::Action) -> Rc<Self> {
        let mut next = (*self).clone();
        match action {
            SessionListAction::Loaded(items) => next.items = items,
            SessionListAction::StatusChanged(session_id, status) => {
                replace_status(&mut next.items, session_id, status)
            }
        }
        Rc::new(next)
    }
}

#[function_component(SessionsPage)]
pub fn sessions_page() -> Html {
    let Some(ctx) = use_context::<AppContext>() else {
        return html! {};
    };

    let sessions = use_reducer(SessionList::default);
    let loading = use_state(|| true);

    {
        let client = ctx.client.clone();
        let toasts = ctx.toasts.clone();
        let sessions = sessions.clone();
        let loading = loading.clone();
        use_effect_with((), move |_| {
            spawn_local(async move {
                match SessionService::new(client).list_all().await {
                    Ok(loaded) => sessions.dispatch(SessionListAction::Loaded(loaded)),
                    Err(e) => toasts.failure("Load sessions failed", &e, "Error loading sessions"),
                }
                loading.set(false);
            });
            || ()
        });
    }

    let on_status = {
        let ctx = ctx.clone();
        let sessions = sessions.clone();
        Callback::from(move |(session_id, status): (Uuid, SessionStatus)| {
            let ctx = ctx.clone();
            let sessions = sessions.clone();
            spawn_local(async move {
                match SessionService::new(ctx.client.clone()).set_status(session_id, status).await {
                    Ok(()) => {
                        sessions.dispatch(SessionListAction::StatusChanged(session_id, status));
                        ctx.toasts.success(format!("Session marked as {}", status.as_str()));
                    }
                    Err(e) => ctx.toasts.failure("Update session status failed", &e, "Failed to update session"),
                }
            });
        })
    };

    if *loading {
        return html! { <Spinner /> };
    }

    let viewer = ctx
        .auth
        .profile
        .as_ref()
        .map(|profile| profile.role)
        .unwrap_or(Role::Mentee);
    let on_book = {
        let navigate = ctx.navigate.clone();
        Callback::from(move |_: MouseEvent| navigate.emit(Route::BookSession))
    };

    html! {
        <div class="sessions-page">
            <div class="page-header">
                <h1>{ "Your Sessions" }</h1>
                <button class="primary-button" onclick={on_book}>{ "Book New Session" }</button>
            </div>
            if sessions.items.is_empty() {
                <p class="empty-state">{ "No sessions yet" }</p>
            }
            <div class="session-list">
                { for sessions.items.iter().map(|listing| {
                    let session = &listing.session;
                    let id = session.id;
                    let mark = |status: SessionStatus| {
                        let on_status = on_status.clone();
                        Callback::from(move |_: MouseEvent| on_status.emit((id, status)))
                    };
                    html! {
                        <div key={id.to_string()} class="session-card">
                            <div class="session-info">
                                <h3>{ &session.title }</h3>
                                <p>{ session.description.clone().unwrap_or_default() }</p>
                                <div class="session-meta">
                                    <span>{ format_short_date(session.date.with_timezone(&Local).date_naive()) }</span>
                                    <span>{ format_time(&session.date) }</span>
                                    <span>{ listing.counterpart_name(viewer) }</span>
                                </div>
                            </div>
                            <div class="session-actions">
                                if session.status == SessionStatus::Upcoming {
                                    <button class="icon-button success" title="Mark as completed"
                                            onclick={mark(SessionStatus::Completed)}>{ "✓" }</button>
                                    <button class="icon-button danger" title="Cancel session"
                                            onclick={mark(SessionStatus::Cancelled)}>{ "✕" }</button>
                                }
                                <span class={classes!("status-badge", format!("status-{}", session.status.as_str()))}>
                                    { session.status.label() }
                                </span>
                            </div>
                        </div>
                    }
                }) }
            </div>
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use shared::Session;

    fn listing() -> SessionListing {
        SessionListing {
            session: Session {
                id: Uuid::new_v4(),
                title: "Mock interview".to_string(),
                description: None,
                date: Utc::now(),
                mentor_id: Uuid::new_v4(),
                mentee_id: Uuid::new_v4(),
                status: SessionStatus::Upcoming,
            },
            mentor: None,
            mentee: None,
        }
    }

    #[test]
    fn test_back_to_back_status_changes_both_stick() {
        let first = listing();
        let second = listing();
        let (first_id, second_id) = (first.session.id, second.session.id);

        let list = Rc::new(SessionList::default())
            .reduce(SessionListAction::Loaded(vec![first, second]))
            .reduce(SessionListAction::StatusChanged(first_id, SessionStatus::Completed))
            .reduce(SessionListAction::StatusChanged(second_id, SessionStatus::Cancelled));

        assert_eq!(list.items[0].session.status, SessionStatus::Completed);
        assert_eq!(list.items[1].session.status, SessionStatus::Cancelled);
    }
}
