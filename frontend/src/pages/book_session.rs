use chrono::Local;
use mentor_match_domain::booking_service::{
    parse_time, BookingOutcome, BookingRequest, BookingService, SLOT_UNAVAILABLE_MESSAGE,
};
use mentor_match_domain::profile_service::ProfileService;
use shared::Profile;
use std::str::FromStr;
use uuid::Uuid;
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

use crate::components::form_fields::{bind_input, bind_select, bind_textarea, Spinner};
use crate::context::AppContext;
use crate::route::Route;
use crate::services::date_utils::{date_input_value, format_slot_label, parse_date_input, today};

fn mentor_label(mentor: &Profile) -> String {
    if mentor.expertise.is_empty() {
        mentor.display_name().to_string()
    } else {
        format!("{} - {}", mentor.display_name(), mentor.expertise.join(", "))
    }
}

#[function_component(BookSessionPage)]
pub fn book_session_page() -> Html {
    let Some(ctx) = use_context::<AppContext>() else {
        return html! {};
    };

    let mentors = use_state(Vec::<Profile>::new);
    let loading = use_state(|| true);
    let booking = use_state(|| false);

    let mentor_id = use_state(String::new);
    let date = use_state(String::new);
    let time = use_state(String::new);
    let title = use_state(String::new);
    let description = use_state(String::new);

    {
        let client = ctx.client.clone();
        let toasts = ctx.toasts.clone();
        let mentors = mentors.clone();
        let loading = loading.clone();
        use_effect_with(ctx.auth.user_id(), move |user_id| {
            let exclude = *user_id;
            spawn_local(async move {
                match ProfileService::new(client).mentors(exclude).await {
                    Ok(loaded) => mentors.set(loaded),
                    Err(e) => toasts.failure("Load mentors failed", &e, "Error loading mentors"),
                }
                loading.set(false);
            });
            || ()
        });
    }

    let on_submit = {
        let ctx = ctx.clone();
        let booking = booking.clone();
        let request = BookingRequest {
            mentor_id: Uuid::from_str(&mentor_id).ok(),
            date: parse_date_input(&date),
            time: parse_time(&time),
            title: (*title).clone(),
            description: (*description).clone(),
        };
        Callback::from(move |e: SubmitEvent| {
            e.prevent_default();
            let Some(mentee_id) = ctx.auth.user_id() else {
                ctx.navigate.emit(Route::Login);
                return;
            };
            if let Err(e) = request.validate() {
                ctx.toasts.failure("Booking form incomplete", &e, "Please fill in all required fields");
                return;
            }
            let ctx = ctx.clone();
            let booking = booking.clone();
            let request = request.clone();
            booking.set(true);
            spawn_local(async move {
                match BookingService::new(ctx.client.clone()).book(mentee_id, &request, &Local).await {
                    Ok(BookingOutcome::Booked(_)) => {
                        ctx.toasts.success("Session booked successfully!");
                        ctx.navigate.emit(Route::Dashboard);
                    }
                    Ok(BookingOutcome::Unavailable) => ctx.toasts.error(SLOT_UNAVAILABLE_MESSAGE),
                    Err(e) => ctx.toasts.failure("Booking failed", &e, "Failed to book session"),
                }
                booking.set(false);
            });
        })
    };

    if *loading {
        return html! { <Spinner /> };
    }

    html! {
        <div class="book-session-page">
            <div class="card">
                <h1>{ "Book a Session" }</h1>
                <form onsubmit={on_submit}>
                    <label>{ "Select Mentor" }</label>
                    <select required=true onchange={bind_select(&mentor_id)}>
                        <option value="" selected={mentor_id.is_empty()}>{ "Choose a mentor" }</option>
                        { for mentors.iter().map(|mentor| html! {
                            <option key={mentor.id.to_string()} value={mentor.id.to_string()}
                                    selected={*mentor_id == mentor.id.to_string()}>
                                { mentor_label(mentor) }
                            </option>
                        }) }
                    </select>

                    <label>{ "Select Date" }</label>
                    <input type="date" required=true min={date_input_value(today())}
                           value={(*date).clone()} oninput={bind_input(&date)} />

                    <label>{ "Select Time" }</label>
                    <div class="time-slots">
                        { for ctx.config.time_slots.iter().map(|slot| {
                            let time = time.clone();
                            let value = slot.clone();
                            let class = if *time == *slot { "time-slot selected" } else { "time-slot" };
                            html! {
                                <button type="button" {class}
                                        onclick={Callback::from(move |_: MouseEvent| time.set(value.clone()))}>
                                    { format_slot_label(slot) }
                                </button>
                            }
                        }) }
                    </div>

                    <label>{ "Session Title" }</label>
                    <input type="text" required=true placeholder="e.g., Career Guidance Session"
                           value={(*title).clone()} oninput={bind_input(&title)} />

                    <label>{ "Description" }</label>
                    <textarea placeholder="What would you like to discuss?"
                              value={(*description).clone()} oninput={bind_textarea(&description)} />

                    <button type="submit" class="primary-button" disabled={*booking}>
                        { if *booking { "Booking..." } else { "Book Session" } }
                    </button>
                </form>
            </div>
        </div>
    }
}
