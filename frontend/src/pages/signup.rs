use mentor_match_domain::auth_service::{AuthService, SignUpForm};
use shared::Role;
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

use crate::components::form_fields::{bind_input, select_value};
use crate::components::link::Link;
use crate::context::AppContext;
use crate::route::Route;

#[function_component(SignupPage)]
pub fn signup_page() -> Html {
    let Some(ctx) = use_context::<AppContext>() else {
        return html! {};
    };

    let email = use_state(String::new);
    let password = use_state(String::new);
    let full_name = use_state(String::new);
    let role = use_state(|| Role::Mentee);
    let loading = use_state(|| false);

    let on_role = {
        let role = role.clone();
        Callback::from(move |e: Event| {
            if let Ok(selected) = Role::from_str(&select_value(&e)) {
                role.set(selected);
            }
        })
    };

    let on_submit = {
        let ctx = ctx.clone();
        let email = email.clone();
        let password = password.clone();
        let full_name = full_name.clone();
        let role = role.clone();
        let loading = loading.clone();
        Callback::from(move |e: SubmitEvent| {
            e.prevent_default();
            let form = SignUpForm {
                email: (*email).clone(),
                password: (*password).clone(),
                full_name: (*full_name).clone(),
                role: *role,
            };
            let ctx = ctx.clone();
            let loading = loading.clone();
            loading.set(true);
            spawn_local(async move {
                match AuthService::new(ctx.client.clone()).sign_up(&form).await {
                    Ok(_) => {
                        ctx.toasts.success("Account created! Please check your email to confirm.");
                        ctx.refresh_auth.emit(());
                        ctx.navigate.emit(Route::Login);
                    }
                    Err(e) => ctx.toasts.failure("Sign-up failed", &e, "Failed to create account"),
                }
                loading.set(false);
            });
        })
    };

    html! {
        <div class="auth-page">
            <div class="auth-card">
                <h2>{ "Create Account" }</h2>
                <form onsubmit={on_submit}>
                    <label for="full-name">{ "Full Name" }</label>
                    <input id="full-name" type="text" required=true placeholder="Enter your full name"
                           value={(*full_name).clone()} oninput={bind_input(&full_name)} />
                    <label for="email">{ "Email" }</label>
                    <input id="email" type="email" required=true placeholder="Enter your email"
                           value={(*email).clone()} oninput={bind_input(&email)} />
                    <label for="password">{ "Password" }</label>
                    <input id="password" type="password" required=true placeholder="At least 6 characters"
                           value={(*password).clone()} oninput={bind_input(&password)} />
                    <label for="role">{ "I want to" }</label>
                    <select id="role" onchange={on_role}>
                        <option value="mentee" selected={*role == Role::Mentee}>{ "Find a mentor" }</option>
                        <option value="mentor" selected={*role == Role::Mentor}>{ "Become a mentor" }</option>
                    </select>
                    <button type="submit" class="primary-button" disabled={*loading}>
                        { if *loading { "Creating account..." } else { "Sign Up" } }
                    </button>
                </form>
                <p class="auth-switch">
                    { "Already have an account? " }
                    <Link to={Route::Login}>{ "Sign in" }</Link>
                </p>
            </div>
        </div>
    }
}
