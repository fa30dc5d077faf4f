use mentor_match_domain::auth_service::AuthService;
use shared::OAuthProvider;
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

use crate::components::form_fields::bind_input;
use crate::components::link::Link;
use crate::context::AppContext;
use crate::route::Route;
use crate::services::logging::Logger;

const PROVIDERS: [OAuthProvider; 3] = [OAuthProvider::Google, OAuthProvider::Github, OAuthProvider::Azure];

#[function_component(LoginPage)]
pub fn login_page() -> Html {
    let Some(ctx) = use_context::<AppContext>() else {
        return html! {};
    };

    let email = use_state(String::new);
    let password = use_state(String::new);
    let loading = use_state(|| false);

    let on_submit = {
        let ctx = ctx.clone();
        let email = email.clone();
        let password = password.clone();
        let loading = loading.clone();
        Callback::from(move |e: SubmitEvent| {
            e.prevent_default();
            let ctx = ctx.clone();
            let email = (*email).clone();
            let password = (*password).clone();
            let loading = loading.clone();
            loading.set(true);
            spawn_local(async move {
                match AuthService::new(ctx.client.clone()).sign_in(&email, &password).await {
                    Ok(_) => {
                        ctx.toasts.success("Logged in successfully!");
                        ctx.refresh_auth.emit(());
                        ctx.navigate.emit(Route::Dashboard);
                    }
                    Err(e) => ctx.toasts.failure("Sign-in failed", &e, "Failed to sign in"),
                }
                loading.set(false);
            });
        })
    };

    let on_social = {
        let ctx = ctx.clone();
        Callback::from(move |provider: OAuthProvider| {
            let window = gloo::utils::window();
            let origin = match window.location().origin() {
                Ok(origin) => origin,
                Err(e) => {
                    Logger::error_with_component("login", &format!("No window origin: {:?}", e));
                    ctx.toasts.error("Failed to start sign-in");
                    return;
                }
            };
            let url = AuthService::new(ctx.client.clone()).oauth_url(provider, &origin, &ctx.config);
            Logger::info_with_component("login", &format!("Redirecting to {} sign-in", provider.label()));
            if let Err(e) = window.location().set_href(&url) {
                Logger::error_with_component("login", &format!("Redirect failed: {:?}", e));
                ctx.toasts.error("Failed to start sign-in");
            }
        })
    };

    html! {
        <div class="auth-page">
            <div class="auth-card">
                <h2>{ "Welcome Back" }</h2>
                <div class="social-buttons">
                    { for PROVIDERS.iter().map(|provider| {
                        let provider = *provider;
                        let on_social = on_social.clone();
                        html! {
                            <button class={classes!("social-button", provider.as_str())}
                                    onclick={Callback::from(move |_: MouseEvent| on_social.emit(provider))}>
                                { provider.label() }
                            </button>
                        }
                    }) }
                </div>
                <div class="divider"><span>{ "Or continue with" }</span></div>
                <form onsubmit={on_submit}>
                    <label for="email">{ "Email" }</label>
                    <input id="email" type="email" required=true placeholder="Enter your email"
                           value={(*email).clone()} oninput={bind_input(&email)} />
                    <label for="password">{ "Password" }</label>
                    <input id="password" type="password" required=true placeholder="Enter your password"
                           value={(*password).clone()} oninput={bind_input(&password)} />
                    <button type="submit" class="primary-button" disabled={*loading}>
                        { if *loading { "Signing in..." } else { "Sign In" } }
                    </button>
                </form>
                <p class="auth-switch">
                    { "Don't have an account? " }
                    <Link to={Route::Signup}>{ "Sign up" }</Link>
                </p>
            </div>
        </div>
    }
}
