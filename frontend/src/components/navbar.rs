use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

use mentor_match_domain::auth_service::AuthService;

use crate::components::link::Link;
use crate::context::AppContext;
use crate::route::Route;

#[derive(Properties, PartialEq)]
pub struct NavbarProps {
    pub current: Route,
}

#[function_component(Navbar)]
pub fn navbar(props: &NavbarProps) -> Html {
    let Some(ctx) = use_context::<AppContext>() else {
        return html! {};
    };

    let on_sign_out = {
        let ctx = ctx.clone();
        Callback::from(move |_: MouseEvent| {
            let ctx = ctx.clone();
            spawn_local(async move {
                match AuthService::new(ctx.client.clone()).sign_out().await {
                    Ok(()) => ctx.toasts.success("Signed out"),
                    Err(e) => ctx.toasts.failure("Sign-out failed", &e, "Failed to sign out"),
                }
                ctx.refresh_auth.emit(());
                ctx.navigate.emit(Route::Home);
            });
        })
    };

    let item = |route: Route, label: &str| {
        let class = if route == props.current {
            classes!("nav-link", "active")
        } else {
            classes!("nav-link")
        };
        html! { <Link to={route} {class}>{ label.to_string() }</Link> }
    };

    html! {
        <nav class="navbar">
            <Link to={Route::Home} class={classes!("navbar-brand")}>{ "MentorMatch" }</Link>
            <div class="navbar-links">
                { item(Route::Home, "Home") }
                { item(Route::Services, "Services") }
                if ctx.auth.is_signed_in() {
                    { item(Route::Dashboard, "Dashboard") }
                    { item(Route::Sessions, "Sessions") }
                    { item(Route::Counselling, "Counselling") }
                    if ctx.auth.is_mentor() {
                        { item(Route::Availability, "Availability") }
                    }
                    { item(Route::Settings, "Settings") }
                    <button class="nav-button" onclick={on_sign_out}>{ "Sign Out" }</button>
                } else {
                    { item(Route::Login, "Login") }
                    <Link to={Route::Signup} class={classes!("nav-button", "primary")}>{ "Sign Up" }</Link>
                }
            </div>
        </nav>
    }
}
