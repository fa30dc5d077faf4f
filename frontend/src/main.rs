use anyhow::Context;
use gloo::history::{BrowserHistory, History};
use log::LevelFilter;
use mentor_match_domain::config::ClientConfig;
use std::rc::Rc;
use yew::prelude::*;

mod components;
mod context;
mod hooks;
mod pages;
mod route;
mod services;

use components::link::Redirect;
use components::navbar::Navbar;
use components::toaster::Toaster;
use context::AppContext;
use hooks::use_auth::use_auth;
use hooks::use_toasts::use_toasts;
use pages::auth_callback::AuthCallbackPage;
use pages::availability::AvailabilityPage;
use pages::book_session::BookSessionPage;
use pages::counselling::CounsellingPage;
use pages::dashboard::DashboardPage;
use pages::home::HomePage;
use pages::login::LoginPage;
use pages::not_found::NotFoundPage;
use pages::services::ServicesPage;
use pages::sessions::SessionsPage;
use pages::settings::SettingsPage;
use pages::signup::SignupPage;
use route::Route;
use services::api::SupabaseClient;
use services::logging::{self, Logger};

/// Defaults overridden by values baked in at build time
fn load_config() -> anyhow::Result<ClientConfig> {
    let config = ClientConfig::default().with_overrides(
        option_env!("MENTOR_MATCH_SUPABASE_URL"),
        option_env!("MENTOR_MATCH_SUPABASE_ANON_KEY"),
        option_env!("MENTOR_MATCH_LOG_LEVEL"),
    );
    config
        .validate()
        .context("invalid client configuration")?;
    Ok(config)
}

fn render_route(route: Route) -> Html {
    match route {
        Route::Home => html! { <HomePage /> },
        Route::Login => html! { <LoginPage /> },
        Route::Signup => html! { <SignupPage /> },
        Route::AuthCallback => html! { <AuthCallbackPage /> },
        Route::Dashboard => html! { <DashboardPage /> },
        Route::Sessions => html! { <SessionsPage /> },
        Route::BookSession => html! { <BookSessionPage /> },
        Route::Services => html! { <ServicesPage /> },
        Route::Counselling => html! { <CounsellingPage /> },
        Route::Settings => html! { <SettingsPage /> },
        Route::Availability => html! { <AvailabilityPage /> },
        Route::NotFound => html! { <NotFoundPage /> },
    }
}

#[derive(Properties, PartialEq)]
struct AppProps {
    config: Rc<ClientConfig>,
}

#[function_component(App)]
fn app(props: &AppProps) -> Html {
    let client: Rc<SupabaseClient> = {
        let config = props.config.clone();
        use_memo((), move |_| SupabaseClient::new((*config).clone()))
    };
    let route = use_state(route::current_route);
    let auth = use_auth(client.clone());
    let toasts = use_toasts(props.config.toast_duration_ms);

    // Follow back/forward navigation
    {
        let route = route.clone();
        use_effect_with((), move |_| {
            let listener = BrowserHistory::new().listen(move || {
                route.set(route::current_route());
            });
            move || drop(listener)
        });
    }

    let navigate = {
        let route = route.clone();
        Callback::from(move |target: Route| {
            Logger::debug_with_component("router", &format!("Navigating to {}", target.path()));
            route::push(target);
            route.set(target);
        })
    };

    let context = AppContext {
        config: props.config.clone(),
        client,
        auth: auth.state.clone(),
        refresh_auth: auth.refresh.clone(),
        toasts: toasts.handle.clone(),
        navigate,
    };

    let current = *route;
    let page = if current.requires_auth() && !auth.state.loading && !auth.state.is_signed_in() {
        html! { <Redirect to={Route::Login} /> }
    } else {
        render_route(current)
    };

    html! {
        <ContextProvider<AppContext> context={context}>
            <div class="app">
                <Navbar current={current} />
                <main class="app-main">
                    { page }
                </main>
                <Toaster toasts={toasts.toasts.clone()} handle={toasts.handle.clone()} />
            </div>
        </ContextProvider<AppContext>>
    }
}

fn main() {
    let config = match load_config() {
        Ok(config) => config,
        Err(err) => {
            gloo::console::error!(format!("{:#}; falling back to defaults", err));
            ClientConfig::default()
        }
    };

    let level = config.log_level_filter().unwrap_or(LevelFilter::Info);
    if let Err(err) = logging::init(level) {
        gloo::console::warn!(format!("Logger already installed: {}", err));
    }
    Logger::info_with_component("main", &format!("Starting MentorMatch against {}", config.supabase_url));

    yew::Renderer::<App>::with_props(AppProps {
        config: Rc::new(config),
    })
    .render();
}
