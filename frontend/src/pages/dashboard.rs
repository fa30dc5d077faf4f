use yew::prelude::*;

use crate::components::form_fields::Spinner;
use crate::context::AppContext;
use crate::route::Route;

#[function_component(DashboardPage)]
pub fn dashboard_page() -> Html {
    let Some(ctx) = use_context::<AppContext>() else {
        return html! {};
    };
    if ctx.auth.loading {
        return html! { <Spinner /> };
    }

    let quick_action = |route: Route, label: &'static str| {
        let navigate = ctx.navigate.clone();
        html! {
            <button class="quick-action" onclick={Callback::from(move |_: MouseEvent| navigate.emit(route))}>
                { label }
            </button>
        }
    };

    let email = ctx
        .auth
        .user
        .as_ref()
        .and_then(|user| user.email.clone())
        .unwrap_or_default();

    html! {
        <div class="dashboard-page">
            <h1>{ "Welcome to your Dashboard" }</h1>
            <div class="dashboard-grid">
                <section class="card">
                    <h2>{ "Your Profile" }</h2>
                    <dl>
                        <dt>{ "Email" }</dt>
                        <dd>{ email }</dd>
                        if let Some(profile) = &ctx.auth.profile {
                            <dt>{ "Full Name" }</dt>
                            <dd>{ profile.full_name.clone().unwrap_or_default() }</dd>
                            <dt>{ "Role" }</dt>
                            <dd>{ profile.role.as_str() }</dd>
                        }
                    </dl>
                </section>
                <section class="card">
                    <h2>{ "Quick Actions" }</h2>
                    { quick_action(Route::BookSession, "View Mentors") }
                    { quick_action(Route::Services, "Browse Services") }
                    { quick_action(Route::Counselling, "Schedule Counselling") }
                    if ctx.auth.is_mentor() {
                        { quick_action(Route::Availability, "Manage Availability") }
                    }
                </section>
            </div>
        </div>
    }
}
