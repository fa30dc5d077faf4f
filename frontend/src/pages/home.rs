use yew::prelude::*;

use crate::components::link::Link;
use crate::route::Route;

fn feature_card(title: &'static str, text: &'static str) -> Html {
    html! {
        <div class="feature-card">
            <h3>{ title }</h3>
            <p>{ text }</p>
        </div>
    }
}

#[function_component(HomePage)]
pub fn home_page() -> Html {
    html! {
        <div class="home-page">
            <section class="hero">
                <h1>{ "Welcome to Our Platform" }</h1>
                <p>{ "Connect, Learn, and Grow with our innovative mentoring platform" }</p>
                <div class="button-row">
                    <Link to={Route::Signup} class={classes!("primary-button")}>{ "Get Started" }</Link>
                    <Link to={Route::Login} class={classes!("secondary-button")}>{ "Sign In" }</Link>
                </div>
            </section>
            <section class="features">
                { feature_card("Fast & Efficient", "Experience lightning-fast performance with our optimized platform") }
                { feature_card("Community Driven", "Join a thriving community of mentors and mentees") }
                { feature_card("Smart Learning", "Personalized learning paths for every mentee") }
            </section>
            <section class="cta">
                <h2>{ "Ready to Start Your Journey?" }</h2>
                <p>{ "Join thousands of learners and mentors today" }</p>
                <Link to={Route::Signup} class={classes!("primary-button")}>{ "Get Started Now" }</Link>
            </section>
        </div>
    }
}
