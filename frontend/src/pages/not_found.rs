use yew::prelude::*;

use crate::components::link::Link;
use crate::route::Route;

#[function_component(NotFoundPage)]
pub fn not_found_page() -> Html {
    html! {
        <div class="not-found-page">
            <h1>{ "Page not found" }</h1>
            <Link to={Route::Home}>{ "Back to home" }</Link>
        </div>
    }
}
