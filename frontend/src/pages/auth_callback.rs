use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

use crate::components::form_fields::Spinner;
use crate::context::AppContext;
use crate::route::Route;
use crate::services::logging::Logger;

/// Landing page of the OAuth redirect; stores the session from the URL fragment
#[function_component(AuthCallbackPage)]
pub fn auth_callback_page() -> Html {
    let context = use_context::<AppContext>();

    use_effect_with((), move |_| {
        if let Some(ctx) = context {
            let fragment = gloo::utils::window().location().hash().unwrap_or_default();
            spawn_local(async move {
                match ctx.client.complete_oauth(&fragment).await {
                    Ok(user) => {
                        Logger::info_with_component("auth-callback", &format!("Signed in as {}", user.id));
                        ctx.toasts.success("Logged in successfully!");
                        ctx.refresh_auth.emit(());
                        ctx.navigate.emit(Route::Dashboard);
                    }
                    Err(e) => {
                        Logger::error_with_component("auth-callback", &format!("OAuth sign-in failed: {}", e));
                        ctx.toasts.error("Sign-in failed. Please try again.");
                        ctx.navigate.emit(Route::Login);
                    }
                }
            });
        }
        || ()
    });

    html! { <Spinner label="Completing sign-in..." /> }
}
