//! Application-wide handles shared with every page through a context provider.

use mentor_match_domain::config::ClientConfig;
use std::rc::Rc;
use yew::Callback;

use crate::hooks::use_auth::AuthState;
use crate::hooks::use_toasts::ToastHandle;
use crate::route::Route;
use crate::services::api::SupabaseClient;

#[derive(Clone, PartialEq)]
pub struct AppContext {
    pub config: Rc<ClientConfig>,
    pub client: Rc<SupabaseClient>,
    pub auth: AuthState,
    /// Reload the signed-in user and profile
    pub refresh_auth: Callback<()>,
    pub toasts: ToastHandle,
    pub navigate: Callback<Route>,
}
