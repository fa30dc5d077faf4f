use mentor_match_domain::auth_service::AuthService;
use mentor_match_domain::profile_service::ProfileService;
use shared::{AuthUser, Profile};
use std::rc::Rc;
use uuid::Uuid;
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

use crate::services::api::SupabaseClient;
use crate::services::logging::Logger;

/// Signed-in user and their profile
#[derive(Debug, Clone, PartialEq)]
pub struct AuthState {
    pub loading: bool,
    pub user: Option<AuthUser>,
    pub profile: Option<Profile>,
}

impl Default for AuthState {
    fn default() -> Self {
        Self {
            loading: true,
            user: None,
            profile: None,
        }
    }
}

impl AuthState {
    pub fn user_id(&self) -> Option<Uuid> {
        self.user.as_ref().map(|user| user.id)
    }

    pub fn is_signed_in(&self) -> bool {
        self.user.is_some()
    }

    pub fn is_mentor(&self) -> bool {
        self.profile.as_ref().is_some_and(Profile::is_mentor)
    }

    /// Name for greetings: profile name, then e-mail
    pub fn display_name(&self) -> String {
        match (&self.profile, &self.user) {
            (Some(profile), _) => profile.display_name().to_string(),
            (None, Some(user)) => user.email.clone().unwrap_or_default(),
            (None, None) => String::new(),
        }
    }
}

pub struct UseAuthResult {
    pub state: AuthState,
    pub refresh: Callback<()>,
}

#[hook]
pub fn use_auth(client: Rc<SupabaseClient>) -> UseAuthResult {
    let state = use_state(AuthState::default);

    let refresh = {
        let state = state.clone();
        use_callback((), move |_: (), _| {
            let client = client.clone();
            let state = state.clone();

            spawn_local(async move {
                let auth = AuthService::new(client.clone());
                let user = match auth.current_user().await {
                    Ok(user) => user,
                    Err(e) => {
                        Logger::error_with_component("use-auth", &format!("Failed to get user: {}", e));
                        None
                    }
                };

                let profile = match &user {
                    Some(user) => match ProfileService::new(client).load(user.id).await {
                        Ok(profile) => profile,
                        Err(e) => {
                            Logger::error_with_component("use-auth", &format!("Failed to load profile: {}", e));
                            None
                        }
                    },
                    None => None,
                };

                state.set(AuthState {
                    loading: false,
                    user,
                    profile,
                });
            });
        })
    };

    // Load the stored session once
    use_effect_with((), {
        let refresh = refresh.clone();
        move |_| {
            refresh.emit(());
            || ()
        }
    });

    UseAuthResult {
        state: (*state).clone(),
        refresh,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::Role;

    #[test]
    fn test_display_name_falls_back_to_email() {
        let user = AuthUser {
            id: Uuid::new_v4(),
            email: Some("ada@example.com".to_string()),
        };
        let mut state = AuthState {
            loading: false,
            user: Some(user.clone()),
            profile: None,
        };
        assert_eq!(state.display_name(), "ada@example.com");
        assert!(!state.is_mentor());

        state.profile = Some(Profile {
            id: user.id,
            full_name: Some("Ada".to_string()),
            bio: None,
            role: Role::Mentor,
            email: None,
            expertise: Vec::new(),
        });
        assert_eq!(state.display_name(), "Ada");
        assert!(state.is_mentor());
    }
}
