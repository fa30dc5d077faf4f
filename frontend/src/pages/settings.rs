use chrono::Utc;
use gloo::storage::{LocalStorage, Storage};
use mentor_match_domain::profile_service::{ProfileForm, ProfileService};
use serde::{Deserialize, Serialize};
use shared::Role;
use wasm_bindgen_futures::spawn_local;
use web_sys::HtmlInputElement;
use yew::prelude::*;

use crate::components::form_fields::{bind_input, bind_textarea, select_value, Spinner};
use crate::context::AppContext;
use crate::services::logging::Logger;

const PREFERENCES_STORAGE_KEY: &str = "mentor-match.preferences";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsTab {
    Profile,
    Security,
    Notifications,
    Appearance,
}

impl SettingsTab {
    pub const ALL: [SettingsTab; 4] = [
        SettingsTab::Profile,
        SettingsTab::Security,
        SettingsTab::Notifications,
        SettingsTab::Appearance,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            SettingsTab::Profile => "Profile",
            SettingsTab::Security => "Security",
            SettingsTab::Notifications => "Notifications",
            SettingsTab::Appearance => "Appearance",
        }
    }
}

/// Browser-local preferences; never sent to the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    pub email_notifications: bool,
    pub theme: String,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            email_notifications: true,
            theme: "dark".to_string(),
        }
    }
}

impl Preferences {
    pub fn load() -> Self {
        LocalStorage::get(PREFERENCES_STORAGE_KEY).unwrap_or_default()
    }

    pub fn store(&self) {
        if let Err(e) = LocalStorage::set(PREFERENCES_STORAGE_KEY, self) {
            Logger::warn_with_component("settings", &format!("Could not store preferences: {}", e));
        }
    }
}

#[function_component(SettingsPage)]
pub fn settings_page() -> Html {
    let Some(ctx) = use_context::<AppContext>() else {
        return html! {};
    };

    let tab = use_state(|| SettingsTab::Profile);
    let full_name = use_state(String::new);
    let bio = use_state(String::new);
    let role = use_state(Role::default);
    let saving = use_state(|| false);
    let preferences = use_state(Preferences::load);

    // Seed the form from the loaded profile
    {
        let full_name = full_name.clone();
        let bio = bio.clone();
        let role = role.clone();
        use_effect_with(ctx.auth.profile.clone(), move |profile| {
            if let Some(profile) = profile {
                let form = ProfileForm::from(profile);
                full_name.set(form.full_name);
                bio.set(form.bio);
                role.set(form.role);
            }
            || ()
        });
    }

    if ctx.auth.loading {
        return html! { <Spinner /> };
    }

    let on_save_profile = {
        let ctx = ctx.clone();
        let saving = saving.clone();
        let form = ProfileForm {
            full_name: (*full_name).clone(),
            bio: (*bio).clone(),
            role: *role,
        };
        Callback::from(move |e: SubmitEvent| {
            e.prevent_default();
            let Some(user_id) = ctx.auth.user_id() else {
                return;
            };
            let ctx = ctx.clone();
            let saving = saving.clone();
            let form = form.clone();
            saving.set(true);
            spawn_local(async move {
                match ProfileService::new(ctx.client.clone()).save(user_id, &form, Utc::now()).await {
                    Ok(()) => {
                        ctx.toasts.success("Profile updated successfully!");
                        ctx.refresh_auth.emit(());
                    }
                    Err(e) => ctx.toasts.failure("Profile update failed", &e, "Failed to update profile"),
                }
                saving.set(false);
            });
        })
    };

    let on_role = {
        let role = role.clone();
        Callback::from(move |e: Event| {
            if let Ok(selected) = Role::from_str(&select_value(&e)) {
                role.set(selected);
            }
        })
    };

    let on_notifications = {
        let preferences = preferences.clone();
        Callback::from(move |e: Event| {
            let input: HtmlInputElement = e.target_unchecked_into();
            let mut next = (*preferences).clone();
            next.email_notifications = input.checked();
            next.store();
            preferences.set(next);
        })
    };

    let on_theme = {
        let preferences = preferences.clone();
        Callback::from(move |e: Event| {
            let mut next = (*preferences).clone();
            next.theme = select_value(&e);
            next.store();
            preferences.set(next);
        })
    };

    let body = match *tab {
        SettingsTab::Profile => html! {
            <form onsubmit={on_save_profile}>
                <label>{ "Full Name" }</label>
                <input type="text" placeholder="Enter your full name"
                       value={(*full_name).clone()} oninput={bind_input(&full_name)} />
                <label>{ "Bio" }</label>
                <textarea rows="4" placeholder="Tell us about yourself"
                          value={(*bio).clone()} oninput={bind_textarea(&bio)} />
                <label>{ "Role" }</label>
                <select onchange={on_role}>
                    <option value="mentee" selected={*role == Role::Mentee}>{ "Mentee" }</option>
                    <option value="mentor" selected={*role == Role::Mentor}>{ "Mentor" }</option>
                </select>
                <button type="submit" class="primary-button" disabled={*saving}>
                    { if *saving { "Saving..." } else { "Save Changes" } }
                </button>
            </form>
        },
        SettingsTab::Security => html! {
            <div class="settings-section">
                <h3>{ "Change Password" }</h3>
                <label>{ "Current Password" }</label>
                <input type="password" disabled=true />
                <label>{ "New Password" }</label>
                <input type="password" disabled=true />
                <p class="hint">{ "Password changes are handled by the sign-in provider." }</p>
                <h3>{ "Two-Factor Authentication" }</h3>
                <p class="hint">{ "Add an extra layer of security to your account." }</p>
            </div>
        },
        SettingsTab::Notifications => html! {
            <div class="settings-section">
                <h3>{ "Notification Preferences" }</h3>
                <label class="toggle-row">
                    <span>{ "Email Notifications" }</span>
                    <input type="checkbox" checked={preferences.email_notifications} onchange={on_notifications} />
                </label>
            </div>
        },
        SettingsTab::Appearance => html! {
            <div class="settings-section">
                <h3>{ "Theme Settings" }</h3>
                <label>{ "Theme" }</label>
                <select onchange={on_theme}>
                    { for ["dark", "light", "system"].iter().map(|theme| html! {
                        <option value={*theme} selected={preferences.theme == *theme}>{ *theme }</option>
                    }) }
                </select>
            </div>
        },
    };

    html! {
        <div class="settings-page">
            <h1>{ "Settings" }</h1>
            <div class="tabs">
                { for SettingsTab::ALL.iter().map(|candidate| {
                    let tab = tab.clone();
                    let candidate = *candidate;
                    let class = if *tab == candidate { "tab active" } else { "tab" };
                    html! {
                        <button {class} onclick={Callback::from(move |_: MouseEvent| tab.set(candidate))}>
                            { candidate.label() }
                        </button>
                    }
                }) }
            </div>
            { body }
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preferences_default_to_dark_with_notifications() {
        let preferences = Preferences::default();
        assert!(preferences.email_notifications);
        assert_eq!(preferences.theme, "dark");
    }

    #[test]
    fn test_preferences_serde() {
        let preferences = Preferences {
            email_notifications: false,
            theme: "light".to_string(),
        };
        let json = serde_json::to_string(&preferences).unwrap();
        let parsed: Preferences = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, preferences);
    }
}
