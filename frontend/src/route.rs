//! Client-side routes and browser-history navigation.

use gloo::history::{BrowserHistory, History};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Home,
    Login,
    Signup,
    AuthCallback,
    Dashboard,
    Sessions,
    BookSession,
    Services,
    Counselling,
    Settings,
    Availability,
    NotFound,
}

impl Route {
    pub fn from_path(path: &str) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or("");
        match path.trim_end_matches('/') {
            "" => Route::Home,
            "/login" => Route::Login,
            "/signup" => Route::Signup,
            "/auth/callback" => Route::AuthCallback,
            "/dashboard" => Route::Dashboard,
            "/sessions" => Route::Sessions,
            "/sessions/book" | "/mentors" => Route::BookSession,
            "/services" => Route::Services,
            "/counselling" => Route::Counselling,
            "/settings" => Route::Settings,
            "/settings/availability" => Route::Availability,
            _ => Route::NotFound,
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            Route::Home => "/",
            Route::Login => "/login",
            Route::Signup => "/signup",
            Route::AuthCallback => "/auth/callback",
            Route::Dashboard => "/dashboard",
            Route::Sessions => "/sessions",
            Route::BookSession => "/sessions/book",
            Route::Services => "/services",
            Route::Counselling => "/counselling",
            Route::Settings => "/settings",
            Route::Availability => "/settings/availability",
            Route::NotFound => "/404",
        }
    }

    /// Pages that send signed-out visitors to the login page
    pub fn requires_auth(&self) -> bool {
        matches!(
            self,
            Route::Dashboard
                | Route::Sessions
                | Route::BookSession
                | Route::Counselling
                | Route::Settings
                | Route::Availability
        )
    }
}

/// Route of the page currently shown by the browser
pub fn current_route() -> Route {
    Route::from_path(&BrowserHistory::new().location().path())
}

pub fn push(route: Route) {
    BrowserHistory::new().push(route.path());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_round_trip() {
        let routes = [
            Route::Home,
            Route::Login,
            Route::Signup,
            Route::AuthCallback,
            Route::Dashboard,
            Route::Sessions,
            Route::BookSession,
            Route::Services,
            Route::Counselling,
            Route::Settings,
            Route::Availability,
        ];
        for route in routes {
            assert_eq!(Route::from_path(route.path()), route);
        }
    }

    #[test]
    fn test_from_path_tolerates_suffixes() {
        assert_eq!(Route::from_path("/dashboard/"), Route::Dashboard);
        assert_eq!(Route::from_path("/auth/callback#access_token=x"), Route::AuthCallback);
        assert_eq!(Route::from_path("/mentors"), Route::BookSession);
        assert_eq!(Route::from_path("/nope"), Route::NotFound);
    }

    #[test]
    fn test_protected_routes() {
        assert!(Route::Availability.requires_auth());
        assert!(!Route::Services.requires_auth());
        assert!(!Route::Login.requires_auth());
    }
}
