//! Sign-in, sign-up and session lookup on top of the auth provider.

use log::{info, warn};
use shared::{AuthUser, OAuthProvider, Role};
use std::rc::Rc;

use crate::config::ClientConfig;
use crate::error::{ServiceError, ServiceResult};
use crate::gateway::AuthProvider;

pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Contents of the sign-up form
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SignUpForm {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub role: Role,
}

pub struct AuthService<A: AuthProvider + ?Sized> {
    auth: Rc<A>,
}

impl<A: AuthProvider + ?Sized> AuthService<A> {
    pub fn new(auth: Rc<A>) -> Self {
        Self { auth }
    }

    pub async fn current_user(&self) -> ServiceResult<Option<AuthUser>> {
        Ok(self.auth.current_user().await?)
    }

    /// The signed-in user, or `NotAuthenticated`
    pub async fn require_user(&self) -> ServiceResult<AuthUser> {
        self.current_user()
            .await?
            .ok_or(ServiceError::NotAuthenticated)
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> ServiceResult<AuthUser> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(ServiceError::Validation(
                "Please enter your email and password".to_string(),
            ));
        }
        match self.auth.sign_in_with_password(email, password).await {
            Ok(user) => {
                info!("🔐 AUTH: Signed in {}", user.id);
                Ok(user)
            }
            Err(err) => {
                warn!("🔐 AUTH: Sign-in failed: {}", err);
                Err(err.into())
            }
        }
    }

    pub async fn sign_up(&self, form: &SignUpForm) -> ServiceResult<AuthUser> {
        let email = form.email.trim();
        if email.is_empty() || form.full_name.trim().is_empty() {
            return Err(ServiceError::Validation(
                "Please fill in all required fields".to_string(),
            ));
        }
        if form.password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(ServiceError::Validation(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LENGTH
            )));
        }
        let user = self
            .auth
            .sign_up(email, &form.password, form.full_name.trim(), form.role)
            .await?;
        info!("🔐 AUTH: Registered {}", user.id);
        Ok(user)
    }

    /// Provider URL for an OAuth sign-in returning to `<origin>/auth/callback`
    pub fn oauth_url(&self, provider: OAuthProvider, origin: &str, config: &ClientConfig) -> String {
        self.auth
            .oauth_authorize_url(provider, &config.oauth_redirect_url(origin))
    }

    pub async fn sign_out(&self) -> ServiceResult<()> {
        self.auth.sign_out().await?;
        info!("🔐 AUTH: Signed out");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::InMemoryAuth;

    fn form(password: &str) -> SignUpForm {
        SignUpForm {
            email: "ada@example.com".to_string(),
            password: password.to_string(),
            full_name: "Ada".to_string(),
            role: Role::Mentor,
        }
    }

    #[tokio::test]
    async fn test_sign_up_then_sign_in() {
        let service = AuthService::new(Rc::new(InMemoryAuth::new()));

        let registered = service.sign_up(&form("secret1")).await.unwrap();
        assert!(service.current_user().await.unwrap().is_none());

        let user = service.sign_in(" ada@example.com ", "secret1").await.unwrap();
        assert_eq!(user.id, registered.id);
        assert_eq!(service.require_user().await.unwrap().id, registered.id);

        service.sign_out().await.unwrap();
        assert_eq!(
            service.require_user().await.unwrap_err(),
            ServiceError::NotAuthenticated
        );
    }

    #[tokio::test]
    async fn test_sign_in_reports_backend_message() {
        let service = AuthService::new(Rc::new(InMemoryAuth::new()));
        let err = service.sign_in("nobody@example.com", "pw").await.unwrap_err();
        assert_eq!(err.user_message("Login failed"), "Invalid login credentials");
    }

    #[tokio::test]
    async fn test_sign_up_validation() {
        let service = AuthService::new(Rc::new(InMemoryAuth::new()));
        assert!(matches!(
            service.sign_up(&form("123")).await,
            Err(ServiceError::Validation(_))
        ));
        assert!(service.sign_in("", "pw").await.is_err());
    }

    #[test]
    fn test_oauth_url_uses_callback_path() {
        let service = AuthService::new(Rc::new(InMemoryAuth::new()));
        let url = service.oauth_url(
            OAuthProvider::Github,
            "https://app.example.com",
            &ClientConfig::default(),
        );
        assert_eq!(
            url,
            "memory://authorize?provider=github&redirect_to=https://app.example.com/auth/callback"
        );
    }
}
