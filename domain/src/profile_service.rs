//! Profiles: the signed-in user's own profile, mentor listings and the
//! mentor-only role gate.

use chrono::{DateTime, Utc};
use log::info;
use shared::{Profile, ProfileUpdate, Role};
use std::rc::Rc;
use uuid::Uuid;

use crate::error::{ServiceError, ServiceResult};
use crate::gateway::{fetch_all, fetch_optional, tables, to_row, DataGateway, Filter, Query};

/// Editable fields of the settings profile tab
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProfileForm {
    pub full_name: String,
    pub bio: String,
    pub role: Role,
}

impl From<&Profile> for ProfileForm {
    fn from(profile: &Profile) -> Self {
        Self {
            full_name: profile.full_name.clone().unwrap_or_default(),
            bio: profile.bio.clone().unwrap_or_default(),
            role: profile.role,
        }
    }
}

/// Result of checking access to a mentor-only page
#[derive(Debug, Clone, PartialEq)]
pub enum RoleGate {
    Allowed(Profile),
    /// Signed in but not a mentor
    Denied,
}

pub struct ProfileService<G: DataGateway + ?Sized> {
    gateway: Rc<G>,
}

impl<G: DataGateway + ?Sized> ProfileService<G> {
    pub fn new(gateway: Rc<G>) -> Self {
        Self { gateway }
    }

    pub async fn load(&self, user_id: Uuid) -> ServiceResult<Option<Profile>> {
        let query = Query::from(tables::PROFILES).eq("id", user_id);
        Ok(fetch_optional(self.gateway.as_ref(), &query).await?)
    }

    pub async fn save(
        &self,
        user_id: Uuid,
        form: &ProfileForm,
        now: DateTime<Utc>,
    ) -> ServiceResult<()> {
        let update = ProfileUpdate {
            id: user_id,
            full_name: form.full_name.trim().to_string(),
            bio: form.bio.trim().to_string(),
            role: form.role,
            updated_at: now,
        };
        self.gateway
            .upsert(tables::PROFILES, to_row(&update)?, Some("id"))
            .await?;
        info!("👤 PROFILE: Updated profile {}", user_id);
        Ok(())
    }

    /// Mentors other than `exclude` (the signed-in user when booking)
    pub async fn mentors(&self, exclude: Option<Uuid>) -> ServiceResult<Vec<Profile>> {
        let mut query = Query::from(tables::PROFILES)
            .eq("role", Role::Mentor)
            .order("full_name", true);
        if let Some(user_id) = exclude {
            query = query.filter(Filter::neq("id", user_id));
        }
        Ok(fetch_all(self.gateway.as_ref(), &query).await?)
    }

    /// Allow only users whose profile has the mentor role
    pub async fn require_mentor(&self, user_id: Uuid) -> ServiceResult<RoleGate> {
        match self.load(user_id).await? {
            Some(profile) if profile.is_mentor() => Ok(RoleGate::Allowed(profile)),
            _ => Ok(RoleGate::Denied),
        }
    }

    pub async fn load_required(&self, user_id: Uuid) -> ServiceResult<Profile> {
        self.load(user_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Profile not found".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::InMemoryGateway;
    use serde_json::json;

    fn seeded() -> (Rc<InMemoryGateway>, Uuid, Uuid, Uuid) {
        let mentor = Uuid::new_v4();
        let other_mentor = Uuid::new_v4();
        let mentee = Uuid::new_v4();
        let gateway = Rc::new(InMemoryGateway::new());
        gateway.seed(
            tables::PROFILES,
            vec![
                json!({"id": mentor, "full_name": "Grace", "role": "mentor"}),
                json!({"id": other_mentor, "full_name": "Ada", "role": "mentor", "expertise": ["Rust"]}),
                json!({"id": mentee, "full_name": "Alan", "role": "mentee"}),
            ],
        );
        (gateway, mentor, other_mentor, mentee)
    }

    #[tokio::test]
    async fn test_mentors_excludes_current_user() {
        let (gateway, mentor, other_mentor, _) = seeded();
        let service = ProfileService::new(gateway);

        let mentors = service.mentors(Some(mentor)).await.unwrap();
        assert_eq!(mentors.len(), 1);
        assert_eq!(mentors[0].id, other_mentor);
        assert_eq!(mentors[0].expertise, vec!["Rust"]);

        assert_eq!(service.mentors(None).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_role_gate() {
        let (gateway, mentor, _, mentee) = seeded();
        let service = ProfileService::new(gateway);

        assert!(matches!(service.require_mentor(mentor).await.unwrap(), RoleGate::Allowed(_)));
        assert_eq!(service.require_mentor(mentee).await.unwrap(), RoleGate::Denied);
        assert_eq!(service.require_mentor(Uuid::new_v4()).await.unwrap(), RoleGate::Denied);
    }

    #[tokio::test]
    async fn test_save_upserts_profile() {
        let (gateway, _, _, mentee) = seeded();
        let service = ProfileService::new(gateway.clone());
        let form = ProfileForm {
            full_name: " Alan T ".to_string(),
            bio: "Maths".to_string(),
            role: Role::Mentor,
        };

        service.save(mentee, &form, Utc::now()).await.unwrap();

        let profile = service.load_required(mentee).await.unwrap();
        assert_eq!(profile.full_name.as_deref(), Some("Alan T"));
        assert_eq!(profile.role, Role::Mentor);
        assert_eq!(ProfileForm::from(&profile).bio, "Maths");
        assert_eq!(gateway.rows(tables::PROFILES).len(), 3);
    }
}
