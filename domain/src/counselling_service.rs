//! Counselling sessions between a student and a mentor.

use chrono::{DateTime, Utc};
use log::info;
use serde_json::json;
use shared::{CounsellingSession, CounsellingStatus, NewCounsellingSession, Profile, Role};
use std::rc::Rc;
use uuid::Uuid;

use crate::booking_service::REQUIRED_FIELDS_MESSAGE;
use crate::error::{ServiceError, ServiceResult};
use crate::gateway::{fetch_all, insert_one, tables, DataGateway, Filter, Query};

const COUNSELLING_COLUMNS: &str = "*, \
     mentor:profiles!counselling_sessions_mentor_id_fkey(full_name), \
     student:profiles!counselling_sessions_student_id_fkey(full_name)";

/// Contents of the scheduling modal
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CounsellingRequest {
    pub mentor_id: Option<Uuid>,
    pub date_time: Option<DateTime<Utc>>,
    pub notes: String,
}

pub struct CounsellingService<G: DataGateway + ?Sized> {
    gateway: Rc<G>,
}

impl<G: DataGateway + ?Sized> CounsellingService<G> {
    pub fn new(gateway: Rc<G>) -> Self {
        Self { gateway }
    }

    /// All counselling sessions, soonest first
    pub async fn list(&self) -> ServiceResult<Vec<CounsellingSession>> {
        let query = Query::from(tables::COUNSELLING_SESSIONS)
            .select(COUNSELLING_COLUMNS)
            .order("date_time", true);
        Ok(fetch_all(self.gateway.as_ref(), &query).await?)
    }

    /// Mentors to pick from, by name
    pub async fn mentors(&self) -> ServiceResult<Vec<Profile>> {
        let query = Query::from(tables::PROFILES)
            .select("id, full_name")
            .eq("role", Role::Mentor)
            .order("full_name", true);
        Ok(fetch_all(self.gateway.as_ref(), &query).await?)
    }

    /// Schedule a session for `student_id`, who is the signed-in user
    pub async fn schedule(
        &self,
        student_id: Uuid,
        request: &CounsellingRequest,
    ) -> ServiceResult<CounsellingSession> {
        let (mentor_id, date_time) = match (request.mentor_id, request.date_time) {
            (Some(mentor_id), Some(date_time)) => (mentor_id, date_time),
            _ => return Err(ServiceError::Validation(REQUIRED_FIELDS_MESSAGE.to_string())),
        };
        let record = NewCounsellingSession {
            mentor_id,
            student_id,
            date_time,
            notes: request.notes.trim().to_string(),
            status: CounsellingStatus::Scheduled,
        };
        let session: CounsellingSession =
            insert_one(self.gateway.as_ref(), tables::COUNSELLING_SESSIONS, &record).await?;
        info!(
            "🤝 COUNSELLING: Scheduled session {} with mentor {}",
            session.id, mentor_id
        );
        Ok(session)
    }

    pub async fn set_status(&self, session_id: Uuid, status: CounsellingStatus) -> ServiceResult<()> {
        self.gateway
            .update(
                tables::COUNSELLING_SESSIONS,
                json!({ "status": status }),
                &[Filter::eq("id", session_id)],
            )
            .await?;
        info!("🤝 COUNSELLING: Session {} is now {}", session_id, status.as_str());
        Ok(())
    }
}

/// Replace the status of one session in a loaded list
pub fn replace_counselling_status(
    sessions: &mut [CounsellingSession],
    session_id: Uuid,
    status: CounsellingStatus,
) {
    if let Some(session) = sessions.iter_mut().find(|s| s.id == session_id) {
        session.status = status;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::InMemoryGateway;
    use chrono::TimeZone;

    #[tokio::test]
    async fn test_schedule_and_change_status() {
        let gateway = Rc::new(InMemoryGateway::new());
        let service = CounsellingService::new(gateway.clone());
        let student = Uuid::new_v4();
        let mentor = Uuid::new_v4();
        let request = CounsellingRequest {
            mentor_id: Some(mentor),
            date_time: Some(Utc.with_ymd_and_hms(2024, 3, 5, 14, 0, 0).unwrap()),
            notes: " career advice ".to_string(),
        };

        let created = service.schedule(student, &request).await.unwrap();
        assert_eq!(created.status, CounsellingStatus::Scheduled);
        assert_eq!(created.student_id, Some(student));
        assert_eq!(created.notes.as_deref(), Some("career advice"));

        service
            .set_status(created.id, CounsellingStatus::Completed)
            .await
            .unwrap();
        let listed = service.list().await.unwrap();
        assert_eq!(listed[0].status, CounsellingStatus::Completed);
    }

    #[tokio::test]
    async fn test_schedule_requires_mentor_and_time() {
        let gateway = Rc::new(InMemoryGateway::new());
        let service = CounsellingService::new(gateway.clone());
        let request = CounsellingRequest {
            mentor_id: Some(Uuid::new_v4()),
            ..CounsellingRequest::default()
        };

        let err = service.schedule(Uuid::new_v4(), &request).await.unwrap_err();
        assert_eq!(err.user_message("Failed"), REQUIRED_FIELDS_MESSAGE);
        assert!(gateway.rows(tables::COUNSELLING_SESSIONS).is_empty());
    }

    #[tokio::test]
    async fn test_local_status_replace() {
        let gateway = Rc::new(InMemoryGateway::new());
        let service = CounsellingService::new(gateway);
        let request = CounsellingRequest {
            mentor_id: Some(Uuid::new_v4()),
            date_time: Some(Utc::now()),
            notes: String::new(),
        };
        let mut sessions = vec![service.schedule(Uuid::new_v4(), &request).await.unwrap()];
        let id = sessions[0].id;

        replace_counselling_status(&mut sessions, id, CounsellingStatus::Cancelled);
        assert_eq!(sessions[0].status, CounsellingStatus::Cancelled);
    }
}
