//! Session listing, status changes and the per-session extras shown in the
//! session modal: notes, feedback, checklist and summary.

use chrono::{DateTime, Utc};
use log::{debug, info};
use serde_json::json;
use shared::{
    ChecklistItem, ChecklistTemplate, NewChecklistItem, NewSessionNote, Session, SessionDetails,
    SessionFeedback, SessionFeedbackInput, SessionListing, SessionNote, SessionStatus,
    SessionSummary, SummaryDraft,
};
use std::rc::Rc;
use uuid::Uuid;

use crate::booking_service::iso_timestamp;
use crate::error::{ServiceError, ServiceResult};
use crate::gateway::{
    decode_rows, fetch_all, fetch_one, fetch_optional, insert_one, tables, to_row, DataGateway,
    EdgeFunction, Filter, Query,
};

const LISTING_COLUMNS: &str = "*, mentor:mentor_id(full_name), mentee:mentee_id(full_name)";
const DETAILS_COLUMNS: &str = "*, mentee:profiles!sessions_mentee_id_fkey(full_name, email)";

/// Every section of the session modal, loaded independently so one failing
/// table leaves the other sections usable
#[derive(Debug, Clone, PartialEq)]
pub struct SessionOverview {
    pub details: ServiceResult<SessionDetails>,
    pub notes: ServiceResult<Vec<SessionNote>>,
    pub feedback: ServiceResult<Option<SessionFeedback>>,
    pub checklist: ServiceResult<Vec<ChecklistItem>>,
    pub summary: ServiceResult<Option<SessionSummary>>,
}

pub struct SessionService<G: DataGateway + ?Sized> {
    gateway: Rc<G>,
}

impl<G: DataGateway + ?Sized> SessionService<G> {
    pub fn new(gateway: Rc<G>) -> Self {
        Self { gateway }
    }

    /// All sessions visible to the user, with both participants' names
    pub async fn list_all(&self) -> ServiceResult<Vec<SessionListing>> {
        let query = Query::from(tables::SESSIONS)
            .select(LISTING_COLUMNS)
            .order("date", true);
        let sessions: Vec<SessionListing> = fetch_all(self.gateway.as_ref(), &query).await?;
        debug!("📋 SESSIONS: Loaded {} sessions", sessions.len());
        Ok(sessions)
    }

    /// The mentor's sessions starting at or after `now`, soonest first
    pub async fn list_upcoming_for_mentor(
        &self,
        mentor_id: Uuid,
        now: DateTime<Utc>,
    ) -> ServiceResult<Vec<Session>> {
        let query = Query::from(tables::SESSIONS)
            .eq("mentor_id", mentor_id)
            .filter(Filter::gte("date", iso_timestamp(&now)))
            .order("date", true);
        Ok(fetch_all(self.gateway.as_ref(), &query).await?)
    }

    /// Single status write; legal transitions are left to the backend
    pub async fn set_status(&self, session_id: Uuid, status: SessionStatus) -> ServiceResult<()> {
        info!("📋 SESSIONS: Marking session {} as {}", session_id, status.as_str());
        self.gateway
            .update(
                tables::SESSIONS,
                json!({ "status": status }),
                &[Filter::eq("id", session_id)],
            )
            .await?;
        Ok(())
    }

    pub async fn cancel(&self, session_id: Uuid) -> ServiceResult<()> {
        self.set_status(session_id, SessionStatus::Cancelled).await
    }

    pub async fn details(&self, session_id: Uuid) -> ServiceResult<SessionDetails> {
        let query = Query::from(tables::SESSIONS)
            .select(DETAILS_COLUMNS)
            .eq("id", session_id);
        Ok(fetch_one(self.gateway.as_ref(), &query).await?)
    }

    pub async fn overview(&self, session_id: Uuid) -> SessionOverview {
        let overview = SessionOverview {
            details: self.details(session_id).await,
            notes: self.notes(session_id).await,
            feedback: self.feedback(session_id).await,
            checklist: self.checklist(session_id).await,
            summary: self.summary(session_id).await,
        };
        debug!("🗂️ SESSION: Loaded overview of {}", session_id);
        overview
    }

    /// Notes of a session, newest first
    pub async fn notes(&self, session_id: Uuid) -> ServiceResult<Vec<SessionNote>> {
        let query = Query::from(tables::SESSION_NOTES)
            .eq("session_id", session_id)
            .order("created_at", false);
        Ok(fetch_all(self.gateway.as_ref(), &query).await?)
    }

    pub async fn add_note(&self, session_id: Uuid, author: Uuid, content: &str) -> ServiceResult<SessionNote> {
        let content = content.trim();
        if content.is_empty() {
            return Err(ServiceError::Validation("Note cannot be empty".to_string()));
        }
        let note = NewSessionNote {
            session_id,
            content: content.to_string(),
            created_by: author.to_string(),
        };
        Ok(insert_one(self.gateway.as_ref(), tables::SESSION_NOTES, &note).await?)
    }

    /// Feedback of a session; `None` when nothing was submitted yet
    pub async fn feedback(&self, session_id: Uuid) -> ServiceResult<Option<SessionFeedback>> {
        let query = Query::from(tables::SESSION_FEEDBACK).eq("session_id", session_id);
        Ok(fetch_optional(self.gateway.as_ref(), &query).await?)
    }

    pub async fn submit_feedback(
        &self,
        session_id: Uuid,
        author: Uuid,
        rating: u8,
        comment: &str,
    ) -> ServiceResult<()> {
        if !(1..=5).contains(&rating) {
            return Err(ServiceError::Validation("Rating must be between 1 and 5".to_string()));
        }
        let input = SessionFeedbackInput {
            session_id,
            rating,
            comment: comment.trim().to_string(),
            created_by: author,
        };
        self.gateway
            .upsert(tables::SESSION_FEEDBACK, to_row(&input)?, Some("session_id"))
            .await?;
        info!("📋 SESSIONS: Feedback {} stored for {}", rating, session_id);
        Ok(())
    }

    /// Checklist of a session, oldest first
    pub async fn checklist(&self, session_id: Uuid) -> ServiceResult<Vec<ChecklistItem>> {
        let query = Query::from(tables::SESSION_CHECKLIST)
            .eq("session_id", session_id)
            .order("created_at", true);
        Ok(fetch_all(self.gateway.as_ref(), &query).await?)
    }

    pub async fn add_checklist_item(&self, session_id: Uuid, content: &str) -> ServiceResult<ChecklistItem> {
        let content = content.trim();
        if content.is_empty() {
            return Err(ServiceError::Validation("Checklist item cannot be empty".to_string()));
        }
        let item = NewChecklistItem {
            session_id,
            content: content.to_string(),
            completed: false,
        };
        Ok(insert_one(self.gateway.as_ref(), tables::SESSION_CHECKLIST, &item).await?)
    }

    /// Flip an item's completed flag, returning the new value
    pub async fn toggle_checklist_item(&self, item_id: Uuid, completed: bool) -> ServiceResult<bool> {
        let completed = !completed;
        self.gateway
            .update(
                tables::SESSION_CHECKLIST,
                json!({ "completed": completed }),
                &[Filter::eq("id", item_id)],
            )
            .await?;
        Ok(completed)
    }

    /// Replace the session's checklist with the template's items
    pub async fn apply_template(
        &self,
        session_id: Uuid,
        template: &ChecklistTemplate,
    ) -> ServiceResult<Vec<ChecklistItem>> {
        info!(
            "📋 SESSIONS: Applying template '{}' to session {}",
            template.name, session_id
        );
        self.gateway
            .delete(tables::SESSION_CHECKLIST, &[Filter::eq("session_id", session_id)])
            .await?;

        if !template.items.is_empty() {
            let items: Vec<NewChecklistItem> = template
                .items
                .iter()
                .map(|content| NewChecklistItem {
                    session_id,
                    content: content.clone(),
                    completed: false,
                })
                .collect();
            let inserted = self
                .gateway
                .insert(tables::SESSION_CHECKLIST, to_row(&items)?)
                .await?;
            let _: Vec<ChecklistItem> = decode_rows(inserted)?;
        }
        self.checklist(session_id).await
    }

    pub async fn summary(&self, session_id: Uuid) -> ServiceResult<Option<SessionSummary>> {
        let query = Query::from(tables::SESSION_SUMMARIES).eq("session_id", session_id);
        Ok(fetch_optional(self.gateway.as_ref(), &query).await?)
    }

    pub async fn submit_summary(&self, session_id: Uuid, draft: &SummaryDraft) -> ServiceResult<()> {
        let input = draft.to_input(session_id);
        self.gateway
            .upsert(tables::SESSION_SUMMARIES, to_row(&input)?, Some("session_id"))
            .await?;
        info!("📋 SESSIONS: Summary stored for {}", session_id);
        Ok(())
    }

    /// Send the summary to the mentee through the summary e-mail function
    pub async fn share_summary(&self, details: &SessionDetails, summary: &SessionSummary) -> ServiceResult<()> {
        let body = json!({
            "sessionId": details.session.id,
            "menteeEmail": details.mentee.email,
            "menteeName": details.mentee.full_name,
            "sessionTitle": details.session.title,
            "sessionDate": iso_timestamp(&details.session.date),
            "keyPoints": summary.key_points,
            "actionItems": summary.action_items,
            "nextSteps": summary.next_steps,
        });
        self.gateway.invoke(EdgeFunction::SendSummaryEmail, body).await?;
        Ok(())
    }
}

/// Replace one session's status in a locally held list
pub fn replace_status<T>(items: &mut [T], session_id: Uuid, status: SessionStatus)
where
    T: AsMut<Session>,
{
    for item in items.iter_mut() {
        let session = item.as_mut();
        if session.id == session_id {
            session.status = status;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{GatewayCall, InMemoryGateway};
    use shared::ContactInfo;

    fn session_row(id: Uuid, mentor: Uuid, date: &str) -> serde_json::Value {
        json!({
            "id": id,
            "title": "Mock interview",
            "description": "",
            "date": date,
            "mentor_id": mentor,
            "mentee_id": Uuid::new_v4(),
            "status": "upcoming"
        })
    }

    #[test]
    fn test_replace_status_touches_one_session() {
        let target = Uuid::new_v4();
        let mut sessions: Vec<Session> = [target, Uuid::new_v4()]
            .iter()
            .map(|id| serde_json::from_value(session_row(*id, Uuid::new_v4(), "2024-05-03T10:00:00Z")).unwrap())
            .collect();

        replace_status(&mut sessions, target, SessionStatus::Cancelled);

        assert_eq!(sessions[0].status, SessionStatus::Cancelled);
        assert_eq!(sessions[1].status, SessionStatus::Upcoming);
    }

    #[tokio::test]
    async fn test_upcoming_for_mentor_filters_and_orders() {
        let mentor = Uuid::new_v4();
        let gateway = Rc::new(InMemoryGateway::new());
        gateway.seed(
            tables::SESSIONS,
            vec![
                session_row(Uuid::new_v4(), mentor, "2024-05-03T10:00:00Z"),
                session_row(Uuid::new_v4(), mentor, "2024-01-01T10:00:00Z"),
                session_row(Uuid::new_v4(), mentor, "2024-04-03T10:00:00+00:00"),
                session_row(Uuid::new_v4(), Uuid::new_v4(), "2024-06-03T10:00:00Z"),
            ],
        );
        let service = SessionService::new(gateway);
        let now = DateTime::parse_from_rfc3339("2024-03-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);

        let sessions = service.list_upcoming_for_mentor(mentor, now).await.unwrap();
        let months: Vec<u32> = sessions
            .iter()
            .map(|s| chrono::Datelike::month(&s.date))
            .collect();
        assert_eq!(months, vec![4, 5]);
    }

    #[tokio::test]
    async fn test_set_status_updates_single_row() {
        let id = Uuid::new_v4();
        let gateway = Rc::new(InMemoryGateway::new());
        gateway.seed(
            tables::SESSIONS,
            vec![
                session_row(id, Uuid::new_v4(), "2024-05-03T10:00:00Z"),
                session_row(Uuid::new_v4(), Uuid::new_v4(), "2024-05-04T10:00:00Z"),
            ],
        );
        let service = SessionService::new(gateway.clone());

        service.set_status(id, SessionStatus::Completed).await.unwrap();

        let statuses: Vec<String> = gateway
            .rows(tables::SESSIONS)
            .iter()
            .map(|row| row["status"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(statuses, vec!["completed", "upcoming"]);
    }

    #[tokio::test]
    async fn test_missing_feedback_and_summary_are_empty_states() {
        let gateway = Rc::new(InMemoryGateway::new());
        let service = SessionService::new(gateway);
        let session = Uuid::new_v4();

        assert_eq!(service.feedback(session).await.unwrap(), None);
        assert_eq!(service.summary(session).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_overview_sections_fail_independently() {
        let session = Uuid::new_v4();
        let gateway = Rc::new(InMemoryGateway::new());
        let service = SessionService::new(gateway.clone());
        service.add_note(session, Uuid::new_v4(), "Went well").await.unwrap();
        gateway.fail_table(tables::SESSION_FEEDBACK, "permission denied for table session_feedback");

        let overview = service.overview(session).await;

        assert_eq!(overview.notes.unwrap().len(), 1);
        assert_eq!(
            overview.feedback.unwrap_err().user_message("Failed to load feedback"),
            "permission denied for table session_feedback"
        );
        assert_eq!(overview.checklist.unwrap(), Vec::new());
        assert_eq!(overview.summary.unwrap(), None);
    }

    #[tokio::test]
    async fn test_feedback_rating_must_be_in_range() {
        let gateway = Rc::new(InMemoryGateway::new());
        let service = SessionService::new(gateway.clone());

        let result = service.submit_feedback(Uuid::new_v4(), Uuid::new_v4(), 0, "meh").await;
        assert!(matches!(result, Err(ServiceError::Validation(_))));
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn test_feedback_upsert_replaces_previous() {
        let session = Uuid::new_v4();
        let author = Uuid::new_v4();
        let gateway = Rc::new(InMemoryGateway::new());
        let service = SessionService::new(gateway.clone());

        service.submit_feedback(session, author, 3, "ok").await.unwrap();
        service.submit_feedback(session, author, 5, " great ").await.unwrap();

        let feedback = service.feedback(session).await.unwrap().unwrap();
        assert_eq!(feedback.rating, 5);
        assert_eq!(feedback.comment, "great");
        assert_eq!(gateway.rows(tables::SESSION_FEEDBACK).len(), 1);
    }

    #[tokio::test]
    async fn test_summary_splits_lines() {
        let session = Uuid::new_v4();
        let gateway = Rc::new(InMemoryGateway::new());
        let service = SessionService::new(gateway);
        let draft = SummaryDraft {
            key_points: "Goals\n\nBlockers".to_string(),
            action_items: "Update CV".to_string(),
            next_steps: String::new(),
        };

        service.submit_summary(session, &draft).await.unwrap();

        let summary = service.summary(session).await.unwrap().unwrap();
        assert_eq!(summary.key_points, vec!["Goals", "Blockers"]);
        assert_eq!(summary.action_items, vec!["Update CV"]);
        assert!(summary.next_steps.is_empty());
    }

    #[tokio::test]
    async fn test_apply_template_replaces_checklist() {
        let session = Uuid::new_v4();
        let gateway = Rc::new(InMemoryGateway::new());
        let service = SessionService::new(gateway.clone());
        service.add_checklist_item(session, "Old item").await.unwrap();

        let template = ChecklistTemplate {
            id: Uuid::new_v4(),
            name: "Kickoff".to_string(),
            items: vec!["Introductions".to_string(), "Set goals".to_string()],
            category: None,
            created_at: Utc::now(),
        };
        let checklist = service.apply_template(session, &template).await.unwrap();

        let contents: Vec<&str> = checklist.iter().map(|i| i.content.as_str()).collect();
        assert_eq!(contents.len(), 2);
        assert!(contents.contains(&"Introductions"));
        assert!(contents.contains(&"Set goals"));
        assert!(checklist.iter().all(|i| !i.completed));
    }

    #[tokio::test]
    async fn test_toggle_checklist_item() {
        let session = Uuid::new_v4();
        let gateway = Rc::new(InMemoryGateway::new());
        let service = SessionService::new(gateway.clone());
        let item = service.add_checklist_item(session, "Send notes").await.unwrap();

        let completed = service.toggle_checklist_item(item.id, item.completed).await.unwrap();
        assert!(completed);
        assert_eq!(gateway.rows(tables::SESSION_CHECKLIST)[0]["completed"], json!(true));
    }

    #[tokio::test]
    async fn test_add_note_rejects_blank() {
        let gateway = Rc::new(InMemoryGateway::new());
        let service = SessionService::new(gateway.clone());
        assert!(service.add_note(Uuid::new_v4(), Uuid::new_v4(), "   ").await.is_err());

        let note = service
            .add_note(Uuid::new_v4(), Uuid::new_v4(), " Discussed goals ")
            .await
            .unwrap();
        assert_eq!(note.content, "Discussed goals");
    }

    #[tokio::test]
    async fn test_share_summary_body() {
        let gateway = Rc::new(InMemoryGateway::new());
        let service = SessionService::new(gateway.clone());
        let details = SessionDetails {
            session: Session {
                id: Uuid::new_v4(),
                title: "Wrap-up".to_string(),
                description: None,
                date: Utc::now(),
                mentor_id: Uuid::new_v4(),
                mentee_id: Uuid::new_v4(),
                status: SessionStatus::Completed,
            },
            mentee: ContactInfo {
                full_name: Some("Alan".to_string()),
                email: Some("alan@example.com".to_string()),
            },
        };
        let summary = SessionSummary {
            id: Uuid::new_v4(),
            session_id: details.session.id,
            key_points: vec!["Point".to_string()],
            action_items: vec![],
            next_steps: vec!["Next".to_string()],
            created_at: Utc::now(),
        };

        service.share_summary(&details, &summary).await.unwrap();

        match gateway.calls().last() {
            Some(GatewayCall::Invoke(EdgeFunction::SendSummaryEmail, body)) => {
                assert_eq!(body["menteeName"], json!("Alan"));
                assert_eq!(body["keyPoints"], json!(["Point"]));
                assert_eq!(body["sessionTitle"], json!("Wrap-up"));
            }
            other => panic!("unexpected call {:?}", other),
        }
    }
}
