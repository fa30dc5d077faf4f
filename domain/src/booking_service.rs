//! Booking and rescheduling of mentoring sessions.
//!
//! Slot conflicts are decided by the backend's availability procedure; this
//! service only combines the chosen date and time, asks the procedure and
//! writes the session when the slot is free.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, SecondsFormat, TimeZone, Timelike, Utc};
use log::{info, warn};
use serde_json::json;
use shared::{NewSession, NewSessionNote, Session, SessionDetails, SessionStatus};
use std::rc::Rc;
use uuid::Uuid;

use crate::error::{ServiceError, ServiceResult};
use crate::gateway::{
    call, decode_rows, insert_one, tables, to_row, DataGateway, EdgeFunction, Filter, Procedure,
};

pub const REQUIRED_FIELDS_MESSAGE: &str = "Please fill in all required fields";
pub const SLOT_UNAVAILABLE_MESSAGE: &str =
    "Selected time slot is not available. Please choose another time.";

/// Length of every bookable slot
pub fn slot_length() -> Duration {
    Duration::hours(1)
}

/// End of the slot starting at `start` as `HH:MM`. Past midnight the hour
/// keeps counting (`24:30`) so the window sent to the backend never inverts.
pub fn slot_end(start: NaiveTime) -> String {
    let (end, wrapped_secs) = start.overflowing_add_signed(slot_length());
    let hour = end.hour() + if wrapped_secs != 0 { 24 } else { 0 };
    format!("{:02}:{:02}", hour, end.minute())
}

/// Timestamp format used in request bodies (`2024-03-05T09:00:00.000Z`)
pub fn iso_timestamp(instant: &DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Combine a calendar date and wall-clock time in `tz` into an instant
pub fn combine_local<Tz: TimeZone>(
    date: NaiveDate,
    time: NaiveTime,
    tz: &Tz,
) -> ServiceResult<DateTime<Utc>> {
    tz.from_local_datetime(&date.and_time(time))
        .earliest()
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(|| ServiceError::Validation("Invalid date or time".to_string()))
}

/// Parse `HH:MM` as produced by time inputs and slot buttons
pub fn parse_time(value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .ok()
}

/// Contents of the booking form
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BookingRequest {
    pub mentor_id: Option<Uuid>,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub title: String,
    pub description: String,
}

impl BookingRequest {
    /// Mentor, date, time and a non-blank title are required
    pub fn validate(&self) -> ServiceResult<(Uuid, NaiveDate, NaiveTime)> {
        match (self.mentor_id, self.date, self.time) {
            (Some(mentor), Some(date), Some(time)) if !self.title.trim().is_empty() => {
                Ok((mentor, date, time))
            }
            _ => Err(ServiceError::Validation(REQUIRED_FIELDS_MESSAGE.to_string())),
        }
    }

    pub fn scheduled_at_in<Tz: TimeZone>(&self, tz: &Tz) -> ServiceResult<DateTime<Utc>> {
        let (_, date, time) = self.validate()?;
        combine_local(date, time, tz)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BookingOutcome {
    Booked(Session),
    /// The availability procedure rejected the slot
    Unavailable,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RescheduleOutcome {
    Rescheduled {
        date: DateTime<Utc>,
        /// The reschedule stands even when the notification e-mail failed
        email_error: Option<ServiceError>,
    },
    Unavailable,
}

pub struct BookingService<G: DataGateway + ?Sized> {
    gateway: Rc<G>,
}

impl<G: DataGateway + ?Sized> BookingService<G> {
    pub fn new(gateway: Rc<G>) -> Self {
        Self { gateway }
    }

    /// Ask the backend whether a one-hour slot starting at `start` is free
    pub async fn check_slot(
        &self,
        mentor_id: Uuid,
        scheduled_at: DateTime<Utc>,
        start: NaiveTime,
    ) -> ServiceResult<bool> {
        let params = json!({
            "p_mentor_id": mentor_id,
            "p_date": iso_timestamp(&scheduled_at),
            "p_start_time": start.format("%H:%M").to_string(),
            "p_end_time": slot_end(start),
        });
        let available: Option<bool> =
            call(self.gateway.as_ref(), Procedure::CheckTimeSlotAvailability, params).await?;
        Ok(available.unwrap_or(false))
    }

    /// Book a session for `mentee_id`; an unavailable slot is not an error
    pub async fn book<Tz: TimeZone>(
        &self,
        mentee_id: Uuid,
        request: &BookingRequest,
        tz: &Tz,
    ) -> ServiceResult<BookingOutcome> {
        let (mentor_id, date, time) = request.validate()?;
        let scheduled_at = combine_local(date, time, tz)?;

        info!(
            "📆 BOOKING: Checking slot {} for mentor {}",
            scheduled_at, mentor_id
        );
        if !self.check_slot(mentor_id, scheduled_at, time).await? {
            info!("📆 BOOKING: Slot {} unavailable", scheduled_at);
            return Ok(BookingOutcome::Unavailable);
        }

        let new_session = NewSession {
            title: request.title.trim().to_string(),
            description: request.description.clone(),
            date: scheduled_at,
            mentor_id,
            mentee_id,
            status: SessionStatus::Upcoming,
        };
        let session: Session =
            insert_one(self.gateway.as_ref(), tables::SESSIONS, &new_session).await?;
        info!("📆 BOOKING: Booked session {}", session.id);
        Ok(BookingOutcome::Booked(session))
    }

    /// Move a session to a new slot, leave a system note and notify the mentee
    pub async fn reschedule<Tz: TimeZone>(
        &self,
        details: &SessionDetails,
        date: NaiveDate,
        time: NaiveTime,
        tz: &Tz,
    ) -> ServiceResult<RescheduleOutcome>
    where
        Tz::Offset: std::fmt::Display,
    {
        let session = &details.session;
        let new_date = combine_local(date, time, tz)?;

        if !self.check_slot(session.mentor_id, new_date, time).await? {
            return Ok(RescheduleOutcome::Unavailable);
        }

        let patch = json!({
            "date": iso_timestamp(&new_date),
            "status": SessionStatus::Rescheduled,
        });
        let updated = self
            .gateway
            .update(tables::SESSIONS, patch, &[Filter::eq("id", session.id)])
            .await?;
        let _: Vec<Session> = decode_rows(updated)?;
        info!("📆 BOOKING: Rescheduled session {} to {}", session.id, new_date);

        let note = NewSessionNote {
            session_id: session.id,
            content: format!(
                "Session rescheduled to {}",
                new_date.with_timezone(tz).format("%-m/%-d/%Y, %-I:%M:%S %p")
            ),
            created_by: "system".to_string(),
        };
        if let Err(err) = self
            .gateway
            .insert(tables::SESSION_NOTES, to_row(&note)?)
            .await
        {
            warn!("📆 BOOKING: Failed to record reschedule note: {}", err);
        }

        let email_error = self
            .send_reschedule_email(details, new_date)
            .await
            .err();
        Ok(RescheduleOutcome::Rescheduled {
            date: new_date,
            email_error,
        })
    }

    pub async fn send_reschedule_email(
        &self,
        details: &SessionDetails,
        new_date: DateTime<Utc>,
    ) -> ServiceResult<()> {
        let body = json!({
            "sessionId": details.session.id,
            "menteeEmail": details.mentee.email,
            "oldDateTime": iso_timestamp(&details.session.date),
            "newDateTime": iso_timestamp(&new_date),
        });
        self.gateway
            .invoke(EdgeFunction::SendRescheduleEmail, body)
            .await
            .map_err(|err| {
                warn!("📆 BOOKING: Reschedule e-mail failed: {}", err);
                ServiceError::from(err)
            })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{GatewayCall, InMemoryGateway};
    use chrono::FixedOffset;
    use shared::ContactInfo;

    fn request(mentor: Uuid) -> BookingRequest {
        BookingRequest {
            mentor_id: Some(mentor),
            date: NaiveDate::from_ymd_opt(2024, 3, 5),
            time: parse_time("09:00"),
            title: "Portfolio review".to_string(),
            description: "Bring your CV".to_string(),
        }
    }

    fn details() -> SessionDetails {
        SessionDetails {
            session: Session {
                id: Uuid::new_v4(),
                title: "Weekly".to_string(),
                description: None,
                date: DateTime::parse_from_rfc3339("2024-03-04T09:00:00Z")
                    .unwrap()
                    .with_timezone(&Utc),
                mentor_id: Uuid::new_v4(),
                mentee_id: Uuid::new_v4(),
                status: SessionStatus::Upcoming,
            },
            mentee: ContactInfo {
                full_name: Some("Alan".to_string()),
                email: Some("alan@example.com".to_string()),
            },
        }
    }

    #[test]
    fn test_missing_fields_rejected() {
        let mut req = request(Uuid::new_v4());
        req.title = "  ".to_string();
        assert_eq!(
            req.validate(),
            Err(ServiceError::Validation(REQUIRED_FIELDS_MESSAGE.to_string()))
        );

        let req = BookingRequest {
            time: None,
            ..request(Uuid::new_v4())
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_scheduled_at_in_time_zone() {
        let req = request(Uuid::new_v4());
        let plus_one = FixedOffset::east_opt(3600).unwrap();
        let at = req.scheduled_at_in(&plus_one).unwrap();
        assert_eq!(iso_timestamp(&at), "2024-03-05T08:00:00.000Z");
    }

    #[test]
    fn test_slot_end_keeps_counting_past_midnight() {
        let at = |h, m| NaiveTime::from_hms_opt(h, m, 0).unwrap();
        assert_eq!(slot_end(at(9, 0)), "10:00");
        assert_eq!(slot_end(at(22, 45)), "23:45");
        assert_eq!(slot_end(at(23, 30)), "24:30");
    }

    #[tokio::test]
    async fn test_late_evening_slot_sends_ordered_window() {
        let gateway = Rc::new(InMemoryGateway::new());
        gateway.set_rpc_response(Procedure::CheckTimeSlotAvailability, json!(true));
        let service = BookingService::new(gateway.clone());
        let start = NaiveTime::from_hms_opt(23, 30, 0).unwrap();
        let scheduled_at = combine_local(
            NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
            start,
            &Utc,
        )
        .unwrap();

        assert!(service.check_slot(Uuid::new_v4(), scheduled_at, start).await.unwrap());

        let rpc = gateway
            .calls()
            .into_iter()
            .find_map(|call| match call {
                GatewayCall::Rpc(_, params) => Some(params),
                _ => None,
            })
            .unwrap();
        assert_eq!(rpc["p_start_time"], json!("23:30"));
        assert_eq!(rpc["p_end_time"], json!("24:30"));
    }

    #[tokio::test]
    async fn test_unavailable_slot_creates_no_session() {
        let gateway = Rc::new(InMemoryGateway::new());
        gateway.set_rpc_response(Procedure::CheckTimeSlotAvailability, json!(false));
        let service = BookingService::new(gateway.clone());

        let outcome = service.book(Uuid::new_v4(), &request(Uuid::new_v4()), &Utc).await.unwrap();

        assert_eq!(outcome, BookingOutcome::Unavailable);
        assert!(gateway.rows(tables::SESSIONS).is_empty());
    }

    #[tokio::test]
    async fn test_failed_check_is_error_without_insert() {
        let gateway = Rc::new(InMemoryGateway::new());
        gateway.fail_rpc(Procedure::CheckTimeSlotAvailability, "function does not exist");
        let service = BookingService::new(gateway.clone());

        let result = service.book(Uuid::new_v4(), &request(Uuid::new_v4()), &Utc).await;

        assert_eq!(
            result.unwrap_err().user_message("Booking failed"),
            "function does not exist"
        );
        assert!(gateway.rows(tables::SESSIONS).is_empty());
    }

    #[tokio::test]
    async fn test_available_slot_inserts_one_upcoming_session() {
        let mentor = Uuid::new_v4();
        let mentee = Uuid::new_v4();
        let gateway = Rc::new(InMemoryGateway::new());
        gateway.set_rpc_response(Procedure::CheckTimeSlotAvailability, json!(true));
        let service = BookingService::new(gateway.clone());

        let outcome = service.book(mentee, &request(mentor), &Utc).await.unwrap();

        let rows = gateway.rows(tables::SESSIONS);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["status"], json!("upcoming"));
        match outcome {
            BookingOutcome::Booked(session) => {
                assert_eq!(session.mentor_id, mentor);
                assert_eq!(session.mentee_id, mentee);
            }
            BookingOutcome::Unavailable => panic!("expected a booking"),
        }

        let rpc = gateway
            .calls()
            .into_iter()
            .find_map(|call| match call {
                GatewayCall::Rpc(_, params) => Some(params),
                _ => None,
            })
            .unwrap();
        assert_eq!(rpc["p_start_time"], json!("09:00"));
        assert_eq!(rpc["p_end_time"], json!("10:00"));
        assert_eq!(rpc["p_date"], json!("2024-03-05T09:00:00.000Z"));
    }

    #[tokio::test]
    async fn test_reschedule_updates_notes_and_notifies() {
        let details = details();
        let gateway = Rc::new(InMemoryGateway::new());
        gateway.seed(
            tables::SESSIONS,
            vec![to_row(&details.session).unwrap()],
        );
        gateway.set_rpc_response(Procedure::CheckTimeSlotAvailability, json!(true));
        let service = BookingService::new(gateway.clone());

        let outcome = service
            .reschedule(
                &details,
                NaiveDate::from_ymd_opt(2024, 3, 7).unwrap(),
                parse_time("14:00").unwrap(),
                &Utc,
            )
            .await
            .unwrap();

        assert!(matches!(outcome, RescheduleOutcome::Rescheduled { email_error: None, .. }));
        let session = &gateway.rows(tables::SESSIONS)[0];
        assert_eq!(session["status"], json!("rescheduled"));
        let notes = gateway.rows(tables::SESSION_NOTES);
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0]["created_by"], json!("system"));
        assert_eq!(
            notes[0]["content"],
            json!("Session rescheduled to 3/7/2024, 2:00:00 PM")
        );

        let email = gateway
            .calls()
            .into_iter()
            .find_map(|call| match call {
                GatewayCall::Invoke(EdgeFunction::SendRescheduleEmail, body) => Some(body),
                _ => None,
            })
            .unwrap();
        assert_eq!(email["menteeEmail"], json!("alan@example.com"));
        assert_eq!(email["newDateTime"], json!("2024-03-07T14:00:00.000Z"));
    }

    #[tokio::test]
    async fn test_reschedule_email_failure_is_reported_separately() {
        let details = details();
        let gateway = Rc::new(InMemoryGateway::new());
        gateway.seed(
            tables::SESSIONS,
            vec![to_row(&details.session).unwrap()],
        );
        gateway.set_rpc_response(Procedure::CheckTimeSlotAvailability, json!(true));
        gateway.fail_function(EdgeFunction::SendRescheduleEmail, "smtp down");
        let service = BookingService::new(gateway.clone());

        let outcome = service
            .reschedule(
                &details,
                NaiveDate::from_ymd_opt(2024, 3, 7).unwrap(),
                parse_time("14:00").unwrap(),
                &Utc,
            )
            .await
            .unwrap();

        match outcome {
            RescheduleOutcome::Rescheduled { email_error, .. } => assert!(email_error.is_some()),
            RescheduleOutcome::Unavailable => panic!("expected a reschedule"),
        }
        assert_eq!(gateway.rows(tables::SESSIONS)[0]["status"], json!("rescheduled"));
    }
}
