use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use uuid::Uuid;

/// Weekday names indexed by `day_of_week` (0 = Sunday, 1 = Monday, ..., 6 = Saturday)
pub const DAY_NAMES: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

/// Treat an explicit JSON `null` the same as a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Role of a user on the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Mentor,
    #[default]
    Mentee,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Mentor => "mentor",
            Role::Mentee => "mentee",
        }
    }

    /// Parse from the value of a `<select>` element
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "mentor" => Ok(Role::Mentor),
            "mentee" => Ok(Role::Mentee),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A row of the `profiles` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub role: Role,
    #[serde(default)]
    pub email: Option<String>,
    /// Free-form expertise tags, shown next to mentors when booking
    #[serde(default, deserialize_with = "null_as_default")]
    pub expertise: Vec<String>,
}

impl Profile {
    /// Name to show in the UI, falling back to the e-mail address
    pub fn display_name(&self) -> &str {
        self.full_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .or(self.email.as_deref())
            .unwrap_or("Unknown")
    }

    pub fn is_mentor(&self) -> bool {
        self.role == Role::Mentor
    }
}

/// Payload for upserting the signed-in user's profile from the settings form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    pub id: Uuid,
    pub full_name: String,
    pub bio: String,
    pub role: Role,
    pub updated_at: DateTime<Utc>,
}

/// Embedded `full_name` of a joined profile (e.g. `mentor:mentor_id(full_name)`)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProfileName {
    #[serde(default)]
    pub full_name: Option<String>,
}

impl ProfileName {
    pub fn name_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.full_name.as_deref().unwrap_or(fallback)
    }
}

/// Embedded contact details of a joined profile
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ContactInfo {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// The user as known to the authentication provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
}

/// External identity providers offered on the login page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OAuthProvider {
    Google,
    Github,
    Azure,
}

impl OAuthProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            OAuthProvider::Google => "google",
            OAuthProvider::Github => "github",
            OAuthProvider::Azure => "azure",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            OAuthProvider::Google => "Google",
            OAuthProvider::Github => "GitHub",
            OAuthProvider::Azure => "Microsoft",
        }
    }
}

/// Lifecycle status of a mentoring session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    #[default]
    Upcoming,
    Completed,
    Cancelled,
    Rescheduled,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Upcoming => "upcoming",
            SessionStatus::Completed => "completed",
            SessionStatus::Cancelled => "cancelled",
            SessionStatus::Rescheduled => "rescheduled",
        }
    }

    /// Capitalized label for status badges
    pub fn label(&self) -> &'static str {
        match self {
            SessionStatus::Upcoming => "Upcoming",
            SessionStatus::Completed => "Completed",
            SessionStatus::Cancelled => "Cancelled",
            SessionStatus::Rescheduled => "Rescheduled",
        }
    }
}

/// A row of the `sessions` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Scheduled start of the session
    pub date: DateTime<Utc>,
    pub mentor_id: Uuid,
    pub mentee_id: Uuid,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: SessionStatus,
}

impl AsMut<Session> for Session {
    fn as_mut(&mut self) -> &mut Session {
        self
    }
}

/// Session row with the participants' names embedded, as listed on `/sessions`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionListing {
    #[serde(flatten)]
    pub session: Session,
    #[serde(default)]
    pub mentor: Option<ProfileName>,
    #[serde(default)]
    pub mentee: Option<ProfileName>,
}

impl SessionListing {
    /// Name of the other participant from the point of view of `viewer`
    pub fn counterpart_name(&self, viewer: Role) -> &str {
        let other = match viewer {
            Role::Mentor => self.mentee.as_ref(),
            Role::Mentee => self.mentor.as_ref(),
        };
        other.and_then(|p| p.full_name.as_deref()).unwrap_or("Unknown")
    }
}

impl AsMut<Session> for SessionListing {
    fn as_mut(&mut self) -> &mut Session {
        &mut self.session
    }
}

/// Session row with the mentee's contact details, shown in the session modal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionDetails {
    #[serde(flatten)]
    pub session: Session,
    #[serde(default)]
    pub mentee: ContactInfo,
}

/// Insert payload for a booked session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSession {
    pub title: String,
    pub description: String,
    pub date: DateTime<Utc>,
    pub mentor_id: Uuid,
    pub mentee_id: Uuid,
    pub status: SessionStatus,
}

/// A row of the `mentor_availability` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailabilityRule {
    /// Absent for rules that only exist locally (defaults not yet saved)
    #[serde(default)]
    pub id: Option<Uuid>,
    pub day_of_week: u8, // 0 = Sunday, 1 = Monday, ..., 6 = Saturday
    pub start_time: String,
    pub end_time: String,
    pub is_available: bool,
}

impl AvailabilityRule {
    /// Default week used when a mentor has never saved availability:
    /// 09:00-17:00, available Monday to Friday
    pub fn default_week() -> Vec<AvailabilityRule> {
        (0..7u8)
            .map(|day| AvailabilityRule {
                id: None,
                day_of_week: day,
                start_time: "09:00".to_string(),
                end_time: "17:00".to_string(),
                is_available: day != 0 && day != 6,
            })
            .collect()
    }

    pub fn day_name(&self) -> &'static str {
        DAY_NAMES.get(self.day_of_week as usize).copied().unwrap_or("Invalid")
    }

    /// Time columns come back as `HH:MM:SS`; time inputs want `HH:MM`
    pub fn short_time(value: &str) -> &str {
        value.get(..5).unwrap_or(value)
    }
}

/// Insert payload for `mentor_availability`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAvailabilityRule {
    pub mentor_id: Uuid,
    pub day_of_week: u8,
    pub start_time: String,
    pub end_time: String,
    pub is_available: bool,
}

/// A row of the `checklist_templates` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChecklistTemplate {
    pub id: Uuid,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub items: Vec<String>,
    #[serde(default)]
    pub category: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for `checklist_templates`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTemplate {
    pub mentor_id: Uuid,
    pub name: String,
    pub items: Vec<String>,
    pub category: Option<String>,
}

/// A row of the `template_versions` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateVersion {
    pub id: Uuid,
    pub template_id: Uuid,
    pub version: u32,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub items: Vec<String>,
    #[serde(default)]
    pub category: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub created_by: Option<Uuid>,
}

/// Insert payload for `template_versions`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTemplateVersion {
    pub template_id: Uuid,
    pub version: u32,
    pub name: String,
    pub items: Vec<String>,
    pub category: Option<String>,
    pub created_by: Uuid,
}

/// A row of the `template_categories` table (only the name is selected)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateCategory {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTemplateCategory {
    pub mentor_id: Uuid,
    pub name: String,
}

/// Row returned by the `get_template_usage_stats` procedure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateStats {
    pub template_id: Uuid,
    pub template_name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub total_uses: i64,
    #[serde(default)]
    pub unique_sessions: i64,
    #[serde(default)]
    pub average_rating: f64,
    /// Fraction in 0..=1
    #[serde(default)]
    pub completion_rate: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub most_used_day: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub most_used_time: String,
    #[serde(default)]
    pub feedback_count: i64,
}

/// Row returned by the `get_template_usage_trends` procedure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateUsageTrend {
    pub date: NaiveDate,
    #[serde(default)]
    pub total_templates_used: i64,
    #[serde(default)]
    pub total_sessions: i64,
    #[serde(default)]
    pub average_rating: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub most_used_template: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub most_used_category: String,
}

/// Row returned by the `get_shared_templates` procedure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharedTemplate {
    pub id: Uuid,
    pub template_id: Uuid,
    pub template_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub shared_by_name: String,
    pub shared_at: DateTime<Utc>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: String,
}

/// A row of the `template_feedback` table, one per (template, user)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateFeedback {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub template_id: Uuid,
    pub user_id: Uuid,
    pub rating: u8,
    #[serde(default, deserialize_with = "null_as_default")]
    pub comment: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Upsert payload for `template_feedback`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateFeedbackInput {
    pub template_id: Uuid,
    pub user_id: Uuid,
    pub rating: u8,
    pub comment: String,
}

/// A row of the `session_notes` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionNote {
    pub id: Uuid,
    pub session_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    /// A user id, or `system` for notes written by the client itself
    #[serde(default, deserialize_with = "null_as_default")]
    pub created_by: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSessionNote {
    pub session_id: Uuid,
    pub content: String,
    pub created_by: String,
}

/// A row of the `session_feedback` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionFeedback {
    pub id: Uuid,
    pub session_id: Uuid,
    pub rating: u8,
    #[serde(default, deserialize_with = "null_as_default")]
    pub comment: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub created_by: Option<Uuid>,
}

/// Upsert payload for `session_feedback`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionFeedbackInput {
    pub session_id: Uuid,
    pub rating: u8,
    pub comment: String,
    pub created_by: Uuid,
}

/// A row of the `session_checklist` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub id: Uuid,
    pub session_id: Uuid,
    pub content: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewChecklistItem {
    pub session_id: Uuid,
    pub content: String,
    pub completed: bool,
}

/// A row of the `session_summaries` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub id: Uuid,
    pub session_id: Uuid,
    #[serde(default, deserialize_with = "null_as_default")]
    pub key_points: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub action_items: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub next_steps: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Upsert payload for `session_summaries`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummaryInput {
    pub session_id: Uuid,
    pub key_points: Vec<String>,
    pub action_items: Vec<String>,
    pub next_steps: Vec<String>,
}

/// Raw textarea contents of the summary form, one entry per line
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SummaryDraft {
    pub key_points: String,
    pub action_items: String,
    pub next_steps: String,
}

impl SummaryDraft {
    /// Split each textarea into lines, dropping empty ones
    pub fn to_input(&self, session_id: Uuid) -> SessionSummaryInput {
        fn lines(text: &str) -> Vec<String> {
            text.split('\n')
                .map(|line| line.trim_end_matches('\r'))
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect()
        }

        SessionSummaryInput {
            session_id,
            key_points: lines(&self.key_points),
            action_items: lines(&self.action_items),
            next_steps: lines(&self.next_steps),
        }
    }
}

/// A row of the `services` table with the owner's name embedded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub mentor_id: Option<Uuid>,
    /// Embedded by `select=*,profiles(full_name)`
    #[serde(default)]
    pub profiles: Option<ProfileName>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Form contents of the service modal
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ServiceDraft {
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewService {
    pub title: String,
    pub description: String,
    pub mentor_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceUpdate {
    pub title: String,
    pub description: String,
    pub updated_at: DateTime<Utc>,
}

/// Lifecycle status of a counselling session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CounsellingStatus {
    #[default]
    Scheduled,
    Completed,
    Cancelled,
}

impl CounsellingStatus {
    pub const ALL: [CounsellingStatus; 3] = [
        CounsellingStatus::Scheduled,
        CounsellingStatus::Completed,
        CounsellingStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CounsellingStatus::Scheduled => "scheduled",
            CounsellingStatus::Completed => "completed",
            CounsellingStatus::Cancelled => "cancelled",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CounsellingStatus::Scheduled => "Scheduled",
            CounsellingStatus::Completed => "Completed",
            CounsellingStatus::Cancelled => "Cancelled",
        }
    }

    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "scheduled" => Ok(CounsellingStatus::Scheduled),
            "completed" => Ok(CounsellingStatus::Completed),
            "cancelled" => Ok(CounsellingStatus::Cancelled),
            _ => Err(format!("Invalid counselling status: {}", s)),
        }
    }
}

/// A row of the `counselling_sessions` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CounsellingSession {
    pub id: Uuid,
    #[serde(default)]
    pub mentor_id: Option<Uuid>,
    #[serde(default)]
    pub student_id: Option<Uuid>,
    pub date_time: DateTime<Utc>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: CounsellingStatus,
    #[serde(default)]
    pub mentor: Option<ProfileName>,
    #[serde(default)]
    pub student: Option<ProfileName>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCounsellingSession {
    pub mentor_id: Uuid,
    pub student_id: Uuid,
    pub date_time: DateTime<Utc>,
    pub notes: String,
    pub status: CounsellingStatus,
}

/// Overview numbers shown at the top of the availability settings page
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DashboardMetrics {
    pub total_sessions: usize,
    pub upcoming_sessions: usize,
    pub completed_sessions: usize,
    /// Mean feedback rating rounded to one decimal
    pub average_rating: f64,
    pub total_templates: usize,
    pub active_templates: usize,
    pub total_mentees: usize,
    /// Percentage in 0..=100
    pub session_completion_rate: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_role_serde_lowercase() {
        assert_eq!(serde_json::to_value(Role::Mentor).unwrap(), json!("mentor"));
        let role: Role = serde_json::from_value(json!("mentee")).unwrap();
        assert_eq!(role, Role::Mentee);
        assert_eq!(Role::from_str("MENTOR").unwrap(), Role::Mentor);
        assert!(Role::from_str("admin").is_err());
    }

    #[test]
    fn test_session_status_serde_and_labels() {
        let status: SessionStatus = serde_json::from_value(json!("rescheduled")).unwrap();
        assert_eq!(status, SessionStatus::Rescheduled);
        assert_eq!(status.label(), "Rescheduled");
        assert_eq!(
            serde_json::to_value(SessionStatus::Cancelled).unwrap(),
            json!("cancelled")
        );
    }

    #[test]
    fn test_profile_decodes_nulls() {
        let profile: Profile = serde_json::from_value(json!({
            "id": "6f1b7c1e-2d7a-4f55-9b59-0f1c1d3b9a10",
            "full_name": null,
            "role": null,
            "email": "ada@example.com",
            "expertise": null
        }))
        .unwrap();

        assert_eq!(profile.role, Role::Mentee);
        assert!(profile.expertise.is_empty());
        assert_eq!(profile.display_name(), "ada@example.com");
    }

    #[test]
    fn test_session_listing_counterpart() {
        let listing: SessionListing = serde_json::from_value(json!({
            "id": "0d4f2a9e-6a55-4d1e-8f0c-5f5e0b7a1c22",
            "title": "Career chat",
            "description": null,
            "date": "2024-03-01T10:00:00+00:00",
            "mentor_id": "6f1b7c1e-2d7a-4f55-9b59-0f1c1d3b9a10",
            "mentee_id": "9a4d2c1b-7e6f-4a3b-8c2d-1e0f9a8b7c6d",
            "status": "upcoming",
            "mentor": { "full_name": "Grace" },
            "mentee": { "full_name": "Alan" }
        }))
        .unwrap();

        assert_eq!(listing.counterpart_name(Role::Mentor), "Alan");
        assert_eq!(listing.counterpart_name(Role::Mentee), "Grace");
        assert_eq!(listing.session.status, SessionStatus::Upcoming);
    }

    #[test]
    fn test_default_week() {
        let week = AvailabilityRule::default_week();
        assert_eq!(week.len(), 7);
        assert!(!week[0].is_available);
        assert!(!week[6].is_available);
        assert!(week[1..6].iter().all(|rule| rule.is_available));
        assert!(week.iter().all(|rule| rule.id.is_none()));
        assert_eq!(week[3].day_name(), "Wednesday");
    }

    #[test]
    fn test_short_time() {
        assert_eq!(AvailabilityRule::short_time("09:00:00"), "09:00");
        assert_eq!(AvailabilityRule::short_time("9:00"), "9:00");
    }

    #[test]
    fn test_summary_draft_drops_empty_lines() {
        let draft = SummaryDraft {
            key_points: "First\n\nSecond\r\n".to_string(),
            action_items: String::new(),
            next_steps: "Follow up".to_string(),
        };
        let input = draft.to_input(Uuid::nil());

        assert_eq!(input.key_points, vec!["First", "Second"]);
        assert!(input.action_items.is_empty());
        assert_eq!(input.next_steps, vec!["Follow up"]);
    }

    #[test]
    fn test_counselling_status_parse() {
        assert_eq!(
            CounsellingStatus::from_str("completed").unwrap(),
            CounsellingStatus::Completed
        );
        assert!(CounsellingStatus::from_str("unknown").is_err());
        assert_eq!(CounsellingStatus::ALL.len(), 3);
    }
}
