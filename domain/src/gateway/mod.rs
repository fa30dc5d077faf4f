//! # Data Gateway
//!
//! Abstraction over the hosted backend. Services only talk to these traits,
//! so the browser client (PostgREST/GoTrue over HTTP) and the in-memory test
//! gateway are interchangeable.
//!
//! Rows travel as `serde_json::Value` through the traits and are decoded into
//! `shared` records by the typed helpers below.

pub mod query;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use shared::{AuthUser, OAuthProvider, Role};

use crate::error::GatewayError;
pub use query::{Filter, Order, Query};

pub type GatewayResult<T> = Result<T, GatewayError>;

/// Table names used by the client
pub mod tables {
    pub const PROFILES: &str = "profiles";
    pub const SESSIONS: &str = "sessions";
    pub const SERVICES: &str = "services";
    pub const COUNSELLING_SESSIONS: &str = "counselling_sessions";
    pub const MENTOR_AVAILABILITY: &str = "mentor_availability";
    pub const CHECKLIST_TEMPLATES: &str = "checklist_templates";
    pub const TEMPLATE_VERSIONS: &str = "template_versions";
    pub const TEMPLATE_CATEGORIES: &str = "template_categories";
    pub const TEMPLATE_FEEDBACK: &str = "template_feedback";
    pub const SESSION_NOTES: &str = "session_notes";
    pub const SESSION_FEEDBACK: &str = "session_feedback";
    pub const SESSION_CHECKLIST: &str = "session_checklist";
    pub const SESSION_SUMMARIES: &str = "session_summaries";
}

/// Remote procedures exposed by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Procedure {
    CheckTimeSlotAvailability,
    GetTemplateUsageStats,
    GetTemplateUsageTrends,
    GetSharedTemplates,
    ShareTemplate,
    AcceptSharedTemplate,
}

impl Procedure {
    pub fn name(&self) -> &'static str {
        match self {
            Procedure::CheckTimeSlotAvailability => "check_time_slot_availability",
            Procedure::GetTemplateUsageStats => "get_template_usage_stats",
            Procedure::GetTemplateUsageTrends => "get_template_usage_trends",
            Procedure::GetSharedTemplates => "get_shared_templates",
            Procedure::ShareTemplate => "share_template",
            Procedure::AcceptSharedTemplate => "accept_shared_template",
        }
    }
}

/// Edge functions (e-mail senders)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeFunction {
    SendRescheduleEmail,
    SendSummaryEmail,
}

impl EdgeFunction {
    pub fn name(&self) -> &'static str {
        match self {
            EdgeFunction::SendRescheduleEmail => "send-reschedule-email",
            EdgeFunction::SendSummaryEmail => "send-summary-email",
        }
    }
}

/// Row-level access to the relational backend
///
/// The browser runs everything on one thread, so implementations need not be
/// `Send`; handles are shared through `Rc`.
#[async_trait(?Send)]
pub trait DataGateway {
    /// Select all rows matching the query
    async fn select(&self, query: &Query) -> GatewayResult<Vec<Value>>;

    /// Select exactly one row; `GatewayError::NoRows` when nothing matches
    async fn select_single(&self, query: &Query) -> GatewayResult<Value>;

    /// Insert one row (object) or many (array), returning the stored rows
    async fn insert(&self, table: &str, rows: Value) -> GatewayResult<Vec<Value>>;

    /// Patch every row matching `filters`, returning the updated rows
    async fn update(&self, table: &str, patch: Value, filters: &[Filter]) -> GatewayResult<Vec<Value>>;

    /// Insert or merge on the `on_conflict` columns (primary key when `None`)
    async fn upsert(&self, table: &str, rows: Value, on_conflict: Option<&str>) -> GatewayResult<Vec<Value>>;

    /// Delete every row matching `filters`
    async fn delete(&self, table: &str, filters: &[Filter]) -> GatewayResult<()>;

    /// Call a remote procedure with named parameters
    async fn rpc(&self, procedure: Procedure, params: Value) -> GatewayResult<Value>;

    /// Invoke an edge function with a JSON body
    async fn invoke(&self, function: EdgeFunction, body: Value) -> GatewayResult<Value>;
}

/// Hosted authentication provider
#[async_trait(?Send)]
pub trait AuthProvider {
    /// User of the stored session, `None` when signed out
    async fn current_user(&self) -> GatewayResult<Option<AuthUser>>;

    async fn sign_in_with_password(&self, email: &str, password: &str) -> GatewayResult<AuthUser>;

    /// Register a new account; name and role are stored as user metadata
    async fn sign_up(&self, email: &str, password: &str, full_name: &str, role: Role) -> GatewayResult<AuthUser>;

    /// URL to navigate to for an OAuth sign-in that returns to `redirect_to`
    fn oauth_authorize_url(&self, provider: OAuthProvider, redirect_to: &str) -> String;

    async fn sign_out(&self) -> GatewayResult<()>;
}

pub fn decode_row<T: DeserializeOwned>(row: Value) -> GatewayResult<T> {
    serde_json::from_value(row).map_err(GatewayError::from)
}

pub fn decode_rows<T: DeserializeOwned>(rows: Vec<Value>) -> GatewayResult<Vec<T>> {
    rows.into_iter().map(decode_row).collect()
}

pub fn to_row<T: Serialize>(record: &T) -> GatewayResult<Value> {
    serde_json::to_value(record).map_err(GatewayError::from)
}

pub async fn fetch_all<T, G>(gateway: &G, query: &Query) -> GatewayResult<Vec<T>>
where
    T: DeserializeOwned,
    G: DataGateway + ?Sized,
{
    decode_rows(gateway.select(query).await?)
}

pub async fn fetch_one<T, G>(gateway: &G, query: &Query) -> GatewayResult<T>
where
    T: DeserializeOwned,
    G: DataGateway + ?Sized,
{
    decode_row(gateway.select_single(query).await?)
}

/// Single-row read where "no rows" is an expected empty state
pub async fn fetch_optional<T, G>(gateway: &G, query: &Query) -> GatewayResult<Option<T>>
where
    T: DeserializeOwned,
    G: DataGateway + ?Sized,
{
    match gateway.select_single(query).await {
        Ok(row) => decode_row(row).map(Some),
        Err(GatewayError::NoRows) => Ok(None),
        Err(err) => Err(err),
    }
}

/// Insert one record and decode the stored row
pub async fn insert_one<T, R, G>(gateway: &G, table: &str, record: &T) -> GatewayResult<R>
where
    T: Serialize,
    R: DeserializeOwned,
    G: DataGateway + ?Sized,
{
    let mut rows = gateway.insert(table, to_row(record)?).await?;
    if rows.is_empty() {
        return Err(GatewayError::NoRows);
    }
    decode_row(rows.swap_remove(0))
}

/// Call a procedure and decode its result
pub async fn call<T, G>(gateway: &G, procedure: Procedure, params: Value) -> GatewayResult<T>
where
    T: DeserializeOwned,
    G: DataGateway + ?Sized,
{
    decode_row(gateway.rpc(procedure, params).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::InMemoryGateway;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Row {
        id: String,
        score: i64,
    }

    #[tokio::test]
    async fn test_fetch_optional_maps_no_rows_to_none() {
        let gateway = InMemoryGateway::new();
        let query = Query::from("scores").eq("id", "missing");
        let row: Option<Row> = fetch_optional(&gateway, &query).await.unwrap();
        assert!(row.is_none());
    }

    #[tokio::test]
    async fn test_fetch_optional_propagates_other_errors() {
        let gateway = InMemoryGateway::new();
        gateway.fail_table("scores", "permission denied");
        let query = Query::from("scores").eq("id", "a");
        let result: GatewayResult<Option<Row>> = fetch_optional(&gateway, &query).await;
        assert_eq!(result, Err(GatewayError::backend("permission denied")));
    }

    #[tokio::test]
    async fn test_fetch_all_decode_error() {
        let gateway = InMemoryGateway::new();
        gateway.seed("scores", vec![json!({"id": "a", "score": "high"})]);
        let result: GatewayResult<Vec<Row>> = fetch_all(&gateway, &Query::from("scores")).await;
        assert!(matches!(result, Err(GatewayError::Decode(_))));
    }

    #[tokio::test]
    async fn test_call_decodes_procedure_result() {
        let gateway = InMemoryGateway::new();
        gateway.set_rpc_response(Procedure::CheckTimeSlotAvailability, json!(true));
        let available: bool = call(&gateway, Procedure::CheckTimeSlotAvailability, json!({}))
            .await
            .unwrap();
        assert!(available);
    }

    #[test]
    fn test_procedure_and_function_names() {
        assert_eq!(Procedure::ShareTemplate.name(), "share_template");
        assert_eq!(EdgeFunction::SendSummaryEmail.name(), "send-summary-email");
    }
}
