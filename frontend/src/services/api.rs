//! Supabase client implementing the data gateway (PostgREST, RPC and edge
//! functions) and the auth provider (GoTrue).

use async_trait::async_trait;
use chrono::Utc;
use gloo::net::http::{Request, RequestBuilder};
use gloo::storage::{LocalStorage, Storage};
use log::{debug, warn};
use mentor_match_domain::config::ClientConfig;
use mentor_match_domain::error::GatewayError;
use mentor_match_domain::gateway::{
    AuthProvider, DataGateway, EdgeFunction, Filter, GatewayResult, Procedure, Query,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use shared::{AuthUser, OAuthProvider, Role};
use std::cell::RefCell;
use std::collections::HashMap;

const SESSION_STORAGE_KEY: &str = "mentor-match.auth";
const OBJECT_MEDIA_TYPE: &str = "application/vnd.pgrst.object+json";
const NO_ROWS_CODE: &str = "PGRST116";
/// Refresh this many seconds before the access token runs out
const EXPIRY_MARGIN_SECS: i64 = 30;

/// Tokens of a signed-in user, persisted in local storage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredSession {
    pub access_token: String,
    pub refresh_token: String,
    /// Unix seconds
    pub expires_at: i64,
    pub user: AuthUser,
}

impl StoredSession {
    fn is_expired(&self, now: i64) -> bool {
        now + EXPIRY_MARGIN_SECS >= self.expires_at
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    expires_in: i64,
    user: AuthUser,
}

impl TokenResponse {
    fn into_session(self, now: i64) -> StoredSession {
        StoredSession {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at: now + self.expires_in,
            user: self.user,
        }
    }
}

/// Error body of either PostgREST or GoTrue
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<Value>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    details: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Map a failed response onto a gateway error
pub fn parse_error(status: u16, body: &str) -> GatewayError {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    let code = parsed.code.map(|code| match code {
        Value::String(s) => s,
        other => other.to_string(),
    });

    if code.as_deref() == Some(NO_ROWS_CODE)
        && parsed
            .details
            .as_deref()
            .map_or(true, |details| details.contains("0 rows"))
    {
        return GatewayError::NoRows;
    }

    let message = parsed
        .message
        .or(parsed.msg)
        .or(parsed.error_description)
        .or(parsed.error)
        .unwrap_or_else(|| format!("Request failed with status {}", status));
    GatewayError::Backend { code, message }
}

/// Rows of a PostgREST response; an empty body means no rows
pub fn parse_rows(body: &str) -> GatewayResult<Vec<Value>> {
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }
    match serde_json::from_str(body)? {
        Value::Array(rows) => Ok(rows),
        Value::Null => Ok(Vec::new()),
        row => Ok(vec![row]),
    }
}

/// `a=1&b=2` with every key and value passed through `encode`
pub fn query_string<F>(params: &[(String, String)], encode: F) -> String
where
    F: Fn(&str) -> String,
{
    params
        .iter()
        .map(|(key, value)| format!("{}={}", encode(key), encode(value)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Key/value pairs of a URL fragment such as `access_token=..&expires_in=3600`
pub fn parse_fragment<F>(fragment: &str, decode: F) -> HashMap<String, String>
where
    F: Fn(&str) -> String,
{
    fragment
        .trim_start_matches('#')
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .map(|(key, value)| (decode(key), decode(&value.replace('+', " "))))
        .collect()
}

fn encode_component(value: &str) -> String {
    js_sys::encode_uri_component(value).into()
}

fn decode_component(value: &str) -> String {
    js_sys::decode_uri_component(value)
        .map(String::from)
        .unwrap_or_else(|_| value.to_string())
}

fn network(err: gloo::net::Error) -> GatewayError {
    GatewayError::Network(err.to_string())
}

fn now_secs() -> i64 {
    Utc::now().timestamp()
}

/// Client for the hosted backend; one instance per application, shared via `Rc`
pub struct SupabaseClient {
    config: ClientConfig,
    session: RefCell<Option<StoredSession>>,
}

impl PartialEq for SupabaseClient {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other)
    }
}

impl SupabaseClient {
    /// Create a client, restoring a previously stored session
    pub fn new(config: ClientConfig) -> Self {
        let session = LocalStorage::get::<StoredSession>(SESSION_STORAGE_KEY).ok();
        Self {
            config,
            session: RefCell::new(session),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn store_session(&self, session: Option<StoredSession>) {
        match &session {
            Some(stored) => {
                if let Err(err) = LocalStorage::set(SESSION_STORAGE_KEY, stored) {
                    warn!("🔐 AUTH: Could not persist session: {}", err);
                }
            }
            None => LocalStorage::delete(SESSION_STORAGE_KEY),
        }
        *self.session.borrow_mut() = session;
    }

    fn url(&self, path: &str, params: &[(String, String)]) -> String {
        if params.is_empty() {
            format!("{}{}", self.config.supabase_url, path)
        } else {
            format!(
                "{}{}?{}",
                self.config.supabase_url,
                path,
                query_string(params, encode_component)
            )
        }
    }

    fn rest_url(&self, table: &str, params: &[(String, String)]) -> String {
        self.url(&format!("/rest/v1/{}", table), params)
    }

    fn filter_params(filters: &[Filter]) -> Vec<(String, String)> {
        filters.iter().map(Filter::to_param).collect()
    }

    /// Bearer token of the signed-in user, refreshed when close to expiry;
    /// the anonymous key otherwise
    async fn bearer(&self) -> String {
        let current = self.session.borrow().clone();
        match current {
            Some(session) if !session.is_expired(now_secs()) => session.access_token,
            Some(session) => match self.refresh(&session.refresh_token).await {
                Ok(refreshed) => refreshed.access_token,
                Err(err) => {
                    warn!("🔐 AUTH: Session refresh failed: {}", err);
                    self.store_session(None);
                    self.config.anon_key.clone()
                }
            },
            None => self.config.anon_key.clone(),
        }
    }

    async fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        let token = self.bearer().await;
        builder
            .header("apikey", &self.config.anon_key)
            .header("Authorization", &format!("Bearer {}", token))
    }

    async fn send(&self, builder: RequestBuilder, body: Option<&Value>) -> GatewayResult<String> {
        let request = match body {
            Some(body) => builder.json(body),
            None => builder.build(),
        }
        .map_err(network)?;

        let response = request.send().await.map_err(network)?;
        let ok = response.ok();
        let status = response.status();
        let text = response.text().await.map_err(network)?;
        if ok {
            Ok(text)
        } else {
            Err(parse_error(status, &text))
        }
    }

    async fn refresh(&self, refresh_token: &str) -> GatewayResult<StoredSession> {
        let url = self.url(
            "/auth/v1/token",
            &[("grant_type".to_string(), "refresh_token".to_string())],
        );
        let builder = Request::post(&url).header("apikey", &self.config.anon_key);
        let body = json!({ "refresh_token": refresh_token });
        let text = self.send(builder, Some(&body)).await?;
        let session = serde_json::from_str::<TokenResponse>(&text)?.into_session(now_secs());
        self.store_session(Some(session.clone()));
        debug!("🔐 AUTH: Refreshed session for {}", session.user.id);
        Ok(session)
    }

    /// Finish an OAuth sign-in from the redirect's URL fragment
    pub async fn complete_oauth(&self, fragment: &str) -> GatewayResult<AuthUser> {
        let params = parse_fragment(fragment, decode_component);
        if let Some(description) = params.get("error_description") {
            return Err(GatewayError::backend(description.clone()));
        }
        let access_token = params
            .get("access_token")
            .cloned()
            .ok_or(GatewayError::NotAuthenticated)?;
        let expires_in = params
            .get("expires_in")
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(3600);

        let builder = Request::get(&self.url("/auth/v1/user", &[]))
            .header("apikey", &self.config.anon_key)
            .header("Authorization", &format!("Bearer {}", access_token));
        let text = self.send(builder, None).await?;
        let user: AuthUser = serde_json::from_str(&text)?;

        self.store_session(Some(StoredSession {
            access_token,
            refresh_token: params.get("refresh_token").cloned().unwrap_or_default(),
            expires_at: now_secs() + expires_in,
            user: user.clone(),
        }));
        Ok(user)
    }
}

#[async_trait(?Send)]
impl DataGateway for SupabaseClient {
    async fn select(&self, query: &Query) -> GatewayResult<Vec<Value>> {
        debug!("🌐 GATEWAY: select {} {:?}", query.table, query.to_params());
        let builder = self
            .authorized(Request::get(&self.rest_url(&query.table, &query.to_params())))
            .await;
        parse_rows(&self.send(builder, None).await?)
    }

    async fn select_single(&self, query: &Query) -> GatewayResult<Value> {
        let builder = self
            .authorized(Request::get(&self.rest_url(&query.table, &query.to_params())))
            .await
            .header("Accept", OBJECT_MEDIA_TYPE);
        let text = self.send(builder, None).await?;
        Ok(serde_json::from_str(&text)?)
    }

    async fn insert(&self, table: &str, rows: Value) -> GatewayResult<Vec<Value>> {
        let builder = self
            .authorized(Request::post(&self.rest_url(table, &[])))
            .await
            .header("Prefer", "return=representation");
        parse_rows(&self.send(builder, Some(&rows)).await?)
    }

    async fn update(&self, table: &str, patch: Value, filters: &[Filter]) -> GatewayResult<Vec<Value>> {
        let builder = self
            .authorized(Request::patch(&self.rest_url(table, &Self::filter_params(filters))))
            .await
            .header("Prefer", "return=representation");
        parse_rows(&self.send(builder, Some(&patch)).await?)
    }

    async fn upsert(&self, table: &str, rows: Value, on_conflict: Option<&str>) -> GatewayResult<Vec<Value>> {
        let params: Vec<(String, String)> = on_conflict
            .map(|columns| vec![("on_conflict".to_string(), columns.to_string())])
            .unwrap_or_default();
        let builder = self
            .authorized(Request::post(&self.rest_url(table, &params)))
            .await
            .header("Prefer", "resolution=merge-duplicates,return=representation");
        parse_rows(&self.send(builder, Some(&rows)).await?)
    }

    async fn delete(&self, table: &str, filters: &[Filter]) -> GatewayResult<()> {
        let builder = self
            .authorized(Request::delete(&self.rest_url(table, &Self::filter_params(filters))))
            .await;
        self.send(builder, None).await?;
        Ok(())
    }

    async fn rpc(&self, procedure: Procedure, params: Value) -> GatewayResult<Value> {
        debug!("🌐 GATEWAY: rpc {}", procedure.name());
        let url = self.url(&format!("/rest/v1/rpc/{}", procedure.name()), &[]);
        let builder = self.authorized(Request::post(&url)).await;
        let text = self.send(builder, Some(&params)).await?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }

    async fn invoke(&self, function: EdgeFunction, body: Value) -> GatewayResult<Value> {
        let url = self.url(&format!("/functions/v1/{}", function.name()), &[]);
        let builder = self.authorized(Request::post(&url)).await;
        let text = self.send(builder, Some(&body)).await?;
        Ok(serde_json::from_str(&text).unwrap_or_else(|_| json!({})))
    }
}

#[async_trait(?Send)]
impl AuthProvider for SupabaseClient {
    async fn current_user(&self) -> GatewayResult<Option<AuthUser>> {
        let current = self.session.borrow().clone();
        match current {
            Some(session) if session.is_expired(now_secs()) => {
                match self.refresh(&session.refresh_token).await {
                    Ok(refreshed) => Ok(Some(refreshed.user)),
                    Err(err) => {
                        warn!("🔐 AUTH: Stored session is no longer valid: {}", err);
                        self.store_session(None);
                        Ok(None)
                    }
                }
            }
            Some(session) => Ok(Some(session.user)),
            None => Ok(None),
        }
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> GatewayResult<AuthUser> {
        let url = self.url(
            "/auth/v1/token",
            &[("grant_type".to_string(), "password".to_string())],
        );
        let builder = Request::post(&url).header("apikey", &self.config.anon_key);
        let body = json!({ "email": email, "password": password });
        let text = self.send(builder, Some(&body)).await?;
        let session = serde_json::from_str::<TokenResponse>(&text)?.into_session(now_secs());
        let user = session.user.clone();
        self.store_session(Some(session));
        Ok(user)
    }

    async fn sign_up(&self, email: &str, password: &str, full_name: &str, role: Role) -> GatewayResult<AuthUser> {
        let builder = Request::post(&self.url("/auth/v1/signup", &[]))
            .header("apikey", &self.config.anon_key);
        let body = json!({
            "email": email,
            "password": password,
            "data": { "full_name": full_name, "role": role },
        });
        let text = self.send(builder, Some(&body)).await?;

        // A session comes back only when e-mail confirmation is disabled
        if let Ok(tokens) = serde_json::from_str::<TokenResponse>(&text) {
            let session = tokens.into_session(now_secs());
            let user = session.user.clone();
            self.store_session(Some(session));
            return Ok(user);
        }
        Ok(serde_json::from_str(&text)?)
    }

    fn oauth_authorize_url(&self, provider: OAuthProvider, redirect_to: &str) -> String {
        self.url(
            "/auth/v1/authorize",
            &[
                ("provider".to_string(), provider.as_str().to_string()),
                ("redirect_to".to_string(), redirect_to.to_string()),
            ],
        )
    }

    async fn sign_out(&self) -> GatewayResult<()> {
        let current = self.session.borrow().clone();
        self.store_session(None);
        if let Some(session) = current {
            let builder = Request::post(&self.url("/auth/v1/logout", &[]))
                .header("apikey", &self.config.anon_key)
                .header("Authorization", &format!("Bearer {}", session.access_token));
            self.send(builder, None).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_rows_error_is_recognised() {
        let body = r#"{"code":"PGRST116","details":"The result contains 0 rows","hint":null,"message":"JSON object requested, multiple (or no) rows returned"}"#;
        assert_eq!(parse_error(406, body), GatewayError::NoRows);

        let many = r#"{"code":"PGRST116","details":"The result contains 2 rows","message":"JSON object requested, multiple (or no) rows returned"}"#;
        assert!(matches!(parse_error(406, many), GatewayError::Backend { .. }));
    }

    #[test]
    fn test_backend_messages() {
        let postgrest = r#"{"code":"23505","message":"duplicate key value violates unique constraint"}"#;
        assert_eq!(
            parse_error(409, postgrest),
            GatewayError::Backend {
                code: Some("23505".to_string()),
                message: "duplicate key value violates unique constraint".to_string(),
            }
        );

        let gotrue = r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#;
        assert_eq!(
            parse_error(400, gotrue).to_string(),
            "Invalid login credentials"
        );

        let numeric_code = r#"{"code":422,"msg":"Password should be at least 6 characters"}"#;
        assert_eq!(
            parse_error(422, numeric_code),
            GatewayError::Backend {
                code: Some("422".to_string()),
                message: "Password should be at least 6 characters".to_string(),
            }
        );

        assert_eq!(
            parse_error(502, "<html>bad gateway</html>").to_string(),
            "Request failed with status 502"
        );
    }

    #[test]
    fn test_parse_rows() {
        assert!(parse_rows("").unwrap().is_empty());
        assert_eq!(parse_rows(r#"[{"a":1},{"a":2}]"#).unwrap().len(), 2);
        assert_eq!(parse_rows(r#"{"a":1}"#).unwrap(), vec![json!({"a": 1})]);
        assert!(matches!(parse_rows("not json"), Err(GatewayError::Decode(_))));
    }

    #[test]
    fn test_query_string_and_fragment() {
        let params = vec![
            ("select".to_string(), "*".to_string()),
            ("mentor_id".to_string(), "eq.42".to_string()),
        ];
        assert_eq!(
            query_string(&params, |v| v.to_string()),
            "select=*&mentor_id=eq.42"
        );

        let fragment = parse_fragment(
            "#access_token=abc&expires_in=3600&token_type=bearer",
            |v| v.to_string(),
        );
        assert_eq!(fragment.get("access_token").map(String::as_str), Some("abc"));
        assert_eq!(fragment.get("expires_in").map(String::as_str), Some("3600"));
    }

    #[test]
    fn test_session_expiry_margin() {
        let session = StoredSession {
            access_token: "a".to_string(),
            refresh_token: "r".to_string(),
            expires_at: 1_000,
            user: AuthUser {
                id: uuid::Uuid::new_v4(),
                email: None,
            },
        };
        assert!(!session.is_expired(900));
        assert!(session.is_expired(980));
    }
}
