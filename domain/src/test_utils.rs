//! In-memory gateway and auth provider for service tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use shared::{AuthUser, OAuthProvider, Role};
use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::GatewayError;
use crate::gateway::{
    AuthProvider, DataGateway, EdgeFunction, Filter, GatewayResult, Procedure, Query,
};

/// A recorded gateway call
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayCall {
    Select(String),
    Insert(String),
    Update(String),
    Upsert(String),
    Delete(String),
    Rpc(Procedure, Value),
    Invoke(EdgeFunction, Value),
}

/// Tables held as JSON rows; filters and ordering are evaluated like the
/// real backend would for the subset of operators the client uses
#[derive(Default)]
pub struct InMemoryGateway {
    tables: RefCell<HashMap<String, Vec<Value>>>,
    rpc_responses: RefCell<HashMap<Procedure, Value>>,
    failing_tables: RefCell<HashMap<String, String>>,
    failing_rpcs: RefCell<HashMap<Procedure, String>>,
    failing_functions: RefCell<HashMap<EdgeFunction, String>>,
    calls: RefCell<Vec<GatewayCall>>,
}

impl InMemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, table: &str, rows: Vec<Value>) {
        self.tables
            .borrow_mut()
            .entry(table.to_string())
            .or_default()
            .extend(rows);
    }

    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.tables.borrow().get(table).cloned().unwrap_or_default()
    }

    pub fn calls(&self) -> Vec<GatewayCall> {
        self.calls.borrow().clone()
    }

    pub fn set_rpc_response(&self, procedure: Procedure, response: Value) {
        self.rpc_responses.borrow_mut().insert(procedure, response);
    }

    pub fn fail_table(&self, table: &str, message: &str) {
        self.failing_tables
            .borrow_mut()
            .insert(table.to_string(), message.to_string());
    }

    pub fn fail_rpc(&self, procedure: Procedure, message: &str) {
        self.failing_rpcs
            .borrow_mut()
            .insert(procedure, message.to_string());
    }

    pub fn fail_function(&self, function: EdgeFunction, message: &str) {
        self.failing_functions
            .borrow_mut()
            .insert(function, message.to_string());
    }

    fn record(&self, call: GatewayCall) {
        self.calls.borrow_mut().push(call);
    }

    fn check_table(&self, table: &str) -> GatewayResult<()> {
        match self.failing_tables.borrow().get(table) {
            Some(message) => Err(GatewayError::backend(message.clone())),
            None => Ok(()),
        }
    }

    fn matching(&self, table: &str, filters: &[Filter]) -> Vec<Value> {
        self.rows(table)
            .into_iter()
            .filter(|row| filters.iter().all(|f| matches_filter(row, f)))
            .collect()
    }
}

fn text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn compare_text(a: &str, b: &str) -> Ordering {
    if let (Ok(a), Ok(b)) = (
        DateTime::parse_from_rfc3339(a),
        DateTime::parse_from_rfc3339(b),
    ) {
        return a.cmp(&b);
    }
    if let (Ok(a), Ok(b)) = (a.parse::<f64>(), b.parse::<f64>()) {
        return a.partial_cmp(&b).unwrap_or(Ordering::Equal);
    }
    a.cmp(b)
}

fn matches_filter(row: &Value, filter: &Filter) -> bool {
    let actual = row.get(filter.column()).and_then(text);
    match (filter, actual) {
        (Filter::Eq(_, v), Some(a)) => compare_text(&a, v) == Ordering::Equal,
        (Filter::Neq(_, v), Some(a)) => compare_text(&a, v) != Ordering::Equal,
        (Filter::Gte(_, v), Some(a)) => compare_text(&a, v) != Ordering::Less,
        (Filter::In(_, values), Some(a)) => values.iter().any(|v| v == &a),
        (_, None) => false,
    }
}

fn merge(target: &mut Value, patch: &Value) {
    if let (Some(target), Some(patch)) = (target.as_object_mut(), patch.as_object()) {
        for (key, value) in patch {
            target.insert(key.clone(), value.clone());
        }
    }
}

fn as_rows(rows: Value) -> Vec<Value> {
    match rows {
        Value::Array(items) => items,
        other => vec![other],
    }
}

fn with_defaults(mut row: Value) -> Value {
    if let Some(object) = row.as_object_mut() {
        object
            .entry("id")
            .or_insert_with(|| Value::String(Uuid::new_v4().to_string()));
        object
            .entry("created_at")
            .or_insert_with(|| Value::String(Utc::now().to_rfc3339()));
    }
    row
}

#[async_trait(?Send)]
impl DataGateway for InMemoryGateway {
    async fn select(&self, query: &Query) -> GatewayResult<Vec<Value>> {
        self.record(GatewayCall::Select(query.table.clone()));
        self.check_table(&query.table)?;

        let mut rows = self.matching(&query.table, &query.filters);
        rows.sort_by(|a, b| {
            for order in &query.order {
                let left = a.get(&order.column).and_then(text);
                let right = b.get(&order.column).and_then(text);
                let ordering = match (left, right) {
                    (Some(l), Some(r)) => compare_text(&l, &r),
                    (Some(_), None) => Ordering::Less,
                    (None, Some(_)) => Ordering::Greater,
                    (None, None) => Ordering::Equal,
                };
                let ordering = if order.ascending { ordering } else { ordering.reverse() };
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            Ordering::Equal
        });
        Ok(rows)
    }

    async fn select_single(&self, query: &Query) -> GatewayResult<Value> {
        let mut rows = self.select(query).await?;
        match rows.len() {
            0 => Err(GatewayError::NoRows),
            1 => Ok(rows.swap_remove(0)),
            n => Err(GatewayError::Backend {
                code: Some("PGRST116".to_string()),
                message: format!("JSON object requested, multiple ({}) rows returned", n),
            }),
        }
    }

    async fn insert(&self, table: &str, rows: Value) -> GatewayResult<Vec<Value>> {
        self.record(GatewayCall::Insert(table.to_string()));
        self.check_table(table)?;

        let inserted: Vec<Value> = as_rows(rows).into_iter().map(with_defaults).collect();
        self.seed(table, inserted.clone());
        Ok(inserted)
    }

    async fn update(&self, table: &str, patch: Value, filters: &[Filter]) -> GatewayResult<Vec<Value>> {
        self.record(GatewayCall::Update(table.to_string()));
        self.check_table(table)?;

        let mut tables = self.tables.borrow_mut();
        let mut updated = Vec::new();
        if let Some(rows) = tables.get_mut(table) {
            for row in rows.iter_mut() {
                if filters.iter().all(|f| matches_filter(row, f)) {
                    merge(row, &patch);
                    updated.push(row.clone());
                }
            }
        }
        Ok(updated)
    }

    async fn upsert(&self, table: &str, rows: Value, on_conflict: Option<&str>) -> GatewayResult<Vec<Value>> {
        self.record(GatewayCall::Upsert(table.to_string()));
        self.check_table(table)?;

        let keys: Vec<&str> = on_conflict.unwrap_or("id").split(',').collect();
        let mut tables = self.tables.borrow_mut();
        let existing = tables.entry(table.to_string()).or_default();
        let mut stored = Vec::new();

        for row in as_rows(rows) {
            let same_key = |candidate: &Value| {
                keys.iter().all(|key| {
                    let wanted = row.get(*key).and_then(text);
                    wanted.is_some() && candidate.get(*key).and_then(text) == wanted
                })
            };
            match existing.iter_mut().find(|candidate| same_key(&**candidate)) {
                Some(current) => {
                    merge(current, &row);
                    stored.push(current.clone());
                }
                None => {
                    let row = with_defaults(row);
                    existing.push(row.clone());
                    stored.push(row);
                }
            }
        }
        Ok(stored)
    }

    async fn delete(&self, table: &str, filters: &[Filter]) -> GatewayResult<()> {
        self.record(GatewayCall::Delete(table.to_string()));
        self.check_table(table)?;

        if let Some(rows) = self.tables.borrow_mut().get_mut(table) {
            rows.retain(|row| !filters.iter().all(|f| matches_filter(row, f)));
        }
        Ok(())
    }

    async fn rpc(&self, procedure: Procedure, params: Value) -> GatewayResult<Value> {
        self.record(GatewayCall::Rpc(procedure, params));
        if let Some(message) = self.failing_rpcs.borrow().get(&procedure) {
            return Err(GatewayError::backend(message.clone()));
        }
        Ok(self
            .rpc_responses
            .borrow()
            .get(&procedure)
            .cloned()
            .unwrap_or(Value::Null))
    }

    async fn invoke(&self, function: EdgeFunction, body: Value) -> GatewayResult<Value> {
        self.record(GatewayCall::Invoke(function, body));
        if let Some(message) = self.failing_functions.borrow().get(&function) {
            return Err(GatewayError::backend(message.clone()));
        }
        Ok(Value::Object(Map::new()))
    }
}

/// Auth provider backed by a map of registered accounts
#[derive(Default)]
pub struct InMemoryAuth {
    accounts: RefCell<HashMap<String, (String, AuthUser)>>,
    current: RefCell<Option<AuthUser>>,
}

impl InMemoryAuth {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signed_in_as(user: AuthUser) -> Self {
        let auth = Self::default();
        *auth.current.borrow_mut() = Some(user);
        auth
    }
}

#[async_trait(?Send)]
impl AuthProvider for InMemoryAuth {
    async fn current_user(&self) -> GatewayResult<Option<AuthUser>> {
        Ok(self.current.borrow().clone())
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> GatewayResult<AuthUser> {
        let accounts = self.accounts.borrow();
        match accounts.get(email) {
            Some((stored, user)) if stored == password => {
                *self.current.borrow_mut() = Some(user.clone());
                Ok(user.clone())
            }
            _ => Err(GatewayError::Backend {
                code: Some("invalid_grant".to_string()),
                message: "Invalid login credentials".to_string(),
            }),
        }
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        _full_name: &str,
        _role: Role,
    ) -> GatewayResult<AuthUser> {
        let mut accounts = self.accounts.borrow_mut();
        if accounts.contains_key(email) {
            return Err(GatewayError::backend("User already registered"));
        }
        let user = AuthUser {
            id: Uuid::new_v4(),
            email: Some(email.to_string()),
        };
        accounts.insert(email.to_string(), (password.to_string(), user.clone()));
        Ok(user)
    }

    fn oauth_authorize_url(&self, provider: OAuthProvider, redirect_to: &str) -> String {
        format!(
            "memory://authorize?provider={}&redirect_to={}",
            provider.as_str(),
            redirect_to
        )
    }

    async fn sign_out(&self) -> GatewayResult<()> {
        *self.current.borrow_mut() = None;
        Ok(())
    }
}
