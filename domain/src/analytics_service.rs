//! Template usage analytics and the mentor dashboard metrics.

use chrono::{DateTime, Duration, Utc};
use log::{debug, info};
use serde::Deserialize;
use serde_json::json;
use shared::{DashboardMetrics, SessionStatus, TemplateStats, TemplateUsageTrend};
use std::collections::HashSet;
use std::rc::Rc;
use uuid::Uuid;

use crate::booking_service::iso_timestamp;
use crate::error::ServiceResult;
use crate::gateway::{call, fetch_all, tables, DataGateway, Filter, Procedure, Query};

/// Reporting window of the analytics panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    /// The `days` days up to `now`
    pub fn last_days(days: i64, now: DateTime<Utc>) -> Self {
        Self {
            start: now - Duration::days(days),
            end: now,
        }
    }

    /// Whole days covered, rounded up
    pub fn days(&self) -> i64 {
        let millis = (self.end - self.start).num_milliseconds();
        let day = Duration::days(1).num_milliseconds();
        if millis <= 0 {
            0
        } else {
            (millis + day - 1) / day
        }
    }
}

#[derive(Debug, Deserialize)]
struct MetricSession {
    id: Uuid,
    date: DateTime<Utc>,
    #[serde(default)]
    status: Option<SessionStatus>,
    mentee_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
struct MetricRating {
    rating: f64,
}

#[derive(Debug, Deserialize)]
struct MetricTemplate {
    #[serde(default)]
    items: Option<Vec<String>>,
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Derive the overview numbers; empty inputs divide by 1
fn compute_metrics(
    sessions: &[MetricSession],
    ratings: &[MetricRating],
    templates: &[MetricTemplate],
    now: DateTime<Utc>,
) -> DashboardMetrics {
    let total = sessions.len();
    let upcoming = sessions.iter().filter(|s| s.date > now).count();
    let completed = sessions
        .iter()
        .filter(|s| s.status == Some(SessionStatus::Completed))
        .count();
    let rating_sum: f64 = ratings.iter().map(|r| r.rating).sum();
    let mentees: HashSet<Uuid> = sessions.iter().filter_map(|s| s.mentee_id).collect();
    let active_templates = templates
        .iter()
        .filter(|t| t.items.as_ref().map_or(false, |items| !items.is_empty()))
        .count();

    DashboardMetrics {
        total_sessions: total,
        upcoming_sessions: upcoming,
        completed_sessions: completed,
        average_rating: round_one_decimal(rating_sum / ratings.len().max(1) as f64),
        total_templates: templates.len(),
        active_templates,
        total_mentees: mentees.len(),
        session_completion_rate: completed as f64 / total.max(1) as f64 * 100.0,
    }
}

pub struct AnalyticsService<G: DataGateway + ?Sized> {
    gateway: Rc<G>,
}

impl<G: DataGateway + ?Sized> AnalyticsService<G> {
    pub fn new(gateway: Rc<G>) -> Self {
        Self { gateway }
    }

    pub async fn usage_stats(&self, range: &DateRange) -> ServiceResult<Vec<TemplateStats>> {
        let params = json!({
            "p_start_date": iso_timestamp(&range.start),
            "p_end_date": iso_timestamp(&range.end),
        });
        let stats: Option<Vec<TemplateStats>> =
            call(self.gateway.as_ref(), Procedure::GetTemplateUsageStats, params).await?;
        let stats = stats.unwrap_or_default();
        debug!("📊 ANALYTICS: {} template stats rows", stats.len());
        Ok(stats)
    }

    pub async fn usage_trends(&self, range: &DateRange) -> ServiceResult<Vec<TemplateUsageTrend>> {
        let params = json!({ "p_days": range.days() });
        let trends: Option<Vec<TemplateUsageTrend>> =
            call(self.gateway.as_ref(), Procedure::GetTemplateUsageTrends, params).await?;
        let trends = trends.unwrap_or_default();
        debug!("📊 ANALYTICS: {} trend rows", trends.len());
        Ok(trends)
    }

    /// Overview numbers for the mentor's dashboard panel
    pub async fn dashboard_metrics(
        &self,
        mentor_id: Uuid,
        now: DateTime<Utc>,
    ) -> ServiceResult<DashboardMetrics> {
        let gateway = self.gateway.as_ref();

        let sessions_query = Query::from(tables::SESSIONS)
            .select("id, status, date, mentee_id")
            .eq("mentor_id", mentor_id);
        let sessions: Vec<MetricSession> = fetch_all(gateway, &sessions_query).await?;
        let session_ids: Vec<Uuid> = sessions.iter().map(|s| s.id).collect();

        let ratings: Vec<MetricRating> = if session_ids.is_empty() {
            Vec::new()
        } else {
            let query = Query::from(tables::SESSION_FEEDBACK)
                .select("rating")
                .filter(Filter::in_list("session_id", &session_ids));
            fetch_all(gateway, &query).await?
        };

        let templates_query = Query::from(tables::CHECKLIST_TEMPLATES)
            .select("id, items")
            .eq("mentor_id", mentor_id);
        let templates: Vec<MetricTemplate> = fetch_all(gateway, &templates_query).await?;

        let metrics = compute_metrics(&sessions, &ratings, &templates, now);
        info!(
            "📊 ANALYTICS: Metrics for {}: {} sessions, {} mentees",
            mentor_id, metrics.total_sessions, metrics.total_mentees
        );
        Ok(metrics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{GatewayCall, InMemoryGateway};

    fn at(rfc3339: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(rfc3339).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_range_days_rounds_up() {
        let now = at("2024-03-10T12:00:00Z");
        assert_eq!(DateRange::last_days(30, now).days(), 30);

        let range = DateRange {
            start: at("2024-03-01T00:00:00Z"),
            end: at("2024-03-03T01:00:00Z"),
        };
        assert_eq!(range.days(), 3);
    }

    #[test]
    fn test_metrics_with_no_rows() {
        let metrics = compute_metrics(&[], &[], &[], at("2024-03-10T12:00:00Z"));
        assert_eq!(metrics, DashboardMetrics::default());
    }

    #[tokio::test]
    async fn test_dashboard_metrics() {
        let mentor = Uuid::new_v4();
        let mentee_a = Uuid::new_v4();
        let mentee_b = Uuid::new_v4();
        let past = Uuid::new_v4();
        let future = Uuid::new_v4();
        let gateway = Rc::new(InMemoryGateway::new());
        gateway.seed(
            tables::SESSIONS,
            vec![
                json!({"id": past, "mentor_id": mentor, "mentee_id": mentee_a, "date": "2024-03-01T10:00:00Z", "status": "completed"}),
                json!({"id": future, "mentor_id": mentor, "mentee_id": mentee_a, "date": "2024-03-20T10:00:00Z", "status": "upcoming"}),
                json!({"id": Uuid::new_v4(), "mentor_id": mentor, "mentee_id": mentee_b, "date": "2024-03-02T10:00:00Z", "status": "cancelled"}),
                json!({"id": Uuid::new_v4(), "mentor_id": mentor, "mentee_id": mentee_b, "date": "2024-03-03T10:00:00Z", "status": "completed"}),
            ],
        );
        gateway.seed(
            tables::SESSION_FEEDBACK,
            vec![
                json!({"session_id": past, "rating": 5}),
                json!({"session_id": future, "rating": 4}),
                json!({"session_id": past, "rating": 4}),
                json!({"session_id": Uuid::new_v4(), "rating": 1}),
            ],
        );
        gateway.seed(
            tables::CHECKLIST_TEMPLATES,
            vec![
                json!({"id": Uuid::new_v4(), "mentor_id": mentor, "items": ["a"]}),
                json!({"id": Uuid::new_v4(), "mentor_id": mentor, "items": []}),
                json!({"id": Uuid::new_v4(), "mentor_id": mentor, "items": null}),
            ],
        );
        let service = AnalyticsService::new(gateway);

        let metrics = service
            .dashboard_metrics(mentor, at("2024-03-10T00:00:00Z"))
            .await
            .unwrap();

        assert_eq!(metrics.total_sessions, 4);
        assert_eq!(metrics.upcoming_sessions, 1);
        assert_eq!(metrics.completed_sessions, 2);
        assert_eq!(metrics.average_rating, 4.3);
        assert_eq!(metrics.total_templates, 3);
        assert_eq!(metrics.active_templates, 1);
        assert_eq!(metrics.total_mentees, 2);
        assert_eq!(metrics.session_completion_rate, 50.0);
    }

    #[tokio::test]
    async fn test_usage_queries_pass_range() {
        let gateway = Rc::new(InMemoryGateway::new());
        gateway.set_rpc_response(
            Procedure::GetTemplateUsageTrends,
            json!([{"date": "2024-03-05", "total_templates_used": 2, "total_sessions": 3,
                    "average_rating": 4.5, "most_used_template": "Intro", "most_used_category": null}]),
        );
        let service = AnalyticsService::new(gateway.clone());
        let range = DateRange::last_days(7, at("2024-03-10T00:00:00Z"));

        assert!(service.usage_stats(&range).await.unwrap().is_empty());
        let trends = service.usage_trends(&range).await.unwrap();
        assert_eq!(trends.len(), 1);
        assert_eq!(trends[0].most_used_category, "");

        let calls = gateway.calls();
        assert_eq!(
            calls[0],
            GatewayCall::Rpc(
                Procedure::GetTemplateUsageStats,
                json!({"p_start_date": "2024-03-03T00:00:00.000Z", "p_end_date": "2024-03-10T00:00:00.000Z"})
            )
        );
        assert_eq!(
            calls[1],
            GatewayCall::Rpc(Procedure::GetTemplateUsageTrends, json!({"p_days": 7}))
        );
    }
}
