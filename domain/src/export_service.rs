//! Export service for the availability settings page.
//!
//! Builds the downloadable artifacts: the analytics CSV, the template JSON
//! export (and its import parser) and the printable HTML reports that stand
//! in for PDF exports. Triggering the download is left to the UI.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use csv::{Terminator, WriterBuilder};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use shared::{
    AvailabilityRule, ChecklistTemplate, Session, SessionDetails, SessionSummary, TemplateStats,
    TemplateUsageTrend,
};
use std::fmt::Display;

use crate::availability_service::is_available_on;
use crate::calendar::CalendarService;
use crate::error::{ServiceError, ServiceResult};

pub const NO_ANALYTICS_MESSAGE: &str = "No analytics data to export";
pub const INVALID_IMPORT_MESSAGE: &str = "Invalid template file format";
pub const TEMPLATE_EXPORT_VERSION: &str = "1.0";

/// A generated file ready to be offered for download
#[derive(Debug, Clone, PartialEq)]
pub struct ExportFile {
    pub filename: String,
    pub mime_type: &'static str,
    pub content: String,
}

/// Shape of a template export file
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
struct TemplateExport<'a> {
    version: &'static str,
    export_date: String,
    templates: &'a [ChecklistTemplate],
}

/// Template as read back from an export file; only the portable fields
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ImportedTemplate {
    pub name: String,
    #[serde(default)]
    pub items: Vec<String>,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Deserialize)]
struct TemplateImport {
    version: Option<serde_json::Value>,
    templates: Option<Vec<ImportedTemplate>>,
}

/// One titled CSV table: a one-field title record, the header, then rows
fn csv_table<R>(title: &str, header: &[&str], rows: R) -> ServiceResult<String>
where
    R: IntoIterator<Item = Vec<String>>,
{
    let mut writer = WriterBuilder::new()
        .flexible(true)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    writer.write_record([title])?;
    writer.write_record(header)?;
    for row in rows {
        writer.write_record(&row)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|err| ServiceError::Export(err.to_string()))?;
    String::from_utf8(bytes).map_err(|err| ServiceError::Export(err.to_string()))
}

/// Minimal escaping for text interpolated into the printable reports
pub fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn us_date(date: NaiveDate) -> String {
    date.format("%-m/%-d/%Y").to_string()
}

const REPORT_STYLE: &str = "<style>\
body { font-family: system-ui, -apple-system, sans-serif; color: #000; padding: 20px; }\
table { border-collapse: collapse; width: 100%; margin-bottom: 24px; }\
th, td { border: 1px solid #ddd; padding: 6px; text-align: left; }\
th { background: #424242; color: #fff; }\
.calendar-grid { display: grid; grid-template-columns: repeat(7, 1fr); gap: 8px; }\
.day-cell { border: 1px solid #ddd; padding: 8px; min-height: 100px; }\
.session-item { background: #f3f4f6; padding: 4px; margin: 4px 0; border-radius: 4px; font-size: 12px; }\
.available { background: #f3e8ff; }\
.unavailable { background: #fee2e2; }\
</style>";

fn html_document(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>{}</title>{}</head>\
<body>{}<script>window.onload = function () {{ window.print(); }};</script></body></html>",
        escape_html(title),
        REPORT_STYLE,
        body
    )
}

fn list_table(heading: &str, column: &str, rows: &[String]) -> String {
    let body: String = rows
        .iter()
        .map(|row| format!("<tr><td>{}</td></tr>", escape_html(row)))
        .collect();
    format!(
        "<h2>{}</h2><table><thead><tr><th>{}</th></tr></thead><tbody>{}</tbody></table>",
        escape_html(heading),
        escape_html(column),
        body
    )
}

/// Export service that builds every downloadable artifact
#[derive(Debug, Clone, Copy, Default)]
pub struct ExportService;

impl ExportService {
    pub fn new() -> Self {
        Self
    }

    /// Analytics CSV with a statistics table and a trends table
    pub fn analytics_csv(
        &self,
        stats: &[TemplateStats],
        trends: &[TemplateUsageTrend],
        today: NaiveDate,
    ) -> ServiceResult<ExportFile> {
        if stats.is_empty() || trends.is_empty() {
            warn!("📄 EXPORT: {}", NO_ANALYTICS_MESSAGE);
            return Err(ServiceError::Validation(NO_ANALYTICS_MESSAGE.to_string()));
        }

        let statistics = csv_table(
            "Template Usage Statistics",
            &[
                "Template Name",
                "Category",
                "Total Uses",
                "Unique Sessions",
                "Average Rating",
                "Completion Rate",
                "Most Used Day",
                "Most Used Time",
                "Feedback Count",
            ],
            stats.iter().map(|stat| {
                vec![
                    stat.template_name.clone(),
                    stat.category.clone().unwrap_or_default(),
                    stat.total_uses.to_string(),
                    stat.unique_sessions.to_string(),
                    format!("{:.1}", stat.average_rating),
                    format!("{:.1}%", stat.completion_rate * 100.0),
                    stat.most_used_day.clone(),
                    stat.most_used_time.clone(),
                    stat.feedback_count.to_string(),
                ]
            }),
        )?;
        let usage = csv_table(
            "Usage Trends",
            &[
                "Date",
                "Total Templates Used",
                "Total Sessions",
                "Average Rating",
                "Most Used Template",
                "Most Used Category",
            ],
            trends.iter().map(|trend| {
                vec![
                    us_date(trend.date),
                    trend.total_templates_used.to_string(),
                    trend.total_sessions.to_string(),
                    format!("{:.1}", trend.average_rating),
                    trend.most_used_template.clone(),
                    trend.most_used_category.clone(),
                ]
            }),
        )?;

        info!(
            "📄 EXPORT: Analytics CSV with {} stats and {} trend rows",
            stats.len(),
            trends.len()
        );
        Ok(ExportFile {
            filename: format!("template-analytics-{}.csv", today.format("%Y-%m-%d")),
            mime_type: "text/csv;charset=utf-8;",
            // Blank line between the two tables
            content: format!("{}\n{}", statistics, usage),
        })
    }

    /// JSON export of the given templates
    pub fn templates_json(
        &self,
        templates: &[ChecklistTemplate],
        now: DateTime<Utc>,
    ) -> ServiceResult<ExportFile> {
        if templates.is_empty() {
            return Err(ServiceError::Validation(
                "Please select templates to export".to_string(),
            ));
        }
        let export = TemplateExport {
            version: TEMPLATE_EXPORT_VERSION,
            export_date: now.to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            templates,
        };
        let content = serde_json::to_string_pretty(&export)?;
        info!("📄 EXPORT: Exported {} templates", templates.len());
        Ok(ExportFile {
            filename: format!("templates-export-{}.json", now.format("%Y-%m-%d")),
            mime_type: "application/json",
            content,
        })
    }

    /// Parse a template export file; files without `version` or `templates`
    /// are rejected
    pub fn parse_template_import(&self, text: &str) -> ServiceResult<Vec<ImportedTemplate>> {
        let parsed: TemplateImport = serde_json::from_str(text).map_err(|err| {
            warn!("📄 EXPORT: Template import is not valid JSON: {}", err);
            ServiceError::InvalidImport(INVALID_IMPORT_MESSAGE.to_string())
        })?;
        match parsed {
            TemplateImport {
                version: Some(version),
                templates: Some(templates),
            } if !version.is_null() => Ok(templates),
            _ => Err(ServiceError::InvalidImport(INVALID_IMPORT_MESSAGE.to_string())),
        }
    }

    /// Printable session summary
    pub fn summary_report_html<Tz: TimeZone>(
        &self,
        details: &SessionDetails,
        summary: &SessionSummary,
        tz: &Tz,
    ) -> ExportFile
    where
        Tz::Offset: Display,
    {
        let local = details.session.date.with_timezone(tz);
        let mut body = String::from("<h1>Session Summary</h1>");
        body.push_str(&format!(
            "<p><strong>Session:</strong> {}</p><p><strong>Date:</strong> {}</p><p><strong>Time:</strong> {}</p>",
            escape_html(&details.session.title),
            local.format("%-m/%-d/%Y"),
            local.format("%-I:%M:%S %p"),
        ));
        body.push_str(&format!(
            "<h2>Mentee</h2><p>Name: {}</p><p>Email: {}</p>",
            escape_html(details.mentee.full_name.as_deref().unwrap_or("")),
            escape_html(details.mentee.email.as_deref().unwrap_or("")),
        ));
        body.push_str(&list_table("Key Points", "Point", &summary.key_points));
        body.push_str(&list_table("Action Items", "Item", &summary.action_items));
        body.push_str(&list_table("Next Steps", "Step", &summary.next_steps));

        ExportFile {
            filename: format!("session-summary-{}.html", details.session.id),
            mime_type: "text/html",
            content: html_document("Session Summary", &body),
        }
    }

    /// Printable analytics report for a date range
    pub fn analytics_report_html(
        &self,
        stats: &[TemplateStats],
        trends: &[TemplateUsageTrend],
        start: NaiveDate,
        end: NaiveDate,
        today: NaiveDate,
    ) -> ServiceResult<ExportFile> {
        if stats.is_empty() || trends.is_empty() {
            return Err(ServiceError::Validation(NO_ANALYTICS_MESSAGE.to_string()));
        }

        let mut body = format!(
            "<h1>Template Analytics Report</h1><p>Date Range: {} - {}</p>",
            us_date(start),
            us_date(end)
        );
        body.push_str("<h2>Template Usage Statistics</h2><table><thead><tr><th>Template</th><th>Category</th><th>Total Uses</th><th>Unique Sessions</th><th>Average Rating</th><th>Completion Rate</th><th>Most Used</th><th>Feedback Count</th></tr></thead><tbody>");
        for stat in stats {
            body.push_str(&format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{:.1}</td><td>{:.1}%</td><td>{} {}</td><td>{}</td></tr>",
                escape_html(&stat.template_name),
                escape_html(stat.category.as_deref().unwrap_or("None")),
                stat.total_uses,
                stat.unique_sessions,
                stat.average_rating,
                stat.completion_rate * 100.0,
                escape_html(&stat.most_used_day),
                escape_html(&stat.most_used_time),
                stat.feedback_count,
            ));
        }
        body.push_str("</tbody></table>");

        body.push_str("<h2>Usage Trends</h2><table><thead><tr><th>Date</th><th>Total Templates Used</th><th>Total Sessions</th><th>Average Rating</th><th>Most Used Template</th><th>Most Used Category</th></tr></thead><tbody>");
        for trend in trends {
            body.push_str(&format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{:.1}</td><td>{}</td><td>{}</td></tr>",
                us_date(trend.date),
                trend.total_templates_used,
                trend.total_sessions,
                trend.average_rating,
                escape_html(&trend.most_used_template),
                escape_html(&trend.most_used_category),
            ));
        }
        body.push_str("</tbody></table>");

        Ok(ExportFile {
            filename: format!("template-analytics-{}.html", today.format("%Y-%m-%d")),
            mime_type: "text/html",
            content: html_document("Template Analytics Report", &body),
        })
    }

    /// Printable week view: availability per day and the sessions on it
    pub fn week_schedule_html<Tz: TimeZone>(
        &self,
        reference: NaiveDate,
        rules: &[AvailabilityRule],
        sessions: &[Session],
        tz: &Tz,
        today: NaiveDate,
    ) -> ExportFile
    where
        Tz::Offset: Display,
    {
        let calendar = CalendarService::new();
        let mut body = String::from("<h1>Availability Calendar</h1><div class=\"calendar-grid\">");
        for date in calendar.week_grid(reference) {
            let class = if is_available_on(rules, date) {
                "available"
            } else {
                "unavailable"
            };
            body.push_str(&format!(
                "<div class=\"day-cell {}\"><div style=\"font-weight: bold; margin-bottom: 8px;\">{}</div>",
                class,
                date.format("%a, %b %-d")
            ));
            for session in calendar.sessions_on(sessions, date, tz) {
                body.push_str(&format!(
                    "<div class=\"session-item\"><div style=\"font-weight: bold;\">{}</div><div>{}</div></div>",
                    escape_html(&session.title),
                    session.date.with_timezone(tz).format("%I:%M %p")
                ));
            }
            body.push_str("</div>");
        }
        body.push_str("</div>");

        ExportFile {
            filename: format!("availability-{}.html", today.format("%Y-%m-%d")),
            mime_type: "text/html",
            content: html_document(
                &format!("Availability Calendar - {}", us_date(today)),
                &body,
            ),
        }
    }
}
