use mentor_match_domain::analytics_service::DateRange;
use mentor_match_domain::export_service::ExportService;
use shared::{TemplateStats, TemplateUsageTrend};
use yew::prelude::*;

use crate::components::usage_chart::UsageChart;
use crate::context::AppContext;
use crate::services::date_utils::today;
use crate::services::download::{download_file, open_printable};
use crate::services::logging::Logger;

/// Reporting windows offered by the range buttons, in days
pub const RANGE_CHOICES: [i64; 3] = [7, 30, 90];

#[derive(Properties, PartialEq)]
pub struct AnalyticsPanelProps {
    pub range: DateRange,
    pub stats: Vec<TemplateStats>,
    pub trends: Vec<TemplateUsageTrend>,
    pub loading: bool,
    pub on_range_days: Callback<i64>,
}

#[function_component(AnalyticsPanel)]
pub fn analytics_panel(props: &AnalyticsPanelProps) -> Html {
    let Some(ctx) = use_context::<AppContext>() else {
        return html! {};
    };

    let on_export_csv = {
        let ctx = ctx.clone();
        let stats = props.stats.clone();
        let trends = props.trends.clone();
        Callback::from(move |_: MouseEvent| {
            match ExportService::new().analytics_csv(&stats, &trends, today()) {
                Ok(file) => {
                    if let Err(e) = download_file(&file) {
                        Logger::error_with_component("analytics", &format!("Download failed: {:?}", e));
                        ctx.toasts.error("Failed to export analytics");
                    } else {
                        ctx.toasts.success("Analytics exported");
                    }
                }
                Err(e) => ctx.toasts.failure("Analytics export failed", &e, "Failed to export analytics"),
            }
        })
    };

    let on_print_report = {
        let ctx = ctx.clone();
        let stats = props.stats.clone();
        let trends = props.trends.clone();
        let range = props.range;
        Callback::from(move |_: MouseEvent| {
            let report = ExportService::new().analytics_report_html(
                &stats,
                &trends,
                range.start.date_naive(),
                range.end.date_naive(),
                today(),
            );
            match report {
                Ok(file) => {
                    if let Err(e) = open_printable(&file.content) {
                        Logger::error_with_component("analytics", &format!("Failed to open report: {:?}", e));
                        ctx.toasts.error("Failed to export analytics report");
                    }
                }
                Err(e) => ctx.toasts.failure("Analytics report failed", &e, "Failed to export analytics report"),
            }
        })
    };

    let current_days = props.range.days();

    html! {
        <section class="analytics-panel">
            <div class="panel-header">
                <h2>{ "Template Analytics" }</h2>
                <div class="button-row">
                    { for RANGE_CHOICES.iter().map(|days| {
                        let days = *days;
                        let on_range_days = props.on_range_days.clone();
                        let class = if current_days == days { "range-button active" } else { "range-button" };
                        html! {
                            <button {class} onclick={Callback::from(move |_: MouseEvent| on_range_days.emit(days))}>
                                { format!("{} Days", days) }
                            </button>
                        }
                    }) }
                    <button class="secondary-button" onclick={on_export_csv}>{ "Export CSV" }</button>
                    <button class="secondary-button" onclick={on_print_report}>{ "Export PDF" }</button>
                </div>
            </div>

            <UsageChart trends={props.trends.clone()} loading={props.loading} />

            if props.stats.is_empty() && !props.loading {
                <p class="empty-state">{ "No template usage in this period" }</p>
            } else {
                <table class="analytics-table">
                    <thead>
                        <tr>
                            <th>{ "Template" }</th>
                            <th>{ "Category" }</th>
                            <th>{ "Uses" }</th>
                            <th>{ "Sessions" }</th>
                            <th>{ "Avg Rating" }</th>
                            <th>{ "Completion" }</th>
                            <th>{ "Busiest Day" }</th>
                            <th>{ "Busiest Time" }</th>
                        </tr>
                    </thead>
                    <tbody>
                        { for props.stats.iter().map(|stat| html! {
                            <tr key={stat.template_id.to_string()}>
                                <td>{ &stat.template_name }</td>
                                <td>{ stat.category.clone().unwrap_or_else(|| "Uncategorized".to_string()) }</td>
                                <td>{ stat.total_uses }</td>
                                <td>{ stat.unique_sessions }</td>
                                <td>{ format!("{:.1}", stat.average_rating) }</td>
                                <td>{ format!("{:.1}%", stat.completion_rate * 100.0) }</td>
                                <td>{ &stat.most_used_day }</td>
                                <td>{ &stat.most_used_time }</td>
                            </tr>
                        }) }
                    </tbody>
                </table>
            }
        </section>
    }
}
