use shared::DashboardMetrics;
use yew::prelude::*;

#[derive(Properties, PartialEq)]
pub struct DashboardOverviewProps {
    pub metrics: DashboardMetrics,
}

fn metric_card(label: &'static str, value: String) -> Html {
    html! {
        <div class="metric-card">
            <span class="metric-value">{ value }</span>
            <span class="metric-label">{ label }</span>
        </div>
    }
}

/// Metric cards at the top of the availability page
#[function_component(DashboardOverview)]
pub fn dashboard_overview(props: &DashboardOverviewProps) -> Html {
    let m = &props.metrics;
    html! {
        <section class="dashboard-overview">
            { metric_card("Total Sessions", m.total_sessions.to_string()) }
            { metric_card("Upcoming", m.upcoming_sessions.to_string()) }
            { metric_card("Completed", m.completed_sessions.to_string()) }
            { metric_card("Average Rating", format!("{:.1}", m.average_rating)) }
            { metric_card("Templates", format!("{} ({} active)", m.total_templates, m.active_templates)) }
            { metric_card("Mentees", m.total_mentees.to_string()) }
            { metric_card("Completion Rate", format!("{:.0}%", m.session_completion_rate)) }
        </section>
    }
}
