use plotters::prelude::*;
use plotters_canvas::CanvasBackend;
use shared::TemplateUsageTrend;
use web_sys::HtmlCanvasElement;
use yew::prelude::*;

const CHART_WIDTH: u32 = 800;
const CHART_HEIGHT: u32 = 320;

#[derive(Properties, PartialEq)]
pub struct UsageChartProps {
    pub trends: Vec<TemplateUsageTrend>,
    pub loading: bool,
}

pub enum Msg {
    DrawChart,
}

/// Daily template usage and session counts drawn onto a canvas
pub struct UsageChart {
    canvas_ref: NodeRef,
}

impl Component for UsageChart {
    type Message = Msg;
    type Properties = UsageChartProps;

    fn create(_ctx: &Context<Self>) -> Self {
        Self {
            canvas_ref: NodeRef::default(),
        }
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        match msg {
            Msg::DrawChart => {
                self.draw_chart(&ctx.props().trends);
                false
            }
        }
    }

    fn changed(&mut self, ctx: &Context<Self>, old_props: &Self::Properties) -> bool {
        if ctx.props().trends != old_props.trends {
            self.draw_chart(&ctx.props().trends);
        }
        true
    }

    fn rendered(&mut self, ctx: &Context<Self>, _first_render: bool) {
        if !ctx.props().trends.is_empty() {
            self.draw_chart(&ctx.props().trends);
        }
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        let props = ctx.props();

        html! {
            <div class="usage-chart-container">
                <h3 class="chart-title">{ "Daily Usage" }</h3>
                {
                    if props.trends.is_empty() && props.loading {
                        html! {
                            <div class="chart-loading">
                                <div class="loading-spinner"></div>
                                <p>{ "Loading chart data..." }</p>
                            </div>
                        }
                    } else if props.trends.is_empty() {
                        html! {
                            <div class="chart-empty">
                                <p>{ "No usage data for this period" }</p>
                            </div>
                        }
                    } else {
                        html! {
                            <canvas
                                ref={self.canvas_ref.clone()}
                                class="usage-chart-canvas"
                                width={CHART_WIDTH.to_string()}
                                height={CHART_HEIGHT.to_string()}
                            ></canvas>
                        }
                    }
                }
                <div class="chart-legend">
                    <span class="legend-templates">{ "Templates used" }</span>
                    <span class="legend-sessions">{ "Sessions" }</span>
                </div>
            </div>
        }
    }
}

/// Trends in date order plus the upper bound of the y axis
fn chart_points(trends: &[TemplateUsageTrend]) -> (Vec<&TemplateUsageTrend>, i64) {
    let mut sorted: Vec<&TemplateUsageTrend> = trends.iter().collect();
    sorted.sort_by_key(|trend| trend.date);
    let peak = sorted
        .iter()
        .map(|trend| trend.total_templates_used.max(trend.total_sessions))
        .max()
        .unwrap_or(0);
    (sorted, peak.max(1) + 1)
}

impl UsageChart {
    fn draw_chart(&self, trends: &[TemplateUsageTrend]) {
        if trends.is_empty() {
            return;
        }

        let Some(canvas) = self.canvas_ref.cast::<HtmlCanvasElement>() else {
            return;
        };
        canvas.set_width(CHART_WIDTH);
        canvas.set_height(CHART_HEIGHT);

        let Some(backend) = CanvasBackend::with_canvas_object(canvas) else {
            return;
        };
        let root = backend.into_drawing_area();
        if root.fill(&WHITE).is_err() {
            return;
        }

        let (points, y_max) = chart_points(trends);
        let last_index = (points.len() as i32 - 1).max(1);

        let mut chart = match ChartBuilder::on(&root)
            .margin(15)
            .x_label_area_size(40)
            .y_label_area_size(50)
            .build_cartesian_2d(0..last_index, 0i64..y_max)
        {
            Ok(chart) => chart,
            Err(_) => return,
        };

        let label_for = |index: &i32| {
            points
                .get(*index as usize)
                .map(|trend| trend.date.format("%m/%d").to_string())
                .unwrap_or_default()
        };

        if chart
            .configure_mesh()
            .y_desc("Count")
            .x_desc("Date")
            .x_label_formatter(&label_for)
            .label_style(("sans-serif", 12, &RGBColor(102, 126, 234)))
            .axis_style(&RGBColor(230, 230, 230))
            .bold_line_style(&RGBColor(245, 245, 245))
            .light_line_style(&RGBColor(250, 250, 250))
            .x_labels(8)
            .y_labels(6)
            .draw()
            .is_err()
        {
            return;
        }

        let templates_color = RGBColor(102, 126, 234);
        let sessions_color = RGBColor(240, 147, 251);

        if chart
            .draw_series(LineSeries::new(
                points
                    .iter()
                    .enumerate()
                    .map(|(index, trend)| (index as i32, trend.total_templates_used)),
                templates_color.stroke_width(3),
            ))
            .is_err()
        {
            return;
        }

        if chart
            .draw_series(LineSeries::new(
                points
                    .iter()
                    .enumerate()
                    .map(|(index, trend)| (index as i32, trend.total_sessions)),
                sessions_color.stroke_width(2),
            ))
            .is_err()
        {
            return;
        }

        let _ = chart.draw_series(points.iter().enumerate().map(|(index, trend)| {
            Circle::new(
                (index as i32, trend.total_templates_used),
                4,
                templates_color.filled(),
            )
        }));

        let _ = root.present();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn trend(day: u32, templates: i64, sessions: i64) -> TemplateUsageTrend {
        TemplateUsageTrend {
            date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
            total_templates_used: templates,
            total_sessions: sessions,
            average_rating: 0.0,
            most_used_template: String::new(),
            most_used_category: String::new(),
        }
    }

    #[test]
    fn test_chart_points_sorted_by_date_with_headroom() {
        let trends = vec![trend(5, 2, 7), trend(1, 4, 3)];
        let (points, y_max) = chart_points(&trends);

        assert_eq!(points[0].date.format("%d").to_string(), "01");
        assert_eq!(points[1].date.format("%d").to_string(), "05");
        assert_eq!(y_max, 8);
    }

    #[test]
    fn test_chart_points_never_collapse_the_axis() {
        let trends = vec![trend(1, 0, 0)];
        let (_, y_max) = chart_points(&trends);
        assert_eq!(y_max, 2);
    }
}
