pub mod analytics_panel;
pub mod availability_editor;
pub mod calendar;
pub mod dashboard_overview;
pub mod form_fields;
pub mod link;
pub mod modal;
pub mod navbar;
pub mod session_modal;
pub mod template_panel;
pub mod toaster;
pub mod usage_chart;
