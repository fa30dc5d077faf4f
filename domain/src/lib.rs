//! # MentorMatch domain
//!
//! Business logic of the MentorMatch web client, independent of the UI
//! framework and of the hosted backend it talks to.
//!
//! Every service owns an `Rc` handle to a [`gateway::DataGateway`] (or, for
//! authentication, an [`gateway::AuthProvider`]) and turns page-level
//! actions into row reads, row writes and remote procedure calls.
//!
//! ## Module Organization
//!
//! - **gateway**: Data Gateway and Auth Provider traits plus the query builder
//! - **calendar**: month and week grids, navigation and per-day session lookup
//! - **availability_service**: weekly availability rules, presets and full-replace saves
//! - **booking_service**: availability-checked booking and rescheduling
//! - **session_service**: session listing, status changes, notes, feedback, checklist, summaries
//! - **template_service**: checklist templates, filtering, bulk actions, versions, sharing
//! - **analytics_service**: template usage statistics and dashboard metrics
//! - **export_service**: CSV, JSON and printable HTML exports, template import
//! - **catalog_service**: services offered by mentors
//! - **counselling_service**: counselling sessions
//! - **profile_service**: profiles, mentor listings and the mentor role gate
//! - **auth_service**: sign-in, sign-up, OAuth and sign-out

pub mod analytics_service;
pub mod auth_service;
pub mod availability_service;
pub mod booking_service;
pub mod calendar;
pub mod catalog_service;
pub mod config;
pub mod counselling_service;
pub mod error;
pub mod export_service;
pub mod gateway;
pub mod profile_service;
pub mod session_service;
pub mod template_service;

#[cfg(test)]
pub mod test_utils;

pub use analytics_service::{AnalyticsService, DateRange};
pub use auth_service::{AuthService, SignUpForm};
pub use availability_service::AvailabilityService;
pub use booking_service::{BookingOutcome, BookingRequest, BookingService, RescheduleOutcome};
pub use calendar::{CalendarCell, CalendarService};
pub use catalog_service::CatalogService;
pub use config::ClientConfig;
pub use counselling_service::{CounsellingRequest, CounsellingService};
pub use error::{GatewayError, ServiceError, ServiceResult};
pub use export_service::{ExportFile, ExportService};
pub use profile_service::{ProfileForm, ProfileService, RoleGate};
pub use session_service::SessionService;
pub use template_service::{TemplateFilter, TemplateSelection, TemplateService};
