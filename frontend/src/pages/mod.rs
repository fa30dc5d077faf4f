//! One view component per route.

pub mod auth_callback;
pub mod availability;
pub mod book_session;
pub mod counselling;
pub mod dashboard;
pub mod home;
pub mod login;
pub mod not_found;
pub mod services;
pub mod sessions;
pub mod settings;
pub mod signup;
