//! Application Services
//!
//! The dashboard use case: load once, answer view queries many times.

mod dashboard_service;

pub use dashboard_service::{DashboardService, DashboardSettings};
