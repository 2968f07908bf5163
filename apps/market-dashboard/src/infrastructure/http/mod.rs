//! HTTP adapter.
//!
//! Inbound adapter serving the dashboard page and its JSON and CSV views.

mod request;
mod response;
mod server;

pub use request::parse_query;
pub use response::*;
pub use server::{AppState, BoundServer, DashboardServer, ServerError, create_router};
