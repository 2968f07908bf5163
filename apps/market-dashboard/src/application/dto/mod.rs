//! Data Transfer Objects (DTOs)
//!
//! Queries coming in from the HTTP layer and the views going out to renderers.

mod query;
mod view;

pub use query::{AssetGroup, DashboardQuery, Panel, RangeSelection};
pub use view::{DashboardView, MetricsTable};
