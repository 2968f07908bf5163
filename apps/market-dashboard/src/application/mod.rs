//! Application Layer
//!
//! Orchestrates the domain computations behind each dashboard request.
//!
//! - **Ports**: how price data reaches the application
//! - **DTOs**: view queries and the computed views handed to renderers
//! - **Services**: the dashboard use case holding the loaded tables

pub mod dto;
pub mod ports;
pub mod services;

pub use dto::*;
pub use ports::*;
pub use services::*;
