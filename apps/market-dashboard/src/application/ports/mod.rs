//! Application Ports (Driven)
//!
//! Ports define how the application reaches external systems.

mod price_source_port;

pub use price_source_port::PriceSource;

#[cfg(test)]
pub use price_source_port::MockPriceSource;
