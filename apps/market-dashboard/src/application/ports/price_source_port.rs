//! Price Source Port (Driven Port)
//!
//! Interface for reading historical closing prices.

use crate::domain::errors::DataError;
use crate::domain::series::LoadedPrices;

/// Source of historical closing prices.
///
/// Loading happens once at startup, so the port is synchronous.
#[cfg_attr(test, mockall::automock)]
pub trait PriceSource: Send + Sync {
    /// Human readable location, used in logs and error messages.
    fn describe(&self) -> String;

    /// Read every price row the source holds.
    ///
    /// # Errors
    ///
    /// Returns [`DataError`] when the source is missing or structurally
    /// unusable. Individual bad rows are reported as warnings instead.
    fn load(&self) -> Result<LoadedPrices, DataError>;
}
