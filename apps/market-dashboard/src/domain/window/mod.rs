//! Analysis time windows.
//!
//! A window is a closed date range. Preset lookbacks are anchored on the
//! latest date present in the data rather than on today's date, so static
//! files keep producing the same views.

use std::fmt;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

/// Predefined lookback period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Preset {
    /// Last 30 days.
    #[serde(rename = "1m")]
    OneMonth,
    /// Last 90 days.
    #[serde(rename = "3m")]
    ThreeMonths,
    /// Last 180 days.
    #[serde(rename = "6m")]
    SixMonths,
    /// Last 365 days.
    #[serde(rename = "1y")]
    OneYear,
    /// Last 730 days.
    #[serde(rename = "2y")]
    TwoYears,
    /// Last 1825 days.
    #[serde(rename = "5y")]
    FiveYears,
    /// Everything loaded.
    #[default]
    All,
}

impl Preset {
    /// Every preset, shortest first.
    pub const ALL: [Self; 7] = [
        Self::OneMonth,
        Self::ThreeMonths,
        Self::SixMonths,
        Self::OneYear,
        Self::TwoYears,
        Self::FiveYears,
        Self::All,
    ];

    /// Lookback length in days, `None` for [`Preset::All`].
    #[must_use]
    pub const fn days(self) -> Option<u64> {
        match self {
            Self::OneMonth => Some(30),
            Self::ThreeMonths => Some(90),
            Self::SixMonths => Some(180),
            Self::OneYear => Some(365),
            Self::TwoYears => Some(730),
            Self::FiveYears => Some(1825),
            Self::All => None,
        }
    }

    /// Short key used in query strings and configuration.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OneMonth => "1m",
            Self::ThreeMonths => "3m",
            Self::SixMonths => "6m",
            Self::OneYear => "1y",
            Self::TwoYears => "2y",
            Self::FiveYears => "5y",
            Self::All => "all",
        }
    }

    /// Human readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::OneMonth => "1 month",
            Self::ThreeMonths => "3 months",
            Self::SixMonths => "6 months",
            Self::OneYear => "1 year",
            Self::TwoYears => "2 years",
            Self::FiveYears => "5 years",
            Self::All => "All data",
        }
    }

    /// Parse a preset key, case-insensitively.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let key = s.trim().to_lowercase();
        Self::ALL.into_iter().find(|p| p.as_str() == key)
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Closed date range `[from, to]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeWindow {
    /// First included day.
    pub from: NaiveDate,
    /// Last included day.
    pub to: NaiveDate,
}

impl TimeWindow {
    /// Create a window; reversed bounds are swapped.
    #[must_use]
    pub fn new(from: NaiveDate, to: NaiveDate) -> Self {
        if from <= to {
            Self { from, to }
        } else {
            Self { from: to, to: from }
        }
    }

    /// Window of `days` days ending on `anchor`.
    #[must_use]
    pub fn lookback(anchor: NaiveDate, days: u64) -> Self {
        let from = anchor.checked_sub_days(Days::new(days)).unwrap_or(NaiveDate::MIN);
        Self { from, to: anchor }
    }

    /// Window for `preset` over data spanning `bounds`.
    #[must_use]
    pub fn from_preset(preset: Preset, bounds: (NaiveDate, NaiveDate)) -> Self {
        let full = Self::new(bounds.0, bounds.1);
        preset
            .days()
            .map_or(full, |days| Self::lookback(full.to, days).clamp(full))
    }

    /// Intersect with `bounds`. Disjoint windows collapse onto the nearest bound.
    #[must_use]
    pub fn clamp(self, bounds: Self) -> Self {
        let from = self.from.max(bounds.from).min(bounds.to);
        let to = self.to.min(bounds.to).max(from);
        Self { from, to }
    }

    /// Whether `date` lies inside the window.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.to
    }

    /// Number of calendar days covered, inclusive.
    #[must_use]
    pub fn span_days(&self) -> i64 {
        (self.to - self.from).num_days() + 1
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.from.format("%Y-%m-%d"), self.to.format("%Y-%m-%d"))
    }
}
