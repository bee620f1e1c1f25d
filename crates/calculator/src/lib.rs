//! # Pulse Metrics Calculator
//!
//! This crate turns the four source snapshots into the single combined metrics
//! record the dashboard displays.
//!
//! ## Architectural Principles
//!
//! - **Pure logic:** No network or file access. It depends only on `core-types`
//!   for its inputs and on `configuration` for pricing and spend constants.
//! - **Stateless calculation:** `MetricsCalculator` holds configuration only. Every
//!   call reconciles fees, merges the daily series and validates the result from scratch.
//!
//! ## Public API
//!
//! - `MetricsCalculator`: Combines the snapshots into a `CombinedMetricsRecord`.
//! - `DailyFeeReconciler`: Converts gross daily ticket revenue into revenue net of fees.
//! - `merge_daily_breakdown`: Aligns event and secondary-marketplace series by date.
//! - `validate_record`: The invariant checks every record must pass before it is published.
//! - `CalculatorError`: The errors that can be returned from this crate.

pub mod breakdown;
pub mod engine;
pub mod error;
pub mod reconciler;
pub mod report;
pub mod validation;

pub use breakdown::{merge_daily_breakdown, FreshnessCutoffs, MergedDailyEntry};
pub use engine::MetricsCalculator;
pub use error::{CalculatorError, ValidationFailure};
pub use reconciler::{DailyFeeReconciler, FeeBreakdown, FeeSchedule, ReconciledDailyEntry, ReconciledSeries};
pub use report::{AdMetricsSummary, CombinedMetricsRecord};
pub use validation::validate_record;
