pub mod enums;
pub mod error;
pub mod money;
pub mod snapshots;

// Re-export the core types to provide a clean public API.
pub use enums::{AdStatus, SourceKind};
pub use error::CoreError;
pub use snapshots::{
    AdMetrics, AdRecord, AdSnapshot, CategorySpend, DailySpend, EventDailyEntry, EventSnapshot,
    ExpenseSnapshot, SecondaryTicketSeries, SnapshotBundle, SourceSnapshot,
};
