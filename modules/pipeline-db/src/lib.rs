mod discovery;
mod dlq;
mod errorlog;
mod events;
mod jobs;
mod repair;
mod rows;
mod sources;
mod store;

#[cfg(feature = "test-utils")]
pub mod testutil;

pub use events::InsertOutcome;
pub use rows::{DiscoveryJobRow, DlqRow, EventRow, RepairLogRow, ScrapeJobRow, SourceRow};
pub use sources::PipelineHealth;
pub use store::Store;
