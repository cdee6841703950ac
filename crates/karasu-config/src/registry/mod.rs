//! Config registry: tracked entries, batch operations and their reports.

mod builder;
mod config_registry;
mod entry;
mod report;

pub use builder::ConfigRegistryBuilder;
pub use config_registry::ConfigRegistry;
pub use entry::ConfigHandle;
pub use report::{BatchReport, EntryOutcome};
