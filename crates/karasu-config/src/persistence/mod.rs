//! Config file persistence.
//!
//! This module provides:
//! - Atomic text writes with optional backups
//! - Folder resolution for grouped and per-host configs
//! - Load-or-create of single values and persistence of config lists

mod atomic;
mod store;

pub use atomic::{backup_path, read_text, write_text_atomic};
pub use store::{ConfigStore, LoadOutcome};
