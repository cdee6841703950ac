//! Karasu Config - File-backed typed configuration for plugins and hosts.
//!
//! Config types are plain serde structs. Each one is stored as a pretty
//! JSON file in a folder named after its group, or after the owning host
//! when it has none. The registry hands out live handles to the loaded
//! values and writes them back on save.
//!
//! # Example
//!
//! ```rust,ignore
//! use karasu_config::{ConfigDescriptor, ConfigRegistry, ConfigValue};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Clone, Default, Serialize, Deserialize)]
//! #[serde(default, rename_all = "camelCase")]
//! struct ExampleConfig {
//!     example_string: String,
//!     example_int: i32,
//! }
//!
//! impl ConfigValue for ExampleConfig {
//!     fn descriptor() -> Option<ConfigDescriptor> {
//!         Some(ConfigDescriptor::new::<Self>("exampleConfig.json").with_group("KarasuConfigLib"))
//!     }
//! }
//!
//! fn main() -> karasu_config::Result<()> {
//!     let registry = ConfigRegistry::builder("MyPlugin", "./plugins/MyPlugin").build()?;
//!
//!     let config = registry.get_by_type::<ExampleConfig>()?;
//!     config.write().unwrap().example_int = 99;
//!     registry.save("exampleConfig.json")?;
//!
//!     Ok(())
//! }
//! ```

pub mod codec;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod host;
pub mod persistence;
pub mod registry;

// Re-export commonly used types
pub use codec::{Codec, FnAdapter, TypeAdapter, TypeAdapterFactory, TypeKey};
pub use descriptor::{ConfigDescriptor, ConfigValue, DescriptorResolver};
pub use error::{ConfigError, ErrorKind, Result};
pub use host::{ConfigHost, DefaultConfig};
pub use persistence::{ConfigStore, LoadOutcome};
pub use registry::{BatchReport, ConfigHandle, ConfigRegistry, ConfigRegistryBuilder, EntryOutcome};
