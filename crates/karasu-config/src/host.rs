//! Host lifecycle integration.
//!
//! A host is the plugin or application that owns a registry. It provides a
//! name, a data folder and the config types it wants created on startup;
//! the registry does the rest in [`ConfigRegistry::on_start`] and
//! [`ConfigRegistry::on_stop`].

use crate::descriptor::ConfigValue;
use crate::error::Result;
use crate::registry::ConfigRegistry;
use std::any::type_name;
use std::fmt;
use std::path::PathBuf;

/// The facts a registry needs from its host.
pub trait ConfigHost {
    /// Name used for the folder of ungrouped configs.
    fn host_name(&self) -> String;

    /// Folder holding this host's own data, including config lists.
    fn data_root(&self) -> PathBuf;

    /// Config types registered by `on_start`.
    fn default_configs(&self) -> Vec<DefaultConfig> {
        Vec::new()
    }
}

/// A config type to register by its descriptor on startup.
#[derive(Clone, Copy)]
pub struct DefaultConfig {
    type_name: &'static str,
    register: fn(&ConfigRegistry) -> Result<()>,
}

impl DefaultConfig {
    pub fn of<T: ConfigValue>() -> Self {
        Self {
            type_name: type_name::<T>(),
            register: register_default::<T>,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub(crate) fn register(&self, registry: &ConfigRegistry) -> Result<()> {
        (self.register)(registry)
    }
}

impl fmt::Debug for DefaultConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefaultConfig")
            .field("type_name", &self.type_name)
            .finish()
    }
}

fn register_default<T: ConfigValue>(registry: &ConfigRegistry) -> Result<()> {
    registry.get_by_type::<T>().map(|_| ())
}
