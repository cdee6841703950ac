//! Builder for configuring a ConfigRegistry.

use std::path::PathBuf;
use std::sync::Arc;

use crate::codec::{self, Codec};
use crate::config::RegistryConfig;
use crate::descriptor::{ConfigDescriptor, DescriptorResolver};
use crate::error::{ConfigError, Result};
use crate::host::{ConfigHost, DefaultConfig};
use crate::persistence::ConfigStore;
use crate::registry::ConfigRegistry;

/// Builder for configuring [`ConfigRegistry`] initialization.
///
/// # Example
///
/// ```rust,ignore
/// use karasu_config::ConfigRegistry;
///
/// let registry = ConfigRegistry::builder("MyPlugin", "./plugins/MyPlugin")
///     .keep_backup(true)
///     .build()?;
/// ```
pub struct ConfigRegistryBuilder {
    host_name: String,
    data_root: PathBuf,
    auto_create_dirs: bool,
    keep_backup: bool,
    fallback_to_default_on_corrupt: bool,
    codec: Option<Arc<Codec>>,
    resolver: DescriptorResolver,
    defaults: Vec<DefaultConfig>,
}

impl ConfigRegistryBuilder {
    /// Create a new builder for the host `host_name` with data root `data_root`.
    pub fn new(host_name: impl Into<String>, data_root: impl Into<PathBuf>) -> Self {
        Self {
            host_name: host_name.into(),
            data_root: data_root.into(),
            auto_create_dirs: RegistryConfig::DEFAULT_AUTO_CREATE_DIRS,
            keep_backup: RegistryConfig::DEFAULT_KEEP_BACKUP,
            fallback_to_default_on_corrupt: RegistryConfig::DEFAULT_FALLBACK_TO_DEFAULT_ON_CORRUPT,
            codec: None,
            resolver: DescriptorResolver::new(),
            defaults: Vec::new(),
        }
    }

    /// Create a builder from the facts and default configs a host declares.
    pub fn from_host(host: &(impl ConfigHost + ?Sized)) -> Self {
        Self::new(host.host_name(), host.data_root()).default_configs(host.default_configs())
    }

    /// Create the host data root when building.
    ///
    /// Default: `true`
    pub fn auto_create_dirs(mut self, enable: bool) -> Self {
        self.auto_create_dirs = enable;
        self
    }

    /// Keep a `.bak` copy of a config file's previous content on each save.
    ///
    /// Default: `false`
    pub fn keep_backup(mut self, enable: bool) -> Self {
        self.keep_backup = enable;
        self
    }

    /// When an existing file cannot be decoded, register an in-memory default
    /// instead of failing. The file itself is left untouched.
    ///
    /// Default: `false` (a corrupt file is reported as an error)
    pub fn fallback_to_default_on_corrupt(mut self, enable: bool) -> Self {
        self.fallback_to_default_on_corrupt = enable;
        self
    }

    /// Use a codec owned by this registry instead of the process-wide one.
    pub fn with_codec(mut self, codec: Arc<Codec>) -> Self {
        self.codec = Some(codec);
        self
    }

    /// Register a descriptor for a type, overriding the one it provides.
    pub fn with_descriptor(mut self, descriptor: ConfigDescriptor) -> Self {
        self.resolver.register(descriptor);
        self
    }

    /// Declare a config type to be registered by `on_start`.
    pub fn default_config(mut self, default: DefaultConfig) -> Self {
        self.defaults.push(default);
        self
    }

    pub fn default_configs(mut self, defaults: impl IntoIterator<Item = DefaultConfig>) -> Self {
        self.defaults.extend(defaults);
        self
    }

    /// Build the registry.
    pub fn build(self) -> Result<ConfigRegistry> {
        if self.auto_create_dirs && !self.data_root.exists() {
            std::fs::create_dir_all(&self.data_root).map_err(|e| ConfigError::Io {
                message: format!("Failed to create data root {}", self.data_root.display()),
                path: Some(self.data_root.clone()),
                source: Some(e),
            })?;
        }

        let codec = self.codec.unwrap_or_else(codec::global);
        let store = ConfigStore::new(self.host_name, self.data_root, codec)
            .with_backups(self.keep_backup);

        Ok(ConfigRegistry::from_parts(
            store,
            self.resolver,
            self.defaults,
            self.fallback_to_default_on_corrupt,
        ))
    }
}
