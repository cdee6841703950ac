//! In-memory registry of config files.
//!
//! Maps file names to live config values. Every operation holds the entry
//! lock for its full duration, so batch operations never interleave with
//! single-entry ones.

use crate::codec::Codec;
use crate::descriptor::{ConfigValue, DescriptorResolver};
use crate::error::{ConfigError, ErrorKind, Result};
use crate::host::{ConfigHost, DefaultConfig};
use crate::persistence::ConfigStore;
use crate::registry::builder::ConfigRegistryBuilder;
use crate::registry::entry::{ConfigEntry, ConfigHandle};
use crate::registry::report::{BatchReport, EntryOutcome};
use std::any::{type_name, TypeId};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use tracing::{debug, error, info, warn};

type Entries = HashMap<String, ConfigEntry>;

/// File-backed registry of typed config values.
pub struct ConfigRegistry {
    store: ConfigStore,
    resolver: DescriptorResolver,
    defaults: Vec<DefaultConfig>,
    fallback_to_default_on_corrupt: bool,
    entries: Mutex<Entries>,
}

impl ConfigRegistry {
    /// Create a builder for a registry owned by `host_name`.
    pub fn builder(host_name: impl Into<String>, data_root: impl Into<PathBuf>) -> ConfigRegistryBuilder {
        ConfigRegistryBuilder::new(host_name, data_root)
    }

    /// Create a builder pre-filled from a host.
    pub fn from_host(host: &(impl ConfigHost + ?Sized)) -> ConfigRegistryBuilder {
        ConfigRegistryBuilder::from_host(host)
    }

    pub(crate) fn from_parts(
        store: ConfigStore,
        resolver: DescriptorResolver,
        defaults: Vec<DefaultConfig>,
        fallback_to_default_on_corrupt: bool,
    ) -> Self {
        Self {
            store,
            resolver,
            defaults,
            fallback_to_default_on_corrupt,
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn lock_entries(&self) -> Result<MutexGuard<'_, Entries>> {
        self.entries
            .lock()
            .map_err(|_| ConfigError::LockPoisoned("config registry entries".to_string()))
    }

    /// Entry map for read-only introspection. Every mutation of the map is a
    /// single insert or remove, so a poisoned lock still guards a whole map.
    fn inspect_entries(&self) -> MutexGuard<'_, Entries> {
        self.entries.lock().unwrap_or_else(|poisoned| {
            warn!("Config registry lock was poisoned, recovering for inspection");
            poisoned.into_inner()
        })
    }

    // ========================================
    // Accessors
    // ========================================

    pub fn host_name(&self) -> &str {
        self.store.host_name()
    }

    pub fn data_root(&self) -> &Path {
        self.store.data_root()
    }

    pub fn codec(&self) -> &Arc<Codec> {
        self.store.codec()
    }

    pub fn resolver(&self) -> &DescriptorResolver {
        &self.resolver
    }

    pub fn contains(&self, file_name: &str) -> bool {
        self.inspect_entries().contains_key(file_name)
    }

    /// Tracked file names, sorted.
    pub fn file_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.inspect_entries().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.inspect_entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// On-disk path of a tracked config file.
    pub fn config_path(&self, file_name: &str) -> Option<PathBuf> {
        self.inspect_entries()
            .get(file_name)
            .map(|entry| self.entry_path(file_name, entry))
    }

    /// On-disk path of a config list file.
    pub fn list_path(&self, file_name: &str) -> PathBuf {
        self.store.list_path(file_name)
    }

    fn entry_path(&self, file_name: &str, entry: &ConfigEntry) -> PathBuf {
        self.store.config_path(entry.group_name(), file_name)
    }

    // ========================================
    // Registration and lookup
    // ========================================

    /// Register `file_name` as a `T`.
    ///
    /// Loads the file from the folder of `T`'s group, or writes a default
    /// there if it does not exist. A file name that is already tracked as a
    /// `T` returns the cached handle without touching the disk.
    pub fn register<T: ConfigValue>(&self, file_name: &str) -> Result<ConfigHandle<T>> {
        let mut entries = self.lock_entries()?;
        self.get_or_load(&mut entries, file_name)
    }

    /// Get the cached `T` for `file_name`, registering it when untracked.
    ///
    /// Fails with [`ConfigError::TypeMismatch`] when the file name is tracked
    /// with another type.
    pub fn get<T: ConfigValue>(&self, file_name: &str) -> Result<ConfigHandle<T>> {
        let mut entries = self.lock_entries()?;
        self.get_or_load(&mut entries, file_name)
    }

    /// Get `T` under the file name from its descriptor.
    pub fn get_by_type<T: ConfigValue>(&self) -> Result<ConfigHandle<T>> {
        let file_name = self.resolver.file_name::<T>()?;
        self.get(&file_name)
    }

    /// Snapshot every tracked value that is a `T` or is built on one.
    ///
    /// Order follows the internal map and is not stable.
    pub fn get_all_of_type<T: ConfigValue>(&self) -> Result<Vec<T>> {
        let entries = self.lock_entries()?;
        let target = TypeId::of::<T>();
        let mut found = Vec::new();

        for (file_name, entry) in entries.iter() {
            let visited = entry.value().visit_as(target, &mut |view| {
                if let Some(value) = view.downcast_ref::<T>() {
                    found.push(value.clone());
                }
            });
            if let Err(e) = visited {
                warn!("Skipping config {}: {}", file_name, e);
            }
        }

        Ok(found)
    }

    fn get_or_load<T: ConfigValue>(&self, entries: &mut Entries, file_name: &str) -> Result<ConfigHandle<T>> {
        if let Some(entry) = entries.get(file_name) {
            return entry
                .handle::<T>()
                .ok_or_else(|| type_mismatch::<T>(file_name, entry));
        }

        let group_name = self.resolver.group_name::<T>();
        let value = match self.store.load_or_create::<T>(group_name.as_deref(), file_name) {
            Ok(outcome) => outcome.into_value(),
            Err(e) if self.fallback_to_default_on_corrupt && e.kind() == ErrorKind::ParseFailure => {
                warn!(
                    "Config {} could not be parsed, using defaults in memory: {}",
                    file_name, e
                );
                T::create_default().map_err(|e| {
                    error!("Failed to create default for {}: {}", file_name, e);
                    e
                })?
            }
            Err(e) => {
                error!("Failed to add config {}: {}", file_name, e);
                return Err(e);
            }
        };

        let handle: ConfigHandle<T> = Arc::new(RwLock::new(value));
        entries.insert(
            file_name.to_string(),
            ConfigEntry::new(group_name, Arc::clone(&handle)),
        );
        info!("Registered config {} as {}", file_name, type_name::<T>());
        Ok(handle)
    }

    // ========================================
    // Saving
    // ========================================

    /// Write the current value of `file_name` to disk.
    ///
    /// Takes a read lock on the value, so the caller must not hold a write
    /// guard from its handle.
    pub fn save(&self, file_name: &str) -> Result<()> {
        let entries = self.lock_entries()?;
        let entry = entries.get(file_name).ok_or_else(|| {
            warn!("Config {} is not registered, cannot save", file_name);
            ConfigError::NotRegistered {
                file_name: file_name.to_string(),
            }
        })?;
        self.save_entry(file_name, entry)
    }

    /// Save every tracked entry. One failure does not stop the others.
    pub fn save_all(&self) -> Result<BatchReport> {
        let entries = self.lock_entries()?;
        let mut report = BatchReport::default();

        for (file_name, entry) in entries.iter() {
            match self.save_entry(file_name, entry) {
                Ok(()) => report.record(file_name.as_str(), EntryOutcome::Saved),
                Err(e) => report.record(file_name.as_str(), EntryOutcome::Failed(e)),
            }
        }

        info!(
            "Saved {} configs, {} failed",
            report.success_count(),
            report.failure_count()
        );
        Ok(report)
    }

    fn save_entry(&self, file_name: &str, entry: &ConfigEntry) -> Result<()> {
        let path = self.entry_path(file_name, entry);
        let result = entry
            .value()
            .encode(self.store.codec())
            .and_then(|text| {
                if let Some(folder) = path.parent() {
                    self.store.ensure_dir(folder);
                }
                self.store.write_text(&path, &text)
            });

        match &result {
            Ok(()) => info!("Config saved to {}", path.display()),
            Err(e) => error!("Failed to save config {}: {}", file_name, e),
        }
        result
    }

    // ========================================
    // Reloading
    // ========================================

    /// Re-read `file_name` as a `T`.
    ///
    /// A deleted or undecodable file fails and leaves the cached value in
    /// place. A tracked `T` is updated behind its existing handle; a file name
    /// tracked with another type fails with [`ConfigError::TypeMismatch`].
    /// An untracked file name is added when its file exists.
    pub fn reload<T: ConfigValue>(&self, file_name: &str) -> Result<()> {
        let mut entries = self.lock_entries()?;
        let existing = match entries.get(file_name) {
            Some(entry) => Some(
                entry
                    .handle::<T>()
                    .ok_or_else(|| type_mismatch::<T>(file_name, entry))?,
            ),
            None => None,
        };

        let group_name = self.resolver.group_name::<T>();
        let path = self.store.config_path(group_name.as_deref(), file_name);

        if !path.exists() {
            warn!("Config file does not exist: {}", path.display());
            return Err(ConfigError::FileNotFound(path));
        }

        let value: T = self.store.load_existing(&path).map_err(|e| {
            error!("Error reloading config {}: {}", file_name, e);
            e
        })?;

        match existing {
            Some(handle) => {
                let mut guard = handle.write().map_err(|_| {
                    ConfigError::LockPoisoned(format!("config value {}", file_name))
                })?;
                *guard = value;
            }
            None => {
                entries.insert(
                    file_name.to_string(),
                    ConfigEntry::new(group_name, Arc::new(RwLock::new(value))),
                );
            }
        }

        info!("Successfully reloaded config: {}", file_name);
        Ok(())
    }

    /// Reload every tracked entry, evicting those whose file is gone.
    ///
    /// Missing files are collected during the scan and evicted afterwards.
    /// [`BatchReport::success_count`] is the number of reloaded entries and
    /// [`BatchReport::removed_count`] the number evicted.
    pub fn reload_all(&self) -> Result<BatchReport> {
        let mut entries = self.lock_entries()?;
        let mut report = BatchReport::default();
        let mut keys_to_remove = Vec::new();

        for (file_name, entry) in entries.iter() {
            let path = self.entry_path(file_name, entry);
            if !path.exists() {
                warn!(
                    "Config file does not exist, removing from registry: {}",
                    file_name
                );
                keys_to_remove.push(file_name.clone());
                continue;
            }

            match entry.value().reload(&self.store, &path) {
                Ok(()) => {
                    debug!("Reloaded config {}", file_name);
                    report.record(file_name.as_str(), EntryOutcome::Reloaded);
                }
                Err(e) => {
                    error!("Error reloading config {}: {}", file_name, e);
                    report.record(file_name.as_str(), EntryOutcome::Failed(e));
                }
            }
        }

        for key in keys_to_remove {
            entries.remove(&key);
            report.record(key, EntryOutcome::Removed);
        }

        info!(
            "Reloaded {} configs, removed {} missing configs",
            report.success_count(),
            report.removed_count()
        );
        Ok(report)
    }

    /// Refresh every tracked entry from disk, writing a default for any
    /// entry whose file is missing.
    pub fn load_all(&self) -> Result<BatchReport> {
        let entries = self.lock_entries()?;
        let mut report = BatchReport::default();

        for (file_name, entry) in entries.iter() {
            let path = self.entry_path(file_name, entry);
            let outcome = if path.exists() {
                entry
                    .value()
                    .reload(&self.store, &path)
                    .map(|_| EntryOutcome::Reloaded)
            } else {
                warn!("Config file not found, creating a new one: {}", path.display());
                entry
                    .value()
                    .recreate(&self.store, &path)
                    .map(|_| EntryOutcome::Created)
            };

            match outcome {
                Ok(outcome) => report.record(file_name.as_str(), outcome),
                Err(e) => {
                    error!("Failed to load config {}: {}", file_name, e);
                    report.record(file_name.as_str(), EntryOutcome::Failed(e));
                }
            }
        }

        info!("Loaded {} of {} configs", report.success_count(), report.len());
        Ok(report)
    }

    // ========================================
    // Config lists
    // ========================================

    /// Save `list` as a JSON array in the host data root.
    pub fn save_list<T: ConfigValue>(&self, list: &[T], file_name: &str) -> Result<()> {
        self.store.save_list(list, file_name).map_err(|e| {
            error!("Failed to save config list {}: {}", file_name, e);
            e
        })
    }

    /// Load a JSON array from the host data root, creating an empty one
    /// when the file is missing.
    pub fn load_list<T: ConfigValue>(&self, file_name: &str) -> Result<Vec<T>> {
        self.store.load_list(file_name).map_err(|e| {
            error!("Failed to load config list {}: {}", file_name, e);
            e
        })
    }

    // ========================================
    // Host lifecycle
    // ========================================

    /// Register the host's declared default configs, then load everything.
    ///
    /// A default config type without usable metadata aborts startup; other
    /// per-type failures are logged and skipped.
    pub fn on_start(&self) -> Result<BatchReport> {
        self.initialize_default_configs()?;
        self.load_all()
    }

    /// Save every tracked config.
    pub fn on_stop(&self) -> Result<BatchReport> {
        self.save_all()
    }

    fn initialize_default_configs(&self) -> Result<()> {
        for default in &self.defaults {
            match default.register(self) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::MetadataMissing => {
                    error!(
                        "Failed to get config file name for {}: {}",
                        default.type_name(),
                        e
                    );
                    return Err(e);
                }
                Err(e) => {
                    error!(
                        "Failed to register default config {}: {}",
                        default.type_name(),
                        e
                    );
                }
            }
        }

        info!("Initialized {} default config files", self.defaults.len());
        Ok(())
    }
}

fn type_mismatch<T: ConfigValue>(file_name: &str, entry: &ConfigEntry) -> ConfigError {
    let err = ConfigError::TypeMismatch {
        file_name: file_name.to_string(),
        expected: type_name::<T>().to_string(),
        actual: entry.type_name().to_string(),
    };
    warn!("{}", err);
    err
}
