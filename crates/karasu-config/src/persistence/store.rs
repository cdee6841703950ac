//! On-disk layout and file I/O for config values.
//!
//! Layout:
//! - Registered configs: `<parent of data root>/<group or host name>/<file name>`
//! - Config lists: `<data root>/<file name>`
//!
//! Hosts that declare the same group name share one folder; an ungrouped
//! config lives in a folder named after the host.

use crate::codec::Codec;
use crate::descriptor::{ConfigDescriptor, ConfigValue};
use crate::error::{ConfigError, Result};
use crate::persistence::atomic::{read_text, write_text_atomic};
use serde::{de::DeserializeOwned, Serialize};
use std::any::type_name;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Result of [`ConfigStore::load_or_create`].
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome<T> {
    /// Decoded from an existing file.
    Loaded(T),
    /// The file was missing; a default was written and returned.
    Created(T),
}

impl<T> LoadOutcome<T> {
    pub fn into_value(self) -> T {
        match self {
            LoadOutcome::Loaded(value) | LoadOutcome::Created(value) => value,
        }
    }

    pub fn was_created(&self) -> bool {
        matches!(self, LoadOutcome::Created(_))
    }
}

/// Reads and writes config files for one host.
pub struct ConfigStore {
    host_name: String,
    data_root: PathBuf,
    codec: Arc<Codec>,
    keep_backup: bool,
}

impl ConfigStore {
    /// Create a store for the host `host_name` whose own data lives in `data_root`.
    pub fn new(host_name: impl Into<String>, data_root: impl Into<PathBuf>, codec: Arc<Codec>) -> Self {
        Self {
            host_name: host_name.into(),
            data_root: data_root.into(),
            codec,
            keep_backup: false,
        }
    }

    /// Keep a `.bak` copy of the previous content on every overwrite.
    pub fn with_backups(mut self, keep_backup: bool) -> Self {
        self.keep_backup = keep_backup;
        self
    }

    pub fn host_name(&self) -> &str {
        &self.host_name
    }

    pub fn data_root(&self) -> &Path {
        &self.data_root
    }

    pub fn codec(&self) -> &Arc<Codec> {
        &self.codec
    }

    // ========================================
    // Path helpers
    // ========================================

    /// Directory that holds every host's folder.
    fn shared_root(&self) -> &Path {
        match self.data_root.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => &self.data_root,
        }
    }

    /// Folder for configs of `group_name`, or of this host when ungrouped.
    pub fn folder_for(&self, group_name: Option<&str>) -> PathBuf {
        let folder = group_name
            .filter(|g| !g.is_empty())
            .unwrap_or(self.host_name.as_str());
        self.shared_root().join(folder)
    }

    pub fn folder_for_descriptor(&self, descriptor: &ConfigDescriptor) -> PathBuf {
        self.folder_for(descriptor.group_name())
    }

    pub fn config_path(&self, group_name: Option<&str>, file_name: &str) -> PathBuf {
        self.folder_for(group_name).join(file_name)
    }

    pub fn list_path(&self, file_name: &str) -> PathBuf {
        self.data_root.join(file_name)
    }

    // ========================================
    // Text I/O
    // ========================================

    /// Create `path` and its parents. Failure is logged and reported as `false`.
    pub fn ensure_dir(&self, path: &Path) -> bool {
        if path.is_dir() {
            return true;
        }
        match std::fs::create_dir_all(path) {
            Ok(()) => {
                debug!("Created directory: {}", path.display());
                true
            }
            Err(e) => {
                error!("Failed to create directory {}: {}", path.display(), e);
                false
            }
        }
    }

    pub fn read_text(&self, path: &Path) -> Result<String> {
        read_text(path)
    }

    pub fn write_text(&self, path: &Path, text: &str) -> Result<()> {
        write_text_atomic(path, text, self.keep_backup)
    }

    // ========================================
    // Config values
    // ========================================

    /// Decode the existing file at `path`.
    pub fn load_existing<T: ConfigValue>(&self, path: &Path) -> Result<T> {
        let text = self.read_text(path)?;
        self.codec.decode(&text).map_err(|e| with_path_context(e, path))
    }

    /// Encode `value` and write it to `path`, creating its folder first.
    pub fn save_value<T: Serialize + 'static>(&self, path: &Path, value: &T) -> Result<()> {
        if let Some(folder) = path.parent() {
            self.ensure_dir(folder);
        }
        let text = self.codec.encode(value)?;
        self.write_text(path, &text)
    }

    /// Load `file_name` from the folder of `group_name`, writing a default
    /// first when the file does not exist.
    ///
    /// An unreadable or undecodable existing file is an error; it is never
    /// replaced by a default here.
    pub fn load_or_create<T: ConfigValue>(
        &self,
        group_name: Option<&str>,
        file_name: &str,
    ) -> Result<LoadOutcome<T>> {
        let folder = self.folder_for(group_name);
        self.ensure_dir(&folder);
        let path = folder.join(file_name);

        if !path.exists() {
            warn!("Config file not found, creating a new one: {}", path.display());
            let value = T::create_default()?;
            self.save_value(&path, &value)?;
            return Ok(LoadOutcome::Created(value));
        }

        debug!("Loading {} from {}", type_name::<T>(), path.display());
        self.load_existing(&path).map(LoadOutcome::Loaded)
    }

    // ========================================
    // Config lists
    // ========================================

    /// Save `list` as a JSON array under the data root.
    pub fn save_list<T: Serialize + 'static>(&self, list: &[T], file_name: &str) -> Result<()> {
        self.ensure_dir(&self.data_root);
        let path = self.list_path(file_name);
        let text = self.codec.encode_list(list)?;
        self.write_text(&path, &text)?;
        info!("Config list saved to {}", path.display());
        Ok(())
    }

    /// Load a JSON array from the data root. A missing file is created
    /// holding an empty array.
    pub fn load_list<T: DeserializeOwned + Serialize + 'static>(
        &self,
        file_name: &str,
    ) -> Result<Vec<T>> {
        let path = self.list_path(file_name);
        if !path.exists() {
            warn!(
                "Config list file not found, creating a new one with empty list: {}",
                file_name
            );
            let empty: Vec<T> = Vec::new();
            self.save_list(&empty, file_name)?;
            return Ok(empty);
        }

        let text = self.read_text(&path)?;
        self.codec
            .decode_list(&text)
            .map_err(|e| with_path_context(e, &path))
    }
}

fn with_path_context(err: ConfigError, path: &Path) -> ConfigError {
    match err {
        ConfigError::Parse { message, source } => ConfigError::Parse {
            message: format!("{} ({})", message, path.display()),
            source,
        },
        other => other,
    }
}
