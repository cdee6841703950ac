//! Centralized constants for the config registry.

/// On-disk storage constants.
pub struct StoreConfig;

impl StoreConfig {
    /// Extension appended to a config file name for its backup copy.
    pub const BACKUP_EXTENSION: &'static str = "bak";
    /// Prefix of the sibling temp file used for atomic replacement.
    pub const TEMP_FILE_PREFIX: &'static str = ".karasu-";
    /// Suffix of the sibling temp file used for atomic replacement.
    pub const TEMP_FILE_SUFFIX: &'static str = ".tmp";
}

/// Registry-level defaults.
pub struct RegistryConfig;

impl RegistryConfig {
    pub const DEFAULT_AUTO_CREATE_DIRS: bool = true;
    pub const DEFAULT_KEEP_BACKUP: bool = false;
    pub const DEFAULT_FALLBACK_TO_DEFAULT_ON_CORRUPT: bool = false;
}
