//! Type-erased registry entries.

use crate::codec::Codec;
use crate::descriptor::ConfigValue;
use crate::error::{ConfigError, Result};
use crate::persistence::ConfigStore;
use std::any::{type_name, Any, TypeId};
use std::path::Path;
use std::sync::{Arc, RwLock};

/// Shared, live handle to a registered config value.
///
/// Mutations made through the handle are what [`save`](crate::ConfigRegistry::save)
/// writes out, and a successful reload replaces the value behind it.
///
/// Drop any guard taken from a handle before calling back into the registry.
/// `save`, `save_all`, `load_all`, `reload`, `reload_all` and `get_all_of_type`
/// lock the values they touch while holding the registry lock, so calling
/// them with a live write guard (or, for the reloads, a read guard) on the
/// same thread deadlocks:
///
/// ```rust,ignore
/// let config = registry.get::<ExampleConfig>("exampleConfig.json")?;
/// {
///     let mut value = config.write().unwrap();
///     value.example_int = 99;
/// } // guard dropped here
/// registry.save("exampleConfig.json")?;
/// ```
pub type ConfigHandle<T> = Arc<RwLock<T>>;

/// Operations the registry needs on a value without knowing its type.
pub(crate) trait ErasedConfig: Send + Sync {
    fn as_any(&self) -> &dyn Any;

    fn type_name(&self) -> &'static str;

    fn encode(&self, codec: &Codec) -> Result<String>;

    /// Replace the value with the decoded content of `path`.
    fn reload(&self, store: &ConfigStore, path: &Path) -> Result<()>;

    /// Replace the value with a fresh default and write it to `path`.
    fn recreate(&self, store: &ConfigStore, path: &Path) -> Result<()>;

    /// Call `visit` with the value viewed as `target`, if it is one.
    fn visit_as(&self, target: TypeId, visit: &mut dyn FnMut(&dyn Any)) -> Result<()>;
}

struct TypedConfig<T: ConfigValue> {
    handle: ConfigHandle<T>,
}

impl<T: ConfigValue> TypedConfig<T> {
    fn poisoned() -> ConfigError {
        ConfigError::LockPoisoned(format!("config value {}", type_name::<T>()))
    }

    fn replace(&self, value: T) -> Result<()> {
        let mut guard = self.handle.write().map_err(|_| Self::poisoned())?;
        *guard = value;
        Ok(())
    }
}

impl<T: ConfigValue> ErasedConfig for TypedConfig<T> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn type_name(&self) -> &'static str {
        type_name::<T>()
    }

    fn encode(&self, codec: &Codec) -> Result<String> {
        let guard = self.handle.read().map_err(|_| Self::poisoned())?;
        codec.encode(&*guard)
    }

    fn reload(&self, store: &ConfigStore, path: &Path) -> Result<()> {
        let value: T = store.load_existing(path)?;
        self.replace(value)
    }

    fn recreate(&self, store: &ConfigStore, path: &Path) -> Result<()> {
        let value = T::create_default()?;
        store.save_value(path, &value)?;
        self.replace(value)
    }

    fn visit_as(&self, target: TypeId, visit: &mut dyn FnMut(&dyn Any)) -> Result<()> {
        let guard = self.handle.read().map_err(|_| Self::poisoned())?;
        if let Some(view) = guard.view_as(target) {
            visit(view);
        }
        Ok(())
    }
}

/// One tracked config file.
pub(crate) struct ConfigEntry {
    group_name: Option<String>,
    value: Box<dyn ErasedConfig>,
}

impl ConfigEntry {
    pub(crate) fn new<T: ConfigValue>(group_name: Option<String>, handle: ConfigHandle<T>) -> Self {
        Self {
            group_name,
            value: Box::new(TypedConfig { handle }),
        }
    }

    pub(crate) fn group_name(&self) -> Option<&str> {
        self.group_name.as_deref()
    }

    pub(crate) fn type_name(&self) -> &'static str {
        self.value.type_name()
    }

    /// The handle, if this entry holds exactly a `T`.
    pub(crate) fn handle<T: ConfigValue>(&self) -> Option<ConfigHandle<T>> {
        self.value
            .as_any()
            .downcast_ref::<TypedConfig<T>>()
            .map(|typed| Arc::clone(&typed.handle))
    }

    pub(crate) fn value(&self) -> &dyn ErasedConfig {
        self.value.as_ref()
    }
}
