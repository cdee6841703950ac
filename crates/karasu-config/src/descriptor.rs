//! Config type descriptors.
//!
//! A descriptor tells the registry where a config type lives on disk:
//! - `file_name`: the JSON file holding the type (required, non-empty)
//! - `group_name`: shared folder name; when absent the host's own name is used
//! - `description`: free text, empty by default
//!
//! Types provide their descriptor through [`ConfigValue::descriptor`], or a
//! host registers one centrally with [`DescriptorResolver::register`].

use crate::error::{ConfigError, Result};
use serde::{de::DeserializeOwned, Serialize};
use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;

/// Persistence metadata for one config type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigDescriptor {
    type_id: TypeId,
    type_name: &'static str,
    file_name: String,
    group_name: Option<String>,
    description: String,
}

impl ConfigDescriptor {
    /// Create a descriptor for `T` stored in `file_name`.
    pub fn new<T: 'static>(file_name: impl Into<String>) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            file_name: file_name.into(),
            group_name: None,
            description: String::new(),
        }
    }

    /// Set the group folder. An empty name means "no group".
    pub fn with_group(mut self, group_name: impl Into<String>) -> Self {
        let group_name = group_name.into();
        self.group_name = (!group_name.is_empty()).then_some(group_name);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn group_name(&self) -> Option<&str> {
        self.group_name.as_deref()
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

/// Capability of a value that can be stored in the registry.
///
/// The JSON shape is whatever `serde` derives for the type. Put
/// `#[serde(default)]` on the struct so that fields missing from a file take
/// their default value; unknown fields are ignored unless the type opts into
/// `deny_unknown_fields`.
pub trait ConfigValue:
    Serialize + DeserializeOwned + Default + Clone + Send + Sync + 'static
{
    /// Descriptor attached to the type, if any.
    fn descriptor() -> Option<ConfigDescriptor> {
        None
    }

    /// Produce the value written when a config file does not exist yet.
    ///
    /// Override to make default construction fallible; the error should be
    /// a [`ConfigError::InstantiationFailure`].
    fn create_default() -> Result<Self> {
        Ok(Self::default())
    }

    /// View this value as `target`, which is either `Self` or one of the
    /// base types it embeds.
    ///
    /// A type built on top of another config type forwards to the embedded
    /// base after checking its own id, so that
    /// [`ConfigRegistry::get_all_of_type`](crate::ConfigRegistry::get_all_of_type)
    /// on the base type also yields it:
    ///
    /// ```rust,ignore
    /// fn view_as(&self, target: TypeId) -> Option<&dyn Any> {
    ///     if target == TypeId::of::<Self>() {
    ///         return Some(self);
    ///     }
    ///     self.base.view_as(target)
    /// }
    /// ```
    fn view_as(&self, target: TypeId) -> Option<&dyn Any> {
        if target == TypeId::of::<Self>() {
            Some(self)
        } else {
            None
        }
    }
}

/// Resolves descriptors for config types.
///
/// Centrally registered descriptors take precedence over the ones a type
/// provides itself.
#[derive(Debug, Default)]
pub struct DescriptorResolver {
    registered: HashMap<TypeId, ConfigDescriptor>,
}

impl DescriptorResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a descriptor for the type it was created for.
    pub fn register(&mut self, descriptor: ConfigDescriptor) {
        self.registered.insert(descriptor.type_id(), descriptor);
    }

    /// Get the full descriptor of `T`.
    pub fn resolve<T: ConfigValue>(&self) -> Result<ConfigDescriptor> {
        self.registered
            .get(&TypeId::of::<T>())
            .cloned()
            .or_else(T::descriptor)
            .ok_or_else(|| {
                ConfigError::metadata_missing(type_name::<T>(), "type has no config descriptor")
            })
    }

    /// Get the file name of `T`. Fails when the descriptor is absent or its
    /// file name is empty.
    pub fn file_name<T: ConfigValue>(&self) -> Result<String> {
        let descriptor = self.resolve::<T>()?;
        if descriptor.file_name().is_empty() {
            return Err(ConfigError::metadata_missing(
                type_name::<T>(),
                "descriptor has an empty file name",
            ));
        }
        Ok(descriptor.file_name)
    }

    /// Get the group name of `T`, if it declares a non-empty one.
    pub fn group_name<T: ConfigValue>(&self) -> Option<String> {
        self.resolve::<T>().ok().and_then(|d| d.group_name)
    }

    pub fn description<T: ConfigValue>(&self) -> Result<String> {
        self.resolve::<T>().map(|d| d.description)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde::Deserialize;

    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    struct Described;

    impl ConfigValue for Described {
        fn descriptor() -> Option<ConfigDescriptor> {
            Some(
                ConfigDescriptor::new::<Self>("described.json")
                    .with_group("Shared")
                    .with_description("A described config"),
            )
        }
    }

    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    struct Bare;

    impl ConfigValue for Bare {}

    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    struct Unnamed;

    impl ConfigValue for Unnamed {
        fn descriptor() -> Option<ConfigDescriptor> {
            Some(ConfigDescriptor::new::<Self>("").with_group(""))
        }
    }

    #[test]
    fn test_resolve_type_descriptor() {
        let resolver = DescriptorResolver::new();

        assert_eq!(resolver.file_name::<Described>().unwrap(), "described.json");
        assert_eq!(resolver.group_name::<Described>(), Some("Shared".to_string()));
        assert_eq!(
            resolver.description::<Described>().unwrap(),
            "A described config"
        );
    }

    #[test]
    fn test_missing_descriptor() {
        let resolver = DescriptorResolver::new();

        let err = resolver.resolve::<Bare>().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MetadataMissing);
        assert!(resolver.file_name::<Bare>().is_err());
        assert!(resolver.description::<Bare>().is_err());
        // Group lookups never fail, callers fall back to the host name
        assert_eq!(resolver.group_name::<Bare>(), None);
    }

    #[test]
    fn test_empty_file_name_and_group() {
        let resolver = DescriptorResolver::new();

        assert!(resolver.resolve::<Unnamed>().is_ok());
        let err = resolver.file_name::<Unnamed>().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MetadataMissing);
        assert_eq!(resolver.group_name::<Unnamed>(), None);
        assert_eq!(resolver.description::<Unnamed>().unwrap(), "");
    }

    #[test]
    fn test_registered_descriptor_wins() {
        let mut resolver = DescriptorResolver::new();
        resolver.register(ConfigDescriptor::new::<Bare>("bare.json"));
        resolver.register(ConfigDescriptor::new::<Described>("override.json"));

        assert_eq!(resolver.file_name::<Bare>().unwrap(), "bare.json");
        assert_eq!(resolver.file_name::<Described>().unwrap(), "override.json");
        assert_eq!(resolver.group_name::<Described>(), None);
    }

    #[test]
    fn test_default_view_is_self_only() {
        let value = Described;
        assert!(value.view_as(TypeId::of::<Described>()).is_some());
        assert!(value.view_as(TypeId::of::<Bare>()).is_none());
    }
}
