//! Config types declared by the reference host.

use karasu_config::{ConfigDescriptor, ConfigValue};
use serde::{Deserialize, Serialize};
use std::any::{Any, TypeId};

/// Group shared by every plugin built on this library.
pub const GROUP_NAME: &str = "KarasuConfigLib";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExampleConfig {
    pub example_string: String,
    pub example_int: i32,
    pub example_boolean: bool,
}

impl Default for ExampleConfig {
    fn default() -> Self {
        Self {
            example_string: "defaultString".to_string(),
            example_int: 42,
            example_boolean: true,
        }
    }
}

impl ConfigValue for ExampleConfig {
    fn descriptor() -> Option<ConfigDescriptor> {
        Some(
            ConfigDescriptor::new::<Self>("exampleConfig.json")
                .with_group(GROUP_NAME)
                .with_description("Example configuration"),
        )
    }
}

/// Base for configs that carry a display name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExampleBaseConfig {
    pub display_name: String,
}

impl Default for ExampleBaseConfig {
    fn default() -> Self {
        Self {
            display_name: "Example".to_string(),
        }
    }
}

impl ConfigValue for ExampleBaseConfig {
    fn descriptor() -> Option<ConfigDescriptor> {
        Some(
            ConfigDescriptor::new::<Self>("exampleBaseConfig.json")
                .with_group(GROUP_NAME)
                .with_description("Base configuration"),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TestConfig {
    #[serde(flatten)]
    pub base: ExampleBaseConfig,
    pub foo: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            base: ExampleBaseConfig {
                display_name: "Test".to_string(),
            },
            foo: "bar".to_string(),
        }
    }
}

impl ConfigValue for TestConfig {
    fn descriptor() -> Option<ConfigDescriptor> {
        Some(
            ConfigDescriptor::new::<Self>("testConfig.json")
                .with_group(GROUP_NAME)
                .with_description("Test configuration"),
        )
    }

    fn view_as(&self, target: TypeId) -> Option<&dyn Any> {
        if target == TypeId::of::<Self>() {
            return Some(self);
        }
        self.base.view_as(target)
    }
}

/// One entry of the host's `profiles.json` list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Profile {
    pub name: String,
    pub enabled: bool,
}

impl ConfigValue for Profile {}
