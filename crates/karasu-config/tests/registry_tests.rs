//! Integration tests for the ConfigRegistry public interface.
//!
//! Two plugins share a `plugins/` folder; configs in the `KarasuConfigLib`
//! group land in a folder both can see.

use karasu_config::{
    Codec, ConfigDescriptor, ConfigHost, ConfigRegistry, ConfigValue, DefaultConfig, EntryOutcome,
    ErrorKind, FnAdapter,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::any::{Any, TypeId};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

const GROUP: &str = "KarasuConfigLib";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ExampleConfig {
    example_string: String,
    example_int: i32,
    example_boolean: bool,
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
                .with_group(GROUP)
                .with_description("Example configuration"),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
struct ExampleBaseConfig {
    name: String,
}

impl Default for ExampleBaseConfig {
    fn default() -> Self {
        Self {
            name: "base".to_string(),
        }
    }
}

impl ConfigValue for ExampleBaseConfig {
    fn descriptor() -> Option<ConfigDescriptor> {
        Some(ConfigDescriptor::new::<Self>("exampleBaseConfig.json").with_group(GROUP))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
struct TestConfig {
    #[serde(flatten)]
    base: ExampleBaseConfig,
    foo: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            base: ExampleBaseConfig {
                name: "test".to_string(),
            },
            foo: "bar".to_string(),
        }
    }
}

impl ConfigValue for TestConfig {
    fn descriptor() -> Option<ConfigDescriptor> {
        Some(ConfigDescriptor::new::<Self>("testConfig.json").with_group(GROUP))
    }

    fn view_as(&self, target: TypeId) -> Option<&dyn Any> {
        if target == TypeId::of::<Self>() {
            return Some(self);
        }
        self.base.view_as(target)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
struct Profile {
    name: String,
    level: u32,
}

impl ConfigValue for Profile {}

struct TestPlugin {
    name: &'static str,
    root: PathBuf,
}

impl ConfigHost for TestPlugin {
    fn host_name(&self) -> String {
        self.name.to_string()
    }

    fn data_root(&self) -> PathBuf {
        self.root.clone()
    }

    fn default_configs(&self) -> Vec<DefaultConfig> {
        vec![
            DefaultConfig::of::<ExampleConfig>(),
            DefaultConfig::of::<ExampleBaseConfig>(),
            DefaultConfig::of::<TestConfig>(),
        ]
    }
}

/// Create a registry for `name` rooted at `<temp>/plugins/<name>`.
fn create_test_registry(temp_dir: &TempDir, name: &'static str) -> ConfigRegistry {
    let plugin = TestPlugin {
        name,
        root: temp_dir.path().join("plugins").join(name),
    };
    ConfigRegistry::from_host(&plugin)
        .with_codec(Arc::new(Codec::new()))
        .build()
        .expect("Failed to build registry")
}

fn group_dir(temp_dir: &TempDir) -> PathBuf {
    temp_dir.path().join("plugins").join(GROUP)
}

#[test]
fn test_first_start_writes_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let registry = create_test_registry(&temp_dir, "PluginA");

    let config = registry.get_by_type::<ExampleConfig>().unwrap();
    assert_eq!(*config.read().unwrap(), ExampleConfig::default());

    let path = group_dir(&temp_dir).join("exampleConfig.json");
    let on_disk: Value = serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
    assert_eq!(on_disk["exampleString"], "defaultString");
    assert_eq!(on_disk["exampleInt"], 42);
    assert_eq!(on_disk["exampleBoolean"], true);
}

#[test]
fn test_save_and_restart() {
    let temp_dir = TempDir::new().unwrap();
    {
        let registry = create_test_registry(&temp_dir, "PluginA");
        let config = registry.get_by_type::<ExampleConfig>().unwrap();
        config.write().unwrap().example_int = 99;
        registry.save("exampleConfig.json").unwrap();
    }

    let registry = create_test_registry(&temp_dir, "PluginA");
    let config = registry.get_by_type::<ExampleConfig>().unwrap();
    assert_eq!(config.read().unwrap().example_int, 99);
    assert_eq!(config.read().unwrap().example_string, "defaultString");
}

#[test]
fn test_group_folder_is_shared_between_hosts() {
    let temp_dir = TempDir::new().unwrap();
    let plugin_a = create_test_registry(&temp_dir, "PluginA");
    let plugin_b = create_test_registry(&temp_dir, "PluginB");

    let from_a = plugin_a.get_by_type::<ExampleConfig>().unwrap();
    from_a.write().unwrap().example_string = "shared".to_string();
    plugin_a.save("exampleConfig.json").unwrap();

    let from_b = plugin_b.get_by_type::<ExampleConfig>().unwrap();
    assert_eq!(from_b.read().unwrap().example_string, "shared");
    assert_eq!(
        plugin_a.config_path("exampleConfig.json"),
        plugin_b.config_path("exampleConfig.json")
    );
}

#[test]
fn test_get_all_of_base_type() {
    let temp_dir = TempDir::new().unwrap();
    let registry = create_test_registry(&temp_dir, "PluginA");
    registry.on_start().unwrap();

    let mut names: Vec<String> = registry
        .get_all_of_type::<ExampleBaseConfig>()
        .unwrap()
        .into_iter()
        .map(|c| c.name)
        .collect();
    names.sort();
    assert_eq!(names, vec!["base".to_string(), "test".to_string()]);

    let tests = registry.get_all_of_type::<TestConfig>().unwrap();
    assert_eq!(tests.len(), 1);
    assert_eq!(tests[0].foo, "bar");
    assert!(registry.get_all_of_type::<Profile>().unwrap().is_empty());
}

#[test]
fn test_profile_list() {
    let temp_dir = TempDir::new().unwrap();
    let registry = create_test_registry(&temp_dir, "PluginA");

    let mut profiles: Vec<Profile> = registry.load_list("profiles.json").unwrap();
    assert!(profiles.is_empty());
    let path = temp_dir.path().join("plugins").join("PluginA").join("profiles.json");
    assert_eq!(registry.list_path("profiles.json"), path);
    assert_eq!(std::fs::read_to_string(&path).unwrap().trim(), "[]");

    profiles.push(Profile {
        name: "alice".to_string(),
        level: 3,
    });
    registry.save_list(&profiles, "profiles.json").unwrap();

    let reloaded: Vec<Profile> = registry.load_list("profiles.json").unwrap();
    assert_eq!(reloaded, profiles);
}

#[test]
fn test_registration_is_idempotent() {
    let temp_dir = TempDir::new().unwrap();
    let registry = create_test_registry(&temp_dir, "PluginA");

    let first = registry.register::<ExampleConfig>("exampleConfig.json").unwrap();
    let second = registry.register::<ExampleConfig>("exampleConfig.json").unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_type_mismatch_is_reported() {
    let temp_dir = TempDir::new().unwrap();
    let registry = create_test_registry(&temp_dir, "PluginA");
    registry.get_by_type::<ExampleConfig>().unwrap();

    let err = registry.get::<Profile>("exampleConfig.json").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TypeMismatch);
}

#[test]
fn test_deleted_file_is_evicted_then_recreated() {
    let temp_dir = TempDir::new().unwrap();
    let registry = create_test_registry(&temp_dir, "PluginA");
    let config = registry.get_by_type::<ExampleConfig>().unwrap();
    config.write().unwrap().example_int = 7;
    let path = registry.config_path("exampleConfig.json").unwrap();

    std::fs::remove_file(&path).unwrap();
    let report = registry.reload_all().unwrap();
    assert_eq!(report.removed_count(), 1);
    assert!(!registry.contains("exampleConfig.json"));

    let recreated = registry.get_by_type::<ExampleConfig>().unwrap();
    assert_eq!(*recreated.read().unwrap(), ExampleConfig::default());
    assert!(path.is_file());
}

#[test]
fn test_external_edit_is_picked_up_by_reload() {
    let temp_dir = TempDir::new().unwrap();
    let registry = create_test_registry(&temp_dir, "PluginA");
    let config = registry.get_by_type::<ExampleConfig>().unwrap();
    let path = registry.config_path("exampleConfig.json").unwrap();

    std::fs::write(&path, r#"{ "exampleInt": 5, "unknownField": 1 }"#).unwrap();
    registry.reload::<ExampleConfig>("exampleConfig.json").unwrap();

    let value = config.read().unwrap();
    assert_eq!(value.example_int, 5);
    // Fields missing from the file take their defaults
    assert_eq!(value.example_string, "defaultString");
}

#[test]
fn test_corrupt_file_is_not_overwritten() {
    let temp_dir = TempDir::new().unwrap();
    let dir = group_dir(&temp_dir);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("exampleConfig.json"), "{ not json").unwrap();

    let registry = create_test_registry(&temp_dir, "PluginA");
    let err = registry.get_by_type::<ExampleConfig>().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ParseFailure);
    assert_eq!(
        std::fs::read_to_string(dir.join("exampleConfig.json")).unwrap(),
        "{ not json"
    );
}

#[test]
fn test_lifecycle() {
    let temp_dir = TempDir::new().unwrap();
    let registry = create_test_registry(&temp_dir, "PluginA");

    let report = registry.on_start().unwrap();
    assert_eq!(report.success_count(), 3);
    assert_eq!(
        registry.file_names(),
        vec![
            "exampleBaseConfig.json".to_string(),
            "exampleConfig.json".to_string(),
            "testConfig.json".to_string(),
        ]
    );

    let test_config = registry.get_by_type::<TestConfig>().unwrap();
    test_config.write().unwrap().foo = "baz".to_string();

    let report = registry.on_stop().unwrap();
    assert_eq!(report.success_count(), 3);
    assert!(report.iter().all(|(_, o)| matches!(o, EntryOutcome::Saved)));

    let text = std::fs::read_to_string(group_dir(&temp_dir).join("testConfig.json")).unwrap();
    assert!(text.contains("baz"));
}

#[test]
fn test_scoped_adapter_shapes_output() {
    let temp_dir = TempDir::new().unwrap();
    let codec = Arc::new(Codec::new());
    codec
        .register_adapter::<Profile>(FnAdapter::new(
            |mut v: Value| {
                if let Some(obj) = v.as_object_mut() {
                    obj.insert("kind".to_string(), Value::from("profile"));
                }
                Ok(v)
            },
            |v: Value| Ok(v),
        ))
        .unwrap();
    let registry = ConfigRegistry::builder("PluginA", temp_dir.path().join("plugins").join("PluginA"))
        .with_codec(codec)
        .build()
        .unwrap();

    registry.register::<Profile>("profile.json").unwrap();
    registry.save("profile.json").unwrap();

    let text = std::fs::read_to_string(registry.config_path("profile.json").unwrap()).unwrap();
    assert!(text.contains("\"kind\": \"profile\""));
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
struct Timeout {
    secs: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
struct NetworkConfig {
    #[serde(with = "karasu_config::codec::adapted")]
    timeout: Timeout,
    retries: u32,
}

impl ConfigValue for NetworkConfig {}

#[test]
fn test_adapter_reaches_nested_config_field() {
    let temp_dir = TempDir::new().unwrap();
    let codec = Arc::new(Codec::new());
    codec
        .register_adapter::<Timeout>(FnAdapter::new(
            |v: Value| Ok(Value::from(format!("{}s", v["secs"].as_u64().unwrap_or_default()))),
            |v: Value| {
                let secs = v
                    .as_str()
                    .and_then(|s| s.trim_end_matches('s').parse::<u64>().ok())
                    .unwrap_or_default();
                Ok(serde_json::json!({ "secs": secs }))
            },
        ))
        .unwrap();
    let registry = ConfigRegistry::builder("PluginA", temp_dir.path().join("plugins").join("PluginA"))
        .with_codec(codec)
        .build()
        .unwrap();

    let network = registry.register::<NetworkConfig>("network.json").unwrap();
    network.write().unwrap().timeout = Timeout { secs: 30 };
    registry.save("network.json").unwrap();

    let path = registry.config_path("network.json").unwrap();
    let on_disk: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(on_disk["timeout"], "30s");

    std::fs::write(&path, r#"{ "timeout": "45s", "retries": 2 }"#).unwrap();
    registry.reload::<NetworkConfig>("network.json").unwrap();
    assert_eq!(network.read().unwrap().timeout, Timeout { secs: 45 });
    assert_eq!(network.read().unwrap().retries, 2);
}
