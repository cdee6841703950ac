//! The reference plugin host.

use crate::configs::{ExampleBaseConfig, ExampleConfig, TestConfig};
use karasu_config::{ConfigHost, DefaultConfig};
use std::path::PathBuf;

pub struct ExamplePlugin {
    name: String,
    data_root: PathBuf,
}

impl ExamplePlugin {
    pub fn new(name: impl Into<String>, data_root: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            data_root: data_root.into(),
        }
    }
}

impl ConfigHost for ExamplePlugin {
    fn host_name(&self) -> String {
        self.name.clone()
    }

    fn data_root(&self) -> PathBuf {
        self.data_root.clone()
    }

    fn default_configs(&self) -> Vec<DefaultConfig> {
        vec![
            DefaultConfig::of::<ExampleConfig>(),
            DefaultConfig::of::<ExampleBaseConfig>(),
            DefaultConfig::of::<TestConfig>(),
        ]
    }
}
