use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};
use tierline_order::PolicyConfig;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub policy: PolicyConfig,
}

/// Locations of the reference tables, relative to `root`
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DataConfig {
    pub root: PathBuf,
    pub catalog: String,
    pub tier_map: String,
    pub group_members: String,
    pub account_intel: String,
    pub rules_source: String,
    pub compiled_rules: String,
    pub policy_dir: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("data"),
            catalog: "catalog.csv".into(),
            tier_map: "program_map.csv".into(),
            group_members: "group_members.csv".into(),
            account_intel: "account_intel.csv".into(),
            rules_source: "rules.csv".into(),
            compiled_rules: "compiled_rules.json".into(),
            policy_dir: "policy".into(),
        }
    }
}

impl DataConfig {
    pub fn catalog_path(&self) -> PathBuf {
        self.root.join(&self.catalog)
    }

    pub fn tier_map_path(&self) -> PathBuf {
        self.root.join(&self.tier_map)
    }

    pub fn group_members_path(&self) -> PathBuf {
        self.root.join(&self.group_members)
    }

    pub fn account_intel_path(&self) -> PathBuf {
        self.root.join(&self.account_intel)
    }

    pub fn rules_source_path(&self) -> PathBuf {
        self.root.join(&self.rules_source)
    }

    pub fn compiled_rules_path(&self) -> PathBuf {
        self.root.join(&self.compiled_rules)
    }

    /// A table inside the policy directory
    pub fn policy_path(&self, file: &str) -> PathBuf {
        self.root.join(&self.policy_dir).join(file)
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // Per-environment overrides are optional
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // Eg. `TIERLINE__DATA__ROOT=/srv/pricing` sets `data.root`
            .add_source(config::Environment::with_prefix("TIERLINE").separator("__"))
            .build()?;

        s.try_deserialize()
    }

    /// Default file layout under `root`, default policy settings
    pub fn from_data_root(root: impl AsRef<Path>) -> Self {
        Self {
            data: DataConfig {
                root: root.as_ref().to_path_buf(),
                ..Default::default()
            },
            policy: PolicyConfig::default(),
        }
    }
}
