pub mod app_config;
pub mod error;
pub mod loader;
pub mod rules_repo;
pub mod snapshot;

pub use app_config::{Config, DataConfig};
pub use error::StoreError;
pub use loader::Table;
pub use rules_repo::{compile_rules_file, load_rules, read_rule_rows};
pub use snapshot::{Engine, EngineHandle};
