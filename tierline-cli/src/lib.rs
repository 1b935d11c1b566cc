pub mod commands;

pub use commands::{execute, load_config, Cli, Command};
