use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tierline_quote::{CompiledRules, RuleRow};
use tierline_shared::PricingRequest;
use tierline_store::{compile_rules_file, Config, Engine};

#[derive(Debug, Parser)]
#[command(name = "tierline")]
#[command(about = "Account tier pricing and order policy resolution")]
pub struct Cli {
    /// Reference data directory, overrides `data.root` from configuration
    #[arg(long, global = true)]
    pub data: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Price a request and resolve its order policy
    Quote {
        /// JSON pricing request
        #[arg(long)]
        request: PathBuf,
    },

    /// Resolve the pricing tier for an account, with its trace
    Tier { account: String },

    /// Freight and terms hints for an account
    Intel { account: String },

    /// Compile the rule table into the artifact the engine loads
    CompileRules {
        /// Defaults to the configured rule source
        #[arg(long)]
        input: Option<PathBuf>,
        /// Defaults to the configured compiled rules path
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Check a candidate rule against the catalog and the loaded rules
    ValidateRule {
        /// JSON object with the rule table columns as string values
        #[arg(long)]
        rule: PathBuf,
        /// Date used for the expiry check, defaults to today
        #[arg(long)]
        today: Option<NaiveDate>,
    },
}

#[derive(Debug, Serialize)]
struct CompileSummary {
    source_file: String,
    output: String,
    total_rules: usize,
    active_rules: usize,
}

impl CompileSummary {
    fn new(compiled: &CompiledRules, output: &Path) -> Self {
        Self {
            source_file: compiled.source_file.clone(),
            output: output.display().to_string(),
            total_rules: compiled.total_rules,
            active_rules: compiled.active_rules,
        }
    }
}

/// Configuration for a parsed command line
pub fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::load().context("failed to load configuration")?;
    if let Some(root) = &cli.data {
        config.data.root = root.clone();
    }
    Ok(config)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("failed to parse {}", path.display()))
}

fn load_engine(config: &Config) -> Result<Engine> {
    Engine::load(config).with_context(|| format!("failed to load reference data from {}", config.data.root.display()))
}

/// Run one command and return its JSON output
pub fn execute(config: &Config, command: &Command) -> Result<serde_json::Value> {
    let value = match command {
        Command::Quote { request } => {
            let request: PricingRequest = read_json(request)?;
            tracing::info!(account_id = %request.account_id, items = request.items.len(), "quote");
            serde_json::to_value(load_engine(config)?.price(&request))?
        }
        Command::Tier { account } => serde_json::to_value(load_engine(config)?.tier(account))?,
        Command::Intel { account } => serde_json::to_value(load_engine(config)?.intel(account))?,
        Command::CompileRules { input, output } => {
            let input = input.clone().unwrap_or_else(|| config.data.rules_source_path());
            let output = output.clone().unwrap_or_else(|| config.data.compiled_rules_path());
            let compiled = compile_rules_file(&input, &output)
                .with_context(|| format!("failed to compile {}", input.display()))?;
            serde_json::to_value(CompileSummary::new(&compiled, &output))?
        }
        Command::ValidateRule { rule, today } => {
            let candidate: RuleRow = read_json(rule)?;
            let today = today.unwrap_or_else(|| Local::now().date_naive());
            serde_json::to_value(load_engine(config)?.validate_rule(&candidate, today))?
        }
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_subcommands() {
        let cli = Cli::try_parse_from(["tierline", "tier", "11730"]).unwrap();
        assert!(matches!(cli.command, Command::Tier { ref account } if account == "11730"));
        assert!(cli.data.is_none());

        let cli = Cli::try_parse_from(["tierline", "compile-rules", "--output", "out.json", "--data", "/srv/pricing"]).unwrap();
        match cli.command {
            Command::CompileRules { input, output } => {
                assert!(input.is_none());
                assert_eq!(output, Some(PathBuf::from("out.json")));
            }
            other => panic!("unexpected command {:?}", other),
        }
        assert_eq!(cli.data, Some(PathBuf::from("/srv/pricing")));

        let cli = Cli::try_parse_from(["tierline", "validate-rule", "--rule", "r.json", "--today", "2026-03-01"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::ValidateRule { today: Some(d), .. } if d == NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()
        ));
    }

    #[test]
    fn test_quote_requires_request() {
        assert!(Cli::try_parse_from(["tierline", "quote"]).is_err());
    }
}
