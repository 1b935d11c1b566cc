//! Rule compilation: editable CSV rows in, typed and validated rules out.
//!
//! Compilation is all-or-nothing. Every row is checked and every problem is
//! reported with its CSV line number; one bad row fails the whole batch.

use chrono::{DateTime, Local, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::str::FromStr;

use super::{Rule, RuleAction, RuleMatch, DEFAULT_PRIORITY};

/// Problems found in a single rule row
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuleError {
    #[error("Line {line}: {field} is required")]
    Missing { line: usize, field: &'static str },

    #[error("Line {line}: {field} must be an integer")]
    NotInteger { line: usize, field: &'static str },

    #[error("Line {line}: {field} must be YYYY-MM-DD format")]
    BadDate { line: usize, field: &'static str },

    #[error("Line {line}: invalid action_type '{value}', must be one of: {}", RuleAction::KINDS.join(", "))]
    UnknownAction { line: usize, value: String },

    #[error("Line {line}: action_value must be numeric for {action}")]
    NotNumeric { line: usize, action: String },

    #[error("Line {line}: start_date {start} is after end_date {end}")]
    InvertedDates { line: usize, start: NaiveDate, end: NaiveDate },

    #[error("Line {line}: duplicate rule_id '{rule_id}'")]
    DuplicateId { line: usize, rule_id: String },
}

/// A batch that failed validation; nothing was produced
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("rule compilation failed with {} error(s)", .errors.len())]
pub struct CompileError {
    pub errors: Vec<RuleError>,
}

/// One row of the editable rule table. Cells are kept as text until compiled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleRow {
    pub rule_id: Option<String>,
    pub name: Option<String>,
    pub active: Option<String>,
    pub priority: Option<String>,
    pub account: Option<String>,
    pub account_group: Option<String>,
    pub sku: Option<String>,
    pub sku_prefix: Option<String>,
    pub brand: Option<String>,
    pub min_qty: Option<String>,
    pub max_qty: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub channel: Option<String>,
    pub action_type: Option<String>,
    pub action_value: Option<String>,
    pub notes: Option<String>,
}

/// Trimmed cell text, `None` when blank
pub(crate) fn cell(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

pub(crate) fn parse_bool(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes" | "on")
}

pub(crate) fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}

/// Build a typed action from its kind and raw value
pub fn parse_action(kind: &str, value: &str) -> Option<RuleAction> {
    let value = value.trim();
    if kind == "set_tier" {
        return (!value.is_empty()).then(|| RuleAction::SetTier(value.to_string()));
    }
    let amount = Decimal::from_str(value).ok()?;
    match kind {
        "override_unit_price" => Some(RuleAction::OverrideUnitPrice(amount)),
        "discount_percent" => Some(RuleAction::DiscountPercent(amount)),
        "discount_amount" => Some(RuleAction::DiscountAmount(amount)),
        "price_floor" => Some(RuleAction::PriceFloor(amount)),
        _ => None,
    }
}

impl RuleRow {
    /// Validate the row and build a rule. `line` is the CSV line number used in errors.
    pub fn compile(&self, line: usize) -> Result<Rule, Vec<RuleError>> {
        let mut errors = Vec::new();

        let rule_id = cell(&self.rule_id);
        if rule_id.is_none() {
            errors.push(RuleError::Missing { line, field: "rule_id" });
        }

        let priority = match cell(&self.priority) {
            None => DEFAULT_PRIORITY,
            Some(raw) => raw.parse::<i32>().unwrap_or_else(|_| {
                errors.push(RuleError::NotInteger { line, field: "priority" });
                DEFAULT_PRIORITY
            }),
        };

        let mut quantity = |raw: &Option<String>, field: &'static str| -> Option<u32> {
            let raw = cell(raw)?;
            match raw.parse::<u32>() {
                Ok(qty) => Some(qty),
                Err(_) => {
                    errors.push(RuleError::NotInteger { line, field });
                    None
                }
            }
        };
        let min_qty = quantity(&self.min_qty, "min_qty");
        let max_qty = quantity(&self.max_qty, "max_qty");

        let mut date = |raw: &Option<String>, field: &'static str| -> Option<NaiveDate> {
            let raw = cell(raw)?;
            let parsed = parse_date(raw);
            if parsed.is_none() {
                errors.push(RuleError::BadDate { line, field });
            }
            parsed
        };
        let start_date = date(&self.start_date, "start_date");
        let end_date = date(&self.end_date, "end_date");

        if let (Some(start), Some(end)) = (start_date, end_date) {
            if start > end {
                errors.push(RuleError::InvertedDates { line, start, end });
            }
        }

        let action = match cell(&self.action_type) {
            None => {
                errors.push(RuleError::Missing { line, field: "action_type" });
                None
            }
            Some(kind) if !RuleAction::KINDS.contains(&kind) => {
                errors.push(RuleError::UnknownAction {
                    line,
                    value: kind.to_string(),
                });
                None
            }
            Some(kind) => match cell(&self.action_value) {
                None => {
                    errors.push(RuleError::Missing { line, field: "action_value" });
                    None
                }
                Some(value) => {
                    let action = parse_action(kind, value);
                    if action.is_none() {
                        errors.push(RuleError::NotNumeric {
                            line,
                            action: kind.to_string(),
                        });
                    }
                    action
                }
            },
        };

        match (rule_id, action) {
            (Some(rule_id), Some(action)) if errors.is_empty() => Ok(Rule {
                rule_id: rule_id.to_string(),
                name: cell(&self.name).unwrap_or(rule_id).to_string(),
                active: cell(&self.active).map(parse_bool).unwrap_or(false),
                priority,
                conditions: RuleMatch {
                    account: cell(&self.account).map(str::to_string),
                    account_group: cell(&self.account_group).map(str::to_string),
                    sku: cell(&self.sku).map(str::to_string),
                    sku_prefix: cell(&self.sku_prefix).map(str::to_string),
                    brand: cell(&self.brand).map(str::to_string),
                    min_qty,
                    max_qty,
                    start_date,
                    end_date,
                    channel: cell(&self.channel).map(str::to_string),
                },
                action,
                notes: cell(&self.notes).unwrap_or_default().to_string(),
            }),
            _ => Err(errors),
        }
    }
}

/// Compile a batch of rows in table order.
///
/// Line numbers count the header as line 1. On success the rules are
/// stably sorted by priority.
pub fn compile_rows(rows: &[RuleRow]) -> Result<Vec<Rule>, CompileError> {
    let mut errors = Vec::new();
    let mut rules = Vec::with_capacity(rows.len());
    let mut seen = HashSet::new();

    for (index, row) in rows.iter().enumerate() {
        let line = index + 2;
        match row.compile(line) {
            Ok(rule) => {
                if !seen.insert(rule.rule_id.clone()) {
                    errors.push(RuleError::DuplicateId {
                        line,
                        rule_id: rule.rule_id,
                    });
                    continue;
                }
                rules.push(rule);
            }
            Err(row_errors) => errors.extend(row_errors),
        }
    }

    if !errors.is_empty() {
        tracing::warn!(errors = errors.len(), "rule compilation failed");
        return Err(CompileError { errors });
    }

    rules.sort_by_key(|r| r.priority);
    Ok(rules)
}

/// The compiled rule artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledRules {
    pub compiled_at: DateTime<Local>,
    pub source_file: String,
    pub total_rules: usize,
    pub active_rules: usize,
    pub rules: Vec<Rule>,
}

impl CompiledRules {
    pub fn new(source_file: impl Into<String>, rules: Vec<Rule>) -> Self {
        Self {
            compiled_at: Local::now(),
            source_file: source_file.into(),
            total_rules: rules.len(),
            active_rules: rules.iter().filter(|r| r.active).count(),
            rules,
        }
    }
}

/// Rules read back from an artifact
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadedRules {
    pub rules: Vec<Rule>,
    /// Ids (or positions) of entries that could not be read
    pub skipped: Vec<String>,
}

#[derive(Deserialize)]
struct ArtifactEnvelope {
    #[serde(default)]
    rules: Vec<serde_json::Value>,
}

/// Parse a compiled artifact. Entries that do not form a valid rule are
/// skipped with a warning; the rest are returned in artifact order.
pub fn load_compiled(json: &str) -> Result<LoadedRules, serde_json::Error> {
    let envelope: ArtifactEnvelope = serde_json::from_str(json)?;
    let mut loaded = LoadedRules::default();

    for (position, value) in envelope.rules.into_iter().enumerate() {
        let label = value
            .get("rule_id")
            .and_then(|id| id.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| format!("#{}", position));

        match serde_json::from_value::<Rule>(value) {
            Ok(rule) => loaded.rules.push(rule),
            Err(e) => {
                tracing::warn!(rule = %label, error = %e, "skipping unreadable compiled rule");
                loaded.skipped.push(label);
            }
        }
    }

    Ok(loaded)
}
