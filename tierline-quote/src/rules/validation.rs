//! Pre-save checks for a candidate rule.
//!
//! Unlike compilation this never fails: it reports blocking errors and
//! advisory warnings so an editor can show both.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tierline_catalog::Catalog;

use super::compiler::{cell, parse_date, RuleRow};
use super::{Rule, RuleAction};

/// Outcome of validating a candidate rule
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleValidation {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    /// Catalog SKUs the candidate would touch
    pub matching_products: usize,
}

impl RuleValidation {
    fn error(&mut self, message: impl Into<String>) {
        self.valid = false;
        self.errors.push(message.into());
    }
}

/// Validates candidate rules against the catalog and the current rule set
#[derive(Debug, Clone, Copy)]
pub struct RuleValidator<'a> {
    catalog: &'a Catalog,
    existing: &'a [Rule],
}

impl<'a> RuleValidator<'a> {
    pub fn new(catalog: &'a Catalog, existing: &'a [Rule]) -> Self {
        Self { catalog, existing }
    }

    /// Validate an edit to a rule, which may keep its existing id
    pub fn validate(&self, candidate: &RuleRow, today: NaiveDate) -> RuleValidation {
        let mut result = RuleValidation {
            valid: true,
            ..Default::default()
        };

        if cell(&candidate.name).is_none() {
            result.error("Name is required");
        }

        let action_type = cell(&candidate.action_type);
        let action_value = cell(&candidate.action_value);
        match action_type {
            None => result.error("Action type is required"),
            Some(kind) if !RuleAction::KINDS.contains(&kind) => {
                result.error(format!("Unknown action type '{}'", kind));
            }
            Some(_) => {}
        }
        match (action_type, action_value) {
            (_, None) => result.error("Action value is required"),
            (Some(kind), Some(value)) if kind != "set_tier" && Decimal::from_str(value).is_err() => {
                result.error(format!("Action value must be a number for {}", kind));
            }
            _ => {}
        }

        let start = cell(&candidate.start_date);
        let end = cell(&candidate.end_date);
        for (field, raw) in [("Start date", start), ("End date", end)] {
            if let Some(raw) = raw {
                if parse_date(raw).is_none() {
                    result.error(format!("{} must be YYYY-MM-DD", field));
                }
            }
        }
        let start = start.and_then(parse_date);
        let end = end.and_then(parse_date);
        if let (Some(start), Some(end)) = (start, end) {
            if start > end {
                result.error("Start date must be before end date");
            }
        }
        if end.is_some_and(|end| end < today) {
            result.warnings.push("Rule has expired (end date is in the past)".to_string());
        }

        if let Some(sku) = cell(&candidate.sku) {
            if sku == "*" {
                result.matching_products = self.catalog.len();
            } else if self.catalog.contains(sku) {
                result.matching_products = 1;
            } else {
                result.matching_products = 0;
                if !self.catalog.is_empty() {
                    result.warnings.push(format!("SKU '{}' not found in catalog", sku));
                }
            }
        }

        if let Some(prefix) = cell(&candidate.sku_prefix) {
            result.matching_products = self.catalog.count_prefix(prefix);
            if result.matching_products == 0 && !self.catalog.is_empty() {
                result.warnings.push(format!("No products match SKU prefix '{}'", prefix));
            }
        }

        if result.valid {
            let conflicts = self.conflicts(candidate);
            result.warnings.extend(conflicts);
        }
        result
    }

    /// Validate a rule about to be created; its id must be new
    pub fn validate_new(&self, candidate: &RuleRow, today: NaiveDate) -> RuleValidation {
        let mut result = self.validate(candidate, today);
        if let Some(id) = cell(&candidate.rule_id) {
            if self.existing.iter().any(|r| r.rule_id == id) {
                result.error(format!("Rule '{}' already exists", id));
            }
        }
        result
    }

    /// Existing rules that target the same account or group and overlap on SKU
    fn conflicts(&self, candidate: &RuleRow) -> Vec<String> {
        let id = cell(&candidate.rule_id);
        let account = cell(&candidate.account);
        let group = cell(&candidate.account_group);
        let sku = cell(&candidate.sku);
        let prefix = cell(&candidate.sku_prefix);
        let priority = cell(&candidate.priority).unwrap_or("50");

        self.existing
            .iter()
            .filter(|existing| Some(existing.rule_id.as_str()) != id)
            .filter(|existing| {
                let theirs = &existing.conditions;
                let same_target = (account.is_some() && account == theirs.account.as_deref())
                    || (group.is_some() && group == theirs.account_group.as_deref());
                let overlapping_sku = (sku.is_some() && sku == theirs.sku.as_deref())
                    || match (prefix, theirs.sku_prefix.as_deref()) {
                        (Some(ours), Some(theirs)) => ours.starts_with(theirs) || theirs.starts_with(ours),
                        _ => false,
                    };
                same_target && overlapping_sku
            })
            .map(|existing| {
                format!(
                    "Potential conflict with rule '{}' (priority {} vs {})",
                    existing.rule_id, existing.priority, priority
                )
            })
            .collect()
    }

    /// Propose an unused id from the candidate's target and SKU
    pub fn suggest_rule_id(&self, candidate: &RuleRow) -> String {
        let mut base = if let Some(group) = cell(&candidate.account_group) {
            group.to_uppercase().chars().take(4).collect::<String>()
        } else if let Some(account) = cell(&candidate.account) {
            format!("ACCT{}", account)
        } else {
            "RULE".to_string()
        };

        if let Some(sku) = cell(&candidate.sku) {
            base.push('-');
            base.extend(sku.chars().take(8));
        } else if let Some(prefix) = cell(&candidate.sku_prefix) {
            base.push('-');
            base.extend(prefix.chars().take(6));
        }

        let taken = |id: &str| self.existing.iter().any(|r| r.rule_id == id);
        let mut candidate_id = base.clone();
        let mut counter = 1;
        while taken(&candidate_id) {
            candidate_id = format!("{}-{}", base, counter);
            counter += 1;
        }
        candidate_id
    }
}
