use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::policy::OrderPolicy;
use super::trace::{render_trace, TraceStep};

/// Where a line's unit price came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriceSource {
    /// Negotiated tier price
    Contract,
    #[serde(rename = "MSRP")]
    Msrp,
    /// Modified by at least one price rule
    Rule,
}

/// A single priced line of a quote
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub sku: String,
    pub description: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub extended_price: Decimal,
    pub tier_used: String,
    pub source: PriceSource,
    pub rules_applied: Vec<String>,
    pub warnings: Vec<String>,
    pub configuration: Option<BTreeMap<String, String>>,
    pub trace: Vec<TraceStep>,
}

impl LineItem {
    pub fn new(sku: impl Into<String>, description: impl Into<String>, quantity: u32, tier: impl Into<String>) -> Self {
        Self {
            sku: sku.into(),
            description: description.into(),
            quantity,
            unit_price: Decimal::ZERO,
            extended_price: Decimal::ZERO,
            tier_used: tier.into(),
            source: PriceSource::Contract,
            rules_applied: Vec::new(),
            warnings: Vec::new(),
            configuration: None,
            trace: Vec::new(),
        }
    }

    pub fn add_trace(&mut self, step: &str, description: impl Into<String>, value: Option<String>) {
        self.trace.push(TraceStep::new(step, description, value));
    }

    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    pub fn trace_text(&self) -> String {
        render_trace(&self.trace, "→")
    }
}

/// Freight and terms hints for an account, group or the global default
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountIntel {
    pub match_value: String,
    pub freight: String,
    pub terms: String,
    pub notes: String,
}

impl AccountIntel {
    /// Record returned when no intel row applies
    pub fn unknown() -> Self {
        Self {
            match_value: String::new(),
            freight: "Unknown".to_string(),
            terms: "Unknown".to_string(),
            notes: String::new(),
        }
    }
}

/// Complete result of pricing one request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingResult {
    pub account_id: String,
    pub tier: String,
    pub total: Decimal,
    pub lines: Vec<LineItem>,
    pub intel: AccountIntel,
    pub policy: OrderPolicy,
    pub warnings: Vec<String>,
    pub trace: Vec<TraceStep>,
}

impl PricingResult {
    pub fn new(account_id: impl Into<String>, tier: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            tier: tier.into(),
            total: Decimal::ZERO,
            lines: Vec::new(),
            intel: AccountIntel::unknown(),
            policy: OrderPolicy::default(),
            warnings: Vec::new(),
            trace: Vec::new(),
        }
    }

    /// Append a priced line, accumulate the total and bubble up its warnings
    pub fn push_line(&mut self, line: LineItem) {
        self.total += line.extended_price;
        for warning in &line.warnings {
            self.add_warning(warning.clone());
        }
        self.lines.push(line);
    }

    /// Add a warning unless the exact same text is already present
    pub fn add_warning(&mut self, warning: impl Into<String>) {
        let warning = warning.into();
        if !self.warnings.contains(&warning) {
            self.warnings.push(warning);
        }
    }

    pub fn add_trace(&mut self, step: &str, description: impl Into<String>, value: Option<String>) {
        self.trace.push(TraceStep::new(step, description, value));
    }

    pub fn trace_text(&self) -> String {
        render_trace(&self.trace, "•")
    }
}
