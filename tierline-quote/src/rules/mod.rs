//! Pricing rules: declarative, date- and context-scoped tier and price
//! modifications applied on top of base tier pricing.

pub mod compiler;
pub mod matcher;
pub mod validation;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Priority given to rules that do not declare one
pub const DEFAULT_PRIORITY: i32 = 50;

fn default_priority() -> i32 {
    DEFAULT_PRIORITY
}

/// A compiled pricing rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub rule_id: String,
    pub name: String,
    #[serde(default)]
    pub active: bool,
    /// Lower number applies first
    #[serde(default = "default_priority")]
    pub priority: i32,
    #[serde(rename = "match", default)]
    pub conditions: RuleMatch,
    pub action: RuleAction,
    #[serde(default)]
    pub notes: String,
}

impl Rule {
    pub fn new(rule_id: impl Into<String>, priority: i32, action: RuleAction) -> Self {
        let rule_id = rule_id.into();
        Self {
            name: rule_id.clone(),
            rule_id,
            active: true,
            priority,
            conditions: RuleMatch::default(),
            action,
            notes: String::new(),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn when(mut self, conditions: RuleMatch) -> Self {
        self.conditions = conditions;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }
}

/// Match conditions. Every declared condition must hold; unset ones are wildcards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleMatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_group: Option<String>,
    /// Exact SKU or `*`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku_prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_qty: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_qty: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    /// `all` or absent matches any channel
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
}

/// What a rule does when it matches
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum RuleAction {
    /// Re-price the line at another tier
    SetTier(String),
    OverrideUnitPrice(Decimal),
    DiscountPercent(Decimal),
    DiscountAmount(Decimal),
    /// Raise the price to at least this value
    PriceFloor(Decimal),
}

impl RuleAction {
    pub const KINDS: [&'static str; 5] = [
        "set_tier",
        "override_unit_price",
        "discount_percent",
        "discount_amount",
        "price_floor",
    ];

    pub fn kind(&self) -> &'static str {
        match self {
            RuleAction::SetTier(_) => "set_tier",
            RuleAction::OverrideUnitPrice(_) => "override_unit_price",
            RuleAction::DiscountPercent(_) => "discount_percent",
            RuleAction::DiscountAmount(_) => "discount_amount",
            RuleAction::PriceFloor(_) => "price_floor",
        }
    }

    pub fn is_set_tier(&self) -> bool {
        matches!(self, RuleAction::SetTier(_))
    }

    pub fn is_price_modifying(&self) -> bool {
        !self.is_set_tier()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_wire_format() {
        let action = RuleAction::OverrideUnitPrice(Decimal::from(267));
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["type"], "override_unit_price");

        let parsed: RuleAction = serde_json::from_str(r#"{"type": "discount_percent", "value": 25.0}"#).unwrap();
        assert_eq!(parsed, RuleAction::DiscountPercent(Decimal::from(25)));

        let tier: RuleAction = serde_json::from_str(r#"{"type": "set_tier", "value": "GOLD"}"#).unwrap();
        assert_eq!(tier, RuleAction::SetTier("GOLD".to_string()));
    }

    #[test]
    fn test_rule_defaults_from_json() {
        let rule: Rule = serde_json::from_str(
            r#"{"rule_id": "R1", "name": "Rule one", "action": {"type": "price_floor", "value": "300"}}"#,
        )
        .unwrap();

        assert_eq!(rule.priority, DEFAULT_PRIORITY);
        assert!(!rule.active);
        assert_eq!(rule.conditions, RuleMatch::default());
    }

    #[test]
    fn test_action_kinds() {
        for kind in RuleAction::KINDS {
            assert!(!kind.is_empty());
        }
        assert_eq!(RuleAction::SetTier("GOLD".into()).kind(), "set_tier");
        assert!(RuleAction::PriceFloor(Decimal::ONE).is_price_modifying());
    }
}
