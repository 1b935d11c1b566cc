//! Rule Matcher
//!
//! Finds the active rules whose conditions hold for a priced line and
//! applies a single rule's action to a running price.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tierline_shared::money::{format_money, round_money};

use super::{Rule, RuleAction};

/// Everything a rule condition can look at
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    pub account_id: &'a str,
    pub groups: &'a [String],
    pub sku: &'a str,
    /// Brand from the catalog, if the product has one
    pub brand: Option<&'a str>,
    pub quantity: u32,
    pub as_of: NaiveDate,
    pub channel: Option<&'a str>,
}

/// Split a comma-joined group list into trimmed, non-empty names
pub fn split_groups(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|g| !g.is_empty())
        .map(str::to_string)
        .collect()
}

/// A rule that matched, with the conditions that made it match
#[derive(Debug, Clone, PartialEq)]
pub struct MatchedRule<'a> {
    pub rule: &'a Rule,
    pub match_reason: String,
}

/// Result of applying one rule to a price
#[derive(Debug, Clone, PartialEq)]
pub struct RuleOutcome {
    pub price: Decimal,
    pub tier: String,
    pub messages: Vec<String>,
    /// Whether the price or tier actually changed
    pub altered: bool,
}

/// Matches active rules against a line context
#[derive(Debug, Clone, Default)]
pub struct RuleMatcher {
    /// Active rules, stably ordered by priority
    rules: Vec<Rule>,
}

impl RuleMatcher {
    pub fn new(rules: Vec<Rule>) -> Self {
        let mut rules: Vec<Rule> = rules.into_iter().filter(|r| r.active).collect();
        rules.sort_by_key(|r| r.priority);
        Self { rules }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// All rules matching the context, ascending by priority.
    /// Rules with equal priority keep their source order.
    pub fn find_matching_rules(&self, ctx: &RuleContext<'_>) -> Vec<MatchedRule<'_>> {
        self.rules
            .iter()
            .filter_map(|rule| {
                match_reasons(rule, ctx).map(|reasons| MatchedRule {
                    rule,
                    match_reason: if reasons.is_empty() {
                        "default".to_string()
                    } else {
                        reasons.join(", ")
                    },
                })
            })
            .collect()
    }
}

/// Reasons a rule matches, or `None` when any declared condition fails
fn match_reasons(rule: &Rule, ctx: &RuleContext<'_>) -> Option<Vec<String>> {
    let cond = &rule.conditions;
    let mut reasons = Vec::new();

    if let Some(account) = non_empty(&cond.account) {
        if account != ctx.account_id.trim() {
            return None;
        }
        reasons.push(format!("account={}", account));
    }

    if let Some(group) = non_empty(&cond.account_group) {
        if !ctx.groups.iter().any(|g| g.trim() == group) {
            return None;
        }
        reasons.push(format!("group={}", group));
    }

    if let Some(sku) = non_empty(&cond.sku) {
        if sku != "*" && sku != ctx.sku {
            return None;
        }
        reasons.push(format!("sku={}", ctx.sku));
    }

    if let Some(prefix) = non_empty(&cond.sku_prefix) {
        if !ctx.sku.starts_with(prefix) {
            return None;
        }
        reasons.push(format!("sku_prefix={}", prefix));
    }

    if let Some(brand) = non_empty(&cond.brand) {
        match ctx.brand {
            Some(actual) if actual.trim().eq_ignore_ascii_case(brand) => {
                reasons.push(format!("brand={}", brand));
            }
            _ => return None,
        }
    }

    if let Some(min) = cond.min_qty {
        if ctx.quantity < min {
            return None;
        }
        reasons.push(format!("qty>={}", min));
    }

    if let Some(max) = cond.max_qty {
        if ctx.quantity > max {
            return None;
        }
        reasons.push(format!("qty<={}", max));
    }

    if let Some(start) = cond.start_date {
        if ctx.as_of < start {
            return None;
        }
        reasons.push(format!("after {}", start));
    }

    if let Some(end) = cond.end_date {
        if ctx.as_of > end {
            return None;
        }
        reasons.push(format!("before {}", end));
    }

    if let Some(channel) = non_empty(&cond.channel) {
        if !channel.eq_ignore_ascii_case("all") {
            match ctx.channel {
                Some(actual) if actual.trim().eq_ignore_ascii_case(channel) => {
                    reasons.push(format!("channel={}", channel));
                }
                _ => return None,
            }
        }
    }

    Some(reasons)
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Apply one rule's action to `base_price`.
///
/// `set_tier` only changes the tier; the caller re-reads the tier price.
pub fn apply_rule_to_price(rule: &Rule, base_price: Decimal, current_tier: &str) -> RuleOutcome {
    let id = &rule.rule_id;
    let mut tier = current_tier.to_string();
    let mut messages = Vec::new();

    let price = match &rule.action {
        RuleAction::SetTier(new_tier) => {
            tier = new_tier.clone();
            messages.push(format!("Rule {} set tier to {}", id, new_tier));
            base_price
        }
        RuleAction::OverrideUnitPrice(value) => {
            let price = round_money(*value);
            messages.push(format!("Rule {} set price to {}", id, format_money(price)));
            price
        }
        RuleAction::DiscountPercent(percent) => {
            let price = round_money(base_price * (Decimal::ONE - *percent / Decimal::ONE_HUNDRED));
            messages.push(format!(
                "Rule {} applied {}% discount: {} → {}",
                id,
                percent.normalize(),
                format_money(base_price),
                format_money(price)
            ));
            price
        }
        RuleAction::DiscountAmount(amount) => {
            let price = round_money((base_price - *amount).max(Decimal::ZERO));
            messages.push(format!(
                "Rule {} applied {} discount: {} → {}",
                id,
                format_money(*amount),
                format_money(base_price),
                format_money(price)
            ));
            price
        }
        RuleAction::PriceFloor(floor) => {
            if base_price < *floor {
                let price = round_money(*floor);
                messages.push(format!(
                    "Rule {} enforced price floor: {} → {}",
                    id,
                    format_money(base_price),
                    format_money(price)
                ));
                price
            } else {
                messages.push(format!(
                    "Rule {} price floor {} not applied (price {} already above)",
                    id,
                    format_money(*floor),
                    format_money(base_price)
                ));
                base_price
            }
        }
    };

    RuleOutcome {
        altered: price != base_price || tier != current_tier,
        price,
        tier,
        messages,
    }
}
