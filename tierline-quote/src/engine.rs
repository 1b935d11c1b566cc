//! Pricing Engine
//!
//! Prices a request line by line: tier waterfall, tier price or MSRP
//! fallback, then matching rules in priority order. Every decision is
//! recorded on the line's trace.

use chrono::{Local, NaiveDate};
use tierline_catalog::{resolve_base_price, Catalog, CatalogEntry};
use tierline_core::{AccountDirectory, IntelDirectory, TierResolution};
use tierline_shared::money::{format_money, round_money};
use tierline_shared::{AccountIntel, LineItem, PriceSource, PricingRequest, PricingResult};

use crate::rules::matcher::{apply_rule_to_price, MatchedRule, RuleContext, RuleMatcher};
use crate::rules::Rule;
use crate::stacking::{CumulativeStacking, StackingPolicy};

/// Everything one line needs besides the catalog entry
struct LineContext<'a> {
    account_id: &'a str,
    groups: &'a [String],
    tier: &'a str,
    as_of: NaiveDate,
    channel: Option<&'a str>,
}

/// Immutable pricing engine over loaded reference tables
#[derive(Debug)]
pub struct PricingEngine {
    catalog: Catalog,
    accounts: AccountDirectory,
    intel: IntelDirectory,
    matcher: RuleMatcher,
    stacking: Box<dyn StackingPolicy>,
}

impl PricingEngine {
    pub fn new(catalog: Catalog, accounts: AccountDirectory, matcher: RuleMatcher) -> Self {
        Self {
            catalog,
            accounts,
            intel: IntelDirectory::default(),
            matcher,
            stacking: Box::new(CumulativeStacking),
        }
    }

    pub fn with_intel(mut self, intel: IntelDirectory) -> Self {
        self.intel = intel;
        self
    }

    pub fn with_stacking_policy(mut self, policy: Box<dyn StackingPolicy>) -> Self {
        self.stacking = policy;
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn accounts(&self) -> &AccountDirectory {
        &self.accounts
    }

    pub fn matcher(&self) -> &RuleMatcher {
        &self.matcher
    }

    /// Tier waterfall for an account
    pub fn resolve_tier(&self, account_id: &str) -> TierResolution {
        self.accounts.resolve_tier(account_id)
    }

    pub fn account_groups(&self, account_id: &str) -> Vec<String> {
        self.accounts.groups_for(account_id)
    }

    pub fn account_intel(&self, account_id: &str) -> AccountIntel {
        self.intel.resolve(&self.accounts, account_id)
    }

    /// Price a whole request. SKUs missing from the catalog are left out.
    pub fn calculate(&self, request: &PricingRequest) -> PricingResult {
        let as_of = request.request_date.unwrap_or_else(|| Local::now().date_naive());
        self.calculate_on(request, as_of)
    }

    /// Price a request with rules gated on `as_of`, whatever its own date says
    pub fn calculate_on(&self, request: &PricingRequest, as_of: NaiveDate) -> PricingResult {
        let account_id = request.account_id.trim();
        let resolution = self.resolve_tier(account_id);

        let mut result = PricingResult::new(account_id, resolution.tier.clone());
        result.intel = self.account_intel(account_id);
        result.trace = resolution.trace;
        result.add_trace("As Of", "Pricing date", Some(as_of.to_string()));

        let groups = self.account_groups(account_id);
        let ctx = LineContext {
            account_id,
            groups: &groups,
            tier: &resolution.tier,
            as_of,
            channel: request.channel.as_deref(),
        };

        for item in &request.items {
            let sku = item.sku.trim();
            let Some(mut line) = self.price_entry(sku, item.quantity, &ctx) else {
                tracing::debug!(sku, "SKU not in catalog, skipping line");
                continue;
            };
            line.configuration = request.item_configs.get(sku).cloned();
            result.push_line(line);
        }

        tracing::debug!(
            account_id,
            tier = %result.tier,
            lines = result.lines.len(),
            total = %result.total,
            "request priced"
        );
        result
    }

    /// Price a single SKU for an account as of today, e.g. for catalog browsing
    pub fn price_line(&self, account_id: &str, sku: &str, quantity: u32) -> Option<LineItem> {
        let account_id = account_id.trim();
        let tier = self.accounts.tier_for(account_id);
        let groups = self.account_groups(account_id);
        let ctx = LineContext {
            account_id,
            groups: &groups,
            tier: &tier,
            as_of: Local::now().date_naive(),
            channel: None,
        };
        self.price_entry(sku.trim(), quantity, &ctx)
    }

    fn price_entry(&self, sku: &str, quantity: u32, ctx: &LineContext<'_>) -> Option<LineItem> {
        let entry = self.catalog.get(sku)?;
        let description = if entry.description.trim().is_empty() {
            "N/A"
        } else {
            entry.description.as_str()
        };

        let mut line = LineItem::new(&entry.sku, description, quantity, ctx.tier);
        line.add_trace("SKU Lookup", "Found product in catalog", Some(entry.sku.clone()));
        if !ctx.groups.is_empty() {
            line.add_trace("Context", "Account Groups", Some(ctx.groups.join(",")));
        }

        let matched = self.matching_rules(entry, quantity, ctx);
        for m in &matched {
            line.add_trace(
                "Rule Match",
                format!("{} ({})", m.rule.name, m.rule.rule_id),
                Some(m.match_reason.clone()),
            );
        }

        // Only the first set_tier rule by priority counts
        let mut effective_tier = ctx.tier.to_string();
        if let Some(m) = matched.iter().find(|m| m.rule.action.is_set_tier()) {
            let outcome = apply_rule_to_price(m.rule, entry.msrp, &effective_tier);
            effective_tier = outcome.tier;
            line.tier_used = effective_tier.clone();
            line.rules_applied.push(m.rule.rule_id.clone());
            line.add_trace(
                "Rule Applied",
                format!("{} ({})", m.rule.name, m.rule.rule_id),
                Some(format!("tier → {}", effective_tier)),
            );
        }

        let base = resolve_base_price(entry, &effective_tier);
        line.unit_price = base.price;
        line.source = base.source;
        line.tier_used = base.tier_used.clone();
        if base.is_msrp_fallback() {
            line.add_trace(
                "Price Resolution",
                format!("No {} price, using MSRP fallback", effective_tier),
                Some(format_money(line.unit_price)),
            );
            line.add_warning(format!("MSRP fallback used for SKU {}", entry.sku));
        } else {
            line.add_trace(
                "Price Resolution",
                format!("Using {} tier price", effective_tier),
                Some(format_money(line.unit_price)),
            );
        }

        let mut applied: Vec<&Rule> = Vec::new();
        for m in matched.iter().filter(|m| m.rule.action.is_price_modifying()) {
            if !self.stacking.admits(&applied, m.rule) {
                line.add_trace(
                    "Rule Skipped",
                    format!("{} ({}) not stackable with earlier rules", m.rule.name, m.rule.rule_id),
                    None,
                );
                continue;
            }
            let outcome = apply_rule_to_price(m.rule, line.unit_price, &line.tier_used);
            line.unit_price = outcome.price;
            line.source = PriceSource::Rule;
            line.rules_applied.push(m.rule.rule_id.clone());
            for message in outcome.messages {
                line.add_trace("Rule Applied", message, Some(format_money(outcome.price)));
            }
            applied.push(m.rule);
        }

        line.extended_price = round_money(line.unit_price * rust_decimal::Decimal::from(quantity));
        line.add_trace(
            "Extension",
            format!("Quantity {} × {}", quantity, format_money(line.unit_price)),
            Some(format_money(line.extended_price)),
        );
        Some(line)
    }

    fn matching_rules(&self, entry: &CatalogEntry, quantity: u32, ctx: &LineContext<'_>) -> Vec<MatchedRule<'_>> {
        if ctx.account_id.is_empty() {
            return Vec::new();
        }
        let rule_ctx = RuleContext {
            account_id: ctx.account_id,
            groups: ctx.groups,
            sku: &entry.sku,
            brand: entry.brand.as_deref(),
            quantity,
            as_of: ctx.as_of,
            channel: ctx.channel,
        };
        self.matcher.find_matching_rules(&rule_ctx)
    }
}
