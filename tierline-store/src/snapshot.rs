//! Engine snapshots and the reloadable handle that serves them.

use chrono::{Local, NaiveDate};
use parking_lot::RwLock;
use std::sync::Arc;
use tierline_catalog::Catalog;
use tierline_core::{AccountDirectory, IntelDirectory, TierResolution};
use tierline_order::{OrderPolicyEngine, PolicyTables};
use tierline_quote::{PricingEngine, Rule, RuleMatcher, RuleRow, RuleValidation, RuleValidator};
use tierline_shared::{AccountIntel, PricingRequest, PricingResult};

use crate::app_config::Config;
use crate::error::StoreError;
use crate::loader::{self, Table};
use crate::rules_repo;

/// Immutable pricing and policy engine over one load of reference data
#[derive(Debug)]
pub struct Engine {
    pricing: PricingEngine,
    policy: OrderPolicyEngine,
    /// Every compiled rule, inactive ones included, for validation
    rules: Vec<Rule>,
}

impl Engine {
    /// Assemble an engine from in-memory tables
    pub fn new(pricing: PricingEngine, policy: OrderPolicyEngine, rules: Vec<Rule>) -> Self {
        Self { pricing, policy, rules }
    }

    /// Build from in-memory tables with the default policy settings
    pub fn from_tables(
        catalog: Catalog,
        accounts: AccountDirectory,
        intel: IntelDirectory,
        rules: Vec<Rule>,
        policy_tables: PolicyTables,
    ) -> Self {
        let pricing = PricingEngine::new(catalog, accounts, RuleMatcher::new(rules.clone())).with_intel(intel);
        let policy = OrderPolicyEngine::new(policy_tables, Default::default());
        Self::new(pricing, policy, rules)
    }

    /// Load every table named by the configuration.
    ///
    /// Catalog, tier map and group membership are required; everything else
    /// falls back to empty.
    pub fn load(config: &Config) -> Result<Self, StoreError> {
        let data = &config.data;

        let catalog = loader::parse_catalog(&Table::read_required(&data.catalog_path())?);
        let mappings = loader::parse_mappings(&Table::read_required(&data.tier_map_path())?);
        let memberships = loader::parse_memberships(&Table::read_required(&data.group_members_path())?);
        let intel = loader::parse_intel(&Table::read_optional(&data.account_intel_path())?);
        let rules = rules_repo::load_rules(&data.compiled_rules_path())?.rules;
        let policy_tables = loader::load_policy_tables(&data.root.join(&data.policy_dir))?;

        tracing::info!(
            products = catalog.len(),
            mappings = mappings.len(),
            memberships = memberships.len(),
            intel = intel.len(),
            rules = rules.len(),
            "reference data loaded"
        );

        let pricing = PricingEngine::new(
            catalog,
            AccountDirectory::new(mappings, memberships),
            RuleMatcher::new(rules.clone()),
        )
        .with_intel(IntelDirectory::new(intel));
        let policy = OrderPolicyEngine::new(policy_tables, config.policy.clone());
        Ok(Self::new(pricing, policy, rules))
    }

    pub fn pricing(&self) -> &PricingEngine {
        &self.pricing
    }

    pub fn policy(&self) -> &OrderPolicyEngine {
        &self.policy
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Price a request and resolve its order policy.
    ///
    /// An undated request is pinned to today once, so rules and policy rows
    /// see the same date.
    pub fn price(&self, request: &PricingRequest) -> PricingResult {
        let as_of = request.request_date.unwrap_or_else(|| Local::now().date_naive());
        self.price_on(request, as_of)
    }

    /// Price a request with every date range checked against `as_of`
    pub fn price_on(&self, request: &PricingRequest, as_of: NaiveDate) -> PricingResult {
        let mut result = self.pricing.calculate_on(request, as_of);
        let groups = self.pricing.account_groups(&request.account_id);
        self.policy.apply_policies_on(request, &mut result, &groups, as_of);
        result
    }

    pub fn tier(&self, account_id: &str) -> TierResolution {
        self.pricing.resolve_tier(account_id)
    }

    pub fn intel(&self, account_id: &str) -> AccountIntel {
        self.pricing.account_intel(account_id)
    }

    /// Check a candidate rule against the catalog and the loaded rules
    pub fn validate_rule(&self, candidate: &RuleRow, today: NaiveDate) -> RuleValidation {
        RuleValidator::new(self.pricing.catalog(), &self.rules).validate_new(candidate, today)
    }
}

/// Owns the current engine and swaps in a fresh one on reload
#[derive(Debug)]
pub struct EngineHandle {
    current: RwLock<Arc<Engine>>,
    config: Config,
}

impl EngineHandle {
    pub fn new(engine: Engine, config: Config) -> Self {
        Self {
            current: RwLock::new(Arc::new(engine)),
            config,
        }
    }

    pub fn load(config: Config) -> Result<Self, StoreError> {
        let engine = Engine::load(&config)?;
        Ok(Self::new(engine, config))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The engine serving requests right now
    pub fn snapshot(&self) -> Arc<Engine> {
        self.current.read().clone()
    }

    /// Rebuild from the configured sources and swap it in.
    /// On failure the current engine stays in place.
    pub fn reload(&self) -> Result<Arc<Engine>, StoreError> {
        let engine = match Engine::load(&self.config) {
            Ok(engine) => Arc::new(engine),
            Err(e) => {
                tracing::warn!(error = %e, "reload failed, keeping current engine");
                return Err(e);
            }
        };
        *self.current.write() = engine.clone();
        tracing::info!("engine reloaded");
        Ok(engine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use tierline_catalog::CatalogEntry;
    use tierline_core::{AccountMapping, MatchType};
    use tierline_order::{RowScope, TermsRule};
    use tierline_quote::{RuleAction, RuleMatch};

    fn engine() -> Engine {
        Engine::from_tables(
            Catalog::from_entries(vec![
                CatalogEntry::new("A1", "Helmet", Decimal::from(100)).with_tier_price("GOLD", Decimal::from(80))
            ]),
            AccountDirectory::new(vec![AccountMapping::new(Some(MatchType::Account), "1", "GOLD")], vec![]),
            IntelDirectory::default(),
            vec![],
            PolicyTables::default(),
        )
    }

    #[test]
    fn test_engine_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Engine>();
        assert_send_sync::<EngineHandle>();
    }

    #[test]
    fn test_price_attaches_policy() {
        let request = PricingRequest::new("1")
            .with_item("A1", 2)
            .with_payment_method("CC")
            .on(NaiveDate::from_ymd_opt(2026, 3, 1).unwrap());

        let result = engine().price(&request);
        assert_eq!(result.total, Decimal::from(160));
        assert_eq!(result.policy.program_id, "STANDARD");
        assert_eq!(result.policy.terms.code, "NET_IMMEDIATE");
    }

    #[test]
    fn test_undated_request_uses_one_date_for_rules_and_policy() {
        let january = Some(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
        let january_end = Some(NaiveDate::from_ymd_opt(2026, 1, 31).unwrap());
        let promo = Rule::new("JAN-PROMO", 10, RuleAction::OverrideUnitPrice(Decimal::from(70))).when(RuleMatch {
            start_date: january,
            end_date: january_end,
            ..Default::default()
        });
        let policy_tables = PolicyTables {
            terms: vec![
                TermsRule::new(RowScope::program("STANDARD").dated(january, january_end), "DATED"),
                TermsRule::new(RowScope::program("STANDARD"), "NET_30"),
            ],
            ..Default::default()
        };
        let engine = Engine::from_tables(
            Catalog::from_entries(vec![CatalogEntry::new("A1", "Helmet", Decimal::from(100))]),
            AccountDirectory::default(),
            IntelDirectory::default(),
            vec![promo],
            policy_tables,
        );
        let undated = PricingRequest::new("1").with_item("A1", 1);

        let inside = engine.price_on(&undated, NaiveDate::from_ymd_opt(2026, 1, 15).unwrap());
        assert_eq!(inside.lines[0].unit_price, Decimal::from(70));
        assert_eq!(inside.policy.terms.code, "DATED");

        let outside = engine.price_on(&undated, NaiveDate::from_ymd_opt(2026, 2, 1).unwrap());
        assert_eq!(outside.lines[0].unit_price, Decimal::from(100));
        assert_eq!(outside.policy.terms.code, "NET_30");
    }

    #[test]
    fn test_failed_reload_keeps_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let handle = EngineHandle::new(engine(), Config::from_data_root(dir.path()));
        let before = handle.snapshot();

        assert!(matches!(handle.reload(), Err(StoreError::MissingSource(_))));
        assert!(Arc::ptr_eq(&before, &handle.snapshot()));
    }
}
