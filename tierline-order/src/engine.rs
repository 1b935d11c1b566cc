//! Order Policy Engine
//!
//! Runs after pricing, since terms and freight depend on the order total.
//! Stages run in a fixed order and later stages may override earlier ones:
//! program, defaults, terms, freight, program surcharge, holds, constraints.

use chrono::{Local, NaiveDate};
use tierline_shared::{money::format_money, OrderPolicy, PricingRequest, PricingResult, StackingConstraints, Terms};

use crate::config::PolicyConfig;
use crate::freight::{resolve_freight, sports_line_surcharge, Surcharge, SPORTS_LINE_PROGRAM};
use crate::holds::{international_hold, workflow_holds};
use crate::program::ProgramResolver;
use crate::tables::PolicyTables;
use crate::terms::resolve_terms;

#[derive(Debug, Clone, Default)]
pub struct OrderPolicyEngine {
    tables: PolicyTables,
    resolver: ProgramResolver,
    config: PolicyConfig,
}

impl OrderPolicyEngine {
    pub fn new(tables: PolicyTables, config: PolicyConfig) -> Self {
        let resolver = ProgramResolver::new(tables.programs.clone(), config.trade_in_order_types.clone());
        Self {
            tables,
            resolver,
            config,
        }
    }

    pub fn tables(&self) -> &PolicyTables {
        &self.tables
    }

    pub fn config(&self) -> &PolicyConfig {
        &self.config
    }

    pub fn resolver(&self) -> &ProgramResolver {
        &self.resolver
    }

    /// Compute the order policy, attach it to `result` and extend its trace.
    ///
    /// `result.total` must already be priced for the same request.
    pub fn apply_policies(&self, request: &PricingRequest, result: &mut PricingResult, groups: &[String]) -> OrderPolicy {
        let as_of = request.request_date.unwrap_or_else(|| Local::now().date_naive());
        self.apply_policies_on(request, result, groups, as_of)
    }

    /// Same as [`apply_policies`](Self::apply_policies) with date ranges checked against `as_of`
    pub fn apply_policies_on(
        &self,
        request: &PricingRequest,
        result: &mut PricingResult,
        groups: &[String],
        as_of: NaiveDate,
    ) -> OrderPolicy {
        let policy = self.compute(request, result, groups, as_of);
        result.policy = policy.clone();
        policy
    }

    fn compute(&self, request: &PricingRequest, result: &mut PricingResult, groups: &[String], as_of: NaiveDate) -> OrderPolicy {
        let total = result.total;
        let resolution = self.resolver.resolve(&request.account_id, groups, request.order_type);
        result.add_trace(
            "Program",
            format!("Resolved program ({:?})", resolution.source),
            Some(resolution.program_id.clone()),
        );

        let mut policy = OrderPolicy {
            program_id: resolution.program_id,
            ..Default::default()
        };
        let program_id = policy.program_id.clone();

        let paid_by_card = request
            .payment_method
            .as_deref()
            .is_some_and(|m| m.trim().eq_ignore_ascii_case("CC"));
        if paid_by_card {
            policy.terms = Terms::immediate();
            result.add_trace("Terms", "Credit card payment, terms table skipped", Some(policy.terms.code.clone()));
        } else if let Some(terms) = resolve_terms(&self.tables.terms, &program_id, total, as_of) {
            result.add_trace(
                "Terms",
                format!("Terms rule for {} at {}", program_id, format_money(total)),
                Some(terms.code.clone()),
            );
            policy.terms = terms;
        } else {
            result.add_trace("Terms", "No terms rule, using default", Some(policy.terms.code.clone()));
        }

        let customer_tier = request
            .customer_tier
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(&result.tier)
            .to_string();
        if let Some(freight) = resolve_freight(&self.tables.freight, &program_id, total, as_of, &customer_tier) {
            result.add_trace(
                "Freight",
                format!("Freight rule for {} (tier {})", program_id, customer_tier),
                Some(freight.policy.clone()),
            );
            policy.freight = freight;
        }

        if program_id == SPORTS_LINE_PROGRAM {
            match sports_line_surcharge(&self.config, &policy.freight, total, request.ship_method.as_deref()) {
                Surcharge::Waived(freight) => {
                    result.add_trace("Surcharge", "Expedited ship method, surcharge waived", None);
                    policy.freight = freight;
                }
                Surcharge::Applied { freight, adjustment } => {
                    result.add_trace(
                        "Surcharge",
                        adjustment.description.clone(),
                        Some(format_money(adjustment.amount)),
                    );
                    policy.freight = freight;
                    policy.adjustments.push(adjustment);
                }
            }
        }

        if let Some(hold) = international_hold(&program_id, request.ship_to_type.as_deref()) {
            policy.holds.push(hold);
        }
        policy
            .holds
            .extend(workflow_holds(&self.tables.workflow, &program_id, request.ship_method.as_deref()));
        for hold in &policy.holds {
            result.add_trace("Hold", hold.message.clone(), Some(hold.code.clone()));
        }

        if self.config.is_trade_in(request.order_type) {
            policy.constraints = StackingConstraints {
                no_rebate_stacking: true,
                no_discount_stacking: true,
            };
            result.add_trace("Constraints", "Trade-in order, no rebate or discount stacking", None);
        }

        tracing::debug!(
            account_id = %request.account_id,
            program = %policy.program_id,
            terms = %policy.terms.code,
            holds = policy.holds.len(),
            "order policy resolved"
        );
        policy
    }
}
