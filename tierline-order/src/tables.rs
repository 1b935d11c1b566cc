//! Typed policy table rows.
//!
//! Terms and freight rows share the same scoping columns: a program id, an
//! optional order-total range and an optional date range. Empty cells are
//! `None` and leave that side of the range open.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tierline_core::AccountMapping;
use tierline_shared::FALLBACK_PROGRAM;

/// Program scope plus total and date windows
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowScope {
    pub program_id: String,
    pub min_total: Option<Decimal>,
    pub max_total: Option<Decimal>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl RowScope {
    pub fn program(program_id: impl Into<String>) -> Self {
        Self {
            program_id: program_id.into(),
            ..Default::default()
        }
    }

    pub fn total_between(mut self, min: Option<Decimal>, max: Option<Decimal>) -> Self {
        self.min_total = min;
        self.max_total = max;
        self
    }

    pub fn dated(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        self.start_date = start;
        self.end_date = end;
        self
    }

    /// Inclusive on both ends
    pub fn covers_total(&self, total: Decimal) -> bool {
        self.min_total.map_or(true, |min| total >= min) && self.max_total.map_or(true, |max| total <= max)
    }

    /// Inclusive on both ends
    pub fn covers_date(&self, as_of: NaiveDate) -> bool {
        self.start_date.map_or(true, |start| as_of >= start) && self.end_date.map_or(true, |end| as_of <= end)
    }
}

/// Rows scoped by program, total and date
pub trait ScopedRow {
    fn scope(&self) -> &RowScope;
}

/// Rows for `program_id` that cover the total and date, in table order.
///
/// A program with no rows at all uses the `STANDARD` rows instead. The total
/// and date filters run after that choice, so a program whose rows miss the
/// order gets nothing.
pub fn select_scoped<'a, R: ScopedRow>(rows: &'a [R], program_id: &str, total: Decimal, as_of: NaiveDate) -> Vec<&'a R> {
    let has_rows = rows.iter().any(|r| r.scope().program_id == program_id);
    let program = if has_rows { program_id } else { FALLBACK_PROGRAM };

    rows.iter()
        .filter(|r| r.scope().program_id == program)
        .filter(|r| r.scope().covers_total(total))
        .filter(|r| r.scope().covers_date(as_of))
        .collect()
}

/// `terms_rules` row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermsRule {
    pub scope: RowScope,
    pub terms_code: String,
    pub net_days: Option<u32>,
    pub due_date: Option<String>,
    pub needs_review: bool,
    pub review_reason: Option<String>,
}

impl TermsRule {
    pub fn new(scope: RowScope, terms_code: impl Into<String>) -> Self {
        Self {
            scope,
            terms_code: terms_code.into().trim().to_string(),
            net_days: None,
            due_date: None,
            needs_review: false,
            review_reason: None,
        }
    }
}

impl ScopedRow for TermsRule {
    fn scope(&self) -> &RowScope {
        &self.scope
    }
}

/// `freight_rules` row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreightRule {
    pub scope: RowScope,
    /// Empty, `*` or `ALL` applies to every tier
    pub customer_tier: Option<String>,
    pub freight_policy: String,
    pub ffa_threshold: Option<Decimal>,
    pub bill_freight: bool,
}

impl FreightRule {
    pub fn new(scope: RowScope, freight_policy: impl Into<String>) -> Self {
        Self {
            scope,
            customer_tier: None,
            freight_policy: freight_policy.into().trim().to_string(),
            ffa_threshold: None,
            bill_freight: true,
        }
    }

    pub fn for_tier(mut self, tier: impl Into<String>) -> Self {
        self.customer_tier = Some(tier.into());
        self
    }

    pub fn is_any_tier(&self) -> bool {
        match self.customer_tier.as_deref().map(str::trim) {
            None | Some("") | Some("*") => true,
            Some(tier) => tier.eq_ignore_ascii_case("ALL"),
        }
    }

    pub fn is_tier(&self, tier: &str) -> bool {
        self.customer_tier
            .as_deref()
            .is_some_and(|t| !self.is_any_tier() && t.trim().eq_ignore_ascii_case(tier.trim()))
    }
}

impl ScopedRow for FreightRule {
    fn scope(&self) -> &RowScope {
        &self.scope
    }
}

/// How a workflow row decides whether to hold an order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowTrigger {
    Always,
    /// Exact equality with the request's ship method
    ShipMethod(String),
}

/// `workflow_rules` row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowRule {
    /// A program id or `ALL`
    pub program_id: String,
    pub trigger: WorkflowTrigger,
    pub hold_code: String,
    pub message: String,
}

impl WorkflowRule {
    pub fn applies_to(&self, program_id: &str) -> bool {
        self.program_id == program_id || self.program_id == "ALL"
    }
}

/// All policy tables. Any of them may be empty.
#[derive(Debug, Clone, Default)]
pub struct PolicyTables {
    pub terms: Vec<TermsRule>,
    pub freight: Vec<FreightRule>,
    pub workflow: Vec<WorkflowRule>,
    pub programs: Vec<AccountMapping>,
}

impl PolicyTables {
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty() && self.freight.is_empty() && self.workflow.is_empty() && self.programs.is_empty()
    }
}
