use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::FALLBACK_PROGRAM;

/// Payment terms for an order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Terms {
    pub code: String,
    /// `None` for dated terms
    pub net_days: Option<u32>,
    /// Verbatim due date for `DATED` terms
    pub due_date: Option<String>,
    pub needs_review: bool,
    pub review_reason: Option<String>,
}

impl Terms {
    pub fn net(code: impl Into<String>, days: u32) -> Self {
        Self {
            code: code.into(),
            net_days: Some(days),
            due_date: None,
            needs_review: false,
            review_reason: None,
        }
    }

    /// Credit card orders pay at once
    pub fn immediate() -> Self {
        Self::net("NET_IMMEDIATE", 0)
    }
}

impl Default for Terms {
    fn default() -> Self {
        Self::net("NET_30", 30)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FreightMode {
    /// Full freight allowance, seller pays shipping
    Ffa,
    PartialFfa,
    ExWorks,
    /// Percentage surcharge billed in lieu of freight
    SftPercent,
    CustomerPaysCarrierRate,
}

impl FreightMode {
    /// Map a free-text freight policy onto a mode
    pub fn from_policy_text(text: &str) -> Self {
        let normalized = text.trim().to_uppercase().replace(['-', ' '], "_");
        if normalized.contains("SFT") {
            FreightMode::SftPercent
        } else if normalized.contains("PARTIAL") {
            FreightMode::PartialFfa
        } else if normalized == "FFA" || normalized.contains("FULL_FREIGHT") {
            FreightMode::Ffa
        } else if normalized == "EX_WORKS" || normalized == "EXWORKS" || normalized == "EXW" {
            FreightMode::ExWorks
        } else {
            FreightMode::CustomerPaysCarrierRate
        }
    }
}

/// Freight decision for an order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Freight {
    pub mode: FreightMode,
    /// Policy text from the matching freight row
    pub policy: String,
    pub ffa_threshold: Option<Decimal>,
    pub bill_freight: bool,
}

impl Default for Freight {
    fn default() -> Self {
        Self {
            mode: FreightMode::CustomerPaysCarrierRate,
            policy: "Standard Freight".to_string(),
            ffa_threshold: None,
            bill_freight: true,
        }
    }
}

/// A hold placed on the order before release
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hold {
    pub code: String,
    pub message: String,
    pub mandatory: bool,
}

/// An order-level charge or credit outside of line pricing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Adjustment {
    pub code: String,
    pub description: String,
    pub amount: Decimal,
    pub taxable: bool,
}

/// Advisory stacking constraints. Not enforced by line pricing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackingConstraints {
    pub no_rebate_stacking: bool,
    pub no_discount_stacking: bool,
}

impl StackingConstraints {
    pub fn is_empty(&self) -> bool {
        !self.no_rebate_stacking && !self.no_discount_stacking
    }
}

/// Order-level policy decisions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPolicy {
    pub program_id: String,
    pub terms: Terms,
    pub freight: Freight,
    pub holds: Vec<Hold>,
    pub adjustments: Vec<Adjustment>,
    pub constraints: StackingConstraints,
}

impl Default for OrderPolicy {
    fn default() -> Self {
        Self {
            program_id: FALLBACK_PROGRAM.to_string(),
            terms: Terms::default(),
            freight: Freight::default(),
            holds: Vec::new(),
            adjustments: Vec::new(),
            constraints: StackingConstraints::default(),
        }
    }
}
