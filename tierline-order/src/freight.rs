use chrono::NaiveDate;
use rust_decimal::Decimal;
use tierline_shared::money::percent_of;
use tierline_shared::{Adjustment, Freight, FreightMode};

use crate::config::PolicyConfig;
use crate::tables::{select_scoped, FreightRule};

/// Program whose orders carry a freight surcharge instead of billed freight
pub const SPORTS_LINE_PROGRAM: &str = "SPORTS_LINE";

/// Adjustment code for the sports-line surcharge
pub const SURCHARGE_CODE: &str = "SFT_CHG";

impl FreightRule {
    pub fn to_freight(&self) -> Freight {
        Freight {
            mode: FreightMode::from_policy_text(&self.freight_policy),
            policy: self.freight_policy.clone(),
            ffa_threshold: self.ffa_threshold,
            bill_freight: self.bill_freight,
        }
    }
}

/// Freight for the program (or `STANDARD`) rows covering total and date.
///
/// A row for the exact customer tier beats a row open to every tier.
pub fn resolve_freight(
    rows: &[FreightRule],
    program_id: &str,
    total: Decimal,
    as_of: NaiveDate,
    customer_tier: &str,
) -> Option<Freight> {
    let candidates = select_scoped(rows, program_id, total, as_of);
    candidates
        .iter()
        .find(|r| r.is_tier(customer_tier))
        .or_else(|| candidates.iter().find(|r| r.is_any_tier()))
        .map(|r| r.to_freight())
}

/// Outcome of the sports-line surcharge check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Surcharge {
    /// Expedited carrier: freight billed at carrier rate, no surcharge
    Waived(Freight),
    Applied { freight: Freight, adjustment: Adjustment },
}

/// Surcharge policy for sports-line orders.
///
/// Takes the freight decided so far and returns the replacement freight.
pub fn sports_line_surcharge(
    config: &PolicyConfig,
    freight: &Freight,
    total: Decimal,
    ship_method: Option<&str>,
) -> Surcharge {
    if config.is_expedited(ship_method) {
        return Surcharge::Waived(Freight {
            mode: FreightMode::CustomerPaysCarrierRate,
            policy: format!("Expedited ({}) at carrier rate", ship_method.unwrap_or_default().trim()),
            ffa_threshold: None,
            bill_freight: true,
        });
    }

    let percent = config.sft_surcharge_percent;
    Surcharge::Applied {
        freight: Freight {
            mode: FreightMode::SftPercent,
            policy: format!("SFT {}%", percent.normalize()),
            ffa_threshold: freight.ffa_threshold,
            bill_freight: false,
        },
        adjustment: Adjustment {
            code: SURCHARGE_CODE.to_string(),
            description: format!("Sports line freight surcharge ({}%)", percent.normalize()),
            amount: percent_of(total, percent),
            taxable: false,
        },
    }
}
