use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tierline_shared::{PriceSource, FALLBACK_TIER};

use crate::product::CatalogEntry;

/// Base price of a product for a tier, before price rules
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasePrice {
    pub price: Decimal,
    /// The requested tier, or `MSRP` when the fallback was used
    pub tier_used: String,
    pub source: PriceSource,
}

impl BasePrice {
    pub fn is_msrp_fallback(&self) -> bool {
        self.source == PriceSource::Msrp
    }
}

/// Look up `{tier}_Price`, falling back to MSRP when the tier has no price.
///
/// The fallback always reports `MSRP` as the tier used, whatever tier was asked for.
pub fn resolve_base_price(entry: &CatalogEntry, tier: &str) -> BasePrice {
    match entry.tier_price(tier) {
        Some(price) => BasePrice {
            price,
            tier_used: tier.to_string(),
            source: PriceSource::Contract,
        },
        None => BasePrice {
            price: entry.msrp,
            tier_used: FALLBACK_TIER.to_string(),
            source: PriceSource::Msrp,
        },
    }
}
