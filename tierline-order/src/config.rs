use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Tunables for the order policy engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Sports-line surcharge as a percentage of the order total
    pub sft_surcharge_percent: Decimal,
    /// Order types treated as trade-ins
    pub trade_in_order_types: Vec<u32>,
    /// Ship method fragments that mark an expedited carrier
    pub expedited_markers: Vec<String>,
}

impl PolicyConfig {
    pub fn is_trade_in(&self, order_type: Option<u32>) -> bool {
        order_type.is_some_and(|t| self.trade_in_order_types.contains(&t))
    }

    /// Case-insensitive substring match against the expedited markers
    pub fn is_expedited(&self, ship_method: Option<&str>) -> bool {
        let Some(method) = ship_method else {
            return false;
        };
        let method = method.to_uppercase();
        self.expedited_markers
            .iter()
            .any(|marker| !marker.is_empty() && method.contains(&marker.to_uppercase()))
    }
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            sft_surcharge_percent: Decimal::from(18),
            trade_in_order_types: vec![25, 26],
            expedited_markers: ["PRIORITY", "OVERNIGHT", "2DAY", "AIR"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}
