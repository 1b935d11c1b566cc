use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One requested SKU and its quantity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestLine {
    pub sku: String,
    pub quantity: u32,
}

/// A pricing request with account context and items.
///
/// Items are priced in the order supplied. Adding the same SKU twice
/// through [`PricingRequest::with_item`] replaces the earlier quantity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PricingRequest {
    pub account_id: String,
    pub items: Vec<RequestLine>,

    /// Per-SKU configuration for customizable items, passed through untouched
    #[serde(default)]
    pub item_configs: BTreeMap<String, BTreeMap<String, String>>,

    /// Ordering channel ("phone", "email", "portal")
    #[serde(default)]
    pub channel: Option<String>,

    /// As-of date for rule and policy date ranges; today when absent
    #[serde(default)]
    pub request_date: Option<NaiveDate>,

    /// "PO" or "CC"
    #[serde(default)]
    pub payment_method: Option<String>,

    #[serde(default)]
    pub order_type: Option<u32>,

    #[serde(default)]
    pub ship_method: Option<String>,

    #[serde(default)]
    pub ship_to_type: Option<String>,

    /// Tier used for freight tier filtering; the resolved pricing tier when absent
    #[serde(default)]
    pub customer_tier: Option<String>,
}

impl PricingRequest {
    pub fn new(account_id: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            ..Default::default()
        }
    }

    /// Add or replace a SKU quantity
    pub fn with_item(mut self, sku: impl Into<String>, quantity: u32) -> Self {
        let sku = sku.into();
        match self.items.iter_mut().find(|line| line.sku == sku) {
            Some(line) => line.quantity = quantity,
            None => self.items.push(RequestLine { sku, quantity }),
        }
        self
    }

    pub fn with_config(mut self, sku: impl Into<String>, config: BTreeMap<String, String>) -> Self {
        self.item_configs.insert(sku.into(), config);
        self
    }

    pub fn on(mut self, date: NaiveDate) -> Self {
        self.request_date = Some(date);
        self
    }

    pub fn with_payment_method(mut self, method: impl Into<String>) -> Self {
        self.payment_method = Some(method.into());
        self
    }

    pub fn with_order_type(mut self, order_type: u32) -> Self {
        self.order_type = Some(order_type);
        self
    }

    pub fn with_ship_method(mut self, method: impl Into<String>) -> Self {
        self.ship_method = Some(method.into());
        self
    }

    pub fn with_ship_to_type(mut self, ship_to_type: impl Into<String>) -> Self {
        self.ship_to_type = Some(ship_to_type.into());
        self
    }

    pub fn with_customer_tier(mut self, tier: impl Into<String>) -> Self {
        self.customer_tier = Some(tier.into());
        self
    }

    pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = Some(channel.into());
        self
    }
}
