pub mod models;
pub mod money;

pub use models::{
    AccountIntel, Adjustment, Freight, FreightMode, Hold, LineItem, OrderPolicy, PriceSource,
    PricingRequest, PricingResult, RequestLine, StackingConstraints, Terms, TraceStep,
};

/// Tier used when no mapping resolves an account.
pub const FALLBACK_TIER: &str = "MSRP";

/// Program used when no program rule resolves an order.
pub const FALLBACK_PROGRAM: &str = "STANDARD";
