pub mod policy;
pub mod quote;
pub mod request;
pub mod trace;

pub use policy::{Adjustment, Freight, FreightMode, Hold, OrderPolicy, StackingConstraints, Terms};
pub use quote::{AccountIntel, LineItem, PriceSource, PricingResult};
pub use request::{PricingRequest, RequestLine};
pub use trace::{render_trace, TraceStep};
