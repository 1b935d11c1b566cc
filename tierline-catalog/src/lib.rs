pub mod product;
pub mod pricing;

pub use product::{Catalog, CatalogEntry};
pub use pricing::{resolve_base_price, BasePrice};
