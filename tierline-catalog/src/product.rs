use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// A catalog product with its reference and negotiated prices
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub sku: String,
    pub description: String,
    pub brand: Option<String>,
    /// Reference price, present for every product
    pub msrp: Decimal,
    /// Sparse `{TIER}_Price` columns keyed by tier name
    pub tier_prices: BTreeMap<String, Decimal>,
}

impl CatalogEntry {
    pub fn new(sku: impl Into<String>, description: impl Into<String>, msrp: Decimal) -> Self {
        Self {
            sku: sku.into().trim().to_string(),
            description: description.into(),
            brand: None,
            msrp,
            tier_prices: BTreeMap::new(),
        }
    }

    pub fn with_tier_price(mut self, tier: impl Into<String>, price: Decimal) -> Self {
        self.tier_prices.insert(tier.into(), price);
        self
    }

    pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = Some(brand.into());
        self
    }

    /// Negotiated price for a tier, if one exists
    pub fn tier_price(&self, tier: &str) -> Option<Decimal> {
        self.tier_prices.get(tier).copied()
    }

    fn has_description(&self) -> bool {
        !self.description.trim().is_empty()
    }
}

/// Immutable product catalog keyed by SKU.
///
/// Iteration follows load order.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
    index: HashMap<String, usize>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: impl IntoIterator<Item = CatalogEntry>) -> Self {
        let mut catalog = Self::new();
        for entry in entries {
            catalog.insert(entry);
        }
        catalog
    }

    /// Insert an entry. For a duplicate SKU the first row is kept, unless it
    /// has no description and the newcomer does.
    ///
    /// Returns `true` when the entry was stored.
    pub fn insert(&mut self, entry: CatalogEntry) -> bool {
        match self.index.get(&entry.sku) {
            Some(&position) => {
                let existing = &mut self.entries[position];
                if !existing.has_description() && entry.has_description() {
                    tracing::debug!(sku = %entry.sku, "duplicate SKU, keeping description-bearing row");
                    *existing = entry;
                    true
                } else {
                    tracing::debug!(sku = %entry.sku, "duplicate SKU ignored");
                    false
                }
            }
            None => {
                self.index.insert(entry.sku.clone(), self.entries.len());
                self.entries.push(entry);
                true
            }
        }
    }

    pub fn get(&self, sku: &str) -> Option<&CatalogEntry> {
        self.index.get(sku.trim()).map(|&position| &self.entries[position])
    }

    pub fn contains(&self, sku: &str) -> bool {
        self.index.contains_key(sku.trim())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.iter()
    }

    /// Number of SKUs starting with `prefix` (case-sensitive)
    pub fn count_prefix(&self, prefix: &str) -> usize {
        self.entries.iter().filter(|e| e.sku.starts_with(prefix)).count()
    }

    /// Case-insensitive search over SKU and description
    pub fn search(&self, needle: &str, limit: usize) -> Vec<&CatalogEntry> {
        let needle = needle.to_lowercase();
        self.entries
            .iter()
            .filter(|e| e.sku.to_lowercase().contains(&needle) || e.description.to_lowercase().contains(&needle))
            .take(limit)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_row_wins_for_duplicates() {
        let catalog = Catalog::from_entries(vec![
            CatalogEntry::new("A1", "Varsity Helmet", Decimal::from(499)),
            CatalogEntry::new("A1", "Other", Decimal::from(1)),
        ]);

        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get("A1").unwrap().msrp, Decimal::from(499));
    }

    #[test]
    fn test_description_bearing_duplicate_wins() {
        let catalog = Catalog::from_entries(vec![
            CatalogEntry::new("A1", "", Decimal::from(1)),
            CatalogEntry::new("A1", "Varsity Helmet", Decimal::from(499)),
        ]);

        let entry = catalog.get(" A1 ").unwrap();
        assert_eq!(entry.description, "Varsity Helmet");
        assert_eq!(entry.msrp, Decimal::from(499));
    }

    #[test]
    fn test_prefix_count_and_search() {
        let catalog = Catalog::from_entries(vec![
            CatalogEntry::new("207000", "F7 Varsity", Decimal::from(499)),
            CatalogEntry::new("207001", "F7 Youth", Decimal::from(399)),
            CatalogEntry::new("193092", "Youth Zero 2", Decimal::from(299)),
        ]);

        assert_eq!(catalog.count_prefix("2070"), 2);
        assert_eq!(catalog.count_prefix("9"), 0);
        assert_eq!(catalog.search("youth", 10).len(), 2);
        assert_eq!(catalog.search("youth", 1).len(), 1);
    }

    #[test]
    fn test_tier_price_is_sparse() {
        let entry = CatalogEntry::new("A1", "Helmet", Decimal::from(499))
            .with_tier_price("GOLD", Decimal::from(420));

        assert_eq!(entry.tier_price("GOLD"), Some(Decimal::from(420)));
        assert_eq!(entry.tier_price("SILVER"), None);
    }
}
