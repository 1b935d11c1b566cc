//! CSV reference table loaders.
//!
//! Cells are read as text, trimmed, and typed here. Headers are looked up
//! by name with aliases so both the current and the legacy layouts load.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::path::Path;
use tierline_catalog::{Catalog, CatalogEntry};
use tierline_core::{AccountIntelRow, AccountMapping, GroupMembership, MatchType};
use tierline_order::{FreightRule, PolicyTables, RowScope, TermsRule, WorkflowRule, WorkflowTrigger};
use tierline_shared::money::parse_money;

use crate::error::StoreError;

const PRICE_SUFFIX: &str = "_Price";

/// A CSV file held as string records
#[derive(Debug, Clone, Default)]
pub struct Table {
    headers: csv::StringRecord,
    rows: Vec<csv::StringRecord>,
}

/// One record with header-aware accessors
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    headers: &'a csv::StringRecord,
    record: &'a csv::StringRecord,
}

impl<'a> Row<'a> {
    /// First non-blank cell under any of `names` (case-insensitive header match)
    pub fn get(&self, names: &[&str]) -> Option<&'a str> {
        names.iter().find_map(|name| {
            self.headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
                .and_then(|idx| self.record.get(idx))
                .map(str::trim)
                .filter(|v| !v.is_empty())
        })
    }

    pub fn money(&self, names: &[&str]) -> Option<Decimal> {
        self.get(names).and_then(parse_money)
    }

    pub fn integer<T: std::str::FromStr>(&self, names: &[&str]) -> Option<T> {
        self.get(names).and_then(|v| v.parse().ok())
    }

    /// Like [`get`](Self::get) followed by `parse`, but a non-blank cell that
    /// fails to parse is returned as `Err` with its raw text
    pub fn parsed<T>(&self, names: &[&str], parse: impl Fn(&str) -> Option<T>) -> Result<Option<T>, &'a str> {
        match self.get(names) {
            None => Ok(None),
            Some(raw) => parse(raw).map(Some).ok_or(raw),
        }
    }

    /// `true`/`yes`/`1`/`y`, falling back to `default` when blank
    pub fn flag(&self, names: &[&str], default: bool) -> bool {
        self.get(names)
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "true" | "yes" | "1" | "y"))
            .unwrap_or(default)
    }

    /// `(header, value)` pairs for every non-blank cell
    pub fn cells(&self) -> impl Iterator<Item = (&'a str, &'a str)> {
        self.headers
            .iter()
            .zip(self.record.iter())
            .map(|(h, v)| (h.trim(), v.trim()))
            .filter(|(_, v)| !v.is_empty())
    }
}

impl Table {
    pub fn read(path: &Path) -> Result<Self, StoreError> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|e| StoreError::csv(path, e))?;

        let headers = reader.headers().map_err(|e| StoreError::csv(path, e))?.clone();
        let rows = reader
            .records()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| StoreError::csv(path, e))?;

        Ok(Self { headers, rows })
    }

    /// Read a table that must exist
    pub fn read_required(path: &Path) -> Result<Self, StoreError> {
        if !path.exists() {
            return Err(StoreError::MissingSource(path.to_path_buf()));
        }
        Self::read(path)
    }

    /// Read a table that may be absent; absent means empty
    pub fn read_optional(path: &Path) -> Result<Self, StoreError> {
        if !path.exists() {
            tracing::info!(path = %path.display(), "optional table not found, using empty table");
            return Ok(Self::default());
        }
        Self::read(path)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn headers(&self) -> impl Iterator<Item = &str> {
        self.headers.iter().map(str::trim)
    }

    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        self.rows.iter().map(move |record| Row {
            headers: &self.headers,
            record,
        })
    }
}

/// Catalog rows; rows without a usable SKU or MSRP are dropped with a warning
pub fn parse_catalog(table: &Table) -> Catalog {
    let mut catalog = Catalog::new();
    for (index, row) in table.rows().enumerate() {
        let Some(sku) = row.get(&["SKU"]) else {
            tracing::warn!(row = index + 2, "catalog row without SKU dropped");
            continue;
        };
        let Some(msrp) = row.money(&["MSRP"]) else {
            tracing::warn!(sku, "catalog row without a valid MSRP dropped");
            continue;
        };

        let mut entry = CatalogEntry::new(sku, row.get(&["Description"]).unwrap_or_default(), msrp);
        if let Some(brand) = row.get(&["Brand", "Vendor"]) {
            entry = entry.with_brand(brand);
        }
        for (header, value) in row.cells() {
            let Some(tier) = header.strip_suffix(PRICE_SUFFIX) else {
                continue;
            };
            if let Some(price) = parse_money(value) {
                entry = entry.with_tier_price(tier, price);
            }
        }
        catalog.insert(entry);
    }
    catalog
}

/// Mapping rows for tiers or programs.
///
/// Accepts `match_type, match_value, target|tier|program_id, priority` and
/// the legacy `Match Value, Program ID` layout.
pub fn parse_mappings(table: &Table) -> Vec<AccountMapping> {
    table
        .rows()
        .filter_map(|row| {
            let value = row.get(&["match_value", "Match Value"])?;
            let target = row.get(&["target", "tier", "program_id", "Program ID"])?;
            let match_type = match row.get(&["match_type"]) {
                None => None,
                Some(raw) => match MatchType::parse(raw) {
                    Some(kind) => Some(kind),
                    None => {
                        tracing::warn!(match_type = raw, value, "unknown match type, row dropped");
                        return None;
                    }
                },
            };
            let mut mapping = AccountMapping::new(match_type, value, target);
            if let Some(priority) = row.integer::<i32>(&["priority"]) {
                mapping = mapping.with_priority(priority);
            }
            Some(mapping)
        })
        .collect()
}

pub fn parse_memberships(table: &Table) -> Vec<GroupMembership> {
    table
        .rows()
        .filter_map(|row| {
            let account = row.get(&["Account Number", "account_id", "account"])?;
            let group = row.get(&["Group ID", "group_id", "group"])?;
            Some(GroupMembership::new(account, group))
        })
        .collect()
}

pub fn parse_intel(table: &Table) -> Vec<AccountIntelRow> {
    table
        .rows()
        .filter_map(|row| {
            Some(AccountIntelRow {
                match_value: row.get(&["Match Value", "match_value"])?.to_string(),
                freight: row.get(&["Freight"]).unwrap_or_default().to_string(),
                terms: row.get(&["Terms"]).unwrap_or_default().to_string(),
                notes: row.get(&["Notes"]).unwrap_or_default().to_string(),
            })
        })
        .collect()
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

/// Scope columns of a terms or freight row. A bound that is present but
/// unreadable drops the row.
fn parse_scope(row: &Row<'_>) -> Option<RowScope> {
    let program = row.get(&["program_id"])?;
    match scope_bounds(row, RowScope::program(program)) {
        Ok(scope) => Some(scope),
        Err((column, value)) => {
            tracing::warn!(program, column, value, "unreadable policy row bound, row dropped");
            None
        }
    }
}

fn scope_bounds<'a>(row: &Row<'a>, scope: RowScope) -> Result<RowScope, (&'static str, &'a str)> {
    let min_total = row.parsed(&["min_total"], parse_money).map_err(|v| ("min_total", v))?;
    let max_total = row.parsed(&["max_total"], parse_money).map_err(|v| ("max_total", v))?;
    let start_date = row.parsed(&["start_date"], parse_date).map_err(|v| ("start_date", v))?;
    let end_date = row.parsed(&["end_date"], parse_date).map_err(|v| ("end_date", v))?;
    Ok(scope.total_between(min_total, max_total).dated(start_date, end_date))
}

pub fn parse_terms_rules(table: &Table) -> Vec<TermsRule> {
    table
        .rows()
        .filter_map(|row| {
            let scope = parse_scope(&row)?;
            let code = row.get(&["terms_code"])?;
            Some(TermsRule {
                net_days: row.integer(&["net_days"]),
                due_date: row.get(&["due_date"]).map(str::to_string),
                needs_review: row.flag(&["needs_review"], false),
                review_reason: row.get(&["review_reason"]).map(str::to_string),
                ..TermsRule::new(scope, code)
            })
        })
        .collect()
}

pub fn parse_freight_rules(table: &Table) -> Vec<FreightRule> {
    table
        .rows()
        .filter_map(|row| {
            let scope = parse_scope(&row)?;
            let policy = row.get(&["freight_policy"])?;
            Some(FreightRule {
                customer_tier: row.get(&["customer_tier"]).map(str::to_string),
                ffa_threshold: row.money(&["ffa_threshold"]),
                bill_freight: row.flag(&["bill_freight"], true),
                ..FreightRule::new(scope, policy)
            })
        })
        .collect()
}

pub fn parse_workflow_rules(table: &Table) -> Vec<WorkflowRule> {
    table
        .rows()
        .filter_map(|row| {
            let trigger = match row.get(&["match_type"])?.to_ascii_lowercase().as_str() {
                "always" => WorkflowTrigger::Always,
                "ship_method" => WorkflowTrigger::ShipMethod(row.get(&["match_value"])?.to_string()),
                other => {
                    tracing::warn!(match_type = other, "unknown workflow match type, row dropped");
                    return None;
                }
            };
            Some(WorkflowRule {
                program_id: row.get(&["program_id"])?.to_string(),
                trigger,
                hold_code: row.get(&["hold_code"])?.to_string(),
                message: row.get(&["message"]).unwrap_or_default().to_string(),
            })
        })
        .collect()
}

/// Load every policy table under `dir`; missing tables are empty
pub fn load_policy_tables(dir: &Path) -> Result<PolicyTables, StoreError> {
    let tables = PolicyTables {
        terms: parse_terms_rules(&Table::read_optional(&dir.join("terms_rules.csv"))?),
        freight: parse_freight_rules(&Table::read_optional(&dir.join("freight_rules.csv"))?),
        workflow: parse_workflow_rules(&Table::read_optional(&dir.join("workflow_rules.csv"))?),
        programs: parse_mappings(&Table::read_optional(&dir.join("program_rules.csv"))?),
    };
    tracing::info!(
        terms = tables.terms.len(),
        freight = tables.freight.len(),
        workflow = tables.workflow.len(),
        programs = tables.programs.len(),
        "policy tables loaded"
    );
    Ok(tables)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn table(contents: &str) -> Table {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        Table::read(file.path()).unwrap()
    }

    #[test]
    fn test_catalog_columns() {
        let catalog = parse_catalog(&table(
            "SKU,Description,MSRP,Brand,GOLD_Price,PLATINUM_Price\n\
             2070003002202 ,F7 Varsity,$499.00,Riddell,425.00,\n\
             BROKEN,No price,,,,\n\
             193092002202,Youth Zero 2,299,,0.00,250\n",
        ));

        assert_eq!(catalog.len(), 2);
        let f7 = catalog.get("2070003002202").unwrap();
        assert_eq!(f7.msrp, Decimal::from(499));
        assert_eq!(f7.brand.as_deref(), Some("Riddell"));
        assert_eq!(f7.tier_price("GOLD"), Some(Decimal::from(425)));
        assert_eq!(f7.tier_price("PLATINUM"), None);
        assert_eq!(catalog.get("193092002202").unwrap().tier_price("PLATINUM"), Some(Decimal::from(250)));
        assert_eq!(catalog.get("193092002202").unwrap().tier_price("GOLD"), Some(Decimal::ZERO));
    }

    #[test]
    fn test_mapping_layouts() {
        let legacy = parse_mappings(&table("Match Value,Program ID\n1730,PLATINUM\nBSN,GOLD\n"));
        assert_eq!(legacy.len(), 2);
        assert_eq!(legacy[0].match_type, None);
        assert_eq!(legacy[1].target, "GOLD");

        let typed = parse_mappings(&table(
            "match_type,match_value,program_id,priority\naccount_id,4883,SPORTS_LINE,\ngroup_id,BSN,BSN,10\nbogus,1,X,\n",
        ));
        assert_eq!(typed.len(), 2);
        assert_eq!(typed[0].match_type, Some(MatchType::Account));
        assert_eq!(typed[1].priority, Some(10));
    }

    #[test]
    fn test_policy_rows() {
        let terms = parse_terms_rules(&table(
            "program_id,min_total,max_total,start_date,end_date,terms_code,net_days,due_date,needs_review,review_reason\n\
             BSN,,,2026-01-01,2026-03-31,DATED,,2026-10-01,true,Early order\n",
        ));
        assert_eq!(terms[0].scope.start_date, NaiveDate::from_ymd_opt(2026, 1, 1));
        assert_eq!(terms[0].scope.min_total, None);
        assert_eq!(terms[0].due_date.as_deref(), Some("2026-10-01"));
        assert!(terms[0].needs_review);

        let freight = parse_freight_rules(&table(
            "program_id,min_total,max_total,customer_tier,freight_policy,ffa_threshold,bill_freight\n\
             STANDARD,2500,,*,FFA,2500,\n",
        ));
        assert_eq!(freight[0].ffa_threshold, Some(Decimal::from(2500)));
        assert!(freight[0].bill_freight);
        assert!(freight[0].is_any_tier());

        let workflow = parse_workflow_rules(&table(
            "program_id,match_type,match_value,hold_code,message\nALL,ship_method,WILL CALL,HOLD_WILL_CALL,Schedule pickup\nALL,sometimes,,X,\n",
        ));
        assert_eq!(workflow.len(), 1);
        assert_eq!(workflow[0].trigger, WorkflowTrigger::ShipMethod("WILL CALL".into()));
    }

    #[test]
    fn test_unreadable_bounds_drop_policy_rows() {
        let terms = parse_terms_rules(&table(
            "program_id,min_total,max_total,start_date,end_date,terms_code\n\
             BSN,5k,,,,NET_90\n\
             BSN,,,2026-13-01,,DATED\n\
             BSN,1000,,,,NET_60\n",
        ));
        assert_eq!(terms.len(), 1);
        assert_eq!(terms[0].terms_code, "NET_60");

        let freight = parse_freight_rules(&table(
            "program_id,min_total,max_total,start_date,end_date,freight_policy\n\
             STANDARD,,lots,,,FFA\n\
             STANDARD,,,,31/01/2026,FFA\n\
             STANDARD,,,,,Customer Pays Carrier Rate\n",
        ));
        assert_eq!(freight.len(), 1);
        assert_eq!(freight[0].freight_policy, "Customer Pays Carrier Rate");
    }

    #[test]
    fn test_missing_tables() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            Table::read_required(&dir.path().join("catalog.csv")),
            Err(StoreError::MissingSource(_))
        ));
        assert!(Table::read_optional(&dir.path().join("intel.csv")).unwrap().is_empty());

        let tables = load_policy_tables(&dir.path().join("policy")).unwrap();
        assert!(tables.is_empty());
    }
}
