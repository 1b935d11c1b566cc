//! Account intelligence: freight and terms hints for sales staff.

use serde::{Deserialize, Serialize};
use tierline_shared::{AccountIntel, FALLBACK_TIER};

use crate::accounts::AccountDirectory;

/// One row of the account intel table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountIntelRow {
    pub match_value: String,
    pub freight: String,
    pub terms: String,
    pub notes: String,
}

impl From<&AccountIntelRow> for AccountIntel {
    fn from(row: &AccountIntelRow) -> Self {
        AccountIntel {
            match_value: row.match_value.clone(),
            freight: row.freight.clone(),
            terms: row.terms.clone(),
            notes: row.notes.clone(),
        }
    }
}

/// Intel rows looked up through account, then group, then the `MSRP` row
#[derive(Debug, Clone, Default)]
pub struct IntelDirectory {
    rows: Vec<AccountIntelRow>,
}

impl IntelDirectory {
    pub fn new(rows: Vec<AccountIntelRow>) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Resolve intel for an account. Never fails: an unmatched account gets
    /// the synthetic `Unknown` record.
    pub fn resolve(&self, accounts: &AccountDirectory, account_id: &str) -> AccountIntel {
        let account_id = account_id.trim();

        if let Some(row) = self.rows.iter().find(|r| r.match_value == account_id) {
            return row.into();
        }

        let groups = accounts.groups_for(account_id);
        if !groups.is_empty() {
            if let Some(row) = self.rows.iter().find(|r| groups.contains(&r.match_value)) {
                return row.into();
            }
        }

        self.rows
            .iter()
            .find(|r| r.match_value == FALLBACK_TIER)
            .map(AccountIntel::from)
            .unwrap_or_else(AccountIntel::unknown)
    }
}
