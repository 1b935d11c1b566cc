//! Account directory and the account → tier waterfall.
//!
//! Resolution is first-match-wins with no scoring:
//! direct account mapping, then group mapping, then the `MSRP` fallback.
//! Every step leaves a trace entry, including the ones that miss.

use serde::{Deserialize, Serialize};
use tierline_shared::{TraceStep, FALLBACK_TIER};

/// What a mapping row's `match_value` refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    Account,
    Group,
    OrderType,
}

impl MatchType {
    /// Accepts `account`, `account_id`, `group`, `group_id`, `order_type`
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "account" | "account_id" => Some(MatchType::Account),
            "group" | "group_id" => Some(MatchType::Group),
            "order_type" => Some(MatchType::OrderType),
            _ => None,
        }
    }
}

/// One row of an account/group/order-type → target mapping table.
///
/// Rows without a match type come from the legacy two-column layout and
/// match both accounts and groups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountMapping {
    pub match_type: Option<MatchType>,
    pub match_value: String,
    pub target: String,
    pub priority: Option<i32>,
}

impl AccountMapping {
    pub fn new(match_type: Option<MatchType>, match_value: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            match_type,
            match_value: match_value.into().trim().to_string(),
            target: target.into().trim().to_string(),
            priority: None,
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn matches_account(&self, account_id: &str) -> bool {
        matches!(self.match_type, None | Some(MatchType::Account)) && self.match_value == account_id
    }

    pub fn matches_group<S: AsRef<str>>(&self, groups: &[S]) -> bool {
        matches!(self.match_type, None | Some(MatchType::Group))
            && groups.iter().any(|g| g.as_ref() == self.match_value)
    }
}

/// Account → group membership row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMembership {
    pub account_id: String,
    pub group_id: String,
}

impl GroupMembership {
    pub fn new(account_id: impl Into<String>, group_id: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into().trim().to_string(),
            group_id: group_id.into().trim().to_string(),
        }
    }
}

/// Resolved tier plus the waterfall that produced it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierResolution {
    pub tier: String,
    pub trace: Vec<TraceStep>,
}

/// Immutable account mapping and group membership tables
#[derive(Debug, Clone, Default)]
pub struct AccountDirectory {
    mappings: Vec<AccountMapping>,
    memberships: Vec<GroupMembership>,
}

impl AccountDirectory {
    pub fn new(mappings: Vec<AccountMapping>, memberships: Vec<GroupMembership>) -> Self {
        Self { mappings, memberships }
    }

    pub fn mappings(&self) -> &[AccountMapping] {
        &self.mappings
    }

    pub fn memberships(&self) -> &[GroupMembership] {
        &self.memberships
    }

    /// Groups an account belongs to, in membership table order, without duplicates
    pub fn groups_for(&self, account_id: &str) -> Vec<String> {
        let account_id = account_id.trim();
        let mut groups: Vec<String> = Vec::new();
        for membership in self.memberships.iter().filter(|m| m.account_id == account_id) {
            if !membership.group_id.is_empty() && !groups.contains(&membership.group_id) {
                groups.push(membership.group_id.clone());
            }
        }
        groups
    }

    /// Resolve the pricing tier for an account, `MSRP` when nothing maps
    pub fn tier_for(&self, account_id: &str) -> String {
        self.resolve_tier(account_id).tier
    }

    /// Resolve the pricing tier with a trace of every waterfall step
    pub fn resolve_tier(&self, account_id: &str) -> TierResolution {
        let account_id = account_id.trim();
        let mut trace = vec![TraceStep::new(
            "Account Lookup",
            format!("Resolving tier for account {}", account_id),
            None,
        )];

        if let Some(mapping) = self.mappings.iter().find(|m| m.matches_account(account_id)) {
            trace.push(TraceStep::new(
                "Direct Match",
                "Found direct account → tier mapping",
                Some(mapping.target.clone()),
            ));
            return TierResolution { tier: mapping.target.clone(), trace };
        }
        trace.push(TraceStep::new("Direct Match", "No direct account mapping found", None));

        let groups = self.groups_for(account_id);
        if groups.is_empty() {
            trace.push(TraceStep::new("Group Lookup", "No group memberships found", None));
        } else {
            trace.push(TraceStep::new(
                "Group Lookup",
                "Account belongs to groups",
                Some(groups.join(", ")),
            ));

            // Mapping table order decides between several member groups
            match self.mappings.iter().find(|m| m.matches_group(&groups)) {
                Some(mapping) => {
                    trace.push(TraceStep::new(
                        "Group → Tier",
                        format!("Group {} mapped to tier", mapping.match_value),
                        Some(mapping.target.clone()),
                    ));
                    return TierResolution { tier: mapping.target.clone(), trace };
                }
                None => {
                    trace.push(TraceStep::new("Group → Tier", "No group mapping found", None));
                }
            }
        }

        tracing::debug!(account_id, "no tier mapping, falling back to {}", FALLBACK_TIER);
        trace.push(TraceStep::new(
            "Fallback",
            format!("Using {} fallback", FALLBACK_TIER),
            Some(FALLBACK_TIER.to_string()),
        ));
        TierResolution {
            tier: FALLBACK_TIER.to_string(),
            trace,
        }
    }
}
