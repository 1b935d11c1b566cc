//! Program Resolver
//!
//! Order type first so that global order types such as trade-ins are never
//! shadowed by an account or group program. Always resolves to a program;
//! `STANDARD` when nothing maps.

use tierline_core::{AccountMapping, MatchType};
use tierline_shared::FALLBACK_PROGRAM;

/// Program assigned to trade-in order types that have no explicit row
pub const TRADE_IN_PROGRAM: &str = "TRADE_IN";

/// Where a program came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgramSource {
    OrderType,
    TradeIn,
    Account,
    Group,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramResolution {
    pub program_id: String,
    pub source: ProgramSource,
}

#[derive(Debug, Clone, Default)]
pub struct ProgramResolver {
    rules: Vec<AccountMapping>,
    trade_in_order_types: Vec<u32>,
}

impl ProgramResolver {
    pub fn new(rules: Vec<AccountMapping>, trade_in_order_types: Vec<u32>) -> Self {
        Self {
            rules,
            trade_in_order_types,
        }
    }

    pub fn resolve_program(&self, account_id: &str, groups: &[String], order_type: Option<u32>) -> String {
        self.resolve(account_id, groups, order_type).program_id
    }

    pub fn resolve(&self, account_id: &str, groups: &[String], order_type: Option<u32>) -> ProgramResolution {
        let found = |program_id: &str, source| ProgramResolution {
            program_id: program_id.to_string(),
            source,
        };

        if let Some(order_type) = order_type {
            let value = order_type.to_string();
            if let Some(rule) = self
                .rules
                .iter()
                .find(|r| r.match_type == Some(MatchType::OrderType) && r.match_value == value)
            {
                return found(&rule.target, ProgramSource::OrderType);
            }
            if self.trade_in_order_types.contains(&order_type) {
                return found(TRADE_IN_PROGRAM, ProgramSource::TradeIn);
            }
        }

        let account_id = account_id.trim();
        if !account_id.is_empty() {
            if let Some(rule) = self.rules.iter().find(|r| r.matches_account(account_id)) {
                return found(&rule.target, ProgramSource::Account);
            }
        }

        // Lowest priority number wins, unprioritized rows last, ties keep table order
        if let Some(rule) = self
            .rules
            .iter()
            .filter(|r| r.matches_group(groups))
            .min_by_key(|r| (r.priority.is_none(), r.priority.unwrap_or_default()))
        {
            return found(&rule.target, ProgramSource::Group);
        }

        found(FALLBACK_PROGRAM, ProgramSource::Fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn groups(names: &[&str]) -> Vec<String> {
        names.iter().map(|g| g.to_string()).collect()
    }

    fn resolver() -> ProgramResolver {
        ProgramResolver::new(
            vec![
                AccountMapping::new(Some(MatchType::Account), "4883", "SPORTS_LINE"),
                AccountMapping::new(Some(MatchType::Group), "BSN", "BSN"),
                AccountMapping::new(Some(MatchType::Group), "INTL", "INTERNATIONAL").with_priority(5),
                AccountMapping::new(Some(MatchType::OrderType), "40", "EMPLOYEE"),
            ],
            vec![25, 26],
        )
    }

    #[test]
    fn test_account_then_group() {
        let resolver = resolver();
        assert_eq!(resolver.resolve_program("4883", &[], None), "SPORTS_LINE");
        assert_eq!(resolver.resolve_program("11730", &groups(&["BSN"]), None), "BSN");
    }

    #[test]
    fn test_prioritized_group_row_wins() {
        let resolution = resolver().resolve("777", &groups(&["BSN", "INTL"]), None);
        assert_eq!(resolution.program_id, "INTERNATIONAL");
        assert_eq!(resolution.source, ProgramSource::Group);
    }

    #[test]
    fn test_order_type_beats_account() {
        let resolver = resolver();
        assert_eq!(resolver.resolve_program("4883", &[], Some(40)), "EMPLOYEE");
        assert_eq!(resolver.resolve_program("11730", &groups(&["BSN"]), Some(25)), "TRADE_IN");
        assert_eq!(resolver.resolve_program("11730", &groups(&["BSN"]), Some(26)), "TRADE_IN");
        assert_eq!(resolver.resolve_program("11730", &groups(&["BSN"]), Some(1)), "BSN");
    }

    #[test]
    fn test_fallback_is_total() {
        let empty = ProgramResolver::default();
        for account in ["", "99999", "4883"] {
            assert_eq!(empty.resolve_program(account, &[], None), "STANDARD");
        }
        assert_eq!(resolver().resolve("99999", &groups(&["NONE"]), None).source, ProgramSource::Fallback);
    }
}
