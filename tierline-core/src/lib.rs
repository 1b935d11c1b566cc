pub mod accounts;
pub mod intel;

pub use accounts::{AccountDirectory, AccountMapping, GroupMembership, MatchType, TierResolution};
pub use intel::{AccountIntelRow, IntelDirectory};
