//! Stacking policy for price-modifying rules.

use crate::rules::Rule;

/// Decides whether a matched price rule may apply on top of the rules
/// already applied to the same line.
pub trait StackingPolicy: Send + Sync + std::fmt::Debug {
    fn admits(&self, applied: &[&Rule], candidate: &Rule) -> bool;
}

/// Every matched rule applies, each on the output of the previous one
#[derive(Debug, Clone, Copy, Default)]
pub struct CumulativeStacking;

impl StackingPolicy for CumulativeStacking {
    fn admits(&self, _applied: &[&Rule], _candidate: &Rule) -> bool {
        true
    }
}
