pub mod engine;
pub mod rules;
pub mod stacking;

pub use engine::PricingEngine;
pub use rules::compiler::{compile_rows, load_compiled, CompileError, CompiledRules, LoadedRules, RuleError, RuleRow};
pub use rules::matcher::{apply_rule_to_price, split_groups, MatchedRule, RuleContext, RuleMatcher, RuleOutcome};
pub use rules::validation::{RuleValidation, RuleValidator};
pub use rules::{Rule, RuleAction, RuleMatch};
pub use stacking::{CumulativeStacking, StackingPolicy};
