pub mod config;
pub mod engine;
pub mod freight;
pub mod holds;
pub mod program;
pub mod tables;
pub mod terms;

pub use config::PolicyConfig;
pub use engine::OrderPolicyEngine;
pub use freight::{resolve_freight, sports_line_surcharge, Surcharge};
pub use holds::{international_hold, workflow_holds};
pub use program::{ProgramResolution, ProgramResolver, ProgramSource, TRADE_IN_PROGRAM};
pub use tables::{FreightRule, PolicyTables, RowScope, ScopedRow, TermsRule, WorkflowRule, WorkflowTrigger};
pub use terms::resolve_terms;
