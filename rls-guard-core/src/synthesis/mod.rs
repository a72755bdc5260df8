//! Statement synthesis (deterministic SQL generation from the declared policy set)

pub mod policy_set;
pub mod statement_builder;

pub use policy_set::{declared_policies, PERMISSIVE_PREDICATE};
pub use statement_builder::{reconciliation_statements, render_statement};
