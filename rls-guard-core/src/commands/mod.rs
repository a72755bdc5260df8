//! Commands module - service layer for rls-guard operations

mod apply;
mod audit;
mod inspect;
mod plan;
pub(crate) mod service;

pub use audit::POLICY_SCHEMA;
pub use plan::{PlannedStatement, ReconciliationPlan};
pub use service::RlsGuardService;
