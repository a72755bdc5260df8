//! This crate provides the core logic for rls-guard:
//! - The declared row-level security policy set for the application tables
//! - Idempotent reconciliation of that policy set against PostgreSQL
//! - Catalog inspection (RLS state per table, installed policies)
//!

mod catalog;
pub mod commands;
mod error;
mod synthesis;
#[cfg(any(test, feature = "test-utils"))]
pub mod testing;
mod types;

// Re-exports for a small, focused public API
pub use catalog::{
    CatalogError, CatalogResult, DatabaseConfig, PgSecurityCatalog, SecurityCatalog,
    SslRequirement, DATABASE_URL_ENV,
};
pub use commands::{PlannedStatement, ReconciliationPlan, RlsGuardService, POLICY_SCHEMA};
pub use error::{RlsGuardError, RlsGuardResult};
pub use synthesis::{declared_policies, render_statement, PERMISSIVE_PREDICATE};
pub use types::{
    ApplyMode, ApplyOptions, ApplyResult, MissingPolicy, PolicyAudit, PolicyCommand,
    PolicyRecord, SecurityPolicy, SecurityStatement, SecurityStatus, TableRecord, TargetTable,
};
