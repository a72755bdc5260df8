//! Database integration: the catalog client seam, its PostgreSQL implementation,
//! and connection configuration.

pub mod config;
pub(crate) mod postgres;

use async_trait::async_trait;
use thiserror::Error;

use crate::types::{PolicyRecord, SecurityStatement, TableRecord, TargetTable};

pub use config::{DatabaseConfig, SslRequirement, DATABASE_URL_ENV};
pub use postgres::PgSecurityCatalog;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("database configuration error: {0}")]
    Config(String),
    #[error("database connection error: {0}")]
    Connection(String),
    #[error("statement failed ({statement}): {message}")]
    Statement { statement: String, message: String },
    #[error("catalog query failed: {0}")]
    Query(String),
}

pub type CatalogResult<T> = Result<T, CatalogError>;

/// Everything the service needs from the database.
///
/// Implementations run each call to completion before returning; the service
/// never issues two calls concurrently within one operation.
#[async_trait]
pub trait SecurityCatalog: Send + Sync {
    /// Run one statement outside any explicit transaction
    async fn execute(&self, statement: &SecurityStatement) -> CatalogResult<()>;

    /// Run all statements in one transaction, rolling back on the first failure
    async fn execute_atomically(&self, statements: &[SecurityStatement]) -> CatalogResult<()>;

    /// Look up a table by name. `None` when the catalog has no such table.
    async fn find_table(&self, table: TargetTable) -> CatalogResult<Option<TableRecord>>;

    /// Policies defined in `schema`, ordered by table then policy name
    async fn list_policies(&self, schema: &str) -> CatalogResult<Vec<PolicyRecord>>;
}
