//! PostgreSQL implementation of the catalog client

use async_trait::async_trait;
use log::debug;
use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::catalog::{CatalogError, CatalogResult, DatabaseConfig, SecurityCatalog};
use crate::synthesis::render_statement;
use crate::types::{PolicyRecord, SecurityStatement, TableRecord, TargetTable};

// Resolve the bare name through the search path, exactly as the rendered
// `ALTER TABLE IF EXISTS` and `to_regclass` guards do.
const FIND_TABLE_SQL: &str = "SELECT n.nspname::text, c.relname::text, c.relrowsecurity \
     FROM pg_catalog.pg_class c \
     JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace \
     WHERE c.oid = to_regclass(quote_ident($1)) \
       AND c.relkind IN ('r', 'p')";

const LIST_POLICIES_SQL: &str = "SELECT schemaname::text, tablename::text, policyname::text, cmd \
     FROM pg_catalog.pg_policies \
     WHERE schemaname = $1 \
     ORDER BY tablename, policyname";

pub struct PgSecurityCatalog {
    pool: PgPool,
}

impl PgSecurityCatalog {
    /// Build a pool that opens connections on first use
    pub fn connect_lazy(config: &DatabaseConfig) -> CatalogResult<Self> {
        let options = config.connect_options()?;
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .idle_timeout(config.idle_timeout)
            .acquire_timeout(config.connect_timeout)
            .connect_lazy_with(options);
        debug!(
            "Configured PostgreSQL pool for {} (max {} connections, ssl {})",
            config.redacted_url(),
            config.max_connections,
            config.ssl
        );
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SecurityCatalog for PgSecurityCatalog {
    async fn execute(&self, statement: &SecurityStatement) -> CatalogResult<()> {
        let sql = render_statement(statement);
        debug!("Executing: {sql}");
        sqlx::raw_sql(&sql)
            .execute(&self.pool)
            .await
            .map_err(|e| statement_error(&sql, e))?;
        Ok(())
    }

    async fn execute_atomically(&self, statements: &[SecurityStatement]) -> CatalogResult<()> {
        let script = transaction_script(statements);
        debug!("Executing as one transaction:\n{script}");
        sqlx::raw_sql(&script)
            .execute(&self.pool)
            .await
            .map_err(|e| statement_error(&script, e))?;
        Ok(())
    }

    async fn find_table(&self, table: TargetTable) -> CatalogResult<Option<TableRecord>> {
        let row: Option<(String, String, bool)> = sqlx::query_as(FIND_TABLE_SQL)
            .bind(table.name())
            .fetch_optional(&self.pool)
            .await
            .map_err(query_error)?;

        Ok(row.map(|(schema, table, rls_enabled)| TableRecord {
            schema,
            table,
            rls_enabled,
        }))
    }

    async fn list_policies(&self, schema: &str) -> CatalogResult<Vec<PolicyRecord>> {
        let rows: Vec<(String, String, String, String)> = sqlx::query_as(LIST_POLICIES_SQL)
            .bind(schema)
            .fetch_all(&self.pool)
            .await
            .map_err(query_error)?;

        Ok(rows
            .into_iter()
            .map(|(schema, table, name, command)| PolicyRecord {
                schema,
                table,
                name,
                command,
            })
            .collect())
    }
}

/// Join statements into one simple-protocol query.
///
/// PostgreSQL runs a multi-statement query without explicit transaction
/// control as a single implicit transaction, so any failure undoes the whole
/// script.
fn transaction_script(statements: &[SecurityStatement]) -> String {
    statements
        .iter()
        .map(render_statement)
        .collect::<Vec<_>>()
        .join(";\n")
}

fn is_connection_failure(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Configuration(_)
    )
}

fn connection_error(err: sqlx::Error) -> CatalogError {
    CatalogError::Connection(err.to_string())
}

fn statement_error(sql: &str, err: sqlx::Error) -> CatalogError {
    if is_connection_failure(&err) {
        return connection_error(err);
    }
    CatalogError::Statement {
        statement: sql.to_string(),
        message: err.to_string(),
    }
}

fn query_error(err: sqlx::Error) -> CatalogError {
    if is_connection_failure(&err) {
        return connection_error(err);
    }
    CatalogError::Query(err.to_string())
}
