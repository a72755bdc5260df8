//! In-memory catalog for tests.
//!
//! Models the parts of PostgreSQL the reconciler touches: which target tables
//! exist, their RLS flag, and the policies attached to them. Statements follow
//! the same rules as the rendered SQL: everything is a no-op on a table that is
//! missing or outside the search path, and creating a policy whose name already
//! exists on the table fails. Lookups resolve names through the same search path.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::catalog::{CatalogError, CatalogResult, SecurityCatalog};
use crate::synthesis::render_statement;
use crate::types::{PolicyCommand, PolicyRecord, SecurityStatement, TableRecord, TargetTable};

#[derive(Debug, Clone)]
struct TableState {
    schema: String,
    rls_enabled: bool,
    policies: Vec<(String, String)>,
}

#[derive(Debug, Clone)]
struct CatalogState {
    search_path: Vec<String>,
    tables: BTreeMap<TargetTable, TableState>,
    executed: Vec<SecurityStatement>,
    failing_statement: Option<SecurityStatement>,
    failing_lookup: Option<TargetTable>,
    failing_policy_listing: bool,
    disconnected: bool,
}

impl Default for CatalogState {
    fn default() -> Self {
        Self {
            search_path: vec!["public".to_string()],
            tables: BTreeMap::new(),
            executed: Vec::new(),
            failing_statement: None,
            failing_lookup: None,
            failing_policy_listing: false,
            disconnected: false,
        }
    }
}

#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    state: Mutex<CatalogState>,
}

impl InMemoryCatalog {
    /// A database without any of the target tables
    pub fn new() -> Self {
        Self::default()
    }

    /// A database where `tables` exist in `public` with RLS off and no policies
    pub fn with_tables(tables: impl IntoIterator<Item = TargetTable>) -> Self {
        tables
            .into_iter()
            .fold(Self::new(), |catalog, table| catalog.with_table(table, "public", false))
    }

    pub fn with_table(self, table: TargetTable, schema: &str, rls_enabled: bool) -> Self {
        self.lock().tables.insert(
            table,
            TableState {
                schema: schema.to_string(),
                rls_enabled,
                policies: Vec::new(),
            },
        );
        self
    }

    /// Replace the search path (`public` by default)
    pub fn with_search_path<S: Into<String>>(self, schemas: impl IntoIterator<Item = S>) -> Self {
        self.lock().search_path = schemas.into_iter().map(Into::into).collect();
        self
    }

    /// Attach a policy to an existing table. Ignored if the table is absent.
    pub fn with_policy(self, table: TargetTable, name: &str, command: PolicyCommand) -> Self {
        if let Some(state) = self.lock().tables.get_mut(&table) {
            state
                .policies
                .push((name.to_string(), command.as_sql().to_string()));
        }
        self
    }

    /// Make `statement` fail every time it is executed
    pub fn fail_on_statement(&self, statement: SecurityStatement) {
        self.lock().failing_statement = Some(statement);
    }

    pub fn fail_lookup_of(&self, table: TargetTable) {
        self.lock().failing_lookup = Some(table);
    }

    pub fn fail_policy_listing(&self) {
        self.lock().failing_policy_listing = true;
    }

    /// Every call fails with a connection error from now on
    pub fn disconnect(&self) {
        self.lock().disconnected = true;
    }

    /// Statements that completed, in order
    pub fn executed(&self) -> Vec<SecurityStatement> {
        self.lock().executed.clone()
    }

    pub fn rls_enabled(&self, table: TargetTable) -> Option<bool> {
        self.lock().tables.get(&table).map(|t| t.rls_enabled)
    }

    pub fn policy_names(&self, table: TargetTable) -> Vec<String> {
        self.lock()
            .tables
            .get(&table)
            .map(|t| t.policies.iter().map(|(name, _)| name.clone()).collect())
            .unwrap_or_default()
    }

    fn lock(&self) -> MutexGuard<'_, CatalogState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CatalogState {
    fn is_visible(&self, table: &TableState) -> bool {
        self.search_path.iter().any(|schema| *schema == table.schema)
    }

    fn visible_table(&self, table: TargetTable) -> Option<&TableState> {
        self.tables.get(&table).filter(|t| self.is_visible(t))
    }

    fn visible_table_mut(&mut self, table: TargetTable) -> Option<&mut TableState> {
        let search_path = &self.search_path;
        self.tables
            .get_mut(&table)
            .filter(|t| search_path.iter().any(|schema| *schema == t.schema))
    }

    fn check_connected(&self) -> CatalogResult<()> {
        if self.disconnected {
            return Err(CatalogError::Connection(
                "connection refused".to_string(),
            ));
        }
        Ok(())
    }

    fn apply(&mut self, statement: &SecurityStatement) -> CatalogResult<()> {
        if self.failing_statement.as_ref() == Some(statement) {
            return Err(CatalogError::Statement {
                statement: render_statement(statement),
                message: "injected failure".to_string(),
            });
        }

        let Some(table) = self.visible_table_mut(statement.table()) else {
            self.executed.push(*statement);
            return Ok(());
        };

        match statement {
            SecurityStatement::EnableRowLevelSecurity { .. } => table.rls_enabled = true,
            SecurityStatement::DropPolicy { policy, .. } => {
                table.policies.retain(|(name, _)| name != policy);
            }
            SecurityStatement::CreatePolicy(policy) => {
                if table.policies.iter().any(|(name, _)| name == policy.name) {
                    return Err(CatalogError::Statement {
                        statement: render_statement(statement),
                        message: format!(
                            "policy \"{}\" for table \"{}\" already exists",
                            policy.name, policy.table
                        ),
                    });
                }
                table
                    .policies
                    .push((policy.name.to_string(), policy.command.as_sql().to_string()));
            }
        }
        self.executed.push(*statement);
        Ok(())
    }
}

#[async_trait]
impl SecurityCatalog for InMemoryCatalog {
    async fn execute(&self, statement: &SecurityStatement) -> CatalogResult<()> {
        let mut state = self.lock();
        state.check_connected()?;
        state.apply(statement)
    }

    async fn execute_atomically(&self, statements: &[SecurityStatement]) -> CatalogResult<()> {
        let mut state = self.lock();
        state.check_connected()?;
        let snapshot = state.clone();
        for statement in statements {
            if let Err(e) = state.apply(statement) {
                *state = snapshot;
                return Err(e);
            }
        }
        Ok(())
    }

    async fn find_table(&self, table: TargetTable) -> CatalogResult<Option<TableRecord>> {
        let state = self.lock();
        state.check_connected()?;
        if state.failing_lookup == Some(table) {
            return Err(CatalogError::Query(format!(
                "injected failure looking up {table}"
            )));
        }
        Ok(state.visible_table(table).map(|t| TableRecord {
            schema: t.schema.clone(),
            table: table.name().to_string(),
            rls_enabled: t.rls_enabled,
        }))
    }

    async fn list_policies(&self, schema: &str) -> CatalogResult<Vec<PolicyRecord>> {
        let state = self.lock();
        state.check_connected()?;
        if state.failing_policy_listing {
            return Err(CatalogError::Query("injected failure listing policies".to_string()));
        }
        let mut records: Vec<PolicyRecord> = state
            .tables
            .iter()
            .filter(|(_, t)| t.schema == schema)
            .flat_map(|(table, t)| {
                t.policies.iter().map(move |(name, command)| PolicyRecord {
                    schema: t.schema.clone(),
                    table: table.name().to_string(),
                    name: name.clone(),
                    command: command.clone(),
                })
            })
            .collect();
        records.sort_by(|a, b| (&a.table, &a.name).cmp(&(&b.table, &b.name)));
        Ok(records)
    }
}
