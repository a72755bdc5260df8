//! Data model: target tables, declared policies, reconciliation statements and the
//! projections returned by inspection and audit.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Application tables that carry row-level security.
///
/// The set is fixed; [`TargetTable::ALL`] is also the order in which tables are
/// reconciled and reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetTable {
    Users,
    Customers,
    Invoices,
    Revenue,
}

impl TargetTable {
    pub const ALL: [Self; 4] = [Self::Users, Self::Customers, Self::Invoices, Self::Revenue];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Customers => "customers",
            Self::Invoices => "invoices",
            Self::Revenue => "revenue",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|table| table.name() == name)
    }
}

impl fmt::Display for TargetTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Command scope a policy applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PolicyCommand {
    Select,
    Update,
    All,
}

impl PolicyCommand {
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Select => "SELECT",
            Self::Update => "UPDATE",
            Self::All => "ALL",
        }
    }
}

impl fmt::Display for PolicyCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// A policy this tool installs on one of the target tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SecurityPolicy {
    pub table: TargetTable,
    pub name: &'static str,
    pub command: PolicyCommand,
    /// SQL boolean expression used in the `USING` clause
    pub predicate: &'static str,
}

/// One step of a reconciliation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SecurityStatement {
    EnableRowLevelSecurity { table: TargetTable },
    DropPolicy {
        table: TargetTable,
        policy: &'static str,
    },
    CreatePolicy(SecurityPolicy),
}

impl SecurityStatement {
    pub const fn table(&self) -> TargetTable {
        match self {
            Self::EnableRowLevelSecurity { table } | Self::DropPolicy { table, .. } => *table,
            Self::CreatePolicy(policy) => policy.table,
        }
    }
}

/// Row returned by the catalog for a table lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRecord {
    pub schema: String,
    pub table: String,
    pub rls_enabled: bool,
}

/// Current row-level security state of one target table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityStatus {
    pub table: String,
    pub rls_enabled: bool,
    pub schema: String,
}

impl SecurityStatus {
    pub(crate) fn from_record(table: TargetTable, record: TableRecord) -> Self {
        Self {
            table: table.name().to_string(),
            rls_enabled: record.rls_enabled,
            schema: record.schema,
        }
    }
}

/// A policy as listed by the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyRecord {
    pub schema: String,
    pub table: String,
    pub name: String,
    pub command: String,
}

/// A declared policy that is absent from the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingPolicy {
    pub table: TargetTable,
    pub name: &'static str,
}

/// Declared policies compared against what the catalog reports.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyAudit {
    /// Policies found in the audited schema, ordered by table then name
    pub present: Vec<PolicyRecord>,
    pub missing: Vec<MissingPolicy>,
    /// Policies on target tables that this tool does not declare
    pub unexpected: Vec<PolicyRecord>,
}

impl PolicyAudit {
    pub fn is_compliant(&self) -> bool {
        self.missing.is_empty() && self.unexpected.is_empty()
    }
}

/// How the reconciliation statements are submitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplyMode {
    /// One statement at a time. A failure leaves earlier statements applied.
    #[default]
    Sequential,
    /// All statements inside a single transaction
    Transactional,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ApplyOptions {
    pub mode: ApplyMode,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyResult {
    pub success: bool,
    pub message: String,
    pub mode: ApplyMode,
    pub statements_executed: usize,
}
