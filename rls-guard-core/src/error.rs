//! Errors returned by service operations

use thiserror::Error;

use crate::catalog::CatalogError;
use crate::types::{SecurityStatus, TargetTable};

#[derive(Debug, Error)]
pub enum RlsGuardError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Reconciliation stopped. In sequential mode the `completed` statements stay applied.
    #[error("Reconciliation failed after {completed} statement(s): {source}")]
    Reconcile {
        completed: usize,
        #[source]
        source: CatalogError,
    },

    /// Inspection stopped at `table`; `partial` holds the entries collected before it.
    #[error("Inspection failed at table '{table}': {source}")]
    Inspect {
        table: TargetTable,
        partial: Vec<SecurityStatus>,
        #[source]
        source: CatalogError,
    },

    #[error("Policy audit failed: {0}")]
    Audit(#[source] CatalogError),
}

pub type RlsGuardResult<T> = Result<T, RlsGuardError>;

impl RlsGuardError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Short reason that is safe to show to whoever triggered the operation.
    ///
    /// Never includes SQL, connection strings or server messages; those only go to the log.
    pub const fn public_message(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "database security is not configured",
            Self::Reconcile { .. } => "unable to enable database security policies",
            Self::Inspect { .. } => "unable to check database security status",
            Self::Audit(_) => "unable to list database security policies",
        }
    }

    /// Entries an inspection collected before it failed. Empty for other errors.
    pub fn partial_statuses(&self) -> &[SecurityStatus] {
        match self {
            Self::Inspect { partial, .. } => partial,
            _ => &[],
        }
    }
}
