//! Policy audit: compare the catalog's policies with the declared set

use log::{error, info};

use crate::error::{RlsGuardError, RlsGuardResult};
use crate::synthesis::declared_policies;
use crate::synthesis::policy_set::is_declared;
use crate::types::{MissingPolicy, PolicyAudit, PolicyRecord, TargetTable};

/// Schema whose policies are audited
pub const POLICY_SCHEMA: &str = "public";

impl super::service::RlsGuardService {
    /// List the policies in [`POLICY_SCHEMA`] and report declared policies that are
    /// missing and extra policies found on target tables.
    pub async fn audit_policies(&self) -> RlsGuardResult<PolicyAudit> {
        let present = self
            .catalog
            .list_policies(POLICY_SCHEMA)
            .await
            .map_err(|source| {
                error!("Failed to list policies in schema '{}': {}", POLICY_SCHEMA, source);
                RlsGuardError::Audit(source)
            })?;

        let audit = compare_policies(present);
        info!(
            "Policy audit: {} present, {} missing, {} unexpected",
            audit.present.len(),
            audit.missing.len(),
            audit.unexpected.len()
        );
        Ok(audit)
    }
}

fn compare_policies(present: Vec<PolicyRecord>) -> PolicyAudit {
    let missing = declared_policies()
        .iter()
        .filter(|declared| {
            !present
                .iter()
                .any(|p| p.table == declared.table.name() && p.name == declared.name)
        })
        .map(|declared| MissingPolicy {
            table: declared.table,
            name: declared.name,
        })
        .collect();

    let unexpected = present
        .iter()
        .filter(|p| {
            TargetTable::from_name(&p.table).is_some_and(|table| !is_declared(table, &p.name))
        })
        .cloned()
        .collect();

    PolicyAudit {
        present,
        missing,
        unexpected,
    }
}
