//! Inspection logic: report the current RLS state of the target tables

use log::{debug, error};

use crate::error::{RlsGuardError, RlsGuardResult};
use crate::types::{SecurityStatus, TargetTable};

impl super::service::RlsGuardService {
    /// Read the RLS flag of each target table from the catalog.
    ///
    /// Entries come back in [`TargetTable::ALL`] order. Tables the catalog does
    /// not know are omitted. A failed lookup stops the scan; the entries gathered
    /// so far travel in the error (see [`RlsGuardError::partial_statuses`]).
    pub async fn inspect(&self) -> RlsGuardResult<Vec<SecurityStatus>> {
        let mut statuses = Vec::with_capacity(TargetTable::ALL.len());

        for table in TargetTable::ALL {
            match self.catalog.find_table(table).await {
                Ok(Some(record)) => {
                    debug!(
                        "Table {}.{}: rls_enabled={}",
                        record.schema, record.table, record.rls_enabled
                    );
                    statuses.push(SecurityStatus::from_record(table, record));
                }
                Ok(None) => debug!("Table '{}' not found in catalog, omitting", table),
                Err(source) => {
                    error!("Failed to inspect table '{}': {}", table, source);
                    return Err(RlsGuardError::Inspect {
                        table,
                        partial: statuses,
                        source,
                    });
                }
            }
        }

        Ok(statuses)
    }
}
