//! Apply logic: bring the database to the declared security state

use log::{debug, error, info, warn};

use crate::commands::plan::ReconciliationPlan;
use crate::error::{RlsGuardError, RlsGuardResult};
use crate::types::{ApplyMode, ApplyOptions, ApplyResult};

pub(crate) const APPLY_SUCCESS_MESSAGE: &str = "Database security policies enabled";

impl super::service::RlsGuardService {
    /// Enable RLS on every target table and recreate the declared policies.
    ///
    /// Safe to run repeatedly: enabling RLS twice is a no-op and each policy is
    /// dropped before it is recreated. In [`ApplyMode::Sequential`] the first
    /// failing statement stops the run and everything before it stays applied.
    pub async fn apply(&self, options: ApplyOptions) -> RlsGuardResult<ApplyResult> {
        let plan = ReconciliationPlan::declared();
        info!(
            "Applying {} security statements ({:?} mode)",
            plan.len(),
            options.mode
        );

        match options.mode {
            ApplyMode::Sequential => {
                for (completed, statement) in plan.statements().iter().enumerate() {
                    debug!("Step {}: {:?}", completed + 1, statement);
                    if let Err(source) = self.catalog.execute(statement).await {
                        error!(
                            "Security reconciliation aborted at step {} on table '{}': {}",
                            completed + 1,
                            statement.table(),
                            source
                        );
                        if completed > 0 {
                            warn!(
                                "{} statement(s) were applied before the failure and were not rolled back",
                                completed
                            );
                        }
                        return Err(RlsGuardError::Reconcile { completed, source });
                    }
                }
            }
            ApplyMode::Transactional => {
                if let Err(source) = self.catalog.execute_atomically(plan.statements()).await {
                    error!("Security reconciliation rolled back: {}", source);
                    return Err(RlsGuardError::Reconcile {
                        completed: 0,
                        source,
                    });
                }
            }
        }

        info!("{}", APPLY_SUCCESS_MESSAGE);
        Ok(ApplyResult {
            success: true,
            message: APPLY_SUCCESS_MESSAGE.to_string(),
            mode: options.mode,
            statements_executed: plan.len(),
        })
    }
}
