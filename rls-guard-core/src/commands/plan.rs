//! Reconciliation plan: the ordered statements an apply run will issue

use serde::Serialize;

use crate::synthesis::{reconciliation_statements, render_statement};
use crate::types::SecurityStatement;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciliationPlan {
    statements: Vec<SecurityStatement>,
}

/// One rendered step, for previews
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedStatement {
    pub table: String,
    pub sql: String,
}

impl ReconciliationPlan {
    /// Plan for the declared policy set
    pub fn declared() -> Self {
        Self {
            statements: reconciliation_statements(),
        }
    }

    pub fn statements(&self) -> &[SecurityStatement] {
        &self.statements
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// The plan as SQL, in execution order
    pub fn rendered(&self) -> Vec<PlannedStatement> {
        self.statements
            .iter()
            .map(|statement| PlannedStatement {
                table: statement.table().name().to_string(),
                sql: render_statement(statement),
            })
            .collect()
    }
}
