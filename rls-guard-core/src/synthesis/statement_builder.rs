use crate::synthesis::policy_set::declared_policies;
use crate::types::{SecurityStatement, TargetTable};

/// Build the full reconciliation sequence.
///
/// Order: enable RLS on every target table, then drop every declared policy
/// name, then create each declared policy in declaration order. RLS is
/// therefore on before any policy for the same table is created.
pub fn reconciliation_statements() -> Vec<SecurityStatement> {
    let enable = TargetTable::ALL
        .into_iter()
        .map(|table| SecurityStatement::EnableRowLevelSecurity { table });

    let drop = declared_policies()
        .iter()
        .map(|policy| SecurityStatement::DropPolicy {
            table: policy.table,
            policy: policy.name,
        });

    let create = declared_policies()
        .iter()
        .copied()
        .map(SecurityStatement::CreatePolicy);

    enable.chain(drop).chain(create).collect()
}

/// Render a statement as PostgreSQL.
///
/// Every statement is a no-op when its table does not exist, so a run against a
/// database without the application tables succeeds without changing anything.
pub fn render_statement(statement: &SecurityStatement) -> String {
    match statement {
        SecurityStatement::EnableRowLevelSecurity { table } => format!(
            "ALTER TABLE IF EXISTS {} ENABLE ROW LEVEL SECURITY",
            quote_ident(table.name())
        ),
        SecurityStatement::DropPolicy { table, policy } => when_table_exists(
            *table,
            &format!(
                "DROP POLICY IF EXISTS {} ON {}",
                quote_ident(policy),
                quote_ident(table.name())
            ),
        ),
        SecurityStatement::CreatePolicy(policy) => when_table_exists(
            policy.table,
            &format!(
                "CREATE POLICY {} ON {} FOR {} USING ({})",
                quote_ident(policy.name),
                quote_ident(policy.table.name()),
                policy.command.as_sql(),
                policy.predicate
            ),
        ),
    }
}

fn when_table_exists(table: TargetTable, body: &str) -> String {
    format!(
        "DO $rls$ BEGIN IF to_regclass({}) IS NOT NULL THEN {}; END IF; END $rls$",
        quote_literal(&quote_ident(table.name())),
        body
    )
}

fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
