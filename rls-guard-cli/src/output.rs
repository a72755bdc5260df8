//! Human-readable and JSON rendering for CLI results

use anyhow::{Context, Result};
use rls_guard_core::{PolicyAudit, ReconciliationPlan, SecurityStatus, TargetTable};
use serde::Serialize;

pub fn print_plan(plan: &ReconciliationPlan, json: bool) -> Result<()> {
    let rendered = plan.rendered();
    if json {
        return print_json(&rendered);
    }
    for statement in rendered {
        println!("{};", statement.sql);
    }
    Ok(())
}

pub fn print_status(statuses: &[SecurityStatus], json: bool) -> Result<()> {
    if json {
        return print_json(&statuses);
    }
    print!("{}", render_status(statuses));
    Ok(())
}

pub fn print_audit(audit: &PolicyAudit, json: bool) -> Result<()> {
    if json {
        return print_json(audit);
    }
    print!("{}", render_audit(audit));
    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{text}");
    Ok(())
}

/// One line per target table, including tables the catalog does not have
fn render_status(statuses: &[SecurityStatus]) -> String {
    TargetTable::ALL
        .iter()
        .map(|table| match statuses.iter().find(|s| s.table == table.name()) {
            Some(status) => {
                let state = if status.rls_enabled {
                    "enabled"
                } else {
                    "DISABLED"
                };
                format!("{table}: RLS {state} (schema {})\n", status.schema)
            }
            None => format!("{table}: not found\n"),
        })
        .collect()
}

fn render_audit(audit: &PolicyAudit) -> String {
    let mut lines = Vec::new();
    if audit.present.is_empty() {
        lines.push("No policies found".to_string());
    } else {
        lines.push("Policies found:".to_string());
        lines.extend(audit.present.iter().map(|policy| {
            format!("  - {}.{} ({})", policy.table, policy.name, policy.command)
        }));
    }
    lines.extend(
        audit
            .missing
            .iter()
            .map(|missing| format!("missing: {}.{}", missing.table, missing.name)),
    );
    lines.extend(
        audit
            .unexpected
            .iter()
            .map(|extra| format!("unexpected: {}.{}", extra.table, extra.name)),
    );
    if audit.is_compliant() {
        lines.push("All declared policies are installed".to_string());
    }
    lines.iter().map(|line| format!("{line}\n")).collect()
}
