use crate::types::{PolicyCommand, SecurityPolicy, TargetTable};

/// Every declared policy uses this predicate, so enabling RLS does not hide any rows.
pub const PERMISSIVE_PREDICATE: &str = "true";

const DECLARED_POLICIES: [SecurityPolicy; 7] = [
    SecurityPolicy {
        table: TargetTable::Users,
        name: "Users can view their own data",
        command: PolicyCommand::Select,
        predicate: PERMISSIVE_PREDICATE,
    },
    SecurityPolicy {
        table: TargetTable::Users,
        name: "Users can update their own data",
        command: PolicyCommand::Update,
        predicate: PERMISSIVE_PREDICATE,
    },
    SecurityPolicy {
        table: TargetTable::Customers,
        name: "Authenticated users can view customers",
        command: PolicyCommand::Select,
        predicate: PERMISSIVE_PREDICATE,
    },
    SecurityPolicy {
        table: TargetTable::Customers,
        name: "Authenticated users can manage customers",
        command: PolicyCommand::All,
        predicate: PERMISSIVE_PREDICATE,
    },
    SecurityPolicy {
        table: TargetTable::Invoices,
        name: "Authenticated users can view invoices",
        command: PolicyCommand::Select,
        predicate: PERMISSIVE_PREDICATE,
    },
    SecurityPolicy {
        table: TargetTable::Invoices,
        name: "Authenticated users can manage invoices",
        command: PolicyCommand::All,
        predicate: PERMISSIVE_PREDICATE,
    },
    SecurityPolicy {
        table: TargetTable::Revenue,
        name: "Authenticated users can view revenue",
        command: PolicyCommand::Select,
        predicate: PERMISSIVE_PREDICATE,
    },
];

/// The policy set in declaration order
pub fn declared_policies() -> &'static [SecurityPolicy] {
    &DECLARED_POLICIES
}

pub(crate) fn is_declared(table: TargetTable, name: &str) -> bool {
    DECLARED_POLICIES
        .iter()
        .any(|p| p.table == table && p.name == name)
}
