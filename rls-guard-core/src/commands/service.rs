//! rls-guard service layer
//!
//! The service holds the catalog client and provides the high-level operations
//! (apply, inspect, audit_policies) shared by the CLI and the HTTP server.

use std::sync::Arc;

use crate::catalog::{DatabaseConfig, PgSecurityCatalog, SecurityCatalog};
use crate::error::{RlsGuardError, RlsGuardResult};

/// Main service struct that holds the catalog client
#[derive(Clone)]
pub struct RlsGuardService {
    pub(crate) catalog: Arc<dyn SecurityCatalog>,
}

impl RlsGuardService {
    /// Create a service over an already constructed catalog client
    pub fn new(catalog: Arc<dyn SecurityCatalog>) -> Self {
        Self { catalog }
    }

    /// Create a service backed by a lazily connected PostgreSQL pool.
    ///
    /// No connection is opened here; the first operation connects.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the connection string cannot be parsed.
    pub fn connect(config: &DatabaseConfig) -> RlsGuardResult<Self> {
        let catalog = PgSecurityCatalog::connect_lazy(config)
            .map_err(|e| RlsGuardError::configuration(e.to_string()))?;
        Ok(Self::new(Arc::new(catalog)))
    }

    // apply() is in apply.rs
    // inspect() is in inspect.rs
    // audit_policies() is in audit.rs
}
