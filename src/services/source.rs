//! Upstream account data sources

use serde::de::DeserializeOwned;
use std::path::PathBuf;

use crate::types::{Connection, Customer, Package, SourceError};

/// Login details for the provider account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Trait for anything that can supply provider account records.
///
/// Calls may block; the coordinator runs them off the async runtime.
pub trait AccountSource: Send + Sync {
    /// Source name used in logs
    fn name(&self) -> &str;

    fn get_customer(&self) -> Result<Customer, SourceError>;

    fn get_my_packages(&self) -> Result<Vec<Package>, SourceError>;

    fn get_my_connections(&self) -> Result<Vec<Connection>, SourceError>;
}

/// Reads provider API exports from a directory.
///
/// Expects `customer.json`, `packages.json` and `connections.json`. The
/// customer's email must match the configured credentials, otherwise every
/// call is rejected as unauthorized.
pub struct SnapshotSource {
    data_dir: PathBuf,
    credentials: Credentials,
}

impl SnapshotSource {
    pub fn new(data_dir: PathBuf, credentials: Credentials) -> Self {
        Self {
            data_dir,
            credentials,
        }
    }

    fn read<T: DeserializeOwned>(&self, file: &str) -> Result<T, SourceError> {
        let path = self.data_dir.join(file);
        let mut content = std::fs::read(&path)
            .map_err(|e| SourceError::Unavailable(format!("{}: {}", path.display(), e)))?;
        simd_json::from_slice(&mut content)
            .map_err(|e| SourceError::Malformed(format!("{}: {}", path.display(), e)))
    }

    fn load_customer(&self) -> Result<Customer, SourceError> {
        let customer: Customer = self.read("customer.json")?;
        if self.credentials.password.is_empty()
            || !customer
                .email
                .eq_ignore_ascii_case(self.credentials.email.trim())
        {
            return Err(SourceError::Unauthorized);
        }
        Ok(customer)
    }
}

impl AccountSource for SnapshotSource {
    fn name(&self) -> &str {
        "snapshot"
    }

    fn get_customer(&self) -> Result<Customer, SourceError> {
        self.load_customer()
    }

    fn get_my_packages(&self) -> Result<Vec<Package>, SourceError> {
        self.load_customer()?;
        self.read("packages.json")
    }

    fn get_my_connections(&self) -> Result<Vec<Connection>, SourceError> {
        self.load_customer()?;
        self.read("connections.json")
    }
}
