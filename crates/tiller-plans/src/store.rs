//! PlanStore — redb-backed storage of named rollout plans.
//!
//! Plan content is JSON-serialized into redb's `&[u8]` value column, keyed
//! by plan name. Reads return the stored content structurally identical to
//! what was added until it is modified or removed.

use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::{PlanError, PlanResult};
use crate::validate::validate_plan_content;

/// Rollout plans keyed by plan name (JSON-serialized content).
const PLANS: TableDefinition<&str, &[u8]> = TableDefinition::new("rollout-plans");

/// Convert any `Display` error into a `PlanError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| PlanError::$variant(e.to_string())
    };
}

/// Thread-safe rollout-plan store backed by redb.
#[derive(Clone)]
pub struct PlanStore {
    db: Arc<Database>,
}

impl PlanStore {
    /// Open (or create) a persistent plan store at the given path.
    pub fn open(path: &Path) -> PlanResult<Self> {
        let db = Database::create(path).map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!(?path, "plan store opened");
        Ok(store)
    }

    /// Create an ephemeral in-memory plan store (for testing).
    pub fn open_in_memory() -> PlanResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!("in-memory plan store opened");
        Ok(store)
    }

    /// Create the plans table if it doesn't exist yet.
    fn ensure_tables(&self) -> PlanResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        // Opening a table in a write transaction creates it if absent.
        txn.open_table(PLANS).map_err(map_err!(Table))?;
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    /// Store a new named plan.
    ///
    /// An existing name is rejected before the content is even looked at;
    /// content that fails structural validation is rejected without storing.
    pub fn add(&self, name: &str, content: &Value) -> PlanResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(PLANS).map_err(map_err!(Table))?;
            if table.get(name).map_err(map_err!(Read))?.is_some() {
                return Err(PlanError::Duplicate(name.to_string()));
            }
            validate_plan_content(content)?;
            let value = serde_json::to_vec(content).map_err(map_err!(Serialize))?;
            table
                .insert(name, value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(%name, "rollout plan stored");
        Ok(())
    }

    /// Read the exact stored content of a named plan.
    pub fn read(&self, name: &str) -> PlanResult<Value> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(PLANS).map_err(map_err!(Table))?;
        match table.get(name).map_err(map_err!(Read))? {
            Some(guard) => {
                let content: Value =
                    serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
                Ok(content)
            }
            None => Err(PlanError::NotFound(name.to_string())),
        }
    }

    /// Delete a named plan.
    pub fn remove(&self, name: &str) -> PlanResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(PLANS).map_err(map_err!(Table))?;
            if table.remove(name).map_err(map_err!(Write))?.is_none() {
                return Err(PlanError::NotFound(name.to_string()));
            }
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(%name, "rollout plan removed");
        Ok(())
    }

    /// Names of all stored plans.
    pub fn list(&self) -> PlanResult<Vec<String>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(PLANS).map_err(map_err!(Table))?;
        let mut names = Vec::new();
        for entry in table.iter().map_err(map_err!(Read))? {
            let (key, _) = entry.map_err(map_err!(Read))?;
            names.push(key.value().to_string());
        }
        Ok(names)
    }

    /// SHA-256 hex digest of a plan's canonical JSON bytes.
    pub fn content_hash(&self, name: &str) -> PlanResult<String> {
        let content = self.read(name)?;
        let bytes = serde_json::to_vec(&content).map_err(map_err!(Serialize))?;
        Ok(hex::encode(Sha256::digest(&bytes)))
    }
}
