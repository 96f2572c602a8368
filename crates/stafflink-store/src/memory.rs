//! In-memory `EntityStore` backend.
//!
//! Records live in a `HashMap` behind a tokio `RwLock`. Each `save` runs
//! its version check and write under one write-lock acquisition, which
//! gives the per-record read-modify-write atomicity the identity core
//! relies on.

use std::collections::HashMap;
use std::sync::Arc;

use stafflink_types::{Clock, Principal, SystemClock};
use tokio::sync::RwLock;

use crate::{Entity, EntityStore, StoreError};

/// The lock-protected contents of a store.
struct Table<E: Entity> {
    records: HashMap<E::Id, E>,

    /// When set, the next save or delete fails with this backend message.
    fail_next_write: Option<String>,
}

/// A process-local store for one record type.
pub struct InMemoryStore<E: Entity> {
    table: RwLock<Table<E>>,
    clock: Arc<dyn Clock>,
}

impl<E: Entity> InMemoryStore<E> {
    /// Creates an empty store that stamps audits with system time.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Creates an empty store that stamps audits with `clock`.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            table: RwLock::new(Table {
                records: HashMap::new(),
                fail_next_write: None,
            }),
            clock,
        }
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.table.read().await.records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.table.read().await.records.is_empty()
    }

    /// Makes the next `save` or `delete` fail with
    /// [`StoreError::Backend`]. Lets tests exercise collaborator failures.
    #[cfg(any(test, feature = "testing"))]
    pub async fn fail_next_write(&self, reason: impl Into<String>) {
        self.table.write().await.fail_next_write = Some(reason.into());
    }
}

impl<E: Entity> Default for InMemoryStore<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Entity> EntityStore<E> for InMemoryStore<E> {
    async fn find_by_id(&self, id: E::Id) -> Result<Option<E>, StoreError> {
        Ok(self.table.read().await.records.get(&id).cloned())
    }

    async fn find_where<P>(&self, predicate: P) -> Result<Vec<E>, StoreError>
    where
        P: Fn(&E) -> bool + Send,
    {
        let table = self.table.read().await;
        Ok(table
            .records
            .values()
            .filter(|record| predicate(record))
            .cloned()
            .collect())
    }

    async fn save(
        &self,
        mut entity: E,
        actor: &Principal,
    ) -> Result<E, StoreError> {
        let mut table = self.table.write().await;
        if let Some(reason) = table.fail_next_write.take() {
            return Err(StoreError::Backend(reason));
        }

        let id = entity.id();
        let stored_version = table
            .records
            .get(&id)
            .map(|existing| existing.audit().version)
            .unwrap_or(0);

        if entity.audit().version != stored_version {
            return Err(StoreError::StaleVersion {
                kind: E::KIND,
                id: id.to_string(),
                expected: entity.audit().version,
                found: stored_version,
            });
        }

        let now = self.clock.now();
        let audit = entity.audit_mut();
        if !audit.is_persisted() {
            audit.created_at = Some(now);
            audit.created_by = Some(actor.username.clone());
        }
        audit.modified_at = Some(now);
        audit.modified_by = Some(actor.username.clone());
        audit.version = stored_version + 1;

        table.records.insert(id, entity.clone());
        tracing::debug!(kind = E::KIND, %id, version = stored_version + 1, "record saved");
        Ok(entity)
    }

    async fn delete(&self, id: E::Id) -> Result<(), StoreError> {
        let mut table = self.table.write().await;
        if let Some(reason) = table.fail_next_write.take() {
            return Err(StoreError::Backend(reason));
        }

        if table.records.remove(&id).is_none() {
            return Err(StoreError::NotFound {
                kind: E::KIND,
                id: id.to_string(),
            });
        }
        tracing::debug!(kind = E::KIND, %id, "record deleted");
        Ok(())
    }
}

// =========================================================================
// Tests
// =========================================================================
