//! The record contract every stored type fulfils.

use std::fmt;
use std::hash::Hash;

use chrono::{DateTime, Utc};

/// Bookkeeping the store maintains on every record.
///
/// Read-only to the identity core: values are written by
/// [`EntityStore::save`](crate::EntityStore::save) and nowhere else.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Audit {
    pub created_at: Option<DateTime<Utc>>,
    pub created_by: Option<String>,
    pub modified_at: Option<DateTime<Utc>>,
    pub modified_by: Option<String>,

    /// Optimistic-lock version. `0` means "never saved"; every successful
    /// save increments it.
    pub version: u64,
}

impl Audit {
    /// Returns `true` once the record has been saved at least once.
    pub fn is_persisted(&self) -> bool {
        self.version > 0
    }
}

/// A record the store can hold.
///
/// # Trait bounds
///
/// - `Clone` → stores hand out owned copies; callers mutate their copy and
///   save it back.
/// - `Send + Sync + 'static` → records cross async task boundaries.
pub trait Entity: Clone + Send + Sync + 'static {
    /// The record's identifier type.
    type Id: Copy + Eq + Hash + fmt::Display + Send + Sync + 'static;

    /// Short human-readable kind, used in errors and logs ("account").
    const KIND: &'static str;

    fn id(&self) -> Self::Id;

    fn audit(&self) -> &Audit;

    fn audit_mut(&mut self) -> &mut Audit;
}
