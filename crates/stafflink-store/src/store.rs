//! The `EntityStore` trait that backends implement.

use std::future::Future;

use stafflink_types::Principal;

use crate::{Entity, StoreError};

/// Generic persistence for one record type.
///
/// The identity core only ever calls these four operations. A SQL
/// backend, an ORM wrapper, or [`InMemoryStore`](crate::InMemoryStore)
/// all fit behind the same seam.
///
/// # Trait bounds
///
/// - `Send + Sync` → one store is shared by every engine and called from
///   any tokio worker thread.
/// - `'static` → the store lives as long as the application.
///
/// # Example
///
/// ```rust
/// use stafflink_store::{Entity, EntityStore, StoreError};
/// use stafflink_types::Principal;
///
/// /// A store that never has anything.
/// struct EmptyStore;
///
/// impl<E: Entity> EntityStore<E> for EmptyStore {
///     async fn find_by_id(&self, _id: E::Id) -> Result<Option<E>, StoreError> {
///         Ok(None)
///     }
///
///     async fn find_where<P>(&self, _predicate: P) -> Result<Vec<E>, StoreError>
///     where
///         P: Fn(&E) -> bool + Send,
///     {
///         Ok(Vec::new())
///     }
///
///     async fn save(&self, _entity: E, _actor: &Principal) -> Result<E, StoreError> {
///         Err(StoreError::Backend("read-only".into()))
///     }
///
///     async fn delete(&self, id: E::Id) -> Result<(), StoreError> {
///         Err(StoreError::NotFound { kind: E::KIND, id: id.to_string() })
///     }
/// }
/// ```
pub trait EntityStore<E: Entity>: Send + Sync + 'static {
    /// Loads a record by id. `Ok(None)` means "no such record", which is
    /// not an error at this layer.
    fn find_by_id(
        &self,
        id: E::Id,
    ) -> impl Future<Output = Result<Option<E>, StoreError>> + Send;

    /// Returns every record matching `predicate`, in unspecified order.
    fn find_where<P>(
        &self,
        predicate: P,
    ) -> impl Future<Output = Result<Vec<E>, StoreError>> + Send
    where
        P: Fn(&E) -> bool + Send;

    /// Creates or updates a record and returns it as stored, with its
    /// [`Audit`](crate::Audit) block stamped for `actor`.
    ///
    /// # Errors
    /// - [`StoreError::StaleVersion`] if the record was modified since
    ///   `entity` was read.
    /// - [`StoreError::Backend`] for infrastructure failures.
    fn save(
        &self,
        entity: E,
        actor: &Principal,
    ) -> impl Future<Output = Result<E, StoreError>> + Send;

    /// Removes a record.
    ///
    /// # Errors
    /// [`StoreError::NotFound`] if no record has this id.
    fn delete(
        &self,
        id: E::Id,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}
