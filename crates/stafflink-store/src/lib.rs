//! Entity storage for Stafflink.
//!
//! Persistence is not part of the identity core: accounts and employees
//! live in whatever store the host application provides. This crate
//! pins down the shape of that collaborator:
//!
//! 1. **Records** — anything implementing [`Entity`]: an id plus an
//!    [`Audit`] block the store stamps on every write.
//! 2. **The store** — the [`EntityStore`] trait: find by id, find by
//!    predicate, save, delete.
//! 3. **A reference backend** — [`InMemoryStore`], used by tests and by
//!    hosts that keep everything in process.
//!
//! # Concurrency contract
//!
//! The core does no locking of its own around records. It relies on the
//! store to make each `save` an atomic read-modify-write of one record.
//! [`InMemoryStore`] does that with optimistic versioning: a save built
//! from a stale read fails with [`StoreError::StaleVersion`].

#![allow(async_fn_in_trait)]

mod entity;
mod error;
mod memory;
mod store;

pub use entity::{Audit, Entity};
pub use error::StoreError;
pub use memory::InMemoryStore;
pub use store::EntityStore;
