//! Durable storage of note records.
//!
//! [`NoteStore`] is the contract the editor persists through. Every
//! operation is asynchronous and returns a [`StoreError`] on failure.
//! [`MemoryStore`] keeps records in process memory; the IndexedDB backed
//! `IdbStore` is available on `wasm32` with the `wasm-js` feature.

use crate::note::{Note, NoteId};
use futures::future::LocalBoxFuture;
use parking_lot::Mutex;
use std::{collections::BTreeMap, sync::Arc};

#[cfg(all(target_family = "wasm", feature = "wasm-js"))]
pub mod indexed_db;

#[cfg(all(target_family = "wasm", feature = "wasm-js"))]
pub use indexed_db::IdbStore;

#[cfg(feature = "tracing")]
use tracing::debug;

pub type StoreFuture<'a, T> = LocalBoxFuture<'a, T>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The store could not be opened.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
    /// A list, get, put or delete failed.
    #[error("Store operation failed: {0}")]
    OperationFailed(String),
    /// A record could not be converted to or from its stored form.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

#[cfg(feature = "wasm-js")]
impl From<StoreError> for wasm_bindgen::JsValue {
    fn from(err: StoreError) -> Self {
        wasm_bindgen::JsValue::from_str(&err.to_string())
    }
}

/// Trait for persisting note records, one record per note.
pub trait NoteStore {
    /// Returns every stored note in store order.
    fn list_all<'a>(&'a mut self) -> StoreFuture<'a, Result<Vec<Note>, StoreError>>;

    /// Retrieves the note stored under `id`.
    ///
    /// # Returns
    /// `Ok(None)` if no record exists for `id`.
    fn get<'a>(&'a mut self, id: NoteId) -> StoreFuture<'a, Result<Option<Note>, StoreError>>;

    /// Writes `note` and returns its id.
    ///
    /// A note without an id is inserted and receives a fresh id from the
    /// store; a note with an id overwrites the record stored under it.
    fn put<'a>(&'a mut self, note: &'a Note) -> StoreFuture<'a, Result<NoteId, StoreError>>;

    /// Removes the record stored under `id`. Removing a missing id succeeds.
    fn delete<'a>(&'a mut self, id: NoteId) -> StoreFuture<'a, Result<(), StoreError>>;
}

impl<S: NoteStore + ?Sized> NoteStore for Box<S> {
    fn list_all<'a>(&'a mut self) -> StoreFuture<'a, Result<Vec<Note>, StoreError>> {
        (**self).list_all()
    }

    fn get<'a>(&'a mut self, id: NoteId) -> StoreFuture<'a, Result<Option<Note>, StoreError>> {
        (**self).get(id)
    }

    fn put<'a>(&'a mut self, note: &'a Note) -> StoreFuture<'a, Result<NoteId, StoreError>> {
        (**self).put(note)
    }

    fn delete<'a>(&'a mut self, id: NoteId) -> StoreFuture<'a, Result<(), StoreError>> {
        (**self).delete(id)
    }
}

#[derive(Debug, Default)]
struct MemoryRecords {
    records: BTreeMap<NoteId, Note>,
    next_id: u64,
    offline: bool,
}

impl MemoryRecords {
    fn check_online(&self) -> Result<(), StoreError> {
        if self.offline {
            return Err(StoreError::OperationFailed(
                "memory store is offline".to_string(),
            ));
        }
        Ok(())
    }
}

/// In-process implementation of [`NoteStore`].
///
/// Clones share the same records, so a list view and an editor session can
/// each hold a handle. Ids are assigned from an increasing counter starting
/// at 1, the way an auto-incrementing IndexedDB key generator does.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryRecords>>,
}

impl MemoryStore {
    /// Creates an empty [`MemoryStore`].
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().records.is_empty()
    }

    /// While offline every operation fails with [`StoreError::OperationFailed`].
    pub fn set_offline(&self, offline: bool) {
        self.inner.lock().offline = offline;
    }
}

impl NoteStore for MemoryStore {
    fn list_all<'a>(&'a mut self) -> StoreFuture<'a, Result<Vec<Note>, StoreError>> {
        Box::pin(async move {
            let inner = self.inner.lock();
            inner.check_online()?;
            Ok(inner.records.values().cloned().collect())
        })
    }

    fn get<'a>(&'a mut self, id: NoteId) -> StoreFuture<'a, Result<Option<Note>, StoreError>> {
        Box::pin(async move {
            let inner = self.inner.lock();
            inner.check_online()?;
            Ok(inner.records.get(&id).cloned())
        })
    }

    fn put<'a>(&'a mut self, note: &'a Note) -> StoreFuture<'a, Result<NoteId, StoreError>> {
        Box::pin(async move {
            let mut inner = self.inner.lock();
            inner.check_online()?;
            let id = match note.id {
                Some(id) => id,
                None => NoteId(inner.next_id + 1),
            };
            inner.next_id = inner.next_id.max(id.0);
            let mut record = note.clone();
            record.id = Some(id);
            inner.records.insert(id, record);
            #[cfg(feature = "tracing")]
            debug!("Stored note {id} in memory");
            Ok(id)
        })
    }

    fn delete<'a>(&'a mut self, id: NoteId) -> StoreFuture<'a, Result<(), StoreError>> {
        Box::pin(async move {
            let mut inner = self.inner.lock();
            inner.check_online()?;
            inner.records.remove(&id);
            Ok(())
        })
    }
}
