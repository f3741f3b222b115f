//! IndexedDB implementation of [`NoteStore`].

use super::{NoteStore, StoreError, StoreFuture};
use crate::note::{Note, NoteId};
use idb::{Database, DatabaseEvent, Factory, KeyPath, ObjectStoreParams, TransactionMode};
use serde::Serialize;
use wasm_bindgen::JsValue;

#[cfg(feature = "tracing")]
use tracing::{debug, error};

const DB_VERSION: u32 = 1;
const KEY_PATH: &str = "id";

/// IndexedDB-backed note store.
///
/// Records live in one object store keyed by an auto-incremented `id`
/// property, so notes written without an id get one from the browser.
/// The database connection is opened once and closed on drop.
#[derive(Debug)]
pub struct IdbStore {
    db: Database,
    store_name: String,
}

impl IdbStore {
    /// Default IndexedDB database name.
    pub const DEFAULT_DB_NAME: &'static str = "simple_memo_db";
    /// Default IndexedDB object store name.
    pub const DEFAULT_STORE_NAME: &'static str = "memos";

    /// Opens the default database, creating the object store if needed.
    pub async fn new() -> Result<Self, StoreError> {
        Self::with_options(Self::DEFAULT_DB_NAME, Self::DEFAULT_STORE_NAME).await
    }

    /// Opens the given database and object store, creating it if needed.
    pub async fn with_options(db_name: &str, store_name: &str) -> Result<Self, StoreError> {
        let db = open_database(db_name, store_name).await?;
        #[cfg(feature = "tracing")]
        debug!("Opened IndexedDB database {db_name}");
        Ok(Self {
            db,
            store_name: store_name.to_string(),
        })
    }
}

impl Drop for IdbStore {
    fn drop(&mut self) {
        self.db.close();
    }
}

async fn open_database(db_name: &str, store_name: &str) -> Result<Database, StoreError> {
    let factory = Factory::new().map_err(unavailable)?;
    let mut open_request = factory
        .open(db_name, Some(DB_VERSION))
        .map_err(unavailable)?;
    let store_name = store_name.to_string();
    open_request.on_upgrade_needed(move |event| {
        let Ok(database) = event.database() else {
            return;
        };
        if database.store_names().iter().any(|name| name == &store_name) {
            return;
        }
        let mut params = ObjectStoreParams::new();
        params.auto_increment(true);
        params.key_path(Some(KeyPath::new_single(KEY_PATH)));
        if let Err(_e) = database.create_object_store(&store_name, params) {
            #[cfg(feature = "tracing")]
            error!("Could not create object store {store_name}: {_e}");
        }
    });
    open_request.await.map_err(unavailable)
}

impl NoteStore for IdbStore {
    fn list_all<'a>(&'a mut self) -> StoreFuture<'a, Result<Vec<Note>, StoreError>> {
        Box::pin(async move {
            let transaction = self
                .db
                .transaction(&[self.store_name.as_str()], TransactionMode::ReadOnly)
                .map_err(failed)?;
            let store = transaction
                .object_store(&self.store_name)
                .map_err(failed)?;
            let values = store
                .get_all(None, None)
                .map_err(failed)?
                .await
                .map_err(failed)?;
            let _ = transaction.await.map_err(failed)?;
            values.into_iter().map(note_from_js).collect()
        })
    }

    fn get<'a>(&'a mut self, id: NoteId) -> StoreFuture<'a, Result<Option<Note>, StoreError>> {
        Box::pin(async move {
            let transaction = self
                .db
                .transaction(&[self.store_name.as_str()], TransactionMode::ReadOnly)
                .map_err(failed)?;
            let store = transaction
                .object_store(&self.store_name)
                .map_err(failed)?;
            let value = store
                .get(note_id_to_js(id))
                .map_err(failed)?
                .await
                .map_err(failed)?;
            let _ = transaction.await.map_err(failed)?;
            value.map(note_from_js).transpose()
        })
    }

    fn put<'a>(&'a mut self, note: &'a Note) -> StoreFuture<'a, Result<NoteId, StoreError>> {
        Box::pin(async move {
            let value = note_to_js(note)?;
            let transaction = self
                .db
                .transaction(&[self.store_name.as_str()], TransactionMode::ReadWrite)
                .map_err(failed)?;
            let store = transaction
                .object_store(&self.store_name)
                .map_err(failed)?;
            let key = store
                .put(&value, None)
                .map_err(failed)?
                .await
                .map_err(failed)?;
            let _ = transaction
                .commit()
                .map_err(failed)?
                .await
                .map_err(failed)?;
            let id = note_id_from_js(&key)?;
            #[cfg(feature = "tracing")]
            debug!("Stored note {id} in {}", self.store_name);
            Ok(id)
        })
    }

    fn delete<'a>(&'a mut self, id: NoteId) -> StoreFuture<'a, Result<(), StoreError>> {
        Box::pin(async move {
            let transaction = self
                .db
                .transaction(&[self.store_name.as_str()], TransactionMode::ReadWrite)
                .map_err(failed)?;
            let store = transaction
                .object_store(&self.store_name)
                .map_err(failed)?;
            store
                .delete(note_id_to_js(id))
                .map_err(failed)?
                .await
                .map_err(failed)?;
            let _ = transaction
                .commit()
                .map_err(failed)?
                .await
                .map_err(failed)?;
            Ok(())
        })
    }
}

fn note_to_js(note: &Note) -> Result<JsValue, StoreError> {
    note.serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| StoreError::Serialization(e.to_string()))
}

fn note_from_js(value: JsValue) -> Result<Note, StoreError> {
    serde_wasm_bindgen::from_value::<Note>(value)
        .map(Note::normalized)
        .map_err(|e| StoreError::Serialization(e.to_string()))
}

fn note_id_to_js(id: NoteId) -> JsValue {
    JsValue::from_f64(id.0 as f64)
}

fn note_id_from_js(key: &JsValue) -> Result<NoteId, StoreError> {
    match key.as_f64() {
        Some(key) if key.is_finite() && key >= 0.0 && key.fract() == 0.0 => Ok(NoteId(key as u64)),
        _ => Err(StoreError::OperationFailed(format!(
            "store returned a non-integer key: {key:?}"
        ))),
    }
}

fn unavailable(error: idb::Error) -> StoreError {
    #[cfg(feature = "tracing")]
    error!("IndexedDB unavailable: {error}");
    StoreError::Unavailable(error.to_string())
}

fn failed(error: idb::Error) -> StoreError {
    #[cfg(feature = "tracing")]
    error!("IndexedDB operation failed: {error}");
    StoreError::OperationFailed(error.to_string())
}
