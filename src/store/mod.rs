pub mod memory;
pub mod sqlite;

use serde_json::{Map, Value};

use crate::error::StoreError;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Most writes a single atomic batch may carry.
pub const MAX_BATCH_WRITES: usize = 500;

pub const CREATED_AT: &str = "created_at";
pub const UPDATED_AT: &str = "updated_at";

pub type Document = Map<String, Value>;

/// A document collection with atomic, merging batch writes.
///
/// Implementations stamp `updated_at` on every write and `created_at` only
/// when the write creates the document.
pub trait DocumentStore {
    /// Apply every write in `batch` or none of them.
    fn commit(&mut self, collection: &str, batch: WriteBatch) -> Result<(), StoreError>;

    fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;

    fn count(&self, collection: &str) -> Result<usize, StoreError>;
}

/// One upsert: top-level `fields` replace same-named stored fields, others
/// are left as they are.
#[derive(Debug, Clone)]
pub struct SetMerge {
    pub id: String,
    pub fields: Document,
}

#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    writes: Vec<SetMerge>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_merge(&mut self, id: &str, fields: Document) -> Result<(), StoreError> {
        if id.is_empty() || id.contains('/') {
            return Err(StoreError::InvalidId(id.to_string()));
        }
        if self.writes.len() >= MAX_BATCH_WRITES {
            return Err(StoreError::BatchFull {
                limit: MAX_BATCH_WRITES,
            });
        }
        self.writes.push(SetMerge {
            id: id.to_string(),
            fields,
        });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    pub fn into_writes(self) -> Vec<SetMerge> {
        self.writes
    }
}

/// Field-wise merge of `update` into `existing`. Store-managed timestamps in
/// `update` are ignored.
pub fn merge_fields(existing: &mut Document, update: Document) {
    for (key, value) in update {
        if key == CREATED_AT || key == UPDATED_AT {
            continue;
        }
        existing.insert(key, value);
    }
}
