use std::collections::BTreeMap;

use chrono::{SecondsFormat, Utc};
use serde_json::Value;

use super::{merge_fields, Document, DocumentStore, WriteBatch, CREATED_AT, UPDATED_AT};
use crate::error::StoreError;

/// Process-local store for dry runs and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: BTreeMap<String, BTreeMap<String, Document>>,
    commits: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of batches committed so far.
    pub fn commits(&self) -> usize {
        self.commits
    }
}

impl DocumentStore for MemoryStore {
    fn commit(&mut self, collection: &str, batch: WriteBatch) -> Result<(), StoreError> {
        let now = Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true));
        let docs = self.collections.entry(collection.to_string()).or_default();
        for write in batch.into_writes() {
            let doc = docs.entry(write.id).or_insert_with(|| {
                let mut fresh = Document::new();
                fresh.insert(CREATED_AT.to_string(), now.clone());
                fresh
            });
            merge_fields(doc, write.fields);
            doc.insert(UPDATED_AT.to_string(), now.clone());
        }
        self.commits += 1;
        Ok(())
    }

    fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        Ok(self
            .collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .cloned())
    }

    fn count(&self, collection: &str) -> Result<usize, StoreError> {
        Ok(self.collections.get(collection).map_or(0, BTreeMap::len))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(v: Value) -> Document {
        v.as_object().unwrap().clone()
    }

    #[test]
    fn upsert_creates_then_merges() {
        let mut store = MemoryStore::new();
        let mut batch = WriteBatch::new();
        batch.set_merge("p1", fields(json!({"place_name": "a", "note": 1}))).unwrap();
        store.commit("spots", batch).unwrap();
        let first = store.get("spots", "p1").unwrap().unwrap();

        let mut batch = WriteBatch::new();
        batch.set_merge("p1", fields(json!({"place_name": "b"}))).unwrap();
        store.commit("spots", batch).unwrap();
        let second = store.get("spots", "p1").unwrap().unwrap();

        assert_eq!(second["place_name"], "b");
        assert_eq!(second["note"], 1);
        assert_eq!(second[CREATED_AT], first[CREATED_AT]);
        assert!(second.contains_key(UPDATED_AT));
        assert_eq!(store.count("spots").unwrap(), 1);
        assert_eq!(store.count("other").unwrap(), 0);
        assert_eq!(store.commits(), 2);
    }
}
