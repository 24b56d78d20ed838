use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;

use super::{merge_fields, Document, DocumentStore, WriteBatch, CREATED_AT, UPDATED_AT};
use crate::error::StoreError;

const NOW: &str = "strftime('%Y-%m-%dT%H:%M:%fZ', 'now')";

/// Document store on a local SQLite file. Documents are JSON bodies keyed
/// by (collection, id); timestamps come from SQLite's clock.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create {:?}", dir))?;
        }
        let conn = Connection::open(path).with_context(|| format!("Failed to open {:?}", path))?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        Self::with_connection(conn)
    }

    pub fn with_connection(conn: Connection) -> Result<Self> {
        init_schema(&conn)?;
        Ok(SqliteStore { conn })
    }

    /// (region label, documents); places without a region report `None`.
    pub fn region_counts(&self, collection: &str) -> Result<Vec<(Option<String>, i64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT json_extract(body, '$.region') AS region, COUNT(*)
             FROM documents
             WHERE collection = ?1
             GROUP BY region
             ORDER BY COUNT(*) DESC, region",
        )?;
        let rows = stmt
            .query_map(params![collection], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// (category, documents carrying it).
    pub fn category_counts(&self, collection: &str) -> Result<Vec<(String, i64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT c.value, COUNT(*)
             FROM documents d, json_each(d.body, '$.categories') c
             WHERE d.collection = ?1
             GROUP BY c.value
             ORDER BY COUNT(*) DESC, c.value",
        )?;
        let rows = stmt
            .query_map(params![collection], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS documents (
            collection TEXT NOT NULL,
            id         TEXT NOT NULL,
            body       TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            PRIMARY KEY (collection, id)
        );
        ",
    )?;
    Ok(())
}

fn load_body(conn: &Connection, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
    let body: Option<String> = conn
        .query_row(
            "SELECT body FROM documents WHERE collection = ?1 AND id = ?2",
            params![collection, id],
            |row| row.get(0),
        )
        .optional()?;
    match body {
        Some(text) => Ok(Some(serde_json::from_str(&text)?)),
        None => Ok(None),
    }
}

impl DocumentStore for SqliteStore {
    fn commit(&mut self, collection: &str, batch: WriteBatch) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;
        {
            let upsert_sql = format!(
                "INSERT INTO documents (collection, id, body, created_at, updated_at)
                 VALUES (?1, ?2, ?3, {now}, {now})
                 ON CONFLICT(collection, id) DO UPDATE SET
                     body = excluded.body,
                     updated_at = excluded.updated_at",
                now = NOW
            );
            let mut upsert = tx.prepare(&upsert_sql)?;
            for write in batch.into_writes() {
                let mut doc = load_body(&tx, collection, &write.id)?.unwrap_or_default();
                merge_fields(&mut doc, write.fields);
                let body = serde_json::to_string(&doc)?;
                upsert.execute(params![collection, write.id, body])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let row: Option<(String, String, String)> = self
            .conn
            .query_row(
                "SELECT body, created_at, updated_at FROM documents
                 WHERE collection = ?1 AND id = ?2",
                params![collection, id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;
        let Some((body, created_at, updated_at)) = row else {
            return Ok(None);
        };
        let mut doc: Document = serde_json::from_str(&body)?;
        doc.insert(CREATED_AT.to_string(), Value::String(created_at));
        doc.insert(UPDATED_AT.to_string(), Value::String(updated_at));
        Ok(Some(doc))
    }

    fn count(&self, collection: &str) -> Result<usize, StoreError> {
        let n: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM documents WHERE collection = ?1",
            params![collection],
            |row| row.get(0),
        )?;
        Ok(n as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store() -> SqliteStore {
        SqliteStore::with_connection(Connection::open_in_memory().unwrap()).unwrap()
    }

    fn fields(v: Value) -> Document {
        v.as_object().unwrap().clone()
    }

    #[test]
    fn commit_and_read_back() {
        let mut s = store();
        let mut batch = WriteBatch::new();
        batch
            .set_merge("p1", fields(json!({"place_name": "a", "region": "애월읍", "categories": ["Beach", "Sunset"]})))
            .unwrap();
        batch
            .set_merge("p2", fields(json!({"place_name": "b", "region": null, "categories": ["Beach"]})))
            .unwrap();
        s.commit("spots", batch).unwrap();

        assert_eq!(s.count("spots").unwrap(), 2);
        let p1 = s.get("spots", "p1").unwrap().unwrap();
        assert_eq!(p1["place_name"], "a");
        assert!(p1[CREATED_AT].is_string());
        assert!(s.get("spots", "missing").unwrap().is_none());

        let cats = s.category_counts("spots").unwrap();
        assert_eq!(cats[0], ("Beach".to_string(), 2));
        assert_eq!(cats[1], ("Sunset".to_string(), 1));

        let regions = s.region_counts("spots").unwrap();
        assert!(regions.contains(&(Some("애월읍".to_string()), 1)));
        assert!(regions.contains(&(None, 1)));
    }

    #[test]
    fn reupload_merges_and_keeps_created_at() {
        let mut s = store();
        let mut batch = WriteBatch::new();
        batch.set_merge("p1", fields(json!({"place_name": "a", "expert_tip_final": "kept"}))).unwrap();
        s.commit("spots", batch).unwrap();
        let before = s.get("spots", "p1").unwrap().unwrap();

        let mut batch = WriteBatch::new();
        batch.set_merge("p1", fields(json!({"place_name": "b"}))).unwrap();
        s.commit("spots", batch).unwrap();
        let after = s.get("spots", "p1").unwrap().unwrap();

        assert_eq!(after["place_name"], "b");
        assert_eq!(after["expert_tip_final"], "kept");
        assert_eq!(after[CREATED_AT], before[CREATED_AT]);
        assert_eq!(s.count("spots").unwrap(), 1);
    }

    #[test]
    fn failing_write_rolls_back_the_whole_batch() {
        let mut s = store();
        s.conn
            .execute(
                "INSERT INTO documents (collection, id, body, created_at, updated_at)
                 VALUES ('spots', 'p2', 'not json', 'x', 'x')",
                [],
            )
            .unwrap();

        let mut batch = WriteBatch::new();
        batch.set_merge("p1", fields(json!({"place_name": "a"}))).unwrap();
        batch.set_merge("p2", fields(json!({"place_name": "b"}))).unwrap();
        let err = s.commit("spots", batch).unwrap_err();

        assert!(matches!(err, StoreError::Encode(_)));
        assert!(s.get("spots", "p1").unwrap().is_none());
        assert_eq!(s.count("spots").unwrap(), 1);
    }

    #[test]
    fn collections_are_separate() {
        let mut s = store();
        let mut batch = WriteBatch::new();
        batch.set_merge("p1", Document::new()).unwrap();
        s.commit("spots", batch).unwrap();
        assert_eq!(s.count("drafts").unwrap(), 0);
        assert!(s.get("drafts", "p1").unwrap().is_none());
    }

    #[test]
    fn opens_file_in_new_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("places.sqlite");
        let mut s = SqliteStore::open(&path).unwrap();
        let mut batch = WriteBatch::new();
        batch.set_merge("p1", fields(json!({"place_name": "a"}))).unwrap();
        s.commit("spots", batch).unwrap();
        drop(s);

        let reopened = SqliteStore::open(&path).unwrap();
        assert_eq!(reopened.count("spots").unwrap(), 1);
    }
}
