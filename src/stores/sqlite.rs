//! Persistent vector store on SQLite with `sqlite-vec`.
//!
//! Layout: a `records` table holds metadata (owner indexed for the
//! partition filter) and a `records_embeddings` vec0 virtual table holds
//! the vectors, joined by id. Similarity queries push the owner predicate
//! into SQL and rank by `vec_distance_cosine`.

use std::mem::transmute;
use std::os::raw::c_char;
use std::path::Path;
use std::sync::Once;

use async_trait::async_trait;
use tokio_rusqlite::{Connection, ffi};

use super::{RecordMetadata, ScoredMatch, VectorRecord, VectorStore};
use crate::types::RagError;

#[derive(Clone)]
pub struct SqliteVectorStore {
    conn: Connection,
    dimension: usize,
}

impl SqliteVectorStore {
    /// Open (or create) a store at `path` for vectors of `dimension`.
    ///
    /// Registers the `sqlite-vec` extension process-wide on first use,
    /// verifies it loaded, and creates the schema if missing.
    pub async fn open(path: impl AsRef<Path>, dimension: usize) -> Result<Self, RagError> {
        register_sqlite_vec()?;
        let conn = Connection::open(path)
            .await
            .map_err(|err| RagError::Store(err.to_string()))?;
        Self::bootstrap(conn, dimension).await
    }

    /// Open a transient in-memory store. Used by tests.
    pub async fn open_in_memory(dimension: usize) -> Result<Self, RagError> {
        register_sqlite_vec()?;
        let conn = Connection::open_in_memory()
            .await
            .map_err(|err| RagError::Store(err.to_string()))?;
        Self::bootstrap(conn, dimension).await
    }

    async fn bootstrap(conn: Connection, dimension: usize) -> Result<Self, RagError> {
        conn.call(|conn| {
            let result = conn.query_row("select vec_version()", [], |row| row.get::<_, String>(0));
            match result {
                Ok(_) => Ok(()),
                Err(err) => Err(tokio_rusqlite::Error::Error(err)),
            }
        })
        .await
        .map_err(|err| RagError::Store(format!("sqlite-vec unavailable: {err}")))?;

        conn.call(move |conn| {
            conn.execute_batch(&format!(
                "CREATE TABLE IF NOT EXISTS records (
                     id TEXT PRIMARY KEY,
                     owner TEXT NOT NULL,
                     source TEXT NOT NULL,
                     chunk_index INTEGER NOT NULL,
                     text TEXT NOT NULL
                 );
                 CREATE INDEX IF NOT EXISTS records_owner_idx ON records(owner);
                 CREATE INDEX IF NOT EXISTS records_owner_source_idx
                     ON records(owner, source);
                 CREATE VIRTUAL TABLE IF NOT EXISTS records_embeddings USING vec0(
                     id TEXT PRIMARY KEY,
                     embedding FLOAT[{dimension}]
                 );"
            ))
            .map_err(tokio_rusqlite::Error::Error)
        })
        .await
        .map_err(|err| RagError::Store(err.to_string()))?;

        Ok(Self { conn, dimension })
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }
}

#[async_trait]
impl VectorStore for SqliteVectorStore {
    async fn upsert(&self, records: Vec<VectorRecord>) -> Result<(), RagError> {
        if records.is_empty() {
            return Ok(());
        }
        let mut rows = Vec::with_capacity(records.len());
        for record in records {
            if record.embedding.len() != self.dimension {
                return Err(RagError::DimensionMismatch {
                    expected: self.dimension,
                    actual: record.embedding.len(),
                });
            }
            let embedding_json = serde_json::to_string(&record.embedding)
                .map_err(|err| RagError::Store(err.to_string()))?;
            rows.push((record, embedding_json));
        }

        self.conn
            .call(move |conn| {
                let tx = conn
                    .transaction()
                    .map_err(tokio_rusqlite::Error::Error)?;
                for (record, embedding_json) in &rows {
                    tx.execute(
                        "INSERT OR REPLACE INTO records
                             (id, owner, source, chunk_index, text)
                         VALUES (?1, ?2, ?3, ?4, ?5)",
                        (
                            &record.id,
                            &record.metadata.owner,
                            &record.metadata.source,
                            record.metadata.chunk_index as i64,
                            &record.metadata.text,
                        ),
                    )
                    .map_err(tokio_rusqlite::Error::Error)?;
                    tx.execute(
                        "DELETE FROM records_embeddings WHERE id = ?1",
                        [&record.id],
                    )
                    .map_err(tokio_rusqlite::Error::Error)?;
                    tx.execute(
                        "INSERT INTO records_embeddings (id, embedding)
                         VALUES (?1, vec_f32(?2))",
                        (&record.id, embedding_json),
                    )
                    .map_err(tokio_rusqlite::Error::Error)?;
                }
                tx.commit().map_err(tokio_rusqlite::Error::Error)
            })
            .await
            .map_err(|err| RagError::Store(err.to_string()))
    }

    async fn search(
        &self,
        query_embedding: &[f32],
        top_k: usize,
        owner: &str,
    ) -> Result<Vec<ScoredMatch>, RagError> {
        if query_embedding.len() != self.dimension {
            return Err(RagError::DimensionMismatch {
                expected: self.dimension,
                actual: query_embedding.len(),
            });
        }
        let embedding_json = serde_json::to_string(query_embedding)
            .map_err(|err| RagError::Store(err.to_string()))?;
        let owner = owner.to_owned();

        self.conn
            .call(
                move |conn| -> Result<Vec<ScoredMatch>, tokio_rusqlite::Error> {
                let mut stmt = conn
                    .prepare(&format!(
                        "SELECT r.id, r.owner, r.source, r.chunk_index, r.text, \
                         vec_distance_cosine(e.embedding, vec_f32(?1)) AS distance \
                         FROM records r \
                         JOIN records_embeddings e ON r.id = e.id \
                         WHERE r.owner = ?2 \
                         ORDER BY distance ASC, r.id ASC \
                         LIMIT {top_k}"
                    ))
                    .map_err(tokio_rusqlite::Error::Error)?;

                let rows = stmt
                    .query_map((&embedding_json, &owner), |row| {
                        let distance: f32 = row.get(5)?;
                        Ok(ScoredMatch {
                            id: row.get(0)?,
                            // sqlite-vec reports cosine distance; flip to
                            // similarity so all backends agree.
                            score: 1.0 - distance,
                            metadata: RecordMetadata {
                                owner: row.get(1)?,
                                source: row.get(2)?,
                                chunk_index: row.get::<_, i64>(3)? as usize,
                                text: row.get(4)?,
                            },
                        })
                    })
                    .map_err(tokio_rusqlite::Error::Error)?;

                let mut results = Vec::new();
                for row in rows {
                    results.push(row.map_err(tokio_rusqlite::Error::Error)?);
                }
                Ok(results)
            })
            .await
            .map_err(|err| RagError::Store(err.to_string()))
    }

    async fn delete_by_source(&self, owner: &str, source: &str) -> Result<usize, RagError> {
        let owner = owner.to_owned();
        let source = source.to_owned();

        self.conn
            .call(move |conn| -> Result<usize, tokio_rusqlite::Error> {
                let tx = conn
                    .transaction()
                    .map_err(tokio_rusqlite::Error::Error)?;
                let ids: Vec<String> = {
                    let mut stmt = tx
                        .prepare("SELECT id FROM records WHERE owner = ?1 AND source = ?2")
                        .map_err(tokio_rusqlite::Error::Error)?;
                    let rows = stmt
                        .query_map((&owner, &source), |row| row.get::<_, String>(0))
                        .map_err(tokio_rusqlite::Error::Error)?;
                    let mut ids = Vec::new();
                    for id in rows {
                        ids.push(id.map_err(tokio_rusqlite::Error::Error)?);
                    }
                    ids
                };
                for id in &ids {
                    tx.execute("DELETE FROM records_embeddings WHERE id = ?1", [id])
                        .map_err(tokio_rusqlite::Error::Error)?;
                }
                let deleted = tx
                    .execute(
                        "DELETE FROM records WHERE owner = ?1 AND source = ?2",
                        (&owner, &source),
                    )
                    .map_err(tokio_rusqlite::Error::Error)?;
                tx.commit().map_err(tokio_rusqlite::Error::Error)?;
                Ok(deleted)
            })
            .await
            .map_err(|err| RagError::Store(err.to_string()))
    }

    async fn count(&self) -> Result<usize, RagError> {
        self.conn
            .call(|conn| -> Result<usize, tokio_rusqlite::Error> {
                let count: i64 = conn
                    .query_row("SELECT COUNT(*) FROM records", [], |row| row.get(0))
                    .map_err(tokio_rusqlite::Error::Error)?;
                Ok(count as usize)
            })
            .await
            .map_err(|err| RagError::Store(err.to_string()))
    }
}

/// Register `sqlite-vec` as an auto-loaded extension, once per process.
///
/// Connections opened before this call will not see the extension, so both
/// constructors run it first.
fn register_sqlite_vec() -> Result<(), RagError> {
    use std::sync::Mutex;

    static INIT: Once = Once::new();
    static INIT_RESULT: Mutex<Option<Result<(), String>>> = Mutex::new(None);

    INIT.call_once(|| {
        let result = unsafe {
            type SqliteExtensionInit = unsafe extern "C" fn(
                *mut ffi::sqlite3,
                *mut *mut c_char,
                *const ffi::sqlite3_api_routines,
            ) -> i32;

            let init: unsafe extern "C" fn() = sqlite_vec::sqlite3_vec_init;
            let init_fn: SqliteExtensionInit =
                transmute::<unsafe extern "C" fn(), SqliteExtensionInit>(init);
            let rc = ffi::sqlite3_auto_extension(Some(init_fn));
            if rc != 0 {
                Err(format!(
                    "failed to register sqlite-vec extension (code {rc})"
                ))
            } else {
                Ok(())
            }
        };
        *INIT_RESULT.lock().expect("init result mutex poisoned") = Some(result);
    });

    INIT_RESULT
        .lock()
        .expect("init result mutex poisoned")
        .clone()
        .expect("init was called but result not set")
        .map_err(RagError::Store)
}
