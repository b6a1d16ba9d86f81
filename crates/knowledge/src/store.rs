//! SQLite persistence for semantic index entries.
//!
//! Entries are keyed by the SHA-256 of the document text together with the
//! embedder identity and chunk parameters they were built with, so a later
//! process can reuse them without re-embedding.

use crate::chunker::ChunkParams;
use crate::types::IndexEntry;
use chrono::{DateTime, Utc};
use guidebot_core::{AppError, AppResult, EmbeddingSettings};
use rusqlite::{params, Connection, OptionalExtension};
use sha2::{Digest, Sha256};
use std::path::PathBuf;

/// Identity key of a document: lowercase hex SHA-256 of its text.
pub fn document_key(text: &str) -> String {
    format!("{:x}", Sha256::digest(text.as_bytes()))
}

/// Metadata row describing one persisted document index.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub key: String,
    pub embedding: EmbeddingSettings,
    pub params: ChunkParams,
    pub chunk_count: usize,
    pub built_at: DateTime<Utc>,
}

impl StoredDocument {
    /// Whether entries stored under this row can be reused as-is.
    pub fn matches(&self, embedding: &EmbeddingSettings, params: ChunkParams) -> bool {
        self.params == params && self.embedding.validate_consistency(embedding).is_ok()
    }
}

/// File-backed index store.
#[derive(Debug, Clone)]
pub struct IndexStore {
    path: PathBuf,
}

fn db_error(context: &'static str) -> impl Fn(rusqlite::Error) -> AppError {
    move |e| AppError::Knowledge(format!("{}: {}", context, e))
}

impl IndexStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Run `op` against this store on the blocking thread pool.
    pub(crate) async fn run_blocking<T, F>(&self, op: F) -> AppResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&IndexStore) -> AppResult<T> + Send + 'static,
    {
        let store = self.clone();
        tokio::task::spawn_blocking(move || op(&store))
            .await
            .map_err(|e| AppError::Knowledge(format!("Index store task failed: {}", e)))?
    }

    fn open(&self) -> AppResult<Connection> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::Knowledge(format!("Failed to create index directory: {}", e))
            })?;
        }

        let conn = Connection::open(&self.path).map_err(db_error("Failed to open SQLite index"))?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                key TEXT PRIMARY KEY,
                provider TEXT NOT NULL,
                model TEXT NOT NULL,
                dimensions INTEGER NOT NULL,
                chunk_size INTEGER NOT NULL,
                overlap INTEGER NOT NULL,
                chunk_count INTEGER NOT NULL,
                built_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS chunks (
                document_key TEXT NOT NULL,
                position INTEGER NOT NULL,
                text TEXT NOT NULL,
                embedding BLOB NOT NULL,
                PRIMARY KEY (document_key, position),
                FOREIGN KEY (document_key) REFERENCES documents(key)
            );
            "#,
        )
        .map_err(db_error("Failed to create tables"))?;

        Ok(conn)
    }

    /// Look up the metadata row for a document key.
    pub fn find_document(&self, key: &str) -> AppResult<Option<StoredDocument>> {
        let conn = self.open()?;

        let row = conn
            .query_row(
                "SELECT provider, model, dimensions, chunk_size, overlap, chunk_count, built_at
                 FROM documents WHERE key = ?1",
                params![key],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, i64>(2)?,
                        row.get::<_, i64>(3)?,
                        row.get::<_, i64>(4)?,
                        row.get::<_, i64>(5)?,
                        row.get::<_, String>(6)?,
                    ))
                },
            )
            .optional()
            .map_err(db_error("Failed to read document metadata"))?;

        let Some((provider, model, dimensions, chunk_size, overlap, chunk_count, built_at)) = row
        else {
            return Ok(None);
        };

        let built_at = DateTime::parse_from_rfc3339(&built_at)
            .map_err(|e| AppError::Knowledge(format!("Invalid built_at timestamp: {}", e)))?
            .with_timezone(&Utc);

        Ok(Some(StoredDocument {
            key: key.to_string(),
            embedding: EmbeddingSettings {
                provider,
                model,
                dimensions: dimensions as usize,
                endpoint: None,
            },
            params: ChunkParams::new(chunk_size as usize, overlap as usize),
            chunk_count: chunk_count as usize,
            built_at,
        }))
    }

    /// Load all entries of a document in chunk order.
    pub fn load_entries(&self, key: &str) -> AppResult<Vec<IndexEntry>> {
        let conn = self.open()?;
        let mut stmt = conn
            .prepare(
                "SELECT position, text, embedding FROM chunks
                 WHERE document_key = ?1 ORDER BY position",
            )
            .map_err(db_error("Failed to prepare chunk query"))?;

        let rows = stmt
            .query_map(params![key], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Vec<u8>>(2)?,
                ))
            })
            .map_err(db_error("Failed to query chunks"))?;

        let mut entries = Vec::new();
        for row in rows {
            let (position, text, bytes) = row.map_err(db_error("Failed to read chunk row"))?;
            entries.push(IndexEntry {
                position: position as usize,
                text,
                embedding: bytes_to_embedding(&bytes)?,
            });
        }

        tracing::debug!("Loaded {} persisted entries for {}", entries.len(), key);
        Ok(entries)
    }

    /// Replace everything stored for `document.key` in a single transaction.
    pub fn replace_document(
        &self,
        document: &StoredDocument,
        entries: &[IndexEntry],
    ) -> AppResult<()> {
        let mut conn = self.open()?;
        let tx = conn
            .transaction()
            .map_err(db_error("Failed to start transaction"))?;

        tx.execute(
            "DELETE FROM chunks WHERE document_key = ?1",
            params![document.key],
        )
        .map_err(db_error("Failed to delete chunks"))?;

        tx.execute(
            "INSERT OR REPLACE INTO documents
             (key, provider, model, dimensions, chunk_size, overlap, chunk_count, built_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                document.key,
                document.embedding.provider,
                document.embedding.model,
                document.embedding.dimensions as i64,
                document.params.chunk_size as i64,
                document.params.overlap as i64,
                document.chunk_count as i64,
                document.built_at.to_rfc3339(),
            ],
        )
        .map_err(db_error("Failed to insert document"))?;

        {
            let mut stmt = tx
                .prepare(
                    "INSERT INTO chunks (document_key, position, text, embedding)
                     VALUES (?1, ?2, ?3, ?4)",
                )
                .map_err(db_error("Failed to prepare chunk insert"))?;

            for entry in entries {
                stmt.execute(params![
                    document.key,
                    entry.position as i64,
                    entry.text,
                    embedding_to_bytes(&entry.embedding),
                ])
                .map_err(db_error("Failed to insert chunk"))?;
            }
        }

        tx.commit().map_err(db_error("Failed to commit index"))?;

        tracing::info!(
            "Persisted {} chunks for document {} to {:?}",
            entries.len(),
            document.key,
            self.path
        );
        Ok(())
    }
}

fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn bytes_to_embedding(bytes: &[u8]) -> AppResult<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return Err(AppError::Knowledge(
            "Invalid embedding bytes length".to_string(),
        ));
    }

    Ok(bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}
