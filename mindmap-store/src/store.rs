//! SQLite-backed document store.
//!
//! One row per document file, plus module-only rows for modules that have
//! no files yet. Blocking rusqlite work runs on the blocking thread pool so
//! async callers never stall the runtime.

use crate::bm25::Bm25Index;
use crate::document::{bytes_to_vec, vec_to_bytes, Document, EMBEDDING_DIM};
use mindmap_common::Error;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};

/// Counts reported after an import or on demand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreSummary {
    /// Total rows in the table.
    pub total: usize,
    /// Rows that carry document content.
    pub with_content: usize,
    /// Module-only rows (no content).
    pub empty_modules: usize,
    /// Distinct module names, sorted.
    pub modules: Vec<String>,
}

/// Document store handle.
///
/// Cheap to clone; each operation opens its own connection.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    db_path: PathBuf,
}

impl DocumentStore {
    /// Open (or create) the store at the given database path.
    pub fn open(db_path: &Path) -> anyhow::Result<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(db_path)?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                module TEXT NOT NULL,
                file_name TEXT,
                content TEXT,
                embedding BLOB,
                file_path TEXT,
                updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
            );

            CREATE INDEX IF NOT EXISTS idx_module ON documents(module);
            CREATE INDEX IF NOT EXISTS idx_file_name ON documents(file_name);
            "#,
        )?;

        Ok(Self {
            db_path: db_path.to_path_buf(),
        })
    }

    /// Run a blocking closure against a fresh connection.
    async fn with_conn<T, F>(&self, f: F) -> anyhow::Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> anyhow::Result<T> + Send + 'static,
    {
        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || {
            let conn = Connection::open(&db_path)?;
            f(&conn)
        })
        .await?
    }

    /// All distinct module names, sorted.
    pub async fn modules(&self) -> anyhow::Result<Vec<String>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT DISTINCT module FROM documents ORDER BY module")?;
            let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
            Ok(rows.collect::<Result<Vec<_>, _>>()?)
        })
        .await
    }

    /// File names under a module, sorted. Module-only rows are skipped.
    pub async fn files_by_module(&self, module: &str) -> anyhow::Result<Vec<String>> {
        let module = module.to_string();
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT file_name FROM documents
                 WHERE module = ?1 AND file_name IS NOT NULL
                 ORDER BY file_name",
            )?;
            let rows = stmt.query_map(params![module], |row| row.get::<_, String>(0))?;
            Ok(rows.collect::<Result<Vec<_>, _>>()?)
        })
        .await
    }

    /// Full content of a document, or `None` when the file is unknown.
    pub async fn content_by_file_name(&self, file_name: &str) -> anyhow::Result<Option<String>> {
        let file_name = file_name.to_string();
        self.with_conn(move |conn| {
            let content = conn
                .query_row(
                    "SELECT content FROM documents WHERE file_name = ?1",
                    params![file_name],
                    |row| row.get::<_, Option<String>>(0),
                )
                .optional()?;
            Ok(content.flatten())
        })
        .await
    }

    /// All `(file_name, content)` pairs under a module, sorted by file name.
    pub async fn content_by_module(&self, module: &str) -> anyhow::Result<Vec<(String, String)>> {
        let module = module.to_string();
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT file_name, content FROM documents
                 WHERE module = ?1 AND content IS NOT NULL
                 ORDER BY file_name",
            )?;
            let rows = stmt.query_map(params![module], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?;
            Ok(rows.collect::<Result<Vec<_>, _>>()?)
        })
        .await
    }

    /// All `(file_name, content)` pairs that carry content.
    pub async fn all_documents(&self) -> anyhow::Result<Vec<(String, String)>> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare("SELECT file_name, content FROM documents WHERE content IS NOT NULL")?;
            let rows = stmt.query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?;
            Ok(rows.collect::<Result<Vec<_>, _>>()?)
        })
        .await
    }

    /// Fetch a full document row by file name.
    pub async fn get(&self, file_name: &str) -> anyhow::Result<Option<Document>> {
        let file_name = file_name.to_string();
        self.with_conn(move |conn| {
            let doc = conn
                .query_row(
                    "SELECT id, module, file_name, content, embedding, file_path, updated_at
                     FROM documents WHERE file_name = ?1",
                    params![file_name],
                    |row| {
                        let embedding: Option<Vec<u8>> = row.get(4)?;
                        Ok(Document {
                            id: row.get(0)?,
                            module: row.get(1)?,
                            file_name: row.get(2)?,
                            content: row.get(3)?,
                            embedding: embedding.as_deref().and_then(bytes_to_vec),
                            file_path: row.get(5)?,
                            updated_at: row.get(6)?,
                        })
                    },
                )
                .optional()?;
            Ok(doc)
        })
        .await
    }

    /// Insert a document row. `file_name`/`content`/`file_path` are all
    /// absent for an empty-module row.
    pub async fn insert(
        &self,
        module: &str,
        file_name: Option<&str>,
        content: Option<&str>,
        file_path: Option<&str>,
    ) -> anyhow::Result<i64> {
        let module = module.to_string();
        let file_name = file_name.map(str::to_string);
        let content = content.map(str::to_string);
        let file_path = file_path.map(str::to_string);

        self.with_conn(move |conn| {
            let now = chrono::Utc::now().to_rfc3339();
            conn.execute(
                "INSERT INTO documents (module, file_name, content, file_path, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![module, file_name, content, file_path, now],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
    }

    /// Store an embedding for a document.
    ///
    /// The vector must be exactly [`EMBEDDING_DIM`] long.
    pub async fn set_embedding(&self, file_name: &str, embedding: &[f32]) -> anyhow::Result<()> {
        if embedding.len() != EMBEDDING_DIM {
            return Err(Error::InvalidInput(format!(
                "embedding has {} dimensions, expected {EMBEDDING_DIM}",
                embedding.len()
            ))
            .into());
        }

        let file_name_owned = file_name.to_string();
        let bytes = vec_to_bytes(embedding);
        let updated = self
            .with_conn(move |conn| {
                let now = chrono::Utc::now().to_rfc3339();
                let updated = conn.execute(
                    "UPDATE documents SET embedding = ?1, updated_at = ?2 WHERE file_name = ?3",
                    params![bytes, now, file_name_owned],
                )?;
                Ok(updated)
            })
            .await?;

        if updated == 0 {
            return Err(Error::NotFound(format!("document '{file_name}'")).into());
        }
        Ok(())
    }

    /// Remove every row and reset the id sequence.
    pub async fn clear(&self) -> anyhow::Result<()> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM documents", [])?;
            // Mirrors TRUNCATE ... RESTART IDENTITY
            conn.execute("DELETE FROM sqlite_sequence WHERE name = 'documents'", [])?;
            Ok(())
        })
        .await?;
        tracing::debug!("Cleared documents table");
        Ok(())
    }

    /// Row counts and module list.
    pub async fn summary(&self) -> anyhow::Result<StoreSummary> {
        self.with_conn(|conn| {
            let total: usize =
                conn.query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))?;
            let with_content: usize = conn.query_row(
                "SELECT COUNT(*) FROM documents WHERE content IS NOT NULL",
                [],
                |row| row.get(0),
            )?;
            let empty_modules: usize = conn.query_row(
                "SELECT COUNT(*) FROM documents WHERE content IS NULL",
                [],
                |row| row.get(0),
            )?;

            let mut stmt = conn.prepare("SELECT DISTINCT module FROM documents ORDER BY module")?;
            let modules = stmt
                .query_map([], |row| row.get::<_, String>(0))?
                .collect::<Result<Vec<_>, _>>()?;

            Ok(StoreSummary {
                total,
                with_content,
                empty_modules,
                modules,
            })
        })
        .await
    }

    /// BM25 search over all document contents.
    ///
    /// Returns `(file_name, score)` sorted by descending score, top `n`.
    pub async fn search(&self, query: &str, n: usize) -> anyhow::Result<Vec<(String, f64)>> {
        let documents = self.all_documents().await?;
        if documents.is_empty() {
            return Ok(Vec::new());
        }

        let index = Bm25Index::build(&documents);
        let results = index.search(query, n);
        tracing::debug!(query = %query, hits = results.len(), "BM25 search");
        Ok(results)
    }
}
