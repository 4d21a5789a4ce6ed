//! Base de conocimiento interna: colección vectorial `knowledge_base`.
//!
//! API pública:
//!   - `KnowledgeStore` (trait): `add_documents`, `search`, `count`.
//!   - `SqliteKnowledgeStore`: persistente en `<CHROMA_DB_PATH>/knowledge_base.sqlite3`.
//!   - `InMemoryKnowledgeStore`: misma semántica, sin disco.
//!
//! La búsqueda es fuerza bruta por similitud coseno; con unas decenas de
//! documentos no necesitamos índice.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::embeddings::{cosine_similarity, Embedder};
use crate::errors::StoreError;
use crate::models::{Document, Metadata, SearchHit};

pub const COLLECTION_NAME: &str = "knowledge_base";

#[async_trait]
pub trait KnowledgeStore: Send + Sync {
    /// Calcula embeddings y guarda los documentos. Si no se dan ids se
    /// generan `doc_{n}` continuando desde el número actual de documentos.
    /// Devuelve los ids efectivamente insertados.
    async fn add_documents(
        &self,
        texts: &[String],
        metadatas: Option<&[Metadata]>,
        ids: Option<&[String]>,
    ) -> Result<Vec<String>, StoreError>;

    /// Los `k` documentos más cercanos a la consulta, de mayor a menor similitud.
    async fn search(&self, query: &str, k: usize) -> Result<Vec<SearchHit>, StoreError>;

    async fn count(&self) -> Result<usize, StoreError>;

    /// Nombre corto del backend (para el panel de estado).
    fn backend_name(&self) -> &'static str;
}

/// Valida longitudes y construye los documentos a insertar. Los ids
/// automáticos siguen `doc_{n}` desde el número de documentos existentes,
/// saltando los que ya están ocupados.
fn prepare_documents(
    texts: &[String],
    metadatas: Option<&[Metadata]>,
    ids: Option<&[String]>,
    existing: &HashSet<String>,
) -> Result<Vec<Document>, StoreError> {
    if let Some(metas) = metadatas {
        if metas.len() != texts.len() {
            return Err(StoreError::InvalidInput(format!(
                "{} textos pero {} metadatos",
                texts.len(),
                metas.len()
            )));
        }
    }
    if let Some(ids) = ids {
        if ids.len() != texts.len() {
            return Err(StoreError::InvalidInput(format!(
                "{} textos pero {} ids",
                texts.len(),
                ids.len()
            )));
        }
    }

    let mut seq = existing.len();
    let mut documents = Vec::with_capacity(texts.len());
    for (i, text) in texts.iter().enumerate() {
        let id = match ids {
            Some(ids) => ids[i].clone(),
            None => loop {
                let candidate = format!("doc_{seq}");
                seq += 1;
                if !existing.contains(&candidate) {
                    break candidate;
                }
            },
        };
        documents.push(Document {
            id,
            content: text.clone(),
            metadata: metadatas.map(|m| m[i].clone()).unwrap_or_default(),
        });
    }
    Ok(documents)
}

/// Ordena por similitud descendente (estable: a igualdad, orden de inserción).
fn rank(mut hits: Vec<SearchHit>, k: usize) -> Vec<SearchHit> {
    hits.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    hits.truncate(k);
    hits
}

// ---------------------------------------------------------------------
// SQLITE
// ---------------------------------------------------------------------

pub struct SqliteKnowledgeStore {
    pool: SqlitePool,
    embedder: Arc<dyn Embedder>,
    db_path: PathBuf,
    write_lock: Mutex<()>,
}

impl SqliteKnowledgeStore {
    /// Abre (o crea) la colección dentro del directorio indicado.
    pub async fn open(dir: &Path, embedder: Arc<dyn Embedder>) -> Result<Self, StoreError> {
        tokio::fs::create_dir_all(dir).await.map_err(|e| {
            StoreError::Unavailable(format!("no se pudo crear {}: {e}", dir.display()))
        })?;
        let db_path = dir.join(format!("{COLLECTION_NAME}.sqlite3"));

        let options = SqliteConnectOptions::new()
            .filename(&db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(4)
            .connect_with(options)
            .await?;

        let store = Self {
            pool,
            embedder,
            db_path,
            write_lock: Mutex::new(()),
        };
        store.init_schema().await?;
        info!("✅ Base de conocimiento abierta en {}", store.db_path.display());
        Ok(store)
    }

    async fn init_schema(&self) -> Result<(), StoreError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS documents (
                collection TEXT NOT NULL,
                id TEXT NOT NULL,
                content TEXT NOT NULL,
                metadata TEXT NOT NULL DEFAULT '{}',
                embedding BLOB NOT NULL,
                created_at TEXT NOT NULL DEFAULT (STRFTIME('%Y-%m-%dT%H:%M:%fZ', 'now')),
                PRIMARY KEY (collection, id)
            )",
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    fn serialize_embedding(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    fn deserialize_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect()
    }
}

#[async_trait]
impl KnowledgeStore for SqliteKnowledgeStore {
    async fn add_documents(
        &self,
        texts: &[String],
        metadatas: Option<&[Metadata]>,
        ids: Option<&[String]>,
    ) -> Result<Vec<String>, StoreError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        // Un escritor a la vez: los ids automáticos se calculan dentro de
        // la misma sección que la inserción.
        let _writer = self.write_lock.lock().await;
        let mut tx = self.pool.begin().await?;

        let existing: HashSet<String> =
            sqlx::query_scalar::<_, String>("SELECT id FROM documents WHERE collection = ?1")
                .bind(COLLECTION_NAME)
                .fetch_all(&mut *tx)
                .await?
                .into_iter()
                .collect();
        let documents = prepare_documents(texts, metadatas, ids, &existing)?;
        let embeddings = self.embedder.embed_batch(texts);
        let mut inserted = Vec::with_capacity(documents.len());

        for (doc, embedding) in documents.iter().zip(embeddings.iter()) {
            let metadata = serde_json::to_string(&doc.metadata)?;
            let result = sqlx::query(
                "INSERT OR IGNORE INTO documents (collection, id, content, metadata, embedding)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )
            .bind(COLLECTION_NAME)
            .bind(&doc.id)
            .bind(&doc.content)
            .bind(&metadata)
            .bind(Self::serialize_embedding(embedding))
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                warn!("Documento '{}' ya existe en {COLLECTION_NAME}; se ignora.", doc.id);
            } else {
                inserted.push(doc.id.clone());
            }
        }

        tx.commit().await?;
        info!("✅ Añadidos {} documentos a {COLLECTION_NAME}", inserted.len());
        Ok(inserted)
    }

    async fn search(&self, query: &str, k: usize) -> Result<Vec<SearchHit>, StoreError> {
        if k == 0 {
            return Ok(Vec::new());
        }

        let query_vec = self.embedder.embed(query);
        let rows = sqlx::query(
            "SELECT id, content, metadata, embedding
             FROM documents
             WHERE collection = ?1
             ORDER BY rowid",
        )
        .bind(COLLECTION_NAME)
        .fetch_all(&self.pool)
        .await?;

        let dimensions = self.embedder.dimensions();
        let mut stale = 0;
        let mut hits = Vec::with_capacity(rows.len());
        for row in &rows {
            let embedding = Self::deserialize_embedding(&row.get::<Vec<u8>, _>("embedding"));
            // Embeddings guardados con otro embedder no son comparables.
            if embedding.len() != dimensions {
                stale += 1;
                continue;
            }
            let metadata: String = row.get("metadata");
            hits.push(SearchHit {
                id: row.get("id"),
                content: row.get("content"),
                metadata: serde_json::from_str(&metadata)?,
                score: cosine_similarity(&query_vec, &embedding),
            });
        }
        if stale > 0 {
            warn!("{stale} documentos con embeddings de dimensión distinta a {dimensions}; se omiten.");
        }

        debug!("Búsqueda '{query}' sobre {} documentos", hits.len());
        Ok(rank(hits, k))
    }

    async fn count(&self) -> Result<usize, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM documents WHERE collection = ?1")
            .bind(COLLECTION_NAME)
            .fetch_one(&self.pool)
            .await?;
        Ok(count as usize)
    }

    fn backend_name(&self) -> &'static str {
        "sqlite"
    }
}

// ---------------------------------------------------------------------
// MEMORIA
// ---------------------------------------------------------------------

pub struct InMemoryKnowledgeStore {
    entries: RwLock<Vec<(Document, Vec<f32>)>>,
    embedder: Arc<dyn Embedder>,
}

impl InMemoryKnowledgeStore {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            embedder,
        }
    }
}

fn poisoned<T>(_: T) -> StoreError {
    StoreError::Unavailable("bloqueo del almacén en memoria envenenado".to_string())
}

#[async_trait]
impl KnowledgeStore for InMemoryKnowledgeStore {
    async fn add_documents(
        &self,
        texts: &[String],
        metadatas: Option<&[Metadata]>,
        ids: Option<&[String]>,
    ) -> Result<Vec<String>, StoreError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let embeddings = self.embedder.embed_batch(texts);
        let mut entries = self.entries.write().map_err(poisoned)?;
        let existing: HashSet<String> = entries.iter().map(|(doc, _)| doc.id.clone()).collect();
        let documents = prepare_documents(texts, metadatas, ids, &existing)?;

        let mut inserted = Vec::with_capacity(documents.len());
        for (doc, embedding) in documents.into_iter().zip(embeddings) {
            if entries.iter().any(|(existing, _)| existing.id == doc.id) {
                warn!("Documento '{}' ya existe en {COLLECTION_NAME}; se ignora.", doc.id);
                continue;
            }
            inserted.push(doc.id.clone());
            entries.push((doc, embedding));
        }
        Ok(inserted)
    }

    async fn search(&self, query: &str, k: usize) -> Result<Vec<SearchHit>, StoreError> {
        if k == 0 {
            return Ok(Vec::new());
        }
        let query_vec = self.embedder.embed(query);
        let entries = self.entries.read().map_err(poisoned)?;
        let hits = entries
            .iter()
            .map(|(doc, embedding)| SearchHit {
                id: doc.id.clone(),
                content: doc.content.clone(),
                metadata: doc.metadata.clone(),
                score: cosine_similarity(&query_vec, embedding),
            })
            .collect();
        Ok(rank(hits, k))
    }

    async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.entries.read().map_err(poisoned)?.len())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::HashEmbedder;
    use tokio_test::assert_err;

    fn embedder() -> Arc<dyn Embedder> {
        Arc::new(HashEmbedder::default())
    }

    fn texts(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn meta(pairs: &[(&str, &str)]) -> Metadata {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    const SAMPLE: &[&str] = &[
        "Artificial intelligence is transforming modern technology.",
        "Machine learning algorithms require large datasets for training.",
        "Natural language processing enables computers to understand human language.",
        "Computer vision allows machines to interpret visual information.",
        "Deep learning uses neural networks with multiple layers.",
    ];

    async fn roundtrip(store: &dyn KnowledgeStore) {
        let docs = texts(SAMPLE);
        let metas: Vec<Metadata> = (0..docs.len())
            .map(|i| meta(&[("source", "test"), ("topic", &format!("t{i}"))]))
            .collect();

        let ids = store.add_documents(&docs, Some(metas.as_slice()), None).await.unwrap();
        assert_eq!(ids, vec!["doc_0", "doc_1", "doc_2", "doc_3", "doc_4"]);
        assert_eq!(store.count().await.unwrap(), 5);

        for (i, text) in docs.iter().enumerate() {
            let hits = store.search(text, 3).await.unwrap();
            assert_eq!(hits.len(), 3);
            assert_eq!(hits[0].content, *text);
            assert_eq!(hits[0].metadata.get("topic").unwrap(), &format!("t{i}"));
            assert!(hits[0].score > 0.99);
            assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));
        }

        // Los ids automáticos continúan la secuencia.
        let more = store
            .add_documents(&texts(&["Reinforcement learning rewards agents."]), None, None)
            .await
            .unwrap();
        assert_eq!(more, vec!["doc_5"]);
        assert_eq!(store.count().await.unwrap(), 6);
    }

    #[tokio::test]
    async fn sqlite_roundtrip_and_persistence() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = SqliteKnowledgeStore::open(dir.path(), embedder()).await.unwrap();
            assert!(dir.path().join("knowledge_base.sqlite3").exists());
            roundtrip(&store).await;
        }
        let reopened = SqliteKnowledgeStore::open(dir.path(), embedder()).await.unwrap();
        assert_eq!(reopened.count().await.unwrap(), 6);
    }

    #[tokio::test]
    async fn concurrent_batches_get_distinct_ids() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(SqliteKnowledgeStore::open(dir.path(), embedder()).await.unwrap());

        let first = {
            let store = store.clone();
            tokio::spawn(async move {
                store.add_documents(&texts(&["alpha one", "alpha two"]), None, None).await
            })
        };
        let second = {
            let store = store.clone();
            tokio::spawn(async move {
                store.add_documents(&texts(&["beta one", "beta two"]), None, None).await
            })
        };
        let mut ids = first.await.unwrap().unwrap();
        ids.extend(second.await.unwrap().unwrap());
        ids.sort();

        assert_eq!(ids, vec!["doc_0", "doc_1", "doc_2", "doc_3"]);
        assert_eq!(store.count().await.unwrap(), 4);
    }

    async fn auto_ids_skip_taken(store: &dyn KnowledgeStore) {
        let custom = texts(&["doc_1"]);
        store
            .add_documents(&texts(&["custom entry"]), None, Some(custom.as_slice()))
            .await
            .unwrap();

        let ids = store.add_documents(&texts(&["x", "y"]), None, None).await.unwrap();
        assert_eq!(ids, vec!["doc_2", "doc_3"]);
        assert_eq!(store.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn auto_ids_skip_caller_ids_in_both_backends() {
        auto_ids_skip_taken(&InMemoryKnowledgeStore::new(embedder())).await;

        let dir = tempfile::tempdir().unwrap();
        auto_ids_skip_taken(&SqliteKnowledgeStore::open(dir.path(), embedder()).await.unwrap()).await;
    }

    #[tokio::test]
    async fn rows_from_another_embedder_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = SqliteKnowledgeStore::open(dir.path(), embedder()).await.unwrap();
            store.add_documents(&texts(&["hydrogen pilot"]), None, None).await.unwrap();
        }
        let small = SqliteKnowledgeStore::open(dir.path(), Arc::new(HashEmbedder::new(64)))
            .await
            .unwrap();
        assert_eq!(small.count().await.unwrap(), 1);
        assert!(small.search("hydrogen pilot", 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn memory_roundtrip() {
        roundtrip(&InMemoryKnowledgeStore::new(embedder())).await;
    }

    #[tokio::test]
    async fn duplicate_ids_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteKnowledgeStore::open(dir.path(), embedder()).await.unwrap();
        let ids = texts(&["a1", "a2"]);
        store.add_documents(&texts(&["one", "two"]), None, Some(ids.as_slice())).await.unwrap();
        let again = store
            .add_documents(&texts(&["uno", "dos"]), None, Some(ids.as_slice()))
            .await
            .unwrap();
        assert!(again.is_empty());
        assert_eq!(store.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn mismatched_lengths_are_rejected() {
        let store = InMemoryKnowledgeStore::new(embedder());
        let result = store
            .add_documents(&texts(&["one", "two"]), Some(&[Metadata::new()][..]), None)
            .await;
        assert!(matches!(assert_err!(result), StoreError::InvalidInput(_)));
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn empty_input_and_zero_k_are_noops() {
        let store = InMemoryKnowledgeStore::new(embedder());
        assert!(store.add_documents(&[], None, None).await.unwrap().is_empty());
        store.add_documents(&texts(&["something"]), None, None).await.unwrap();
        assert!(store.search("something", 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unreachable_directory_is_store_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not_a_dir");
        std::fs::write(&blocker, b"file").unwrap();
        let result = SqliteKnowledgeStore::open(&blocker.join("db"), embedder()).await;
        assert!(matches!(result, Err(StoreError::Unavailable(_))));
    }
}
