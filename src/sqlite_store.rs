//! SQLite-backed [`DocumentStore`] and [`VectorStore`].
//!
//! One pool serves both traits: metadata lives in `documents` / `chunks` /
//! `tombstones`, vectors in `chunk_vectors`. Vector search is brute-force
//! cosine similarity over the BLOBs of the requested document type.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use docqa_core::embedding::{blob_to_vec, cosine_similarity, vec_to_blob};
use docqa_core::index::{rank_hits, VectorRecord, VectorStore};
use docqa_core::models::{Chunk, Document, DocumentType, FileKind, QueryHit};
use docqa_core::store::DocumentStore;

/// SQLite implementation of the store and index traits.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn row_to_document(row: &SqliteRow) -> Result<Document> {
    let file_type: String = row.get("file_type");
    let document_type: String = row.get("document_type");
    let upload_ms: i64 = row.get("upload_time");
    let total_chunks: i64 = row.get("total_chunks");
    Ok(Document {
        id: row.get("id"),
        filename: row.get("filename"),
        file_type: file_type.parse::<FileKind>()?,
        upload_time: chrono::DateTime::from_timestamp_millis(upload_ms)
            .ok_or_else(|| anyhow!("invalid upload_time {}", upload_ms))?,
        total_chunks: total_chunks as usize,
        document_type: document_type.parse::<DocumentType>()?,
    })
}

fn row_to_chunk(row: &SqliteRow) -> Chunk {
    let chunk_index: i64 = row.get("chunk_index");
    let total_chunks: i64 = row.get("total_chunks");
    let char_start: i64 = row.get("char_start");
    let char_end: i64 = row.get("char_end");
    Chunk {
        id: row.get("id"),
        document_id: row.get("document_id"),
        chunk_index: chunk_index as usize,
        total_chunks: total_chunks as usize,
        text: row.get("text"),
        hash: row.get("hash"),
        char_start: char_start as usize,
        char_end: char_end as usize,
    }
}

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn put_document(&self, doc: &Document, chunks: &[Chunk]) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO documents (id, filename, file_type, upload_time, total_chunks, document_type)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                filename = excluded.filename,
                file_type = excluded.file_type,
                upload_time = excluded.upload_time,
                total_chunks = excluded.total_chunks,
                document_type = excluded.document_type
            "#,
        )
        .bind(&doc.id)
        .bind(&doc.filename)
        .bind(doc.file_type.as_str())
        .bind(doc.upload_time.timestamp_millis())
        .bind(doc.total_chunks as i64)
        .bind(doc.document_type.as_str())
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM chunks WHERE document_id = ?")
            .bind(&doc.id)
            .execute(&mut *tx)
            .await?;

        for chunk in chunks {
            sqlx::query(
                r#"
                INSERT INTO chunks (id, document_id, chunk_index, total_chunks, text, hash, char_start, char_end)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&chunk.id)
            .bind(&chunk.document_id)
            .bind(chunk.chunk_index as i64)
            .bind(chunk.total_chunks as i64)
            .bind(&chunk.text)
            .bind(&chunk.hash)
            .bind(chunk.char_start as i64)
            .bind(chunk.char_end as i64)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("DELETE FROM tombstones WHERE document_id = ?")
            .bind(&doc.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn get_document(&self, id: &str) -> Result<Option<Document>> {
        let row = sqlx::query(
            "SELECT id, filename, file_type, upload_time, total_chunks, document_type FROM documents WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_document).transpose()
    }

    async fn list_documents(&self) -> Result<Vec<Document>> {
        let rows = sqlx::query(
            "SELECT id, filename, file_type, upload_time, total_chunks, document_type FROM documents ORDER BY upload_time DESC, id ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_document).collect()
    }

    async fn get_chunks(&self, document_id: &str) -> Result<Vec<Chunk>> {
        let rows = sqlx::query(
            r#"
            SELECT id, document_id, chunk_index, total_chunks, text, hash, char_start, char_end
            FROM chunks WHERE document_id = ? ORDER BY chunk_index ASC
            "#,
        )
        .bind(document_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(row_to_chunk).collect())
    }

    async fn set_document_type(&self, id: &str, document_type: DocumentType) -> Result<bool> {
        let result = sqlx::query("UPDATE documents SET document_type = ? WHERE id = ?")
            .bind(document_type.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_document(&self, id: &str) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM chunks WHERE document_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM documents WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query(
            "INSERT INTO tombstones (document_id, deleted_at) VALUES (?, ?) ON CONFLICT(document_id) DO NOTHING",
        )
        .bind(id)
        .bind(chrono::Utc::now().timestamp())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(true)
    }

    async fn deleted_ids(&self) -> Result<Vec<String>> {
        let ids: Vec<String> =
            sqlx::query_scalar("SELECT document_id FROM tombstones ORDER BY document_id")
                .fetch_all(&self.pool)
                .await?;
        Ok(ids)
    }
}

#[async_trait]
impl VectorStore for SqliteStore {
    async fn upsert(&self, records: Vec<VectorRecord>) -> Result<usize> {
        let mut tx = self.pool.begin().await?;
        let written = records.len();

        for record in records {
            let blob = vec_to_blob(&record.vector);
            sqlx::query(
                r#"
                INSERT INTO chunk_vectors (chunk_id, document_id, chunk_index, document_type, text, embedding)
                VALUES (?, ?, ?, ?, ?, ?)
                ON CONFLICT(chunk_id) DO UPDATE SET
                    document_id = excluded.document_id,
                    chunk_index = excluded.chunk_index,
                    document_type = excluded.document_type,
                    text = excluded.text,
                    embedding = excluded.embedding
                "#,
            )
            .bind(&record.chunk_id)
            .bind(&record.document_id)
            .bind(record.chunk_index as i64)
            .bind(record.document_type.as_str())
            .bind(&record.text)
            .bind(&blob)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(written)
    }

    async fn search(
        &self,
        query_vec: &[f32],
        top_k: usize,
        document_type: DocumentType,
    ) -> Result<Vec<QueryHit>> {
        let rows = sqlx::query(
            r#"
            SELECT chunk_id, document_id, chunk_index, text, embedding
            FROM chunk_vectors
            WHERE document_type = ?
            "#,
        )
        .bind(document_type.as_str())
        .fetch_all(&self.pool)
        .await?;

        let mut hits: Vec<QueryHit> = rows
            .iter()
            .map(|row| {
                let blob: Vec<u8> = row.get("embedding");
                let chunk_index: i64 = row.get("chunk_index");
                QueryHit {
                    chunk_id: row.get("chunk_id"),
                    document_id: row.get("document_id"),
                    chunk_index: chunk_index as usize,
                    text: row.get("text"),
                    document_type,
                    score: cosine_similarity(query_vec, &blob_to_vec(&blob)) as f64,
                }
            })
            .collect();

        rank_hits(&mut hits, top_k);
        Ok(hits)
    }

    async fn set_document_type(
        &self,
        document_id: &str,
        document_type: DocumentType,
    ) -> Result<usize> {
        let result =
            sqlx::query("UPDATE chunk_vectors SET document_type = ? WHERE document_id = ?")
                .bind(document_type.as_str())
                .bind(document_id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() as usize)
    }

    async fn delete_document(&self, document_id: &str) -> Result<usize> {
        let result = sqlx::query("DELETE FROM chunk_vectors WHERE document_id = ?")
            .bind(document_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() as usize)
    }

    async fn count(&self) -> Result<usize> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chunk_vectors")
            .fetch_one(&self.pool)
            .await?;
        Ok(n as usize)
    }
}
