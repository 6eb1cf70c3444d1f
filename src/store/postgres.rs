use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, types::Json, FromRow, PgPool};
use tracing::debug;

use super::{new_document_id, Document, DocumentStore, StoreError};

/// Document store on top of a hosted Postgres database.
///
/// Every document lives in the `documents` table, keyed by
/// `(project, collection, id)` with its body kept as JSONB.
#[derive(Clone)]
pub struct PgDocumentStore {
    db: PgPool,
    project: String,
}

#[derive(Debug, FromRow)]
struct DocumentRow {
    id: String,
    data: Json<serde_json::Value>,
}

impl From<DocumentRow> for Document {
    fn from(r: DocumentRow) -> Self {
        Self {
            id: r.id,
            data: r.data.0,
        }
    }
}

impl PgDocumentStore {
    pub async fn connect(
        database_url: &str,
        max_connections: u32,
        project: &str,
    ) -> anyhow::Result<Self> {
        let db = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self::from_pool(db, project))
    }

    pub fn from_pool(db: PgPool, project: &str) -> Self {
        Self {
            db,
            project: project.to_string(),
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.db
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn add(&self, collection: &str, data: serde_json::Value) -> Result<String, StoreError> {
        let id = new_document_id();
        sqlx::query(
            r#"
            INSERT INTO documents (project, collection, id, data)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(&self.project)
        .bind(collection)
        .bind(&id)
        .bind(Json(data))
        .execute(&self.db)
        .await?;
        debug!(collection, %id, "document added");
        Ok(id)
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Document, StoreError> {
        let row = sqlx::query_as::<_, DocumentRow>(
            r#"
            SELECT id, data
            FROM documents
            WHERE project = $1 AND collection = $2 AND id = $3
            "#,
        )
        .bind(&self.project)
        .bind(collection)
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        row.map(Document::from)
            .ok_or_else(|| StoreError::not_found(collection, id))
    }

    async fn list(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        let rows = sqlx::query_as::<_, DocumentRow>(
            r#"
            SELECT id, data
            FROM documents
            WHERE project = $1 AND collection = $2
            ORDER BY id
            "#,
        )
        .bind(&self.project)
        .bind(collection)
        .fetch_all(&self.db)
        .await?;
        Ok(rows.into_iter().map(Document::from).collect())
    }

    async fn set(
        &self,
        collection: &str,
        id: &str,
        data: serde_json::Value,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO documents (project, collection, id, data)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (project, collection, id)
            DO UPDATE SET data = EXCLUDED.data, update_time = now()
            "#,
        )
        .bind(&self.project)
        .bind(collection)
        .bind(id)
        .bind(Json(data))
        .execute(&self.db)
        .await?;
        debug!(collection, id, "document set");
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let res = sqlx::query(
            r#"
            DELETE FROM documents
            WHERE project = $1 AND collection = $2 AND id = $3
            "#,
        )
        .bind(&self.project)
        .bind(collection)
        .bind(id)
        .execute(&self.db)
        .await?;
        debug!(collection, id, removed = res.rows_affected(), "document deleted");
        Ok(())
    }
}
