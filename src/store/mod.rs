use async_trait::async_trait;
use serde::de::DeserializeOwned;

mod errors;
pub mod memory;
pub mod postgres;

pub use errors::StoreError;
pub use memory::MemoryDocumentStore;
pub use postgres::PgDocumentStore;

/// A stored document: a JSON body addressed by a store-assigned id.
#[derive(Debug, Clone)]
pub struct Document {
    pub id: String,
    pub data: serde_json::Value,
}

impl Document {
    /// Decode the document body. The id is not part of the body.
    pub fn data_to<T: DeserializeOwned>(&self) -> Result<T, StoreError> {
        Ok(serde_json::from_value(self.data.clone())?)
    }
}

/// Client for a schemaless document database grouped into named collections.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a new document and return the id the store assigned to it.
    async fn add(&self, collection: &str, data: serde_json::Value) -> Result<String, StoreError>;
    async fn get(&self, collection: &str, id: &str) -> Result<Document, StoreError>;
    /// All documents in the collection, ascending by id.
    async fn list(&self, collection: &str) -> Result<Vec<Document>, StoreError>;
    /// Create or fully overwrite the document at `id`.
    async fn set(&self, collection: &str, id: &str, data: serde_json::Value)
        -> Result<(), StoreError>;
    /// Remove the document at `id`. Absent documents are not an error.
    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError>;
}

pub(crate) fn new_document_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}
