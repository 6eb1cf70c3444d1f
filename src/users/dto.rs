use serde::{Deserialize, Serialize};

use crate::store::{Document, StoreError};

/// Client-writable user fields. Also the exact shape stored in a document.
/// Any `id` in the payload is ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserBody {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
}

/// User as returned to clients; `id` always comes from the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
}

impl User {
    pub fn from_document(doc: &Document) -> Result<Self, StoreError> {
        let UserBody { email, name } = doc.data_to()?;
        Ok(Self {
            id: doc.id.clone(),
            email,
            name,
        })
    }
}
