//! Keyed-record persistence abstraction with subscribe-to-changes
//! semantics, addressed per user.

pub mod memory;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::errors::LedgerError;
use crate::session::UserId;

pub use memory::MemoryStore;

pub type RecordId = Uuid;

/// Collection names used by the ledger services.
pub mod collections {
    pub const PEOPLE: &str = "people";
    pub const CARDS: &str = "cards";
    pub const PURCHASES: &str = "purchases";
    pub const SUBSCRIPTIONS: &str = "subscriptions";
}

/// A loosely-typed stored record: an id plus a JSON object.
#[derive(Debug, Clone)]
pub struct Document {
    pub id: RecordId,
    pub data: Value,
}

impl Document {
    pub fn encode<T: Serialize>(id: RecordId, record: &T) -> Result<Document, LedgerError> {
        Ok(Document {
            id,
            data: serde_json::to_value(record)?,
        })
    }

    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, LedgerError> {
        Ok(serde_json::from_value(self.data.clone())?)
    }
}

/// Handle identifying an active change subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub(crate) u64);

/// Push-based live-query callback: invoked with a fresh snapshot of the
/// subscribed collection after every successful mutation.
pub type Listener = Box<dyn Fn(&[Document]) + Send + Sync>;

/// Abstraction over the document-database collaborator. Implementations
/// provide per-record CRUD plus push notifications; they are not expected
/// to offer transactions across records.
pub trait RecordStore: Send + Sync {
    fn create(
        &self,
        user: &UserId,
        collection: &str,
        id: RecordId,
        data: Value,
    ) -> Result<(), LedgerError>;

    /// Merges the given top-level fields into an existing record.
    fn update(
        &self,
        user: &UserId,
        collection: &str,
        id: RecordId,
        fields: Map<String, Value>,
    ) -> Result<(), LedgerError>;

    fn delete(&self, user: &UserId, collection: &str, id: RecordId) -> Result<(), LedgerError>;

    fn get(
        &self,
        user: &UserId,
        collection: &str,
        id: RecordId,
    ) -> Result<Option<Document>, LedgerError>;

    fn query_once(&self, user: &UserId, collection: &str) -> Result<Vec<Document>, LedgerError>;

    fn subscribe(
        &self,
        user: &UserId,
        collection: &str,
        listener: Listener,
    ) -> Result<SubscriptionId, LedgerError>;

    fn unsubscribe(&self, subscription: SubscriptionId);
}

/// Decodes a snapshot into typed records, skipping (and logging) documents
/// that no longer match the expected shape instead of failing the whole
/// snapshot.
pub fn decode_all<T: DeserializeOwned>(collection: &str, documents: &[Document]) -> Vec<T> {
    let mut records = Vec::with_capacity(documents.len());
    for document in documents {
        match document.decode::<T>() {
            Ok(record) => records.push(record),
            Err(error) => {
                tracing::warn!(
                    collection,
                    id = %document.id,
                    %error,
                    "skipping undecodable document"
                );
            }
        }
    }
    records
}
