//! In-process reference implementation of the record store. Used by tests
//! and as the executable definition of the subscribe-on-change contract.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use serde_json::{Map, Value};

use super::{Document, Listener, RecordId, RecordStore, SubscriptionId};
use crate::errors::LedgerError;
use crate::session::UserId;

type CollectionKey = (UserId, String);

struct Registration {
    user: UserId,
    collection: String,
    listener: Listener,
}

/// Mutex-guarded per-user collections plus a listener registry. Every
/// successful mutation re-notifies that collection's listeners with a
/// fresh snapshot. Listeners must not call back into the store; the
/// scheduling model is single-threaded event dispatch.
#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<CollectionKey, BTreeMap<RecordId, Value>>>,
    listeners: Mutex<HashMap<u64, Registration>>,
    next_subscription: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn snapshot_locked(
        records: &HashMap<CollectionKey, BTreeMap<RecordId, Value>>,
        user: &UserId,
        collection: &str,
    ) -> Vec<Document> {
        records
            .get(&(user.clone(), collection.to_string()))
            .map(|docs| {
                docs.iter()
                    .map(|(id, data)| Document {
                        id: *id,
                        data: data.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    fn notify(&self, user: &UserId, collection: &str) {
        let snapshot = {
            let records = self.records.lock().expect("record lock poisoned");
            Self::snapshot_locked(&records, user, collection)
        };
        let listeners = self.listeners.lock().expect("listener lock poisoned");
        for registration in listeners.values() {
            if registration.user == *user && registration.collection == collection {
                (registration.listener)(&snapshot);
            }
        }
    }
}

impl RecordStore for MemoryStore {
    fn create(
        &self,
        user: &UserId,
        collection: &str,
        id: RecordId,
        data: Value,
    ) -> Result<(), LedgerError> {
        if !data.is_object() {
            return Err(LedgerError::Store(format!(
                "record {id} in `{collection}` must be a JSON object"
            )));
        }
        {
            let mut records = self.records.lock().expect("record lock poisoned");
            let docs = records
                .entry((user.clone(), collection.to_string()))
                .or_default();
            if docs.contains_key(&id) {
                return Err(LedgerError::Store(format!(
                    "record {id} already exists in `{collection}`"
                )));
            }
            docs.insert(id, data);
        }
        self.notify(user, collection);
        Ok(())
    }

    fn update(
        &self,
        user: &UserId,
        collection: &str,
        id: RecordId,
        fields: Map<String, Value>,
    ) -> Result<(), LedgerError> {
        {
            let mut records = self.records.lock().expect("record lock poisoned");
            let docs = records
                .get_mut(&(user.clone(), collection.to_string()))
                .ok_or_else(|| LedgerError::not_found(format!("collection `{collection}`")))?;
            let data = docs
                .get_mut(&id)
                .ok_or_else(|| LedgerError::not_found(format!("record {id}")))?;
            let object = data.as_object_mut().ok_or_else(|| {
                LedgerError::Store(format!("record {id} in `{collection}` is not an object"))
            })?;
            for (key, value) in fields {
                object.insert(key, value);
            }
        }
        self.notify(user, collection);
        Ok(())
    }

    fn delete(&self, user: &UserId, collection: &str, id: RecordId) -> Result<(), LedgerError> {
        {
            let mut records = self.records.lock().expect("record lock poisoned");
            let docs = records
                .get_mut(&(user.clone(), collection.to_string()))
                .ok_or_else(|| LedgerError::not_found(format!("collection `{collection}`")))?;
            if docs.remove(&id).is_none() {
                return Err(LedgerError::not_found(format!("record {id}")));
            }
        }
        self.notify(user, collection);
        Ok(())
    }

    fn get(
        &self,
        user: &UserId,
        collection: &str,
        id: RecordId,
    ) -> Result<Option<Document>, LedgerError> {
        let records = self.records.lock().expect("record lock poisoned");
        Ok(records
            .get(&(user.clone(), collection.to_string()))
            .and_then(|docs| docs.get(&id))
            .map(|data| Document {
                id,
                data: data.clone(),
            }))
    }

    fn query_once(&self, user: &UserId, collection: &str) -> Result<Vec<Document>, LedgerError> {
        let records = self.records.lock().expect("record lock poisoned");
        Ok(Self::snapshot_locked(&records, user, collection))
    }

    fn subscribe(
        &self,
        user: &UserId,
        collection: &str,
        listener: Listener,
    ) -> Result<SubscriptionId, LedgerError> {
        let id = self.next_subscription.fetch_add(1, Ordering::Relaxed);
        self.listeners.lock().expect("listener lock poisoned").insert(
            id,
            Registration {
                user: user.clone(),
                collection: collection.to_string(),
                listener,
            },
        );
        Ok(SubscriptionId(id))
    }

    fn unsubscribe(&self, subscription: SubscriptionId) {
        self.listeners
            .lock()
            .expect("listener lock poisoned")
            .remove(&subscription.0);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use serde_json::json;
    use uuid::Uuid;

    use super::*;

    #[test]
    fn create_update_delete_round_trip() {
        let store = MemoryStore::new();
        let user = UserId::new("u1");
        let id = Uuid::new_v4();

        store
            .create(&user, "cards", id, json!({"name": "Visa"}))
            .unwrap();
        let mut fields = Map::new();
        fields.insert("name".into(), json!("Amex"));
        store.update(&user, "cards", id, fields).unwrap();

        let doc = store.get(&user, "cards", id).unwrap().unwrap();
        assert_eq!(doc.data["name"], "Amex");

        store.delete(&user, "cards", id).unwrap();
        assert!(store.get(&user, "cards", id).unwrap().is_none());
    }

    #[test]
    fn update_merges_only_given_fields() {
        let store = MemoryStore::new();
        let user = UserId::new("u1");
        let id = Uuid::new_v4();
        store
            .create(&user, "cards", id, json!({"name": "Visa", "limit": 10}))
            .unwrap();

        let mut fields = Map::new();
        fields.insert("limit".into(), json!(20));
        store.update(&user, "cards", id, fields).unwrap();

        let doc = store.get(&user, "cards", id).unwrap().unwrap();
        assert_eq!(doc.data["name"], "Visa");
        assert_eq!(doc.data["limit"], 20);
    }

    #[test]
    fn records_are_scoped_per_user() {
        let store = MemoryStore::new();
        let id = Uuid::new_v4();
        store
            .create(&UserId::new("u1"), "cards", id, json!({}))
            .unwrap();
        assert!(store
            .get(&UserId::new("u2"), "cards", id)
            .unwrap()
            .is_none());
    }

    #[test]
    fn listeners_receive_snapshots_after_each_mutation() {
        let store = MemoryStore::new();
        let user = UserId::new("u1");
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::new(AtomicUsize::new(0));

        let calls_in = Arc::clone(&calls);
        let seen_in = Arc::clone(&seen);
        store
            .subscribe(
                &user,
                "purchases",
                Box::new(move |snapshot| {
                    calls_in.fetch_add(1, Ordering::SeqCst);
                    seen_in.store(snapshot.len(), Ordering::SeqCst);
                }),
            )
            .unwrap();

        let id = Uuid::new_v4();
        store
            .create(&user, "purchases", id, json!({"v": 1}))
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(seen.load(Ordering::SeqCst), 1);

        store.delete(&user, "purchases", id).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(seen.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn unsubscribed_listener_stays_silent() {
        let store = MemoryStore::new();
        let user = UserId::new("u1");
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_in = Arc::clone(&calls);
        let sub = store
            .subscribe(
                &user,
                "cards",
                Box::new(move |_| {
                    calls_in.fetch_add(1, Ordering::SeqCst);
                }),
            )
            .unwrap();
        store.unsubscribe(sub);
        store
            .create(&user, "cards", Uuid::new_v4(), json!({}))
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
