use std::sync::Arc;

use arcade_store::DocumentStore;
use arcade_types::{
    format_timestamp, Clock, Document, Record, RecordId, RequiredField, SafeView, SystemClock,
    UserInput,
};
use serde_json::Map;
use tracing::{info, warn};

use crate::codec;
use crate::error::{RegistryError, RegistryResult};

/// The record store service.
///
/// Holds no state between calls: every operation re-reads the document.
/// The store and clock are injected at construction; one instance per
/// process is expected, shared behind an `Arc`.
pub struct UserRegistry<S: ?Sized> {
    store: Arc<S>,
    key: String,
    clock: Arc<dyn Clock>,
}

impl<S: DocumentStore + ?Sized> UserRegistry<S> {
    /// Registry over the document at `key`, using the system clock.
    pub fn new(store: Arc<S>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the clock used for ids and creation timestamps.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Key of the document this registry reads and writes.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Ordered list of fields every submission must carry.
    pub fn required_fields() -> Vec<&'static str> {
        RequiredField::names()
    }

    /// Read the document. Bytes that do not decode are an error.
    async fn load(&self) -> RegistryResult<Document> {
        let bytes = self.store.fetch(&self.key).await?;
        if bytes.is_none() {
            info!(key = %self.key, "document not found, treating as empty");
        }
        Ok(codec::decode(bytes.as_deref())?)
    }

    /// Read the document for display. An undecodable document reads as empty.
    async fn load_lenient(&self) -> RegistryResult<Document> {
        match self.load().await {
            Err(RegistryError::Codec(e)) => {
                warn!(
                    key = %self.key,
                    error = %e,
                    "stored document is not decodable, reading as empty"
                );
                Ok(Document::empty())
            }
            other => other,
        }
    }

    /// Safe views of every record, in insertion order.
    ///
    /// An absent document lists as empty.
    pub async fn list_safe(&self) -> RegistryResult<Vec<SafeView>> {
        let doc = self.load_lenient().await?;
        let users = doc.safe_views();
        info!(count = users.len(), "listing users without favourite numbers");
        Ok(users)
    }

    /// Number of records in the document.
    pub async fn count(&self) -> RegistryResult<usize> {
        Ok(self.load_lenient().await?.len())
    }

    /// Validate `input`, append it as a new record, and persist the document.
    ///
    /// Validation failures return before the store is touched. A stored
    /// document that does not decode is left alone and the append fails.
    /// The write replaces the whole document; a concurrent append between
    /// our read and write is lost.
    pub async fn append(&self, input: UserInput) -> RegistryResult<SafeView> {
        if let Some(missing) = input.first_missing() {
            return Err(RegistryError::Validation { missing });
        }

        let mut doc = self.load().await?;
        let now = self.clock.now();
        let record = Record {
            id: RecordId::next(&now, &doc.ids()),
            first_name: input.first_name.unwrap_or_default(),
            surname: input.surname.unwrap_or_default(),
            birthday: input.birthday.unwrap_or_default(),
            favourite_colour: input.favourite_colour.unwrap_or_default(),
            favourite_number: input.favourite_number.unwrap_or_default(),
            created_at: format_timestamp(&now),
            extra: Map::new(),
        };
        let view = record.safe_view();
        info!(
            id = %record.id,
            first_name = %record.first_name,
            surname = %record.surname,
            "adding user"
        );

        doc.push(record);
        let bytes = codec::encode(&doc)?;
        self.store.store(&self.key, bytes).await?;

        info!(id = %view.id, total = doc.len(), "user saved");
        Ok(view)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::CodecError;
    use arcade_store::{InMemoryDocumentStore, StoreError, StoreResult};
    use arcade_types::FixedClock;
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const KEY: &str = "database.json";

    fn amy() -> UserInput {
        UserInput {
            first_name: Some("Amy".into()),
            surname: Some("Lee".into()),
            birthday: Some("2000-01-01".into()),
            favourite_colour: Some("blue".into()),
            favourite_number: Some(7),
        }
    }

    fn registry() -> (Arc<InMemoryDocumentStore>, UserRegistry<InMemoryDocumentStore>) {
        let store = Arc::new(InMemoryDocumentStore::new());
        let registry = UserRegistry::new(store.clone(), KEY)
            .with_clock(Arc::new(FixedClock::from_millis(1_700_000_000_000)));
        (store, registry)
    }

    async fn stored_document(store: &InMemoryDocumentStore) -> Document {
        let bytes = store.fetch(KEY).await.unwrap();
        codec::decode(bytes.as_deref()).unwrap()
    }

    /// Store that counts calls and can fail on demand.
    #[derive(Default)]
    struct FlakyStore {
        inner: InMemoryDocumentStore,
        fail_fetch: bool,
        fail_store: bool,
        fetches: AtomicUsize,
        stores: AtomicUsize,
    }

    #[async_trait]
    impl DocumentStore for FlakyStore {
        async fn fetch(&self, key: &str) -> StoreResult<Option<Bytes>> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if self.fail_fetch {
                return Err(StoreError::Unavailable("access denied".into()));
            }
            self.inner.fetch(key).await
        }

        async fn store(&self, key: &str, data: Bytes) -> StoreResult<()> {
            self.stores.fetch_add(1, Ordering::SeqCst);
            if self.fail_store {
                return Err(StoreError::Unavailable("slow down".into()));
            }
            self.inner.store(key, data).await
        }
    }

    #[tokio::test]
    async fn list_on_absent_document_is_empty() {
        let (store, registry) = registry();
        assert!(registry.list_safe().await.unwrap().is_empty());
        assert_eq!(registry.count().await.unwrap(), 0);
        // Listing never creates the document.
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn append_creates_document_and_returns_safe_view() {
        let (store, registry) = registry();
        let view = registry.append(amy()).await.unwrap();

        assert_eq!(view.first_name, "Amy");
        assert_eq!(view.id.as_str(), "1700000000000");
        assert_eq!(view.created_at, "2023-11-14T22:13:20.000Z");

        let doc = stored_document(&store).await;
        assert_eq!(doc.len(), 1);
        assert_eq!(doc.users[0].as_record().unwrap().favourite_number, 7);
    }

    #[tokio::test]
    async fn append_then_list_matches_input() {
        let (_store, registry) = registry();
        registry.append(amy()).await.unwrap();
        let before = registry.list_safe().await.unwrap().len();

        let ben = UserInput {
            first_name: Some("Ben".into()),
            favourite_colour: Some("red".into()),
            favourite_number: Some(1000),
            ..amy()
        };
        registry.append(ben).await.unwrap();

        let users = registry.list_safe().await.unwrap();
        assert_eq!(users.len(), before + 1);
        let last = users.last().unwrap();
        assert_eq!(last.first_name, "Ben");
        assert_eq!(last.surname, "Lee");
        assert_eq!(last.birthday, "2000-01-01");
        assert_eq!(last.favourite_colour, "red");

        let json = serde_json::to_value(&users).unwrap();
        assert!(json
            .as_array()
            .unwrap()
            .iter()
            .all(|u| u.get("favouriteNumber").is_none()));
    }

    #[tokio::test]
    async fn sequential_appends_get_distinct_increasing_ids() {
        // Clock frozen: ids must still differ.
        let (_store, registry) = registry();
        let a = registry.append(amy()).await.unwrap();
        let b = registry.append(amy()).await.unwrap();
        assert_ne!(a.id, b.id);
        assert!(b.id.as_millis() > a.id.as_millis());

        let ids: Vec<_> = registry.list_safe().await.unwrap().into_iter().map(|v| v.id).collect();
        assert_eq!(ids, vec![a.id, b.id]);
    }

    #[tokio::test]
    async fn missing_field_is_rejected_without_storage_access() {
        let store = Arc::new(FlakyStore::default());
        let registry = UserRegistry::new(store.clone(), KEY);

        for field in RequiredField::ALL {
            let mut input = amy();
            match field {
                RequiredField::FirstName => input.first_name = None,
                RequiredField::Surname => input.surname = Some(String::new()),
                RequiredField::Birthday => input.birthday = None,
                RequiredField::FavouriteColour => input.favourite_colour = Some(" ".into()),
                RequiredField::FavouriteNumber => input.favourite_number = Some(0),
            }
            let err = registry.append(input).await.unwrap_err();
            assert!(matches!(err, RegistryError::Validation { missing } if missing == field));
        }

        assert_eq!(store.fetches.load(Ordering::SeqCst), 0);
        assert_eq!(store.stores.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn append_preserves_existing_records_and_annotations() {
        let existing = serde_json::json!({
            "users": [{
                "id": "legacy-1",
                "firstName": "Cat",
                "surname": "Ng",
                "birthday": "1990-02-03",
                "favouriteColour": "purple",
                "favouriteNumber": 99,
                "createdAt": "2020-01-01T00:00:00.000Z"
            }],
            "schema": { "firstName": "string" },
            "created_at": "2020-01-01T00:00:00Z",
            "version": "1.0"
        });
        let store = Arc::new(InMemoryDocumentStore::with_objects([(
            KEY,
            existing.to_string().into_bytes(),
        )]));
        let registry = UserRegistry::new(store.clone(), KEY)
            .with_clock(Arc::new(FixedClock::from_millis(5)));
        registry.append(amy()).await.unwrap();

        let doc = stored_document(&store).await;
        assert_eq!(doc.len(), 2);
        assert_eq!(doc.users[0].id().unwrap().as_str(), "legacy-1");
        assert_eq!(doc.users[0].as_record().unwrap().favourite_number, 99);
        assert_eq!(doc.users[1].id().unwrap().as_str(), "5");
        assert_eq!(doc.created_at, Some(serde_json::json!("2020-01-01T00:00:00Z")));
        assert_eq!(doc.extra.get("version"), Some(&serde_json::json!("1.0")));
    }

    #[tokio::test]
    async fn append_keeps_records_in_other_shapes() {
        let existing = serde_json::json!({
            "users": [
                {
                    "id": "1700000000000",
                    "firstName": "Cat",
                    "surname": "Ng",
                    "birthday": "1990-02-03",
                    "favouriteColour": "purple",
                    "favouriteNumber": "42",
                    "createdAt": "2023-01-01T00:00:00.000Z"
                },
                {
                    "id": "1700000000001",
                    "firstName": "Dan",
                    "surname": "Ito",
                    "birthday": "1985-05-05",
                    "favouriteColour": "green",
                    "favouriteNumber": 5,
                    "referrer": "poster"
                }
            ],
            "version": "1.0"
        });
        let store = Arc::new(InMemoryDocumentStore::with_objects([(
            KEY,
            existing.to_string().into_bytes(),
        )]));
        let registry = UserRegistry::new(store.clone(), KEY)
            .with_clock(Arc::new(FixedClock::from_millis(1_700_000_000_000)));

        let before = registry.list_safe().await.unwrap();
        assert_eq!(before.len(), 2);
        assert_eq!(before[0].first_name, "Cat");
        assert_eq!(before[1].extra.get("referrer"), Some(&serde_json::json!("poster")));

        let view = registry.append(amy()).await.unwrap();
        assert_eq!(view.id.as_str(), "1700000000002");

        let bytes = store.fetch(KEY).await.unwrap().unwrap();
        let stored: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(stored["version"], "1.0");
        let users = stored["users"].as_array().unwrap();
        assert_eq!(users.len(), 3);
        assert_eq!(users[0], existing["users"][0]);
        assert_eq!(users[1], existing["users"][1]);
        assert_eq!(users[2]["firstName"], "Amy");

        let after = registry.list_safe().await.unwrap();
        assert_eq!(after.len(), 3);
        assert!(serde_json::to_value(&after)
            .unwrap()
            .as_array()
            .unwrap()
            .iter()
            .all(|u| u.get("favouriteNumber").is_none()));
    }

    #[tokio::test]
    async fn append_refuses_to_overwrite_undecodable_document() {
        let store = Arc::new(InMemoryDocumentStore::with_objects([(
            KEY,
            &b"{\"users\": 5}"[..],
        )]));
        let registry = UserRegistry::new(store.clone(), KEY);

        assert!(registry.list_safe().await.unwrap().is_empty());
        assert!(matches!(
            registry.append(amy()).await,
            Err(RegistryError::Codec(CodecError::Malformed(_)))
        ));
        let bytes = store.fetch(KEY).await.unwrap().unwrap();
        assert_eq!(&bytes[..], b"{\"users\": 5}");
    }

    #[tokio::test]
    async fn fetch_failure_propagates() {
        let store = Arc::new(FlakyStore {
            fail_fetch: true,
            ..FlakyStore::default()
        });
        let registry = UserRegistry::new(store.clone(), KEY);

        assert!(matches!(
            registry.list_safe().await,
            Err(RegistryError::Store(StoreError::Unavailable(_)))
        ));
        assert!(matches!(
            registry.append(amy()).await,
            Err(RegistryError::Store(_))
        ));
        assert_eq!(store.stores.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn store_failure_propagates() {
        let store = Arc::new(FlakyStore {
            fail_store: true,
            ..FlakyStore::default()
        });
        let registry = UserRegistry::new(store.clone(), KEY);
        assert!(matches!(
            registry.append(amy()).await,
            Err(RegistryError::Store(StoreError::Unavailable(_)))
        ));
        assert_eq!(store.fetches.load(Ordering::SeqCst), 1);
        assert_eq!(store.stores.load(Ordering::SeqCst), 1);
        assert!(store.inner.is_empty());
    }

    #[tokio::test]
    async fn works_through_a_trait_object() {
        let store: Arc<dyn DocumentStore> = Arc::new(InMemoryDocumentStore::new());
        let registry = UserRegistry::new(store, KEY);
        registry.append(amy()).await.unwrap();
        assert_eq!(registry.count().await.unwrap(), 1);
    }

    #[test]
    fn required_fields_in_order() {
        assert_eq!(
            UserRegistry::<InMemoryDocumentStore>::required_fields(),
            vec!["firstName", "surname", "birthday", "favouriteColour", "favouriteNumber"]
        );
    }
}
