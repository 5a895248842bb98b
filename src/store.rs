// Document persistence
// The backing API keeps whole JSON documents per user and resource kind, last write wins.
// `DocumentStore` is that contract; `InMemoryStore` implements it for local use and tests.

use crate::model::{Branding, Hotel, ItineraryData};
use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Document not found: {kind}/{id} for user {user_id}")]
    NotFound {
        user_id: String,
        kind: ResourceKind,
        id: String,
    },

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Transport or server failure of a remote `DocumentStore`; the in-memory store never fails
    #[error("Backend error: {0}")]
    BackendError(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Itinerary,
    Hotel,
    Branding,
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ResourceKind::Itinerary => "itineraries",
            ResourceKind::Hotel => "hotels",
            ResourceKind::Branding => "branding",
        };
        write!(f, "{}", name)
    }
}

// Branding is a single document per user, stored under this id
pub const BRANDING_DOC_ID: &str = "branding";

#[derive(Debug, Default)]
pub struct StoreStats {
    pub reads: AtomicUsize,
    pub writes: AtomicUsize,
    pub misses: AtomicUsize,
    pub deletes: AtomicUsize,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StoreStatsReport {
    pub reads: usize,
    pub writes: usize,
    pub misses: usize,
    pub deletes: usize,
}

#[async_trait]
pub trait DocumentStore: Send + Sync + 'static {
    async fn get(&self, user_id: &str, kind: ResourceKind, id: &str) -> Result<Option<Value>, StoreError>;

    // Overwrites any existing document
    async fn put(&self, user_id: &str, kind: ResourceKind, id: &str, doc: Value) -> Result<(), StoreError>;

    // Returns whether a document was removed
    async fn delete(&self, user_id: &str, kind: ResourceKind, id: &str) -> Result<bool, StoreError>;

    // Most recently written first
    async fn list(&self, user_id: &str, kind: ResourceKind) -> Result<Vec<Value>, StoreError>;
}

type DocKey = (String, ResourceKind, String);

struct StoredDoc {
    doc: Value,
    revision: u64,
}

#[derive(Default)]
pub struct InMemoryStore {
    docs: DashMap<DocKey, StoredDoc>,
    revision: std::sync::atomic::AtomicU64,
    stats: StoreStats,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> StoreStatsReport {
        StoreStatsReport {
            reads: self.stats.reads.load(Ordering::SeqCst),
            writes: self.stats.writes.load(Ordering::SeqCst),
            misses: self.stats.misses.load(Ordering::SeqCst),
            deletes: self.stats.deletes.load(Ordering::SeqCst),
        }
    }

    fn key(user_id: &str, kind: ResourceKind, id: &str) -> DocKey {
        (user_id.to_string(), kind, id.to_string())
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn get(&self, user_id: &str, kind: ResourceKind, id: &str) -> Result<Option<Value>, StoreError> {
        self.stats.reads.fetch_add(1, Ordering::SeqCst);
        let found = self
            .docs
            .get(&Self::key(user_id, kind, id))
            .map(|entry| entry.doc.clone());
        if found.is_none() {
            self.stats.misses.fetch_add(1, Ordering::SeqCst);
        }
        Ok(found)
    }

    async fn put(&self, user_id: &str, kind: ResourceKind, id: &str, doc: Value) -> Result<(), StoreError> {
        let revision = self.revision.fetch_add(1, Ordering::SeqCst) + 1;
        self.docs
            .insert(Self::key(user_id, kind, id), StoredDoc { doc, revision });
        self.stats.writes.fetch_add(1, Ordering::SeqCst);
        debug!(user_id, %kind, id, revision, "stored document");
        Ok(())
    }

    async fn delete(&self, user_id: &str, kind: ResourceKind, id: &str) -> Result<bool, StoreError> {
        let removed = self.docs.remove(&Self::key(user_id, kind, id)).is_some();
        if removed {
            self.stats.deletes.fetch_add(1, Ordering::SeqCst);
        }
        Ok(removed)
    }

    async fn list(&self, user_id: &str, kind: ResourceKind) -> Result<Vec<Value>, StoreError> {
        self.stats.reads.fetch_add(1, Ordering::SeqCst);
        let mut docs: Vec<(u64, Value)> = self
            .docs
            .iter()
            .filter(|entry| entry.key().0 == user_id && entry.key().1 == kind)
            .map(|entry| (entry.value().revision, entry.value().doc.clone()))
            .collect();
        docs.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(docs.into_iter().map(|(_, doc)| doc).collect())
    }
}

/// Typed access to one user's documents.
pub struct UserDocuments<'a, S: DocumentStore + ?Sized> {
    store: &'a S,
    user_id: String,
}

impl<'a, S: DocumentStore + ?Sized> UserDocuments<'a, S> {
    pub fn new(store: &'a S, user_id: impl Into<String>) -> Self {
        Self {
            store,
            user_id: user_id.into(),
        }
    }

    pub async fn save_itinerary(&self, itinerary: &ItineraryData) -> Result<(), StoreError> {
        let doc = serde_json::to_value(itinerary)?;
        self.store
            .put(&self.user_id, ResourceKind::Itinerary, &itinerary.id, doc)
            .await
    }

    pub async fn itinerary(&self, id: &str) -> Result<ItineraryData, StoreError> {
        match self.store.get(&self.user_id, ResourceKind::Itinerary, id).await? {
            Some(doc) => Ok(serde_json::from_value(doc)?),
            None => Err(self.not_found(ResourceKind::Itinerary, id)),
        }
    }

    // Documents that no longer parse are skipped rather than failing the listing
    pub async fn itineraries(&self) -> Result<Vec<ItineraryData>, StoreError> {
        let docs = self.store.list(&self.user_id, ResourceKind::Itinerary).await?;
        Ok(docs
            .into_iter()
            .filter_map(|doc| match serde_json::from_value(doc) {
                Ok(itinerary) => Some(itinerary),
                Err(e) => {
                    warn!(user_id = %self.user_id, error = %e, "skipping unreadable itinerary");
                    None
                }
            })
            .collect())
    }

    pub async fn delete_itinerary(&self, id: &str) -> Result<bool, StoreError> {
        self.store
            .delete(&self.user_id, ResourceKind::Itinerary, id)
            .await
    }

    // The hotel list is replaced wholesale
    pub async fn replace_hotels(&self, hotels: &[Hotel]) -> Result<(), StoreError> {
        for existing in self.store.list(&self.user_id, ResourceKind::Hotel).await? {
            if let Some(id) = existing.get("id").and_then(Value::as_str) {
                self.store.delete(&self.user_id, ResourceKind::Hotel, id).await?;
            }
        }
        for hotel in hotels {
            let doc = serde_json::to_value(hotel)?;
            self.store
                .put(&self.user_id, ResourceKind::Hotel, &hotel.id, doc)
                .await?;
        }
        Ok(())
    }

    // In the order they were saved
    pub async fn hotels(&self) -> Result<Vec<Hotel>, StoreError> {
        let docs = self.store.list(&self.user_id, ResourceKind::Hotel).await?;
        docs.into_iter()
            .rev()
            .map(|doc| serde_json::from_value(doc).map_err(StoreError::from))
            .collect()
    }

    pub async fn save_branding(&self, branding: &Branding) -> Result<(), StoreError> {
        let doc = serde_json::to_value(branding)?;
        self.store
            .put(&self.user_id, ResourceKind::Branding, BRANDING_DOC_ID, doc)
            .await
    }

    pub async fn branding(&self) -> Result<Branding, StoreError> {
        match self
            .store
            .get(&self.user_id, ResourceKind::Branding, BRANDING_DOC_ID)
            .await?
        {
            Some(doc) => Ok(serde_json::from_value(doc)?),
            None => Err(self.not_found(ResourceKind::Branding, BRANDING_DOC_ID)),
        }
    }

    fn not_found(&self, kind: ResourceKind, id: &str) -> StoreError {
        StoreError::NotFound {
            user_id: self.user_id.clone(),
            kind,
            id: id.to_string(),
        }
    }
}
