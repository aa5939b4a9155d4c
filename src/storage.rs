use crate::error::Result;
use crate::normalize::MutationDocument;
use async_trait::async_trait;
use std::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

/// Sink for a run's mutation documents.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Write the whole batch in one operation and return the store-assigned ids in batch order.
    async fn insert_many(&self, documents: &[MutationDocument]) -> Result<Vec<String>>;
}

/// In-memory storage implementation for dry runs and tests
#[derive(Default)]
pub struct InMemoryStorage {
    documents: Mutex<Vec<(String, MutationDocument)>>,
    batches: Mutex<usize>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn documents(&self) -> Vec<MutationDocument> {
        self.documents
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|(_, doc)| doc.clone())
            .collect()
    }

    /// Number of `insert_many` calls received.
    pub fn batch_count(&self) -> usize {
        *self.batches.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn insert_many(&self, documents: &[MutationDocument]) -> Result<Vec<String>> {
        let mut stored = self.documents.lock().unwrap_or_else(|e| e.into_inner());
        let ids: Vec<String> = documents
            .iter()
            .map(|doc| {
                let id = Uuid::new_v4().to_string();
                stored.push((id.clone(), doc.clone()));
                id
            })
            .collect();
        *self.batches.lock().unwrap_or_else(|e| e.into_inner()) += 1;

        debug!("Stored {} documents in memory", ids.len());
        Ok(ids)
    }
}

#[cfg(feature = "db")]
pub use mongo::MongoStorage;

#[cfg(feature = "db")]
mod mongo {
    use super::Storage;
    use crate::config::MongoConfig;
    use crate::error::{AnnotatorError, Result};
    use crate::normalize::MutationDocument;
    use async_trait::async_trait;
    use mongodb::{bson::Bson, Client, Collection};
    use tracing::info;

    /// MongoDB sink. One client per run, one collection.
    pub struct MongoStorage {
        collection: Collection<MutationDocument>,
    }

    impl MongoStorage {
        pub async fn connect(config: &MongoConfig) -> Result<Self> {
            let uri = config.connection_uri()?;
            info!("Connecting to MongoDB at {}", config.redacted_address());

            let client = Client::with_uri_str(&uri).await.map_err(|e| AnnotatorError::Storage {
                message: format!("Failed to connect to MongoDB: {e}"),
            })?;
            let database = client
                .default_database()
                .unwrap_or_else(|| client.database(&config.database));
            let collection = database.collection::<MutationDocument>(&config.collection);

            Ok(Self { collection })
        }
    }

    #[async_trait]
    impl Storage for MongoStorage {
        async fn insert_many(&self, documents: &[MutationDocument]) -> Result<Vec<String>> {
            let result = self
                .collection
                .insert_many(documents, None)
                .await
                .map_err(|e| AnnotatorError::Storage {
                    message: format!("Bulk insert into '{}' failed: {e}", self.collection.name()),
                })?;

            let mut inserted: Vec<(usize, Bson)> = result.inserted_ids.into_iter().collect();
            inserted.sort_by_key(|(index, _)| *index);
            Ok(inserted
                .into_iter()
                .map(|(_, id)| match id {
                    Bson::ObjectId(oid) => oid.to_hex(),
                    other => other.to_string(),
                })
                .collect())
        }
    }
}
