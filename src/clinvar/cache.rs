use crate::types::AnnotationDetails;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Outcome of annotating one file-native identifier.
#[derive(Debug, Clone)]
pub enum Lookup {
    Resolved(Arc<AnnotationDetails>),
    Unresolved,
}

/// Per-run memo of identifier lookups, so a repeated rsID costs one esearch/esummary pair.
///
/// Concurrent misses on the same key may both go to the network; the later insert wins
/// and both results are identical.
#[derive(Debug, Default)]
pub struct AnnotationCache {
    entries: Mutex<HashMap<String, Lookup>>,
}

impl AnnotationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, identifier: &str) -> Option<Lookup> {
        self.entries.lock().await.get(identifier).cloned()
    }

    pub async fn insert(&self, identifier: &str, lookup: Lookup) {
        self.entries.lock().await.insert(identifier.to_string(), lookup);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_entries_are_returned_by_identifier() {
        let cache = AnnotationCache::new();
        assert!(cache.get("rs1").await.is_none());
        cache.insert("rs1", Lookup::Unresolved).await;
        cache
            .insert("rs2", Lookup::Resolved(Arc::new(AnnotationDetails::default())))
            .await;

        assert!(matches!(cache.get("rs1").await, Some(Lookup::Unresolved)));
        assert!(matches!(cache.get("rs2").await, Some(Lookup::Resolved(_))));
        assert!(cache.get("rs3").await.is_none());
    }
}
