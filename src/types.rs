use crate::constants::NOT_FOUND;
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Annotation fields extracted from one ClinVar summary record.
///
/// Every field is a display string; absent source data is carried as `"not found"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationDetails {
    pub gene: String,
    pub nucleotide: String,
    pub drug_response: String,
    pub protein: String,
    pub variant_type: String,
    pub rs_id: String,
    pub position: String,
    pub chromosome: String,
    pub variant_rate: String,
}

impl Default for AnnotationDetails {
    fn default() -> Self {
        Self {
            gene: NOT_FOUND.to_string(),
            nucleotide: NOT_FOUND.to_string(),
            drug_response: NOT_FOUND.to_string(),
            protein: NOT_FOUND.to_string(),
            variant_type: NOT_FOUND.to_string(),
            rs_id: NOT_FOUND.to_string(),
            position: NOT_FOUND.to_string(),
            chromosome: NOT_FOUND.to_string(),
            variant_rate: NOT_FOUND.to_string(),
        }
    }
}

/// Core trait for an external variant annotation authority
#[async_trait::async_trait]
pub trait AnnotationSource: Send + Sync {
    /// Short name used in logs and metrics
    fn source_name(&self) -> &'static str;

    /// Map a file-native identifier (e.g. `rs113993960`) to the service's record id.
    async fn resolve_identifier(&self, identifier: &str) -> Result<Option<String>>;

    /// Retrieve and extract the annotation record for a resolved id.
    async fn fetch_details(&self, record_id: &str) -> Result<AnnotationDetails>;
}
