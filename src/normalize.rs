use crate::config::RateSource;
use crate::constants::{INVALID_RATE, MISSING_VALUE};
use crate::types::AnnotationDetails;
use crate::vcf::VariantRecord;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Output document, one per resolved VCF record.
///
/// Field names are the collection's existing schema and must not change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MutationDocument {
    #[serde(rename = "IDTest")]
    pub id_test: String,
    #[serde(rename = "Gene")]
    pub gene: String,
    #[serde(rename = "RS_ID")]
    pub rs_id: String,
    #[serde(rename = "Nucleotide")]
    pub nucleotide: String,
    #[serde(rename = "Protein")]
    pub protein: String,
    #[serde(rename = "VariationType")]
    pub variation_type: String,
    #[serde(rename = "VariantLength")]
    pub variant_length: String,
    #[serde(rename = "Position")]
    pub position: String,
    #[serde(rename = "Chromosome")]
    pub chromosome: String,
    #[serde(rename = "DrugResponse")]
    pub drug_response: String,
    #[serde(rename = "VariantRate")]
    pub variant_rate: String,
    #[serde(rename = "ReadDepth")]
    pub read_depth: String,
    #[serde(rename = "createAt")]
    pub create_at: String,
    #[serde(rename = "updateAt")]
    pub update_at: String,
    #[serde(rename = "__v")]
    pub version: i32,
    pub mutations: Vec<serde_json::Value>,
}

/// `0.35` becomes `"35.00%"`.
pub fn format_percentage(fraction: f64) -> String {
    format!("{:.2}%", fraction * 100.0)
}

/// Reformat a raw INFO `AF` value as a percentage.
///
/// `-` passes through unchanged, a comma decimal separator is accepted and anything
/// that does not parse as a number becomes `"Invalid"`.
pub fn local_rate(raw: &str) -> String {
    if raw == MISSING_VALUE {
        return raw.to_string();
    }
    match raw.trim().replace(',', ".").parse::<f64>() {
        Ok(value) if value.is_finite() => format_percentage(value),
        _ => INVALID_RATE.to_string(),
    }
}

/// Builder for documents of one run; every document it builds shares the run's IDTest.
pub struct DocumentBuilder {
    id_test: String,
    rate_source: RateSource,
}

impl DocumentBuilder {
    pub fn new(id_test: impl Into<String>, rate_source: RateSource) -> Self {
        Self {
            id_test: id_test.into(),
            rate_source,
        }
    }

    pub fn build(&self, record: &VariantRecord, details: &AnnotationDetails) -> MutationDocument {
        self.build_at(record, details, Utc::now())
    }

    pub fn build_at(
        &self,
        record: &VariantRecord,
        details: &AnnotationDetails,
        now: DateTime<Utc>,
    ) -> MutationDocument {
        let local = local_rate(&record.variant_rate());
        let variant_rate = match self.rate_source {
            RateSource::Fetched => details.variant_rate.clone(),
            RateSource::Local => local.clone(),
        };
        debug!(
            identifier = %record.identifier,
            fetched_rate = %details.variant_rate,
            local_rate = %local,
            "selected variant rate"
        );

        let timestamp = now.to_rfc3339_opts(SecondsFormat::Millis, true);
        MutationDocument {
            id_test: self.id_test.clone(),
            gene: details.gene.clone(),
            rs_id: details.rs_id.clone(),
            nucleotide: details.nucleotide.clone(),
            protein: details.protein.clone(),
            variation_type: details.variant_type.clone(),
            variant_length: record.variant_length().to_string(),
            position: details.position.clone(),
            chromosome: details.chromosome.clone(),
            drug_response: details.drug_response.clone(),
            variant_rate,
            read_depth: record.read_depth_format(),
            create_at: timestamp.clone(),
            update_at: timestamp,
            version: 0,
            mutations: Vec::new(),
        }
    }
}
