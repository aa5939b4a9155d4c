use super::summary::{parse_search_result, parse_summary};
use crate::app::ports::{HttpClientPort, HttpGetResult};
use crate::config::EutilsConfig;
use crate::error::{AnnotatorError, Result};
use crate::metrics::AnnotatorMetrics;
use crate::types::{AnnotationDetails, AnnotationSource};
use reqwest::Url;
use std::time::Instant;
use tracing::{debug, instrument};

/// ClinVar client over the NCBI E-utilities `esearch` and `esummary` endpoints.
pub struct ClinVarClient<H> {
    http: H,
    config: EutilsConfig,
}

impl<H: HttpClientPort> ClinVarClient<H> {
    pub fn new(http: H, config: EutilsConfig) -> Self {
        Self { http, config }
    }

    pub fn search_url(&self, term: &str) -> Result<Url> {
        self.endpoint("esearch.fcgi", ("term", term))
    }

    pub fn summary_url(&self, id: &str) -> Result<Url> {
        self.endpoint("esummary.fcgi", ("id", id))
    }

    fn endpoint(&self, path: &str, query: (&str, &str)) -> Result<Url> {
        let base = format!("{}/{}", self.config.base_url.trim_end_matches('/'), path);
        let mut params: Vec<(&str, &str)> = vec![("db", self.config.database.as_str()), query];
        if let Some(key) = &self.config.api_key {
            params.push(("api_key", key.as_str()));
        }
        if let Some(tool) = &self.config.tool {
            params.push(("tool", tool.as_str()));
        }
        if let Some(email) = &self.config.email {
            params.push(("email", email.as_str()));
        }
        Url::parse_with_params(&base, &params)
            .map_err(|e| AnnotatorError::Config(format!("Invalid E-utilities URL '{}': {}", base, e)))
    }

    async fn get_xml(&self, endpoint: &'static str, url: Url) -> Result<String> {
        let started = Instant::now();
        let response: HttpGetResult = self.http.get(url.as_str()).await.map_err(|e| {
            AnnotatorMetrics::record_request_error(endpoint);
            AnnotatorError::Api {
                message: format!("{} request failed: {}", endpoint, e),
            }
        })?;
        AnnotatorMetrics::record_request(endpoint, started.elapsed().as_secs_f64());

        if !response.is_success() {
            AnnotatorMetrics::record_request_error(endpoint);
            return Err(AnnotatorError::Api {
                message: format!("{} returned HTTP {}", endpoint, response.status),
            });
        }
        debug!(
            endpoint,
            bytes = response.bytes.len(),
            content_type = %response.content_type,
            "received response"
        );
        String::from_utf8(response.bytes).map_err(|e| AnnotatorError::Api {
            message: format!("{} returned a non UTF-8 body: {}", endpoint, e),
        })
    }
}

#[async_trait::async_trait]
impl<H: HttpClientPort> AnnotationSource for ClinVarClient<H> {
    fn source_name(&self) -> &'static str {
        "clinvar"
    }

    #[instrument(skip(self))]
    async fn resolve_identifier(&self, identifier: &str) -> Result<Option<String>> {
        let url = self.search_url(identifier)?;
        let body = self.get_xml("esearch", url).await?;
        let id = parse_search_result(&body)?;
        debug!(resolved = ?id, "esearch complete");
        Ok(id)
    }

    #[instrument(skip(self))]
    async fn fetch_details(&self, record_id: &str) -> Result<AnnotationDetails> {
        let url = self.summary_url(record_id)?;
        let body = self.get_xml("esummary", url).await?;
        parse_summary(&body)
    }
}
