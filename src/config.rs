use crate::constants;
use crate::error::{AnnotatorError, Result};
use reqwest::Url;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub mongo: MongoConfig,
    pub eutils: EutilsConfig,
    pub pipeline: PipelineSettings,
    pub metrics: MetricsSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MongoConfig {
    /// Full connection string. When set, the discrete fields below are ignored.
    pub uri: Option<String>,
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub auth_source: String,
    pub auth_mechanism: String,
    pub database: String,
    pub collection: String,
    pub connect_timeout_ms: u64,
    pub server_selection_timeout_ms: u64,
    pub retry_writes: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EutilsConfig {
    pub base_url: String,
    pub database: String,
    pub api_key: Option<String>,
    pub tool: Option<String>,
    pub email: Option<String>,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    pub concurrency: usize,
    pub cache_lookups: bool,
    pub rate_source: RateSource,
    pub on_malformed_line: MalformedLinePolicy,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MetricsSettings {
    pub pushgateway_url: Option<String>,
}

/// Which rate ends up in a document's `VariantRate` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateSource {
    /// Population frequency reported by the annotation service.
    #[default]
    Fetched,
    /// `AF` value from the VCF INFO column, reformatted as a percentage.
    Local,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MalformedLinePolicy {
    #[default]
    Abort,
    Skip,
}

impl Default for MongoConfig {
    fn default() -> Self {
        Self {
            uri: None,
            host: constants::DEFAULT_MONGO_HOST.to_string(),
            port: constants::DEFAULT_MONGO_PORT,
            username: None,
            password: None,
            auth_source: constants::DEFAULT_MONGO_AUTH_SOURCE.to_string(),
            auth_mechanism: constants::DEFAULT_MONGO_AUTH_MECHANISM.to_string(),
            database: constants::DEFAULT_MONGO_DATABASE.to_string(),
            collection: constants::DEFAULT_MONGO_COLLECTION.to_string(),
            connect_timeout_ms: 10_000,
            server_selection_timeout_ms: 5_000,
            retry_writes: true,
        }
    }
}

impl Default for EutilsConfig {
    fn default() -> Self {
        Self {
            base_url: constants::DEFAULT_EUTILS_BASE_URL.to_string(),
            database: constants::CLINVAR_DATABASE.to_string(),
            api_key: None,
            tool: None,
            email: None,
            timeout_seconds: 30,
        }
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            concurrency: 1,
            cache_lookups: true,
            rate_source: RateSource::default(),
            on_malformed_line: MalformedLinePolicy::default(),
        }
    }
}

impl std::str::FromStr for RateSource {
    type Err = AnnotatorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fetched" => Ok(RateSource::Fetched),
            "local" => Ok(RateSource::Local),
            other => Err(AnnotatorError::Config(format!("Unknown rate source '{}'", other))),
        }
    }
}

impl std::str::FromStr for MalformedLinePolicy {
    type Err = AnnotatorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "abort" => Ok(MalformedLinePolicy::Abort),
            "skip" => Ok(MalformedLinePolicy::Skip),
            other => Err(AnnotatorError::Config(format!("Unknown malformed line policy '{}'", other))),
        }
    }
}

impl Config {
    /// Load `config.toml` (when present) and apply `ANNOTATOR_*` environment overrides.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = fs::read_to_string(path).map_err(|e| {
                AnnotatorError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
            })?;
            info!("Loaded configuration from {}", path.display());
            Self::from_toml_str(&content)?
        } else {
            debug!("No config file at {}, using defaults", path.display());
            Self::default()
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Apply overrides from a key lookup (normally the process environment).
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(&format!("ANNOTATOR_{}", name)).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("MONGO_URI") {
            self.mongo.uri = Some(v);
        }
        if let Some(v) = get("MONGO_HOST") {
            self.mongo.host = v;
        }
        if let Some(v) = get("MONGO_PORT") {
            self.mongo.port = parse_number("ANNOTATOR_MONGO_PORT", &v)?;
        }
        if let Some(v) = get("MONGO_USERNAME") {
            self.mongo.username = Some(v);
        }
        if let Some(v) = get("MONGO_PASSWORD") {
            self.mongo.password = Some(v);
        }
        if let Some(v) = get("MONGO_AUTH_SOURCE") {
            self.mongo.auth_source = v;
        }
        if let Some(v) = get("MONGO_DATABASE") {
            self.mongo.database = v;
        }
        if let Some(v) = get("MONGO_COLLECTION") {
            self.mongo.collection = v;
        }
        if let Some(v) = get("EUTILS_BASE_URL") {
            self.eutils.base_url = v;
        }
        if let Some(v) = get("EUTILS_API_KEY") {
            self.eutils.api_key = Some(v);
        }
        if let Some(v) = get("EUTILS_EMAIL") {
            self.eutils.email = Some(v);
        }
        if let Some(v) = get("HTTP_TIMEOUT_SECS") {
            self.eutils.timeout_seconds = parse_number("ANNOTATOR_HTTP_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = get("CONCURRENCY") {
            self.pipeline.concurrency = parse_number("ANNOTATOR_CONCURRENCY", &v)?;
        }
        if let Some(v) = get("RATE_SOURCE") {
            self.pipeline.rate_source = v.parse()?;
        }
        if let Some(v) = get("ON_MALFORMED_LINE") {
            self.pipeline.on_malformed_line = v.parse()?;
        }
        if let Some(v) = get("PUSHGATEWAY_URL") {
            self.metrics.pushgateway_url = Some(v);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.pipeline.concurrency == 0 {
            return Err(AnnotatorError::Config("pipeline.concurrency must be at least 1".to_string()));
        }
        if self.eutils.timeout_seconds == 0 {
            return Err(AnnotatorError::Config("eutils.timeout_seconds must be at least 1".to_string()));
        }
        Url::parse(&self.eutils.base_url).map_err(|e| {
            AnnotatorError::Config(format!("Invalid eutils.base_url '{}': {}", self.eutils.base_url, e))
        })?;
        if self.mongo.collection.trim().is_empty() {
            return Err(AnnotatorError::Config("mongo.collection must not be empty".to_string()));
        }
        Ok(())
    }
}

impl EutilsConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl MongoConfig {
    /// Connection string with credentials percent-encoded.
    pub fn connection_uri(&self) -> Result<String> {
        if let Some(uri) = &self.uri {
            return Ok(uri.clone());
        }
        let base = format!("mongodb://{}:{}/{}", self.host, self.port, self.database);
        let mut url = Url::parse(&base)
            .map_err(|e| AnnotatorError::Config(format!("Invalid MongoDB address '{}': {}", base, e)))?;
        if let Some(username) = &self.username {
            url.set_username(username)
                .map_err(|_| AnnotatorError::Config("MongoDB username cannot be set on this address".to_string()))?;
            url.set_password(self.password.as_deref())
                .map_err(|_| AnnotatorError::Config("MongoDB password cannot be set on this address".to_string()))?;
        }
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("retryWrites", if self.retry_writes { "true" } else { "false" })
                .append_pair("serverSelectionTimeoutMS", &self.server_selection_timeout_ms.to_string())
                .append_pair("connectTimeoutMS", &self.connect_timeout_ms.to_string());
            if self.username.is_some() {
                query
                    .append_pair("authSource", &self.auth_source)
                    .append_pair("authMechanism", &self.auth_mechanism);
            }
        }
        Ok(url.to_string())
    }

    /// Address suitable for logs: never includes credentials.
    pub fn redacted_address(&self) -> String {
        match &self.uri {
            Some(_) => format!("<uri>/{}", self.collection),
            None => format!("{}:{}/{}.{}", self.host, self.port, self.database, self.collection),
        }
    }
}

fn parse_number<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| AnnotatorError::Config(format!("{} must be a number, got '{}'", name, value)))
}
