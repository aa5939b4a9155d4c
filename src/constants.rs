/// Sentinel and protocol constants shared across the reader, fetcher and normalizer.

// Sentinels written into documents
pub const NOT_FOUND: &str = "not found";
pub const MISSING_VALUE: &str = "-";
pub const INVALID_RATE: &str = "Invalid";

// VCF conventions
pub const COMMENT_MARKER: char = '#';
pub const MISSING_ID: &str = ".";
pub const MIN_LEADING_COLUMNS: usize = 5;
pub const MIN_SAMPLE_COLUMNS: usize = 10;
pub const INFO_COLUMN: usize = 7;
pub const FORMAT_COLUMN: usize = 8;
pub const SAMPLE_COLUMN: usize = 9;
pub const ALLELE_FREQUENCY_KEY: &str = "AF";
pub const READ_DEPTH_KEY: &str = "DP";

// E-utilities
pub const DEFAULT_EUTILS_BASE_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils";
pub const CLINVAR_DATABASE: &str = "clinvar";
pub const DBSNP_SOURCE: &str = "dbSNP";
pub const GNOMAD_SOURCE: &str = "gnomAD";
pub const CURRENT_ASSEMBLY_STATUS: &str = "current";

// Document store defaults
pub const DEFAULT_MONGO_HOST: &str = "127.0.0.1";
pub const DEFAULT_MONGO_PORT: u16 = 27017;
pub const DEFAULT_MONGO_DATABASE: &str = "PROJECTUT";
pub const DEFAULT_MONGO_COLLECTION: &str = "data_tests";
pub const DEFAULT_MONGO_AUTH_SOURCE: &str = "admin";
pub const DEFAULT_MONGO_AUTH_MECHANISM: &str = "SCRAM-SHA-1";

pub const DEFAULT_INPUT_PATH: &str = "output.vcf";
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";
