pub mod clinvar;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod normalize;
pub mod pipeline;
pub mod storage;
pub mod types;
pub mod vcf;

// Layered boundaries: ports in `app`, adapters in `infra`
pub mod app;
pub mod infra;
