use anyhow::Context;
use clap::Parser;
use clinvar_annotator::clinvar::ClinVarClient;
use clinvar_annotator::config::Config;
use clinvar_annotator::constants::{DEFAULT_CONFIG_PATH, DEFAULT_INPUT_PATH};
use clinvar_annotator::infra::http_client::ReqwestHttp;
use clinvar_annotator::pipeline::Pipeline;
use clinvar_annotator::storage::{InMemoryStorage, Storage};
use clinvar_annotator::types::AnnotationSource;
use clinvar_annotator::vcf::VcfReader;
use clinvar_annotator::{logging, metrics};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "clinvar_annotator")]
#[command(about = "Annotate VCF variants with ClinVar data and store them as mutation documents")]
#[command(version)]
struct Cli {
    /// Test/run identifier stamped on every stored document (IDTest)
    id_test: String,

    /// VCF file to annotate
    #[arg(long, default_value = DEFAULT_INPUT_PATH)]
    input: PathBuf,

    /// Optional TOML configuration file
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Annotate without writing to MongoDB
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    dotenv::dotenv().ok();
    let _log_guard = logging::init_logging();
    metrics::init_metrics();

    let config = Config::load(&cli.config).context("loading configuration")?;

    let result = run(&cli, &config).await;

    if let Some(url) = &config.metrics.pushgateway_url {
        metrics::push_to_pushgateway(url, &cli.id_test).await;
    }

    match result {
        Ok(()) => Ok(()),
        Err(e) => {
            error!("Annotation run {} failed: {:#}", cli.id_test, e);
            Err(e)
        }
    }
}

async fn run(cli: &Cli, config: &Config) -> anyhow::Result<()> {
    let reader = VcfReader::open(&cli.input)
        .with_context(|| format!("opening VCF file {}", cli.input.display()))?;

    let http = ReqwestHttp::new(config.eutils.timeout())?;
    let source: Arc<dyn AnnotationSource> = Arc::new(ClinVarClient::new(http, config.eutils.clone()));
    let storage = open_storage(cli, config).await?;

    let pipeline = Pipeline::new(source, storage, config.pipeline.clone());
    let result = pipeline.run(reader, &cli.id_test).await?;

    info!(
        "Run {} complete: {} lines ({} blank), {} records, {} unresolved, {} malformed skipped, {} documents stored",
        result.id_test,
        result.lines_read,
        result.blank_lines,
        result.records,
        result.unresolved,
        result.malformed_lines,
        result.inserted_ids.len()
    );
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

async fn open_storage(cli: &Cli, config: &Config) -> anyhow::Result<Arc<dyn Storage>> {
    if cli.dry_run {
        warn!("Dry run: documents are kept in memory and discarded");
        return Ok(Arc::new(InMemoryStorage::new()));
    }
    connect_mongo(config).await
}

#[cfg(feature = "db")]
async fn connect_mongo(config: &Config) -> anyhow::Result<Arc<dyn Storage>> {
    let storage = clinvar_annotator::storage::MongoStorage::connect(&config.mongo).await?;
    Ok(Arc::new(storage))
}

#[cfg(not(feature = "db"))]
async fn connect_mongo(_config: &Config) -> anyhow::Result<Arc<dyn Storage>> {
    anyhow::bail!("built without the `db` feature; rerun with --dry-run or rebuild with MongoDB support")
}
