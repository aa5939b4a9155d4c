use crate::clinvar::{AnnotationCache, Lookup};
use crate::config::{MalformedLinePolicy, PipelineSettings};
use crate::error::{AnnotatorError, Result};
use crate::metrics::AnnotatorMetrics;
use crate::normalize::{DocumentBuilder, MutationDocument};
use crate::storage::Storage;
use crate::types::AnnotationSource;
use crate::vcf::{ReaderStats, VariantRecord, VcfReader};
use serde::Serialize;
use std::io::BufRead;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinSet;
use tracing::{debug, error, info, info_span, instrument, warn, Instrument};

/// Result of a complete pipeline run
#[derive(Debug, Default, Serialize)]
pub struct PipelineResult {
    pub id_test: String,
    pub lines_read: usize,
    pub comment_lines: usize,
    pub blank_lines: usize,
    pub missing_id_lines: usize,
    pub malformed_lines: usize,
    pub records: usize,
    pub unresolved: usize,
    pub cache_hits: usize,
    pub inserted_ids: Vec<String>,
}

impl PipelineResult {
    fn with_reader_stats(mut self, stats: ReaderStats) -> Self {
        self.lines_read = stats.lines_read;
        self.comment_lines = stats.comment_lines;
        self.blank_lines = stats.blank_lines;
        self.missing_id_lines = stats.missing_id_lines;
        self
    }
}

/// Outcome of one record's resolve → fetch → normalize pass.
struct RecordOutcome {
    line: usize,
    document: Option<MutationDocument>,
    cache_hit: bool,
}

/// Resolve an identifier and fetch its details, consulting the cache first.
///
/// Detail retrieval is only attempted for identifiers that resolve. Returns the lookup and
/// whether it was served from the cache.
pub async fn lookup(
    source: &dyn AnnotationSource,
    cache: Option<&AnnotationCache>,
    identifier: &str,
) -> Result<(Lookup, bool)> {
    if let Some(cache) = cache {
        if let Some(hit) = cache.get(identifier).await {
            AnnotatorMetrics::record_cache_hit();
            return Ok((hit, true));
        }
    }

    let lookup = match source.resolve_identifier(identifier).await? {
        Some(record_id) => Lookup::Resolved(Arc::new(source.fetch_details(&record_id).await?)),
        None => Lookup::Unresolved,
    };
    if let Some(cache) = cache {
        cache.insert(identifier, lookup.clone()).await;
    }
    Ok((lookup, false))
}

async fn annotate_record(
    source: Arc<dyn AnnotationSource>,
    cache: Option<Arc<AnnotationCache>>,
    builder: Arc<DocumentBuilder>,
    record: VariantRecord,
) -> Result<RecordOutcome> {
    let (lookup, cache_hit) = lookup(source.as_ref(), cache.as_deref(), &record.identifier).await?;
    let document = match lookup {
        Lookup::Resolved(details) => Some(builder.build(&record, &details)),
        Lookup::Unresolved => {
            info!("No {} record for identifier, skipping", source.source_name());
            AnnotatorMetrics::record_unresolved();
            None
        }
    };
    Ok(RecordOutcome {
        line: record.line,
        document,
        cache_hit,
    })
}

pub struct Pipeline {
    source: Arc<dyn AnnotationSource>,
    storage: Arc<dyn Storage>,
    settings: PipelineSettings,
}

impl Pipeline {
    pub fn new(source: Arc<dyn AnnotationSource>, storage: Arc<dyn Storage>, settings: PipelineSettings) -> Self {
        Self {
            source,
            storage,
            settings,
        }
    }

    /// Read, annotate and store every record of `reader` for run `id_test`.
    ///
    /// Documents are inserted in file order with a single bulk insert after all records
    /// are annotated. Any service or storage fault aborts the run before or during that
    /// insert; nothing is written for an aborted run.
    #[instrument(skip(self, reader), fields(source = self.source.source_name()))]
    pub async fn run<R: BufRead>(&self, mut reader: VcfReader<R>, id_test: &str) -> Result<PipelineResult> {
        let started = Instant::now();
        info!(
            concurrency = self.settings.concurrency,
            cache = self.settings.cache_lookups,
            rate_source = ?self.settings.rate_source,
            "Starting annotation run"
        );

        let cache = self.settings.cache_lookups.then(|| Arc::new(AnnotationCache::new()));
        let builder = Arc::new(DocumentBuilder::new(id_test, self.settings.rate_source));
        let limit = self.settings.concurrency.max(1);
        let mut tasks: JoinSet<Result<RecordOutcome>> = JoinSet::new();
        let mut outcomes: Vec<RecordOutcome> = Vec::new();
        let mut result = PipelineResult {
            id_test: id_test.to_string(),
            ..PipelineResult::default()
        };

        loop {
            // Collect a finished record before reading on, so a fault stops the run before
            // any further request is made.
            while tasks.len() >= limit {
                let Some(joined) = tasks.join_next().await else { break };
                match joined.map_err(AnnotatorError::from).and_then(|r| r) {
                    Ok(outcome) => outcomes.push(outcome),
                    Err(e) => return Err(Self::abort(&mut tasks, e, outcomes.len()).await),
                }
            }

            let Some(item) = reader.next() else { break };
            let record = match item {
                Ok(record) => record,
                Err(AnnotatorError::MalformedLine { line, reason })
                    if self.settings.on_malformed_line == MalformedLinePolicy::Skip =>
                {
                    warn!(line, "Skipping malformed line: {}", reason);
                    AnnotatorMetrics::record_malformed_line();
                    result.malformed_lines += 1;
                    continue;
                }
                Err(e) => {
                    if matches!(e, AnnotatorError::MalformedLine { .. }) {
                        AnnotatorMetrics::record_malformed_line();
                    }
                    return Err(Self::abort(&mut tasks, e, outcomes.len()).await);
                }
            };
            result.records += 1;
            AnnotatorMetrics::record_record_read();

            let span = info_span!("record", line = record.line, identifier = %record.identifier);
            tasks.spawn(
                annotate_record(self.source.clone(), cache.clone(), builder.clone(), record).instrument(span),
            );
        }

        while let Some(joined) = tasks.join_next().await {
            match joined.map_err(AnnotatorError::from).and_then(|r| r) {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => return Err(Self::abort(&mut tasks, e, outcomes.len()).await),
            }
        }

        let mut result = result.with_reader_stats(reader.stats());
        outcomes.sort_by_key(|o| o.line);
        result.cache_hits = outcomes.iter().filter(|o| o.cache_hit).count();
        let documents: Vec<MutationDocument> = outcomes.into_iter().filter_map(|o| o.document).collect();
        result.unresolved = result.records - documents.len();

        info!(
            "Annotated {} records ({} unresolved, {} malformed skipped, {} cache hits)",
            result.records, result.unresolved, result.malformed_lines, result.cache_hits
        );

        if documents.is_empty() {
            info!("No documents to insert");
        } else {
            result.inserted_ids = self.storage.insert_many(&documents).await.map_err(|e| {
                error!("Bulk insert of {} documents failed: {}", documents.len(), e);
                e
            })?;
            AnnotatorMetrics::record_documents_inserted(result.inserted_ids.len());
            info!("Inserted {} documents", result.inserted_ids.len());
        }

        AnnotatorMetrics::record_pipeline_duration(started.elapsed().as_secs_f64());
        debug!(elapsed_ms = started.elapsed().as_millis() as u64, "Run finished");
        Ok(result)
    }

    async fn abort(tasks: &mut JoinSet<Result<RecordOutcome>>, e: AnnotatorError, completed: usize) -> AnnotatorError {
        tasks.shutdown().await;
        error!(
            "Run aborted after {} annotated records, nothing was written: {}",
            completed, e
        );
        e
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AnnotationDetails;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingSource {
        resolves: AtomicUsize,
        fetches: AtomicUsize,
    }

    #[async_trait]
    impl AnnotationSource for CountingSource {
        fn source_name(&self) -> &'static str {
            "counting"
        }

        async fn resolve_identifier(&self, identifier: &str) -> Result<Option<String>> {
            self.resolves.fetch_add(1, Ordering::SeqCst);
            Ok((identifier != "rs404").then(|| format!("uid-{}", identifier)))
        }

        async fn fetch_details(&self, record_id: &str) -> Result<AnnotationDetails> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Ok(AnnotationDetails {
                gene: record_id.to_string(),
                ..AnnotationDetails::default()
            })
        }
    }

    #[tokio::test]
    async fn test_lookup_skips_details_when_unresolved() {
        let source = CountingSource::default();
        let (lookup, hit) = lookup(&source, None, "rs404").await.unwrap();
        assert!(matches!(lookup, Lookup::Unresolved));
        assert!(!hit);
        assert_eq!(source.resolves.load(Ordering::SeqCst), 1);
        assert_eq!(source.fetches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_lookup_uses_cache() {
        let source = CountingSource::default();
        let cache = AnnotationCache::new();
        let (first, first_hit) = lookup(&source, Some(&cache), "rs1").await.unwrap();
        let (second, second_hit) = lookup(&source, Some(&cache), "rs1").await.unwrap();
        let (_, unresolved_hit) = lookup(&source, Some(&cache), "rs404").await.unwrap();
        let (_, unresolved_again) = lookup(&source, Some(&cache), "rs404").await.unwrap();

        assert!(!first_hit && second_hit && !unresolved_hit && unresolved_again);
        match (first, second) {
            (Lookup::Resolved(a), Lookup::Resolved(b)) => assert_eq!(a, b),
            _ => panic!("expected resolved lookups"),
        }
        assert_eq!(source.resolves.load(Ordering::SeqCst), 2);
        assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
    }
}
