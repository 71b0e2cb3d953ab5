use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tokio_util::sync::CancellationToken;

use docrank_core::{
    Config, PdfBackend, ProgressEvent, RefinedSection, Refiner, build_query, rank,
};
use docrank_parsing::HeadingConfig;
use docrank_reporting::{Output, assemble_output, output_path, processing_timestamp, write_output};

use crate::IngestError;
use crate::collection::{Collection, CollectionDir, load_collection};
use crate::extract::collect_candidates;

/// Result of processing one collection.
#[derive(Debug)]
pub enum CollectionOutcome {
    Written { id: String, path: PathBuf },
    /// Ranking was computed but not persisted.
    DryRun { id: String, output: Box<Output> },
    /// No candidates; no output file was produced.
    Skipped { id: String, reason: String },
    Failed { id: String, error: String },
}

impl CollectionOutcome {
    pub fn id(&self) -> &str {
        match self {
            CollectionOutcome::Written { id, .. }
            | CollectionOutcome::DryRun { id, .. }
            | CollectionOutcome::Skipped { id, .. }
            | CollectionOutcome::Failed { id, .. } => id,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, CollectionOutcome::Failed { .. })
    }
}

/// Outcomes of a batch, in processing order.
#[derive(Debug, Default)]
pub struct BatchSummary {
    pub outcomes: Vec<CollectionOutcome>,
    /// The batch stopped early because of cancellation.
    pub cancelled: bool,
}

impl BatchSummary {
    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_failure()).count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, CollectionOutcome::Skipped { .. }))
            .count()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.len() - self.failed() - self.skipped()
    }

    /// Output files written by more than one collection, in first-collision order.
    pub fn overwritten_outputs(&self) -> Vec<&Path> {
        let mut seen = HashSet::new();
        let mut repeated = Vec::new();
        for outcome in &self.outcomes {
            if let CollectionOutcome::Written { path, .. } = outcome {
                if !seen.insert(path.as_path()) && !repeated.contains(&path.as_path()) {
                    repeated.push(path.as_path());
                }
            }
        }
        repeated
    }
}

/// Extraction, ranking, refinement and output for collections, one at a time.
pub struct Pipeline<'a> {
    backend: &'a dyn PdfBackend,
    refiner: &'a dyn Refiner,
    config: &'a Config,
    headings: &'a HeadingConfig,
    dry_run: bool,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        backend: &'a dyn PdfBackend,
        refiner: &'a dyn Refiner,
        config: &'a Config,
        headings: &'a HeadingConfig,
    ) -> Self {
        Self {
            backend,
            refiner,
            config,
            headings,
            dry_run: false,
        }
    }

    /// Compute outputs without writing them.
    pub fn dry_run(mut self, yes: bool) -> Self {
        self.dry_run = yes;
        self
    }

    /// Process one collection to completion. Never fails the caller: errors
    /// become [`CollectionOutcome::Failed`].
    pub async fn analyse_collection(
        &self,
        entry: &CollectionDir,
        progress: &(dyn Fn(ProgressEvent) + Send + Sync),
    ) -> CollectionOutcome {
        let collection = match load_collection(entry) {
            Ok(c) => c,
            Err(e) => return self.failed(entry.name(), e, progress),
        };
        let id = collection.id.clone();

        match self.process(&collection, progress).await {
            Ok(outcome) => outcome,
            Err(IngestError::NoCandidates) => {
                tracing::warn!(collection = %id, "no sections extracted, skipping");
                let reason = IngestError::NoCandidates.to_string();
                progress(ProgressEvent::CollectionSkipped {
                    id: id.clone(),
                    reason: reason.clone(),
                });
                CollectionOutcome::Skipped { id, reason }
            }
            Err(e) => self.failed(id, e, progress),
        }
    }

    fn failed(
        &self,
        id: String,
        error: IngestError,
        progress: &(dyn Fn(ProgressEvent) + Send + Sync),
    ) -> CollectionOutcome {
        tracing::warn!(collection = %id, error = %error, "collection failed");
        let error = error.to_string();
        progress(ProgressEvent::CollectionFailed {
            id: id.clone(),
            error: error.clone(),
        });
        CollectionOutcome::Failed { id, error }
    }

    async fn process(
        &self,
        collection: &Collection,
        progress: &(dyn Fn(ProgressEvent) + Send + Sync),
    ) -> Result<CollectionOutcome, IngestError> {
        let id = collection.id.clone();
        tracing::info!(collection = %id, documents = collection.pdfs.len(), mode = %self.config.mode, "processing collection");
        progress(ProgressEvent::CollectionStarted {
            id: id.clone(),
            documents: collection.pdfs.len(),
        });

        let candidates = collect_candidates(
            collection,
            self.backend,
            self.config.mode,
            self.headings,
            progress,
        );
        if candidates.is_empty() {
            return Err(IngestError::NoCandidates);
        }

        let query = build_query(collection.persona(), collection.job(), self.config.query_style);
        let total_candidates = candidates.len();
        let ranked = rank(&query, candidates, &self.config.rank_options());
        progress(ProgressEvent::Ranked {
            id: id.clone(),
            selected: ranked.len(),
            candidates: total_candidates,
        });

        let mut sections = Vec::with_capacity(ranked.len());
        let total = ranked.len();
        for (index, ranked) in ranked.into_iter().enumerate() {
            progress(ProgressEvent::Refining {
                index,
                total,
                document: ranked.candidate.document.clone(),
                page_number: ranked.candidate.page_number,
            });
            let refined_text = self
                .refiner
                .refine(&ranked.candidate.text, collection.persona(), collection.job())
                .await?;
            sections.push(RefinedSection {
                ranked,
                refined_text,
            });
        }

        let timestamp = self.config.include_timestamp.then(processing_timestamp);
        let output = assemble_output(
            collection.input_documents.clone(),
            collection.persona(),
            collection.job(),
            &sections,
            timestamp,
        );

        if self.dry_run {
            return Ok(CollectionOutcome::DryRun {
                id,
                output: Box::new(output),
            });
        }

        let path = output_path(self.config, &collection.dir, &id);
        write_output(&output, &path, self.config.json_indent)?;
        tracing::info!(collection = %id, path = %path.display(), refiner = self.refiner.name(), "wrote output");
        progress(ProgressEvent::CollectionWritten {
            id: id.clone(),
            path: path.clone(),
        });
        Ok(CollectionOutcome::Written { id, path })
    }

    /// Process collections in order. Cancellation is checked before each one.
    pub async fn run_batch(
        &self,
        collections: &[CollectionDir],
        progress: &(dyn Fn(ProgressEvent) + Send + Sync),
        cancel: &CancellationToken,
    ) -> BatchSummary {
        let mut summary = BatchSummary::default();
        let mut written = HashSet::new();
        for entry in collections {
            if cancel.is_cancelled() {
                tracing::info!(remaining = collections.len() - summary.outcomes.len(), "batch cancelled");
                summary.cancelled = true;
                break;
            }
            let outcome = self.analyse_collection(entry, progress).await;
            if let CollectionOutcome::Written { id, path } = &outcome {
                if !written.insert(path.clone()) {
                    tracing::warn!(
                        collection = %id,
                        path = %path.display(),
                        "output overwrote the file of an earlier collection with the same id"
                    );
                }
            }
            summary.outcomes.push(outcome);
        }
        summary
    }
}
