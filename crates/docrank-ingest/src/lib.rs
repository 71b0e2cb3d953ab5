use thiserror::Error;

pub mod collection;
pub mod extract;
pub mod pipeline;

pub use collection::{
    ChallengeInfo, Collection, CollectionDir, CollectionInput, DocumentRef, discover_collections,
    load_collection,
};
pub use extract::{collect_candidates, extract_candidates, extract_document};
pub use pipeline::{BatchSummary, CollectionOutcome, Pipeline};

// Re-export domain types for convenience
pub use docrank_core::{Candidate, Config, Mode, ProgressEvent};

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed collection config {path}: {source}")]
    ConfigParse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("collection config is missing `{0}`")]
    MissingField(&'static str),
    #[error("no candidate sections extracted")]
    NoCandidates,
    #[error("refinement failed: {0}")]
    Refine(#[from] docrank_core::RefineError),
    #[error(transparent)]
    Report(#[from] docrank_reporting::ReportError),
    #[cfg(not(feature = "pdf"))]
    #[error("PDF support not compiled in (enable the `pdf` feature of docrank-ingest)")]
    NoPdfSupport,
}

/// The PDF backend compiled into this build.
#[cfg(feature = "pdf")]
pub fn default_backend() -> Result<Box<dyn docrank_core::PdfBackend>, IngestError> {
    Ok(Box::new(docrank_pdf_mupdf::MupdfBackend::new()))
}

#[cfg(not(feature = "pdf"))]
pub fn default_backend() -> Result<Box<dyn docrank_core::PdfBackend>, IngestError> {
    Err(IngestError::NoPdfSupport)
}
