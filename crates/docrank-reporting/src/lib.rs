use thiserror::Error;

pub mod export;
pub mod types;

pub use export::{assemble_output, file_stem, output_path, processing_timestamp, render_json, write_output};
pub use types::{ExtractedSection, Metadata, Output, SubsectionAnalysis};

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("IO error writing {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}
