use std::path::Path;

use docrank_core::{BackendError, Candidate, Document, Mode, PdfBackend, ProgressEvent};
use docrank_parsing::{HeadingConfig, segment_sections, split_pages};

use crate::collection::Collection;

/// The non-blank pages of one PDF.
pub fn extract_document(
    backend: &dyn PdfBackend,
    path: &Path,
    filename: &str,
) -> Result<Document, BackendError> {
    let text = backend.extract_text(path)?;
    Ok(Document {
        filename: filename.to_string(),
        pages: split_pages(&text),
    })
}

/// Candidates of one PDF: its non-blank pages in page mode, its
/// heading-bounded sections in section mode.
pub fn extract_candidates(
    backend: &dyn PdfBackend,
    mode: Mode,
    headings: &HeadingConfig,
    path: &Path,
    document: &str,
) -> Result<Vec<Candidate>, BackendError> {
    match mode {
        Mode::Pages => Ok(extract_document(backend, path, document)?.into_candidates()),
        Mode::Sections => {
            let layouts = backend.extract_layout(path)?;
            Ok(segment_sections(&layouts, headings)
                .into_iter()
                .map(|section| Candidate {
                    document: document.to_string(),
                    page_number: section.page_number,
                    section_title: Some(section.title),
                    text: section.text,
                })
                .collect())
        }
    }
}

/// Candidates of every document in the collection, in document order.
///
/// A document that fails to open or extract contributes nothing; the failure
/// is logged and reported, and the remaining documents are still processed.
pub fn collect_candidates(
    collection: &Collection,
    backend: &dyn PdfBackend,
    mode: Mode,
    headings: &HeadingConfig,
    progress: &(dyn Fn(ProgressEvent) + Send + Sync),
) -> Vec<Candidate> {
    let mut candidates = Vec::new();
    for (path, document) in collection.pdfs.iter().zip(&collection.input_documents) {
        match extract_candidates(backend, mode, headings, path, document) {
            Ok(found) => {
                tracing::debug!(document = %document, candidates = found.len(), "extracted");
                progress(ProgressEvent::DocumentExtracted {
                    document: document.clone(),
                    candidates: found.len(),
                });
                candidates.extend(found);
            }
            Err(e) => {
                tracing::warn!(document = %document, error = %e, "failed to process PDF");
                progress(ProgressEvent::DocumentFailed {
                    document: document.clone(),
                    error: e.to_string(),
                });
            }
        }
    }
    candidates
}
