use std::path::Path;

use mupdf::{Document, Page, TextPageFlags};

use docrank_core::{BackendError, PAGE_BREAK, PageLayout, PdfBackend, TextLine};

/// MuPDF-based implementation of [`PdfBackend`].
///
/// This crate isolates the mupdf dependency (AGPL-3.0) from the rest of the
/// workspace.
#[derive(Debug, Clone, Copy, Default)]
pub struct MupdfBackend;

impl MupdfBackend {
    pub fn new() -> Self {
        Self
    }

    fn open(path: &Path) -> Result<Document, BackendError> {
        let path_str = path
            .to_str()
            .ok_or_else(|| BackendError::OpenError("invalid path encoding".into()))?;
        Document::open(path_str).map_err(|e| BackendError::OpenError(e.to_string()))
    }

    /// Lines of one page in reading order, each with its largest glyph size.
    fn page_lines(&self, page: &Page) -> Result<Vec<TextLine>, BackendError> {
        let text_page = page
            .to_text_page(TextPageFlags::empty())
            .map_err(|e| BackendError::ExtractionError(e.to_string()))?;

        let mut lines = Vec::new();
        for block in text_page.blocks() {
            for line in block.lines() {
                let mut text = String::new();
                let mut font_size = 0.0f32;
                for c in line.chars() {
                    text.push(c.char().unwrap_or('\u{FFFD}'));
                    font_size = font_size.max(c.size());
                }
                lines.push(TextLine::new(text, font_size));
            }
        }
        Ok(lines)
    }

    fn for_each_page<F>(&self, path: &Path, mut f: F) -> Result<(), BackendError>
    where
        F: FnMut(usize, Vec<TextLine>),
    {
        let document = Self::open(path)?;
        let pages = document
            .pages()
            .map_err(|e| BackendError::ExtractionError(e.to_string()))?;
        for (i, page_result) in pages.enumerate() {
            let page = page_result.map_err(|e| BackendError::ExtractionError(e.to_string()))?;
            f(i + 1, self.page_lines(&page)?);
        }
        Ok(())
    }
}

fn join_lines(lines: &[TextLine]) -> String {
    let mut text = String::new();
    for line in lines {
        text.push_str(&line.text);
        text.push('\n');
    }
    text
}

impl PdfBackend for MupdfBackend {
    fn extract_text(&self, path: &Path) -> Result<String, BackendError> {
        let mut pages_text = Vec::new();
        self.for_each_page(path, |_, lines| pages_text.push(join_lines(&lines)))?;
        Ok(pages_text.join(&PAGE_BREAK.to_string()))
    }

    fn extract_layout(&self, path: &Path) -> Result<Vec<PageLayout>, BackendError> {
        let mut layouts = Vec::new();
        self.for_each_page(path, |page_number, lines| {
            let text = join_lines(&lines);
            layouts.push(PageLayout {
                page_number,
                lines,
                text,
            });
        })?;
        Ok(layouts)
    }
}
