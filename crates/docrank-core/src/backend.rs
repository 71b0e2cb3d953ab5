use std::path::Path;

use thiserror::Error;

/// Marker separating pages in the output of [`PdfBackend::extract_text`].
pub const PAGE_BREAK: char = '\u{c}';

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("failed to open PDF: {0}")]
    OpenError(String),
    #[error("failed to extract text: {0}")]
    ExtractionError(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// One visual line of a page with the largest font size among its characters.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub text: String,
    pub font_size: f32,
}

impl TextLine {
    pub fn new(text: impl Into<String>, font_size: f32) -> Self {
        Self {
            text: text.into(),
            font_size,
        }
    }
}

/// Block metadata for one page.
#[derive(Debug, Clone, Default)]
pub struct PageLayout {
    /// 1-based physical page number.
    pub page_number: usize,
    pub lines: Vec<TextLine>,
    /// Plain text of the page, one visual line per `\n`.
    pub text: String,
}

impl PageLayout {
    /// Largest font size on the page, `0.0` for a page without text.
    pub fn max_font_size(&self) -> f32 {
        self.lines
            .iter()
            .map(|l| l.font_size)
            .fold(0.0_f32, f32::max)
    }
}

/// Trait for PDF text extraction backends.
///
/// Implementors provide the low-level extraction step; page splitting and
/// heading segmentation live in `docrank_parsing`.
pub trait PdfBackend: Send + Sync {
    /// Extract the full text of a PDF with pages separated by [`PAGE_BREAK`].
    fn extract_text(&self, path: &Path) -> Result<String, BackendError>;

    /// Extract per-page line metadata (text and font size).
    fn extract_layout(&self, path: &Path) -> Result<Vec<PageLayout>, BackendError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_font_size_of_empty_page_is_zero() {
        assert_eq!(PageLayout::default().max_font_size(), 0.0);
    }

    #[test]
    fn max_font_size_picks_largest_line() {
        let page = PageLayout {
            page_number: 1,
            lines: vec![
                TextLine::new("Body", 10.0),
                TextLine::new("Title", 18.5),
                TextLine::new("Footer", 8.0),
            ],
            text: String::new(),
        };
        assert_eq!(page.max_font_size(), 18.5);
    }
}
