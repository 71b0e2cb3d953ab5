use std::path::PathBuf;

pub mod backend;
pub mod config_file;
pub mod query;
pub mod refine;
pub mod scoring;
pub mod snippet;
pub mod stopwords;

// Re-export for convenience
pub use backend::{BackendError, PAGE_BREAK, PageLayout, PdfBackend, TextLine};
pub use query::{QueryStyle, build_query};
pub use refine::{RefineError, Refiner, SnippetRefiner};
pub use scoring::{RankOptions, TfidfModel, rank, similarity_scores};
pub use snippet::{DEFAULT_SNIPPET_LIMIT, UNTITLED_SECTION, section_title, snippet};

/// Granularity of the ranked units and the matching extraction/refinement strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Whole PDF pages, deterministic snippets.
    #[default]
    Pages,
    /// Heading-bounded sections, refined by a [`Refiner`].
    Sections,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Pages => "pages",
            Mode::Sections => "sections",
        }
    }

    /// Query template used when vectorizing in this mode.
    pub fn query_style(&self) -> QueryStyle {
        match self {
            Mode::Pages => QueryStyle::Sentence,
            Mode::Sections => QueryStyle::NeedsTo,
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Mode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pages" | "page" => Ok(Mode::Pages),
            "sections" | "section" => Ok(Mode::Sections),
            other => Err(format!("unknown mode: {other}")),
        }
    }
}

/// A single extracted page. `page_number` is 1-based and counts only the
/// non-blank pages of the source PDF.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub page_number: usize,
    pub text: String,
}

/// A PDF document reduced to its non-empty pages.
#[derive(Debug, Clone)]
pub struct Document {
    pub filename: String,
    pub pages: Vec<Page>,
}

impl Document {
    /// One candidate per page, in page order.
    pub fn into_candidates(self) -> Vec<Candidate> {
        let filename = self.filename;
        self.pages
            .into_iter()
            .map(|page| Candidate::from_page(&filename, page))
            .collect()
    }
}

/// A unit of text competing for a place in the ranking: a whole page or a
/// heading-bounded section.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub document: String,
    pub page_number: usize,
    /// Detected heading for sections. Pages derive their title from the text.
    pub section_title: Option<String>,
    pub text: String,
}

impl Candidate {
    pub fn from_page(document: &str, page: Page) -> Self {
        Self {
            document: document.to_string(),
            page_number: page.page_number,
            section_title: None,
            text: page.text,
        }
    }

    /// The heading if one was detected, otherwise the first short line of the text.
    pub fn title(&self) -> String {
        match &self.section_title {
            Some(title) => title.clone(),
            None => section_title(&self.text),
        }
    }
}

/// A candidate that made it into the top-K, with its 1-based rank.
#[derive(Debug, Clone)]
pub struct RankedCandidate {
    pub candidate: Candidate,
    pub score: f64,
    pub rank: usize,
}

/// A candidate together with the refined text that summarizes it.
#[derive(Debug, Clone)]
pub struct RefinedSection {
    pub ranked: RankedCandidate,
    pub refined_text: String,
}

/// Settings for the external rewrite service.
#[derive(Debug, Clone)]
pub struct RefinerSettings {
    /// Use the LLM refiner in section mode. When false the deterministic
    /// snippet refiner is used.
    pub enabled: bool,
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

impl Default for RefinerSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: refine::ollama::DEFAULT_OLLAMA_URL.to_string(),
            model: refine::ollama::DEFAULT_OLLAMA_MODEL.to_string(),
            timeout_secs: 120,
            max_retries: 2,
        }
    }
}

/// Default name of the per-collection input file.
pub const DEFAULT_CONFIG_FILE_NAME: &str = "challenge1b_input.json";
/// Default name of the per-collection output file when no output directory is set.
pub const DEFAULT_OUTPUT_FILE_NAME: &str = "challenge1b_output.json";
/// Maximum number of ranked results per collection.
pub const DEFAULT_TOP_K: usize = 5;
/// Terms present in more than this fraction of the corpus are dropped in page mode.
pub const DEFAULT_PAGE_MAX_DF: f64 = 0.9;

/// Runtime configuration for a batch run.
#[derive(Debug, Clone)]
pub struct Config {
    pub mode: Mode,
    pub top_k: usize,
    /// Document-frequency cutoff as a fraction of the corpus. `None` keeps every term.
    pub max_df: Option<f64>,
    pub snippet_limit: usize,
    pub query_style: QueryStyle,
    pub include_timestamp: bool,
    /// Spaces per indentation level in the written JSON.
    pub json_indent: usize,
    pub config_file_name: String,
    pub output_file_name: String,
    /// When set, outputs are written as `<output_dir>/<collection id>.json`.
    pub output_dir: Option<PathBuf>,
    pub refiner: RefinerSettings,
}

impl Config {
    /// Mode-specific defaults.
    pub fn for_mode(mode: Mode) -> Self {
        let (max_df, include_timestamp, json_indent) = match mode {
            Mode::Pages => (Some(DEFAULT_PAGE_MAX_DF), false, 2),
            Mode::Sections => (None, true, 4),
        };
        Self {
            mode,
            top_k: DEFAULT_TOP_K,
            max_df,
            snippet_limit: DEFAULT_SNIPPET_LIMIT,
            query_style: mode.query_style(),
            include_timestamp,
            json_indent,
            config_file_name: DEFAULT_CONFIG_FILE_NAME.to_string(),
            output_file_name: DEFAULT_OUTPUT_FILE_NAME.to_string(),
            output_dir: None,
            refiner: RefinerSettings::default(),
        }
    }

    pub fn rank_options(&self) -> RankOptions {
        RankOptions {
            top_k: self.top_k,
            max_df: self.max_df,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::for_mode(Mode::Pages)
    }
}

/// Progress events emitted while a batch is processed.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    CollectionStarted {
        id: String,
        documents: usize,
    },
    DocumentExtracted {
        document: String,
        candidates: usize,
    },
    DocumentFailed {
        document: String,
        error: String,
    },
    Ranked {
        id: String,
        selected: usize,
        candidates: usize,
    },
    Refining {
        index: usize,
        total: usize,
        document: String,
        page_number: usize,
    },
    CollectionWritten {
        id: String,
        path: PathBuf,
    },
    CollectionSkipped {
        id: String,
        reason: String,
    },
    CollectionFailed {
        id: String,
        error: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_defaults_differ() {
        let pages = Config::for_mode(Mode::Pages);
        assert_eq!(pages.max_df, Some(0.9));
        assert!(!pages.include_timestamp);
        assert_eq!(pages.json_indent, 2);
        assert_eq!(pages.query_style, QueryStyle::Sentence);

        let sections = Config::for_mode(Mode::Sections);
        assert_eq!(sections.max_df, None);
        assert!(sections.include_timestamp);
        assert_eq!(sections.json_indent, 4);
        assert_eq!(sections.query_style, QueryStyle::NeedsTo);
    }

    #[test]
    fn mode_from_str() {
        assert_eq!("Pages".parse::<Mode>().unwrap(), Mode::Pages);
        assert_eq!(" section ".parse::<Mode>().unwrap(), Mode::Sections);
        assert!("chapters".parse::<Mode>().is_err());
    }

    #[test]
    fn document_pages_become_candidates() {
        let document = Document {
            filename: "guide.pdf".into(),
            pages: vec![
                Page {
                    page_number: 1,
                    text: "Intro".into(),
                },
                Page {
                    page_number: 3,
                    text: "Beaches".into(),
                },
            ],
        };
        let candidates = document.into_candidates();
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[1].document, "guide.pdf");
        assert_eq!(candidates[1].page_number, 3);
        assert_eq!(candidates[1].section_title, None);
    }

    #[test]
    fn candidate_title_prefers_heading() {
        let mut candidate = Candidate {
            document: "a.pdf".into(),
            page_number: 1,
            section_title: Some("Packing Tips".into()),
            text: "First line\nbody".into(),
        };
        assert_eq!(candidate.title(), "Packing Tips");
        candidate.section_title = None;
        assert_eq!(candidate.title(), "First line");
    }
}
