use thiserror::Error;

pub mod config;
pub mod headings;
pub mod pages;
pub mod text_processing;

pub use config::{HeadingConfig, HeadingConfigBuilder, HeadingStrategy};
pub use headings::{Section, is_heading_line, section_body, segment_sections};
pub use pages::split_pages;
// Re-export domain types from core (canonical definitions live there)
pub use docrank_core::{PageLayout, TextLine};

#[derive(Error, Debug)]
pub enum ParsingError {
    #[error("invalid heading configuration: {0}")]
    InvalidConfig(String),
}
