//! Heading detection and heading-bounded section extraction.
//!
//! The layout rule is a heuristic over font sizes and title casing. It does
//! not recognise all-caps headings (`"HTML FORMS"` is not title case) and
//! accepts headings with trailing punctuation as long as the casing holds.

use docrank_core::PageLayout;

use crate::config::{HeadingConfig, HeadingStrategy};
use crate::text_processing::{expand_ligatures, is_printable, is_title_case_exact, is_titled};

/// A heading-bounded block of text on one page.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub page_number: usize,
    pub title: String,
    pub text: String,
}

/// Whether a line with the given font size is a heading under the layout rule.
///
/// All of the following must hold for the trimmed line: it starts with a
/// letter, is printable, its font size is at least `size_ratio` times
/// `page_max_font_size`, it is shorter than `max_heading_chars` characters,
/// and (if `require_title_case`) it equals its own title-cased form.
pub fn is_heading_line(
    text: &str,
    font_size: f32,
    page_max_font_size: f32,
    config: &HeadingConfig,
) -> bool {
    let line = text.trim();
    let Some(first) = line.chars().next() else {
        return false;
    };
    first.is_alphabetic()
        && is_printable(line)
        && font_size >= config.size_ratio * page_max_font_size
        && line.chars().count() < config.max_heading_chars
        && (!config.require_title_case || is_title_case_exact(line))
}

/// Body text following `heading` in `page_text`.
///
/// Starts after the first line containing the heading, skips blank lines,
/// stops at the next title-cased short line or once more than
/// `max_section_chars` characters have been collected. Lines are joined with
/// single spaces. Returns an empty string if the heading is not found.
pub fn section_body(page_text: &str, heading: &str, config: &HeadingConfig) -> String {
    let heading = heading.trim();
    let lines: Vec<&str> = page_text.lines().collect();
    let Some(start) = lines.iter().position(|l| l.trim().contains(heading)) else {
        return String::new();
    };

    let mut content: Vec<&str> = Vec::new();
    let mut collected = 0usize;
    for line in &lines[start + 1..] {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if is_titled(line) && trimmed.chars().count() < config.max_heading_chars {
            break;
        }
        content.push(trimmed);
        collected += trimmed.chars().count();
        if collected > config.max_section_chars {
            break;
        }
    }
    content.join(" ").trim().to_string()
}

/// Sections of one page under the layout rule, in reading order.
pub fn segment_page(layout: &PageLayout, config: &HeadingConfig) -> Vec<Section> {
    let page_max = layout.max_font_size();
    layout
        .lines
        .iter()
        .filter(|line| is_heading_line(&line.text, line.font_size, page_max, config))
        .map(|line| {
            let title = line.text.trim().to_string();
            let text = expand_ligatures(&section_body(&layout.text, &title, config));
            Section {
                page_number: layout.page_number,
                title,
                text,
            }
        })
        .collect()
}

/// Sections across a whole document using the average-size rule.
///
/// A line is a heading when its font size is at least
/// `average_size_threshold` times the mean size of all lines. Its body is the
/// text of every following line up to the next heading; headings with an
/// empty body are dropped.
pub fn segment_by_average_size(layouts: &[PageLayout], config: &HeadingConfig) -> Vec<Section> {
    let lines: Vec<(usize, &str, f32)> = layouts
        .iter()
        .flat_map(|p| {
            p.lines
                .iter()
                .map(move |l| (p.page_number, l.text.as_str(), l.font_size))
        })
        .collect();
    if lines.is_empty() {
        return Vec::new();
    }

    let average = lines.iter().map(|&(_, _, size)| size).sum::<f32>() / lines.len() as f32;
    let threshold = average * config.average_size_threshold;
    let heading_idx: Vec<usize> = lines
        .iter()
        .enumerate()
        .filter(|(_, (_, _, size))| *size >= threshold)
        .map(|(i, _)| i)
        .collect();

    let mut sections = Vec::new();
    for (n, &start) in heading_idx.iter().enumerate() {
        let end = heading_idx.get(n + 1).copied().unwrap_or(lines.len());
        let body = lines[start + 1..end]
            .iter()
            .map(|&(_, text, _)| text)
            .collect::<Vec<_>>()
            .join(" ");
        let body = body.trim();
        if body.is_empty() {
            continue;
        }
        let (page_number, title, _) = lines[start];
        sections.push(Section {
            page_number,
            title: title.trim().to_string(),
            text: expand_ligatures(body),
        });
    }
    sections
}

/// Segment a document's pages with the configured strategy.
pub fn segment_sections(layouts: &[PageLayout], config: &HeadingConfig) -> Vec<Section> {
    let sections = match config.strategy {
        HeadingStrategy::Layout => layouts
            .iter()
            .flat_map(|page| segment_page(page, config))
            .collect::<Vec<_>>(),
        HeadingStrategy::AverageSize => segment_by_average_size(layouts, config),
    };
    tracing::debug!(
        pages = layouts.len(),
        sections = sections.len(),
        strategy = ?config.strategy,
        "segmented document"
    );
    sections
}
