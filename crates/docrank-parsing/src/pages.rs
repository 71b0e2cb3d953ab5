use docrank_core::{PAGE_BREAK, Page};

use crate::text_processing::expand_ligatures;

/// Split page-break-delimited text into pages, dropping blank ones.
///
/// Surviving pages are numbered densely from 1, so a blank page 2 makes the
/// following page number 2.
pub fn split_pages(text: &str) -> Vec<Page> {
    text.split(PAGE_BREAK)
        .map(str::trim)
        .filter(|page| !page.is_empty())
        .enumerate()
        .map(|(i, page)| Page {
            page_number: i + 1,
            text: expand_ligatures(page),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_form_feed() {
        let pages = split_pages("Intro\n\u{c}Second page\n\u{c}");
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].page_number, 1);
        assert_eq!(pages[0].text, "Intro");
        assert_eq!(pages[1].page_number, 2);
        assert_eq!(pages[1].text, "Second page");
    }

    #[test]
    fn blank_pages_are_dropped_and_numbering_closes_the_gap() {
        let pages = split_pages("one\u{c}   \n \u{c}three");
        let numbers: Vec<usize> = pages.iter().map(|p| p.page_number).collect();
        assert_eq!(numbers, vec![1, 2]);
        assert_eq!(pages[1].text, "three");
    }

    #[test]
    fn empty_text_has_no_pages() {
        assert!(split_pages("").is_empty());
        assert!(split_pages("\u{c}\u{c}").is_empty());
    }

    #[test]
    fn ligatures_are_expanded() {
        assert_eq!(split_pages("ﬁne dining")[0].text, "fine dining");
    }
}
