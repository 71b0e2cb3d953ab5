/// Title used when a text has no line short enough to serve as one.
pub const UNTITLED_SECTION: &str = "Untitled Section";
/// Default snippet length in characters.
pub const DEFAULT_SNIPPET_LIMIT: usize = 280;
/// Longest line (in characters) accepted as a title.
pub const MAX_TITLE_CHARS: usize = 80;

const ELLIPSIS: char = '…';

fn is_line_break(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r' | '\u{b}' | '\u{c}' | '\u{1c}' | '\u{1d}' | '\u{1e}' | '\u{85}' | '\u{2028}' | '\u{2029}'
    )
}

/// First non-blank line of at most [`MAX_TITLE_CHARS`] characters, trimmed.
pub fn section_title(text: &str) -> String {
    text.split(is_line_break)
        .map(str::trim)
        .find(|line| {
            let len = line.chars().count();
            len > 0 && len <= MAX_TITLE_CHARS
        })
        .map(str::to_string)
        .unwrap_or_else(|| UNTITLED_SECTION.to_string())
}

/// Shorten `text` to at most `limit` characters, preferring a sentence end.
///
/// Texts within the limit are returned unchanged. Otherwise the prefix is cut
/// just after the last `". "` inside it, or, if there is none, the raw prefix
/// gets a trailing `…`.
pub fn snippet(text: &str, limit: usize) -> String {
    let cut_at = match text.char_indices().nth(limit) {
        Some((byte, _)) => byte,
        None => return text.to_string(),
    };
    let cut = &text[..cut_at];
    match cut.rfind(". ") {
        Some(idx) => cut[..idx + 1].to_string(),
        None => {
            let mut out = String::with_capacity(cut.len() + ELLIPSIS.len_utf8());
            out.push_str(cut);
            out.push(ELLIPSIS);
            out
        }
    }
}
