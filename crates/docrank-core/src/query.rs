/// How persona and task are joined into the relevance query.
///
/// The separator words end up in the TF-IDF vocabulary, so the style is
/// part of the scoring contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryStyle {
    /// `"{persona}. {task}"`
    #[default]
    Sentence,
    /// `"{persona} needs to: {task}"`
    NeedsTo,
}

/// Build the query string for a persona and job-to-be-done.
pub fn build_query(persona: &str, task: &str, style: QueryStyle) -> String {
    match style {
        QueryStyle::Sentence => format!("{persona}. {task}"),
        QueryStyle::NeedsTo => format!("{persona} needs to: {task}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentence_style() {
        assert_eq!(
            build_query(
                "Travel Planner",
                "Plan a 4-day trip for 10 college friends",
                QueryStyle::Sentence
            ),
            "Travel Planner. Plan a 4-day trip for 10 college friends"
        );
    }

    #[test]
    fn needs_to_style() {
        assert_eq!(
            build_query("HR professional", "Create fillable forms", QueryStyle::NeedsTo),
            "HR professional needs to: Create fillable forms"
        );
    }
}
