//! Question templates for each interview level.

/// Fixed phrases for levels 1 through 5.
const BASE_QUESTIONS: [&str; 5] = [
    "Why did this problem occur?",
    "Why did this happen?",
    "What caused this situation?",
    "Why did this underlying cause occur?",
    "What is the root cause of this issue?",
];

/// Generate the question text for `level` (1-indexed).
///
/// Levels 1-5 use a fixed phrase and ignore `previous_answer`. Deeper levels
/// quote the previous answer. The engine stops at level 5, so that branch is
/// only reachable if the interview depth is ever made configurable.
pub fn question_for_level(level: usize, previous_answer: Option<&str>) -> String {
    match level.checked_sub(1).and_then(|i| BASE_QUESTIONS.get(i)) {
        Some(question) => (*question).to_string(),
        None => format!("Why did \"{}\" occur?", previous_answer.unwrap_or_default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_templates() {
        assert_eq!(question_for_level(1, None), "Why did this problem occur?");
        assert_eq!(question_for_level(2, Some("ignored")), "Why did this happen?");
        assert_eq!(question_for_level(3, None), "What caused this situation?");
        assert_eq!(
            question_for_level(4, None),
            "Why did this underlying cause occur?"
        );
        assert_eq!(
            question_for_level(5, None),
            "What is the root cause of this issue?"
        );
    }

    #[test]
    fn test_templates_are_distinct() {
        let questions: std::collections::HashSet<_> =
            (1..=5).map(|level| question_for_level(level, None)).collect();
        assert_eq!(questions.len(), 5);
    }

    #[test]
    fn test_deeper_levels_quote_previous_answer() {
        assert_eq!(
            question_for_level(6, Some("Feature never implemented")),
            "Why did \"Feature never implemented\" occur?"
        );
    }
}
