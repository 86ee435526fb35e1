//! Golden-output comparison.

use difference::{Changeset, Difference};

/// Result of comparing actual output against the golden text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub matched: bool,
    /// Normalized actual output.
    pub actual: String,
    /// Normalized golden text.
    pub expected: String,
}

impl Outcome {
    /// `TRUE` or `FALSE`, the verdict printed for compared cases.
    pub fn verdict(&self) -> &'static str {
        if self.matched {
            "TRUE"
        } else {
            "FALSE"
        }
    }

    /// Line-level differences between expected and actual.
    pub fn diff(&self) -> Vec<Difference> {
        Changeset::new(&self.expected, &self.actual, "\n").diffs
    }
}

/// Drops every carriage return so CRLF and LF files compare equal.
pub fn normalize(text: &str) -> String {
    text.replace('\r', "")
}

/// Compares after line-ending normalization. Nothing else is trimmed.
pub fn compare(actual: &str, expected: &str) -> Outcome {
    let actual = normalize(actual);
    let expected = normalize(expected);
    Outcome {
        matched: actual == expected,
        actual,
        expected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_text_matches() {
        let outcome = compare("15\n", "15\n");
        assert!(outcome.matched);
        assert_eq!(outcome.verdict(), "TRUE");
    }

    #[test]
    fn carriage_returns_are_ignored_on_both_sides() {
        assert!(compare("1\n2\n", "1\r\n2\r\n").matched);
        assert!(compare("1\r\n2\r\n", "1\n2\n").matched);
        assert!(compare("a\r\rb", "ab").matched);
        let outcome = compare("x\r\n", "x\n");
        assert_eq!(outcome.actual, "x\n");
        assert_eq!(outcome.expected, "x\n");
    }

    #[test]
    fn one_character_difference_fails() {
        let outcome = compare("15\n", "16\n");
        assert!(!outcome.matched);
        assert_eq!(outcome.verdict(), "FALSE");
        assert_eq!(outcome.actual, "15\n");
        assert_eq!(outcome.expected, "16\n");
    }

    #[test]
    fn whitespace_is_significant() {
        assert!(!compare("15", "15\n").matched);
        assert!(!compare(" 15\n", "15\n").matched);
        assert!(!compare("15\n\n", "15\n").matched);
    }

    #[test]
    fn comparison_is_repeatable() {
        let first = compare("a\r\nb\n", "a\nb\n");
        let second = compare("a\r\nb\n", "a\nb\n");
        assert_eq!(first, second);
    }

    #[test]
    fn diff_marks_changed_lines() {
        let outcome = compare("1\n2\n4", "1\n2\n3");
        let diffs = outcome.diff();
        assert!(diffs.iter().any(|d| matches!(d, Difference::Rem(x) if x == "3")));
        assert!(diffs.iter().any(|d| matches!(d, Difference::Add(x) if x == "4")));
    }
}
