//! Noting: label the quality of a thought before deciding on it.

pub use crate::identity::NotingCategory;

/// Keyword sets in priority order. The first set with a match wins, so the
/// order of this table is part of the behavior: "I should worry" notes as
/// reacting, not anxious.
const NOTING_RULES: &[(NotingCategory, &[&str])] = &[
    (NotingCategory::Reacting, &["should", "must", "need to", "have to"]),
    (NotingCategory::Anxious, &["worry", "concern", "risk", "danger"]),
    (NotingCategory::Eager, &["want", "excited", "opportunity"]),
    (NotingCategory::Uncertain, &["not sure", "maybe", "unclear", "uncertain"]),
    (NotingCategory::Planning, &["plan", "prepare", "consider", "think"]),
];

impl NotingCategory {
    /// Classify free text. Case-insensitive substring match against
    /// [`NOTING_RULES`]; text matching nothing is calm.
    pub fn classify(text: &str) -> Self {
        let lower = text.to_lowercase();
        NOTING_RULES
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
            .map(|(category, _)| *category)
            .unwrap_or(NotingCategory::Calm)
    }

    /// Readiness penalty and blocking factor attached to this category.
    pub fn readiness_penalty(&self) -> Option<(f64, super::BlockingFactor)> {
        use super::BlockingFactor;
        match self {
            Self::Anxious => Some((0.2, BlockingFactor::AnxiousState)),
            Self::Reacting => Some((0.15, BlockingFactor::ReactiveState)),
            Self::Uncertain => Some((0.1, BlockingFactor::Uncertainty)),
            Self::Planning | Self::Eager | Self::Calm => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_each_category() {
        let cases = [
            ("We must reply today", NotingCategory::Reacting),
            ("There is a real risk here", NotingCategory::Anxious),
            ("Excited about this opportunity", NotingCategory::Eager),
            ("Maybe archive the old logs", NotingCategory::Uncertain),
            ("Prepare the weekly digest", NotingCategory::Planning),
            ("Tidy the inbox", NotingCategory::Calm),
        ];
        for (text, expected) in cases {
            assert_eq!(NotingCategory::classify(text), expected, "{}", text);
        }
    }

    #[test]
    fn test_priority_order_first_match_wins() {
        // reacting beats anxious
        assert_eq!(
            NotingCategory::classify("I should worry about this"),
            NotingCategory::Reacting
        );
        // anxious beats eager
        assert_eq!(
            NotingCategory::classify("I want to avoid the danger"),
            NotingCategory::Anxious
        );
        // eager beats uncertain
        assert_eq!(
            NotingCategory::classify("maybe an opportunity"),
            NotingCategory::Eager
        );
        // uncertain beats planning
        assert_eq!(
            NotingCategory::classify("unclear how to plan this"),
            NotingCategory::Uncertain
        );
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(NotingCategory::classify("MUST SHIP"), NotingCategory::Reacting);
    }

    #[test]
    fn test_calm_and_planning_carry_no_penalty() {
        assert!(NotingCategory::Calm.readiness_penalty().is_none());
        assert!(NotingCategory::Planning.readiness_penalty().is_none());
        assert!(NotingCategory::Eager.readiness_penalty().is_none());
    }
}
