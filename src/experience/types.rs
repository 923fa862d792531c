//! Experience records and the caller-facing description of an executed
//! action.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utilities::ContextMap;

/// How an action turned out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeType {
    Success,
    Partial,
    Failure,
}

closed_category!(OutcomeType, "outcome", {
    Success => "success",
    Partial => "partial",
    Failure => "failure",
});

/// The causal factor an outcome is credited to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributionType {
    Skill,
    Luck,
    External,
    Identity,
}

closed_category!(AttributionType, "attribution", {
    Skill => "skill",
    Luck => "luck",
    External => "external",
    Identity => "identity",
});

/// One executed action, as it moves through the pipeline and as it is
/// stored in the experience log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Experience {
    pub timestamp: DateTime<Utc>,
    pub action: String,
    #[serde(default)]
    pub context: ContextMap,
    #[serde(default)]
    pub tools_used: Vec<String>,
    pub outcome: String,
    pub outcome_type: OutcomeType,
    pub attribution: AttributionType,
    /// In `[-1, 1]`.
    pub emotional_valence: f64,
    /// In `[0, 1]`; drives wound formation.
    pub severity: f64,
    pub domain: String,
    #[serde(default)]
    pub narrative: String,
}

/// What the agent loop reports after executing an action.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionOutcome {
    pub action: String,
    pub outcome: String,
    pub context: ContextMap,
    pub tools_used: Vec<String>,
    pub domain: String,
    /// What the action was meant to achieve; defaults to the action text.
    pub intended_goal: Option<String>,
}

impl ActionOutcome {
    /// An outcome in the `general` domain with no context or tools.
    pub fn new(action: impl Into<String>, outcome: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            outcome: outcome.into(),
            context: ContextMap::new(),
            tools_used: Vec::new(),
            domain: "general".to_string(),
            intended_goal: None,
        }
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }

    pub fn with_context(mut self, context: ContextMap) -> Self {
        self.context = context;
        self
    }

    pub fn with_context_entry(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.context.insert(key.into(), value);
        self
    }

    pub fn with_tools<I, S>(mut self, tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tools_used = tools.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_intended_goal(mut self, goal: impl Into<String>) -> Self {
        self.intended_goal = Some(goal.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_action_outcome_builder() {
        let a = ActionOutcome::new("send report", "ok")
            .with_domain("communication")
            .with_context_entry("operator", json!("sam"))
            .with_tools(["email", "pdf"])
            .with_intended_goal("inform the operator");
        assert_eq!(a.domain, "communication");
        assert_eq!(a.tools_used, vec!["email".to_string(), "pdf".to_string()]);
        assert!(a.context.contains_key("operator"));
        assert_eq!(a.intended_goal.as_deref(), Some("inform the operator"));
    }

    #[test]
    fn test_experience_json_shape() {
        let exp = Experience {
            timestamp: Utc.with_ymd_and_hms(2025, 7, 1, 10, 0, 0).unwrap(),
            action: "send report".into(),
            context: ContextMap::new(),
            tools_used: vec!["email".into()],
            outcome: "Error: permission denied".into(),
            outcome_type: OutcomeType::Failure,
            attribution: AttributionType::Skill,
            emotional_valence: -0.3,
            severity: 0.5,
            domain: "communication".into(),
            narrative: String::new(),
        };
        let value = serde_json::to_value(&exp).unwrap();
        assert_eq!(value["outcome_type"], "failure");
        assert_eq!(value["attribution"], "skill");
        let back: Experience = serde_json::from_value(value).unwrap();
        assert_eq!(back, exp);
    }

    #[test]
    fn test_unknown_outcome_type_is_rejected() {
        assert!("meh".parse::<OutcomeType>().is_err());
        assert_eq!("luck".parse::<AttributionType>(), Ok(AttributionType::Luck));
    }
}
