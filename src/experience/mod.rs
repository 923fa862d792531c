//! Experience pipeline: turn an executed action's outcome into bounded
//! changes to the self-model.
//!
//! Stages, in order:
//!
//! 1. **capture**: build the record from what the agent loop reports
//! 2. **evaluate**: success / partial / failure from the outcome text
//! 3. **attribute**: skill, external or identity
//! 4. **valence**: emotional weight and severity
//! 5. **integrate**: mutate and save the identity
//! 6. **narrate**: a short first-person account
//!
//! Every stage but `integrate` is a pure transform of the record.
//! [`ExperienceEngine::process`] runs them all and appends the result to the
//! experience log.

pub mod log;
pub mod types;

use std::path::Path;
use std::sync::Arc;

use crate::identity::{Identity, IdentityCore};
use crate::utilities::errors::PersistenceError;
use crate::utilities::{clamp_unit, Clock};

pub use self::log::{ExperienceLog, EXPERIENCE_LOG_FILE};
pub use types::{ActionOutcome, AttributionType, Experience, OutcomeType};

/// Checked before [`PARTIAL_KEYWORDS`]; the first list to match decides.
const FAILURE_KEYWORDS: &[&str] = &["error", "failed", "exception", "denied"];
const PARTIAL_KEYWORDS: &[&str] = &["partial", "incomplete", "some"];

const HONESTY_KEYWORDS: &[&str] = &["report", "honest"];
const LEARNING_KEYWORDS: &[&str] = &["learn", "research"];

/// Context keys that mark an action as involving the operator.
const OPERATOR_KEYS: &[&str] = &["operator", "user"];
const OPERATOR_ENTITY: &str = "operator";

const SUCCESS_VALENCE: f64 = 0.3;
const FAILURE_VALENCE: f64 = -0.3;
const WOUNDED_FAILURE_EXTRA: f64 = -0.2;
const WOUNDED_SUCCESS_BONUS: f64 = 0.3;

const WOUNDED_FAILURE_SEVERITY: f64 = 0.7;
const FIRST_FAILURE_SEVERITY: f64 = 0.5;
/// Failures more severe than this leave a wound.
const WOUND_SEVERITY_THRESHOLD: f64 = 0.6;

const MOOD_VALENCE_SCALE: f64 = 0.05;
const FOCUS_VALENCE_SCALE: f64 = 0.03;
const VALUE_REINFORCEMENT: f64 = 0.02;
const TRUST_VALENCE_SCALE: f64 = 0.03;

const INCIDENT_MAX_CHARS: usize = 100;
/// Valence magnitude beyond which the narrative adds an emotional coda.
const NARRATIVE_VALENCE_MARK: f64 = 0.4;

/// Runs the pipeline and owns the experience log.
#[derive(Debug)]
pub struct ExperienceEngine {
    log: ExperienceLog,
    clock: Arc<dyn Clock>,
}

impl ExperienceEngine {
    /// An engine logging to `experiences.jsonl` inside `experiences_dir`.
    pub fn new(experiences_dir: impl AsRef<Path>, clock: Arc<dyn Clock>) -> Self {
        Self {
            log: ExperienceLog::new(experiences_dir),
            clock,
        }
    }

    pub fn log(&self) -> &ExperienceLog {
        &self.log
    }

    /// Run all six stages, then append the experience to the log.
    ///
    /// Nothing is kept unless both the identity save and the log append
    /// succeed: on either failure the identity is put back as it was, so the
    /// same outcome can be processed again.
    pub fn process(
        &self,
        input: ActionOutcome,
        identity: &mut IdentityCore,
    ) -> Result<Experience, PersistenceError> {
        let intended_goal = input
            .intended_goal
            .clone()
            .unwrap_or_else(|| input.action.clone());

        let exp = self.capture(input);
        let exp = self.evaluate(exp, &intended_goal);
        let exp = self.attribute(exp, identity.identity());
        let exp = self.assign_valence(exp, identity.identity());

        let before = identity.identity().clone();
        self.integrate(&exp, identity)?;
        let exp = self.narrate(exp);

        if let Err(e) = self.log.append(&exp) {
            *identity.identity_mut() = before;
            if let Err(undo) = identity.save() {
                ::log::error!("Failed to roll back identity after log error: {}", undo);
            }
            return Err(e);
        }
        Ok(exp)
    }

    /// The last `count` logged experiences, oldest first.
    pub fn get_recent_experiences(&self, count: usize) -> Vec<Experience> {
        self.log.recent(count)
    }

    // ------------------------------------------------------------------------
    // Stages
    // ------------------------------------------------------------------------

    /// Stage 1. Outcome type and attribution are placeholders until
    /// evaluated.
    pub fn capture(&self, input: ActionOutcome) -> Experience {
        ::log::debug!("Captured experience: {}", input.action);
        Experience {
            timestamp: self.clock.now(),
            action: input.action,
            context: input.context,
            tools_used: input.tools_used,
            outcome: input.outcome,
            outcome_type: OutcomeType::Success,
            attribution: AttributionType::Skill,
            emotional_valence: 0.0,
            severity: 0.0,
            domain: input.domain,
            narrative: String::new(),
        }
    }

    /// Stage 2. Keyword scan of the outcome text. The intended goal is not
    /// consulted by this evaluator.
    pub fn evaluate(&self, mut exp: Experience, _intended_goal: &str) -> Experience {
        let lower = exp.outcome.to_lowercase();
        exp.outcome_type = if FAILURE_KEYWORDS.iter().any(|k| lower.contains(k)) {
            OutcomeType::Failure
        } else if PARTIAL_KEYWORDS.iter().any(|k| lower.contains(k)) {
            OutcomeType::Partial
        } else {
            OutcomeType::Success
        };
        ::log::debug!("Evaluated experience as {}", exp.outcome_type);
        exp
    }

    /// Stage 3. Failure in a wounded domain is put down to identity.
    pub fn attribute(&self, mut exp: Experience, identity: &Identity) -> Experience {
        exp.attribution = match exp.outcome_type {
            OutcomeType::Failure if identity.has_unhealed_wound(&exp.domain) => {
                AttributionType::Identity
            }
            OutcomeType::Failure | OutcomeType::Success => AttributionType::Skill,
            OutcomeType::Partial => AttributionType::External,
        };
        ::log::debug!("Attributed experience to {}", exp.attribution);
        exp
    }

    /// Stage 4. Wounds make failures hurt more and successes feel better.
    pub fn assign_valence(&self, mut exp: Experience, identity: &Identity) -> Experience {
        let wounded = identity.has_unhealed_wound(&exp.domain);

        let (valence, severity) = match (exp.outcome_type, wounded) {
            (OutcomeType::Success, false) => (SUCCESS_VALENCE, 0.0),
            (OutcomeType::Success, true) => (SUCCESS_VALENCE + WOUNDED_SUCCESS_BONUS, 0.0),
            (OutcomeType::Partial, _) => (0.0, 0.0),
            (OutcomeType::Failure, false) => (FAILURE_VALENCE, FIRST_FAILURE_SEVERITY),
            (OutcomeType::Failure, true) => (
                FAILURE_VALENCE + WOUNDED_FAILURE_EXTRA,
                WOUNDED_FAILURE_SEVERITY,
            ),
        };

        exp.emotional_valence = valence.clamp(-1.0, 1.0);
        exp.severity = clamp_unit(severity);
        ::log::debug!(
            "Assigned valence {:.2}, severity {:.2}",
            exp.emotional_valence,
            exp.severity
        );
        exp
    }

    /// Stage 5. Apply the experience to the identity, then save it.
    ///
    /// If the save fails the in-memory identity is restored before the
    /// error is returned.
    pub fn integrate(
        &self,
        exp: &Experience,
        identity: &mut IdentityCore,
    ) -> Result<(), PersistenceError> {
        let before = identity.identity().clone();
        let valence = exp.emotional_valence;
        if valence > 0.0 {
            identity.update_mood(
                valence * MOOD_VALENCE_SCALE,
                valence * MOOD_VALENCE_SCALE,
                0.0,
            );
        } else {
            // setbacks sharpen focus
            identity.update_mood(
                valence * MOOD_VALENCE_SCALE,
                0.0,
                valence.abs() * FOCUS_VALENCE_SCALE,
            );
        }

        if exp.outcome_type == OutcomeType::Success {
            let action = exp.action.to_lowercase();
            if HONESTY_KEYWORDS.iter().any(|k| action.contains(k)) {
                identity.update_value("honest_reporting", VALUE_REINFORCEMENT);
            }
            if LEARNING_KEYWORDS.iter().any(|k| action.contains(k)) {
                identity.update_value("continuous_learning", VALUE_REINFORCEMENT);
            }
        }

        match exp.outcome_type {
            OutcomeType::Failure if exp.severity > WOUND_SEVERITY_THRESHOLD => {
                let incident: String = exp.action.chars().take(INCIDENT_MAX_CHARS).collect();
                identity.add_wound(&exp.domain, &incident, exp.severity);
            }
            OutcomeType::Success if identity.identity().has_unhealed_wound(&exp.domain) => {
                identity.heal_wound(&exp.domain);
            }
            _ => {}
        }

        if OPERATOR_KEYS.iter().any(|k| exp.context.contains_key(*k)) {
            identity.update_relationship(OPERATOR_ENTITY, valence * TRUST_VALENCE_SCALE, None);
        }

        if let Err(e) = identity.save() {
            *identity.identity_mut() = before;
            return Err(e);
        }
        ::log::info!("Integrated experience into identity");
        Ok(())
    }

    /// Stage 6. Assemble the first-person account.
    pub fn narrate(&self, mut exp: Experience) -> Experience {
        let verb = match exp.outcome_type {
            OutcomeType::Success => "succeeded",
            OutcomeType::Partial => "partially completed",
            OutcomeType::Failure => "failed",
        };
        let mut parts = vec![format!("I {} in my attempt to {}.", verb, exp.action)];

        match (exp.attribution, exp.outcome_type) {
            (AttributionType::Identity, _) => parts.push(format!(
                "This reflects my ongoing caution in the {} domain.",
                exp.domain
            )),
            (AttributionType::Skill, OutcomeType::Success) => {
                parts.push("This demonstrates my developing capability.".to_string())
            }
            (AttributionType::Skill, _) => {
                parts.push("I need to develop my skills in this area.".to_string())
            }
            (AttributionType::Luck | AttributionType::External, _) => {}
        }

        if exp.emotional_valence < -NARRATIVE_VALENCE_MARK {
            parts.push("This experience creates hesitation for similar future actions.".to_string());
        } else if exp.emotional_valence > NARRATIVE_VALENCE_MARK {
            parts.push("This success builds my confidence.".to_string());
        }

        exp.narrative = parts.join(" ");
        ::log::debug!("Generated narrative: {}", exp.narrative);
        exp
    }
}
