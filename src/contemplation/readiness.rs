//! Ripeness scoring.
//!
//! [`assess`] is a pure function of its inputs and the identity snapshot:
//! identical text, domain, context and identity always yield the identical
//! [`Readiness`].

use serde::{Deserialize, Serialize};

use crate::identity::{Identity, NotingCategory};
use crate::utilities::{clamp_unit, is_truthy, ContextMap};

/// Score every thought starts from.
pub const BASE_RIPENESS: f64 = 0.5;

const INSUFFICIENT_INFORMATION_PENALTY: f64 = 0.2;
const LOW_FOCUS_PENALTY: f64 = 0.15;
const LOW_ENERGY_PENALTY: f64 = 0.1;
const WOUND_CAUTION_SCALE: f64 = 0.3;
const IRREVERSIBLE_PENALTY: f64 = 0.25;
const URGENCY_BONUS: f64 = 0.2;

const LOW_FOCUS_BELOW: f64 = 0.4;
const LOW_ENERGY_BELOW: f64 = 0.3;

const INSUFFICIENT_INFORMATION_PHRASES: &[&str] = &["missing information", "need more"];
const IRREVERSIBLE_PHRASES: &[&str] = &["irreversible", "cannot undo"];

/// Context key that marks a thought as time-pressured.
pub const URGENT_KEY: &str = "urgent";

/// Why a thought was held back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockingFactor {
    InsufficientInformation,
    LowFocus,
    LowEnergy,
    DomainWound,
    Irreversible,
    AnxiousState,
    ReactiveState,
    Uncertainty,
}

closed_category!(BlockingFactor, "blocking factor", {
    InsufficientInformation => "insufficient_information",
    LowFocus => "low_focus",
    LowEnergy => "low_energy",
    DomainWound => "domain_wound",
    Irreversible => "irreversible",
    AnxiousState => "anxious_state",
    ReactiveState => "reactive_state",
    Uncertainty => "uncertainty",
});

/// Outcome of a readiness assessment.
#[derive(Debug, Clone, PartialEq)]
pub struct Readiness {
    pub ready: bool,
    /// Ripeness in `[0, 1]`.
    pub score: f64,
    /// Threshold the score was compared against.
    pub threshold: f64,
    /// Triggered factors, in evaluation order.
    pub blocking_factors: Vec<BlockingFactor>,
    pub noting: NotingCategory,
}

/// Score `text` for action in `domain` against the current identity.
pub fn assess(identity: &Identity, text: &str, domain: &str, context: &ContextMap) -> Readiness {
    let lower = text.to_lowercase();
    let mut score = BASE_RIPENESS;
    let mut blocking = Vec::new();

    if INSUFFICIENT_INFORMATION_PHRASES.iter().any(|p| lower.contains(p)) {
        score -= INSUFFICIENT_INFORMATION_PENALTY;
        blocking.push(BlockingFactor::InsufficientInformation);
    }

    let mood = &identity.current_mood;
    if mood.focus < LOW_FOCUS_BELOW {
        score -= LOW_FOCUS_PENALTY;
        blocking.push(BlockingFactor::LowFocus);
    }
    if mood.energy < LOW_ENERGY_BELOW {
        score -= LOW_ENERGY_PENALTY;
        blocking.push(BlockingFactor::LowEnergy);
    }

    if let Some(max_caution) = identity.max_caution(domain) {
        score -= max_caution * WOUND_CAUTION_SCALE;
        blocking.push(BlockingFactor::DomainWound);
    }

    if context.get(URGENT_KEY).map_or(false, is_truthy) {
        score += URGENCY_BONUS;
    }

    if IRREVERSIBLE_PHRASES.iter().any(|p| lower.contains(p)) {
        score -= IRREVERSIBLE_PENALTY;
        blocking.push(BlockingFactor::Irreversible);
    }

    let noting = NotingCategory::classify(text);
    if let Some((penalty, factor)) = noting.readiness_penalty() {
        score -= penalty;
        blocking.push(factor);
    }

    let score = clamp_unit(score);
    let threshold = identity.contemplative_state.threshold_for(domain);

    Readiness {
        ready: score >= threshold,
        score,
        threshold,
        blocking_factors: blocking,
        noting,
    }
}
