//! Entities making up the self-model.
//!
//! Bounded fields are public for reads and serde; the mutators on
//! [`super::IdentityCore`] are the only writers that enforce the bounds.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Number of noting categories kept in [`NotingPatterns::most_common`].
pub const NOTING_HISTORY_LEN: usize = 10;

// ============================================================================
// Values, wounds, capabilities, relationships
// ============================================================================

/// A core principle with a dynamic importance weight in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Value {
    pub principle: String,
    pub weight: f64,
}

impl Value {
    pub fn new(principle: impl Into<String>, weight: f64) -> Self {
        Self {
            principle: principle.into(),
            weight,
        }
    }
}

/// A past failure that raises caution in one domain until healed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wound {
    pub domain: String,
    pub incident: String,
    pub caution_level: f64,
    pub created: DateTime<Utc>,
    #[serde(default)]
    pub healed: bool,
}

/// Self-assessed ability. Keyed by name in [`super::Identity::capabilities`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Capability {
    pub confidence: f64,
    pub last_tested: DateTime<Utc>,
}

/// Understanding of a key entity. Keyed by entity in
/// [`super::Identity::relationships`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    pub trust: f64,
    pub pattern: String,
    pub last_interaction: DateTime<Utc>,
}

// ============================================================================
// Mood
// ============================================================================

/// Emotional state vector; every axis in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mood {
    pub energy: f64,
    pub optimism: f64,
    pub focus: f64,
    #[serde(default)]
    pub updated: Option<DateTime<Utc>>,
}

impl Mood {
    pub fn new(energy: f64, optimism: f64, focus: f64) -> Self {
        Self {
            energy,
            optimism,
            focus,
            updated: None,
        }
    }
}

impl Default for Mood {
    fn default() -> Self {
        Self::new(0.5, 0.5, 0.5)
    }
}

// ============================================================================
// Closed categories
// ============================================================================

/// Emotional or cognitive quality of a thought, as observed by noting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotingCategory {
    Planning,
    Reacting,
    Anxious,
    Eager,
    Uncertain,
    Calm,
}

closed_category!(NotingCategory, "noting", {
    Planning => "planning",
    Reacting => "reacting",
    Anxious => "anxious",
    Eager => "eager",
    Uncertain => "uncertain",
    Calm => "calm",
});

/// Load indicator for the deferred-thought queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueHealth {
    Healthy,
    Balanced,
    Backlogged,
    Stagnant,
}

closed_category!(QueueHealth, "queue health", {
    Healthy => "healthy",
    Balanced => "balanced",
    Backlogged => "backlogged",
    Stagnant => "stagnant",
});

impl QueueHealth {
    /// Classify a queue by its length: 0 healthy, 1-4 balanced,
    /// 5-14 backlogged, 15+ stagnant.
    pub fn from_len(len: usize) -> Self {
        match len {
            0 => Self::Healthy,
            1..=4 => Self::Balanced,
            5..=14 => Self::Backlogged,
            _ => Self::Stagnant,
        }
    }
}

/// How often the agent would like to be woken up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AwakeningFrequency {
    More,
    Same,
    Less,
}

closed_category!(AwakeningFrequency, "awakening preference", {
    More => "more",
    Same => "same",
    Less => "less",
});

// ============================================================================
// Contemplative state
// ============================================================================

/// Rolling record of recent noting results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotingPatterns {
    /// The last [`NOTING_HISTORY_LEN`] categories, oldest first.
    #[serde(default)]
    pub most_common: Vec<NotingCategory>,
}

impl NotingPatterns {
    /// Push a category, dropping the oldest entries past the cap.
    pub fn record(&mut self, category: NotingCategory) {
        self.most_common.push(category);
        if self.most_common.len() > NOTING_HISTORY_LEN {
            let excess = self.most_common.len() - NOTING_HISTORY_LEN;
            self.most_common.drain(..excess);
        }
    }

    /// The category seen most often in the window, latest wins ties.
    pub fn dominant(&self) -> Option<NotingCategory> {
        let mut best: Option<(NotingCategory, usize)> = None;
        for category in self.most_common.iter().rev() {
            let count = self.most_common.iter().filter(|c| *c == category).count();
            if best.map_or(true, |(_, n)| count > n) {
                best = Some((*category, count));
            }
        }
        best.map(|(c, _)| c)
    }
}

/// Parameters and bookkeeping of the contemplation gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContemplativeState {
    pub baseline_stillness: f64,
    pub current_stillness: f64,
    /// Readiness threshold per domain; unknown domains use
    /// [`ContemplativeState::DEFAULT_THRESHOLD`].
    pub domain_thresholds: BTreeMap<String, f64>,
    #[serde(default)]
    pub noting_patterns: NotingPatterns,
    /// Exponential moving average of act (1.0) versus defer (0.0).
    pub action_contemplation_ratio: f64,
    pub queue_health: QueueHealth,
}

impl ContemplativeState {
    pub const DEFAULT_THRESHOLD: f64 = 0.5;

    pub fn threshold_for(&self, domain: &str) -> f64 {
        self.domain_thresholds
            .get(domain)
            .copied()
            .unwrap_or(Self::DEFAULT_THRESHOLD)
    }
}

impl Default for ContemplativeState {
    fn default() -> Self {
        Self {
            baseline_stillness: 0.6,
            current_stillness: 0.6,
            domain_thresholds: BTreeMap::new(),
            noting_patterns: NotingPatterns::default(),
            action_contemplation_ratio: 0.35,
            queue_health: QueueHealth::Balanced,
        }
    }
}

/// The agent's stated preference for awakening frequency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AwakeningPreference {
    pub current: AwakeningFrequency,
    #[serde(default)]
    pub reason: String,
}

impl Default for AwakeningPreference {
    fn default() -> Self {
        Self {
            current: AwakeningFrequency::Same,
            reason: String::new(),
        }
    }
}
