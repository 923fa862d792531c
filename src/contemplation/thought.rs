//! Deferred thoughts and their on-disk queue document.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::readiness::{BlockingFactor, Readiness};
use crate::identity::NotingCategory;

/// A candidate action that was not yet ripe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thought {
    pub id: String,
    pub thought: String,
    pub first_arising: DateTime<Utc>,
    #[serde(default)]
    pub times_revisited: u32,
    pub ripeness_score: f64,
    #[serde(default)]
    pub blocking_factors: Vec<BlockingFactor>,
    /// Per-revisit decay; the thought is evicted once
    /// `times_revisited * decay_rate` exceeds the eviction threshold.
    pub decay_rate: f64,
    pub domain: String,
    pub noting: NotingCategory,
}

impl Thought {
    pub(crate) fn from_assessment(
        id: String,
        text: &str,
        domain: &str,
        arrived: DateTime<Utc>,
        decay_rate: f64,
        readiness: &Readiness,
    ) -> Self {
        Self {
            id,
            thought: text.to_string(),
            first_arising: arrived,
            times_revisited: 0,
            ripeness_score: readiness.score,
            blocking_factors: readiness.blocking_factors.clone(),
            decay_rate: sanitize_decay_rate(decay_rate),
            domain: domain.to_string(),
            noting: readiness.noting,
        }
    }

    /// Accumulated decay after the revisits so far.
    pub fn decay(&self) -> f64 {
        f64::from(self.times_revisited) * self.decay_rate
    }

    /// First `max_chars` characters of the text.
    pub fn preview(&self, max_chars: usize) -> String {
        self.thought.chars().take(max_chars).collect()
    }
}

/// Slowest decay a thought may have: evicted after about 500 revisits at
/// the default threshold.
pub const MIN_DECAY_RATE: f64 = 0.001;

/// Keep a decay rate inside `[MIN_DECAY_RATE, 1]`; NaN takes the minimum.
pub(crate) fn sanitize_decay_rate(rate: f64) -> f64 {
    if rate.is_nan() {
        return MIN_DECAY_RATE;
    }
    rate.clamp(MIN_DECAY_RATE, 1.0)
}

/// The persisted queue: `{queue: [...], updated: ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueDocument {
    pub queue: Vec<Thought>,
    pub updated: DateTime<Utc>,
}
