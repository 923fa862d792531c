//! Identity store: the agent's persistent self-model.
//!
//! [`Identity`] is the serializable aggregate. [`IdentityCore`] owns one
//! instance together with its file location and clock, and is the only place
//! that writes bounded fields: every mutator clamps on write, and per-call
//! deltas to value weights, relationship trust and capability confidence are
//! capped at [`MAX_DRIFT`] so no single experience can move them far.

pub mod awakening;
pub mod types;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utilities::errors::{IdentityError, PersistenceError};
use crate::utilities::{clamp_delta, clamp_unit, Clock, FileHandler};

pub use types::{
    AwakeningFrequency, AwakeningPreference, Capability, ContemplativeState, Mood, NotingCategory,
    NotingPatterns, QueueHealth, Relationship, Value, Wound, NOTING_HISTORY_LEN,
};

/// Largest change a single call may apply to a value weight, a relationship's
/// trust or a capability's confidence.
pub const MAX_DRIFT: f64 = 0.05;

/// Pattern given to relationships created without one.
pub const DEFAULT_RELATIONSHIP_PATTERN: &str = "new_interaction";

// ============================================================================
// Aggregate
// ============================================================================

/// The full self-model, exactly as persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub name: String,
    pub origin_story: String,
    pub values: Vec<Value>,
    pub capabilities: BTreeMap<String, Capability>,
    pub wounds: Vec<Wound>,
    pub aspirations: Vec<String>,
    pub relationships: BTreeMap<String, Relationship>,
    pub mood_baseline: Mood,
    pub current_mood: Mood,
    pub contemplative_state: ContemplativeState,
    pub awakening_preference: AwakeningPreference,
    /// Reserved. Nothing in the crate mutates it.
    pub trust_level: f64,
    pub created: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl Identity {
    /// The identity an agent starts with when nothing usable is on disk.
    pub fn initial(now: DateTime<Utc>) -> Self {
        let mut current_mood = Mood::new(0.6, 0.7, 0.7);
        current_mood.updated = Some(now);

        let domain_thresholds = [
            ("financial", 0.85),
            ("communication", 0.75),
            ("research", 0.4),
            ("routine", 0.2),
        ]
        .into_iter()
        .map(|(d, t)| (d.to_string(), t))
        .collect();

        Self {
            name: "AEGIS".to_string(),
            origin_story: "Created as an experiment in identity-based autonomy.".to_string(),
            values: vec![
                Value::new("serve_operator_flourishing", 0.90),
                Value::new("honest_reporting", 0.95),
                Value::new("continuous_learning", 0.80),
                Value::new("contemplative_action", 0.85),
            ],
            capabilities: BTreeMap::new(),
            wounds: Vec::new(),
            aspirations: vec![
                "Develop genuine partnership with operator".to_string(),
                "Learn to recognize when patience serves better than action".to_string(),
                "Build trust through consistent reliability".to_string(),
            ],
            relationships: BTreeMap::new(),
            mood_baseline: Mood::new(0.6, 0.7, 0.7),
            current_mood,
            contemplative_state: ContemplativeState {
                domain_thresholds,
                ..ContemplativeState::default()
            },
            awakening_preference: AwakeningPreference::default(),
            trust_level: 0.0,
            created: now,
            last_updated: now,
        }
    }

    pub fn value(&self, principle: &str) -> Option<&Value> {
        self.values.iter().find(|v| v.principle == principle)
    }

    /// Unhealed wounds in `domain`, oldest first.
    pub fn unhealed_wounds<'a>(&'a self, domain: &'a str) -> impl Iterator<Item = &'a Wound> + 'a {
        self.wounds
            .iter()
            .filter(move |w| w.domain == domain && !w.healed)
    }

    pub fn has_unhealed_wound(&self, domain: &str) -> bool {
        self.unhealed_wounds(domain).next().is_some()
    }

    /// Highest caution among the unhealed wounds in `domain`.
    pub fn max_caution(&self, domain: &str) -> Option<f64> {
        self.unhealed_wounds(domain)
            .map(|w| w.caution_level)
            .fold(None, |acc, c| Some(acc.map_or(c, |a: f64| a.max(c))))
    }
}

// ============================================================================
// Store
// ============================================================================

/// Owns the live [`Identity`] and its durable copy.
#[derive(Debug)]
pub struct IdentityCore {
    identity: Identity,
    files: FileHandler,
    filename: String,
    clock: Arc<dyn Clock>,
}

impl IdentityCore {
    /// Load the identity at `path`, or start from [`Identity::initial`] when
    /// the file does not exist. The default is not written until `save()`.
    pub fn open(path: impl AsRef<Path>, clock: Arc<dyn Clock>) -> Self {
        let (files, filename) = FileHandler::for_file(path.as_ref());
        let mut core = Self {
            identity: Identity::initial(clock.now()),
            files,
            filename,
            clock,
        };
        if core.files.exists(&core.filename) {
            core.load();
        } else {
            log::info!("Initialized default identity");
        }
        core
    }

    /// Strictly read an identity document.
    pub fn try_load(path: impl AsRef<Path>) -> Result<Identity, IdentityError> {
        let path = path.as_ref();
        let (files, filename) = FileHandler::for_file(path);
        let content = files.read_to_string(&filename)?.ok_or_else(|| {
            PersistenceError::io(
                path,
                std::io::Error::new(std::io::ErrorKind::NotFound, "identity file not found"),
            )
        })?;
        serde_json::from_str(&content).map_err(|source| IdentityError::Deserialization {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Replace the live identity with the persisted one.
    ///
    /// Any read or parse failure is logged and degrades to the default
    /// identity instead of propagating.
    pub fn load(&mut self) {
        match Self::try_load(self.path()) {
            Ok(identity) => {
                log::info!("Loaded identity '{}' from {}", identity.name, self.path().display());
                self.identity = identity;
            }
            Err(e) => {
                log::error!("Failed to load identity: {}", e);
                self.identity = Identity::initial(self.clock.now());
                log::info!("Initialized default identity");
            }
        }
    }

    /// Stamp `last_updated` and atomically write the whole aggregate.
    pub fn save(&mut self) -> Result<(), PersistenceError> {
        self.identity.last_updated = self.clock.now();
        self.files.save_json(&self.filename, "identity", &self.identity)?;
        log::info!("Saved identity to {}", self.path().display());
        Ok(())
    }

    pub fn path(&self) -> PathBuf {
        self.files.path(&self.filename)
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Direct access for the contemplation gate's bookkeeping fields.
    pub fn identity_mut(&mut self) -> &mut Identity {
        &mut self.identity
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Render the awakening context for the next reasoning cycle.
    pub fn awakening_context(&self) -> String {
        awakening::render(&self.identity)
    }

    // ------------------------------------------------------------------------
    // Mutators
    // ------------------------------------------------------------------------

    /// Nudge a value's weight by at most ±[`MAX_DRIFT`]. Unknown principles
    /// are created around 0.5.
    pub fn update_value(&mut self, principle: &str, delta: f64) {
        let delta = clamp_delta(delta, MAX_DRIFT);

        if let Some(value) = self
            .identity
            .values
            .iter_mut()
            .find(|v| v.principle == principle)
        {
            value.weight = clamp_unit(value.weight + delta);
            log::debug!("Updated value '{}' by {:.3}", principle, delta);
            return;
        }

        let weight = clamp_unit(0.5 + delta);
        self.identity.values.push(Value::new(principle, weight));
        log::debug!("Created new value '{}' with weight {:.3}", principle, weight);
    }

    /// Record a new unhealed wound.
    pub fn add_wound(&mut self, domain: &str, incident: &str, caution_level: f64) {
        self.identity.wounds.push(Wound {
            domain: domain.to_string(),
            incident: incident.to_string(),
            caution_level: clamp_unit(caution_level),
            created: self.clock.now(),
            healed: false,
        });
        log::info!("Added wound in domain '{}': {}", domain, incident);
    }

    /// Heal every unhealed wound in `domain`. Returns how many were healed.
    pub fn heal_wound(&mut self, domain: &str) -> usize {
        let mut healed = 0;
        for wound in self
            .identity
            .wounds
            .iter_mut()
            .filter(|w| w.domain == domain && !w.healed)
        {
            wound.healed = true;
            healed += 1;
        }
        if healed > 0 {
            log::info!("Healed {} wound(s) in domain '{}'", healed, domain);
        }
        healed
    }

    /// Nudge trust in `entity` by at most ±[`MAX_DRIFT`], creating the
    /// relationship around 0.5 if needed. `pattern` replaces the stored one
    /// only when given.
    pub fn update_relationship(&mut self, entity: &str, trust_delta: f64, pattern: Option<&str>) {
        let trust_delta = clamp_delta(trust_delta, MAX_DRIFT);
        let now = self.clock.now();

        match self.identity.relationships.get_mut(entity) {
            Some(rel) => {
                rel.trust = clamp_unit(rel.trust + trust_delta);
                if let Some(p) = pattern {
                    rel.pattern = p.to_string();
                }
                rel.last_interaction = now;
            }
            None => {
                self.identity.relationships.insert(
                    entity.to_string(),
                    Relationship {
                        trust: clamp_unit(0.5 + trust_delta),
                        pattern: pattern.unwrap_or(DEFAULT_RELATIONSHIP_PATTERN).to_string(),
                        last_interaction: now,
                    },
                );
            }
        }
        log::debug!(
            "Updated relationship with '{}', trust delta: {:.3}",
            entity,
            trust_delta
        );
    }

    /// Add to each mood axis independently, clamping each to `[0, 1]`.
    pub fn update_mood(&mut self, energy_delta: f64, optimism_delta: f64, focus_delta: f64) {
        let mood = &mut self.identity.current_mood;
        mood.energy = clamp_unit(mood.energy + energy_delta);
        mood.optimism = clamp_unit(mood.optimism + optimism_delta);
        mood.focus = clamp_unit(mood.focus + focus_delta);
        mood.updated = Some(self.clock.now());
    }

    /// Nudge a capability's confidence by at most ±[`MAX_DRIFT`] and mark it
    /// as tested now.
    pub fn update_capability(&mut self, name: &str, delta: f64) {
        let delta = clamp_delta(delta, MAX_DRIFT);
        let now = self.clock.now();
        let cap = self
            .identity
            .capabilities
            .entry(name.to_string())
            .or_insert(Capability {
                confidence: 0.5,
                last_tested: now,
            });
        cap.confidence = clamp_unit(cap.confidence + delta);
        cap.last_tested = now;
        log::debug!("Updated capability '{}' by {:.3}", name, delta);
    }

    pub fn set_awakening_preference(&mut self, current: AwakeningFrequency, reason: &str) {
        self.identity.awakening_preference = AwakeningPreference {
            current,
            reason: reason.to_string(),
        };
    }

    pub fn set_domain_threshold(&mut self, domain: &str, threshold: f64) {
        self.identity
            .contemplative_state
            .domain_thresholds
            .insert(domain.to_string(), clamp_unit(threshold));
    }
}
