//! Contemplation gate: decide act-now versus defer, and keep the deferred
//! thoughts until they ripen or decay.
//!
//! The gate reads thresholds, mood and wounds from the [`Identity`] it is
//! handed and writes only contemplative bookkeeping back into it (noting
//! history, action/contemplation ratio, queue health). The queue itself is
//! owned here and persisted as one JSON document.

pub mod noting;
pub mod readiness;
pub mod thought;

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::{Identity, QueueHealth};
use crate::utilities::errors::PersistenceError;
use crate::utilities::{clamp_unit, Clock, ContextMap, FileHandler};

pub use noting::NotingCategory;
pub use readiness::{BlockingFactor, Readiness, URGENT_KEY};
pub use thought::{QueueDocument, Thought};

/// Tunables for the gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContemplationConfig {
    /// Decay per revisit given to newly deferred thoughts.
    pub default_decay_rate: f64,
    /// Smoothing factor of the action/contemplation moving average.
    pub ratio_alpha: f64,
    /// A thought is evicted once its accumulated decay exceeds this.
    pub eviction_threshold: f64,
    /// How many thoughts `get_queue_summary` lists before collapsing.
    pub summary_limit: usize,
    /// Characters of thought text shown per summary line.
    pub summary_preview_chars: usize,
}

impl Default for ContemplationConfig {
    fn default() -> Self {
        Self {
            default_decay_rate: 0.02,
            ratio_alpha: 0.1,
            eviction_threshold: 0.5,
            summary_limit: 5,
            summary_preview_chars: 60,
        }
    }
}

/// Result of [`ContemplativeSystem::contemplate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Ripe: the caller may act now.
    Ready,
    /// Parked in the queue under this id.
    Deferred { thought_id: String },
}

impl Verdict {
    pub fn is_ready(&self) -> bool {
        matches!(self, Verdict::Ready)
    }
}

#[derive(Serialize)]
struct QueueDocumentRef<'a> {
    queue: &'a [Thought],
    updated: DateTime<Utc>,
}

/// The gate and its deferred-thought queue.
#[derive(Debug)]
pub struct ContemplativeSystem {
    queue: Vec<Thought>,
    files: FileHandler,
    filename: String,
    clock: Arc<dyn Clock>,
    config: ContemplationConfig,
}

impl ContemplativeSystem {
    /// Open the gate with the queue persisted at `queue_path`, if any.
    pub fn open(queue_path: impl AsRef<Path>, clock: Arc<dyn Clock>, config: ContemplationConfig) -> Self {
        let (files, filename) = FileHandler::for_file(queue_path.as_ref());
        let mut system = Self {
            queue: Vec::new(),
            files,
            filename,
            clock,
            config,
        };
        system.load_queue();
        system
    }

    pub fn config(&self) -> &ContemplationConfig {
        &self.config
    }

    pub fn queue_path(&self) -> PathBuf {
        self.files.path(&self.filename)
    }

    /// Deferred thoughts in arrival order.
    pub fn queue(&self) -> &[Thought] {
        &self.queue
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    // ------------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------------

    /// Replace the in-memory queue with the persisted one. A missing file
    /// leaves the queue empty; an unreadable one is logged and treated as
    /// empty.
    pub fn load_queue(&mut self) {
        let content = match self.files.read_to_string(&self.filename) {
            Ok(Some(content)) => content,
            Ok(None) => return,
            Err(e) => {
                log::error!("Failed to load contemplation queue: {}", e);
                self.queue.clear();
                return;
            }
        };

        match serde_json::from_str::<QueueDocument>(&content) {
            Ok(doc) => {
                let mut seen = HashSet::new();
                self.queue = doc
                    .queue
                    .into_iter()
                    .filter(|t| {
                        let fresh = seen.insert(t.id.clone());
                        if !fresh {
                            log::warn!("Dropping duplicate thought id {} from queue", t.id);
                        }
                        fresh
                    })
                    .collect();
                log::info!("Loaded {} thoughts from queue", self.queue.len());
            }
            Err(e) => {
                log::error!("Failed to load contemplation queue: {}", e);
                self.queue.clear();
            }
        }
    }

    /// Persist the current queue.
    pub fn save_queue(&self) -> Result<(), PersistenceError> {
        self.write_queue(&self.queue)
    }

    /// Persist `queue` and make it the live queue. On a failed write the
    /// current queue is kept.
    pub fn replace_queue(&mut self, queue: Vec<Thought>) -> Result<(), PersistenceError> {
        self.write_queue(&queue)?;
        self.queue = queue;
        Ok(())
    }

    fn write_queue(&self, queue: &[Thought]) -> Result<(), PersistenceError> {
        let doc = QueueDocumentRef {
            queue,
            updated: self.clock.now(),
        };
        self.files.save_json(&self.filename, "contemplation queue", &doc)?;
        log::debug!("Saved contemplation queue with {} thoughts", queue.len());
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Gate
    // ------------------------------------------------------------------------

    /// Classify `text` and record the category in the identity's noting
    /// history.
    pub fn note(&self, identity: &mut Identity, text: &str) -> NotingCategory {
        let category = NotingCategory::classify(text);
        identity
            .contemplative_state
            .noting_patterns
            .record(category);
        log::debug!("Noted thought as: {}", category);
        category
    }

    /// Score `text` for `domain` against `identity`. Pure.
    pub fn assess_readiness(
        &self,
        identity: &Identity,
        text: &str,
        domain: &str,
        context: &ContextMap,
    ) -> Readiness {
        let r = readiness::assess(identity, text, domain, context);
        log::info!(
            "Assessed thought readiness: {:.2} vs threshold {:.2} = {}",
            r.score,
            r.threshold,
            if r.ready { "READY" } else { "NOT READY" }
        );
        r
    }

    /// Should this thought become an action now? Defers it with the
    /// configured default decay rate otherwise.
    pub fn contemplate(
        &mut self,
        identity: &mut Identity,
        text: &str,
        domain: &str,
        context: &ContextMap,
    ) -> Result<Verdict, PersistenceError> {
        let decay_rate = self.config.default_decay_rate;
        self.contemplate_with_decay(identity, text, domain, context, decay_rate)
    }

    /// Like [`contemplate`](Self::contemplate), with an explicit decay rate
    /// for the thought if it gets deferred.
    ///
    /// If the queue cannot be saved the thought is not kept and the
    /// action ratio is left untouched, so the call can simply be retried.
    pub fn contemplate_with_decay(
        &mut self,
        identity: &mut Identity,
        text: &str,
        domain: &str,
        context: &ContextMap,
        decay_rate: f64,
    ) -> Result<Verdict, PersistenceError> {
        self.note(identity, text);
        let readiness = self.assess_readiness(identity, text, domain, context);

        if readiness.ready {
            self.update_action_ratio(identity, true);
            return Ok(Verdict::Ready);
        }

        let now = self.clock.now();
        let thought_id = self.next_thought_id(now);
        let thought =
            Thought::from_assessment(thought_id.clone(), text, domain, now, decay_rate, &readiness);

        self.queue.push(thought);
        if let Err(e) = self.save_queue() {
            self.queue.pop();
            return Err(e);
        }
        self.update_action_ratio(identity, false);

        log::info!("Added thought to contemplation queue: {}", thought_id);
        Ok(Verdict::Deferred { thought_id })
    }

    /// Revisit every deferred thought against the current identity.
    ///
    /// Each thought's revisit count goes up by one and its score and
    /// blocking factors are recomputed. Thoughts that are now ready are
    /// removed and returned in arrival order; thoughts whose decay exceeds
    /// the eviction threshold are dropped; the rest stay queued. The queue
    /// is written once after the pass and queue health is refreshed. If the
    /// write fails the queue is left as it was before the pass.
    pub fn revisit_queue(
        &mut self,
        identity: &mut Identity,
        context: &ContextMap,
    ) -> Result<Vec<Thought>, PersistenceError> {
        let mut promoted = Vec::new();
        let mut remaining = Vec::with_capacity(self.queue.len());

        for mut thought in self.queue.iter().cloned() {
            thought.times_revisited += 1;

            self.note(identity, &thought.thought);
            let r = self.assess_readiness(identity, &thought.thought, &thought.domain, context);
            thought.ripeness_score = r.score;
            thought.blocking_factors = r.blocking_factors;

            if r.ready {
                log::info!(
                    "Thought {} is now ready after {} revisits",
                    thought.id,
                    thought.times_revisited
                );
                promoted.push(thought);
            } else if thought.decay() > self.config.eviction_threshold {
                log::info!("Thought {} has decayed, removing from queue", thought.id);
            } else {
                remaining.push(thought);
            }
        }

        self.write_queue(&remaining)?;
        self.queue = remaining;
        self.update_queue_health(identity);

        Ok(promoted)
    }

    /// Human-readable overview of the queue, for status display.
    pub fn get_queue_summary(&self) -> String {
        if self.queue.is_empty() {
            return "Contemplation queue is empty.".to_string();
        }

        let limit = self.config.summary_limit;
        let mut lines = vec![format!(
            "Contemplation queue has {} thoughts:",
            self.queue.len()
        )];
        for thought in self.queue.iter().take(limit) {
            lines.push(format!(
                "  - {}... (ripeness: {:.2}, revisits: {})",
                thought.preview(self.config.summary_preview_chars),
                thought.ripeness_score,
                thought.times_revisited
            ));
        }
        if self.queue.len() > limit {
            lines.push(format!("  ... and {} more", self.queue.len() - limit));
        }
        lines.join("\n")
    }

    // ------------------------------------------------------------------------
    // Bookkeeping
    // ------------------------------------------------------------------------

    fn update_action_ratio(&self, identity: &mut Identity, acted: bool) {
        let alpha = self.config.ratio_alpha;
        let target = if acted { 1.0 } else { 0.0 };
        let state = &mut identity.contemplative_state;
        state.action_contemplation_ratio =
            clamp_unit(alpha * target + (1.0 - alpha) * state.action_contemplation_ratio);
    }

    fn update_queue_health(&self, identity: &mut Identity) {
        let health = QueueHealth::from_len(self.queue.len());
        identity.contemplative_state.queue_health = health;
        log::debug!("Queue health: {} ({} thoughts)", health, self.queue.len());
    }

    /// `thought_{queue_len}_{arrival_micros}`, suffixed if that id is taken.
    fn next_thought_id(&self, now: DateTime<Utc>) -> String {
        let base = format!("thought_{}_{}", self.queue.len(), now.timestamp_micros());
        let taken = |id: &str| self.queue.iter().any(|t| t.id == id);
        if !taken(&base) {
            return base;
        }
        (1..)
            .map(|n| format!("{}_{}", base, n))
            .find(|id| !taken(id))
            .unwrap_or(base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{NotingCategory, Wound};
    use crate::utilities::ManualClock;
    use chrono::{Duration, TimeZone};
    use serde_json::json;

    struct Fixture {
        _dir: tempfile::TempDir,
        clock: Arc<ManualClock>,
        identity: Identity,
        gate: ContemplativeSystem,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2025, 4, 10, 7, 30, 0).unwrap(),
        ));
        let identity = Identity::initial(clock.now());
        let gate = ContemplativeSystem::open(
            dir.path().join("contemplation_queue.json"),
            clock.clone(),
            ContemplationConfig::default(),
        );
        Fixture {
            _dir: dir,
            clock,
            identity,
            gate,
        }
    }

    fn urgent() -> ContextMap {
        let mut ctx = ContextMap::new();
        ctx.insert("urgent".into(), json!(true));
        ctx
    }

    const REFUND: &str = "I should refund the customer immediately, this is urgent";

    #[test]
    fn test_not_ready_thought_is_enqueued() {
        let mut f = fixture();
        let verdict = f
            .gate
            .contemplate(&mut f.identity, REFUND, "financial", &urgent())
            .unwrap();

        let Verdict::Deferred { thought_id } = verdict else {
            panic!("expected deferral");
        };
        assert_eq!(f.gate.len(), 1);
        let t = &f.gate.queue()[0];
        assert_eq!(t.id, thought_id);
        assert_eq!(t.noting, NotingCategory::Reacting);
        assert!((t.ripeness_score - 0.55).abs() < 1e-9);
        assert_eq!(t.decay_rate, 0.02);
        assert!((f.identity.contemplative_state.action_contemplation_ratio - 0.315).abs() < 1e-9);
        assert!(f.gate.queue_path().exists());
    }

    #[test]
    fn test_ready_thought_moves_ratio_toward_one() {
        let mut f = fixture();
        f.identity
            .contemplative_state
            .domain_thresholds
            .insert("financial".into(), 0.5);
        let before = f.identity.contemplative_state.action_contemplation_ratio;

        let verdict = f
            .gate
            .contemplate(&mut f.identity, REFUND, "financial", &urgent())
            .unwrap();

        assert_eq!(verdict, Verdict::Ready);
        assert!(f.gate.is_empty());
        let after = f.identity.contemplative_state.action_contemplation_ratio;
        assert!((after - (before + 0.1 * (1.0 - before))).abs() < 1e-12);
    }

    #[test]
    fn test_contemplate_records_noting_once() {
        let mut f = fixture();
        f.gate
            .contemplate(&mut f.identity, "Tidy the inbox", "routine", &ContextMap::new())
            .unwrap();
        assert_eq!(
            f.identity.contemplative_state.noting_patterns.most_common,
            vec![NotingCategory::Calm]
        );
    }

    #[test]
    fn test_thought_ids_are_unique_at_same_instant() {
        let mut f = fixture();
        let mut ids = HashSet::new();
        for _ in 0..4 {
            if let Verdict::Deferred { thought_id } = f
                .gate
                .contemplate(&mut f.identity, REFUND, "financial", &urgent())
                .unwrap()
            {
                ids.insert(thought_id);
            }
        }
        assert_eq!(ids.len(), 4);
    }

    #[test]
    fn test_decay_eviction_boundary() {
        let mut f = fixture();
        f.gate
            .contemplate_with_decay(&mut f.identity, REFUND, "financial", &ContextMap::new(), 0.1)
            .unwrap();

        for pass in 1..=5 {
            let promoted = f.gate.revisit_queue(&mut f.identity, &ContextMap::new()).unwrap();
            assert!(promoted.is_empty());
            assert_eq!(f.gate.len(), 1, "retained after pass {}", pass);
            assert_eq!(f.gate.queue()[0].times_revisited, pass);
        }

        f.gate.revisit_queue(&mut f.identity, &ContextMap::new()).unwrap();
        assert!(f.gate.is_empty());
        assert_eq!(f.identity.contemplative_state.queue_health, QueueHealth::Healthy);
    }

    #[test]
    fn test_revisit_promotes_after_wound_heals() {
        let mut f = fixture();
        f.identity.wounds.push(Wound {
            domain: "research".into(),
            incident: "cited a retracted paper".into(),
            caution_level: 1.0,
            created: f.clock.now(),
            healed: false,
        });
        let text = "Summarize the new survey papers";
        let verdict = f
            .gate
            .contemplate(&mut f.identity, text, "research", &ContextMap::new())
            .unwrap();
        assert!(!verdict.is_ready());
        assert_eq!(
            f.gate.queue()[0].blocking_factors,
            vec![BlockingFactor::DomainWound]
        );

        f.identity.wounds[0].healed = true;
        f.clock.advance(Duration::hours(1));
        let promoted = f.gate.revisit_queue(&mut f.identity, &ContextMap::new()).unwrap();

        assert_eq!(promoted.len(), 1);
        assert_eq!(promoted[0].thought, text);
        assert_eq!(promoted[0].times_revisited, 1);
        assert!(promoted[0].blocking_factors.is_empty());
        assert!(f.gate.is_empty());
    }

    #[test]
    fn test_revisit_keeps_arrival_order_and_updates_health() {
        let mut f = fixture();
        for i in 0..6 {
            f.clock.advance(Duration::seconds(1));
            f.gate
                .contemplate(
                    &mut f.identity,
                    &format!("I must send follow-up {}", i),
                    "communication",
                    &ContextMap::new(),
                )
                .unwrap();
        }
        f.gate.revisit_queue(&mut f.identity, &ContextMap::new()).unwrap();
        assert_eq!(f.identity.contemplative_state.queue_health, QueueHealth::Backlogged);
        let texts: Vec<&str> = f.gate.queue().iter().map(|t| t.thought.as_str()).collect();
        assert_eq!(texts[0], "I must send follow-up 0");
        assert_eq!(texts[5], "I must send follow-up 5");

        let first_ready: Vec<Thought> = {
            f.identity
                .contemplative_state
                .domain_thresholds
                .insert("communication".into(), 0.0);
            f.gate.revisit_queue(&mut f.identity, &ContextMap::new()).unwrap()
        };
        assert_eq!(first_ready.len(), 6);
        assert_eq!(first_ready[0].thought, "I must send follow-up 0");
        assert_eq!(first_ready[5].thought, "I must send follow-up 5");
    }

    #[test]
    fn test_queue_survives_reopen() {
        let mut f = fixture();
        f.gate
            .contemplate(&mut f.identity, REFUND, "financial", &urgent())
            .unwrap();
        let reopened = ContemplativeSystem::open(
            f.gate.queue_path(),
            f.clock.clone(),
            ContemplationConfig::default(),
        );
        assert_eq!(reopened.queue(), f.gate.queue());
    }

    #[test]
    fn test_corrupt_queue_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("queue.json");
        std::fs::write(&path, "[1, 2").unwrap();
        let gate = ContemplativeSystem::open(
            &path,
            Arc::new(ManualClock::new(Utc::now())),
            ContemplationConfig::default(),
        );
        assert!(gate.is_empty());
    }

    #[test]
    fn test_failed_save_does_not_keep_thought() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "not a directory").unwrap();
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let mut identity = Identity::initial(clock.now());
        let mut gate = ContemplativeSystem::open(
            blocker.join("queue.json"),
            clock,
            ContemplationConfig::default(),
        );
        let before = identity.contemplative_state.action_contemplation_ratio;

        assert!(gate
            .contemplate(&mut identity, REFUND, "financial", &urgent())
            .is_err());
        assert!(gate.is_empty());
        assert_eq!(identity.contemplative_state.action_contemplation_ratio, before);
    }

    #[test]
    fn test_queue_summary() {
        let mut f = fixture();
        assert_eq!(f.gate.get_queue_summary(), "Contemplation queue is empty.");

        for i in 0..7 {
            f.gate
                .contemplate(
                    &mut f.identity,
                    &format!("I have to reconcile ledger batch {}", i),
                    "financial",
                    &ContextMap::new(),
                )
                .unwrap();
        }
        let summary = f.gate.get_queue_summary();
        assert!(summary.starts_with("Contemplation queue has 7 thoughts:"));
        assert_eq!(summary.lines().count(), 1 + 5 + 1);
        assert!(summary.ends_with("  ... and 2 more"));
        assert!(summary.contains("(ripeness: 0.35, revisits: 0)"));
    }
}
