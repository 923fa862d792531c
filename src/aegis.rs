//! One handle over the identity store, the contemplation gate and the
//! experience pipeline.
//!
//! Each resource sits behind its own `parking_lot::Mutex`, so every
//! load-mutate-save cycle on it is exclusive. Calls that need several
//! resources take them in the order identity, queue, log.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::AegisConfig;
use crate::contemplation::{ContemplativeSystem, Thought, Verdict};
use crate::experience::{ActionOutcome, Experience, ExperienceEngine};
use crate::identity::{Identity, IdentityCore};
use crate::utilities::errors::PersistenceError;
use crate::utilities::{Clock, ContextMap, SystemClock};

#[derive(Debug)]
pub struct Aegis {
    config: AegisConfig,
    identity: Mutex<IdentityCore>,
    gate: Mutex<ContemplativeSystem>,
    experiences: Mutex<ExperienceEngine>,
}

impl Aegis {
    /// Open all three resources under `config.data_dir` on the system clock.
    pub fn open(config: AegisConfig) -> Self {
        Self::open_with_clock(config, Arc::new(SystemClock))
    }

    pub fn open_with_clock(config: AegisConfig, clock: Arc<dyn Clock>) -> Self {
        let identity = IdentityCore::open(config.identity_path(), clock.clone());
        let gate = ContemplativeSystem::open(
            config.queue_path(),
            clock.clone(),
            config.contemplation.clone(),
        );
        let experiences = ExperienceEngine::new(config.experiences_path(), clock);
        log::info!("Opened AEGIS state in {}", config.data_dir.display());

        Self {
            config,
            identity: Mutex::new(identity),
            gate: Mutex::new(gate),
            experiences: Mutex::new(experiences),
        }
    }

    pub fn config(&self) -> &AegisConfig {
        &self.config
    }

    /// Gate a candidate action. The identity is saved afterwards so the
    /// noting history and action ratio survive a restart.
    ///
    /// If either save fails, the queue and the identity are put back as they
    /// were and the error is returned, so the call can be retried.
    pub fn contemplate(
        &self,
        text: &str,
        domain: &str,
        context: &ContextMap,
    ) -> Result<Verdict, PersistenceError> {
        let decay_rate = self.config.contemplation.default_decay_rate;
        self.contemplate_with_decay(text, domain, context, decay_rate)
    }

    pub fn contemplate_with_decay(
        &self,
        text: &str,
        domain: &str,
        context: &ContextMap,
        decay_rate: f64,
    ) -> Result<Verdict, PersistenceError> {
        let mut identity = self.identity.lock();
        let mut gate = self.gate.lock();
        let identity_before = identity.identity().clone();
        let queue_before = gate.queue().to_vec();

        let result = gate
            .contemplate_with_decay(identity.identity_mut(), text, domain, context, decay_rate)
            .and_then(|verdict| identity.save().map(|()| verdict));
        if result.is_err() {
            roll_back(&mut identity, identity_before, &mut gate, queue_before);
        }
        result
    }

    /// Revisit the deferred queue; returns the thoughts that became ready.
    /// Failures roll back like [`contemplate`](Self::contemplate).
    pub fn revisit_queue(&self, context: &ContextMap) -> Result<Vec<Thought>, PersistenceError> {
        let mut identity = self.identity.lock();
        let mut gate = self.gate.lock();
        let identity_before = identity.identity().clone();
        let queue_before = gate.queue().to_vec();

        let result = gate
            .revisit_queue(identity.identity_mut(), context)
            .and_then(|promoted| identity.save().map(|()| promoted));
        if result.is_err() {
            roll_back(&mut identity, identity_before, &mut gate, queue_before);
        }
        result
    }

    /// Learn from an executed action.
    pub fn process(&self, outcome: ActionOutcome) -> Result<Experience, PersistenceError> {
        let mut identity = self.identity.lock();
        let engine = self.experiences.lock();
        engine.process(outcome, &mut identity)
    }

    pub fn awakening_context(&self) -> String {
        self.identity.lock().awakening_context()
    }

    pub fn queue_summary(&self) -> String {
        self.gate.lock().get_queue_summary()
    }

    pub fn queue_len(&self) -> usize {
        self.gate.lock().len()
    }

    pub fn recent_experiences(&self, count: usize) -> Vec<Experience> {
        self.experiences.lock().get_recent_experiences(count)
    }

    pub fn save_identity(&self) -> Result<(), PersistenceError> {
        self.identity.lock().save()
    }

    /// Run `f` with exclusive access to the identity store. Changes are not
    /// saved unless `f` saves them.
    pub fn with_identity<R>(&self, f: impl FnOnce(&mut IdentityCore) -> R) -> R {
        let mut identity = self.identity.lock();
        f(&mut identity)
    }
}

/// Undo a gate call whose identity or queue write failed.
fn roll_back(
    identity: &mut IdentityCore,
    identity_before: Identity,
    gate: &mut ContemplativeSystem,
    queue_before: Vec<Thought>,
) {
    *identity.identity_mut() = identity_before;
    if gate.queue() != queue_before.as_slice() {
        if let Err(e) = gate.replace_queue(queue_before) {
            log::error!("Failed to restore contemplation queue: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contemplation::BlockingFactor;
    use crate::experience::OutcomeType;
    use crate::identity::{NotingCategory, QueueHealth};
    use crate::utilities::ManualClock;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    const REFUND: &str = "I should refund the customer immediately, this is urgent";

    fn open(dir: &std::path::Path) -> Aegis {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2025, 9, 1, 9, 0, 0).unwrap(),
        ));
        Aegis::open_with_clock(AegisConfig::with_data_dir(dir), clock)
    }

    fn urgent() -> ContextMap {
        let mut ctx = ContextMap::new();
        ctx.insert("urgent".into(), json!(true));
        ctx
    }

    #[test]
    fn test_full_cycle_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        {
            let aegis = open(dir.path());
            let verdict = aegis
                .contemplate("Research the vendor options", "research", &ContextMap::new())
                .unwrap();
            assert!(verdict.is_ready());

            let verdict = aegis.contemplate(REFUND, "financial", &urgent()).unwrap();
            assert!(!verdict.is_ready());
            assert_eq!(aegis.queue_len(), 1);

            let exp = aegis
                .process(
                    ActionOutcome::new("Research the vendor options", "Shortlisted three vendors")
                        .with_domain("research"),
                )
                .unwrap();
            assert_eq!(exp.outcome_type, OutcomeType::Success);
        }

        let aegis = open(dir.path());
        assert_eq!(aegis.queue_len(), 1);
        assert_eq!(aegis.recent_experiences(10).len(), 1);
        aegis.with_identity(|core| {
            let state = &core.identity().contemplative_state;
            assert_eq!(
                state.noting_patterns.most_common,
                vec![NotingCategory::Calm, NotingCategory::Reacting]
            );
            // one act then one deferral from 0.35
            assert!((state.action_contemplation_ratio - 0.3735).abs() < 1e-9);
        });
        assert!(aegis.awakening_context().starts_with("# AWAKENING CONTEXT"));
        assert!(aegis.queue_summary().contains("Contemplation queue has 1 thoughts:"));
    }

    #[test]
    fn test_lowered_threshold_promotes_on_revisit() {
        let dir = tempfile::tempdir().unwrap();
        let aegis = open(dir.path());
        aegis.contemplate(REFUND, "financial", &urgent()).unwrap();

        aegis.with_identity(|core| core.set_domain_threshold("financial", 0.5));
        let promoted = aegis.revisit_queue(&urgent()).unwrap();

        assert_eq!(promoted.len(), 1);
        assert_eq!(promoted[0].times_revisited, 1);
        assert_eq!(promoted[0].blocking_factors, vec![BlockingFactor::ReactiveState]);
        assert_eq!(aegis.queue_len(), 0);
        assert_eq!(aegis.queue_summary(), "Contemplation queue is empty.");
        aegis.with_identity(|core| {
            assert_eq!(
                core.identity().contemplative_state.queue_health,
                QueueHealth::Healthy
            );
        });
    }

    fn open_with_state_dir(dir: &std::path::Path) -> Aegis {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2025, 9, 2, 9, 0, 0).unwrap(),
        ));
        let mut config = AegisConfig::with_data_dir(dir);
        config.identity_file = "state/identity.json".into();
        Aegis::open_with_clock(config, clock)
    }

    #[test]
    fn test_contemplate_retry_after_identity_save_failure() {
        let dir = tempfile::tempdir().unwrap();
        let state = dir.path().join("state");
        std::fs::write(&state, "not a directory yet").unwrap();
        let aegis = open_with_state_dir(dir.path());
        let ctx = ContextMap::new();

        assert!(aegis.contemplate("I must pay the invoice", "financial", &ctx).is_err());
        assert_eq!(aegis.queue_len(), 0);
        let on_disk = std::fs::read_to_string(aegis.config().queue_path()).unwrap();
        assert!(on_disk.contains("\"queue\": []"));
        aegis.with_identity(|core| {
            let state = &core.identity().contemplative_state;
            assert!(state.noting_patterns.most_common.is_empty());
            assert_eq!(state.action_contemplation_ratio, 0.35);
        });

        std::fs::remove_file(&state).unwrap();
        let verdict = aegis.contemplate("I must pay the invoice", "financial", &ctx).unwrap();
        assert!(!verdict.is_ready());
        assert_eq!(aegis.queue_len(), 1);
        aegis.with_identity(|core| {
            let state = &core.identity().contemplative_state;
            assert_eq!(state.noting_patterns.most_common, vec![NotingCategory::Reacting]);
            assert!((state.action_contemplation_ratio - 0.315).abs() < 1e-9);
        });

        let reopened = open_with_state_dir(dir.path());
        assert_eq!(reopened.queue_len(), 1);
    }

    #[test]
    fn test_revisit_retry_after_identity_save_failure() {
        let dir = tempfile::tempdir().unwrap();
        let aegis = open_with_state_dir(dir.path());
        aegis.contemplate(REFUND, "financial", &urgent()).unwrap();
        aegis.with_identity(|core| core.set_domain_threshold("financial", 0.5));

        let state = dir.path().join("state");
        std::fs::remove_dir_all(&state).unwrap();
        std::fs::write(&state, "blocked").unwrap();

        assert!(aegis.revisit_queue(&urgent()).is_err());
        assert_eq!(aegis.queue_len(), 1);
        let on_disk = std::fs::read_to_string(aegis.config().queue_path()).unwrap();
        assert!(on_disk.contains("\"times_revisited\": 0"));

        std::fs::remove_file(&state).unwrap();
        let promoted = aegis.revisit_queue(&urgent()).unwrap();
        assert_eq!(promoted.len(), 1);
        assert_eq!(promoted[0].times_revisited, 1);
        assert_eq!(aegis.queue_len(), 0);
        aegis.with_identity(|core| {
            // contemplate noted once, the single successful revisit once
            assert_eq!(core.identity().contemplative_state.noting_patterns.most_common.len(), 2);
        });
    }

    #[test]
    fn test_concurrent_processing_keeps_every_experience() {
        let dir = tempfile::tempdir().unwrap();
        let aegis = Arc::new(open(dir.path()));

        let handles: Vec<_> = (0..4)
            .map(|worker| {
                let aegis = Arc::clone(&aegis);
                std::thread::spawn(move || {
                    for i in 0..5 {
                        aegis
                            .process(ActionOutcome::new(format!("task {}-{}", worker, i), "ok"))
                            .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(aegis.recent_experiences(100).len(), 20);
        let energy = aegis.with_identity(|core| core.identity().current_mood.energy);
        // 0.6 + 20 * 0.015
        assert!((energy - 0.9).abs() < 1e-9);
    }
}
