//! Assessment engine orchestrator.
//!
//! Ties question selection, the assessment state machine and a persistence
//! backend together. Operations on one assessment are serialized; operations
//! on different assessments and users run independently.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use rand::rngs::StdRng;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::instrument;
use uuid::Uuid;

use crate::assessment::{Assessment, AssessmentOutcome, CompletionPolicy};
use crate::error::{AssessmentError, Result, SelectionWarning};
use crate::model::QuestionBank;
use crate::scoring::LevelThresholds;
use crate::selection::{select_questions, SelectionConfig};
use crate::traits::AssessmentStore;

/// Configuration for the assessment engine.
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    /// Per-level selection bounds.
    pub selection: SelectionConfig,
    /// Score → level table.
    pub thresholds: LevelThresholds,
    /// Whether completion requires every question answered.
    pub completion: CompletionPolicy,
    /// Fixed seed for reproducible selection.
    pub seed: Option<u64>,
}

/// Lifecycle hooks, e.g. to update a user's stored level or notify a chat.
pub trait AssessmentObserver: Send + Sync {
    fn on_started(&self, assessment: &Assessment, warnings: &[SelectionWarning]);
    fn on_abandoned(&self, assessment: &Assessment);
    fn on_completed(&self, assessment: &Assessment, outcome: &AssessmentOutcome);
}

/// No-op observer.
pub struct NoopObserver;

impl AssessmentObserver for NoopObserver {
    fn on_started(&self, _: &Assessment, _: &[SelectionWarning]) {}
    fn on_abandoned(&self, _: &Assessment) {}
    fn on_completed(&self, _: &Assessment, _: &AssessmentOutcome) {}
}

/// A freshly started assessment.
#[derive(Debug, Clone)]
pub struct StartedAssessment {
    pub assessment: Assessment,
    /// Degraded-selection warnings for thin levels.
    pub warnings: Vec<SelectionWarning>,
    /// The in-progress assessment this one replaced, if any.
    pub abandoned: Option<Uuid>,
}

type LockTable = Arc<Mutex<HashMap<String, Arc<AsyncMutex<()>>>>>;

/// Async mutexes keyed by assessment or user id.
///
/// An entry lives only while some caller holds or waits on it.
#[derive(Default)]
struct KeyedLocks {
    locks: LockTable,
}

impl KeyedLocks {
    async fn acquire(&self, key: &str) -> Result<KeyGuard> {
        let lock = {
            let mut locks = self
                .locks
                .lock()
                .map_err(|_| AssessmentError::Store("lock table poisoned".into()))?;
            Arc::clone(locks.entry(key.to_string()).or_default())
        };
        Ok(KeyGuard {
            key: key.to_string(),
            table: Arc::clone(&self.locks),
            guard: Some(lock.lock_owned().await),
        })
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.locks.lock().map(|l| l.len()).unwrap_or_default()
    }
}

/// Held lock on one key; removes the table entry when no one else wants it.
struct KeyGuard {
    key: String,
    table: LockTable,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for KeyGuard {
    fn drop(&mut self) {
        drop(self.guard.take());
        if let Ok(mut locks) = self.table.lock() {
            if locks
                .get(&self.key)
                .is_some_and(|lock| Arc::strong_count(lock) == 1)
            {
                locks.remove(&self.key);
            }
        }
    }
}

/// The central assessment engine.
pub struct AssessmentEngine {
    store: Arc<dyn AssessmentStore>,
    bank: Arc<QuestionBank>,
    config: EngineConfig,
    observer: Arc<dyn AssessmentObserver>,
    rng: Mutex<StdRng>,
    assessment_locks: KeyedLocks,
    user_locks: KeyedLocks,
}

impl AssessmentEngine {
    pub fn new(
        store: Arc<dyn AssessmentStore>,
        bank: Arc<QuestionBank>,
        config: EngineConfig,
    ) -> Result<Self> {
        config.selection.validate()?;
        let rng = Mutex::new(SelectionConfig::rng(config.seed));
        Ok(Self {
            store,
            bank,
            config,
            observer: Arc::new(NoopObserver),
            rng,
            assessment_locks: KeyedLocks::default(),
            user_locks: KeyedLocks::default(),
        })
    }

    pub fn with_observer(mut self, observer: Arc<dyn AssessmentObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn bank(&self) -> &QuestionBank {
        &self.bank
    }

    /// Start an assessment for `user_id`, abandoning any that is still in progress.
    #[instrument(skip(self))]
    pub async fn start_assessment(&self, user_id: &str) -> Result<StartedAssessment> {
        let _user_guard = self.user_locks.acquire(user_id).await?;

        let abandoned = match self.store.find_in_progress(user_id).await? {
            Some(existing) => {
                let abandoned = self.abandon_assessment(existing.id).await?;
                tracing::info!(
                    assessment_id = %abandoned.id,
                    "abandoned pending assessment to start a new one"
                );
                Some(abandoned.id)
            }
            None => None,
        };

        let selection = {
            let mut rng = self
                .rng
                .lock()
                .map_err(|_| AssessmentError::Store("rng poisoned".into()))?;
            select_questions(&self.bank, &self.config.selection, &mut *rng)?
        };

        let assessment = Assessment::new(user_id, selection.questions)?;
        self.store.insert(&assessment).await?;

        tracing::info!(
            assessment_id = %assessment.id,
            question_count = assessment.selected_questions().len(),
            degraded = !selection.warnings.is_empty(),
            "assessment started"
        );
        self.observer.on_started(&assessment, &selection.warnings);

        Ok(StartedAssessment {
            assessment,
            warnings: selection.warnings,
            abandoned,
        })
    }

    /// Load an assessment.
    pub async fn get(&self, id: Uuid) -> Result<Assessment> {
        self.store
            .get(id)
            .await?
            .ok_or(AssessmentError::NotFound(id))
    }

    /// Record (or overwrite) one answer.
    #[instrument(skip(self))]
    pub async fn record_answer(
        &self,
        id: Uuid,
        question_id: &str,
        option_index: usize,
    ) -> Result<Assessment> {
        let _guard = self.assessment_locks.acquire(&id.to_string()).await?;
        let mut assessment = self.get(id).await?;
        assessment.record_answer(question_id, option_index)?;
        self.store.update(&assessment).await?;

        let (answered, total) = assessment.progress();
        tracing::debug!(answered, total, "answer recorded");
        Ok(assessment)
    }

    /// Score the assessment and mark it completed.
    #[instrument(skip(self))]
    pub async fn complete_assessment(&self, id: Uuid) -> Result<AssessmentOutcome> {
        let guard = self.assessment_locks.acquire(&id.to_string()).await?;
        let mut assessment = self.get(id).await?;
        let outcome = assessment.complete(&self.config.thresholds, self.config.completion)?;
        self.store.update(&assessment).await?;
        drop(guard);

        tracing::info!(
            user_id = %assessment.user_id,
            score = outcome.score,
            normalized_score = outcome.normalized_score,
            level = %outcome.resulting_level,
            "assessment completed"
        );
        self.observer.on_completed(&assessment, &outcome);
        Ok(outcome)
    }

    /// Abandon an in-progress assessment.
    #[instrument(skip(self))]
    pub async fn abandon_assessment(&self, id: Uuid) -> Result<Assessment> {
        let guard = self.assessment_locks.acquire(&id.to_string()).await?;
        let mut assessment = self.get(id).await?;
        assessment.abandon()?;
        self.store.update(&assessment).await?;
        drop(guard);

        tracing::info!(user_id = %assessment.user_id, "assessment abandoned");
        self.observer.on_abandoned(&assessment);
        Ok(assessment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assessment::AssessmentStatus;
    use crate::level::CefrLevel;
    use crate::model::fixtures::bank;
    use crate::store::MemoryStore;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn engine_with(bank: QuestionBank, config: EngineConfig) -> AssessmentEngine {
        AssessmentEngine::new(Arc::new(MemoryStore::new()), Arc::new(bank), config).unwrap()
    }

    fn seeded() -> EngineConfig {
        EngineConfig {
            seed: Some(42),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn start_selects_across_all_levels() {
        let engine = engine_with(bank(4), seeded());
        let started = engine.start_assessment("u1").await.unwrap();
        let n = started.assessment.selected_questions().len();
        assert!((12..=18).contains(&n));
        assert!(started.warnings.is_empty());
        assert!(started.abandoned.is_none());
        assert_eq!(started.assessment.status(), AssessmentStatus::InProgress);
    }

    #[tokio::test]
    async fn restart_abandons_previous() {
        let engine = engine_with(bank(3), seeded());
        let first = engine.start_assessment("u1").await.unwrap().assessment;
        let second = engine.start_assessment("u1").await.unwrap();

        assert_ne!(second.assessment.id, first.id);
        assert_eq!(second.abandoned, Some(first.id));
        let old = engine.get(first.id).await.unwrap();
        assert_eq!(old.status(), AssessmentStatus::Abandoned);
    }

    #[tokio::test]
    async fn full_flow_all_correct_reaches_c2() {
        let engine = engine_with(bank(3), seeded());
        let a = engine.start_assessment("u1").await.unwrap().assessment;
        for q in a.selected_questions() {
            engine.record_answer(a.id, &q.id, q.correct_index).await.unwrap();
        }
        let outcome = engine.complete_assessment(a.id).await.unwrap();
        assert_eq!(outcome.resulting_level, CefrLevel::C2);
        assert_eq!(outcome.normalized_score, 1.0);

        let again = engine.complete_assessment(a.id).await;
        assert!(matches!(again, Err(AssessmentError::InvalidState { .. })));
    }

    #[tokio::test]
    async fn answers_on_abandoned_are_rejected() {
        let engine = engine_with(bank(2), seeded());
        let a = engine.start_assessment("u1").await.unwrap().assessment;
        engine.abandon_assessment(a.id).await.unwrap();
        let qid = a.selected_questions()[0].id.clone();
        assert!(matches!(
            engine.record_answer(a.id, &qid, 0).await,
            Err(AssessmentError::InvalidState {
                status: AssessmentStatus::Abandoned,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn unknown_assessment_is_not_found() {
        let engine = engine_with(bank(2), seeded());
        let id = Uuid::new_v4();
        assert!(matches!(
            engine.complete_assessment(id).await,
            Err(AssessmentError::NotFound(missing)) if missing == id
        ));
    }

    #[tokio::test]
    async fn single_level_bank_cannot_start() {
        let mut b = bank(3);
        b.questions.retain(|q| q.level == CefrLevel::B1);
        let engine = engine_with(b, seeded());
        assert!(matches!(
            engine.start_assessment("u1").await,
            Err(AssessmentError::PoolTooSmall { .. })
        ));
    }

    #[tokio::test]
    async fn same_seed_same_questions() {
        let ids = |a: &Assessment| {
            a.selected_questions()
                .iter()
                .map(|q| q.id.clone())
                .collect::<Vec<_>>()
        };
        let e1 = engine_with(bank(5), seeded());
        let e2 = engine_with(bank(5), seeded());
        let a1 = e1.start_assessment("u").await.unwrap().assessment;
        let a2 = e2.start_assessment("u").await.unwrap().assessment;
        assert_eq!(ids(&a1), ids(&a2));
    }

    #[tokio::test]
    async fn concurrent_answers_to_one_assessment_are_all_kept() {
        let engine = Arc::new(engine_with(bank(3), seeded()));
        let a = engine.start_assessment("u1").await.unwrap().assessment;
        let id = a.id;

        let mut handles = Vec::new();
        for q in a.selected_questions().to_vec() {
            let engine = Arc::clone(&engine);
            handles.push(tokio::spawn(async move {
                engine.record_answer(id, &q.id, 0).await
            }));
        }
        for h in handles {
            h.await.unwrap().unwrap();
        }

        let stored = engine.get(id).await.unwrap();
        assert!(stored.is_fully_answered());
    }

    #[tokio::test]
    async fn lock_tables_drain_after_each_call() {
        let engine = engine_with(bank(2), seeded());
        for i in 0..50 {
            let a = engine.start_assessment(&format!("u{i}")).await.unwrap().assessment;
            let qid = a.selected_questions()[0].id.clone();
            engine.record_answer(a.id, &qid, 0).await.unwrap();
            engine.abandon_assessment(a.id).await.unwrap();
        }
        assert_eq!(engine.user_locks.len(), 0);
        assert_eq!(engine.assessment_locks.len(), 0);

        // an answered but never finished assessment leaves nothing behind either
        let a = engine.start_assessment("open").await.unwrap().assessment;
        let qid = a.selected_questions()[0].id.clone();
        engine.record_answer(a.id, &qid, 0).await.unwrap();
        assert_eq!(engine.assessment_locks.len(), 0);
    }

    #[tokio::test]
    async fn repeated_ids_in_bank_still_complete() {
        let mut b = bank(2);
        for q in b.questions.iter_mut().filter(|q| q.level == CefrLevel::B1) {
            q.id = q.id.replace("b1", "a1");
        }
        let engine = engine_with(b, seeded());
        let a = engine.start_assessment("u1").await.unwrap().assessment;
        for q in a.selected_questions() {
            engine.record_answer(a.id, &q.id, q.correct_index).await.unwrap();
        }
        let outcome = engine.complete_assessment(a.id).await.unwrap();
        assert_eq!(outcome.normalized_score, 1.0);
    }

    struct Counting {
        completed: AtomicUsize,
        abandoned: AtomicUsize,
    }

    impl AssessmentObserver for Counting {
        fn on_started(&self, _: &Assessment, _: &[SelectionWarning]) {}
        fn on_abandoned(&self, _: &Assessment) {
            self.abandoned.fetch_add(1, Ordering::Relaxed);
        }
        fn on_completed(&self, _: &Assessment, _: &AssessmentOutcome) {
            self.completed.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[tokio::test]
    async fn observer_sees_transitions() {
        let observer = Arc::new(Counting {
            completed: AtomicUsize::new(0),
            abandoned: AtomicUsize::new(0),
        });
        let engine = engine_with(bank(2), seeded()).with_observer(observer.clone());

        engine.start_assessment("u1").await.unwrap();
        let a = engine.start_assessment("u1").await.unwrap().assessment;
        for q in a.selected_questions() {
            engine.record_answer(a.id, &q.id, 1).await.unwrap();
        }
        engine.complete_assessment(a.id).await.unwrap();

        assert_eq!(observer.abandoned.load(Ordering::Relaxed), 1);
        assert_eq!(observer.completed.load(Ordering::Relaxed), 1);
    }
}
