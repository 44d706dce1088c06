//! In-memory assessment store.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use crate::assessment::{Assessment, AssessmentStatus};
use crate::error::{AssessmentError, Result};
use crate::traits::AssessmentStore;

/// An [`AssessmentStore`] backed by a `HashMap`, for tests and the CLI.
#[derive(Default)]
pub struct MemoryStore {
    assessments: Mutex<HashMap<Uuid, Assessment>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored assessments.
    pub fn len(&self) -> usize {
        self.lock().map(|map| map.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<Uuid, Assessment>>> {
        self.assessments
            .lock()
            .map_err(|_| AssessmentError::Store("assessment map poisoned".into()))
    }
}

fn conflicting_in_progress<'a>(
    map: &'a HashMap<Uuid, Assessment>,
    candidate: &Assessment,
) -> Option<&'a Assessment> {
    if candidate.status() != AssessmentStatus::InProgress {
        return None;
    }
    map.values().find(|other| {
        other.id != candidate.id
            && other.user_id == candidate.user_id
            && other.status() == AssessmentStatus::InProgress
    })
}

#[async_trait]
impl AssessmentStore for MemoryStore {
    async fn get(&self, id: Uuid) -> Result<Option<Assessment>> {
        Ok(self.lock()?.get(&id).cloned())
    }

    async fn insert(&self, assessment: &Assessment) -> Result<()> {
        let mut map = self.lock()?;
        if let Some(existing) = conflicting_in_progress(&map, assessment) {
            return Err(AssessmentError::InvalidState {
                id: existing.id,
                status: existing.status(),
                operation: "replace",
            });
        }
        map.insert(assessment.id, assessment.clone());
        Ok(())
    }

    async fn update(&self, assessment: &Assessment) -> Result<()> {
        let mut map = self.lock()?;
        if !map.contains_key(&assessment.id) {
            return Err(AssessmentError::NotFound(assessment.id));
        }
        if let Some(existing) = conflicting_in_progress(&map, assessment) {
            return Err(AssessmentError::InvalidState {
                id: existing.id,
                status: existing.status(),
                operation: "replace",
            });
        }
        map.insert(assessment.id, assessment.clone());
        Ok(())
    }

    async fn find_in_progress(&self, user_id: &str) -> Result<Option<Assessment>> {
        Ok(self
            .lock()?
            .values()
            .find(|a| a.user_id == user_id && a.status() == AssessmentStatus::InProgress)
            .cloned())
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<Assessment>> {
        let mut list: Vec<Assessment> = self
            .lock()?
            .values()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect();
        list.sort_by_key(|a| a.started_at);
        Ok(list)
    }
}
