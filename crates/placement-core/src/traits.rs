//! Persistence seam for assessments.
//!
//! The engine does not own storage. A backing store loads and saves
//! assessment state and enforces the per-user uniqueness rule: at most one
//! `in_progress` assessment per user, the equivalent of a partial unique
//! index on `(user_id) WHERE status = 'in_progress'`.

use async_trait::async_trait;
use uuid::Uuid;

use crate::assessment::Assessment;
use crate::error::Result;

/// Trait for backends that persist assessments.
#[async_trait]
pub trait AssessmentStore: Send + Sync {
    /// Load an assessment by id.
    async fn get(&self, id: Uuid) -> Result<Option<Assessment>>;

    /// Persist a new assessment.
    ///
    /// Must fail with [`crate::error::AssessmentError::InvalidState`] if the
    /// assessment is in progress and its user already has one in progress.
    async fn insert(&self, assessment: &Assessment) -> Result<()>;

    /// Overwrite an existing assessment.
    ///
    /// Must fail with [`crate::error::AssessmentError::NotFound`] if the id is unknown.
    async fn update(&self, assessment: &Assessment) -> Result<()>;

    /// The user's in-progress assessment, if any.
    async fn find_in_progress(&self, user_id: &str) -> Result<Option<Assessment>>;

    /// All assessments for a user, oldest first.
    async fn list_for_user(&self, user_id: &str) -> Result<Vec<Assessment>>;
}
