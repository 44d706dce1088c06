//! placement-core: CEFR placement assessment engine.
//!
//! This crate holds the data model, question selection, weighted scoring and
//! the assessment lifecycle that place a learner on the A1–C2 scale.

pub mod assessment;
pub mod config;
pub mod engine;
pub mod error;
pub mod level;
pub mod model;
pub mod parser;
pub mod report;
pub mod scoring;
pub mod selection;
pub mod sheet;
pub mod statistics;
pub mod store;
pub mod traits;

pub use assessment::{Assessment, AssessmentOutcome, AssessmentStatus, CompletionPolicy};
pub use engine::{AssessmentEngine, EngineConfig};
pub use error::{AssessmentError, SelectionWarning};
pub use level::CefrLevel;
pub use model::{AssessmentQuestion, QuestionBank};
