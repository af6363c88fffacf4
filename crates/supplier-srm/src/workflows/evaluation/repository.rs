use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::aggregate::PerformanceEvaluation;
use super::domain::EvaluationNumber;

/// Storage abstraction so the service can be exercised without a database.
pub trait EvaluationRepository: Send + Sync {
    fn insert(&self, evaluation: PerformanceEvaluation)
        -> Result<PerformanceEvaluation, RepositoryError>;
    fn update(&self, evaluation: PerformanceEvaluation) -> Result<(), RepositoryError>;
    fn fetch(
        &self,
        number: &EvaluationNumber,
    ) -> Result<Option<PerformanceEvaluation>, RepositoryError>;
    fn for_supplier(&self, supplier_id: &str)
        -> Result<Vec<PerformanceEvaluation>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("evaluation already exists")]
    Conflict,
    #[error("evaluation not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Outbound hook fired when a review concludes (e-mail, supplier portal, ...).
pub trait ReviewNotifier: Send + Sync {
    fn publish(&self, notice: ReviewNotice) -> Result<(), NotificationError>;
}

/// Payload describing a concluded review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewNotice {
    pub template: String,
    pub evaluation_number: EvaluationNumber,
    pub supplier_id: String,
    pub details: BTreeMap<String, String>,
}

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}
