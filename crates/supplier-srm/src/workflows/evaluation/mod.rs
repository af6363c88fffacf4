//! Supplier performance evaluation: weighted item scoring, grading, and the approval
//! workflow, plus the repository, notification, and HTTP seams used by collaborators.

mod aggregate;
pub mod domain;
mod grade;
pub mod import;
mod item;
pub mod report;
pub mod repository;
pub mod router;
pub mod service;
pub mod workflow;

#[cfg(test)]
mod tests;

pub use aggregate::{
    EvaluationValidationError, NewEvaluation, PerformanceEvaluation, MAX_OVERALL_SCORE,
    TARGET_WEIGHT_TOTAL, WEIGHT_TOLERANCE,
};
pub use domain::{EvaluationNumber, EvaluationStatus, ItemId, ItemType, SupplierRef};
pub use grade::Grade;
pub use import::{parse_items, ItemImportError};
pub use item::{EvaluationItem, ItemValidationError, NewEvaluationItem, MAX_WEIGHT};
pub use report::{EvaluationSummary, ItemBreakdown};
pub use repository::{
    EvaluationRepository, NotificationError, RepositoryError, ReviewNotice, ReviewNotifier,
};
pub use router::evaluation_router;
pub use service::{EvaluationService, EvaluationServiceError};
pub use workflow::{WorkflowAction, WorkflowError, WorkflowEvent};
