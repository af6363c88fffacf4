use std::collections::BTreeMap;
use std::io::Read;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::ScoringConfig;

use super::aggregate::{EvaluationValidationError, NewEvaluation, PerformanceEvaluation};
use super::domain::{EvaluationNumber, ItemId};
use super::grade::Grade;
use super::import::{parse_items, ItemImportError};
use super::item::{
    reserve_item_ids_through, EvaluationItem, ItemValidationError, NewEvaluationItem,
};
use super::report::EvaluationSummary;
use super::repository::{
    EvaluationRepository, NotificationError, RepositoryError, ReviewNotice, ReviewNotifier,
};
use super::workflow::{ensure_editable, transition, WorkflowAction, WorkflowError, WorkflowEvent};

static EVALUATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_evaluation_number() -> EvaluationNumber {
    let id = EVALUATION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    EvaluationNumber(format!("PE-{id:06}"))
}

/// Service applying evaluator and reviewer actions to stored evaluations.
///
/// Every mutation follows the same shape: load, check the guard, mutate the aggregate,
/// persist. Content edits are only accepted while the evaluation is editable.
pub struct EvaluationService<R, N> {
    repository: Arc<R>,
    notifier: Arc<N>,
    scoring: ScoringConfig,
}

impl<R, N> EvaluationService<R, N>
where
    R: EvaluationRepository + 'static,
    N: ReviewNotifier + 'static,
{
    pub fn new(repository: Arc<R>, notifier: Arc<N>, scoring: ScoringConfig) -> Self {
        Self {
            repository,
            notifier,
            scoring,
        }
    }

    pub fn scoring(&self) -> &ScoringConfig {
        &self.scoring
    }

    /// Open a draft evaluation, generating a number when the caller supplied none.
    pub fn create(
        &self,
        new: NewEvaluation,
    ) -> Result<PerformanceEvaluation, EvaluationServiceError> {
        let evaluation = PerformanceEvaluation::from_new(new, next_evaluation_number)?;
        let stored = self.repository.insert(evaluation)?;

        info!(
            evaluation_number = %stored.evaluation_number(),
            supplier_id = %stored.supplier().supplier_id,
            "evaluation draft created"
        );
        Ok(stored)
    }

    pub fn get(
        &self,
        number: &EvaluationNumber,
    ) -> Result<PerformanceEvaluation, EvaluationServiceError> {
        let evaluation = self
            .repository
            .fetch(number)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(evaluation)
    }

    pub fn list_for_supplier(
        &self,
        supplier_id: &str,
    ) -> Result<Vec<PerformanceEvaluation>, EvaluationServiceError> {
        Ok(self.repository.for_supplier(supplier_id)?)
    }

    pub fn summary(
        &self,
        number: &EvaluationNumber,
    ) -> Result<EvaluationSummary, EvaluationServiceError> {
        let evaluation = self.get(number)?;
        Ok(EvaluationSummary::build(
            &evaluation,
            self.scoring.reconciliation_tolerance,
        ))
    }

    pub fn add_item(
        &self,
        number: &EvaluationNumber,
        new_item: NewEvaluationItem,
    ) -> Result<EvaluationItem, EvaluationServiceError> {
        let mut evaluation = self.load_editable(number)?;
        let item = new_item.into_item()?;

        let item_id = item.id();
        if !evaluation.add_evaluation_item(item) {
            return Err(EvaluationServiceError::DuplicateItem {
                number: number.clone(),
                item_id,
            });
        }
        let added = evaluation
            .item(item_id)
            .cloned()
            .ok_or_else(|| EvaluationServiceError::ItemNotFound {
                number: number.clone(),
                item_id,
            })?;
        self.repository.update(evaluation)?;

        debug!(evaluation_number = %number, %item_id, "evaluation item added");
        Ok(added)
    }

    pub fn remove_item(
        &self,
        number: &EvaluationNumber,
        item_id: ItemId,
    ) -> Result<EvaluationItem, EvaluationServiceError> {
        let mut evaluation = self.load_editable(number)?;
        let removed = evaluation.remove_evaluation_item(item_id).ok_or_else(|| {
            EvaluationServiceError::ItemNotFound {
                number: number.clone(),
                item_id,
            }
        })?;
        self.repository.update(evaluation)?;

        debug!(evaluation_number = %number, %item_id, "evaluation item removed");
        Ok(removed)
    }

    /// Attach every row of an item sheet. Nothing is stored if any row is invalid.
    pub fn import_items<Rd: Read>(
        &self,
        number: &EvaluationNumber,
        reader: Rd,
    ) -> Result<usize, EvaluationServiceError> {
        let mut evaluation = self.load_editable(number)?;
        let items = parse_items(reader)?;

        let added = items.len();
        for item in items {
            let item_id = item.id();
            if !evaluation.add_evaluation_item(item) {
                return Err(EvaluationServiceError::DuplicateItem {
                    number: number.clone(),
                    item_id,
                });
            }
        }
        self.repository.update(evaluation)?;

        debug!(evaluation_number = %number, added, "evaluation items imported");
        Ok(added)
    }

    pub fn record_score(
        &self,
        number: &EvaluationNumber,
        score: f64,
    ) -> Result<PerformanceEvaluation, EvaluationServiceError> {
        let mut evaluation = self.load_editable(number)?;
        evaluation.record_overall_score(score)?;
        self.repository.update(evaluation.clone())?;
        Ok(evaluation)
    }

    pub fn assign_grade(
        &self,
        number: &EvaluationNumber,
        grade: Grade,
    ) -> Result<PerformanceEvaluation, EvaluationServiceError> {
        let mut evaluation = self.load_editable(number)?;
        evaluation.assign_grade(grade);
        self.repository.update(evaluation.clone())?;
        Ok(evaluation)
    }

    /// Assign the classifier's grade for the recorded score.
    pub fn derive_grade(&self, number: &EvaluationNumber) -> Result<Grade, EvaluationServiceError> {
        let mut evaluation = self.load_editable(number)?;
        let grade = evaluation.derive_grade();
        self.repository.update(evaluation)?;
        Ok(grade)
    }

    pub fn submit_for_review(
        &self,
        number: &EvaluationNumber,
        actor: &str,
    ) -> Result<PerformanceEvaluation, EvaluationServiceError> {
        let mut evaluation = self.get(number)?;
        if let Err(err) = transition(evaluation.status(), WorkflowAction::SubmitForReview) {
            warn!(evaluation_number = %number, error = %err, "workflow action refused");
            return Err(err.into());
        }

        if !evaluation.validate_weights_total() {
            let total = evaluation.total_weight();
            if self.scoring.require_consistent_weights {
                let err = WorkflowError::InconsistentWeights { total };
                warn!(evaluation_number = %number, error = %err, "workflow action refused");
                return Err(err.into());
            }
            warn!(
                evaluation_number = %number,
                total_weight = total,
                "submitting evaluation with inconsistent weight total"
            );
        }

        self.commit(&mut evaluation, |evaluation| {
            evaluation.submit_for_review(actor).cloned()
        })?;
        Ok(evaluation)
    }

    pub fn approve(
        &self,
        number: &EvaluationNumber,
        reviewer: &str,
    ) -> Result<PerformanceEvaluation, EvaluationServiceError> {
        let mut evaluation = self.get(number)?;
        let event = self.commit(&mut evaluation, |evaluation| {
            evaluation.approve(reviewer).cloned()
        })?;

        let mut details = BTreeMap::new();
        details.insert("reviewer".to_string(), event.actor);
        details.insert(
            "overall_score".to_string(),
            format!("{:.2}", evaluation.overall_score()),
        );
        details.insert(
            "grade".to_string(),
            evaluation
                .grade()
                .unwrap_or_else(|| evaluation.calculate_grade())
                .to_string(),
        );
        self.notify("evaluation_confirmed", &evaluation, details)?;
        Ok(evaluation)
    }

    pub fn reject(
        &self,
        number: &EvaluationNumber,
        reviewer: &str,
        reason: &str,
    ) -> Result<PerformanceEvaluation, EvaluationServiceError> {
        let mut evaluation = self.get(number)?;
        let event = self.commit(&mut evaluation, |evaluation| {
            evaluation.reject(reviewer, reason).cloned()
        })?;

        let mut details = BTreeMap::new();
        details.insert("reviewer".to_string(), event.actor);
        details.insert("reason".to_string(), event.note.unwrap_or_default());
        self.notify("evaluation_rejected", &evaluation, details)?;
        Ok(evaluation)
    }

    fn load_editable(
        &self,
        number: &EvaluationNumber,
    ) -> Result<PerformanceEvaluation, EvaluationServiceError> {
        let evaluation = self.get(number)?;
        if let Err(err) = ensure_editable(evaluation.status()) {
            warn!(evaluation_number = %number, error = %err, "edit refused");
            return Err(err.into());
        }
        if let Some(held) = evaluation.max_item_id() {
            reserve_item_ids_through(held);
        }
        Ok(evaluation)
    }

    fn commit<F>(
        &self,
        evaluation: &mut PerformanceEvaluation,
        action: F,
    ) -> Result<WorkflowEvent, EvaluationServiceError>
    where
        F: FnOnce(&mut PerformanceEvaluation) -> Result<WorkflowEvent, WorkflowError>,
    {
        let event = match action(evaluation) {
            Ok(event) => event,
            Err(err) => {
                warn!(
                    evaluation_number = %evaluation.evaluation_number(),
                    error = %err,
                    "workflow action refused"
                );
                return Err(err.into());
            }
        };
        self.repository.update(evaluation.clone())?;

        info!(
            evaluation_number = %evaluation.evaluation_number(),
            from = %event.from,
            to = %event.to,
            actor = %event.actor,
            "evaluation transition committed"
        );
        Ok(event)
    }

    fn notify(
        &self,
        template: &str,
        evaluation: &PerformanceEvaluation,
        details: BTreeMap<String, String>,
    ) -> Result<(), EvaluationServiceError> {
        self.notifier.publish(ReviewNotice {
            template: template.to_string(),
            evaluation_number: evaluation.evaluation_number().clone(),
            supplier_id: evaluation.supplier().supplier_id.clone(),
            details,
        })?;
        Ok(())
    }
}

/// Error raised by the evaluation service.
#[derive(Debug, thiserror::Error)]
pub enum EvaluationServiceError {
    #[error(transparent)]
    Validation(#[from] EvaluationValidationError),
    #[error(transparent)]
    Item(#[from] ItemValidationError),
    #[error(transparent)]
    Import(#[from] ItemImportError),
    #[error(transparent)]
    Workflow(#[from] WorkflowError),
    #[error("evaluation {number} already holds item {item_id}")]
    DuplicateItem {
        number: EvaluationNumber,
        item_id: ItemId,
    },
    #[error("evaluation {number} has no item {item_id}")]
    ItemNotFound {
        number: EvaluationNumber,
        item_id: ItemId,
    },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Notification(#[from] NotificationError),
}
