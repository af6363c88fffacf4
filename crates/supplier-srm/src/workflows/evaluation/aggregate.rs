use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{EvaluationNumber, EvaluationStatus, ItemId, SupplierRef};
use super::grade::Grade;
use super::item::EvaluationItem;
use super::workflow::{transition, WorkflowAction, WorkflowError, WorkflowEvent};

pub const TARGET_WEIGHT_TOTAL: f64 = 100.0;
pub const WEIGHT_TOLERANCE: f64 = 0.01;
pub const MAX_OVERALL_SCORE: f64 = 100.0;

/// Aggregate-level input violation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvaluationValidationError {
    #[error("evaluation number must not be empty")]
    EmptyNumber,
    #[error("evaluation title must not be empty")]
    EmptyTitle,
    #[error("overall score must be between 0 and 100 (found {found})")]
    ScoreOutOfRange { found: f64 },
}

/// Header fields supplied when an evaluator opens a new evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEvaluation {
    #[serde(default)]
    pub evaluation_number: Option<String>,
    pub supplier: SupplierRef,
    pub title: String,
    #[serde(default)]
    pub evaluation_period: Option<String>,
    #[serde(default)]
    pub evaluator: Option<String>,
    #[serde(default)]
    pub evaluation_date: Option<NaiveDate>,
}

/// Supplier performance evaluation: the owned item breakdown, the recorded score and
/// grade, and the approval state.
///
/// The recorded `overall_score` and the derived [`calculate_actual_score`] are tracked
/// separately on purpose. Evaluators may enter a headline score before the breakdown
/// exists; [`is_score_consistent`] lets reviewers audit the two later.
///
/// [`calculate_actual_score`]: PerformanceEvaluation::calculate_actual_score
/// [`is_score_consistent`]: PerformanceEvaluation::is_score_consistent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceEvaluation {
    evaluation_number: EvaluationNumber,
    supplier: SupplierRef,
    title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    evaluation_period: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    evaluator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    evaluation_date: Option<NaiveDate>,
    #[serde(default)]
    overall_score: f64,
    #[serde(default)]
    grade: Option<Grade>,
    #[serde(default)]
    status: EvaluationStatus,
    #[serde(default)]
    evaluation_items: Vec<EvaluationItem>,
    #[serde(default)]
    history: Vec<WorkflowEvent>,
}

impl PerformanceEvaluation {
    pub fn new(
        evaluation_number: EvaluationNumber,
        supplier: SupplierRef,
        title: impl Into<String>,
    ) -> Result<Self, EvaluationValidationError> {
        if evaluation_number.0.trim().is_empty() {
            return Err(EvaluationValidationError::EmptyNumber);
        }
        let title = title.into();
        if title.trim().is_empty() {
            return Err(EvaluationValidationError::EmptyTitle);
        }

        Ok(Self {
            evaluation_number,
            supplier,
            title,
            evaluation_period: None,
            evaluator: None,
            evaluation_date: None,
            overall_score: 0.0,
            grade: None,
            status: EvaluationStatus::Draft,
            evaluation_items: Vec::new(),
            history: Vec::new(),
        })
    }

    /// Build a draft from collaborator input, using `fallback_number` when the caller did
    /// not assign one.
    pub fn from_new(
        new: NewEvaluation,
        fallback_number: impl FnOnce() -> EvaluationNumber,
    ) -> Result<Self, EvaluationValidationError> {
        let number = match new.evaluation_number {
            Some(raw) => EvaluationNumber(raw.trim().to_string()),
            None => fallback_number(),
        };

        let mut evaluation = Self::new(number, new.supplier, new.title)?;
        evaluation.evaluation_period = new.evaluation_period;
        evaluation.evaluator = new.evaluator;
        evaluation.evaluation_date = new.evaluation_date;
        Ok(evaluation)
    }

    pub fn with_period(mut self, period: impl Into<String>) -> Self {
        self.evaluation_period = Some(period.into());
        self
    }

    pub fn with_evaluator(mut self, evaluator: impl Into<String>) -> Self {
        self.evaluator = Some(evaluator.into());
        self
    }

    pub fn with_evaluation_date(mut self, date: NaiveDate) -> Self {
        self.evaluation_date = Some(date);
        self
    }

    pub fn evaluation_number(&self) -> &EvaluationNumber {
        &self.evaluation_number
    }

    pub fn supplier(&self) -> &SupplierRef {
        &self.supplier
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn evaluation_period(&self) -> Option<&str> {
        self.evaluation_period.as_deref()
    }

    pub fn evaluator(&self) -> Option<&str> {
        self.evaluator.as_deref()
    }

    pub fn evaluation_date(&self) -> Option<NaiveDate> {
        self.evaluation_date
    }

    /// The recorded (manually entered or confirmed) composite score.
    pub fn overall_score(&self) -> f64 {
        self.overall_score
    }

    /// The grade currently assigned, if any.
    pub fn grade(&self) -> Option<Grade> {
        self.grade
    }

    pub fn status(&self) -> EvaluationStatus {
        self.status
    }

    pub fn history(&self) -> &[WorkflowEvent] {
        &self.history
    }

    pub fn items(&self) -> &[EvaluationItem] {
        &self.evaluation_items
    }

    pub fn item(&self, id: ItemId) -> Option<&EvaluationItem> {
        self.evaluation_items.iter().find(|item| item.id() == id)
    }

    pub fn item_mut(&mut self, id: ItemId) -> Option<&mut EvaluationItem> {
        self.evaluation_items.iter_mut().find(|item| item.id() == id)
    }

    pub fn contains_item(&self, id: ItemId) -> bool {
        self.item(id).is_some()
    }

    pub fn quantitative_items(&self) -> impl Iterator<Item = &EvaluationItem> + '_ {
        self.evaluation_items
            .iter()
            .filter(|item| item.is_quantitative())
    }

    pub fn qualitative_items(&self) -> impl Iterator<Item = &EvaluationItem> + '_ {
        self.evaluation_items
            .iter()
            .filter(|item| item.is_qualitative())
    }

    /// Attach an item and point its back-reference at this evaluation. Returns `false`
    /// without touching the collection when an item with the same id is already held.
    pub fn add_evaluation_item(&mut self, mut item: EvaluationItem) -> bool {
        if self.contains_item(item.id()) {
            return false;
        }
        item.attach_to(&self.evaluation_number);
        self.evaluation_items.push(item);
        true
    }

    /// Detach an item, clearing its back-reference.
    pub fn remove_evaluation_item(&mut self, id: ItemId) -> Option<EvaluationItem> {
        let position = self
            .evaluation_items
            .iter()
            .position(|item| item.id() == id)?;
        let mut item = self.evaluation_items.remove(position);
        item.detach();
        Some(item)
    }

    /// Highest item id currently held, if any.
    pub fn max_item_id(&self) -> Option<ItemId> {
        self.evaluation_items.iter().map(EvaluationItem::id).max()
    }

    /// Derived score: sum of every item's weighted contribution.
    pub fn calculate_actual_score(&self) -> f64 {
        self.evaluation_items
            .iter()
            .map(EvaluationItem::weighted_score)
            .fold(0.0, |total, score| total + score)
    }

    pub fn total_weight(&self) -> f64 {
        self.evaluation_items
            .iter()
            .map(EvaluationItem::weight)
            .fold(0.0, |total, weight| total + weight)
    }

    /// Advisory completeness check; an empty breakdown is never complete.
    pub fn validate_weights_total(&self) -> bool {
        if self.evaluation_items.is_empty() {
            return false;
        }
        (self.total_weight() - TARGET_WEIGHT_TOTAL).abs() < WEIGHT_TOLERANCE
    }

    /// Grade for the recorded score. The derived score is not consulted.
    pub fn calculate_grade(&self) -> Grade {
        Grade::from_score(self.overall_score)
    }

    pub fn record_overall_score(&mut self, score: f64) -> Result<(), EvaluationValidationError> {
        if !score.is_finite() || !(0.0..=MAX_OVERALL_SCORE).contains(&score) {
            return Err(EvaluationValidationError::ScoreOutOfRange { found: score });
        }
        self.overall_score = score;
        Ok(())
    }

    pub fn assign_grade(&mut self, grade: Grade) {
        self.grade = Some(grade);
    }

    /// Assign the classifier's grade for the recorded score and return it.
    pub fn derive_grade(&mut self) -> Grade {
        let grade = self.calculate_grade();
        self.grade = Some(grade);
        grade
    }

    /// Recorded score minus derived score.
    pub fn score_variance(&self) -> f64 {
        self.overall_score - self.calculate_actual_score()
    }

    pub fn is_score_consistent(&self, tolerance: f64) -> bool {
        self.score_variance().abs() < tolerance
    }

    pub fn is_editable(&self) -> bool {
        self.status.is_editable()
    }

    pub fn is_completed(&self) -> bool {
        self.status.is_completed()
    }

    pub fn is_approved(&self) -> bool {
        self.status.is_approved()
    }

    pub fn is_rejected(&self) -> bool {
        self.status.is_rejected()
    }

    pub fn submit_for_review(&mut self, actor: &str) -> Result<&WorkflowEvent, WorkflowError> {
        self.apply(WorkflowAction::SubmitForReview, actor, None)
    }

    pub fn approve(&mut self, reviewer: &str) -> Result<&WorkflowEvent, WorkflowError> {
        self.apply(WorkflowAction::Approve, reviewer, None)
    }

    /// The state check runs before the reason check.
    pub fn reject(&mut self, reviewer: &str, reason: &str) -> Result<&WorkflowEvent, WorkflowError> {
        transition(self.status, WorkflowAction::Reject)?;
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(WorkflowError::MissingRejectionReason);
        }
        self.apply(WorkflowAction::Reject, reviewer, Some(reason.to_string()))
    }

    fn apply(
        &mut self,
        action: WorkflowAction,
        actor: &str,
        note: Option<String>,
    ) -> Result<&WorkflowEvent, WorkflowError> {
        let from = self.status;
        let to = transition(from, action)?;
        self.status = to;
        self.history.push(WorkflowEvent {
            action,
            from,
            to,
            actor: actor.to_string(),
            note,
            at: Utc::now(),
        });
        Ok(&self.history[self.history.len() - 1])
    }
}
