use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::NaiveDate;
use serde_json::Value;

use crate::config::ScoringConfig;
use crate::workflows::evaluation::{
    evaluation_router, EvaluationItem, EvaluationNumber, EvaluationRepository, EvaluationService,
    ItemType, NewEvaluation, NotificationError, PerformanceEvaluation, RepositoryError,
    ReviewNotice, ReviewNotifier, SupplierRef,
};

pub(super) const TOLERANCE: f64 = 1e-9;

pub(super) fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < TOLERANCE,
        "expected {expected}, got {actual}"
    );
}

pub(super) fn supplier() -> SupplierRef {
    SupplierRef {
        supplier_id: "SUP-0042".to_string(),
        name: "Northwind Components".to_string(),
    }
}

pub(super) fn evaluation(number: &str) -> PerformanceEvaluation {
    PerformanceEvaluation::new(
        EvaluationNumber(number.to_string()),
        supplier(),
        "Q3 supplier performance review",
    )
    .expect("valid evaluation header")
    .with_period("2025-Q3")
    .with_evaluator("j.alvarez")
    .with_evaluation_date(NaiveDate::from_ymd_opt(2025, 10, 3).expect("valid date"))
}

pub(super) fn item(name: &str, weight: f64, score: f64, max_score: f64) -> EvaluationItem {
    EvaluationItem::new(name, ItemType::Quantitative, weight, score, max_score)
        .expect("valid item")
}

pub(super) fn qualitative_item(name: &str, weight: f64, score: f64) -> EvaluationItem {
    EvaluationItem::new(name, ItemType::Qualitative, weight, score, 10.0).expect("valid item")
}

/// Evaluation whose items weigh 30/30/40 and derive a score of 84.
pub(super) fn balanced_evaluation(number: &str) -> PerformanceEvaluation {
    let mut evaluation = evaluation(number);
    evaluation.add_evaluation_item(item("On-time delivery", 30.0, 90.0, 100.0));
    evaluation.add_evaluation_item(item("Defect rate", 30.0, 80.0, 100.0));
    evaluation.add_evaluation_item(qualitative_item("Responsiveness", 40.0, 8.25));
    evaluation
}

pub(super) fn new_evaluation(number: Option<&str>) -> NewEvaluation {
    NewEvaluation {
        evaluation_number: number.map(str::to_string),
        supplier: supplier(),
        title: "Annual supplier scorecard".to_string(),
        evaluation_period: Some("2025".to_string()),
        evaluator: Some("m.chen".to_string()),
        evaluation_date: NaiveDate::from_ymd_opt(2025, 12, 15),
    }
}

pub(super) fn scoring() -> ScoringConfig {
    ScoringConfig::default()
}

pub(super) fn build_service() -> (
    EvaluationService<MemoryRepository, MemoryNotifier>,
    Arc<MemoryRepository>,
    Arc<MemoryNotifier>,
) {
    build_service_with(scoring())
}

pub(super) fn build_service_with(
    scoring: ScoringConfig,
) -> (
    EvaluationService<MemoryRepository, MemoryNotifier>,
    Arc<MemoryRepository>,
    Arc<MemoryNotifier>,
) {
    let repository = Arc::new(MemoryRepository::default());
    let notifier = Arc::new(MemoryNotifier::default());
    let service = EvaluationService::new(repository.clone(), notifier.clone(), scoring);
    (service, repository, notifier)
}

#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    pub(super) records: Arc<Mutex<HashMap<EvaluationNumber, PerformanceEvaluation>>>,
}

impl EvaluationRepository for MemoryRepository {
    fn insert(
        &self,
        evaluation: PerformanceEvaluation,
    ) -> Result<PerformanceEvaluation, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(evaluation.evaluation_number()) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(evaluation.evaluation_number().clone(), evaluation.clone());
        Ok(evaluation)
    }

    fn update(&self, evaluation: PerformanceEvaluation) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        guard.insert(evaluation.evaluation_number().clone(), evaluation);
        Ok(())
    }

    fn fetch(
        &self,
        number: &EvaluationNumber,
    ) -> Result<Option<PerformanceEvaluation>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(number).cloned())
    }

    fn for_supplier(
        &self,
        supplier_id: &str,
    ) -> Result<Vec<PerformanceEvaluation>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        let mut evaluations: Vec<_> = guard
            .values()
            .filter(|evaluation| evaluation.supplier().supplier_id == supplier_id)
            .cloned()
            .collect();
        evaluations.sort_by(|a, b| a.evaluation_number().cmp(b.evaluation_number()));
        Ok(evaluations)
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryNotifier {
    notices: Arc<Mutex<Vec<ReviewNotice>>>,
}

impl MemoryNotifier {
    pub(super) fn notices(&self) -> Vec<ReviewNotice> {
        self.notices.lock().expect("notifier mutex poisoned").clone()
    }
}

impl ReviewNotifier for MemoryNotifier {
    fn publish(&self, notice: ReviewNotice) -> Result<(), NotificationError> {
        self.notices
            .lock()
            .expect("notifier mutex poisoned")
            .push(notice);
        Ok(())
    }
}

pub(super) struct UnavailableRepository;

impl EvaluationRepository for UnavailableRepository {
    fn insert(
        &self,
        _evaluation: PerformanceEvaluation,
    ) -> Result<PerformanceEvaluation, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update(&self, _evaluation: PerformanceEvaluation) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(
        &self,
        _number: &EvaluationNumber,
    ) -> Result<Option<PerformanceEvaluation>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn for_supplier(
        &self,
        _supplier_id: &str,
    ) -> Result<Vec<PerformanceEvaluation>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) struct OfflineNotifier;

impl ReviewNotifier for OfflineNotifier {
    fn publish(&self, _notice: ReviewNotice) -> Result<(), NotificationError> {
        Err(NotificationError::Transport("smtp relay down".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) fn router_with_service(
    service: EvaluationService<MemoryRepository, MemoryNotifier>,
) -> axum::Router {
    evaluation_router(Arc::new(service))
}
