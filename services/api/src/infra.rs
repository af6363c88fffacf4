use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard};
use supplier_srm::workflows::evaluation::{
    EvaluationNumber, EvaluationRepository, NotificationError, PerformanceEvaluation,
    RepositoryError, ReviewNotice, ReviewNotifier,
};
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

type EvaluationTable = HashMap<EvaluationNumber, PerformanceEvaluation>;

#[derive(Default, Clone)]
pub(crate) struct InMemoryEvaluationRepository {
    records: Arc<Mutex<EvaluationTable>>,
}

impl InMemoryEvaluationRepository {
    fn records(&self) -> Result<MutexGuard<'_, EvaluationTable>, RepositoryError> {
        self.records
            .lock()
            .map_err(|_| RepositoryError::Unavailable("repository mutex poisoned".to_string()))
    }
}

impl EvaluationRepository for InMemoryEvaluationRepository {
    fn insert(
        &self,
        evaluation: PerformanceEvaluation,
    ) -> Result<PerformanceEvaluation, RepositoryError> {
        let mut guard = self.records()?;
        if guard.contains_key(evaluation.evaluation_number()) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(evaluation.evaluation_number().clone(), evaluation.clone());
        Ok(evaluation)
    }

    fn update(&self, evaluation: PerformanceEvaluation) -> Result<(), RepositoryError> {
        let mut guard = self.records()?;
        if guard.contains_key(evaluation.evaluation_number()) {
            guard.insert(evaluation.evaluation_number().clone(), evaluation);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    fn fetch(
        &self,
        number: &EvaluationNumber,
    ) -> Result<Option<PerformanceEvaluation>, RepositoryError> {
        Ok(self.records()?.get(number).cloned())
    }

    fn for_supplier(
        &self,
        supplier_id: &str,
    ) -> Result<Vec<PerformanceEvaluation>, RepositoryError> {
        let guard = self.records()?;
        let mut evaluations: Vec<_> = guard
            .values()
            .filter(|evaluation| evaluation.supplier().supplier_id == supplier_id)
            .cloned()
            .collect();
        evaluations.sort_by(|a, b| a.evaluation_number().cmp(b.evaluation_number()));
        Ok(evaluations)
    }
}

/// Keeps every review notice and logs it; stands in for the e-mail or portal channel.
#[derive(Default, Clone)]
pub(crate) struct InMemoryReviewNotifier {
    notices: Arc<Mutex<Vec<ReviewNotice>>>,
}

impl ReviewNotifier for InMemoryReviewNotifier {
    fn publish(&self, notice: ReviewNotice) -> Result<(), NotificationError> {
        info!(
            template = %notice.template,
            evaluation_number = %notice.evaluation_number,
            supplier_id = %notice.supplier_id,
            "review notice published"
        );
        let mut guard = self
            .notices
            .lock()
            .map_err(|_| NotificationError::Transport("notice mutex poisoned".to_string()))?;
        guard.push(notice);
        Ok(())
    }
}

impl InMemoryReviewNotifier {
    pub(crate) fn notices(&self) -> Vec<ReviewNotice> {
        self.notices
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
