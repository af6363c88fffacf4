use chrono::NaiveDate;
use serde::Serialize;

use super::aggregate::{PerformanceEvaluation, TARGET_WEIGHT_TOTAL};
use super::domain::{EvaluationNumber, EvaluationStatus, ItemId, ItemType, SupplierRef};
use super::grade::Grade;
use super::workflow::WorkflowEvent;

/// Per-item line in an evaluation summary.
#[derive(Debug, Clone, Serialize)]
pub struct ItemBreakdown {
    pub item_id: ItemId,
    pub item_name: String,
    pub item_type: ItemType,
    pub item_type_label: &'static str,
    pub weight: f64,
    pub score: f64,
    pub max_score: f64,
    pub weighted_score: f64,
    pub score_percentage: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

/// Read model handed to reporting collaborators.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationSummary {
    pub evaluation_number: EvaluationNumber,
    pub title: String,
    pub supplier: SupplierRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evaluation_period: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evaluator: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evaluation_date: Option<NaiveDate>,
    pub status: EvaluationStatus,
    pub status_label: &'static str,
    pub editable: bool,
    pub recorded_score: f64,
    pub derived_score: f64,
    pub score_variance: f64,
    pub scores_reconciled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_grade: Option<Grade>,
    pub calculated_grade: Grade,
    pub calculated_grade_label: &'static str,
    pub total_weight: f64,
    pub weights_consistent: bool,
    pub weight_message: String,
    pub quantitative_items: usize,
    pub qualitative_items: usize,
    pub items: Vec<ItemBreakdown>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<WorkflowEvent>,
}

impl EvaluationSummary {
    pub fn build(evaluation: &PerformanceEvaluation, reconciliation_tolerance: f64) -> Self {
        let calculated_grade = evaluation.calculate_grade();
        let items = evaluation
            .items()
            .iter()
            .map(|item| ItemBreakdown {
                item_id: item.id(),
                item_name: item.item_name().to_string(),
                item_type: item.item_type(),
                item_type_label: item.item_type().label(),
                weight: item.weight(),
                score: item.score(),
                max_score: item.max_score(),
                weighted_score: item.weighted_score(),
                score_percentage: item.score_percentage(),
                unit: item.unit().map(str::to_string),
            })
            .collect();

        Self {
            evaluation_number: evaluation.evaluation_number().clone(),
            title: evaluation.title().to_string(),
            supplier: evaluation.supplier().clone(),
            evaluation_period: evaluation.evaluation_period().map(str::to_string),
            evaluator: evaluation.evaluator().map(str::to_string),
            evaluation_date: evaluation.evaluation_date(),
            status: evaluation.status(),
            status_label: evaluation.status().label(),
            editable: evaluation.is_editable(),
            recorded_score: evaluation.overall_score(),
            derived_score: evaluation.calculate_actual_score(),
            score_variance: evaluation.score_variance(),
            scores_reconciled: evaluation.is_score_consistent(reconciliation_tolerance),
            assigned_grade: evaluation.grade(),
            calculated_grade,
            calculated_grade_label: calculated_grade.label(),
            total_weight: evaluation.total_weight(),
            weights_consistent: evaluation.validate_weights_total(),
            weight_message: weight_message(evaluation),
            quantitative_items: evaluation.quantitative_items().count(),
            qualitative_items: evaluation.qualitative_items().count(),
            items,
            history: evaluation.history().to_vec(),
        }
    }
}

/// One-line weight status, e.g. `Weight total: 100%, consistent`.
pub fn weight_message(evaluation: &PerformanceEvaluation) -> String {
    if evaluation.items().is_empty() {
        return "Weight total: 0%, no evaluation items".to_string();
    }

    let total = evaluation.total_weight();
    let verdict = if evaluation.validate_weights_total() {
        "consistent".to_string()
    } else {
        format!("inconsistent (expected {TARGET_WEIGHT_TOTAL:.0}%)")
    };
    format!("Weight total: {}%, {verdict}", format_percent(total))
}

fn format_percent(value: f64) -> String {
    if (value - value.round()).abs() < 0.005 {
        format!("{:.0}", value.round())
    } else {
        format!("{value:.2}")
    }
}
