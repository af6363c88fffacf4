use super::common::*;
use crate::workflows::evaluation::report::weight_message;
use crate::workflows::evaluation::{
    EvaluationNumber, EvaluationSummary, EvaluationValidationError, Grade, PerformanceEvaluation,
};

#[test]
fn empty_evaluation_has_zero_scores_and_invalid_weights() {
    let evaluation = evaluation("PE-EMPTY");

    assert_eq!(evaluation.calculate_actual_score(), 0.0);
    assert_eq!(evaluation.total_weight(), 0.0);
    assert!(evaluation.calculate_actual_score().is_sign_positive());
    assert!(evaluation.total_weight().is_sign_positive());
    assert!(!evaluation.validate_weights_total());
    assert!(!evaluation.is_completed());
    assert_eq!(evaluation.grade(), None);
}

#[test]
fn weights_totalling_one_hundred_validate() {
    let mut evaluation = evaluation("PE-W100");
    evaluation.add_evaluation_item(item("Delivery", 30.0, 1.0, 1.0));
    evaluation.add_evaluation_item(item("Quality", 30.0, 1.0, 1.0));
    evaluation.add_evaluation_item(item("Cost", 40.0, 1.0, 1.0));

    assert!(evaluation.validate_weights_total());
}

#[test]
fn weights_short_of_one_hundred_fail_validation() {
    let mut evaluation = evaluation("PE-W90");
    evaluation.add_evaluation_item(item("Delivery", 30.0, 1.0, 1.0));
    evaluation.add_evaluation_item(item("Quality", 30.0, 1.0, 1.0));
    evaluation.add_evaluation_item(item("Cost", 30.0, 1.0, 1.0));

    assert!(!evaluation.validate_weights_total());
}

#[test]
fn weight_total_tolerates_rounding_noise_only() {
    let mut thirds = evaluation("PE-THIRDS");
    for name in ["Delivery", "Quality", "Cost"] {
        thirds.add_evaluation_item(item(name, 33.333, 1.0, 1.0));
    }
    // 99.999 is within 0.01 of 100
    assert!(thirds.validate_weights_total());

    let mut off = evaluation("PE-OFF");
    off.add_evaluation_item(item("Delivery", 50.0, 1.0, 1.0));
    off.add_evaluation_item(item("Quality", 49.98, 1.0, 1.0));
    assert!(!off.validate_weights_total());
}

#[test]
fn total_weight_sums_partial_breakdowns() {
    let mut evaluation = evaluation("PE-PARTIAL");
    evaluation.add_evaluation_item(item("Price stability", 25.0, 85.0, 90.0));
    evaluation.add_evaluation_item(item("Lead time", 30.0, 90.0, 85.0));

    assert_close(evaluation.total_weight(), 55.0);
    assert!(!evaluation.validate_weights_total());
}

#[test]
fn actual_score_sums_weighted_contributions() {
    let evaluation = balanced_evaluation("PE-SUM");

    assert_close(evaluation.calculate_actual_score(), 84.0);
    assert_close(evaluation.total_weight(), 100.0);
}

#[test]
fn adding_the_same_item_twice_keeps_one_membership() {
    let mut evaluation = evaluation("PE-IDEMPOTENT");
    let item = item("Delivery", 40.0, 1.0, 1.0);

    assert!(evaluation.add_evaluation_item(item.clone()));
    assert!(!evaluation.add_evaluation_item(item.clone()));

    assert_eq!(evaluation.items().len(), 1);
    assert_close(evaluation.total_weight(), 40.0);
}

#[test]
fn membership_maintains_the_back_reference() {
    let mut evaluation = evaluation("PE-BACKREF");
    let item = item("Delivery", 40.0, 1.0, 1.0);
    let id = item.id();
    assert!(item.evaluation().is_none());

    evaluation.add_evaluation_item(item);
    let held = evaluation.item(id).expect("item held");
    assert_eq!(
        held.evaluation(),
        Some(&EvaluationNumber("PE-BACKREF".to_string()))
    );

    let removed = evaluation.remove_evaluation_item(id).expect("item removed");
    assert!(removed.evaluation().is_none());
    assert!(evaluation.items().is_empty());
    assert!(evaluation.remove_evaluation_item(id).is_none());
}

#[test]
fn type_views_partition_without_mutating() {
    let evaluation = balanced_evaluation("PE-VIEWS");

    let quantitative: Vec<_> = evaluation
        .quantitative_items()
        .map(|item| item.item_name())
        .collect();
    let qualitative: Vec<_> = evaluation
        .qualitative_items()
        .map(|item| item.item_name())
        .collect();

    assert_eq!(quantitative, vec!["On-time delivery", "Defect rate"]);
    assert_eq!(qualitative, vec!["Responsiveness"]);
    assert_eq!(evaluation.items().len(), 3);
}

#[test]
fn grade_is_calculated_from_the_recorded_score() {
    let mut evaluation = evaluation("PE-GRADE");

    evaluation.record_overall_score(92.0).expect("valid score");
    assert_eq!(evaluation.calculate_grade(), Grade::A);

    evaluation.record_overall_score(55.0).expect("valid score");
    assert_eq!(evaluation.calculate_grade(), Grade::E);
}

#[test]
fn grade_ignores_the_derived_score() {
    let mut evaluation = balanced_evaluation("PE-TWO-TRACK");
    evaluation.record_overall_score(61.0).expect("valid score");

    assert_close(evaluation.calculate_actual_score(), 84.0);
    assert_eq!(evaluation.calculate_grade(), Grade::D);
}

#[test]
fn manual_grade_may_diverge_until_derived() {
    let mut evaluation = evaluation("PE-MANUAL");
    evaluation.record_overall_score(72.5).expect("valid score");

    evaluation.assign_grade(Grade::B);
    assert_eq!(evaluation.grade(), Some(Grade::B));

    assert_eq!(evaluation.derive_grade(), Grade::C);
    assert_eq!(evaluation.grade(), Some(Grade::C));
}

#[test]
fn recorded_score_must_stay_within_zero_and_one_hundred() {
    let mut evaluation = evaluation("PE-RANGE");

    assert_eq!(
        evaluation.record_overall_score(100.5),
        Err(EvaluationValidationError::ScoreOutOfRange { found: 100.5 })
    );
    assert!(evaluation.record_overall_score(-0.1).is_err());
    assert!(evaluation.record_overall_score(f64::NAN).is_err());
    assert_eq!(evaluation.overall_score(), 0.0);

    evaluation.record_overall_score(100.0).expect("upper bound inclusive");
    evaluation.record_overall_score(0.0).expect("lower bound inclusive");
}

#[test]
fn reconciliation_compares_recorded_and_derived_scores() {
    let mut evaluation = balanced_evaluation("PE-RECONCILE");

    evaluation.record_overall_score(84.0).expect("valid score");
    assert!(evaluation.is_score_consistent(0.01));

    evaluation.record_overall_score(80.0).expect("valid score");
    assert_close(evaluation.score_variance(), -4.0);
    assert!(!evaluation.is_score_consistent(0.01));
    assert!(evaluation.is_score_consistent(5.0));
}

#[test]
fn header_requires_number_and_title() {
    assert_eq!(
        PerformanceEvaluation::new(EvaluationNumber(" ".to_string()), supplier(), "Review"),
        Err(EvaluationValidationError::EmptyNumber)
    );
    assert_eq!(
        PerformanceEvaluation::new(EvaluationNumber("PE-1".to_string()), supplier(), ""),
        Err(EvaluationValidationError::EmptyTitle)
    );
}

#[test]
fn from_new_prefers_the_caller_number() {
    let assigned = PerformanceEvaluation::from_new(new_evaluation(Some(" PE-EXT-7 ")), || {
        EvaluationNumber("unused".to_string())
    })
    .expect("valid header");
    assert_eq!(assigned.evaluation_number().as_str(), "PE-EXT-7");
    assert_eq!(assigned.evaluator(), Some("m.chen"));

    let generated = PerformanceEvaluation::from_new(new_evaluation(None), || {
        EvaluationNumber("PE-GEN".to_string())
    })
    .expect("valid header");
    assert_eq!(generated.evaluation_number().as_str(), "PE-GEN");
}

#[test]
fn weight_message_reports_consistency() {
    assert_eq!(
        weight_message(&balanced_evaluation("PE-MSG")),
        "Weight total: 100%, consistent"
    );

    let mut partial = evaluation("PE-MSG-PARTIAL");
    partial.add_evaluation_item(item("Delivery", 55.0, 1.0, 1.0));
    assert_eq!(
        weight_message(&partial),
        "Weight total: 55%, inconsistent (expected 100%)"
    );

    assert_eq!(
        weight_message(&evaluation("PE-MSG-EMPTY")),
        "Weight total: 0%, no evaluation items"
    );
}

#[test]
fn summary_exposes_item_breakdown() {
    let mut evaluation = balanced_evaluation("PE-SUMMARY");
    evaluation.record_overall_score(84.0).expect("valid score");

    let summary = EvaluationSummary::build(&evaluation, 0.01);

    assert_eq!(summary.status_label, "draft");
    assert!(summary.editable);
    assert!(summary.weights_consistent);
    assert!(summary.scores_reconciled);
    assert_eq!(summary.calculated_grade, Grade::B);
    assert_eq!(summary.quantitative_items, 2);
    assert_eq!(summary.qualitative_items, 1);
    assert_eq!(summary.items.len(), 3);
    assert_close(summary.items[0].weighted_score, 27.0);
    assert_close(summary.items[0].score_percentage, 90.0);
    assert_eq!(summary.items[2].item_type_label, "qualitative");

    let json = serde_json::to_value(&summary).expect("summary serializes");
    assert_eq!(json["status"], "draft");
    assert_eq!(json["calculated_grade"], "B");
    assert!(json.get("history").is_none());
}

#[test]
fn stored_evaluation_round_trips_through_serde() {
    let mut evaluation = balanced_evaluation("PE-STORE");
    evaluation.record_overall_score(84.0).expect("valid score");
    evaluation.submit_for_review("j.alvarez").expect("draft submits");

    let json = serde_json::to_string(&evaluation).expect("serializes");
    let restored: PerformanceEvaluation = serde_json::from_str(&json).expect("deserializes");

    assert_eq!(restored, evaluation);
    assert!(!restored.is_editable());
}

#[test]
fn empty_breakdown_reports_positive_zero_totals() {
    let evaluation = evaluation("PE-EMPTY-JSON");
    let summary = EvaluationSummary::build(&evaluation, 0.01);
    let payload = serde_json::to_value(&summary).expect("summary serializes");

    assert_eq!(payload["total_weight"].to_string(), "0.0");
    assert_eq!(payload["derived_score"].to_string(), "0.0");
    assert_eq!(summary.weight_message, "Weight total: 0%, no evaluation items");
}
