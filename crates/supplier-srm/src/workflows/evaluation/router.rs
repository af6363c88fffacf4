use std::io::Cursor;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::aggregate::{NewEvaluation, PerformanceEvaluation};
use super::domain::{EvaluationNumber, ItemId};
use super::grade::Grade;
use super::item::NewEvaluationItem;
use super::report::EvaluationSummary;
use super::repository::{EvaluationRepository, RepositoryError, ReviewNotifier};
use super::service::{EvaluationService, EvaluationServiceError};
use super::workflow::WorkflowError;

type SharedService<R, N> = Arc<EvaluationService<R, N>>;

#[derive(Debug, Deserialize)]
pub(crate) struct RecordScoreRequest {
    pub(crate) overall_score: f64,
}

/// Omitting `grade` derives it from the recorded score.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct AssignGradeRequest {
    #[serde(default)]
    pub(crate) grade: Option<Grade>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ActorRequest {
    pub(crate) actor: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RejectRequest {
    pub(crate) reviewer: String,
    pub(crate) reason: String,
}

/// Router builder exposing evaluator and reviewer actions as JSON endpoints.
pub fn evaluation_router<R, N>(service: SharedService<R, N>) -> Router
where
    R: EvaluationRepository + 'static,
    N: ReviewNotifier + 'static,
{
    Router::new()
        .route("/api/v1/evaluations", post(create_handler::<R, N>))
        .route("/api/v1/evaluations/:number", get(summary_handler::<R, N>))
        .route(
            "/api/v1/evaluations/:number/items",
            post(add_item_handler::<R, N>),
        )
        .route(
            "/api/v1/evaluations/:number/items/import",
            post(import_items_handler::<R, N>),
        )
        .route(
            "/api/v1/evaluations/:number/items/:item_id",
            delete(remove_item_handler::<R, N>),
        )
        .route(
            "/api/v1/evaluations/:number/score",
            put(record_score_handler::<R, N>),
        )
        .route(
            "/api/v1/evaluations/:number/grade",
            put(assign_grade_handler::<R, N>),
        )
        .route(
            "/api/v1/evaluations/:number/submit",
            post(submit_handler::<R, N>),
        )
        .route(
            "/api/v1/evaluations/:number/approve",
            post(approve_handler::<R, N>),
        )
        .route(
            "/api/v1/evaluations/:number/reject",
            post(reject_handler::<R, N>),
        )
        .route(
            "/api/v1/suppliers/:supplier_id/evaluations",
            get(supplier_evaluations_handler::<R, N>),
        )
        .with_state(service)
}

pub(crate) fn error_response(error: EvaluationServiceError) -> Response {
    let status = match &error {
        EvaluationServiceError::Validation(_)
        | EvaluationServiceError::Item(_)
        | EvaluationServiceError::Import(_)
        | EvaluationServiceError::Workflow(WorkflowError::MissingRejectionReason) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        EvaluationServiceError::Workflow(_)
        | EvaluationServiceError::DuplicateItem { .. }
        | EvaluationServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        EvaluationServiceError::ItemNotFound { .. }
        | EvaluationServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        EvaluationServiceError::Repository(RepositoryError::Unavailable(_))
        | EvaluationServiceError::Notification(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let payload = json!({ "error": error.to_string() });
    (status, Json(payload)).into_response()
}

fn summary_response<R, N>(
    service: &EvaluationService<R, N>,
    status: StatusCode,
    evaluation: &PerformanceEvaluation,
) -> Response
where
    R: EvaluationRepository + 'static,
    N: ReviewNotifier + 'static,
{
    let summary = EvaluationSummary::build(evaluation, service.scoring().reconciliation_tolerance);
    (status, Json(summary)).into_response()
}

fn respond<R, N>(
    service: &EvaluationService<R, N>,
    result: Result<PerformanceEvaluation, EvaluationServiceError>,
) -> Response
where
    R: EvaluationRepository + 'static,
    N: ReviewNotifier + 'static,
{
    match result {
        Ok(evaluation) => summary_response(service, StatusCode::OK, &evaluation),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn create_handler<R, N>(
    State(service): State<SharedService<R, N>>,
    Json(new): Json<NewEvaluation>,
) -> Response
where
    R: EvaluationRepository + 'static,
    N: ReviewNotifier + 'static,
{
    match service.create(new) {
        Ok(evaluation) => summary_response(&service, StatusCode::CREATED, &evaluation),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn summary_handler<R, N>(
    State(service): State<SharedService<R, N>>,
    Path(number): Path<String>,
) -> Response
where
    R: EvaluationRepository + 'static,
    N: ReviewNotifier + 'static,
{
    match service.summary(&EvaluationNumber(number)) {
        Ok(summary) => (StatusCode::OK, Json(summary)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn add_item_handler<R, N>(
    State(service): State<SharedService<R, N>>,
    Path(number): Path<String>,
    Json(new_item): Json<NewEvaluationItem>,
) -> Response
where
    R: EvaluationRepository + 'static,
    N: ReviewNotifier + 'static,
{
    match service.add_item(&EvaluationNumber(number), new_item) {
        Ok(item) => (StatusCode::CREATED, Json(item)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn import_items_handler<R, N>(
    State(service): State<SharedService<R, N>>,
    Path(number): Path<String>,
    body: String,
) -> Response
where
    R: EvaluationRepository + 'static,
    N: ReviewNotifier + 'static,
{
    let number = EvaluationNumber(number);
    match service.import_items(&number, Cursor::new(body.into_bytes())) {
        Ok(added) => {
            let payload = json!({ "evaluation_number": number, "imported": added });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn remove_item_handler<R, N>(
    State(service): State<SharedService<R, N>>,
    Path((number, item_id)): Path<(String, u64)>,
) -> Response
where
    R: EvaluationRepository + 'static,
    N: ReviewNotifier + 'static,
{
    match service.remove_item(&EvaluationNumber(number), ItemId(item_id)) {
        Ok(item) => (StatusCode::OK, Json(item)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn record_score_handler<R, N>(
    State(service): State<SharedService<R, N>>,
    Path(number): Path<String>,
    Json(request): Json<RecordScoreRequest>,
) -> Response
where
    R: EvaluationRepository + 'static,
    N: ReviewNotifier + 'static,
{
    let result = service.record_score(&EvaluationNumber(number), request.overall_score);
    respond(&service, result)
}

pub(crate) async fn assign_grade_handler<R, N>(
    State(service): State<SharedService<R, N>>,
    Path(number): Path<String>,
    Json(request): Json<AssignGradeRequest>,
) -> Response
where
    R: EvaluationRepository + 'static,
    N: ReviewNotifier + 'static,
{
    let number = EvaluationNumber(number);
    let result = match request.grade {
        Some(grade) => service.assign_grade(&number, grade),
        None => service
            .derive_grade(&number)
            .and_then(|_| service.get(&number)),
    };
    respond(&service, result)
}

pub(crate) async fn submit_handler<R, N>(
    State(service): State<SharedService<R, N>>,
    Path(number): Path<String>,
    Json(request): Json<ActorRequest>,
) -> Response
where
    R: EvaluationRepository + 'static,
    N: ReviewNotifier + 'static,
{
    let result = service.submit_for_review(&EvaluationNumber(number), &request.actor);
    respond(&service, result)
}

pub(crate) async fn approve_handler<R, N>(
    State(service): State<SharedService<R, N>>,
    Path(number): Path<String>,
    Json(request): Json<ActorRequest>,
) -> Response
where
    R: EvaluationRepository + 'static,
    N: ReviewNotifier + 'static,
{
    let result = service.approve(&EvaluationNumber(number), &request.actor);
    respond(&service, result)
}

pub(crate) async fn reject_handler<R, N>(
    State(service): State<SharedService<R, N>>,
    Path(number): Path<String>,
    Json(request): Json<RejectRequest>,
) -> Response
where
    R: EvaluationRepository + 'static,
    N: ReviewNotifier + 'static,
{
    let result = service.reject(
        &EvaluationNumber(number),
        &request.reviewer,
        &request.reason,
    );
    respond(&service, result)
}

pub(crate) async fn supplier_evaluations_handler<R, N>(
    State(service): State<SharedService<R, N>>,
    Path(supplier_id): Path<String>,
) -> Response
where
    R: EvaluationRepository + 'static,
    N: ReviewNotifier + 'static,
{
    match service.list_for_supplier(&supplier_id) {
        Ok(evaluations) => {
            let tolerance = service.scoring().reconciliation_tolerance;
            let summaries: Vec<EvaluationSummary> = evaluations
                .iter()
                .map(|evaluation| EvaluationSummary::build(evaluation, tolerance))
                .collect();
            (StatusCode::OK, Json(summaries)).into_response()
        }
        Err(error) => error_response(error),
    }
}
