use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryEvaluationRepository, InMemoryReviewNotifier};
use crate::routes::with_evaluation_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use supplier_srm::config::AppConfig;
use supplier_srm::error::AppError;
use supplier_srm::telemetry;
use supplier_srm::workflows::evaluation::EvaluationService;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let repository = Arc::new(InMemoryEvaluationRepository::default());
    let notifier = Arc::new(InMemoryReviewNotifier::default());
    let evaluation_service = Arc::new(EvaluationService::new(
        repository,
        notifier,
        config.scoring.clone(),
    ));

    let app = with_evaluation_routes(evaluation_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        require_consistent_weights = config.scoring.require_consistent_weights,
        "supplier evaluation service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
