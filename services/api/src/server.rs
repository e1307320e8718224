use crate::cli::ServeArgs;
use crate::infra::{AppState, StaticApproverDirectory};
use crate::routes::with_lifecycle_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tqm_lifecycle::config::AppConfig;
use tqm_lifecycle::error::AppError;
use tqm_lifecycle::lifecycle::{ApproverDirectory, LifecycleSettings};
use tqm_lifecycle::telemetry;
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
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let settings = LifecycleSettings::from(&config.closure);
    let approvers: Option<Arc<dyn ApproverDirectory>> = if config.closure.approvers.is_empty() {
        None
    } else {
        Some(Arc::new(StaticApproverDirectory::new(
            config.closure.approvers.iter().cloned(),
        )))
    };
    let app = with_lifecycle_routes(settings, approvers)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        strict_capa_closure = settings.strict_capa_closure,
        closure_approvers = config.closure.approvers.len(),
        "lifecycle engine ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
