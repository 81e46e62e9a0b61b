use crate::cli::ServeArgs;
use crate::infra::AppState;
use crate::routes::with_wizard_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use recruiter::config::AppConfig;
use recruiter::error::AppError;
use recruiter::telemetry;
use recruiter::workflows::application::{MemoryStorage, SessionStore, WizardService};
use std::sync::atomic::Ordering;
use std::sync::Arc;
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

    let storage = Arc::new(MemoryStorage::new());
    let service = Arc::new(WizardService::new(
        storage,
        config.wizard.default_language,
    ));
    let sessions = Arc::new(SessionStore::with_idle_timeout(
        config.wizard.session_idle,
    ));

    let app = with_wizard_routes(service, sessions, &config.wizard)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        default_language = %config.wizard.default_language,
        max_upload_bytes = config.wizard.max_upload_bytes,
        session_idle_secs = config.wizard.session_idle.as_secs(),
        "recruiter application wizard ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
