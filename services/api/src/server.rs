use crate::cli::ServeArgs;
use crate::demo::seed_campus;
use crate::infra::{
    load_catalog, AppState, BroadcastNotifier, InMemoryActivityRepository,
    InMemoryBadgeRepository,
};
use crate::routes::with_engagement_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use peve::config::AppConfig;
use peve::engagement::EngagementService;
use peve::error::AppError;
use peve::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

const NOTIFICATION_BUFFER: usize = 256;

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

    let catalog = load_catalog(&config.engagement)?;
    let notifier = BroadcastNotifier::new(NOTIFICATION_BUFFER);
    spawn_notification_log(&notifier);

    let activity = Arc::new(InMemoryActivityRepository::default());
    if args.seed_demo {
        seed_campus(&activity);
        info!("activity store seeded with the demo campus");
    }

    let engagement_service = Arc::new(EngagementService::new(
        activity,
        Arc::new(InMemoryBadgeRepository::new(catalog)),
        Arc::new(notifier),
        config.engagement.clone(),
    ));

    let app = with_engagement_routes(engagement_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "peve engagement service ready");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Keep one listener attached so realtime events are traced even before any
/// client subscribes.
fn spawn_notification_log(notifier: &BroadcastNotifier) {
    let mut receiver = notifier.subscribe();
    tokio::spawn(async move {
        loop {
            match receiver.recv().await {
                Ok(event) => debug!(
                    user_id = %event.user_id,
                    badge = %event.badge.key,
                    emitted_at = %event.emitted_at,
                    "badge_earned event dispatched"
                ),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "notification log fell behind");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });
}
