use crate::cli::ServeArgs;
use crate::infra::{seed_store, AppState, CommandConverter, HttpGeocoder};
use crate::routes::with_market_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use sublet_market::config::AppConfig;
use sublet_market::error::AppError;
use sublet_market::marketplace::contract::{DocumentConverter, IdentityConverter, DEFAULT_TEMPLATE};
use sublet_market::marketplace::geocode::{Geocoder, NoGeocoder};
use sublet_market::marketplace::import;
use sublet_market::marketplace::router::{Collaborators, MarketState};
use sublet_market::marketplace::store::InMemoryStore;
use sublet_market::telemetry;
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

    let store = Arc::new(InMemoryStore::new());
    if let Some(seed) = args.seed.take() {
        let listings = import::from_path(&seed)?;
        seed_store(store.as_ref(), listings)
            .map_err(|err| AppError::Io(std::io::Error::other(err.to_string())))?;
    }

    let geocoder: Arc<dyn Geocoder> = match config.geocoder.url.clone() {
        Some(url) => Arc::new(HttpGeocoder::new(url, config.geocoder.api_key.clone())),
        None => Arc::new(NoGeocoder),
    };
    let converter: Arc<dyn DocumentConverter> = match config.contracts.convert_command.clone() {
        Some(program) => Arc::new(CommandConverter::new(
            program,
            Duration::from_secs(config.contracts.convert_timeout_secs),
        )),
        None => Arc::new(IdentityConverter),
    };
    let contract_template = match config.contracts.template_path.as_ref() {
        Some(path) => tokio::fs::read(path).await?,
        None => DEFAULT_TEMPLATE.as_bytes().to_vec(),
    };

    let collaborators = Collaborators {
        geocoder,
        converter,
        contract_template,
        ..Collaborators::default()
    };
    let market_state = Arc::new(MarketState::new(store, collaborators));

    let app = with_market_routes(market_state)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "sublease marketplace ready");

    axum::serve(listener, app).await?;
    Ok(())
}
