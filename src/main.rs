//! PTZ Camserver - ONVIF PTZ camera control
//!
//! Main entry point for the Camserver application.

use ptz_camserver::{
    discovery::{select_address, DiscoveryProbe},
    onvif::OnvifConnector,
    ptz_controller::{DeviceSession, MotionDispatcher},
    state::{AppConfig, AppState},
    web_api,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ptz_camserver=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting PTZ Camserver v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = AppConfig::from_env()?;
    tracing::info!(
        invert_x = config.axis.invert_x,
        invert_y = config.axis.invert_y,
        zero_azimuth = config.axis.zero_azimuth,
        prefer_static = config.axis.prefer_static_address,
        emulate_timeout = config.axis.emulate_absolute_timeout,
        static_address = ?config.static_address,
        "Configuration loaded"
    );

    // Discovery (failure is not fatal, static address may still be usable)
    let discovered = match DiscoveryProbe::new(config.discovery_timeout).discover().await {
        Ok(devices) => devices,
        Err(e) => {
            tracing::error!(error = %e, "Camera discovery failed");
            Vec::new()
        }
    };

    // Session
    let connector = Arc::new(OnvifConnector::new(config.device_timeout));
    let session = Arc::new(DeviceSession::new(connector));
    let dispatcher = Arc::new(MotionDispatcher::new(Arc::clone(&session), config.axis));

    match select_address(
        &discovered,
        config.static_address.as_deref(),
        config.axis.prefer_static_address,
    ) {
        Ok(address) => {
            // Failure is logged by the session and leaves it Faulted
            if let Ok(caps) = session.initialize(&address, &config.credentials).await {
                tracing::info!(address = %address, capabilities = ?caps, "Camera ready");
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "No camera address to initialize");
        }
    }

    let state = AppState::new(dispatcher, discovered);

    let app = web_api::create_router(state)
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
