//! Documentation of the vote front end.
//!
//! A small HTTP service that records user votes into a shared Redis queue.
//! A separate worker drains the queue and tallies results, so this service
//! only ever appends.
//!
//!
//!
//! # Error Simulation
//!
//! The deployment pipeline runs canary analysis: a new version takes a slice
//! of traffic and an external system watches its error rate, rolling back
//! automatically when it spikes. To exercise that machinery on demand, this
//! service carries a fault injector that can fail a configurable fraction of
//! vote submissions with clearly-labeled synthetic 500s.
//!
//! - `POST /api/error-sim` with `{"action": "enable"|"disable"|"toggle"}`
//!   flips injection; the window closes itself after a configured timeout
//! - `GET /api/error-sim` reports the current window and its counters
//! - `/health` is never affected, only vote submissions are failed
//!
//!
//!
//! # Routes
//!
//! - `GET /` — vote options plus current injection state, sets `voter_id`
//! - `POST /` — form-encoded `vote=<option>`, appended to the queue
//! - `GET /health` — liveness, always 200
//!
//!
//!
//! # Configuration
//!
//! Everything comes from the environment at startup: `RUST_PORT`,
//! `REDIS_URL`, `OPTION_A`/`OPTION_B`, and the `ERROR_SIM_*` knobs
//! (see [`config`]). A malformed error rate refuses to start the process.
use std::time::Duration;

use axum::{
    http::{header::CONTENT_TYPE, Method},
    routing::get,
    Router,
};

use signal::{
    ctrl_c,
    unix::{signal, SignalKind},
};
use tokio::{net::TcpListener, signal};
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

pub mod config;
pub mod database;
pub mod error;
pub mod fault;
pub mod routes;
pub mod state;
pub mod utils;

use routes::{
    fault_control_handler, fault_status_handler, health_handler, index_handler, vote_handler,
};
use state::State;

pub async fn start_server() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Initializing state...");
    let state = State::new().await;

    info!("Starting server...");

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    let app = Router::new()
        .route("/", get(index_handler).post(vote_handler))
        .route(
            "/api/error-sim",
            get(fault_status_handler).post(fault_control_handler),
        )
        .route("/health", get(health_handler))
        .layer(cors)
        .with_state(state.clone());

    let address = format!("0.0.0.0:{}", state.config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address).await.unwrap();
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap();

    println!("Server shutting down...");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        ctrl_c().await.expect("Failed to install Ctrl+C handler");

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        signal(SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;

        info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
