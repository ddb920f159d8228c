//! Documentation of a geofenced classroom attendance API.
//!
//! Students mark attendance by sending their roll number and GPS position. The position
//! must be within a fixed radius of the classroom and a teacher must have opened attendance
//! by authenticating first.
//!
//!
//!
//! # Endpoints
//!
//! | Method | Path                           | Body                                   |
//! |--------|--------------------------------|----------------------------------------|
//! | GET    | `/getResults`                  |                                        |
//! | POST   | `/authenticateTeacher`         | `{"password"}`                         |
//! | GET    | `/teacherAuthenticationStatus` |                                        |
//! | POST   | `/markAttendance`              | `{"rollNumber", "latitude", "longitude"}` |
//! | POST   | `/logout`                      |                                        |
//!
//! Failures always answer `{"success": false, "message": "..."}`.
//!
//! - **400** malformed body, blank roll number or impossible coordinates
//! - **403** wrong password, attendance closed, out of range, already marked today
//! - **404** roll number not on the roster
//! - **500** store failure, details only in the server log
//!
//!
//!
//! # Flow
//!
//! - Teacher posts the shared password, the store flips `allowed` on
//! - Students post their position, distance is computed with Haversine against the classroom
//! - Within the radius, the record is created (count 1) or incremented
//! - Same roll number on the same day is rejected unless `ATTENDANCE_ONCE_PER_DAY=false`
//! - Teacher logs out, `allowed` flips off and marks are refused
//!
//!
//!
//! # Configuration
//!
//! | Variable                   | Default                  |
//! |----------------------------|--------------------------|
//! | `RUST_PORT`                | `5000`                   |
//! | `DATABASE`                 | `redis` (or `memory`)    |
//! | `REDIS_URL`                | `redis://127.0.0.1:6379` |
//! | `CLASSROOM_LATITUDE`       | `21.2486`                |
//! | `CLASSROOM_LONGITUDE`      | `81.6094`                |
//! | `ATTENDANCE_RADIUS_METERS` | `10`                     |
//! | `ATTENDANCE_ONCE_PER_DAY`  | `true`                   |
//! | `TEACHER_PASSWORD`         | unset, also read from `/run/secrets/TEACHER_PASSWORD` |
//!
//! Log level follows `RUST_LOG`.
//!
//!
//!
//! # Setup
//!
//! Run against a throwaway store.
//! ```sh
//! DATABASE=memory TEACHER_PASSWORD=chalk RUST_LOG=info cargo run -p attendance
//! ```
//!
//! Seed the roster in Redis.
//! ```sh
//! cargo run -p roster -- import students.txt
//! cargo run -p roster -- password chalk
//! ```
//!
//! View current docs.
//! ```sh
//! cargo doc --open
//! ```
use std::{sync::Arc, time::Duration};

use anyhow::Context;
use axum::{
    Router,
    http::{Method, header::CONTENT_TYPE},
    routing::{get, post},
};

#[cfg(unix)]
use signal::unix::{SignalKind, signal};
use signal::ctrl_c;
use tokio::{net::TcpListener, signal};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};

pub mod attendance;
pub mod config;
pub mod database;
pub mod error;
pub mod models;
pub mod routes;
pub mod state;
pub mod utils;

use config::Config;
use routes::{
    authenticate_handler, logout_handler, mark_attendance_handler, results_handler,
    status_handler,
};
use state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/getResults", get(results_handler))
        .route("/authenticateTeacher", post(authenticate_handler))
        .route("/teacherAuthenticationStatus", get(status_handler))
        .route("/markAttendance", post(mark_attendance_handler))
        .route("/logout", post(logout_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

pub async fn start_server() -> anyhow::Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Loading config...");
    let config = Config::load().context("environment misconfigured")?;

    info!("Initializing state...");
    let state = AppState::new(&config).await?;

    info!("Starting server...");
    let app = router(state);

    let address = format!("0.0.0.0:{}", config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Server shutting down...");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
