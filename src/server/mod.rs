//! REST API server with JWT authentication

pub mod auth;
pub mod bookings;
pub mod catalog;
pub mod chat;
pub mod http;
pub mod learning;
pub mod users;

use anyhow::{Context, Result};
use axum::{
    http::HeaderValue,
    middleware,
    routing::{get, post, put},
    Router,
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::assistant::Assistant;
use crate::config::Config;
use crate::server::auth::{AuthConfig, AuthState};
use crate::store::Store;

const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Shared server state
#[derive(Clone)]
pub struct ServerState {
    pub config: Arc<Config>,
    pub store: Store,
    pub auth_state: Arc<AuthState>,
    pub assistant: Arc<Assistant>,
}

impl ServerState {
    pub fn new(config: Config, store: Store, assistant: Assistant) -> Self {
        let auth_config = AuthConfig {
            jwt_secret: config
                .auth
                .jwt_secret
                .clone()
                .unwrap_or_else(auth::generate_jwt_secret),
            access_token_expiry_minutes: config.auth.access_token_expiry_minutes,
            max_login_attempts: config.auth.max_login_attempts,
            lockout_duration_minutes: config.auth.lockout_duration_minutes,
        };

        Self {
            config: Arc::new(config),
            store,
            auth_state: AuthState::new(auth_config),
            assistant: Arc::new(assistant),
        }
    }
}

fn cors_layer(config: &Config) -> Result<CorsLayer> {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    match &config.server.cors_origin {
        Some(origin) => {
            let origin: HeaderValue = origin
                .parse()
                .with_context(|| format!("Invalid CORS origin: {}", origin))?;
            Ok(cors.allow_origin(origin))
        }
        None => Ok(cors.allow_origin(Any)),
    }
}

/// Build the API router
pub fn router(state: ServerState) -> Result<Router> {
    let cors = cors_layer(&state.config)?;

    // Protected routes (require JWT auth)
    let protected = Router::new()
        .route("/api/auth/logout", post(http::logout_handler))
        .route("/api/users", get(users::list_users))
        .route(
            "/api/users/{id}",
            get(users::get_user).put(users::update_user).delete(users::delete_user),
        )
        .route("/api/users/{id}/status", put(users::set_user_status))
        .route("/api/bookings", post(bookings::create_booking))
        .route("/api/bookings/all", get(bookings::all_bookings))
        .route("/api/bookings/user/{id}", get(bookings::learner_bookings))
        .route("/api/bookings/instructor/{id}", get(bookings::instructor_bookings))
        .route("/api/bookings/{id}", axum::routing::delete(bookings::delete_booking))
        .route("/api/bookings/{id}/status", put(bookings::update_status))
        .route("/api/bookings/{id}/accept", put(bookings::accept_booking))
        .route("/api/bookings/{id}/reject", put(bookings::reject_booking))
        .route("/api/reviews", post(learning::create_review))
        .route("/api/progress", post(learning::update_progress))
        .route("/api/progress/{id}", get(learning::get_progress))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::auth_middleware));

    // Public routes (no auth required)
    let public = Router::new()
        .route("/api/auth/register", post(http::register_handler))
        .route("/api/auth/login", post(http::login_handler))
        .route("/api/status", get(http::status_handler))
        .route("/api/instructors", get(catalog::list_instructors))
        .route("/api/instructors/{id}", get(catalog::get_instructor))
        .route("/api/instructors/{id}/reviews", get(catalog::instructor_reviews))
        .route("/api/learners", get(catalog::list_learners))
        .route("/api/packages", get(catalog::list_packages))
        .route("/api/chat", post(chat::chat_handler))
        .route("/api/prompts", post(chat::log_prompt));

    Ok(Router::new()
        .merge(protected)
        .merge(public)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

/// Start the web server
pub async fn start(config: Config, https: bool, cert: Option<PathBuf>, key: Option<PathBuf>) -> Result<()> {
    let database = config.database_path()?;
    let store = if database.as_os_str() == ":memory:" {
        Store::open_in_memory()?
    } else {
        Store::open(&database).await?
    };
    let assistant = Assistant::from_config(&config.assistant);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid listen address")?;
    let state = ServerState::new(config, store, assistant);
    let assistant_configured = state.assistant.is_configured();
    let app = router(state)?;

    println!("drivebook {}", crate::VERSION);
    println!("  database   {}", database.display());
    println!(
        "  assistant  {}",
        if assistant_configured { "configured" } else { "no API key" }
    );
    println!("  listening  http{}://{}", if https { "s" } else { "" }, addr);
    info!("Server starting on {}", addr);

    if https {
        let (Some(cert_path), Some(key_path)) = (cert, key) else {
            anyhow::bail!("HTTPS requires both --cert and --key");
        };
        let cert_data = tokio::fs::read(&cert_path)
            .await
            .context("Failed to read certificate file")?;
        let key_data = tokio::fs::read(&key_path)
            .await
            .context("Failed to read key file")?;

        let tls = axum_server::tls_rustls::RustlsConfig::from_pem(cert_data, key_data).await?;
        axum_server::bind_rustls(addr, tls)
            .serve(app.into_make_service())
            .await?;
        return Ok(());
    }

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await?;
    Ok(())
}
