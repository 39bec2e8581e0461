//! drivebook - driving-lesson marketplace
//!
//! - REST API (axum) with JWT authentication
//! - SQLite store for users, bookings, reviews, progress and prompt logs
//! - Client session model: booking selection, comparison list, route guard
//! - Chat assistant over an OpenAI-compatible endpoint
//!
//! # Example
//!
//! ```ignore
//! use drivebook::{Assistant, Config, ServerState, Store};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     let store = Store::open(config.database_path()?).await?;
//!     let assistant = Assistant::from_config(&config.assistant);
//!     let app = drivebook::server::router(ServerState::new(config, store, assistant))?;
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:3001").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```

pub mod types;
pub mod models;
pub mod store;
pub mod error;
pub mod config;
pub mod security;
pub mod assistant;
pub mod server;
pub mod session;
pub mod cli;

pub use assistant::Assistant;
pub use config::Config;
pub use error::{ApiError, ApiResult};
pub use server::{start as start_server, ServerState};
pub use session::AppSession;
pub use store::{Store, StoreError};
pub use types::{Role, UserStatus, Vehicle};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get the library info
pub fn info() -> String {
    format!("{} v{} - Driving-lesson marketplace", NAME, VERSION)
}
