//! outline-server: HTTP front end for the outline pipeline.
//!
//! One processing endpoint (`POST /process`) plus health and catch-all
//! routes. Handlers share only an immutable [`AppState`]; each upload is
//! decoded and processed on the blocking pool.

pub mod config;
pub mod error;
pub mod routes;
pub mod startup;

pub use config::ServerConfig;
pub use error::ApiError;
pub use routes::{AppState, create_app};
pub use startup::StartupStatus;
