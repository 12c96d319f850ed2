//! HTTP surface for the hit-counter badge service.
//!
//! # Responsibility
//! - Map badge and stats routes onto `hitbadge_core` store calls.
//! - Render SVG badges and JSON stats documents.
//! - Parse process flags and bootstrap logging, storage and the listener.

pub mod badge;
pub mod config;
pub mod error;
pub mod routes;
pub mod server;

pub use config::ServerArgs;
pub use error::{ApiError, ServerError};
pub use routes::{router, AppState};
pub use server::run;
