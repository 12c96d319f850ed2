//! Error types for process startup and per-request failures.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use hitbadge_core::StoreError;
use serde_json::json;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::net::SocketAddr;

/// Fatal startup or serve-loop failure. Ends the process.
#[derive(Debug)]
pub enum ServerError {
    Logging(String),
    Store(StoreError),
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },
    Serve(std::io::Error),
}

impl Display for ServerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Logging(message) => write!(f, "failed to initialize logging: {message}"),
            Self::Store(err) => write!(f, "{err}"),
            Self::Bind { addr, source } => write!(f, "failed to bind {addr}: {source}"),
            Self::Serve(err) => write!(f, "server error: {err}"),
        }
    }
}

impl Error for ServerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Logging(_) => None,
            Self::Store(err) => Some(err),
            Self::Bind { source, .. } => Some(source),
            Self::Serve(err) => Some(err),
        }
    }
}

impl From<StoreError> for ServerError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Per-request failure, rendered as HTTP 500 with a JSON body.
#[derive(Debug)]
pub enum ApiError {
    Store(StoreError),
    /// The blocking storage task panicked or was cancelled.
    Task(String),
}

impl ApiError {
    pub fn message(&self) -> String {
        match self {
            Self::Store(err) => err.to_string(),
            Self::Task(message) => format!("storage task failed: {message}"),
        }
    }
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl Error for ApiError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::Task(_) => None,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": self.message() })),
        )
            .into_response()
    }
}
