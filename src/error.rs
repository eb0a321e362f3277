//! Unified application error model and mapping helpers.
//! This module provides the error enum surfaced to every screen of the console,
//! along with helpers to classify HTTP statuses and map back for the mock API.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppError {
    InvalidCredentials { code: String, message: String },
    Unauthorized { code: String, message: String },
    Forbidden { code: String, message: String },
    NotFound { code: String, message: String },
    Conflict { code: String, message: String },
    UserInput { code: String, message: String },
    Server { code: String, message: String },
    Transport { code: String, message: String },
    Storage { code: String, message: String },
    Internal { code: String, message: String },
}

impl AppError {
    pub fn code_str(&self) -> &str {
        match self {
            AppError::InvalidCredentials { code, .. }
            | AppError::Unauthorized { code, .. }
            | AppError::Forbidden { code, .. }
            | AppError::NotFound { code, .. }
            | AppError::Conflict { code, .. }
            | AppError::UserInput { code, .. }
            | AppError::Server { code, .. }
            | AppError::Transport { code, .. }
            | AppError::Storage { code, .. }
            | AppError::Internal { code, .. } => code.as_str(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            AppError::InvalidCredentials { message, .. }
            | AppError::Unauthorized { message, .. }
            | AppError::Forbidden { message, .. }
            | AppError::NotFound { message, .. }
            | AppError::Conflict { message, .. }
            | AppError::UserInput { message, .. }
            | AppError::Server { message, .. }
            | AppError::Transport { message, .. }
            | AppError::Storage { message, .. }
            | AppError::Internal { message, .. } => message.as_str(),
        }
    }

    pub fn invalid_credentials<S: Into<String>>(code: S, msg: S) -> Self { AppError::InvalidCredentials { code: code.into(), message: msg.into() } }
    pub fn unauthorized<S: Into<String>>(code: S, msg: S) -> Self { AppError::Unauthorized { code: code.into(), message: msg.into() } }
    pub fn forbidden<S: Into<String>>(code: S, msg: S) -> Self { AppError::Forbidden { code: code.into(), message: msg.into() } }
    pub fn not_found<S: Into<String>>(code: S, msg: S) -> Self { AppError::NotFound { code: code.into(), message: msg.into() } }
    pub fn conflict<S: Into<String>>(code: S, msg: S) -> Self { AppError::Conflict { code: code.into(), message: msg.into() } }
    pub fn user<S: Into<String>>(code: S, msg: S) -> Self { AppError::UserInput { code: code.into(), message: msg.into() } }
    pub fn server<S: Into<String>>(code: S, msg: S) -> Self { AppError::Server { code: code.into(), message: msg.into() } }
    pub fn transport<S: Into<String>>(code: S, msg: S) -> Self { AppError::Transport { code: code.into(), message: msg.into() } }
    pub fn storage<S: Into<String>>(code: S, msg: S) -> Self { AppError::Storage { code: code.into(), message: msg.into() } }
    pub fn internal<S: Into<String>>(code: S, msg: S) -> Self { AppError::Internal { code: code.into(), message: msg.into() } }

    /// Classify a failed HTTP exchange. Status 0 means the server was never reached.
    pub fn from_status(status: u16, url: &str) -> Self {
        match status {
            0 => AppError::transport("network_error", "Cannot connect to server. Please check if the API is running."),
            401 => AppError::unauthorized("unauthorized", "Unauthorized. Please login again."),
            403 => AppError::forbidden("forbidden", "Access denied. You don't have permission."),
            404 => AppError::NotFound { code: "not_found".into(), message: format!("Resource not found: {}", url) },
            409 => AppError::conflict("conflict", "Resource already exists."),
            400..=499 => AppError::UserInput { code: "bad_request".into(), message: format!("Error {}: request rejected", status) },
            500..=599 => AppError::Server { code: "server_error".into(), message: format!("Server error ({}). Please try again later.", status) },
            other => AppError::Internal { code: "unexpected_status".into(), message: format!("Error {}: unexpected response", other) },
        }
    }

    /// Map to HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            AppError::InvalidCredentials { .. } => 401,
            AppError::Unauthorized { .. } => 401,
            AppError::Forbidden { .. } => 403,
            AppError::NotFound { .. } => 404,
            AppError::Conflict { .. } => 409,
            AppError::UserInput { .. } => 400,
            AppError::Server { .. } => 500,
            AppError::Transport { .. } => 503,
            AppError::Storage { .. } => 500,
            AppError::Internal { .. } => 500,
        }
    }

    /// Text shown to the user on the initiating screen.
    pub fn user_message(&self) -> String {
        match self {
            AppError::InvalidCredentials { .. } => "Login failed. Invalid email or password.".to_string(),
            AppError::Transport { message, .. } => format!("Network Error: {}", message),
            AppError::Server { message, .. } => format!("{} You can retry the action.", message),
            other => other.message().to_string(),
        }
    }

    /// Whether a user may sensibly re-trigger the action. Nothing retries automatically.
    pub fn is_transient(&self) -> bool {
        matches!(self, AppError::Server { .. } | AppError::Transport { .. })
    }
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code_str(), self.message())
    }
}

impl std::error::Error for AppError {}

pub type AppResult<T> = Result<T, AppError>;

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        // Default mapping: treat as Internal unless downcasted elsewhere
        match err.downcast::<AppError>() {
            Ok(app) => app,
            Err(err) => AppError::Internal { code: "internal_error".into(), message: err.to_string() },
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal { code: "decode_error".into(), message: err.to_string() }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Storage { code: "io_error".into(), message: err.to_string() }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return AppError::from_status(status.as_u16(), err.url().map(|u| u.as_str()).unwrap_or(""));
        }
        if err.is_decode() {
            return AppError::Internal { code: "decode_error".into(), message: err.to_string() };
        }
        AppError::Transport { code: "network_error".into(), message: err.to_string() }
    }
}
