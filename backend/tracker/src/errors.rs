//! Application-wide error types and their HTTP rendering.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chain_rpc::RpcError;
use thiserror::Error;
use tracing::warn;

use crate::notify::Notification;

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{0}")]
    Rpc(#[from] RpcError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Could not decode contract response: {0}")]
    Decode(String),

    #[error("No wallet provider found. Configure WALLET_RPC_URL to connect a wallet")]
    WalletUnavailable,

    #[error("Wallet exposed no accounts")]
    NoAccounts,

    #[error("Please connect your wallet first")]
    NotConnected,

    #[error("Another transaction is pending")]
    Busy,

    #[error("{0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, TrackerError>;

impl TrackerError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::NotConnected => StatusCode::UNAUTHORIZED,
            Self::Rpc(RpcError::UserRejected) => StatusCode::FORBIDDEN,
            Self::Busy => StatusCode::CONFLICT,
            Self::Rpc(e) if e.is_revert() => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Rpc(_) | Self::Http(_) | Self::Decode(_) | Self::NoAccounts => {
                StatusCode::BAD_GATEWAY
            }
            Self::WalletUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::Database(_) | Self::Migrate(_) | Self::Config(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for TrackerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        warn!(status = status.as_u16(), "Request failed: {self}");
        (status, Json(Notification::error(self.to_string()))).into_response()
    }
}
