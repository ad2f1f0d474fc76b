use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use prize_engine::LedgerError;
use thiserror::Error;

use crate::delivery::DeliveryError;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("Voucher has no remaining games")]
    NoRemainingGames,
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Gone(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NoRemainingGames => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Gone(_) => StatusCode::GONE,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "detail": self.to_string() }).to_string())
    }
}

impl From<LedgerError> for ServerError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::DatabaseError(e) => Self::BackendError(format!("Database error: {e}")),
            LedgerError::VoucherIdNotFound(_) | LedgerError::VoucherNotFound(_) => Self::NotFound(e.to_string()),
            LedgerError::NoRemainingGames => Self::NoRemainingGames,
            LedgerError::VoucherUnassigned(_) => Self::Conflict(e.to_string()),
            LedgerError::CodeSpaceExhausted => Self::BackendError(e.to_string()),
            LedgerError::NoPrizesAvailable | LedgerError::PrizeJustRanOut => Self::Conflict(e.to_string()),
            LedgerError::PrizeAlreadyExists(_) => Self::Conflict(e.to_string()),
            LedgerError::InvalidPrizeName(_) => Self::BadRequest(e.to_string()),
            LedgerError::PrizeNotFound(_) => Self::NotFound(e.to_string()),
            LedgerError::MessageRecordNotFound(_) => Self::NotFound(e.to_string()),
        }
    }
}

impl From<DeliveryError> for ServerError {
    fn from(e: DeliveryError) -> Self {
        Self::BackendError(e.to_string())
    }
}
