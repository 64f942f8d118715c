//! Handler errors and their HTTP mapping

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use ussd_core::{Address, CalcError, ChainError, StoreError};

use crate::dto::ApiError;

/// Errors a route handler can end with
#[derive(Debug, Error)]
pub enum RouteError {
    /// A path or query parameter failed validation
    #[error("{0}")]
    Validation(&'static str),

    #[error("{0}")]
    NotFound(&'static str),

    #[error(transparent)]
    Service(#[from] ussd_core::Error),
}

impl From<ChainError> for RouteError {
    fn from(e: ChainError) -> Self {
        Self::Service(e.into())
    }
}

impl From<StoreError> for RouteError {
    fn from(e: StoreError) -> Self {
        Self::Service(e.into())
    }
}

impl From<CalcError> for RouteError {
    fn from(e: CalcError) -> Self {
        Self::Service(e.into())
    }
}

impl RouteError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Service(e) => {
                StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }

    fn body(&self) -> ApiError {
        match self {
            Self::Validation(msg) => ApiError::bad_request(*msg),
            Self::NotFound(msg) => ApiError::not_found(*msg),
            Self::Service(ussd_core::Error::Calc(_)) => {
                ApiError::new("malformed_amount", "Invalid token limit format")
            }
            Self::Service(e) => ApiError::new(e.error_code(), e.to_string()),
        }
    }
}

impl IntoResponse for RouteError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), "request failed: {}", self);
        } else {
            tracing::debug!(status = status.as_u16(), "request rejected: {}", self);
        }
        (status, Json(self.body())).into_response()
    }
}

/// Parse an EIP-55 checksummed, `0x`-prefixed address path segment
pub fn checksummed(value: &str) -> Result<Address, RouteError> {
    if !value.starts_with("0x") {
        return Err(RouteError::Validation("Address validation failed"));
    }
    Address::parse_checksummed(value, None)
        .map_err(|_| RouteError::Validation("Address validation failed"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CUSD: &str = "0x765DE816845861e75A25fCA122bb6898B8B1282a";

    #[test]
    fn test_checksummed_accepts_eip55() {
        let address = checksummed(CUSD).unwrap();
        assert_eq!(address.to_checksum(None), CUSD);
    }

    #[test]
    fn test_checksummed_rejects_wrong_case() {
        assert!(checksummed(&CUSD.to_lowercase()).is_err());
        assert!(checksummed(&CUSD[2..]).is_err());
        assert!(checksummed("0x1234").is_err());
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            RouteError::Validation("Address validation failed").status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            RouteError::NotFound("Pool not found").status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            RouteError::from(ChainError::Timeout { secs: 10 }).status(),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            RouteError::from(ChainError::Cancelled).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );

        let malformed = RouteError::from(CalcError::MalformedAmount {
            field: "inTokenLimit",
            value: "12x".into(),
        });
        assert_eq!(malformed.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(malformed.body().description, "Invalid token limit format");
    }
}
