//! API error types and responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use awards_core::Domain;

use crate::stripe::StripeError;

/// Which quota window was exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuotaScope {
    /// Daily ceiling reached.
    Daily,
    /// Monthly ceiling reached.
    Monthly,
}

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// No API key supplied on a metered endpoint.
    #[error("missing API key")]
    MissingKey,

    /// Key not found (or malformed).
    #[error("invalid API key")]
    InvalidKey,

    /// Key exists but is suspended for payment failure.
    #[error("key suspended")]
    Suspended,

    /// Key exists but its plan does not cover the requested dataset.
    #[error("plan does not cover this dataset")]
    DomainNotAuthorized {
        /// Datasets the key's plan does cover.
        allowed: Vec<Domain>,
    },

    /// Daily or monthly quota exhausted.
    #[error("quota exceeded")]
    QuotaExceeded {
        /// Which window was exhausted.
        scope: QuotaScope,
    },

    /// Unknown or unpurchasable plan key at checkout.
    #[error("invalid plan: {0}")]
    InvalidPlan(String),

    /// Webhook signature verification failed.
    #[error("signature verification failed")]
    SignatureVerification,

    /// Bad request - invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Billing provider call failed.
    #[error("billing provider error: {0}")]
    BillingProvider(String),

    /// Storage layer failure.
    #[error("internal error: {0}")]
    Persistence(String),
}

/// JSON error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl ApiError {
    /// Response payload pieces for this error.
    fn parts(&self) -> (StatusCode, &'static str, String, Option<serde_json::Value>) {
        match self {
            Self::MissingKey => (
                StatusCode::UNAUTHORIZED,
                "missing_key",
                self.to_string(),
                None,
            ),
            Self::InvalidKey => (
                StatusCode::UNAUTHORIZED,
                "invalid_key",
                self.to_string(),
                None,
            ),
            Self::Suspended => (
                StatusCode::FORBIDDEN,
                "suspended",
                "key suspended; update your payment method to restore access".to_string(),
                None,
            ),
            Self::DomainNotAuthorized { allowed } => (
                StatusCode::FORBIDDEN,
                "domain_not_authorized",
                self.to_string(),
                Some(serde_json::json!({ "allowed_domains": allowed })),
            ),
            Self::QuotaExceeded { scope } => (
                StatusCode::TOO_MANY_REQUESTS,
                "quota_exceeded",
                self.to_string(),
                Some(serde_json::json!({ "scope": scope })),
            ),
            Self::InvalidPlan(msg) => (StatusCode::BAD_REQUEST, "invalid_plan", msg.clone(), None),
            Self::SignatureVerification => (
                StatusCode::BAD_REQUEST,
                "signature_verification_failed",
                self.to_string(),
                None,
            ),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone(), None),
            Self::BillingProvider(msg) => (
                StatusCode::BAD_GATEWAY,
                "billing_provider_error",
                msg.clone(),
                None,
            ),
            Self::Persistence(msg) => {
                tracing::error!(error = %msg, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        }
    }

    /// HTTP status this error maps to, without building a response.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.parts().0
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = self.parts();

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message,
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<awards_store::StoreError> for ApiError {
    fn from(err: awards_store::StoreError) -> Self {
        match err {
            awards_store::StoreError::NotFound => Self::InvalidKey,
            awards_store::StoreError::Database(msg) => Self::Persistence(msg),
        }
    }
}

impl From<StripeError> for ApiError {
    fn from(err: StripeError) -> Self {
        match err {
            StripeError::InvalidSignature => Self::SignatureVerification,
            other => Self::BillingProvider(other.to_string()),
        }
    }
}
