//! Authentication extractors.
//!
//! Subscriber API keys on the browse endpoints are handled in
//! [`crate::validate`]; this module covers the administrative surface.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::ApiError;
use crate::state::AppState;

/// Administrative authentication via the `x-admin-key` header.
///
/// Used for operator endpoints (manual key minting). Rejected outright when
/// no admin key is configured.
#[derive(Debug, Clone)]
pub struct AdminAuth;

impl FromRequestParts<Arc<AppState>> for AdminAuth {
    type Rejection = ApiError;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut Parts,
        state: &'life1 Arc<AppState>,
    ) -> ::core::pin::Pin<
        Box<
            dyn ::core::future::Future<Output = Result<Self, Self::Rejection>>
                + ::core::marker::Send
                + 'async_trait,
        >,
    >
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        Box::pin(async move {
            let presented = parts
                .headers
                .get("x-admin-key")
                .and_then(|v| v.to_str().ok())
                .ok_or(ApiError::MissingKey)?;

            let expected = state
                .config
                .admin_api_key
                .as_ref()
                .ok_or(ApiError::InvalidKey)?;

            if presented != expected {
                return Err(ApiError::InvalidKey);
            }

            Ok(AdminAuth)
        })
    }
}
