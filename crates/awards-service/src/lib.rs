//! Awards data gateway HTTP API.
//!
//! This crate provides the HTTP surface of the awards data platform:
//!
//! - Subscription provisioning (Stripe customer + subscription + API key)
//! - Stripe billing webhooks that keep key entitlements in sync
//! - Metered, key-gated browse endpoints over the awards dataset
//!
//! # Authentication
//!
//! - **Subscriber API keys** - `x-api-key` header or `apikey` query param on
//!   the browse endpoints; the `demo` sentinel allows unauthenticated
//!   sampling.
//! - **Admin key** - `x-admin-key` header for administrative key minting.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Allow some pedantic lints that are noisy for Axum handler functions
#![allow(clippy::missing_errors_doc)] // Axum handlers all return Result
#![allow(clippy::unused_async)] // Handlers need async for consistency

pub mod auth;
pub mod config;
pub mod crypto;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;
pub mod stripe;
pub mod validate;

pub use config::ServiceConfig;
pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
pub use stripe::{StripeClient, StripeError};
