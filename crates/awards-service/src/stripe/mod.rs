//! Stripe integration for subscription billing.
//!
//! Stripe handles:
//! - Customer registration (idempotent lookup by email)
//! - Subscription creation for purchasable plans
//! - Webhook events driving entitlement state

pub mod client;
pub mod types;

pub use client::StripeClient;
pub use client::StripeError;
pub use client::DEFAULT_API_BASE;
pub use types::*;
