//! API handlers.

pub mod admin;
pub mod awards;
pub mod health;
pub mod subscriptions;
pub mod webhooks;
