//! Storage layer for the awards data API.
//!
//! All durable state lives here: API key rows, the append-only usage log,
//! and the read-only awards dataset. Two backends implement the same
//! [`Store`] trait:
//!
//! - [`PgStore`]: PostgreSQL via `sqlx`, the production backend
//! - [`MemoryStore`]: in-memory maps with identical semantics, for tests
//!
//! # Quota atomicity
//!
//! [`Store::consume_quota`] is a single conditional increment: it bumps both
//! usage counters only while each is below its ceiling and returns the
//! post-increment row. There is no separate check-then-act window, so
//! `daily_used <= daily_limit` and `monthly_used <= monthly_limit` hold under
//! any concurrent call pattern.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod memory;
pub mod postgres;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use postgres::{PgStore, MIGRATOR};

use awards_core::{
    ApiKey, LimitUpdate, NewApiKey, NewUsageRecord, NominationPage, NominationQuery, PlanUpdate,
};

/// The storage trait defining all database operations.
#[async_trait::async_trait]
pub trait Store: Send + Sync {
    // =========================================================================
    // Key Store
    // =========================================================================

    /// Insert a new API key row. Counters start at zero.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn insert_api_key(&self, new_key: &NewApiKey) -> Result<ApiKey>;

    /// Load a key row by the hash of its secret.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn get_api_key_by_hash(&self, key_hash: &str) -> Result<Option<ApiKey>>;

    /// Apply tier, limits and billing linkage to one key in a single
    /// statement.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if no row matches the hash.
    async fn update_api_key_limits(&self, key_hash: &str, update: &LimitUpdate) -> Result<ApiKey>;

    /// Apply absolute plan state to every key owned by a Stripe customer.
    ///
    /// One bulk conditional statement, so a failure never leaves the
    /// customer's keys partially updated. Returns the number of rows touched.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn update_keys_by_customer(&self, customer_id: &str, update: &PlanUpdate) -> Result<u64>;

    /// Suspend every key owned by a Stripe customer.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn suspend_keys_by_customer(&self, customer_id: &str) -> Result<u64>;

    /// Restore every key owned by a Stripe customer and reset both usage
    /// counters to zero. A billing cycle boundary is the only reset trigger.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn restore_keys_by_customer(&self, customer_id: &str) -> Result<u64>;

    /// Atomically count one call against a key's quotas.
    ///
    /// Returns the post-increment row when the call is within both ceilings,
    /// or `None` when the row is missing or a ceiling has been reached.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn consume_quota(&self, key_hash: &str) -> Result<Option<ApiKey>>;

    // =========================================================================
    // Usage Log
    // =========================================================================

    /// Append one usage record.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails. Callers metering a
    /// live request swallow this error; logging must never fail the request.
    async fn log_usage(&self, record: &NewUsageRecord) -> Result<()>;

    // =========================================================================
    // Dataset
    // =========================================================================

    /// Run a browse query against the awards dataset.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn query_nominations(&self, query: &NominationQuery) -> Result<NominationPage>;
}
