//! Core types for the awards data API.
//!
//! This crate provides the foundational types used throughout the platform:
//!
//! - **Entitlements**: `Tier`, `Domain`, `PlanDefinition`, `PlanRegistry`
//! - **Keys**: `ApiKey` and the update descriptors applied by billing events
//! - **Metering**: `UsageRecord`
//! - **Dataset**: `Nomination` and the browse query types
//!
//! # Entitlement model
//!
//! Every API key carries a tier, an allowed-domain set and daily/monthly call
//! quotas. All three are derived from a `PlanDefinition`, and the
//! `PlanRegistry` is the single source of truth mapping a Stripe price id (or
//! an internal plan key) to a definition. The subscription provisioner and the
//! webhook handler both resolve through the same registry, so the same price
//! always yields the same entitlements.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod awards;
pub mod error;
pub mod key;
pub mod plan;
pub mod tier;
pub mod usage;

pub use awards::{
    Nomination, NominationPage, NominationPerson, NominationQuery, NominationSort,
    BROWSE_DEFAULT_LIMIT, BROWSE_MAX_LIMIT,
};
pub use error::PlanConfigError;
pub use key::{key_hash, mint_key_secret, ApiKey, LimitUpdate, NewApiKey, PlanUpdate};
pub use plan::{PlanDefinition, PlanRegistry, PriceTable};
pub use tier::{Domain, Tier};
pub use usage::{NewUsageRecord, UsageRecord};
