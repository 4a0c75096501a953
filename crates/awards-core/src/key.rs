//! API keys and the update descriptors applied to them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::plan::PlanDefinition;
use crate::tier::{Domain, Tier};

/// Prefix for minted key secrets.
const KEY_PREFIX: &str = "aw_";

/// Mint a new opaque key secret.
///
/// The secret is returned to the subscriber exactly once at provisioning
/// time; only its hash is ever persisted.
#[must_use]
pub fn mint_key_secret() -> String {
    format!("{KEY_PREFIX}{}", Uuid::new_v4().simple())
}

/// SHA-256 digest of a key secret, hex-encoded.
///
/// This is the only representation of a secret the store ever sees.
#[must_use]
pub fn key_hash(secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

/// A persisted API key row.
///
/// Rows are never physically deleted; billing lifecycle events only suspend
/// them or downgrade them to the free tier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiKey {
    /// Row id.
    pub id: Uuid,
    /// Hex SHA-256 of the key secret.
    pub key_hash: String,
    /// Owner email.
    pub email: String,
    /// Current tier.
    pub tier: Tier,
    /// Dataset domains this key is authorized against.
    pub domains: Vec<Domain>,
    /// Daily call ceiling.
    pub daily_limit: i64,
    /// Monthly call ceiling.
    pub monthly_limit: i64,
    /// Calls counted against the daily ceiling.
    pub daily_used: i64,
    /// Calls counted against the monthly ceiling.
    pub monthly_used: i64,
    /// Whether access is blocked pending billing resolution.
    pub suspended: bool,
    /// Stripe customer owning this key, if billed.
    pub stripe_customer_id: Option<String>,
    /// Stripe subscription backing this key, if billed.
    pub stripe_subscription_id: Option<String>,
    /// Provenance note.
    pub notes: Option<String>,
    /// When the row was created.
    pub created_at: DateTime<Utc>,
    /// When the row was last updated.
    pub updated_at: DateTime<Utc>,
}

impl ApiKey {
    /// Whether the key authorizes the given domain.
    #[must_use]
    pub fn allows_domain(&self, domain: Domain) -> bool {
        self.domains.contains(&domain)
    }

    /// Whether the daily ceiling has been reached.
    #[must_use]
    pub fn daily_exhausted(&self) -> bool {
        self.daily_used >= self.daily_limit
    }

    /// Whether the monthly ceiling has been reached.
    #[must_use]
    pub fn monthly_exhausted(&self) -> bool {
        self.monthly_used >= self.monthly_limit
    }
}

/// Fields for inserting a new key row. Counters start at zero.
#[derive(Debug, Clone)]
pub struct NewApiKey {
    /// Hex SHA-256 of the minted secret.
    pub key_hash: String,
    /// Owner email.
    pub email: String,
    /// Initial tier.
    pub tier: Tier,
    /// Initial domain set.
    pub domains: Vec<Domain>,
    /// Daily ceiling.
    pub daily_limit: i64,
    /// Monthly ceiling.
    pub monthly_limit: i64,
    /// Provenance note.
    pub notes: Option<String>,
}

/// Tier, limits and billing linkage applied to a single key.
///
/// The provisioner applies this in one statement after minting a key so the
/// row never exists with limits but no linkage, or vice versa.
#[derive(Debug, Clone)]
pub struct LimitUpdate {
    /// Tier to apply.
    pub tier: Tier,
    /// Domain set to apply.
    pub domains: Vec<Domain>,
    /// Daily ceiling to apply.
    pub daily_limit: i64,
    /// Monthly ceiling to apply.
    pub monthly_limit: i64,
    /// Stripe customer to link.
    pub stripe_customer_id: Option<String>,
    /// Stripe subscription to link.
    pub stripe_subscription_id: Option<String>,
}

/// Absolute entitlement state fanned out to every key a Stripe customer owns.
///
/// Carries absolute values rather than deltas so re-applying the same billing
/// event is a no-op in effect.
#[derive(Debug, Clone)]
pub struct PlanUpdate {
    /// Tier to apply.
    pub tier: Tier,
    /// Domain set to apply.
    pub domains: Vec<Domain>,
    /// Daily ceiling to apply.
    pub daily_limit: i64,
    /// Monthly ceiling to apply.
    pub monthly_limit: i64,
    /// Whether to clear the subscription linkage (cancellation).
    pub clear_subscription: bool,
}

impl PlanUpdate {
    /// Build the fan-out update from a resolved plan definition.
    #[must_use]
    pub fn from_plan(plan: &PlanDefinition, clear_subscription: bool) -> Self {
        Self {
            tier: plan.tier,
            domains: plan.domains.clone(),
            daily_limit: plan.daily_limit,
            monthly_limit: plan.monthly_limit,
            clear_subscription,
        }
    }
}
