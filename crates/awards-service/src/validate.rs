//! Request validation for the metered browse endpoints.
//!
//! Maps a presented API key (or its absence) to an authorization outcome for
//! one dataset domain, in a fixed checking order:
//!
//! 1. `demo` sentinel - always allowed, never metered or logged
//! 2. missing key - rejected, unless the operator enabled `dev_mode`
//! 3. unknown key hash - rejected
//! 4. suspended key - rejected (billing problem outranks the domain check)
//! 5. domain not covered by the plan - rejected, carrying the allowed set
//! 6. quota - one atomic increment against both counters; a reached ceiling
//!    rejects the call outright

use awards_core::{key_hash, ApiKey, Domain};

use crate::error::{ApiError, QuotaScope};
use crate::state::AppState;

/// Sentinel key that allows unauthenticated sampling of the dataset.
pub const DEMO_KEY: &str = "demo";

/// The outcome of a successful authorization.
#[derive(Debug, Clone)]
pub struct Authorization {
    /// The key row after the quota increment. `None` for the demo sentinel
    /// and dev-mode passes, which bypass persistence entirely.
    pub key: Option<ApiKey>,
}

impl Authorization {
    /// Whether this request should produce a usage record.
    #[must_use]
    pub fn metered(&self) -> bool {
        self.key.is_some()
    }
}

/// Authorize one browse request against a dataset domain.
///
/// On success the returned key row (if any) reflects post-increment usage
/// counters.
///
/// # Errors
///
/// Returns the first failing check in the order documented on this module.
pub async fn authorize(
    state: &AppState,
    presented: Option<&str>,
    domain: Domain,
) -> Result<Authorization, ApiError> {
    let presented = presented.map(str::trim).filter(|s| !s.is_empty());

    if presented == Some(DEMO_KEY) {
        return Ok(Authorization { key: None });
    }

    let Some(secret) = presented else {
        if state.config.dev_mode {
            tracing::debug!("dev mode: allowing unauthenticated request");
            return Ok(Authorization { key: None });
        }
        return Err(ApiError::MissingKey);
    };

    let hash = key_hash(secret);

    let key = state
        .store
        .get_api_key_by_hash(&hash)
        .await?
        .ok_or(ApiError::InvalidKey)?;

    if key.suspended {
        return Err(ApiError::Suspended);
    }

    if !key.allows_domain(domain) {
        return Err(ApiError::DomainNotAuthorized {
            allowed: key.domains.clone(),
        });
    }

    match state.store.consume_quota(&hash).await? {
        Some(updated) => Ok(Authorization { key: Some(updated) }),
        None => {
            // Re-read: a concurrent call may have taken the last unit after
            // the row was loaded above, so the scope must come from the row
            // as it stood at rejection time.
            let row = state.store.get_api_key_by_hash(&hash).await?.unwrap_or(key);
            let scope = if row.daily_exhausted() {
                QuotaScope::Daily
            } else {
                QuotaScope::Monthly
            };
            Err(ApiError::QuotaExceeded { scope })
        }
    }
}
