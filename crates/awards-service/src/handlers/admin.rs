//! Administrative key minting.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use awards_core::{key_hash, mint_key_secret, Domain, NewApiKey};

use crate::auth::AdminAuth;
use crate::error::ApiError;
use crate::state::AppState;

/// Admin minting request. Without a plan the key gets the free sampling
/// entitlements.
#[derive(Debug, Deserialize)]
pub struct CreateKeyRequest {
    /// Owner email.
    pub email: String,
    /// Purchasable plan key to mirror, if any.
    #[serde(default)]
    pub plan: Option<String>,
    /// Provenance note.
    #[serde(default)]
    pub notes: Option<String>,
}

/// Admin minting response. `api_key` is the raw secret, returned exactly
/// once.
#[derive(Debug, Serialize)]
pub struct CreateKeyResponse {
    /// The minted key secret.
    pub api_key: String,
    /// Granted tier label.
    pub tier: String,
    /// Authorized dataset domains.
    pub domains: Vec<Domain>,
    /// Daily call ceiling.
    pub daily_limit: i64,
    /// Monthly call ceiling.
    pub monthly_limit: i64,
}

/// Mint a key without touching Stripe (`POST /v1/admin/keys`).
pub async fn create_key(
    State(state): State<Arc<AppState>>,
    _auth: AdminAuth,
    Json(request): Json<CreateKeyRequest>,
) -> Result<Json<CreateKeyResponse>, ApiError> {
    if request.email.trim().is_empty() {
        return Err(ApiError::BadRequest("email is required".into()));
    }

    let plan = match request.plan.as_deref() {
        Some(plan_key) => state.registry.by_plan_key(plan_key).ok_or_else(|| {
            ApiError::InvalidPlan(format!(
                "unknown plan; available plans: {}",
                state.registry.plan_keys().join(", ")
            ))
        })?,
        None => state.registry.free(),
    }
    .clone();

    let secret = mint_key_secret();
    let key = state
        .store
        .insert_api_key(&NewApiKey {
            key_hash: key_hash(&secret),
            email: request.email,
            tier: plan.tier,
            domains: plan.domains,
            daily_limit: plan.daily_limit,
            monthly_limit: plan.monthly_limit,
            notes: request.notes.or(Some("minted by admin".into())),
        })
        .await?;

    tracing::info!(key_id = %key.id, tier = %key.tier, "Admin key minted");

    Ok(Json(CreateKeyResponse {
        api_key: secret,
        tier: key.tier.to_string(),
        domains: key.domains,
        daily_limit: key.daily_limit,
        monthly_limit: key.monthly_limit,
    }))
}
