//! Subscription provisioning.
//!
//! One request creates (or reuses) a Stripe customer, opens a subscription
//! for the chosen plan, mints an API key and applies the plan's entitlements
//! to it. Payment is confirmed client-side afterwards; a failed payment
//! arrives later as a webhook and suspends the key.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use awards_core::{key_hash, mint_key_secret, Domain, LimitUpdate, NewApiKey, PlanDefinition};

use crate::error::ApiError;
use crate::state::AppState;

/// Provisioning request. `price_id` takes precedence over `plan` when both
/// are present.
#[derive(Debug, Deserialize)]
pub struct CreateSubscriptionRequest {
    /// Subscriber email.
    pub email: String,
    /// Subscriber name.
    pub name: String,
    /// Purchasable plan key (`film_starter_monthly`, ...).
    #[serde(default)]
    pub plan: Option<String>,
    /// Stripe price id, as an alternative to `plan`.
    #[serde(default)]
    pub price_id: Option<String>,
}

/// Provisioning response. `api_key` is the raw secret, returned exactly once.
#[derive(Debug, Serialize)]
pub struct CreateSubscriptionResponse {
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
    /// Stripe subscription id.
    pub subscription_id: String,
    /// Stripe customer id.
    pub customer_id: String,
    /// Subscription status as reported by Stripe.
    pub status: String,
    /// Payment intent client secret for browser-side confirmation, when
    /// Stripe returned one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
}

/// Provision a subscription and its API key (`POST /v1/subscriptions`).
pub async fn create_subscription(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateSubscriptionRequest>,
) -> Result<Json<CreateSubscriptionResponse>, ApiError> {
    let stripe = state
        .stripe
        .as_ref()
        .ok_or_else(|| ApiError::BillingProvider("Stripe is not configured".into()))?;

    if request.email.trim().is_empty() {
        return Err(ApiError::BadRequest("email is required".into()));
    }

    // Resolve the plan before any side effect; an unknown plan must leave no
    // trace in Stripe or the store.
    let plan = resolve_plan(&state, &request)?.clone();
    let price_id = plan
        .price_id
        .clone()
        .ok_or_else(|| ApiError::InvalidPlan("plan has no price".into()))?;

    // Idempotent customer resolution: repeated requests for one email reuse
    // the same Stripe customer.
    let customer = match stripe.find_customer_by_email(&request.email).await? {
        Some(existing) => {
            tracing::info!(customer_id = %existing.id, "Reusing existing Stripe customer");
            existing
        }
        None => {
            let domains_label = plan
                .domains
                .iter()
                .map(|d| d.as_str())
                .collect::<Vec<_>>()
                .join(",");
            stripe
                .create_customer(&request.email, &request.name, plan.tier.as_str(), &domains_label)
                .await?
        }
    };

    let subscription = stripe.create_subscription(&customer.id, &price_id).await?;

    let client_secret = subscription
        .latest_invoice
        .as_ref()
        .and_then(|invoice| invoice.payment_intent.as_ref())
        .and_then(|intent| intent.client_secret.clone());

    // Mint the key, then apply entitlements and billing linkage in one
    // statement.
    let secret = mint_key_secret();
    let minted = state
        .store
        .insert_api_key(&NewApiKey {
            key_hash: key_hash(&secret),
            email: request.email.clone(),
            tier: plan.tier,
            domains: plan.domains.clone(),
            daily_limit: plan.daily_limit,
            monthly_limit: plan.monthly_limit,
            notes: plan
                .plan_key
                .as_ref()
                .map(|key| format!("provisioned via {key}")),
        })
        .await?;

    let update = LimitUpdate {
        tier: plan.tier,
        domains: plan.domains.clone(),
        daily_limit: plan.daily_limit,
        monthly_limit: plan.monthly_limit,
        stripe_customer_id: Some(customer.id.clone()),
        stripe_subscription_id: Some(subscription.id.clone()),
    };

    let key = match state
        .store
        .update_api_key_limits(&minted.key_hash, &update)
        .await
    {
        Ok(key) => key,
        Err(err) => {
            // The key row exists without billing linkage; the ids below are
            // everything an operator needs to reconcile it.
            tracing::error!(
                error = %err,
                key_id = %minted.id,
                customer_id = %customer.id,
                subscription_id = %subscription.id,
                "Key minted but entitlements not applied"
            );
            return Err(err.into());
        }
    };

    tracing::info!(
        key_id = %key.id,
        customer_id = %customer.id,
        subscription_id = %subscription.id,
        tier = %key.tier,
        "Subscription provisioned"
    );

    Ok(Json(CreateSubscriptionResponse {
        api_key: secret,
        tier: key.tier.to_string(),
        domains: key.domains,
        daily_limit: key.daily_limit,
        monthly_limit: key.monthly_limit,
        subscription_id: subscription.id,
        customer_id: customer.id,
        status: subscription.status,
        client_secret,
    }))
}

/// Resolve the requested plan strictly: only currently purchasable plans are
/// accepted, and the rejection lists what is for sale.
fn resolve_plan<'a>(
    state: &'a AppState,
    request: &CreateSubscriptionRequest,
) -> Result<&'a PlanDefinition, ApiError> {
    let resolved = if let Some(price_id) = request.price_id.as_deref() {
        state.registry.purchasable_by_price_id(price_id)
    } else if let Some(plan_key) = request.plan.as_deref() {
        state.registry.by_plan_key(plan_key)
    } else {
        None
    };

    resolved.ok_or_else(|| {
        ApiError::InvalidPlan(format!(
            "unknown plan; available plans: {}",
            state.registry.plan_keys().join(", ")
        ))
    })
}
