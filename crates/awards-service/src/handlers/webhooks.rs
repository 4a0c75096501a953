//! Stripe billing webhooks.
//!
//! Every handled event applies absolute entitlement state to all keys owned
//! by the event's customer, so at-least-once delivery and reordering are
//! harmless: re-applying the same event is a no-op in effect.

use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};

use awards_core::PlanUpdate;

use crate::crypto::verify_stripe_signature;
use crate::error::ApiError;
use crate::state::AppState;

/// Stripe webhook payload (simplified).
#[derive(Debug, Deserialize)]
pub struct StripeWebhook {
    /// Event type.
    #[serde(rename = "type")]
    pub event_type: String,
    /// Event ID.
    pub id: String,
    /// Event data.
    pub data: StripeEventData,
}

/// Stripe event data container.
#[derive(Debug, Deserialize)]
pub struct StripeEventData {
    /// Event object.
    pub object: serde_json::Value,
}

/// Webhook response.
#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    /// Whether the webhook was processed.
    pub received: bool,
}

/// Handle Stripe webhooks (`POST /webhooks/stripe`).
pub async fn stripe_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<WebhookResponse>, ApiError> {
    // Signature verification comes before any parsing-driven state change.
    if let Some(secret) = &state.config.stripe_webhook_secret {
        let signature = headers
            .get("stripe-signature")
            .and_then(|v| v.to_str().ok())
            .ok_or(ApiError::SignatureVerification)?;

        verify_stripe_signature(secret, &body, signature).map_err(|err| {
            tracing::warn!(error = %err, "Invalid Stripe webhook signature");
            ApiError::SignatureVerification
        })?;
    } else {
        // Development mode only
        tracing::warn!("Webhook secret not configured - skipping signature verification");
    }

    let webhook: StripeWebhook =
        serde_json::from_str(&body).map_err(|e| ApiError::BadRequest(e.to_string()))?;

    tracing::info!(
        event_type = %webhook.event_type,
        event_id = %webhook.id,
        "Received Stripe webhook"
    );

    match webhook.event_type.as_str() {
        "customer.subscription.deleted" => {
            handle_subscription_deleted(&state, &webhook.data.object).await?;
        }
        "customer.subscription.updated" => {
            handle_subscription_updated(&state, &webhook.data.object).await?;
        }
        "invoice.payment_failed" => {
            handle_payment_failed(&state, &webhook.data.object).await?;
        }
        "invoice.payment_succeeded" => {
            handle_payment_succeeded(&state, &webhook.data.object).await?;
        }
        _ => {
            // Acknowledged so Stripe does not retry kinds we never handle.
            tracing::debug!(event_type = %webhook.event_type, "Unhandled Stripe event");
        }
    }

    Ok(Json(WebhookResponse { received: true }))
}

/// The customer id every handled event carries on its object.
fn customer_id(data: &serde_json::Value) -> Result<&str, ApiError> {
    data.get("customer")
        .and_then(|v| v.as_str())
        .ok_or_else(|| ApiError::BadRequest("Missing customer on event object".into()))
}

/// Cancellation: every key drops to the free tier and loses its subscription
/// linkage. The row survives for sampling-level access.
async fn handle_subscription_deleted(
    state: &AppState,
    data: &serde_json::Value,
) -> Result<(), ApiError> {
    let customer = customer_id(data)?;

    let update = PlanUpdate::from_plan(state.registry.free(), true);
    let touched = state
        .store
        .update_keys_by_customer(customer, &update)
        .await?;

    tracing::info!(
        customer_id = %customer,
        keys_updated = %touched,
        "Subscription cancelled, keys downgraded to free"
    );

    Ok(())
}

/// Upgrade/downgrade: the subscription's current price resolves to the new
/// entitlements. An unrecognized price resolves to free, never upward.
async fn handle_subscription_updated(
    state: &AppState,
    data: &serde_json::Value,
) -> Result<(), ApiError> {
    let customer = customer_id(data)?;

    let price_id = data
        .get("items")
        .and_then(|items| items.get("data"))
        .and_then(|rows| rows.get(0))
        .and_then(|row| row.get("price"))
        .and_then(|price| price.get("id"))
        .and_then(|id| id.as_str())
        .unwrap_or_default();

    let plan = state.registry.by_price_id(price_id);

    let update = PlanUpdate::from_plan(plan, false);
    let touched = state
        .store
        .update_keys_by_customer(customer, &update)
        .await?;

    tracing::info!(
        customer_id = %customer,
        price_id = %price_id,
        tier = %plan.tier,
        keys_updated = %touched,
        "Subscription updated, entitlements applied"
    );

    Ok(())
}

async fn handle_payment_failed(
    state: &AppState,
    data: &serde_json::Value,
) -> Result<(), ApiError> {
    let customer = customer_id(data)?;

    let touched = state.store.suspend_keys_by_customer(customer).await?;

    tracing::warn!(
        customer_id = %customer,
        keys_suspended = %touched,
        "Payment failed, keys suspended"
    );

    Ok(())
}

/// A successful payment marks a billing cycle boundary: keys are restored
/// and both usage counters reset. This is the only reset trigger.
async fn handle_payment_succeeded(
    state: &AppState,
    data: &serde_json::Value,
) -> Result<(), ApiError> {
    let customer = customer_id(data)?;

    let touched = state.store.restore_keys_by_customer(customer).await?;

    tracing::info!(
        customer_id = %customer,
        keys_restored = %touched,
        "Payment succeeded, keys restored and counters reset"
    );

    Ok(())
}
