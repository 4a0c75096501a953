//! Stripe webhook tests: signature gating and entitlement transitions.

mod common;

use awards_core::{key_hash, Domain, Tier};
use awards_store::Store;
use serde_json::json;

use common::{harness, harness_with, link_customer, mint_key, stripe_signature};

fn subscription_deleted(customer: &str) -> String {
    json!({
        "id": "evt_deleted",
        "type": "customer.subscription.deleted",
        "data": { "object": { "id": "sub_test", "customer": customer } }
    })
    .to_string()
}

fn subscription_updated(customer: &str, price_id: &str) -> String {
    json!({
        "id": "evt_updated",
        "type": "customer.subscription.updated",
        "data": {
            "object": {
                "id": "sub_test",
                "customer": customer,
                "items": { "data": [ { "id": "si_test", "price": { "id": price_id } } ] }
            }
        }
    })
    .to_string()
}

fn invoice_event(event_type: &str, customer: &str) -> String {
    json!({
        "id": "evt_invoice",
        "type": event_type,
        "data": { "object": { "id": "in_test", "customer": customer } }
    })
    .to_string()
}

#[tokio::test]
async fn bad_signature_is_rejected_without_state_change() {
    let harness = harness();
    let secret = mint_key(&harness.store, Tier::FilmPro, vec![Domain::Film], 50_000, 500_000).await;
    link_customer(&harness.store, &secret, "cus_1").await;

    let payload = subscription_deleted("cus_1");
    let response = harness
        .server
        .post("/webhooks/stripe")
        .add_header("stripe-signature", "t=1700000000,v1=deadbeef")
        .text(payload)
        .await;
    response.assert_status(axum::http::StatusCode::BAD_REQUEST);

    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "signature_verification_failed");

    let key = harness
        .store
        .get_api_key_by_hash(&key_hash(&secret))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(key.tier, Tier::FilmPro);
    assert!(key.stripe_subscription_id.is_some());
}

#[tokio::test]
async fn missing_signature_header_is_rejected() {
    let harness = harness();

    let response = harness
        .server
        .post("/webhooks/stripe")
        .text(subscription_deleted("cus_1"))
        .await;
    response.assert_status(axum::http::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_event_kinds_are_acknowledged() {
    let harness = harness();

    let payload = json!({
        "id": "evt_unknown",
        "type": "customer.tax_id.created",
        "data": { "object": {} }
    })
    .to_string();

    let response = harness
        .server
        .post("/webhooks/stripe")
        .add_header("stripe-signature", stripe_signature(&payload).as_str())
        .text(payload)
        .await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    assert_eq!(body["received"], true);
}

#[tokio::test]
async fn cancellation_downgrades_every_key_to_free() {
    let harness = harness();
    let secret = mint_key(&harness.store, Tier::BundlePro, vec![Domain::Games, Domain::Film], 70_000, 700_000).await;
    link_customer(&harness.store, &secret, "cus_1").await;

    let payload = subscription_deleted("cus_1");
    harness
        .server
        .post("/webhooks/stripe")
        .add_header("stripe-signature", stripe_signature(&payload).as_str())
        .text(payload)
        .await
        .assert_status_ok();

    let key = harness
        .store
        .get_api_key_by_hash(&key_hash(&secret))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(key.tier, Tier::Free);
    assert_eq!(key.daily_limit, 1_000);
    assert_eq!(key.monthly_limit, 1_000);
    assert!(key.stripe_subscription_id.is_none());
    // The customer linkage survives for later events.
    assert_eq!(key.stripe_customer_id.as_deref(), Some("cus_1"));
}

#[tokio::test]
async fn plan_change_applies_the_new_entitlements() {
    let harness = harness();
    let secret = mint_key(&harness.store, Tier::FilmStarter, vec![Domain::Film], 5_000, 50_000).await;
    link_customer(&harness.store, &secret, "cus_1").await;

    // Upgrade to the bundle pro price configured in the test price table.
    let payload = subscription_updated("cus_1", "price_bpm");
    harness
        .server
        .post("/webhooks/stripe")
        .add_header("stripe-signature", stripe_signature(&payload).as_str())
        .text(payload)
        .await
        .assert_status_ok();

    let key = harness
        .store
        .get_api_key_by_hash(&key_hash(&secret))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(key.tier, Tier::BundlePro);
    assert_eq!(key.daily_limit, 70_000);
    assert_eq!(key.domains, vec![Domain::Games, Domain::Film]);
}

#[tokio::test]
async fn unknown_price_downgrades_to_free() {
    let harness = harness();
    let secret = mint_key(&harness.store, Tier::FilmPro, vec![Domain::Film], 50_000, 500_000).await;
    link_customer(&harness.store, &secret, "cus_1").await;

    let payload = subscription_updated("cus_1", "price_from_another_account");
    harness
        .server
        .post("/webhooks/stripe")
        .add_header("stripe-signature", stripe_signature(&payload).as_str())
        .text(payload)
        .await
        .assert_status_ok();

    // Fail-safe: an unrecognized billing price never grants elevated access.
    let key = harness
        .store
        .get_api_key_by_hash(&key_hash(&secret))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(key.tier, Tier::Free);
    assert_eq!(key.daily_limit, 1_000);
}

#[tokio::test]
async fn legacy_price_keeps_grandfathered_entitlements() {
    let harness = harness();
    let secret = mint_key(&harness.store, Tier::Professional, vec![Domain::Games, Domain::Film], 3_333, 100_000).await;
    link_customer(&harness.store, &secret, "cus_1").await;

    let payload = subscription_updated("cus_1", "price_enterprise_monthly");
    harness
        .server
        .post("/webhooks/stripe")
        .add_header("stripe-signature", stripe_signature(&payload).as_str())
        .text(payload)
        .await
        .assert_status_ok();

    let key = harness
        .store
        .get_api_key_by_hash(&key_hash(&secret))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(key.tier, Tier::Enterprise);
    assert_eq!(key.daily_limit, 33_333);
}

#[tokio::test]
async fn payment_failure_suspends_and_success_restores() {
    let harness = harness();
    let secret = mint_key(&harness.store, Tier::GamesPro, vec![Domain::Games], 25_000, 250_000).await;
    link_customer(&harness.store, &secret, "cus_1").await;
    harness
        .store
        .consume_quota(&key_hash(&secret))
        .await
        .unwrap()
        .unwrap();

    let payload = invoice_event("invoice.payment_failed", "cus_1");
    harness
        .server
        .post("/webhooks/stripe")
        .add_header("stripe-signature", stripe_signature(&payload).as_str())
        .text(payload)
        .await
        .assert_status_ok();

    let key = harness
        .store
        .get_api_key_by_hash(&key_hash(&secret))
        .await
        .unwrap()
        .unwrap();
    assert!(key.suspended);

    let payload = invoice_event("invoice.payment_succeeded", "cus_1");
    harness
        .server
        .post("/webhooks/stripe")
        .add_header("stripe-signature", stripe_signature(&payload).as_str())
        .text(payload)
        .await
        .assert_status_ok();

    let key = harness
        .store
        .get_api_key_by_hash(&key_hash(&secret))
        .await
        .unwrap()
        .unwrap();
    assert!(!key.suspended);
    assert_eq!(key.daily_used, 0);
    assert_eq!(key.monthly_used, 0);
}

#[tokio::test]
async fn duplicate_delivery_is_idempotent() {
    let harness = harness();
    let secret = mint_key(&harness.store, Tier::FilmStarter, vec![Domain::Film], 5_000, 50_000).await;
    link_customer(&harness.store, &secret, "cus_1").await;

    let payload = invoice_event("invoice.payment_succeeded", "cus_1");
    for _ in 0..2 {
        harness
            .server
            .post("/webhooks/stripe")
            .add_header("stripe-signature", stripe_signature(&payload).as_str())
            .text(payload.clone())
            .await
            .assert_status_ok();
    }

    let key = harness
        .store
        .get_api_key_by_hash(&key_hash(&secret))
        .await
        .unwrap()
        .unwrap();
    assert!(!key.suspended);
    assert_eq!(key.tier, Tier::FilmStarter);
    assert_eq!(key.daily_used, 0);
}

#[tokio::test]
async fn unconfigured_secret_skips_verification() {
    let harness = harness_with(|config| config.stripe_webhook_secret = None);
    let secret = mint_key(&harness.store, Tier::FilmPro, vec![Domain::Film], 50_000, 500_000).await;
    link_customer(&harness.store, &secret, "cus_1").await;

    // No signature header at all; development-mode behavior applies the event.
    harness
        .server
        .post("/webhooks/stripe")
        .text(subscription_deleted("cus_1"))
        .await
        .assert_status_ok();

    let key = harness
        .store
        .get_api_key_by_hash(&key_hash(&secret))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(key.tier, Tier::Free);
}
