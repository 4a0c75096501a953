//! Shared test harness for the service integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum_test::TestServer;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use awards_core::{
    key_hash, mint_key_secret, Domain, LimitUpdate, NewApiKey, Nomination, NominationPerson,
    PriceTable, Tier,
};
use awards_service::{create_router, AppState, ServiceConfig};
use awards_store::{MemoryStore, Store};

/// Admin key configured on every test server.
pub const ADMIN_KEY: &str = "test-admin-key";

/// Webhook signing secret configured on every test server.
pub const WEBHOOK_SECRET: &str = "whsec_test";

/// A fully-populated price table with stable test ids.
pub fn test_prices() -> PriceTable {
    PriceTable {
        games_starter_monthly: "price_gsm".into(),
        games_starter_annual: "price_gsa".into(),
        games_pro_monthly: "price_gpm".into(),
        games_pro_annual: "price_gpa".into(),
        film_starter_monthly: "price_fsm".into(),
        film_starter_annual: "price_fsa".into(),
        film_pro_monthly: "price_fpm".into(),
        film_pro_annual: "price_fpa".into(),
        bundle_starter_monthly: "price_bsm".into(),
        bundle_starter_annual: "price_bsa".into(),
        bundle_pro_monthly: "price_bpm".into(),
        bundle_pro_annual: "price_bpa".into(),
    }
}

/// The router under test plus a handle on its in-memory store.
pub struct TestHarness {
    pub server: TestServer,
    pub store: Arc<MemoryStore>,
}

/// Harness with the default test configuration.
pub fn harness() -> TestHarness {
    harness_with(|_| {})
}

/// Harness with a customized configuration.
pub fn harness_with(customize: impl FnOnce(&mut ServiceConfig)) -> TestHarness {
    let store = Arc::new(MemoryStore::new());

    let mut config = ServiceConfig {
        admin_api_key: Some(ADMIN_KEY.into()),
        stripe_webhook_secret: Some(WEBHOOK_SECRET.into()),
        prices: test_prices(),
        ..ServiceConfig::default()
    };
    customize(&mut config);

    let dyn_store: Arc<dyn Store> = store.clone();
    let state = AppState::new(dyn_store, config).expect("price table is valid");
    let server = TestServer::new(create_router(state)).expect("Failed to create test server");

    TestHarness { server, store }
}

/// Mint a key directly in the store, returning the raw secret.
pub async fn mint_key(
    store: &MemoryStore,
    tier: Tier,
    domains: Vec<Domain>,
    daily_limit: i64,
    monthly_limit: i64,
) -> String {
    let secret = mint_key_secret();
    store
        .insert_api_key(&NewApiKey {
            key_hash: key_hash(&secret),
            email: "subscriber@example.com".into(),
            tier,
            domains,
            daily_limit,
            monthly_limit,
            notes: None,
        })
        .await
        .expect("insert key");
    secret
}

/// Link a minted key to a Stripe customer, preserving its entitlements.
pub async fn link_customer(store: &MemoryStore, secret: &str, customer_id: &str) {
    let hash = key_hash(secret);
    let key = store
        .get_api_key_by_hash(&hash)
        .await
        .expect("load key")
        .expect("key exists");

    store
        .update_api_key_limits(
            &hash,
            &LimitUpdate {
                tier: key.tier,
                domains: key.domains.clone(),
                daily_limit: key.daily_limit,
                monthly_limit: key.monthly_limit,
                stripe_customer_id: Some(customer_id.into()),
                stripe_subscription_id: Some("sub_test".into()),
            },
        )
        .await
        .expect("link customer");
}

/// A valid `stripe-signature` header for the payload.
pub fn stripe_signature(payload: &str) -> String {
    let timestamp = 1_700_000_000_i64;
    let mut mac = Hmac::<Sha256>::new_from_slice(WEBHOOK_SECRET.as_bytes()).expect("hmac key");
    mac.update(format!("{timestamp}.{payload}").as_bytes());
    let signature = hex::encode(mac.finalize().into_bytes());
    format!("t={timestamp},v1={signature}")
}

fn nomination(year: i32, category: &str, title: &str, is_win: bool) -> Nomination {
    Nomination {
        ceremony_year: year,
        ceremony_name: format!("{year} ceremony"),
        category_name: category.into(),
        imdb_id: Some(format!("tt{year}{}", title.len())),
        film_title: title.into(),
        is_win,
        people: vec![NominationPerson {
            name: "Test Person".into(),
            role: Some("director".into()),
        }],
    }
}

/// Seed a handful of rows in both dataset domains.
pub async fn seed_dataset(store: &MemoryStore) {
    store
        .seed_nominations(
            Domain::Film,
            vec![
                nomination(2023, "Best Picture", "Oppenheimer", true),
                nomination(2023, "Best Picture", "Barbie", false),
                nomination(2022, "Best Actor", "CODA", true),
            ],
        )
        .await;
    store
        .seed_nominations(
            Domain::Games,
            vec![
                nomination(2023, "Game of the Year", "Baldur's Gate 3", true),
                nomination(2022, "Game of the Year", "Elden Ring", true),
            ],
        )
        .await;
}
