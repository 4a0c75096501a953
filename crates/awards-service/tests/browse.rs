//! Browse endpoint tests: key checking order, quota enforcement, metering.

mod common;

use std::sync::Arc;

use awards_core::{
    key_hash, ApiKey, Domain, LimitUpdate, NewApiKey, NewUsageRecord, NominationPage,
    NominationQuery, PlanUpdate, Tier,
};
use awards_service::{create_router, AppState, ServiceConfig};
use awards_store::{MemoryStore, Store};
use axum_test::TestServer;

use common::{harness, harness_with, mint_key, link_customer, seed_dataset, test_prices};

#[tokio::test]
async fn demo_key_browses_without_a_usage_record() {
    let harness = harness();
    seed_dataset(&harness.store).await;

    let response = harness.server.get("/v1/oscars?apikey=demo").await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    assert_eq!(body["total"], 3);
    assert_eq!(body["count"], 3);

    // Demo requests bypass persistence entirely.
    assert!(harness.store.usage_records().await.is_empty());
}

#[tokio::test]
async fn missing_key_is_unauthorized() {
    let harness = harness();
    seed_dataset(&harness.store).await;

    let response = harness.server.get("/v1/oscars").await;
    response.assert_status(axum::http::StatusCode::UNAUTHORIZED);

    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "missing_key");
}

#[tokio::test]
async fn dev_mode_allows_unauthenticated_browsing() {
    let harness = harness_with(|config| config.dev_mode = true);
    seed_dataset(&harness.store).await;

    let response = harness.server.get("/v1/games").await;
    response.assert_status_ok();

    // Unauthenticated dev-mode requests are not metered.
    assert!(harness.store.usage_records().await.is_empty());
}

#[tokio::test]
async fn unknown_key_is_rejected() {
    let harness = harness();
    seed_dataset(&harness.store).await;

    let response = harness.server.get("/v1/oscars?apikey=aw_never_minted").await;
    response.assert_status(axum::http::StatusCode::UNAUTHORIZED);

    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "invalid_key");
}

#[tokio::test]
async fn suspension_outranks_the_domain_check() {
    let harness = harness();
    seed_dataset(&harness.store).await;

    // Film-only key, suspended: the games endpoint would also fail the domain
    // check, but suspension must win.
    let secret = mint_key(&harness.store, Tier::FilmStarter, vec![Domain::Film], 5_000, 50_000).await;
    link_customer(&harness.store, &secret, "cus_suspended").await;
    harness
        .store
        .suspend_keys_by_customer("cus_suspended")
        .await
        .unwrap();

    let response = harness
        .server
        .get("/v1/games")
        .add_header("x-api-key", secret.as_str())
        .await;
    response.assert_status(axum::http::StatusCode::FORBIDDEN);

    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "suspended");
}

#[tokio::test]
async fn wrong_domain_reports_the_allowed_set() {
    let harness = harness();
    seed_dataset(&harness.store).await;

    let secret = mint_key(&harness.store, Tier::FilmStarter, vec![Domain::Film], 5_000, 50_000).await;

    let response = harness
        .server
        .get("/v1/games")
        .add_header("x-api-key", secret.as_str())
        .await;
    response.assert_status(axum::http::StatusCode::FORBIDDEN);

    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "domain_not_authorized");
    assert_eq!(body["error"]["details"]["allowed_domains"], serde_json::json!(["film"]));

    // A rejected request consumes no quota.
    let key = harness
        .store
        .get_api_key_by_hash(&key_hash(&secret))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(key.daily_used, 0);
}

#[tokio::test]
async fn quota_is_enforced_at_the_boundary() {
    let harness = harness();
    seed_dataset(&harness.store).await;

    let secret = mint_key(&harness.store, Tier::Free, vec![Domain::Film], 2, 1_000).await;

    for _ in 0..2 {
        let response = harness
            .server
            .get("/v1/oscars")
            .add_header("x-api-key", secret.as_str())
            .await;
        response.assert_status_ok();
    }

    let response = harness
        .server
        .get("/v1/oscars")
        .add_header("x-api-key", secret.as_str())
        .await;
    response.assert_status(axum::http::StatusCode::TOO_MANY_REQUESTS);

    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "quota_exceeded");
    assert_eq!(body["error"]["details"]["scope"], "daily");

    // Counters never exceed the ceiling.
    let key = harness
        .store
        .get_api_key_by_hash(&key_hash(&secret))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(key.daily_used, 2);
    assert_eq!(key.monthly_used, 2);
}

/// Store where every quota increment loses a race for the remaining units.
struct ContendedStore {
    inner: Arc<MemoryStore>,
}

#[async_trait::async_trait]
impl Store for ContendedStore {
    async fn insert_api_key(&self, new_key: &NewApiKey) -> awards_store::Result<ApiKey> {
        self.inner.insert_api_key(new_key).await
    }

    async fn get_api_key_by_hash(&self, key_hash: &str) -> awards_store::Result<Option<ApiKey>> {
        self.inner.get_api_key_by_hash(key_hash).await
    }

    async fn update_api_key_limits(
        &self,
        key_hash: &str,
        update: &LimitUpdate,
    ) -> awards_store::Result<ApiKey> {
        self.inner.update_api_key_limits(key_hash, update).await
    }

    async fn update_keys_by_customer(
        &self,
        customer_id: &str,
        update: &PlanUpdate,
    ) -> awards_store::Result<u64> {
        self.inner.update_keys_by_customer(customer_id, update).await
    }

    async fn suspend_keys_by_customer(&self, customer_id: &str) -> awards_store::Result<u64> {
        self.inner.suspend_keys_by_customer(customer_id).await
    }

    async fn restore_keys_by_customer(&self, customer_id: &str) -> awards_store::Result<u64> {
        self.inner.restore_keys_by_customer(customer_id).await
    }

    async fn consume_quota(&self, key_hash: &str) -> awards_store::Result<Option<ApiKey>> {
        // A competing request lands between the caller's read and its
        // increment.
        self.inner.consume_quota(key_hash).await?;
        self.inner.consume_quota(key_hash).await
    }

    async fn log_usage(&self, record: &NewUsageRecord) -> awards_store::Result<()> {
        self.inner.log_usage(record).await
    }

    async fn query_nominations(
        &self,
        query: &NominationQuery,
    ) -> awards_store::Result<NominationPage> {
        self.inner.query_nominations(query).await
    }
}

#[tokio::test]
async fn losing_the_race_for_the_last_daily_unit_reports_daily_scope() {
    let store = Arc::new(MemoryStore::new());
    let secret = mint_key(&store, Tier::Free, vec![Domain::Film], 1, 1_000).await;

    let contended: Arc<dyn Store> = Arc::new(ContendedStore { inner: store.clone() });
    let config = ServiceConfig {
        prices: test_prices(),
        ..ServiceConfig::default()
    };
    let state = AppState::new(contended, config).expect("price table is valid");
    let server = TestServer::new(create_router(state)).expect("Failed to create test server");

    // The pre-increment read saw headroom; the increment itself does not.
    let response = server
        .get("/v1/oscars")
        .add_header("x-api-key", secret.as_str())
        .await;
    response.assert_status(axum::http::StatusCode::TOO_MANY_REQUESTS);

    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "quota_exceeded");
    assert_eq!(body["error"]["details"]["scope"], "daily");

    // The competing request holds the unit; the counter stays at the ceiling.
    let key = store
        .get_api_key_by_hash(&key_hash(&secret))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(key.daily_used, 1);
}

#[tokio::test]
async fn monthly_ceiling_reports_monthly_scope() {
    let harness = harness();
    seed_dataset(&harness.store).await;

    let secret = mint_key(&harness.store, Tier::Free, vec![Domain::Film], 1_000, 1).await;

    harness
        .server
        .get("/v1/oscars")
        .add_header("x-api-key", secret.as_str())
        .await
        .assert_status_ok();

    let response = harness
        .server
        .get("/v1/oscars")
        .add_header("x-api-key", secret.as_str())
        .await;
    response.assert_status(axum::http::StatusCode::TOO_MANY_REQUESTS);

    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["details"]["scope"], "monthly");
}

#[tokio::test]
async fn accepted_requests_are_metered() {
    let harness = harness();
    seed_dataset(&harness.store).await;

    let secret = mint_key(&harness.store, Tier::GamesStarter, vec![Domain::Games], 1_000, 10_000).await;

    let response = harness
        .server
        .get("/v1/games?year=2023&winner=true")
        .add_header("x-api-key", secret.as_str())
        .await;
    response.assert_status_ok();

    let records = harness.store.usage_records().await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].path, "/v1/games");
    assert_eq!(records[0].status_code, 200);
    assert_eq!(records[0].source, "api");
    assert_eq!(records[0].params["year"], 2023);
    assert_eq!(records[0].params["winner"], true);

    // The record never carries the secret itself.
    let serialized = serde_json::to_string(&records[0].params).unwrap();
    assert!(!serialized.contains(&secret));
}

#[tokio::test]
async fn key_is_accepted_from_the_query_parameter() {
    let harness = harness();
    seed_dataset(&harness.store).await;

    let secret = mint_key(&harness.store, Tier::FilmStarter, vec![Domain::Film], 5_000, 50_000).await;

    let response = harness
        .server
        .get(&format!("/v1/oscars?apikey={secret}"))
        .await;
    response.assert_status_ok();
}

#[tokio::test]
async fn browse_filters_shape_the_page() {
    let harness = harness();
    seed_dataset(&harness.store).await;

    let response = harness
        .server
        .get("/v1/oscars?apikey=demo&winner=true&sort=year_asc&limit=1")
        .await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    assert_eq!(body["total"], 2);
    assert_eq!(body["count"], 1);
    assert_eq!(body["limit"], 1);
    // year_asc puts the 2022 winner first.
    assert_eq!(body["results"][0]["film_title"], "CODA");
    assert_eq!(body["filters"]["winner"], true);
}

#[tokio::test]
async fn health_is_public() {
    let harness = harness();

    let response = harness.server.get("/health").await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "ok");
}
