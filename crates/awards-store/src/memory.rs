//! In-memory storage backend.
//!
//! Mirrors the PostgreSQL backend's semantics (including the atomic quota
//! increment, which here happens under one write lock) so the service can be
//! tested without a database.

use std::collections::HashMap;

use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use awards_core::{
    ApiKey, Domain, LimitUpdate, NewApiKey, NewUsageRecord, Nomination, NominationPage,
    NominationQuery, NominationSort, PlanUpdate, UsageRecord,
};

use crate::error::{Result, StoreError};
use crate::Store;

#[derive(Default)]
struct Inner {
    /// Key rows by `key_hash`.
    keys: HashMap<String, ApiKey>,
    usage: Vec<UsageRecord>,
    nominations: Vec<(Domain, Nomination)>,
}

/// In-memory [`Store`] for tests.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed dataset rows for browse queries.
    pub async fn seed_nominations(&self, domain: Domain, rows: Vec<Nomination>) {
        let mut inner = self.inner.write().await;
        inner.nominations.extend(rows.into_iter().map(|n| (domain, n)));
    }

    /// Snapshot of the usage log, for assertions.
    pub async fn usage_records(&self) -> Vec<UsageRecord> {
        self.inner.read().await.usage.clone()
    }

    /// Number of key rows, for assertions.
    pub async fn key_count(&self) -> usize {
        self.inner.read().await.keys.len()
    }
}

fn sort_rows(rows: &mut [Nomination], sort: NominationSort) {
    match sort {
        NominationSort::YearDesc => rows.sort_by(|a, b| {
            b.ceremony_year
                .cmp(&a.ceremony_year)
                .then_with(|| a.category_name.cmp(&b.category_name))
                .then_with(|| b.is_win.cmp(&a.is_win))
        }),
        NominationSort::YearAsc => rows.sort_by(|a, b| {
            a.ceremony_year
                .cmp(&b.ceremony_year)
                .then_with(|| a.category_name.cmp(&b.category_name))
                .then_with(|| b.is_win.cmp(&a.is_win))
        }),
        NominationSort::Category => rows.sort_by(|a, b| {
            a.category_name
                .cmp(&b.category_name)
                .then_with(|| b.ceremony_year.cmp(&a.ceremony_year))
                .then_with(|| b.is_win.cmp(&a.is_win))
        }),
        NominationSort::Film => rows.sort_by(|a, b| {
            a.film_title
                .cmp(&b.film_title)
                .then_with(|| b.ceremony_year.cmp(&a.ceremony_year))
        }),
    }
}

fn matches_query(nomination: &Nomination, query: &NominationQuery) -> bool {
    if let Some(year) = query.year {
        if nomination.ceremony_year != year {
            return false;
        }
    }
    if let Some(category) = &query.category {
        if !nomination
            .category_name
            .to_lowercase()
            .contains(&category.to_lowercase())
        {
            return false;
        }
    }
    if query.winners_only && !nomination.is_win {
        return false;
    }
    if let Some(imdb_id) = &query.imdb_id {
        if nomination.imdb_id.as_deref() != Some(imdb_id.as_str()) {
            return false;
        }
    }
    true
}

#[async_trait::async_trait]
impl Store for MemoryStore {
    async fn insert_api_key(&self, new_key: &NewApiKey) -> Result<ApiKey> {
        let now = Utc::now();
        let key = ApiKey {
            id: Uuid::new_v4(),
            key_hash: new_key.key_hash.clone(),
            email: new_key.email.clone(),
            tier: new_key.tier,
            domains: new_key.domains.clone(),
            daily_limit: new_key.daily_limit,
            monthly_limit: new_key.monthly_limit,
            daily_used: 0,
            monthly_used: 0,
            suspended: false,
            stripe_customer_id: None,
            stripe_subscription_id: None,
            notes: new_key.notes.clone(),
            created_at: now,
            updated_at: now,
        };

        let mut inner = self.inner.write().await;
        if inner.keys.contains_key(&key.key_hash) {
            return Err(StoreError::Database("duplicate key hash".into()));
        }
        inner.keys.insert(key.key_hash.clone(), key.clone());
        Ok(key)
    }

    async fn get_api_key_by_hash(&self, key_hash: &str) -> Result<Option<ApiKey>> {
        Ok(self.inner.read().await.keys.get(key_hash).cloned())
    }

    async fn update_api_key_limits(&self, key_hash: &str, update: &LimitUpdate) -> Result<ApiKey> {
        let mut inner = self.inner.write().await;
        let key = inner.keys.get_mut(key_hash).ok_or(StoreError::NotFound)?;

        key.tier = update.tier;
        key.domains = update.domains.clone();
        key.daily_limit = update.daily_limit;
        key.monthly_limit = update.monthly_limit;
        key.stripe_customer_id = update.stripe_customer_id.clone();
        key.stripe_subscription_id = update.stripe_subscription_id.clone();
        key.updated_at = Utc::now();

        Ok(key.clone())
    }

    async fn update_keys_by_customer(&self, customer_id: &str, update: &PlanUpdate) -> Result<u64> {
        let mut inner = self.inner.write().await;
        let mut touched = 0;

        for key in inner
            .keys
            .values_mut()
            .filter(|k| k.stripe_customer_id.as_deref() == Some(customer_id))
        {
            key.tier = update.tier;
            key.domains = update.domains.clone();
            key.daily_limit = update.daily_limit;
            key.monthly_limit = update.monthly_limit;
            if update.clear_subscription {
                key.stripe_subscription_id = None;
            }
            key.updated_at = Utc::now();
            touched += 1;
        }

        Ok(touched)
    }

    async fn suspend_keys_by_customer(&self, customer_id: &str) -> Result<u64> {
        let mut inner = self.inner.write().await;
        let mut touched = 0;

        for key in inner
            .keys
            .values_mut()
            .filter(|k| k.stripe_customer_id.as_deref() == Some(customer_id))
        {
            key.suspended = true;
            key.updated_at = Utc::now();
            touched += 1;
        }

        Ok(touched)
    }

    async fn restore_keys_by_customer(&self, customer_id: &str) -> Result<u64> {
        let mut inner = self.inner.write().await;
        let mut touched = 0;

        for key in inner
            .keys
            .values_mut()
            .filter(|k| k.stripe_customer_id.as_deref() == Some(customer_id))
        {
            key.suspended = false;
            key.daily_used = 0;
            key.monthly_used = 0;
            key.updated_at = Utc::now();
            touched += 1;
        }

        Ok(touched)
    }

    async fn consume_quota(&self, key_hash: &str) -> Result<Option<ApiKey>> {
        let mut inner = self.inner.write().await;
        let Some(key) = inner.keys.get_mut(key_hash) else {
            return Ok(None);
        };

        if key.daily_used >= key.daily_limit || key.monthly_used >= key.monthly_limit {
            return Ok(None);
        }

        key.daily_used += 1;
        key.monthly_used += 1;
        key.updated_at = Utc::now();
        Ok(Some(key.clone()))
    }

    async fn log_usage(&self, record: &NewUsageRecord) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.usage.push(UsageRecord {
            id: Uuid::new_v4(),
            key_id: record.key_id,
            path: record.path.clone(),
            params: record.params.clone(),
            latency_ms: record.latency_ms,
            status_code: record.status_code,
            source: record.source.clone(),
            created_at: Utc::now(),
        });
        Ok(())
    }

    async fn query_nominations(&self, query: &NominationQuery) -> Result<NominationPage> {
        let inner = self.inner.read().await;

        let mut matching: Vec<Nomination> = inner
            .nominations
            .iter()
            .filter(|(domain, nomination)| {
                *domain == query.domain && matches_query(nomination, query)
            })
            .map(|(_, nomination)| nomination.clone())
            .collect();

        #[allow(clippy::cast_possible_wrap)]
        let total = matching.len() as i64;
        sort_rows(&mut matching, query.sort);

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let results = matching
            .into_iter()
            .skip(query.offset.max(0) as usize)
            .take(query.clamped_limit() as usize)
            .collect();

        Ok(NominationPage { total, results })
    }
}
