//! PostgreSQL storage backend.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use awards_core::{
    ApiKey, Domain, LimitUpdate, NewApiKey, NewUsageRecord, Nomination, NominationPage,
    NominationPerson, NominationQuery, NominationSort, PlanUpdate, Tier,
};

use crate::error::{Result, StoreError};
use crate::Store;

/// Embedded migrations for the awards schema.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// PostgreSQL-backed [`Store`].
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Wrap an existing connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run the embedded migrations.
    ///
    /// # Errors
    ///
    /// Returns an error if a migration fails to apply.
    pub async fn migrate(&self) -> Result<()> {
        MIGRATOR
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))
    }
}

const API_KEY_COLUMNS: &str = "id, key_hash, email, tier, domains, daily_limit, monthly_limit, \
     daily_used, monthly_used, suspended, stripe_customer_id, stripe_subscription_id, notes, \
     created_at, updated_at";

/// Raw `api_keys` row; tier and domains are stored as text.
#[derive(Debug, FromRow)]
struct ApiKeyRow {
    id: Uuid,
    key_hash: String,
    email: String,
    tier: String,
    domains: Vec<String>,
    daily_limit: i64,
    monthly_limit: i64,
    daily_used: i64,
    monthly_used: i64,
    suspended: bool,
    stripe_customer_id: Option<String>,
    stripe_subscription_id: Option<String>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ApiKeyRow> for ApiKey {
    type Error = StoreError;

    fn try_from(row: ApiKeyRow) -> Result<Self> {
        let tier = Tier::from_str(&row.tier).map_err(StoreError::Database)?;
        let domains = row
            .domains
            .iter()
            .map(|d| Domain::from_str(d))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::Database)?;

        Ok(Self {
            id: row.id,
            key_hash: row.key_hash,
            email: row.email,
            tier,
            domains,
            daily_limit: row.daily_limit,
            monthly_limit: row.monthly_limit,
            daily_used: row.daily_used,
            monthly_used: row.monthly_used,
            suspended: row.suspended,
            stripe_customer_id: row.stripe_customer_id,
            stripe_subscription_id: row.stripe_subscription_id,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn domain_labels(domains: &[Domain]) -> Vec<String> {
    domains.iter().map(|d| d.as_str().to_string()).collect()
}

/// Raw browse result row; `people` arrives as a JSON aggregate.
#[derive(Debug, FromRow)]
struct NominationRow {
    ceremony_year: i32,
    ceremony_name: String,
    category_name: String,
    imdb_id: Option<String>,
    film_title: String,
    is_win: bool,
    people: serde_json::Value,
}

impl TryFrom<NominationRow> for Nomination {
    type Error = StoreError;

    fn try_from(row: NominationRow) -> Result<Self> {
        let people: Vec<NominationPerson> =
            serde_json::from_value(row.people).map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(Self {
            ceremony_year: row.ceremony_year,
            ceremony_name: row.ceremony_name,
            category_name: row.category_name,
            imdb_id: row.imdb_id,
            film_title: row.film_title,
            is_win: row.is_win,
            people,
        })
    }
}

/// Append the shared FROM/WHERE clause for a browse query.
///
/// Every predicate is pushed compositionally; there is exactly one statement
/// shape regardless of which filters are present.
fn push_browse_filters(builder: &mut QueryBuilder<'_, Postgres>, query: &NominationQuery) {
    builder.push(
        " FROM ceremonies c \
         JOIN award_categories ac ON ac.ceremony_id = c.id \
         JOIN nominations n ON n.category_id = ac.id \
         WHERE c.domain = ",
    );
    builder.push_bind(query.domain.as_str());

    if let Some(year) = query.year {
        builder.push(" AND c.year = ");
        builder.push_bind(year);
    }
    if let Some(category) = &query.category {
        builder.push(" AND ac.name ILIKE ");
        builder.push_bind(format!("%{category}%"));
    }
    if query.winners_only {
        builder.push(" AND n.is_win = TRUE");
    }
    if let Some(imdb_id) = &query.imdb_id {
        builder.push(" AND n.imdb_id = ");
        builder.push_bind(imdb_id.clone());
    }
}

const fn order_by_clause(sort: NominationSort) -> &'static str {
    match sort {
        NominationSort::YearDesc => " ORDER BY c.year DESC, ac.name, n.is_win DESC",
        NominationSort::YearAsc => " ORDER BY c.year ASC, ac.name, n.is_win DESC",
        NominationSort::Category => " ORDER BY ac.name, c.year DESC, n.is_win DESC",
        NominationSort::Film => " ORDER BY n.title, c.year DESC",
    }
}

#[async_trait::async_trait]
impl Store for PgStore {
    async fn insert_api_key(&self, new_key: &NewApiKey) -> Result<ApiKey> {
        let sql = format!(
            "INSERT INTO api_keys (key_hash, email, tier, domains, daily_limit, monthly_limit, notes) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {API_KEY_COLUMNS}"
        );

        let row: ApiKeyRow = sqlx::query_as(&sql)
            .bind(&new_key.key_hash)
            .bind(&new_key.email)
            .bind(new_key.tier.as_str())
            .bind(domain_labels(&new_key.domains))
            .bind(new_key.daily_limit)
            .bind(new_key.monthly_limit)
            .bind(&new_key.notes)
            .fetch_one(&self.pool)
            .await?;

        row.try_into()
    }

    async fn get_api_key_by_hash(&self, key_hash: &str) -> Result<Option<ApiKey>> {
        let sql = format!("SELECT {API_KEY_COLUMNS} FROM api_keys WHERE key_hash = $1");

        let row: Option<ApiKeyRow> = sqlx::query_as(&sql)
            .bind(key_hash)
            .fetch_optional(&self.pool)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn update_api_key_limits(&self, key_hash: &str, update: &LimitUpdate) -> Result<ApiKey> {
        let sql = format!(
            "UPDATE api_keys SET tier = $2, domains = $3, daily_limit = $4, monthly_limit = $5, \
             stripe_customer_id = $6, stripe_subscription_id = $7, updated_at = now() \
             WHERE key_hash = $1 \
             RETURNING {API_KEY_COLUMNS}"
        );

        let row: Option<ApiKeyRow> = sqlx::query_as(&sql)
            .bind(key_hash)
            .bind(update.tier.as_str())
            .bind(domain_labels(&update.domains))
            .bind(update.daily_limit)
            .bind(update.monthly_limit)
            .bind(&update.stripe_customer_id)
            .bind(&update.stripe_subscription_id)
            .fetch_optional(&self.pool)
            .await?;

        row.ok_or(StoreError::NotFound)?.try_into()
    }

    async fn update_keys_by_customer(&self, customer_id: &str, update: &PlanUpdate) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE api_keys SET tier = $2, domains = $3, daily_limit = $4, monthly_limit = $5, \
             stripe_subscription_id = CASE WHEN $6 THEN NULL ELSE stripe_subscription_id END, \
             updated_at = now() \
             WHERE stripe_customer_id = $1",
        )
        .bind(customer_id)
        .bind(update.tier.as_str())
        .bind(domain_labels(&update.domains))
        .bind(update.daily_limit)
        .bind(update.monthly_limit)
        .bind(update.clear_subscription)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn suspend_keys_by_customer(&self, customer_id: &str) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE api_keys SET suspended = TRUE, updated_at = now() \
             WHERE stripe_customer_id = $1",
        )
        .bind(customer_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn restore_keys_by_customer(&self, customer_id: &str) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE api_keys SET suspended = FALSE, daily_used = 0, monthly_used = 0, \
             updated_at = now() \
             WHERE stripe_customer_id = $1",
        )
        .bind(customer_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn consume_quota(&self, key_hash: &str) -> Result<Option<ApiKey>> {
        // Single conditional increment: no check-then-act window.
        let sql = format!(
            "UPDATE api_keys SET daily_used = daily_used + 1, monthly_used = monthly_used + 1, \
             updated_at = now() \
             WHERE key_hash = $1 AND daily_used < daily_limit AND monthly_used < monthly_limit \
             RETURNING {API_KEY_COLUMNS}"
        );

        let row: Option<ApiKeyRow> = sqlx::query_as(&sql)
            .bind(key_hash)
            .fetch_optional(&self.pool)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn log_usage(&self, record: &NewUsageRecord) -> Result<()> {
        sqlx::query(
            "INSERT INTO api_usage (key_id, path, params, latency_ms, status_code, source) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(record.key_id)
        .bind(&record.path)
        .bind(&record.params)
        .bind(record.latency_ms)
        .bind(record.status_code)
        .bind(&record.source)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn query_nominations(&self, query: &NominationQuery) -> Result<NominationPage> {
        let mut builder = QueryBuilder::new(
            "SELECT c.year AS ceremony_year, c.name AS ceremony_name, ac.name AS category_name, \
             n.imdb_id, n.title AS film_title, n.is_win, \
             COALESCE((SELECT json_agg(json_build_object('name', p.name, 'role', np.role)) \
                       FROM nomination_people np JOIN people p ON p.id = np.person_id \
                       WHERE np.nomination_id = n.id), '[]'::json) AS people",
        );
        push_browse_filters(&mut builder, query);
        builder.push(order_by_clause(query.sort));
        builder.push(" LIMIT ");
        builder.push_bind(query.clamped_limit());
        builder.push(" OFFSET ");
        builder.push_bind(query.offset.max(0));

        let rows: Vec<NominationRow> = builder
            .build_query_as()
            .fetch_all(&self.pool)
            .await?;

        let mut count_builder = QueryBuilder::new("SELECT COUNT(*)");
        push_browse_filters(&mut count_builder, query);
        let total: i64 = count_builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        let results = rows
            .into_iter()
            .map(TryInto::try_into)
            .collect::<Result<Vec<Nomination>>>()?;

        Ok(NominationPage { total, results })
    }
}
