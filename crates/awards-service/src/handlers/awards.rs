//! Metered browse endpoints over the awards dataset.
//!
//! Both endpoints share one flow: authorize the presented key against the
//! endpoint's domain, run the browse query, respond, then append a usage
//! record reflecting the true outcome. Demo and dev-mode requests are never
//! metered or logged.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};

use awards_core::{
    Domain, NewUsageRecord, Nomination, NominationQuery, NominationSort, BROWSE_DEFAULT_LIMIT,
};

use crate::error::ApiError;
use crate::state::AppState;
use crate::validate::authorize;

/// Browse query parameters, shared by both dataset endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct BrowseParams {
    /// Ceremony year filter.
    pub year: Option<i32>,
    /// Category substring filter (case-insensitive).
    pub category: Option<String>,
    /// Restrict to winning nominations (`true` / `1`).
    pub winner: Option<String>,
    /// IMDb id filter.
    pub imdb_id: Option<String>,
    /// Sort order (`year_desc` default, `year_asc`, `category`, `film`).
    pub sort: Option<String>,
    /// Page size.
    #[serde(default = "default_limit")]
    pub limit: i64,
    /// Pagination offset.
    #[serde(default)]
    pub offset: i64,
    /// API key as a query parameter (header form preferred).
    pub apikey: Option<String>,
    /// Legacy spelling of the key parameter.
    pub api_key: Option<String>,
}

fn default_limit() -> i64 {
    BROWSE_DEFAULT_LIMIT
}

impl BrowseParams {
    fn winners_only(&self) -> bool {
        self.winner
            .as_deref()
            .is_some_and(|w| w == "true" || w == "1")
    }

    /// The filters echoed back in the response and captured in the usage log.
    fn filters(&self) -> serde_json::Value {
        serde_json::json!({
            "year": self.year,
            "category": self.category,
            "winner": self.winners_only(),
            "imdb_id": self.imdb_id,
            "sort": self.sort,
        })
    }

    fn to_query(&self, domain: Domain) -> NominationQuery {
        let mut query = NominationQuery::new(domain);
        query.year = self.year;
        query.category = self.category.clone();
        query.winners_only = self.winners_only();
        query.imdb_id = self.imdb_id.clone();
        query.sort = NominationSort::parse(self.sort.as_deref());
        query.limit = self.limit;
        query.offset = self.offset.max(0);
        query
    }
}

/// One page of browse results.
#[derive(Debug, Serialize)]
pub struct BrowseResponse {
    /// Total rows matching the filters.
    pub total: i64,
    /// Page size applied.
    pub limit: i64,
    /// Offset applied.
    pub offset: i64,
    /// Rows in this page.
    pub count: usize,
    /// The rows.
    pub results: Vec<Nomination>,
    /// The filters as applied.
    pub filters: serde_json::Value,
}

/// Film-domain browse (`GET /v1/oscars`).
pub async fn oscars(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(params): Query<BrowseParams>,
) -> Result<Json<BrowseResponse>, ApiError> {
    browse(&state, Domain::Film, "/v1/oscars", &headers, &params).await
}

/// Games-domain browse (`GET /v1/games`).
pub async fn games(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(params): Query<BrowseParams>,
) -> Result<Json<BrowseResponse>, ApiError> {
    browse(&state, Domain::Games, "/v1/games", &headers, &params).await
}

/// The key may arrive as a header or a query parameter. The raw secret is
/// never logged in any branch of this flow.
fn presented_key<'a>(headers: &'a HeaderMap, params: &'a BrowseParams) -> Option<&'a str> {
    headers
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
        .or(params.apikey.as_deref())
        .or(params.api_key.as_deref())
}

async fn browse(
    state: &AppState,
    domain: Domain,
    path: &str,
    headers: &HeaderMap,
    params: &BrowseParams,
) -> Result<Json<BrowseResponse>, ApiError> {
    let started = Instant::now();

    let auth = authorize(state, presented_key(headers, params), domain).await?;

    let query = params.to_query(domain);
    let result = state.store.query_nominations(&query).await;

    // The record reflects the true outcome, so it is written after the query
    // and before the error propagates.
    if let Some(key) = &auth.key {
        let status_code = if result.is_ok() { 200 } else { 500 };

        let record = NewUsageRecord {
            key_id: key.id,
            path: path.to_string(),
            params: params.filters(),
            latency_ms: i64::try_from(started.elapsed().as_millis()).ok(),
            status_code,
            source: "api".to_string(),
        };

        if let Err(err) = state.store.log_usage(&record).await {
            tracing::warn!(error = %err, path = %path, "Failed to append usage record");
        }
    }

    let page = result?;

    Ok(Json(BrowseResponse {
        total: page.total,
        limit: query.clamped_limit(),
        offset: query.offset,
        count: page.results.len(),
        results: page.results,
        filters: params.filters(),
    }))
}
