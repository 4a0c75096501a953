//! Service configuration.

use awards_core::PriceTable;

use crate::stripe::DEFAULT_API_BASE;

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Address to listen on (default: "0.0.0.0:8080").
    pub listen_addr: String,

    /// PostgreSQL connection string.
    pub database_url: String,

    /// Development mode: allow unauthenticated browse requests for local
    /// testing. Never enable in production.
    pub dev_mode: bool,

    /// Admin API key for administrative key minting (optional).
    pub admin_api_key: Option<String>,

    /// Stripe API key (optional; provisioning is unavailable without it).
    pub stripe_api_key: Option<String>,

    /// Stripe webhook signing secret (optional; verification is skipped
    /// without it, development only).
    pub stripe_webhook_secret: Option<String>,

    /// Stripe API base URL (overridable for tests).
    pub stripe_api_base: String,

    /// CORS allowed origins.
    pub cors_origins: Vec<String>,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,

    /// Request timeout in seconds.
    pub request_timeout_seconds: u64,

    /// Stripe price ids per purchasable plan key.
    ///
    /// Validated into a `PlanRegistry` at startup; a missing or duplicated
    /// mapping aborts startup rather than surfacing at first checkout.
    pub prices: PriceTable,
}

impl ServiceConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            listen_addr: std::env::var("LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".into()),
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgres://localhost/awards".into()),
            dev_mode: std::env::var("DEV_MODE").is_ok_and(|v| v == "1" || v == "true"),
            admin_api_key: std::env::var("ADMIN_API_KEY").ok(),
            stripe_api_key: std::env::var("STRIPE_API_KEY").ok(),
            stripe_webhook_secret: std::env::var("STRIPE_WEBHOOK_SECRET").ok(),
            stripe_api_base: std::env::var("STRIPE_API_BASE")
                .unwrap_or_else(|_| DEFAULT_API_BASE.into()),
            cors_origins: std::env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| "*".into())
                .split(',')
                .map(|s| s.trim().to_string())
                .collect(),
            max_body_bytes: std::env::var("MAX_BODY_BYTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1024 * 1024), // 1MB
            request_timeout_seconds: std::env::var("REQUEST_TIMEOUT_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),
            prices: price_table_from_env(),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".into(),
            database_url: "postgres://localhost/awards".into(),
            dev_mode: false,
            admin_api_key: None,
            stripe_api_key: None,
            stripe_webhook_secret: None,
            stripe_api_base: DEFAULT_API_BASE.into(),
            cors_origins: vec!["*".into()],
            max_body_bytes: 1024 * 1024,
            request_timeout_seconds: 30,
            prices: PriceTable::default(),
        }
    }
}

/// Collect the `STRIPE_PRICE_*` variables into one typed table.
///
/// Absent variables collect as empty strings; `PlanRegistry::from_prices`
/// rejects those at startup.
fn price_table_from_env() -> PriceTable {
    let var = |name: &str| std::env::var(name).unwrap_or_default();

    PriceTable {
        games_starter_monthly: var("STRIPE_PRICE_GAMES_STARTER_MONTHLY"),
        games_starter_annual: var("STRIPE_PRICE_GAMES_STARTER_ANNUAL"),
        games_pro_monthly: var("STRIPE_PRICE_GAMES_PRO_MONTHLY"),
        games_pro_annual: var("STRIPE_PRICE_GAMES_PRO_ANNUAL"),
        film_starter_monthly: var("STRIPE_PRICE_FILM_STARTER_MONTHLY"),
        film_starter_annual: var("STRIPE_PRICE_FILM_STARTER_ANNUAL"),
        film_pro_monthly: var("STRIPE_PRICE_FILM_PRO_MONTHLY"),
        film_pro_annual: var("STRIPE_PRICE_FILM_PRO_ANNUAL"),
        bundle_starter_monthly: var("STRIPE_PRICE_BUNDLE_STARTER_MONTHLY"),
        bundle_starter_annual: var("STRIPE_PRICE_BUNDLE_STARTER_ANNUAL"),
        bundle_pro_monthly: var("STRIPE_PRICE_BUNDLE_PRO_MONTHLY"),
        bundle_pro_annual: var("STRIPE_PRICE_BUNDLE_PRO_ANNUAL"),
    }
}
