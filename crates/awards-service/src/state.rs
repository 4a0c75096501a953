//! Application state.

use std::sync::Arc;

use awards_core::{PlanConfigError, PlanRegistry};
use awards_store::Store;

use crate::config::ServiceConfig;
use crate::stripe::StripeClient;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// The storage backend.
    pub store: Arc<dyn Store>,

    /// Service configuration.
    pub config: ServiceConfig,

    /// Validated plan catalog.
    pub registry: Arc<PlanRegistry>,

    /// Stripe client for subscription billing (optional).
    pub stripe: Option<Arc<StripeClient>>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// Validates the configured price table into a plan registry; an
    /// incomplete or duplicated price mapping fails here rather than at
    /// first checkout.
    ///
    /// # Errors
    ///
    /// Returns `PlanConfigError` if the price table is invalid.
    pub fn new(store: Arc<dyn Store>, config: ServiceConfig) -> Result<Self, PlanConfigError> {
        let registry = Arc::new(PlanRegistry::from_prices(&config.prices)?);

        // Create Stripe client if configured
        let stripe = config.stripe_api_key.as_ref().map(|key| {
            tracing::info!("Stripe integration enabled");
            Arc::new(StripeClient::new(key, &config.stripe_api_base))
        });

        if stripe.is_none() {
            tracing::warn!("Stripe not configured - subscription provisioning unavailable");
        }

        if config.stripe_webhook_secret.is_none() {
            tracing::warn!("Webhook secret not configured - signature verification disabled");
        }

        if config.dev_mode {
            tracing::warn!("Development mode enabled - unauthenticated browsing allowed");
        }

        Ok(Self {
            store,
            config,
            registry,
            stripe,
        })
    }
}
