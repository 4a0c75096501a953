//! Stripe API client implementation.

use reqwest::Client;
use std::time::Duration;

use super::types::{Customer, StripeErrorResponse, StripeList, Subscription};

/// Stripe API base URL (production).
pub const DEFAULT_API_BASE: &str = "https://api.stripe.com/v1";

/// Error type for Stripe operations.
#[derive(Debug, thiserror::Error)]
pub enum StripeError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Stripe API returned an error.
    #[error("Stripe API error: {error_type} - {message}")]
    Api {
        /// Error type.
        error_type: String,
        /// Error message.
        message: String,
        /// Error code.
        code: Option<String>,
    },

    /// Invalid webhook signature.
    #[error("Invalid webhook signature")]
    InvalidSignature,
}

/// Stripe API client.
#[derive(Debug, Clone)]
pub struct StripeClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl StripeClient {
    /// Create a new Stripe client.
    ///
    /// # Arguments
    ///
    /// * `api_key` - Stripe secret API key (`sk_test_...` or `sk_live_...`)
    /// * `base_url` - API base, overridable so tests can point at a mock
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built.
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            api_key: api_key.into(),
            base_url: base_url.into(),
        }
    }

    /// Look up an existing customer by email.
    ///
    /// Returns the most recent match, so repeated provisioning requests for
    /// the same email reuse one customer record.
    ///
    /// # Errors
    ///
    /// Returns an error if the request or the Stripe API call fails.
    pub async fn find_customer_by_email(
        &self,
        email: &str,
    ) -> Result<Option<Customer>, StripeError> {
        let response = self
            .client
            .get(format!("{}/customers", self.base_url))
            .basic_auth(&self.api_key, Option::<&str>::None)
            .query(&[("email", email), ("limit", "1")])
            .send()
            .await?;

        let list: StripeList<Customer> = self.handle_response(response).await?;
        Ok(list.data.into_iter().next())
    }

    /// Create a new Stripe customer.
    ///
    /// # Arguments
    ///
    /// * `email` - Customer email
    /// * `name` - Customer name
    /// * `tier` - Entitlement tier label (stored as metadata)
    /// * `domains` - Comma-joined dataset list (stored as metadata)
    ///
    /// # Errors
    ///
    /// Returns an error if the request or the Stripe API call fails.
    pub async fn create_customer(
        &self,
        email: &str,
        name: &str,
        tier: &str,
        domains: &str,
    ) -> Result<Customer, StripeError> {
        let params = [
            ("email", email),
            ("name", name),
            ("metadata[tier]", tier),
            ("metadata[domains]", domains),
        ];

        let response = self
            .client
            .post(format!("{}/customers", self.base_url))
            .basic_auth(&self.api_key, Option::<&str>::None)
            .form(&params)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Create a subscription for a customer on one price.
    ///
    /// Uses `payment_behavior=default_incomplete`: the subscription is created
    /// immediately and payment is confirmed client-side with the returned
    /// payment intent's client secret. The latest invoice is expanded to
    /// reach that secret in one round trip.
    ///
    /// # Errors
    ///
    /// Returns an error if the request or the Stripe API call fails.
    pub async fn create_subscription(
        &self,
        customer_id: &str,
        price_id: &str,
    ) -> Result<Subscription, StripeError> {
        let params = [
            ("customer", customer_id),
            ("items[0][price]", price_id),
            ("payment_behavior", "default_incomplete"),
            ("expand[]", "latest_invoice.payment_intent"),
        ];

        tracing::debug!(
            customer_id = %customer_id,
            price_id = %price_id,
            "Creating Stripe subscription"
        );

        let response = self
            .client
            .post(format!("{}/subscriptions", self.base_url))
            .basic_auth(&self.api_key, Option::<&str>::None)
            .form(&params)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Handle API response and convert errors.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, StripeError> {
        let status = response.status();

        if status.is_success() {
            return Ok(response.json().await?);
        }

        // Try to parse error response
        let error_body: Result<StripeErrorResponse, _> = response.json().await;

        match error_body {
            Ok(stripe_error) => Err(StripeError::Api {
                error_type: stripe_error.error.error_type,
                message: stripe_error.error.message,
                code: stripe_error.error.code,
            }),
            Err(_) => Err(StripeError::Api {
                error_type: "unknown".to_string(),
                message: format!("HTTP {status}"),
                code: None,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_creation() {
        let client = StripeClient::new("sk_test_xxx", DEFAULT_API_BASE);
        assert_eq!(client.base_url, DEFAULT_API_BASE);
    }
}
