//! Stripe API types.

use serde::Deserialize;

/// Stripe customer object.
#[derive(Debug, Clone, Deserialize)]
pub struct Customer {
    /// Stripe customer ID.
    pub id: String,
    /// Customer email.
    #[serde(default)]
    pub email: Option<String>,
    /// Customer name.
    #[serde(default)]
    pub name: Option<String>,
    /// Metadata attached to the customer.
    #[serde(default)]
    pub metadata: serde_json::Value,
    /// Created timestamp (Unix).
    #[serde(default)]
    pub created: i64,
}

/// Stripe subscription object.
#[derive(Debug, Clone, Deserialize)]
pub struct Subscription {
    /// Subscription ID.
    pub id: String,
    /// Subscription status (incomplete, active, past_due, ...).
    #[serde(default)]
    pub status: String,
    /// Owning customer ID.
    #[serde(default)]
    pub customer: Option<String>,
    /// Subscription items.
    #[serde(default)]
    pub items: SubscriptionItems,
    /// Latest invoice, expanded to reach the payment intent.
    #[serde(default)]
    pub latest_invoice: Option<Invoice>,
}

/// Subscription item list.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubscriptionItems {
    /// Item rows.
    #[serde(default)]
    pub data: Vec<SubscriptionItem>,
}

/// One subscription item.
#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionItem {
    /// Item ID.
    pub id: String,
    /// The billed price.
    pub price: Price,
}

/// Stripe price object (the subset this service reads).
#[derive(Debug, Clone, Deserialize)]
pub struct Price {
    /// Price ID.
    pub id: String,
}

/// Invoice, carrying the expanded payment intent.
#[derive(Debug, Clone, Deserialize)]
pub struct Invoice {
    /// Invoice ID.
    pub id: String,
    /// Expanded payment intent, when requested.
    #[serde(default)]
    pub payment_intent: Option<PaymentIntent>,
}

/// Stripe `PaymentIntent` object.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentIntent {
    /// Payment intent ID.
    pub id: String,
    /// Status (requires_payment_method, succeeded, ...).
    #[serde(default)]
    pub status: String,
    /// Client secret for browser-side payment confirmation.
    #[serde(default)]
    pub client_secret: Option<String>,
}

/// Stripe list response wrapper.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeList<T> {
    /// Object type (always "list").
    pub object: String,
    /// Data items.
    pub data: Vec<T>,
    /// Whether there are more items.
    pub has_more: bool,
}

/// Stripe API error response.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeErrorResponse {
    /// Error details.
    pub error: StripeErrorDetail,
}

/// Stripe error detail.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeErrorDetail {
    /// Error type.
    #[serde(rename = "type")]
    pub error_type: String,
    /// Error message.
    pub message: String,
    /// Error code.
    #[serde(default)]
    pub code: Option<String>,
    /// Parameter that caused the error.
    #[serde(default)]
    pub param: Option<String>,
}
