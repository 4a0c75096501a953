//! Error types for plan configuration.

/// Errors raised while building the [`crate::PlanRegistry`].
///
/// These are configuration errors: they are detected once at process start
/// and abort startup rather than surfacing at first checkout.
#[derive(Debug, thiserror::Error)]
pub enum PlanConfigError {
    /// A purchasable plan key has no Stripe price id configured.
    #[error("plan {plan_key} has no price id configured")]
    MissingPriceId {
        /// The plan key missing its mapping.
        plan_key: String,
    },

    /// Two plan keys resolve to the same Stripe price id.
    #[error("price id {price_id} is mapped by both {first} and {second}")]
    DuplicatePriceId {
        /// The duplicated price id.
        price_id: String,
        /// The plan key that claimed the price id first.
        first: String,
        /// The plan key that collided with it.
        second: String,
    },
}
