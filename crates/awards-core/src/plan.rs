//! Plan definitions and the price-to-entitlement registry.
//!
//! The registry is built once at process start from a typed price table and
//! is the single source of truth mapping a Stripe price id to entitlement
//! values. Lookup by price id is total: an unrecognized price resolves to the
//! free default, never to an elevated tier.

use std::collections::HashMap;

use serde::Serialize;

use crate::error::PlanConfigError;
use crate::tier::{Domain, Tier};

/// Free-tier daily call limit.
pub const FREE_DAILY_LIMIT: i64 = 1_000;

/// Free-tier monthly call limit.
pub const FREE_MONTHLY_LIMIT: i64 = 1_000;

/// A priced offering: tier, allowed domains and quota ceilings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanDefinition {
    /// Internal plan key (`film_starter_monthly`, ...). `None` for the free
    /// default and for legacy price ids, which are not purchasable.
    pub plan_key: Option<String>,
    /// The tier this plan grants.
    pub tier: Tier,
    /// Dataset domains the plan authorizes.
    pub domains: Vec<Domain>,
    /// Daily call ceiling.
    pub daily_limit: i64,
    /// Monthly call ceiling.
    pub monthly_limit: i64,
    /// Stripe price id. `None` for the free default.
    pub price_id: Option<String>,
}

/// Stripe price ids for every purchasable plan, loaded from configuration.
///
/// Collected into one struct so a missing mapping is a startup failure, not
/// something discovered at first checkout.
#[derive(Debug, Clone, Default)]
#[allow(missing_docs)]
pub struct PriceTable {
    pub games_starter_monthly: String,
    pub games_starter_annual: String,
    pub games_pro_monthly: String,
    pub games_pro_annual: String,
    pub film_starter_monthly: String,
    pub film_starter_annual: String,
    pub film_pro_monthly: String,
    pub film_pro_annual: String,
    pub bundle_starter_monthly: String,
    pub bundle_starter_annual: String,
    pub bundle_pro_monthly: String,
    pub bundle_pro_annual: String,
}

impl PriceTable {
    fn entries(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("games_starter_monthly", &self.games_starter_monthly),
            ("games_starter_annual", &self.games_starter_annual),
            ("games_pro_monthly", &self.games_pro_monthly),
            ("games_pro_annual", &self.games_pro_annual),
            ("film_starter_monthly", &self.film_starter_monthly),
            ("film_starter_annual", &self.film_starter_annual),
            ("film_pro_monthly", &self.film_pro_monthly),
            ("film_pro_annual", &self.film_pro_annual),
            ("bundle_starter_monthly", &self.bundle_starter_monthly),
            ("bundle_starter_annual", &self.bundle_starter_annual),
            ("bundle_pro_monthly", &self.bundle_pro_monthly),
            ("bundle_pro_annual", &self.bundle_pro_annual),
        ]
    }
}

/// Entitlement values per plan key: tier, domains, daily limit, monthly limit.
const PLAN_TABLE: &[(&str, Tier, &[Domain], i64, i64)] = &[
    ("games_starter_monthly", Tier::GamesStarter, &[Domain::Games], 1_000, 10_000),
    ("games_starter_annual", Tier::GamesStarter, &[Domain::Games], 1_000, 10_000),
    ("games_pro_monthly", Tier::GamesPro, &[Domain::Games], 25_000, 250_000),
    ("games_pro_annual", Tier::GamesPro, &[Domain::Games], 25_000, 250_000),
    ("film_starter_monthly", Tier::FilmStarter, &[Domain::Film], 5_000, 50_000),
    ("film_starter_annual", Tier::FilmStarter, &[Domain::Film], 5_000, 50_000),
    ("film_pro_monthly", Tier::FilmPro, &[Domain::Film], 50_000, 500_000),
    ("film_pro_annual", Tier::FilmPro, &[Domain::Film], 50_000, 500_000),
    ("bundle_starter_monthly", Tier::BundleStarter, &[Domain::Games, Domain::Film], 6_000, 60_000),
    ("bundle_starter_annual", Tier::BundleStarter, &[Domain::Games, Domain::Film], 6_000, 60_000),
    ("bundle_pro_monthly", Tier::BundlePro, &[Domain::Games, Domain::Film], 70_000, 700_000),
    ("bundle_pro_annual", Tier::BundlePro, &[Domain::Games, Domain::Film], 70_000, 700_000),
];

/// Deprecated price ids still honored for grandfathered subscriptions.
/// These resolve by price id only and have no purchasable plan key.
const LEGACY_PRICES: &[(&str, Tier, i64, i64)] = &[
    ("price_professional_monthly", Tier::Professional, 3_333, 100_000),
    ("price_professional_annual", Tier::Professional, 3_333, 100_000),
    ("price_enterprise_monthly", Tier::Enterprise, 33_333, 1_000_000),
    ("price_enterprise_annual", Tier::Enterprise, 33_333, 1_000_000),
];

/// Maps plan keys and Stripe price ids to [`PlanDefinition`]s.
#[derive(Debug, Clone)]
pub struct PlanRegistry {
    plans: Vec<PlanDefinition>,
    by_key: HashMap<String, usize>,
    by_price: HashMap<String, usize>,
    legacy: Vec<PlanDefinition>,
    by_legacy_price: HashMap<String, usize>,
    free: PlanDefinition,
}

impl PlanRegistry {
    /// Build the registry from a price table.
    ///
    /// # Errors
    ///
    /// Returns [`PlanConfigError`] if any plan key has an empty price id or
    /// two plan keys share one. Both lookup tables must stay bijective; drift
    /// is a configuration error, not a runtime one.
    pub fn from_prices(prices: &PriceTable) -> Result<Self, PlanConfigError> {
        let price_by_key: HashMap<&str, &str> = prices.entries().into_iter().collect();

        let mut plans: Vec<PlanDefinition> = Vec::with_capacity(PLAN_TABLE.len());
        let mut by_key = HashMap::new();
        let mut by_price: HashMap<String, usize> = HashMap::new();

        for &(plan_key, tier, domains, daily_limit, monthly_limit) in PLAN_TABLE {
            let price_id = price_by_key
                .get(plan_key)
                .copied()
                .filter(|p| !p.is_empty())
                .ok_or_else(|| PlanConfigError::MissingPriceId {
                    plan_key: plan_key.to_string(),
                })?;

            if let Some(&existing) = by_price.get(price_id) {
                return Err(PlanConfigError::DuplicatePriceId {
                    price_id: price_id.to_string(),
                    first: plans[existing]
                        .plan_key
                        .clone()
                        .unwrap_or_default(),
                    second: plan_key.to_string(),
                });
            }

            let idx = plans.len();
            plans.push(PlanDefinition {
                plan_key: Some(plan_key.to_string()),
                tier,
                domains: domains.to_vec(),
                daily_limit,
                monthly_limit,
                price_id: Some(price_id.to_string()),
            });
            by_key.insert(plan_key.to_string(), idx);
            by_price.insert(price_id.to_string(), idx);
        }

        let mut legacy = Vec::with_capacity(LEGACY_PRICES.len());
        let mut by_legacy_price = HashMap::new();
        for &(price_id, tier, daily_limit, monthly_limit) in LEGACY_PRICES {
            by_legacy_price.insert(price_id.to_string(), legacy.len());
            legacy.push(PlanDefinition {
                plan_key: None,
                tier,
                domains: vec![Domain::Games, Domain::Film],
                daily_limit,
                monthly_limit,
                price_id: Some(price_id.to_string()),
            });
        }

        Ok(Self {
            plans,
            by_key,
            by_price,
            legacy,
            by_legacy_price,
            free: Self::free_default(),
        })
    }

    /// The fail-safe default: the free sampling tier with minimal limits.
    #[must_use]
    pub fn free_default() -> PlanDefinition {
        PlanDefinition {
            plan_key: None,
            tier: Tier::Free,
            domains: vec![Domain::Games, Domain::Film],
            daily_limit: FREE_DAILY_LIMIT,
            monthly_limit: FREE_MONTHLY_LIMIT,
            price_id: None,
        }
    }

    /// Look up a plan by its internal key.
    #[must_use]
    pub fn by_plan_key(&self, plan_key: &str) -> Option<&PlanDefinition> {
        self.by_key.get(plan_key).map(|&idx| &self.plans[idx])
    }

    /// Look up a plan by Stripe price id.
    ///
    /// Total over all inputs: an unrecognized price id resolves to the free
    /// default. Unknown billing price means free access, never full access.
    #[must_use]
    pub fn by_price_id(&self, price_id: &str) -> &PlanDefinition {
        if let Some(&idx) = self.by_price.get(price_id) {
            return &self.plans[idx];
        }
        if let Some(&idx) = self.by_legacy_price.get(price_id) {
            return &self.legacy[idx];
        }
        &self.free
    }

    /// Strict lookup of a purchasable plan by price id.
    ///
    /// Unlike [`Self::by_price_id`] this does not fall back to the free
    /// default and does not resolve legacy prices: the provisioner must
    /// reject a checkout against anything that is not currently for sale.
    #[must_use]
    pub fn purchasable_by_price_id(&self, price_id: &str) -> Option<&PlanDefinition> {
        self.by_price.get(price_id).map(|&idx| &self.plans[idx])
    }

    /// The free default held by this registry.
    #[must_use]
    pub fn free(&self) -> &PlanDefinition {
        &self.free
    }

    /// Ordered list of purchasable plan keys, for discoverability in
    /// `invalid_plan` rejections.
    #[must_use]
    pub fn plan_keys(&self) -> Vec<&str> {
        self.plans
            .iter()
            .filter_map(|p| p.plan_key.as_deref())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_prices() -> PriceTable {
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

    #[test]
    fn plan_key_and_price_id_lookups_agree() {
        let registry = PlanRegistry::from_prices(&test_prices()).unwrap();

        for key in registry.plan_keys() {
            let by_key = registry.by_plan_key(key).unwrap();
            let price_id = by_key.price_id.as_deref().unwrap();
            assert_eq!(registry.by_price_id(price_id), by_key);
        }
    }

    #[test]
    fn unknown_price_id_resolves_to_free() {
        let registry = PlanRegistry::from_prices(&test_prices()).unwrap();

        let plan = registry.by_price_id("price_never_configured");
        assert_eq!(plan.tier, Tier::Free);
        assert_eq!(plan.daily_limit, FREE_DAILY_LIMIT);
        assert_eq!(plan.monthly_limit, FREE_MONTHLY_LIMIT);
    }

    #[test]
    fn unknown_plan_key_is_none() {
        let registry = PlanRegistry::from_prices(&test_prices()).unwrap();
        assert!(registry.by_plan_key("film_platinum_weekly").is_none());
    }

    #[test]
    fn film_starter_entitlements() {
        let registry = PlanRegistry::from_prices(&test_prices()).unwrap();

        let plan = registry.by_plan_key("film_starter_monthly").unwrap();
        assert_eq!(plan.tier, Tier::FilmStarter);
        assert_eq!(plan.domains, vec![Domain::Film]);
        assert_eq!(plan.daily_limit, 5_000);
        assert_eq!(plan.monthly_limit, 50_000);
    }

    #[test]
    fn purchasable_lookup_is_strict() {
        let registry = PlanRegistry::from_prices(&test_prices()).unwrap();

        assert!(registry.purchasable_by_price_id("price_fsm").is_some());
        assert!(registry.purchasable_by_price_id("price_unknown").is_none());
        // Legacy prices are honored by the webhook path, not for sale.
        assert!(registry.purchasable_by_price_id("price_professional_monthly").is_none());
    }

    #[test]
    fn legacy_price_ids_resolve_without_plan_key() {
        let registry = PlanRegistry::from_prices(&test_prices()).unwrap();

        let plan = registry.by_price_id("price_enterprise_annual");
        assert_eq!(plan.tier, Tier::Enterprise);
        assert_eq!(plan.daily_limit, 33_333);
        assert!(plan.plan_key.is_none());
        assert!(!registry.plan_keys().contains(&"price_enterprise_annual"));
    }

    #[test]
    fn missing_price_id_fails_construction() {
        let mut prices = test_prices();
        prices.film_pro_annual = String::new();

        let err = PlanRegistry::from_prices(&prices).unwrap_err();
        assert!(matches!(
            err,
            PlanConfigError::MissingPriceId { plan_key } if plan_key == "film_pro_annual"
        ));
    }

    #[test]
    fn duplicate_price_id_fails_construction() {
        let mut prices = test_prices();
        prices.bundle_pro_annual = "price_gsm".into();

        let err = PlanRegistry::from_prices(&prices).unwrap_err();
        assert!(matches!(err, PlanConfigError::DuplicatePriceId { .. }));
    }
}
