//! Entitlement tiers and dataset domains.

use serde::{Deserialize, Serialize};

/// A dataset partition a key may or may not be authorized against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    /// Board-game awards data.
    Games,
    /// Film awards data (Oscars et al).
    Film,
}

impl Domain {
    /// The stored label for this domain.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Games => "games",
            Self::Film => "film",
        }
    }
}

impl std::fmt::Display for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Domain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "games" => Ok(Self::Games),
            "film" => Ok(Self::Film),
            other => Err(format!("unknown domain: {other}")),
        }
    }
}

/// Named entitlement level determining quota and domain access.
///
/// `Professional` and `Enterprise` are legacy tiers kept for grandfathered
/// subscriptions; they cannot be purchased through current plan keys but
/// their price ids still resolve through the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// Zero-cost sampling tier with minimal limits.
    Free,
    /// Games starter plan.
    GamesStarter,
    /// Games pro plan.
    GamesPro,
    /// Film starter plan.
    FilmStarter,
    /// Film pro plan.
    FilmPro,
    /// Games + film bundle, starter limits.
    BundleStarter,
    /// Games + film bundle, pro limits.
    BundlePro,
    /// Legacy professional tier.
    Professional,
    /// Legacy enterprise tier.
    Enterprise,
}

impl Tier {
    /// The stored label for this tier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::GamesStarter => "games_starter",
            Self::GamesPro => "games_pro",
            Self::FilmStarter => "film_starter",
            Self::FilmPro => "film_pro",
            Self::BundleStarter => "bundle_starter",
            Self::BundlePro => "bundle_pro",
            Self::Professional => "professional",
            Self::Enterprise => "enterprise",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "free" => Ok(Self::Free),
            "games_starter" => Ok(Self::GamesStarter),
            "games_pro" => Ok(Self::GamesPro),
            "film_starter" => Ok(Self::FilmStarter),
            "film_pro" => Ok(Self::FilmPro),
            "bundle_starter" => Ok(Self::BundleStarter),
            "bundle_pro" => Ok(Self::BundlePro),
            "professional" => Ok(Self::Professional),
            "enterprise" => Ok(Self::Enterprise),
            other => Err(format!("unknown tier: {other}")),
        }
    }
}
