//! Awards dataset rows and the browse query shape.

use serde::{Deserialize, Serialize};

use crate::tier::Domain;

/// Default page size for browse queries.
pub const BROWSE_DEFAULT_LIMIT: i64 = 50;

/// Hard cap on browse page size.
pub const BROWSE_MAX_LIMIT: i64 = 500;

/// A person attached to a nomination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NominationPerson {
    /// Person name.
    pub name: String,
    /// Their role on the nomination (director, actor, ...).
    pub role: Option<String>,
}

/// One nomination row as served by the browse endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Nomination {
    /// Ceremony year.
    pub ceremony_year: i32,
    /// Ceremony name.
    pub ceremony_name: String,
    /// Award category name.
    pub category_name: String,
    /// IMDb id of the nominated work, when known.
    pub imdb_id: Option<String>,
    /// Title of the nominated work.
    pub film_title: String,
    /// Whether the nomination won.
    pub is_win: bool,
    /// People credited on the nomination.
    pub people: Vec<NominationPerson>,
}

/// Sort order for browse results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NominationSort {
    /// Newest ceremonies first (default).
    #[default]
    YearDesc,
    /// Oldest ceremonies first.
    YearAsc,
    /// Category name, then year descending.
    Category,
    /// Work title, then year descending.
    Film,
}

impl NominationSort {
    /// Parse a `sort` query parameter, falling back to the default.
    #[must_use]
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("year_asc") => Self::YearAsc,
            Some("category") => Self::Category,
            Some("film") => Self::Film,
            _ => Self::YearDesc,
        }
    }
}

/// A composable browse query over one dataset domain.
///
/// Predicates are optional and combined compositionally; the store builds a
/// single statement from whichever are present.
#[derive(Debug, Clone)]
pub struct NominationQuery {
    /// The dataset domain being browsed.
    pub domain: Domain,
    /// Ceremony year filter.
    pub year: Option<i32>,
    /// Category substring filter (case-insensitive).
    pub category: Option<String>,
    /// Restrict to winning nominations.
    pub winners_only: bool,
    /// IMDb id filter.
    pub imdb_id: Option<String>,
    /// Sort order.
    pub sort: NominationSort,
    /// Page size (clamped to [`BROWSE_MAX_LIMIT`]).
    pub limit: i64,
    /// Pagination offset.
    pub offset: i64,
}

impl NominationQuery {
    /// An unfiltered first page for the given domain.
    #[must_use]
    pub fn new(domain: Domain) -> Self {
        Self {
            domain,
            year: None,
            category: None,
            winners_only: false,
            imdb_id: None,
            sort: NominationSort::default(),
            limit: BROWSE_DEFAULT_LIMIT,
            offset: 0,
        }
    }

    /// Clamp the page size into `1..=BROWSE_MAX_LIMIT`.
    #[must_use]
    pub fn clamped_limit(&self) -> i64 {
        self.limit.clamp(1, BROWSE_MAX_LIMIT)
    }
}

/// One page of browse results plus the unpaginated total.
#[derive(Debug, Clone, Serialize)]
pub struct NominationPage {
    /// Total rows matching the predicates.
    pub total: i64,
    /// The page of rows.
    pub results: Vec<Nomination>,
}
