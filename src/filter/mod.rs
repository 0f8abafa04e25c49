//! Canonical property search query.
//!
//! A [`SearchFilter`] is plain data: every UI surface (side filter, home
//! search box, view-all pages) converts its own form state into this one
//! shape before anything downstream sees it. Structural equality decides
//! whether the fetch controller needs to run a new search.

pub mod query;
pub mod section;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::geocode::Address;

pub use query::{decode, encode, QueryString, UrlSynchronizer};
pub use section::{ListingScope, SectionDescriptor, SectionKind};

/// Sell/rent selector. `All` sends no constraint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PropertyType {
    #[default]
    All,
    Sell,
    Rent,
}

/// Recency window on the listing's post date
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PostedSince {
    #[default]
    Anytime,
    Yesterday,
    LastWeek,
    LastMonth,
    Last3Months,
    Last6Months,
}

impl PostedSince {
    pub const ALL: [PostedSince; 6] = [
        PostedSince::Anytime,
        PostedSince::Yesterday,
        PostedSince::LastWeek,
        PostedSince::LastMonth,
        PostedSince::Last3Months,
        PostedSince::Last6Months,
    ];

    /// Key used in shareable URLs
    pub fn url_key(self) -> Option<&'static str> {
        match self {
            PostedSince::Anytime => None,
            PostedSince::Yesterday => Some("yesterday"),
            PostedSince::LastWeek => Some("lastWeek"),
            PostedSince::LastMonth => Some("lastMonth"),
            PostedSince::Last3Months => Some("last3Months"),
            PostedSince::Last6Months => Some("last6Months"),
        }
    }

    /// Value understood by the List API
    pub fn api_value(self) -> Option<&'static str> {
        match self {
            PostedSince::Anytime => None,
            PostedSince::Yesterday => Some("yesterday"),
            PostedSince::LastWeek => Some("last_week"),
            PostedSince::LastMonth => Some("last_month"),
            PostedSince::Last3Months => Some("last_3_months"),
            PostedSince::Last6Months => Some("last_6_months"),
        }
    }

    pub fn from_url_key(key: &str) -> Self {
        PostedSince::ALL
            .into_iter()
            .find(|p| p.url_key() == Some(key))
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationFilter {
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
}

impl LocationFilter {
    pub fn is_empty(&self) -> bool {
        self.city.is_none() && self.state.is_none() && self.country.is_none()
    }

    /// "City, State, Country" when all three are known
    pub fn formatted(&self) -> Option<String> {
        match (&self.city, &self.state, &self.country) {
            (Some(city), Some(state), Some(country)) => {
                Some(format!("{}, {}, {}", city, state, country))
            }
            _ => None,
        }
    }
}

impl From<&Address> for LocationFilter {
    fn from(address: &Address) -> Self {
        Self {
            city: non_empty(&address.city),
            state: non_empty(&address.state),
            country: non_empty(&address.country),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: Option<u64>,
    pub max: Option<u64>,
}

impl PriceRange {
    pub fn is_empty(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flags {
    pub promoted: bool,
    pub is_premium: bool,
    pub most_viewed: bool,
    pub most_liked: bool,
}

impl Flags {
    pub fn any(&self) -> bool {
        self.promoted || self.is_premium || self.most_viewed || self.most_liked
    }

    /// Union of two flag sets
    pub fn with(self, other: Flags) -> Flags {
        Flags {
            promoted: self.promoted || other.promoted,
            is_premium: self.is_premium || other.is_premium,
            most_viewed: self.most_viewed || other.most_viewed,
            most_liked: self.most_liked || other.most_liked,
        }
    }
}

/// Selected facility ids.
///
/// Keeps the order ids were added in but compares as a set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Amenities(Vec<u64>);

impl Amenities {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if the id was already selected
    pub fn insert(&mut self, id: u64) -> bool {
        if self.0.contains(&id) {
            return false;
        }
        self.0.push(id);
        true
    }

    pub fn remove(&mut self, id: u64) -> bool {
        let before = self.0.len();
        self.0.retain(|&held| held != id);
        self.0.len() != before
    }

    pub fn toggle(&mut self, id: u64) {
        if !self.remove(id) {
            self.0.push(id);
        }
    }

    pub fn contains(&self, id: u64) -> bool {
        self.0.contains(&id)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = u64> + '_ {
        self.0.iter().copied()
    }

    /// Comma-joined, in selection order
    pub fn joined(&self) -> String {
        self.0
            .iter()
            .map(u64::to_string)
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl PartialEq for Amenities {
    fn eq(&self, other: &Self) -> bool {
        if self.0.len() != other.0.len() {
            return false;
        }
        let mut left = self.0.clone();
        let mut right = other.0.clone();
        left.sort_unstable();
        right.sort_unstable();
        left == right
    }
}

impl Eq for Amenities {}

impl FromIterator<u64> for Amenities {
    fn from_iter<I: IntoIterator<Item = u64>>(iter: I) -> Self {
        let mut amenities = Amenities::new();
        for id in iter {
            amenities.insert(id);
        }
        amenities
    }
}

/// Canonical property search query
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFilter {
    pub property_type: PropertyType,
    pub category_id: Option<u64>,
    pub location: LocationFilter,
    pub price: PriceRange,
    pub posted_since: PostedSince,
    pub amenities: Amenities,
    pub flags: Flags,
    pub keywords: String,
}

impl SearchFilter {
    /// Checks the filter can be submitted, handing it back unchanged
    pub fn validate(self) -> Result<SearchFilter, ValidationError> {
        if let (Some(min), Some(max)) = (self.price.min, self.price.max) {
            if min > max {
                return Err(ValidationError::InvalidRange { min, max });
            }
        }
        Ok(self)
    }

    /// Whether the user has narrowed the search beyond what `scope` implies
    pub fn is_active(&self, scope: &ListingScope) -> bool {
        let forced = scope.forced_flags();
        let user_flags = Flags {
            promoted: self.flags.promoted && !forced.promoted,
            is_premium: self.flags.is_premium && !forced.is_premium,
            most_viewed: self.flags.most_viewed && !forced.most_viewed,
            most_liked: self.flags.most_liked && !forced.most_liked,
        };
        let city_is_scope = match (scope.city_slug(), &self.location.city) {
            (Some(slug), Some(city)) => slug.eq_ignore_ascii_case(city),
            _ => false,
        };

        !self.keywords.is_empty()
            || self.property_type != PropertyType::All
            || self.category_id.is_some()
            || !self.price.is_empty()
            || self.posted_since != PostedSince::Anytime
            || !self.amenities.is_empty()
            || user_flags.any()
            || (self.location.city.is_some() && !city_is_scope)
            || self.location.state.is_some()
            || self.location.country.is_some()
    }

    /// Defaults, except for whatever `scope` pins
    pub fn cleared_for(scope: &ListingScope) -> SearchFilter {
        scope.apply(SearchFilter::default())
    }
}

/// Free-function form of [`SearchFilter::validate`]
pub fn validate(filter: SearchFilter) -> Result<SearchFilter, ValidationError> {
    filter.validate()
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
