//! Shareable query-string form of a [`SearchFilter`].
//!
//! One key per leaf field. Defaults are omitted, amenity ids are comma-joined
//! in selection order, and flags are `1` or absent. Text is carried verbatim
//! in both directions; only an empty value counts as absent. Decoding never
//! fails: unknown keys are ignored and malformed values fall back to the
//! default.

use std::fmt;

use tracing::{debug, warn};

use super::{
    Amenities, Flags, ListingScope, LocationFilter, PostedSince, PriceRange, PropertyType,
    SearchFilter,
};
use crate::error::ValidationError;
use crate::navigation::Navigator;

pub const PROPERTY_TYPE: &str = "property_type";
pub const CATEGORY_ID: &str = "category_id";
pub const CITY: &str = "city";
pub const STATE: &str = "state";
pub const COUNTRY: &str = "country";
pub const MIN_PRICE: &str = "min_price";
pub const MAX_PRICE: &str = "max_price";
pub const POSTED_SINCE: &str = "posted_since";
pub const AMENITIES: &str = "amenities";
pub const PROMOTED: &str = "promoted";
pub const IS_PREMIUM: &str = "is_premium";
pub const MOST_VIEWED: &str = "most_viewed";
pub const MOST_LIKED: &str = "most_liked";
pub const KEYWORDS: &str = "keywords";

/// Ordered key/value pairs of a URL query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryString(Vec<(String, String)>);

impl QueryString {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses `a=1&b=2`, with or without a leading `?`. Undecodable input
    /// yields an empty query.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.strip_prefix('?').unwrap_or(raw);
        match serde_urlencoded::from_str::<Vec<(String, String)>>(raw) {
            Ok(pairs) => Self(pairs),
            Err(e) => {
                warn!("Ignoring undecodable query string: {}", e);
                Self::default()
            }
        }
    }

    pub fn push(&mut self, key: &str, value: impl Into<String>) {
        self.0.push((key.to_string(), value.into()));
    }

    /// First value for `key`, if non-empty
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .filter(|v| !v.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.0
    }
}

impl fmt::Display for QueryString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let encoded = serde_urlencoded::to_string(&self.0).map_err(|_| fmt::Error)?;
        f.write_str(&encoded)
    }
}

impl FromIterator<(String, String)> for QueryString {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Projects a filter onto query pairs, skipping fields at their default
pub fn encode(filter: &SearchFilter) -> QueryString {
    let mut query = QueryString::new();

    match filter.property_type {
        PropertyType::All => {}
        PropertyType::Sell => query.push(PROPERTY_TYPE, "Sell"),
        PropertyType::Rent => query.push(PROPERTY_TYPE, "Rent"),
    }
    if let Some(id) = filter.category_id {
        query.push(CATEGORY_ID, id.to_string());
    }
    push_text(&mut query, CITY, filter.location.city.as_deref());
    push_text(&mut query, STATE, filter.location.state.as_deref());
    push_text(&mut query, COUNTRY, filter.location.country.as_deref());
    if let Some(min) = filter.price.min {
        query.push(MIN_PRICE, min.to_string());
    }
    if let Some(max) = filter.price.max {
        query.push(MAX_PRICE, max.to_string());
    }
    if let Some(key) = filter.posted_since.url_key() {
        query.push(POSTED_SINCE, key);
    }
    if !filter.amenities.is_empty() {
        query.push(AMENITIES, filter.amenities.joined());
    }
    push_flag(&mut query, PROMOTED, filter.flags.promoted);
    push_flag(&mut query, IS_PREMIUM, filter.flags.is_premium);
    push_flag(&mut query, MOST_VIEWED, filter.flags.most_viewed);
    push_flag(&mut query, MOST_LIKED, filter.flags.most_liked);
    push_text(&mut query, KEYWORDS, Some(&filter.keywords));

    query
}

/// Rebuilds a filter from query pairs. Missing or malformed keys become defaults.
pub fn decode(query: &QueryString) -> SearchFilter {
    let property_type = match query.get(PROPERTY_TYPE) {
        Some(v) if v.eq_ignore_ascii_case("sell") => PropertyType::Sell,
        Some(v) if v.eq_ignore_ascii_case("rent") => PropertyType::Rent,
        _ => PropertyType::All,
    };

    let amenities: Amenities = query
        .get(AMENITIES)
        .map(|raw| {
            raw.split(',')
                .filter_map(|id| id.trim().parse::<u64>().ok())
                .collect()
        })
        .unwrap_or_default();

    SearchFilter {
        property_type,
        category_id: parse_number(query, CATEGORY_ID),
        location: LocationFilter {
            city: query.get(CITY).map(str::to_string),
            state: query.get(STATE).map(str::to_string),
            country: query.get(COUNTRY).map(str::to_string),
        },
        price: PriceRange {
            min: parse_number(query, MIN_PRICE),
            max: parse_number(query, MAX_PRICE),
        },
        posted_since: query
            .get(POSTED_SINCE)
            .map(PostedSince::from_url_key)
            .unwrap_or_default(),
        amenities,
        flags: Flags {
            promoted: parse_flag(query, PROMOTED),
            is_premium: parse_flag(query, IS_PREMIUM),
            most_viewed: parse_flag(query, MOST_VIEWED),
            most_liked: parse_flag(query, MOST_LIKED),
        },
        keywords: query.get(KEYWORDS).unwrap_or_default().to_string(),
    }
}

fn push_text(query: &mut QueryString, key: &str, value: Option<&str>) {
    if let Some(value) = value.filter(|v| !v.is_empty()) {
        query.push(key, value);
    }
}

fn push_flag(query: &mut QueryString, key: &str, set: bool) {
    if set {
        query.push(key, "1");
    }
}

fn parse_flag(query: &QueryString, key: &str) -> bool {
    matches!(query.get(key), Some("1") | Some("true"))
}

fn parse_number(query: &QueryString, key: &str) -> Option<u64> {
    let raw = query.get(key)?;
    match raw.trim().parse() {
        Ok(n) => Some(n),
        Err(_) => {
            debug!(key, raw, "dropping malformed numeric query value");
            None
        }
    }
}

/// Keeps the navigation host's address in step with the current filter
pub struct UrlSynchronizer<N> {
    navigator: N,
    path: String,
    scope: ListingScope,
}

impl<N: Navigator> UrlSynchronizer<N> {
    pub fn new(navigator: N, path: impl Into<String>, scope: ListingScope) -> Self {
        Self {
            navigator,
            path: path.into(),
            scope,
        }
    }

    pub fn scope(&self) -> &ListingScope {
        &self.scope
    }

    pub fn navigator(&self) -> &N {
        &self.navigator
    }

    /// Filter described by the host's current address, with the page scope applied
    pub fn current(&self) -> SearchFilter {
        self.scope.apply(decode(&self.navigator.current_query()))
    }

    /// Validates `filter` and pushes it as a new history entry.
    ///
    /// Scope-pinned values stay out of the URL. Nothing is pushed when the
    /// address already describes the same filter.
    pub fn apply(&self, filter: SearchFilter) -> Result<SearchFilter, ValidationError> {
        let filter = self.scope.apply(filter.validate()?);
        let query = encode(&self.scope.strip(filter.clone()));

        if query == self.navigator.current_query() {
            debug!(path = %self.path, "filter unchanged, not pushing history");
        } else {
            debug!(path = %self.path, query = %query, "pushing filter to history");
            self.navigator.push_query(&self.path, &query);
        }
        Ok(filter)
    }

    /// Navigates to the bare path, returning the scope's cleared filter
    pub fn clear(&self) -> SearchFilter {
        if !self.navigator.current_query().is_empty() {
            self.navigator.push_query(&self.path, &QueryString::new());
        }
        SearchFilter::cleared_for(&self.scope)
    }
}
