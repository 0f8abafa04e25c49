use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::FetchError;
use crate::filter::{ListingScope, PropertyType, SearchFilter};
use crate::models::Listing;

/// Result ordering for listing searches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    #[default]
    Newest,
    Oldest,
    PriceLowHigh,
    PriceHighLow,
    MostViewed,
    MostLiked,
}

impl SortOrder {
    pub fn api_value(self) -> &'static str {
        match self {
            SortOrder::Newest => "newest",
            SortOrder::Oldest => "oldest",
            SortOrder::PriceLowHigh => "price_low_high",
            SortOrder::PriceHighLow => "price_high_low",
            SortOrder::MostViewed => "most_viewed",
            SortOrder::MostLiked => "most_liked",
        }
    }
}

/// One page request against the List API
#[derive(Debug, Clone, PartialEq)]
pub struct ListRequest {
    pub filter: SearchFilter,
    pub scope: ListingScope,
    pub sort: SortOrder,
    pub offset: u64,
    pub limit: u64,
}

impl ListRequest {
    /// Query parameters in the List API's vocabulary, empty values omitted
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let filter = &self.filter;
        let mut params = Vec::new();
        let mut push = |key: &'static str, value: Option<String>| {
            if let Some(value) = value.filter(|v| !v.is_empty()) {
                params.push((key, value));
            }
        };
        let flag = |set: bool| set.then(|| "1".to_string());

        push(
            "property_type",
            match filter.property_type {
                PropertyType::All => None,
                PropertyType::Sell => Some("0".to_string()),
                PropertyType::Rent => Some("1".to_string()),
            },
        );
        push("category_id", filter.category_id.map(|id| id.to_string()));
        push(
            "category_slug_id",
            self.scope.category_slug().map(str::to_string),
        );
        push("city", filter.location.city.clone());
        push("state", filter.location.state.clone());
        push("country", filter.location.country.clone());
        push("min_price", filter.price.min.map(|p| p.to_string()));
        push("max_price", filter.price.max.map(|p| p.to_string()));
        push(
            "posted_since",
            filter.posted_since.api_value().map(str::to_string),
        );
        push("most_viewed", flag(filter.flags.most_viewed));
        push("most_liked", flag(filter.flags.most_liked));
        push("promoted", flag(filter.flags.promoted));
        push("get_all_premium_properties", flag(filter.flags.is_premium));
        push("parameter_id", Some(filter.amenities.joined()));
        push("search", Some(filter.keywords.clone()));
        push("limit", Some(self.limit.to_string()));
        push("offset", Some(self.offset.to_string()));
        push("sort", Some(self.sort.api_value().to_string()));

        params
    }
}

/// A successfully fetched page of listings
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListPage {
    pub data: Vec<Listing>,
    /// Server-reported count of all matches for the filter
    pub total: u64,
}

/// Raw List API body
#[derive(Debug, Deserialize)]
pub struct ListResponse {
    #[serde(default)]
    pub data: Vec<Listing>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub error: Option<serde_json::Value>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ListResponse {
    pub fn into_page(self) -> Result<ListPage, FetchError> {
        api_error(self.error.as_ref(), self.message.as_deref())?;
        Ok(ListPage {
            data: self.data,
            total: self.total,
        })
    }
}

/// Shared reference lists used by the filter UIs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReferenceKind {
    Categories,
    Facilities,
}

impl ReferenceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ReferenceKind::Categories => "categories",
            ReferenceKind::Facilities => "facilities",
        }
    }
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceRequest {
    pub kind: ReferenceKind,
    pub locale: String,
    pub offset: u64,
    pub limit: u64,
}

/// A category or facility
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReferenceItem {
    #[serde(alias = "category_id")]
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub translated_name: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

impl ReferenceItem {
    /// Localized name when the server sent one
    pub fn display_name(&self) -> &str {
        [&self.translated_name, &self.name, &self.category]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .find(|name| !name.is_empty())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferencePage {
    pub data: Vec<ReferenceItem>,
    pub total: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct ReferenceResponse {
    #[serde(default)]
    pub data: Vec<ReferenceItem>,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub error: Option<serde_json::Value>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ReferenceResponse {
    pub fn into_page(self) -> Result<ReferencePage, FetchError> {
        api_error(self.error.as_ref(), self.message.as_deref())?;
        Ok(ReferencePage {
            data: self.data,
            total: self.total,
        })
    }
}

// The backend reports failure as `error: true` plus `message`, or as an
// error string. `error: false`/null/"" mean success.
fn api_error(error: Option<&serde_json::Value>, message: Option<&str>) -> Result<(), FetchError> {
    use serde_json::Value;

    let text = match error {
        None | Some(Value::Null) | Some(Value::Bool(false)) => return Ok(()),
        Some(Value::String(s)) if s.is_empty() => return Ok(()),
        Some(Value::String(s)) => s.clone(),
        Some(other) => message
            .map(str::to_string)
            .unwrap_or_else(|| other.to_string()),
    };
    Err(FetchError::Api { message: text })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{PostedSince, PriceRange};
    use serde_json::json;

    #[test]
    fn test_list_params_use_api_vocabulary() {
        let mut filter = SearchFilter::default();
        filter.property_type = PropertyType::Sell;
        filter.posted_since = PostedSince::LastWeek;
        filter.price = PriceRange {
            min: Some(100),
            max: None,
        };
        filter.amenities = [4, 2].into_iter().collect();
        filter.flags.is_premium = true;
        filter.keywords = "duplex".to_string();

        let request = ListRequest {
            filter,
            scope: ListingScope::Category {
                slug: "villas".to_string(),
            },
            sort: SortOrder::Newest,
            offset: 9,
            limit: 9,
        };

        let params = request.params();
        let get = |key: &str| {
            params
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.as_str())
        };

        assert_eq!(get("property_type"), Some("0"));
        assert_eq!(get("category_slug_id"), Some("villas"));
        assert_eq!(get("posted_since"), Some("last_week"));
        assert_eq!(get("min_price"), Some("100"));
        assert_eq!(get("max_price"), None);
        assert_eq!(get("parameter_id"), Some("4,2"));
        assert_eq!(get("get_all_premium_properties"), Some("1"));
        assert_eq!(get("promoted"), None);
        assert_eq!(get("search"), Some("duplex"));
        assert_eq!(get("offset"), Some("9"));
        assert_eq!(get("sort"), Some("newest"));
    }

    #[test]
    fn test_error_field_fails_the_call() {
        let response: ListResponse = serde_json::from_value(json!({
            "error": true,
            "message": "Invalid category",
            "data": [],
            "total": 0
        }))
        .unwrap();

        match response.into_page() {
            Err(FetchError::Api { message }) => assert_eq!(message, "Invalid category"),
            other => panic!("expected api error, got {:?}", other),
        }
    }

    #[test]
    fn test_false_error_field_is_success() {
        let response: ListResponse = serde_json::from_value(json!({
            "error": false,
            "data": [{ "id": 1 }],
            "total": 30
        }))
        .unwrap();

        let page = response.into_page().unwrap();
        assert_eq!(page.data.len(), 1);
        assert_eq!(page.total, 30);
    }

    #[test]
    fn test_reference_item_display_name() {
        let item: ReferenceItem = serde_json::from_value(json!({
            "id": 2,
            "category": "Villa",
            "translated_name": ""
        }))
        .unwrap();
        assert_eq!(item.display_name(), "Villa");
    }
}
