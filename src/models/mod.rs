use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Whether a listing is offered for sale or for rent
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Offer {
    Sell,
    Rent,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Location information for a listing
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Location {
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub country: String,
    #[serde(default, deserialize_with = "optional_number")]
    pub latitude: Option<f64>,
    #[serde(default, deserialize_with = "optional_number")]
    pub longitude: Option<f64>,
}

/// Category embedded in a listing
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ListingCategory {
    pub id: u64,
    #[serde(default, alias = "category")]
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
}

/// A listing as returned in the List API `data` array
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Listing {
    pub id: u64,
    #[serde(default)]
    pub slug_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, deserialize_with = "number")]
    pub price: f64,
    #[serde(default)]
    pub property_type: Offer,
    #[serde(default)]
    pub category: Option<ListingCategory>,
    #[serde(flatten)]
    pub location: Location,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub title_image: Option<String>,
    #[serde(default, deserialize_with = "flag")]
    pub promoted: bool,
    #[serde(default, deserialize_with = "flag")]
    pub is_premium: bool,
    #[serde(default)]
    pub total_view: u64,
    #[serde(default, alias = "total_likes")]
    pub total_favourites: u64,
    #[serde(default, deserialize_with = "timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    /// Fields this crate does not model, preserved as sent
    #[serde(flatten)]
    pub raw_data: serde_json::Map<String, serde_json::Value>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(f64),
    String(String),
}

impl NumberOrString {
    fn into_f64(self) -> Option<f64> {
        match self {
            NumberOrString::Number(n) => Some(n),
            NumberOrString::String(s) => s.trim().parse().ok(),
        }
    }
}

// The API sends prices and coordinates either as numbers or numeric strings.
fn number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let value = Option::<NumberOrString>::deserialize(deserializer)?;
    Ok(value.and_then(NumberOrString::into_f64).unwrap_or_default())
}

fn optional_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    let value = Option::<NumberOrString>::deserialize(deserializer)?;
    Ok(value.and_then(NumberOrString::into_f64))
}

// RFC 3339, or the backend's "YYYY-MM-DD HH:MM:SS" in UTC. Anything else is dropped.
fn timestamp<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error> {
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    if let Ok(parsed) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(Some(parsed.with_timezone(&Utc)));
    }
    Ok(NaiveDateTime::parse_from_str(&raw, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc()))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FlagRepr {
    Bool(bool),
    Int(i64),
    String(String),
}

fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let value = Option::<FlagRepr>::deserialize(deserializer)?;
    Ok(match value {
        Some(FlagRepr::Bool(b)) => b,
        Some(FlagRepr::Int(i)) => i != 0,
        Some(FlagRepr::String(s)) => s == "1" || s.eq_ignore_ascii_case("true"),
        None => false,
    })
}
