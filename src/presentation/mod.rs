//! View shapes for listing results.
//!
//! Switching between grid and list only changes how held items are mapped;
//! it never touches the fetch controller.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::fetch::{FetchState, Snapshot};
use crate::models::{Listing, Offer};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum ViewType {
    #[default]
    Grid,
    List,
}

/// Grid tile
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompactCard {
    pub id: u64,
    pub slug: String,
    pub title: String,
    pub image: Option<String>,
    pub price: String,
    pub offer: &'static str,
    pub city: String,
    pub promoted: bool,
    pub premium: bool,
}

/// List row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailedRow {
    pub id: u64,
    pub slug: String,
    pub title: String,
    pub image: Option<String>,
    pub price: String,
    pub offer: &'static str,
    pub category: Option<String>,
    pub location: String,
    pub views: u64,
    pub favourites: u64,
    pub posted: Option<DateTime<Utc>>,
    pub promoted: bool,
    pub premium: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ListingView {
    Compact(CompactCard),
    Detailed(DetailedRow),
}

/// "Showing N of M"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResultSummary {
    pub shown: usize,
    pub total: u64,
}

/// What the results area shows for a snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ResultsView {
    /// Skeletons while the first page loads
    Loading,
    /// First page failed; offer a retry
    Failed { notice: String },
    Empty,
    Results {
        summary: ResultSummary,
        items: Vec<ListingView>,
        loading_more: bool,
        can_load_more: bool,
        /// Transient message from a failed "load more"
        notice: Option<String>,
    },
}

pub fn present(listing: &Listing, view: ViewType) -> ListingView {
    let price = format_price(listing.price);
    let offer = offer_label(listing.property_type);

    match view {
        ViewType::Grid => ListingView::Compact(CompactCard {
            id: listing.id,
            slug: listing.slug_id.clone(),
            title: listing.title.clone(),
            image: listing.title_image.clone(),
            price,
            offer,
            city: listing.location.city.clone(),
            promoted: listing.promoted,
            premium: listing.is_premium,
        }),
        ViewType::List => ListingView::Detailed(DetailedRow {
            id: listing.id,
            slug: listing.slug_id.clone(),
            title: listing.title.clone(),
            image: listing.title_image.clone(),
            price,
            offer,
            category: listing.category.as_ref().map(|c| c.name.clone()),
            location: location_line(listing),
            views: listing.total_view,
            favourites: listing.total_favourites,
            posted: listing.created_at,
            promoted: listing.promoted,
            premium: listing.is_premium,
        }),
    }
}

pub fn present_all(items: &[Listing], view: ViewType) -> Vec<ListingView> {
    items.iter().map(|listing| present(listing, view)).collect()
}

pub fn summary(snapshot: &Snapshot) -> ResultSummary {
    ResultSummary {
        shown: snapshot.items().len(),
        total: snapshot.page.total,
    }
}

/// Maps a controller snapshot onto the results area
pub fn render(snapshot: &Snapshot, view: ViewType) -> ResultsView {
    match snapshot.state {
        FetchState::Idle | FetchState::Loading => ResultsView::Loading,
        FetchState::Error => ResultsView::Failed {
            notice: snapshot.notice.clone().unwrap_or_default(),
        },
        FetchState::Ready | FetchState::LoadingMore if snapshot.items().is_empty() => {
            ResultsView::Empty
        }
        FetchState::Ready | FetchState::LoadingMore => ResultsView::Results {
            summary: summary(snapshot),
            items: present_all(snapshot.items(), view),
            loading_more: snapshot.state == FetchState::LoadingMore,
            can_load_more: snapshot.state == FetchState::Ready && snapshot.has_more(),
            notice: snapshot.notice.clone(),
        },
    }
}

fn offer_label(offer: Offer) -> &'static str {
    match offer {
        Offer::Sell => "For sale",
        Offer::Rent => "For rent",
        Offer::Unknown => "",
    }
}

fn location_line(listing: &Listing) -> String {
    let location = &listing.location;
    [&listing.address, &location.city, &location.state, &location.country]
        .into_iter()
        .filter(|part| !part.is_empty())
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Whole units with thousands separators, e.g. `1,250,000`
pub fn format_price(price: f64) -> String {
    let whole = price.max(0.0).round() as u64;
    let digits = whole.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
