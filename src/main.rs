use std::sync::Arc;

use anyhow::Context;
use estate_scout::api::ReferenceKind;
use estate_scout::filter::QueryString;
use estate_scout::presentation::{self, ListingView, ResultsView};
use estate_scout::{
    Config, FetchController, FetchOutcome, HttpApi, ListingScope, LoadMoreOutcome, MemoryHistory,
    ReferenceCache, UrlSynchronizer, ViewType,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env().context("Failed to read configuration")?;
    info!("🏠 Estate Scout - property search against {}", config.api_url);

    let api = Arc::new(HttpApi::new(&config)?);

    // The address the search starts from, e.g. "property_type=Rent&min_price=500"
    let raw_query = std::env::args().nth(1).unwrap_or_default();
    let path = format!("/{}/properties", config.locale);
    let sync = UrlSynchronizer::new(
        MemoryHistory::starting_at(path.clone(), QueryString::parse(&raw_query)),
        path,
        ListingScope::All,
    );
    let filter = sync.current();
    info!("Searching with filter: {:?}", filter);

    // Reference lists for the filter dropdowns; a failure here doesn't block the search.
    let references = ReferenceCache::new(
        api.clone(),
        config.locale.clone(),
        config.reference_page_size,
    );
    for kind in [ReferenceKind::Categories, ReferenceKind::Facilities] {
        match references.ensure_loaded(kind, &config.locale).await {
            Ok(list) => info!("Loaded {} {} (more: {})", list.items.len(), kind, list.has_more),
            Err(e) => warn!("{}", e),
        }
    }

    let controller = FetchController::new(api, sync.scope().clone(), config.page_size);
    match controller.filter_changed(filter).await? {
        FetchOutcome::Loaded { received, total } => {
            info!("✅ Loaded {} of {} listings", received, total)
        }
        FetchOutcome::Failed(e) => warn!("Search failed: {}", e),
        other => info!("Search finished: {:?}", other),
    }

    match controller.load_more().await {
        LoadMoreOutcome::Appended { received, .. } => info!("Loaded {} more listings", received),
        LoadMoreOutcome::Failed(e) => warn!("Could not load more: {}", e),
        other => info!("No further page: {:?}", other),
    }

    let snapshot = controller.snapshot();
    for view in [ViewType::Grid, ViewType::List] {
        println!("--- {:?} view ---", view);
        match presentation::render(&snapshot, view) {
            ResultsView::Results { summary, items, .. } => {
                println!("Showing {} of {}", summary.shown, summary.total);
                for (i, item) in items.iter().enumerate() {
                    print_item(i + 1, item);
                }
            }
            ResultsView::Failed { notice } => println!("Search failed: {}", notice),
            ResultsView::Empty => println!("No listings match this search"),
            ResultsView::Loading => println!("Still loading"),
        }
        println!();
    }

    let json = serde_json::to_string_pretty(snapshot.items())?;
    tokio::fs::write("listings.json", json).await?;
    info!("💾 Saved {} listings to listings.json", snapshot.items().len());

    Ok(())
}

fn print_item(n: usize, item: &ListingView) {
    match item {
        ListingView::Compact(card) => {
            println!("{}. {} ({}) {}", n, card.title, card.price, card.offer);
            if !card.city.is_empty() {
                println!("   {}", card.city);
            }
        }
        ListingView::Detailed(row) => {
            println!("{}. {} ({}) {}", n, row.title, row.price, row.offer);
            if let Some(category) = &row.category {
                println!("   Category: {}", category);
            }
            println!("   {}", row.location);
            println!("   Views: {}, favourites: {}", row.views, row.favourites);
        }
    }
}
