//! Property search client: filter state, shareable URLs, paginated listing
//! fetches and the shared category/facility lists behind the filter UIs.

pub mod api;
pub mod config;
pub mod error;
pub mod fetch;
pub mod filter;
pub mod geocode;
pub mod models;
pub mod navigation;
pub mod presentation;
pub mod reference;

pub use api::{HttpApi, ListingApi, ReferenceApi, SortOrder};
pub use config::Config;
pub use error::{ConfigError, FetchError, ReferenceLoadError, ValidationError};
pub use fetch::{FetchController, FetchOutcome, FetchState, LoadMoreOutcome, Snapshot};
pub use filter::{ListingScope, SearchFilter, UrlSynchronizer};
pub use models::Listing;
pub use navigation::{MemoryHistory, Navigator};
pub use presentation::ViewType;
pub use reference::ReferenceCache;
