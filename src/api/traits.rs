use async_trait::async_trait;

use super::types::{ListPage, ListRequest, ReferencePage, ReferenceRequest};
use crate::error::FetchError;

/// Listing search backend.
/// A body carrying an `error` field is a failure whatever the HTTP status.
#[async_trait]
pub trait ListingApi: Send + Sync {
    /// Fetch one page of listings
    async fn listings(&self, request: &ListRequest) -> Result<ListPage, FetchError>;
}

/// Backend for the category and facility lookup lists
#[async_trait]
pub trait ReferenceApi: Send + Sync {
    async fn reference_list(&self, request: &ReferenceRequest)
        -> Result<ReferencePage, FetchError>;
}
