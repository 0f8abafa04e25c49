pub mod http;
pub mod traits;
pub mod types;

pub use http::HttpApi;
pub use traits::{ListingApi, ReferenceApi};
pub use types::{
    ListPage, ListRequest, ReferenceItem, ReferenceKind, ReferencePage, ReferenceRequest,
    SortOrder,
};
