use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

use super::traits::{ListingApi, ReferenceApi};
use super::types::{
    ListPage, ListRequest, ListResponse, ReferenceKind, ReferencePage, ReferenceRequest,
    ReferenceResponse,
};
use crate::config::Config;
use crate::error::FetchError;

const PROPERTY_LIST: &str = "get-property-list";
const CATEGORIES: &str = "get-categories";
const FACILITIES: &str = "get-facilities-for-filter";

/// List and Reference API over HTTP
pub struct HttpApi {
    client: Client,
    base_url: String,
}

impl HttpApi {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .user_agent(config.user_agent.as_str())
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
        locale: Option<&str>,
    ) -> Result<(StatusCode, T), FetchError> {
        let url = self.endpoint(path);
        debug!("Fetching URL: {} {:?}", url, params);

        let mut request = self.client.get(&url).query(params);
        if let Some(locale) = locale {
            request = request.header("Content-Language", locale);
        }
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        match serde_json::from_str(&body) {
            Ok(parsed) => Ok((status, parsed)),
            Err(e) if status.is_success() => Err(FetchError::Decode(e.to_string())),
            Err(_) => {
                warn!("{} returned status: {}", path, status);
                Err(FetchError::Network(format!("{} returned {}", path, status)))
            }
        }
    }
}

fn check_status(path: &str, status: StatusCode) -> Result<(), FetchError> {
    if status.is_success() {
        Ok(())
    } else {
        warn!("{} returned status: {}", path, status);
        Err(FetchError::Network(format!("{} returned {}", path, status)))
    }
}

#[async_trait]
impl ListingApi for HttpApi {
    async fn listings(&self, request: &ListRequest) -> Result<ListPage, FetchError> {
        let (status, body): (_, ListResponse) =
            self.get(PROPERTY_LIST, &request.params(), None).await?;
        // The body's own error field wins over the HTTP status.
        let page = body.into_page()?;
        check_status(PROPERTY_LIST, status)?;
        debug!(count = page.data.len(), total = page.total, "listing page received");
        Ok(page)
    }
}

#[async_trait]
impl ReferenceApi for HttpApi {
    async fn reference_list(
        &self,
        request: &ReferenceRequest,
    ) -> Result<ReferencePage, FetchError> {
        let path = match request.kind {
            ReferenceKind::Categories => CATEGORIES,
            ReferenceKind::Facilities => FACILITIES,
        };
        let params = [
            ("offset", request.offset.to_string()),
            ("limit", request.limit.to_string()),
        ];
        let (status, body): (_, ReferenceResponse) =
            self.get(path, &params, Some(&request.locale)).await?;
        let page = body.into_page()?;
        check_status(path, status)?;
        Ok(page)
    }
}
