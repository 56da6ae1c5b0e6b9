//! HTTP client for the DailyMed v2 REST API
//!
//! Every listing endpoint goes through [`DailyMedClient::fetch_page`], which
//! forwards filters verbatim and turns the upstream `metadata` block into a
//! [`Pagination`]. SPL-specific operations live in `spl.rs`.

pub mod filters;
pub mod spl;
pub mod types;

use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::error::{DailyMedError, Result, UpstreamError};
use crate::mapping::MappingIndex;
use crate::pagination::{PaginatedResponse, Pagination, UPSTREAM_MAX_PAGE_SIZE, validate_pagination_params};
use crate::spl::{ExtractOptions, SplDocument, document_from_listing_item};

pub use filters::{
    ApplicationNumberFilters, DateComparison, DrugClassFilters, DrugNameFilters, PageRequest, QueryFilters,
    RxCuiFilters, SplSearchFilters, SplSearchParams, UniiFilters,
};
use types::{ApplicationNumber, DrugClass, DrugName, Listing, Ndc, RxCui, SplListingItem, Unii};

pub const DEFAULT_BASE_URL: &str = "https://dailymed.nlm.nih.gov/dailymed/services/v2";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
/// FDA Established Pharmacologic Class coding system
pub const DEFAULT_CLASS_CODING_SYSTEM: &str = "2.16.840.1.113883.6.345";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub user_agent: String,
    pub use_system_proxy: bool,
    pub extract_options: ExtractOptions,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: format!("dailymed-mcp/{}", crate::VERSION),
            use_system_proxy: true,
            extract_options: ExtractOptions::default(),
        }
    }
}

/// DailyMed API client sharing the cross-reference index
#[derive(Clone)]
pub struct DailyMedClient {
    http: reqwest::Client,
    base_url: String,
    index: Arc<MappingIndex>,
    extract_options: ExtractOptions,
}

impl QueryFilters for () {
    fn query_pairs(&self) -> Vec<(&'static str, String)> {
        Vec::new()
    }
}

impl DailyMedClient {
    pub fn new(config: &ClientConfig, index: Arc<MappingIndex>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let mut builder = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .default_headers(headers);
        if !config.use_system_proxy {
            builder = builder.no_proxy();
        }
        let http = builder
            .build()
            .map_err(|e| DailyMedError::Configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            index,
            extract_options: config.extract_options,
        })
    }

    pub fn index(&self) -> &MappingIndex {
        &self.index
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response> {
        let response = request.send().await.map_err(UpstreamError::Request)?;
        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            }
            .into());
        }
        Ok(response)
    }

    /// GET a JSON endpoint and decode the body into `T`
    pub(crate) async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&'static str, String)]) -> Result<T> {
        debug!("GET {} {:?}", path, query);
        let response = self.send(self.http.get(self.url(path)).query(query)).await?;
        let body = response.bytes().await.map_err(UpstreamError::Request)?;
        serde_json::from_slice(&body)
            .map_err(|e| UpstreamError::UnexpectedShape(format!("{}: {}", path, e)).into())
    }

    /// GET an XML endpoint as text
    pub(crate) async fn get_xml(&self, path: &str) -> Result<String> {
        debug!("GET {}", path);
        let request = self.http.get(self.url(path)).header(ACCEPT, "application/xml");
        let response = self.send(request).await?;
        Ok(response.text().await.map_err(UpstreamError::Request)?)
    }

    /// Fetch one page of a listing endpoint.
    ///
    /// `totalPages` is computed from the requested page size, while at most
    /// 100 items are asked of the server.
    pub async fn fetch_page<T: DeserializeOwned>(
        &self,
        path: &str,
        filters: &impl QueryFilters,
        paging: PageRequest,
        default_page_size: u32,
    ) -> Result<PaginatedResponse<T>> {
        let (page, page_size) = paging.resolve(default_page_size);
        validate_pagination_params(page, page_size, UPSTREAM_MAX_PAGE_SIZE)?;

        let mut query = vec![
            ("page", page.to_string()),
            ("pagesize", page_size.min(UPSTREAM_MAX_PAGE_SIZE).to_string()),
        ];
        query.extend(filters.query_pairs());

        let listing: Listing<T> = self.get_json(path, &query).await?;
        let total_results = listing.total_results();

        Ok(PaginatedResponse {
            data: listing.data,
            pagination: Pagination::new(page, page_size, total_results),
        })
    }

    pub async fn drug_names(&self, filters: &DrugNameFilters, paging: PageRequest) -> Result<PaginatedResponse<DrugName>> {
        self.fetch_page("/drugnames.json", filters, paging, 100).await
    }

    pub async fn ndcs(&self, paging: PageRequest) -> Result<PaginatedResponse<Ndc>> {
        self.fetch_page("/ndcs.json", &(), paging, 25).await
    }

    pub async fn rxcuis(&self, filters: &RxCuiFilters, paging: PageRequest) -> Result<PaginatedResponse<RxCui>> {
        self.fetch_page("/rxcuis.json", filters, paging, 25).await
    }

    pub async fn uniis(&self, filters: &UniiFilters, paging: PageRequest) -> Result<PaginatedResponse<Unii>> {
        self.fetch_page("/uniis.json", filters, paging, 25).await
    }

    pub async fn application_numbers(
        &self,
        filters: &ApplicationNumberFilters,
        paging: PageRequest,
    ) -> Result<PaginatedResponse<ApplicationNumber>> {
        self.fetch_page("/applicationnumbers.json", filters, paging, 100).await
    }

    pub async fn drug_classes(&self, filters: &DrugClassFilters, paging: PageRequest) -> Result<PaginatedResponse<DrugClass>> {
        self.fetch_page("/drugclasses.json", filters, paging, 100).await
    }

    /// Labels belonging to a drug class code
    pub async fn drugs_by_pharmacologic_class(
        &self,
        drug_class_code: &str,
        coding_system: Option<&str>,
        paging: PageRequest,
    ) -> Result<PaginatedResponse<SplDocument>> {
        let drug_class_code = drug_class_code.trim();
        if drug_class_code.is_empty() {
            return Err(DailyMedError::validation("Valid drug class code is required"));
        }

        let filters = SplSearchFilters {
            drug_class_code: Some(drug_class_code.to_string()),
            drug_class_coding_system: Some(coding_system.unwrap_or(DEFAULT_CLASS_CODING_SYSTEM).to_string()),
            ..Default::default()
        };
        let page: PaginatedResponse<SplListingItem> = self.fetch_page("/spls.json", &filters, paging, 25).await?;
        Ok(page.map(|item| document_from_listing_item(&item, &self.index)))
    }
}

/// Accept SET IDs made of ASCII letters, digits and dashes
pub fn validate_set_id(set_id: &str) -> Result<&str> {
    let trimmed = set_id.trim();
    if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(DailyMedError::validation("Valid SET ID is required"));
    }
    Ok(trimmed)
}
