//! SPL search, retrieval and sub-resources

use serde_json::Value;
use std::collections::HashSet;
use tracing::{debug, warn};

use super::types::{DownloadLinks, Listing, SplHistoryEntry, SplListingItem, SplMedia};
use super::{DailyMedClient, DrugNameFilters, PageRequest, QueryFilters, SplSearchFilters, SplSearchParams, validate_set_id};
use crate::client::types::Ndc;
use crate::error::{DailyMedError, Result, UpstreamError};
use crate::pagination::{
    DEFAULT_MAX_PAGE_SIZE, PaginatedResponse, Pagination, UPSTREAM_MAX_PAGE_SIZE, paginate_results,
    validate_pagination_params,
};
use crate::spl::{SplDocument, XmlNode, document_from_listing_item, extract_document_with};

const DEFAULT_SPL_PAGE_SIZE: u32 = 25;
const DRUG_NAME_FAN_OUT_PAGE_SIZE: u32 = 100;

impl DailyMedClient {
    /// Search labels by free-text drug name or by advanced filters.
    ///
    /// A bare `query` expands into matching drug names and active
    /// ingredients, queries labels for each and de-duplicates by set id.
    /// Any advanced filter switches to a single server-side search.
    pub async fn search_spls(&self, params: &SplSearchParams) -> Result<PaginatedResponse<SplDocument>> {
        let (page, page_size) = params.paging.resolve(DEFAULT_SPL_PAGE_SIZE);
        validate_pagination_params(page, page_size, DEFAULT_MAX_PAGE_SIZE)?;

        let query = params.query.as_deref().map(str::trim).filter(|q| !q.is_empty());
        if !params.filters.is_empty() {
            return self.search_spls_advanced(&params.filters, page, page_size).await;
        }
        match query {
            Some(query) => self.search_spls_by_drug_name(query, page, page_size).await,
            None => Err(DailyMedError::validation(
                "Either 'query' or at least one advanced parameter is required",
            )),
        }
    }

    async fn search_spls_advanced(
        &self,
        filters: &SplSearchFilters,
        page: u32,
        page_size: u32,
    ) -> Result<PaginatedResponse<SplDocument>> {
        let mut query = vec![
            ("page", page.to_string()),
            ("pagesize", page_size.min(UPSTREAM_MAX_PAGE_SIZE).to_string()),
        ];
        query.extend(filters.query_pairs());

        let listing: Listing<SplListingItem> = self.get_json("/spls.json", &query).await?;
        let total_results = listing.total_results();

        Ok(PaginatedResponse {
            data: listing
                .data
                .iter()
                .map(|item| document_from_listing_item(item, self.index()))
                .collect(),
            pagination: Pagination::new(page, page_size, total_results),
        })
    }

    async fn search_spls_by_drug_name(
        &self,
        query: &str,
        page: u32,
        page_size: u32,
    ) -> Result<PaginatedResponse<SplDocument>> {
        let filters = DrugNameFilters {
            drug_name: Some(query.to_string()),
            ..Default::default()
        };
        let drugs = self
            .drug_names(&filters, PageRequest::new(1, DRUG_NAME_FAN_OUT_PAGE_SIZE))
            .await?
            .data;

        if drugs.is_empty() {
            return Ok(PaginatedResponse::empty(page_size));
        }

        let mut drug_queries: Vec<&str> = Vec::new();
        for drug in &drugs {
            for name in std::iter::once(drug.drug_name.as_str()).chain(drug.active_ingredient.as_deref()) {
                if !name.is_empty() && !drug_queries.contains(&name) {
                    drug_queries.push(name);
                }
            }
        }
        debug!("Expanded '{}' into {} drug name queries", query, drug_queries.len());

        let mut seen = HashSet::new();
        let mut documents = Vec::new();
        for drug_query in drug_queries {
            let listing = self
                .get_json::<Listing<SplListingItem>>("/spls.json", &[("drug_name", drug_query.to_string())])
                .await;
            match listing {
                Ok(listing) => {
                    for item in listing.data {
                        if seen.insert(item.setid.clone()) {
                            documents.push(document_from_listing_item(&item, self.index()));
                        }
                    }
                }
                Err(e) => warn!("Failed to search SPLs for \"{}\": {}", drug_query, e),
            }
        }

        Ok(paginate_results(documents, page, page_size))
    }

    /// Fetch and extract the full label
    pub async fn spl_by_set_id(&self, set_id: &str) -> Result<SplDocument> {
        let set_id = validate_set_id(set_id)?;
        let xml = self.get_xml(&format!("/spls/{}.xml", set_id)).await?;
        let root = XmlNode::parse(&xml)?;
        Ok(extract_document_with(&root, set_id, self.index(), &self.extract_options)?)
    }

    pub async fn spl_history(&self, set_id: &str) -> Result<Vec<SplHistoryEntry>> {
        let set_id = validate_set_id(set_id)?;
        let listing: Listing<SplHistoryEntry> = self.get_json(&format!("/spls/{}/history.json", set_id), &[]).await?;
        Ok(listing.data)
    }

    pub async fn spl_ndcs(&self, set_id: &str) -> Result<Vec<Ndc>> {
        let set_id = validate_set_id(set_id)?;
        let listing: Listing<Ndc> = self.get_json(&format!("/spls/{}/ndcs.json", set_id), &[]).await?;
        Ok(listing.data)
    }

    /// Packaging data, passed through as returned upstream
    pub async fn spl_packaging(&self, set_id: &str) -> Result<Value> {
        let set_id = validate_set_id(set_id)?;
        let body: Value = self.get_json(&format!("/spls/{}/packaging.json", set_id), &[]).await?;
        match body.get("data") {
            Some(data) if !data.is_null() => Ok(data.clone()),
            _ => Err(UpstreamError::UnexpectedShape("missing data for SPL packaging".to_string()).into()),
        }
    }

    /// Media attached to a label. `data` is either the media array itself or
    /// an object carrying it under `media`.
    pub async fn spl_media(&self, set_id: &str) -> Result<Vec<SplMedia>> {
        let set_id = validate_set_id(set_id)?;
        let mut body: Value = self.get_json(&format!("/spls/{}/media.json", set_id), &[]).await?;

        let media = match body.get_mut("data").map(Value::take) {
            Some(Value::Array(items)) => Value::Array(items),
            Some(Value::Object(mut data)) => data
                .remove("media")
                .filter(Value::is_array)
                .ok_or_else(|| UpstreamError::UnexpectedShape("missing media list for SPL".to_string()))?,
            _ => return Err(UpstreamError::UnexpectedShape("missing data for SPL media".to_string()).into()),
        };

        serde_json::from_value(media)
            .map_err(|e| UpstreamError::UnexpectedShape(format!("SPL media: {}", e)).into())
    }

    /// ZIP and PDF download URLs; nothing is fetched
    pub fn download_links(&self, set_id: &str) -> Result<DownloadLinks> {
        let set_id = validate_set_id(set_id)?;
        Ok(DownloadLinks {
            zip_download: format!("{}/spls/{}.zip", self.base_url(), set_id),
            pdf_download: format!("{}/spls/{}.pdf", self.base_url(), set_id),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ClientConfig;
    use crate::mapping::MappingIndex;
    use std::sync::Arc;

    fn offline_client() -> DailyMedClient {
        let config = ClientConfig {
            base_url: "https://dailymed.example/v2".to_string(),
            ..Default::default()
        };
        DailyMedClient::new(&config, Arc::new(MappingIndex::default())).unwrap()
    }

    #[test]
    fn download_links_use_base_url() {
        let links = offline_client().download_links("abc-123").unwrap();
        assert_eq!(links.zip_download, "https://dailymed.example/v2/spls/abc-123.zip");
        assert_eq!(links.pdf_download, "https://dailymed.example/v2/spls/abc-123.pdf");
    }

    #[tokio::test]
    async fn search_requires_query_or_filters() {
        let err = offline_client()
            .search_spls(&SplSearchParams {
                query: Some("   ".to_string()),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Either 'query' or at least one advanced parameter is required"
        );
    }

    #[tokio::test]
    async fn search_validates_paging_first() {
        let err = offline_client()
            .search_spls(&SplSearchParams {
                query: Some("aspirin".to_string()),
                paging: PageRequest::new(1, 201),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Page size must be between 1 and 200");
    }
}
