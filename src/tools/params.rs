//! Tool argument types
//!
//! Field names follow the published tool surface (`setId`, `pageSize`,
//! snake_case upstream filters). Doc comments end up in the input schemas.

use schemars::JsonSchema;
use serde::Deserialize;

use crate::client::PageRequest;

/// Tool without arguments
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct NoParams {}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SetIdParams {
    /// The SET ID of the drug label
    #[serde(rename = "setId")]
    pub set_id: String,
}

/// Listing filters plus paging, all at the top level
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct FilteredSearch<F> {
    #[serde(flatten)]
    pub filters: F,
    #[serde(flatten)]
    pub paging: PageRequest,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct RxNormNameParams {
    /// Drug name to search for in RxNorm mappings
    #[serde(rename = "drugName")]
    pub drug_name: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct RxCuiParams {
    /// The RxCUI to get mappings for
    pub rxcui: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct PharmaSetIdParams {
    /// The pharmacologic class SET ID
    #[serde(rename = "pharmaSetId")]
    pub pharma_set_id: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct PharmacologicClassSearchParams {
    /// Drug class code from the drug classes API (e.g. N0000175605 for Kinase Inhibitor)
    #[serde(rename = "drugClassCode")]
    pub drug_class_code: String,
    /// Coding system for the class code (defaults to 2.16.840.1.113883.6.345)
    #[serde(default, rename = "codingSystem")]
    pub coding_system: Option<String>,
    #[serde(flatten)]
    pub paging: PageRequest,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::DrugNameFilters;
    use serde_json::json;

    #[test]
    fn filtered_search_reads_flat_arguments() {
        let params: FilteredSearch<DrugNameFilters> = serde_json::from_value(json!({
            "drug_name": "aspirin",
            "page": 2
        }))
        .unwrap();
        assert_eq!(params.filters.drug_name.as_deref(), Some("aspirin"));
        assert_eq!(params.paging.page, Some(2));
        assert_eq!(params.paging.page_size, None);
    }

    #[test]
    fn set_id_is_required() {
        assert!(serde_json::from_value::<SetIdParams>(json!({})).is_err());
        let params: SetIdParams = serde_json::from_value(json!({"setId": "abc"})).unwrap();
        assert_eq!(params.set_id, "abc");
    }

    #[test]
    fn class_search_defaults() {
        let params: PharmacologicClassSearchParams =
            serde_json::from_value(json!({"drugClassCode": "N0000175605"})).unwrap();
        assert_eq!(params.coding_system, None);
        assert_eq!(params.paging, PageRequest::default());
    }
}
