//! Response shapes of the DailyMed REST API
//!
//! Upstream items use snake_case keys and occasionally numbers where strings
//! are expected. Every type here deserializes from the upstream shape and
//! serializes in camelCase for tool output.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::spl::SplAttachments;

/// `{ data: [...], metadata: {...} }` envelope returned by listing endpoints
#[derive(Debug, Deserialize)]
pub struct Listing<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub metadata: Option<ListingMetadata>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListingMetadata {
    #[serde(default, deserialize_with = "lenient_count")]
    pub total_elements: Option<u64>,
}

impl<T> Listing<T> {
    /// Server-side total, falling back to the number of items on this page
    pub fn total_results(&self) -> u64 {
        self.metadata
            .as_ref()
            .and_then(|metadata| metadata.total_elements)
            .filter(|&total| total > 0)
            .unwrap_or(self.data.len() as u64)
    }
}

/// An item of `spls.json`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SplListingItem {
    #[serde(default)]
    pub setid: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub published_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub spl_version: Option<String>,
    #[serde(flatten)]
    pub attachments: SplAttachments,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct DrugName {
    #[serde(default)]
    pub drug_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route_of_administration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_ingredient: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct Ndc {
    #[serde(default, deserialize_with = "lenient_string")]
    pub ndc: Option<String>,
    #[serde(default, alias = "packageNdc", skip_serializing_if = "Option::is_none")]
    pub package_ndc: Option<String>,
    #[serde(default, alias = "productNdc", skip_serializing_if = "Option::is_none")]
    pub product_ndc: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct Unii {
    #[serde(default)]
    pub unii: Option<String>,
    #[serde(default, alias = "substanceName", skip_serializing_if = "Option::is_none")]
    pub substance_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_moiety: Option<String>,
    #[serde(default, alias = "uniiType", skip_serializing_if = "Option::is_none")]
    pub unii_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct RxCui {
    #[serde(default, deserialize_with = "lenient_string")]
    pub rxcui: Option<String>,
    #[serde(default, rename(deserialize = "rxstring"), alias = "drug_name")]
    pub drug_name: Option<String>,
    #[serde(default, rename(deserialize = "rxtty"), skip_serializing_if = "Option::is_none")]
    pub term_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct ApplicationNumber {
    #[serde(default, alias = "applicationNumber")]
    pub application_number: Option<String>,
    #[serde(default, alias = "applicationNumberType", skip_serializing_if = "Option::is_none")]
    pub application_number_type: Option<String>,
    #[serde(default, alias = "marketingCategoryCode", skip_serializing_if = "Option::is_none")]
    pub marketing_category_code: Option<String>,
    #[serde(default, rename(deserialize = "setid"), skip_serializing_if = "Option::is_none")]
    pub set_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct DrugClass {
    #[serde(default, rename(deserialize = "name"))]
    pub drug_class_name: Option<String>,
    #[serde(default, rename(deserialize = "code"))]
    pub drug_class_code: Option<String>,
    #[serde(
        default,
        rename(deserialize = "codingSystem"),
        alias = "coding_system",
        skip_serializing_if = "Option::is_none"
    )]
    pub drug_class_coding_system: Option<String>,
    #[serde(default, rename(deserialize = "type"), skip_serializing_if = "Option::is_none")]
    pub class_code_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unii_code: Option<String>,
}

/// An entry of `/spls/{setId}/history.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct SplHistoryEntry {
    #[serde(default, rename(deserialize = "setid"), skip_serializing_if = "Option::is_none")]
    pub set_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub spl_version: Option<String>,
    #[serde(default, alias = "published_date")]
    pub effective_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// An entry of `/spls/{setId}/media.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplMedia {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default, rename = "type", alias = "mime_type")]
    pub media_type: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Pre-built download URLs for a label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadLinks {
    pub zip_download: String,
    pub pdf_download: String,
}

pub(crate) fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

fn lenient_count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_u64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}
