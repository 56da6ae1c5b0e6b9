//! Structured Product Label documents
//!
//! - `xml`: element tree built from the raw SPL XML
//! - `flatten`: recursive narrative-to-text rendering
//! - `extract`: `SplDocument` construction and cross-reference enrichment

pub mod extract;
pub mod flatten;
pub mod xml;

use serde::{Deserialize, Serialize};

use crate::client::types::lenient_string;
use crate::mapping::{PharmacologicClassMapping, RxNormMapping};

pub use extract::{ExtractOptions, document_from_listing_item, extract_document, extract_document_with};
pub use xml::XmlNode;

/// Normalized label document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SplDocument {
    pub set_id: String,
    pub title: String,
    pub effective_time: String,
    pub version_number: String,
    pub sections: Vec<SplSection>,
    #[serde(flatten)]
    pub attachments: SplAttachments,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rx_norm_mappings: Option<Vec<FilteredRxNormMapping>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pharmacologic_class_mappings: Option<Vec<FilteredPharmacologicClassMapping>>,
}

/// Medication guide, patient package insert and product data references of
/// a `spls.json` item. Keys keep their upstream names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplAttachments {
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub spl_medguide: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub spl_patient_package_insert: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub spl_product_data_elements: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    pub content: String,
}

/// RxNorm mapping as attached to a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilteredRxNormMapping {
    pub rxcui: String,
    pub rxstring: String,
    pub rxtty: String,
}

impl From<&RxNormMapping> for FilteredRxNormMapping {
    fn from(mapping: &RxNormMapping) -> Self {
        Self {
            rxcui: mapping.rxcui.clone(),
            rxstring: mapping.rxstring.clone(),
            rxtty: mapping.rxtty.clone(),
        }
    }
}

/// Pharmacologic class mapping as attached to a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilteredPharmacologicClassMapping {
    pub pharma_set_id: String,
    pub pharma_version: u32,
}

impl From<&PharmacologicClassMapping> for FilteredPharmacologicClassMapping {
    fn from(mapping: &PharmacologicClassMapping) -> Self {
        Self {
            pharma_set_id: mapping.pharma_set_id.clone(),
            pharma_version: mapping.pharma_version,
        }
    }
}
