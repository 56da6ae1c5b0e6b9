//! Orientation payload returned by `get_dailymed_context`

use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyMedContext {
    pub service: &'static str,
    pub version: &'static str,
    pub description: &'static str,
    pub base_url: String,
    pub purpose: &'static str,
    pub content_types: &'static [&'static str],
    pub key_features: &'static [&'static str],
    pub data_freshness: &'static str,
    pub api_capabilities: &'static [&'static str],
    pub use_cases: &'static [&'static str],
}

const CONTENT_TYPES: &[&str] = &[
    "Structured Product Labels (SPLs)",
    "Drug names and active ingredients",
    "NDC codes",
    "FDA application numbers",
    "Drug classification information",
    "RxNorm mappings",
    "Pharmacologic class mappings",
];

const KEY_FEATURES: &[&str] = &[
    "Official FDA-submitted drug labeling information",
    "Cross-references with RxNorm and pharmacologic classifications",
    "Multiple data formats (JSON, XML, PDF)",
    "Free public access with regular updates",
    "Comprehensive search and filtering capabilities",
];

const API_CAPABILITIES: &[&str] = &[
    "Search SPLs by drug name, manufacturer, NDC, RxCUI and more",
    "Advanced filtering with multiple parameters",
    "Pagination support for large result sets",
    "Full SPL document retrieval with structured sections",
    "Mapping data linking SPLs to external terminologies",
];

const USE_CASES: &[&str] = &[
    "Healthcare professionals researching drug information",
    "Patients seeking official drug labeling information",
    "Researchers conducting pharmaceutical studies",
    "AI systems providing drug information and recommendations",
    "Regulatory compliance and drug safety monitoring",
];

impl DailyMedContext {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            service: "DailyMed",
            version: "2.0",
            description: "DailyMed is the official provider of FDA label information (package inserts) for approved drug products",
            base_url: base_url.into(),
            purpose: "Provide comprehensive, up-to-date drug labeling information",
            content_types: CONTENT_TYPES,
            key_features: KEY_FEATURES,
            data_freshness: "Updated daily with new FDA submissions",
            api_capabilities: API_CAPABILITIES,
            use_cases: USE_CASES,
        }
    }
}
