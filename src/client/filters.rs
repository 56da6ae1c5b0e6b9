//! Filter parameters forwarded verbatim to DailyMed listing endpoints
//!
//! The same structs describe tool inputs, so each derives `JsonSchema` and
//! its doc comments become the parameter descriptions.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Query-string view of a filter struct. Absent and blank values are dropped,
/// everything else is sent as given.
pub trait QueryFilters {
    fn query_pairs(&self) -> Vec<(&'static str, String)>;

    fn is_empty(&self) -> bool {
        self.query_pairs().is_empty()
    }
}

fn collect_pairs<const N: usize>(fields: [(&'static str, Option<&str>); N]) -> Vec<(&'static str, String)> {
    fields
        .into_iter()
        .filter_map(|(key, value)| {
            let value = value?;
            (!value.trim().is_empty()).then(|| (key, value.to_string()))
        })
        .collect()
}

/// `page` / `pageSize` as supplied by a caller
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PageRequest {
    /// Page number (1-based)
    #[serde(default)]
    pub page: Option<u32>,
    /// Results per page
    #[serde(default, rename = "pageSize")]
    pub page_size: Option<u32>,
}

impl PageRequest {
    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            page: Some(page),
            page_size: Some(page_size),
        }
    }

    /// Page and page size with defaults applied
    pub fn resolve(&self, default_page_size: u32) -> (u32, u32) {
        (self.page.unwrap_or(1), self.page_size.unwrap_or(default_page_size))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DrugNameFilters {
    /// Drug name to search for
    #[serde(default)]
    pub drug_name: Option<String>,
    /// Name type: g/generic, b/brand or both
    #[serde(default)]
    pub name_type: Option<String>,
    /// Manufacturer name
    #[serde(default)]
    pub manufacturer: Option<String>,
}

impl QueryFilters for DrugNameFilters {
    fn query_pairs(&self) -> Vec<(&'static str, String)> {
        collect_pairs([
            ("drug_name", self.drug_name.as_deref()),
            ("name_type", self.name_type.as_deref()),
            ("manufacturer", self.manufacturer.as_deref()),
        ])
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RxCuiFilters {
    /// RxNorm string (drug name)
    #[serde(default)]
    pub rxstring: Option<String>,
    /// RxNorm Concept Unique Identifier
    #[serde(default)]
    pub rxcui: Option<String>,
    /// RxNorm term type (e.g. SCD, SBD, PSN)
    #[serde(default)]
    pub rxtty: Option<String>,
}

impl QueryFilters for RxCuiFilters {
    fn query_pairs(&self) -> Vec<(&'static str, String)> {
        collect_pairs([
            ("rxstring", self.rxstring.as_deref()),
            ("rxcui", self.rxcui.as_deref()),
            ("rxtty", self.rxtty.as_deref()),
        ])
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct UniiFilters {
    /// Active moiety name
    #[serde(default)]
    pub active_moiety: Option<String>,
    /// Drug class code
    #[serde(default)]
    pub drug_class_code: Option<String>,
    /// Drug class coding system
    #[serde(default)]
    pub drug_class_coding_system: Option<String>,
    /// RxNorm Concept Unique Identifier
    #[serde(default)]
    pub rxcui: Option<String>,
    /// Unique Ingredient Identifier
    #[serde(default)]
    pub unii_code: Option<String>,
}

impl QueryFilters for UniiFilters {
    fn query_pairs(&self) -> Vec<(&'static str, String)> {
        collect_pairs([
            ("active_moiety", self.active_moiety.as_deref()),
            ("drug_class_code", self.drug_class_code.as_deref()),
            ("drug_class_coding_system", self.drug_class_coding_system.as_deref()),
            ("rxcui", self.rxcui.as_deref()),
            ("unii_code", self.unii_code.as_deref()),
        ])
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ApplicationNumberFilters {
    /// FDA application number (e.g. NDA012345)
    #[serde(default)]
    pub application_number: Option<String>,
    /// Marketing category code
    #[serde(default)]
    pub marketing_category_code: Option<String>,
    /// SPL SET ID
    #[serde(default)]
    pub setid: Option<String>,
}

impl QueryFilters for ApplicationNumberFilters {
    fn query_pairs(&self) -> Vec<(&'static str, String)> {
        collect_pairs([
            ("application_number", self.application_number.as_deref()),
            ("marketing_category_code", self.marketing_category_code.as_deref()),
            ("setid", self.setid.as_deref()),
        ])
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DrugClassFilters {
    /// Drug class code
    #[serde(default)]
    pub drug_class_code: Option<String>,
    /// Drug class coding system
    #[serde(default)]
    pub drug_class_coding_system: Option<String>,
    /// Class code type (e.g. EPC, MOA, PE, CS)
    #[serde(default)]
    pub class_code_type: Option<String>,
    /// Drug class name
    #[serde(default)]
    pub class_name: Option<String>,
    /// Unique Ingredient Identifier
    #[serde(default)]
    pub unii_code: Option<String>,
}

impl QueryFilters for DrugClassFilters {
    fn query_pairs(&self) -> Vec<(&'static str, String)> {
        collect_pairs([
            ("drug_class_code", self.drug_class_code.as_deref()),
            ("drug_class_coding_system", self.drug_class_coding_system.as_deref()),
            ("class_code_type", self.class_code_type.as_deref()),
            ("class_name", self.class_name.as_deref()),
            ("unii_code", self.unii_code.as_deref()),
        ])
    }
}

/// Comparison applied to `published_date`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum DateComparison {
    Lt,
    Lte,
    Gt,
    Gte,
    Eq,
}

impl DateComparison {
    pub fn as_str(&self) -> &'static str {
        match self {
            DateComparison::Lt => "lt",
            DateComparison::Lte => "lte",
            DateComparison::Gt => "gt",
            DateComparison::Gte => "gte",
            DateComparison::Eq => "eq",
        }
    }
}

/// Advanced `spls.json` filters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SplSearchFilters {
    /// FDA application number
    #[serde(default)]
    pub application_number: Option<String>,
    /// Filter by presence of boxed warning
    #[serde(default)]
    pub boxed_warning: Option<bool>,
    /// DEA schedule code
    #[serde(default)]
    pub dea_schedule_code: Option<String>,
    /// FDA document type
    #[serde(default)]
    pub doctype: Option<String>,
    /// Drug class code
    #[serde(default)]
    pub drug_class_code: Option<String>,
    /// Drug class coding system
    #[serde(default)]
    pub drug_class_coding_system: Option<String>,
    /// Drug name
    #[serde(default)]
    pub drug_name: Option<String>,
    /// Name type: g/generic, b/brand or both
    #[serde(default)]
    pub name_type: Option<String>,
    /// Labeler name
    #[serde(default)]
    pub labeler: Option<String>,
    /// Manufacturer name
    #[serde(default)]
    pub manufacturer: Option<String>,
    /// Marketing category code
    #[serde(default)]
    pub marketing_category_code: Option<String>,
    /// National Drug Code
    #[serde(default)]
    pub ndc: Option<String>,
    /// Published date (YYYY-MM-DD)
    #[serde(default)]
    pub published_date: Option<String>,
    /// Comparison operator for published_date
    #[serde(default)]
    pub published_date_comparison: Option<DateComparison>,
    /// RxNorm Concept Unique Identifier
    #[serde(default)]
    pub rxcui: Option<String>,
    /// SPL SET ID
    #[serde(default)]
    pub setid: Option<String>,
    /// Unique Ingredient Identifier
    #[serde(default)]
    pub unii_code: Option<String>,
}

impl QueryFilters for SplSearchFilters {
    fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let boxed_warning = self.boxed_warning.map(|flag| flag.to_string());
        collect_pairs([
            ("application_number", self.application_number.as_deref()),
            ("boxed_warning", boxed_warning.as_deref()),
            ("dea_schedule_code", self.dea_schedule_code.as_deref()),
            ("doctype", self.doctype.as_deref()),
            ("drug_class_code", self.drug_class_code.as_deref()),
            ("drug_class_coding_system", self.drug_class_coding_system.as_deref()),
            ("drug_name", self.drug_name.as_deref()),
            ("name_type", self.name_type.as_deref()),
            ("labeler", self.labeler.as_deref()),
            ("manufacturer", self.manufacturer.as_deref()),
            ("marketing_category_code", self.marketing_category_code.as_deref()),
            ("ndc", self.ndc.as_deref()),
            ("published_date", self.published_date.as_deref()),
            (
                "published_date_comparison",
                self.published_date_comparison.as_ref().map(DateComparison::as_str),
            ),
            ("rxcui", self.rxcui.as_deref()),
            ("setid", self.setid.as_deref()),
            ("unii_code", self.unii_code.as_deref()),
        ])
    }
}

/// Input of the SPL search: a free-text `query`, advanced filters, or both
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SplSearchParams {
    /// Free-text drug name or active ingredient
    #[serde(default)]
    pub query: Option<String>,
    #[serde(flatten)]
    pub filters: SplSearchFilters,
    #[serde(flatten)]
    pub paging: PageRequest,
}
