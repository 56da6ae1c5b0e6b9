//! MCP tool catalog
//!
//! Every tool takes a JSON object whose shape is described by one of the
//! argument types in [`params`]; dispatch lives in [`crate::server`].

pub mod context;
pub mod params;

use schemars::JsonSchema;
use serde::Serialize;
use serde_json::{Value, json};

use crate::client::{
    ApplicationNumberFilters, DrugClassFilters, DrugNameFilters, PageRequest, RxCuiFilters, SplSearchParams,
    UniiFilters,
};
pub use context::DailyMedContext;
use params::{
    FilteredSearch, NoParams, PharmaSetIdParams, PharmacologicClassSearchParams, RxCuiParams, RxNormNameParams,
    SetIdParams,
};

/// Tool definition as listed by `tools/list`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

fn tool<P: JsonSchema>(name: &str, description: &str) -> ToolDefinition {
    let mut input_schema =
        serde_json::to_value(schemars::schema_for!(P)).unwrap_or_else(|_| json!({ "type": "object" }));
    if let Some(schema) = input_schema.as_object_mut() {
        schema.remove("$schema");
    }
    ToolDefinition {
        name: name.to_string(),
        description: description.to_string(),
        input_schema,
    }
}

/// All tools in listing order
pub fn catalog() -> Vec<ToolDefinition> {
    vec![
        tool::<NoParams>(
            "get_dailymed_context",
            "Get comprehensive information about DailyMed database, its purpose, content types, and when to use it",
        ),
        tool::<SetIdParams>(
            "get_drug_details",
            "Get detailed information about a specific drug by its SET ID",
        ),
        tool::<SetIdParams>("get_drug_history", "Get version history for a specific drug by its SET ID"),
        tool::<SetIdParams>("get_drug_ndcs", "Get NDC codes for a specific drug by its SET ID"),
        tool::<SetIdParams>(
            "get_drug_packaging",
            "Get packaging information for a specific drug by its SET ID",
        ),
        tool::<SetIdParams>("get_drug_media", "Get media files (images, etc.) for a specific drug by its SET ID"),
        tool::<PageRequest>(
            "get_all_drug_names",
            "Get all available drug names in the DailyMed database with pagination support",
        ),
        tool::<PageRequest>(
            "get_all_drug_classes",
            "Get all available drug classes in the DailyMed database with pagination support",
        ),
        tool::<PageRequest>(
            "get_all_ndcs",
            "Get all available NDC codes in the DailyMed database with pagination support",
        ),
        tool::<PageRequest>(
            "get_all_rxcuis",
            "Get all available RxCUI codes in the DailyMed database with pagination support",
        ),
        tool::<PageRequest>(
            "get_all_uniis",
            "Get all available UNII codes in the DailyMed database with pagination support",
        ),
        tool::<PageRequest>(
            "get_all_application_numbers",
            "Get all available FDA application numbers in the DailyMed database with pagination support",
        ),
        tool::<SetIdParams>("get_download_links", "Get ZIP and PDF download links for a specific drug by its SET ID"),
        tool::<SplSearchParams>(
            "search_spls",
            "Search for Structured Product Labels (SPLs) using either simple drug name search or advanced DailyMed API parameters. \
             A simple query searches drug names first and then finds related SPLs. Advanced parameters query the SPLs API directly. \
             Supports pagination for large result sets.",
        ),
        tool::<FilteredSearch<RxCuiFilters>>(
            "search_rxcuis",
            "Search for RxCUI codes using various parameters with pagination support",
        ),
        tool::<FilteredSearch<DrugNameFilters>>(
            "search_drug_names",
            "Search for drug names using various parameters with pagination support",
        ),
        tool::<FilteredSearch<UniiFilters>>(
            "search_uniis",
            "Search for UNII codes using various parameters with pagination support",
        ),
        tool::<FilteredSearch<ApplicationNumberFilters>>(
            "search_application_numbers",
            "Search for FDA application numbers (NDA, ANDA, etc.) using various parameters with pagination support",
        ),
        tool::<FilteredSearch<DrugClassFilters>>(
            "search_drug_classes",
            "Search for pharmacologic drug classes using various parameters with pagination support",
        ),
        tool::<NoParams>("get_mapping_statistics", "Get statistics about loaded mapping files"),
        tool::<RxNormNameParams>("search_by_rxnorm_mapping", "Search for RxNorm mappings by drug name"),
        tool::<SetIdParams>("get_rxnorm_mappings_for_setid", "Get RxNorm mappings for a specific SET ID"),
        tool::<SetIdParams>(
            "get_pharmacologic_class_mappings_for_setid",
            "Get pharmacologic class mappings for a specific SET ID",
        ),
        tool::<RxCuiParams>("get_mappings_by_rxcui", "Get mappings for a specific RxCUI"),
        tool::<PharmaSetIdParams>(
            "get_rxnorm_mappings_by_pharmacologic_class",
            "Find RxNorm mappings for drugs that belong to a specific pharmacologic class SET ID",
        ),
        tool::<NoParams>(
            "get_all_pharmacologic_class_setids",
            "Get all pharmacologic class SET IDs that have associated drug mappings",
        ),
        tool::<PharmaSetIdParams>(
            "get_pharmacologic_class_details",
            "Get detailed information about a pharmacologic class including FDA context and classification attributes (uses mapping file data)",
        ),
        tool::<PharmacologicClassSearchParams>(
            "search_drugs_by_pharmacologic_class",
            "Search for drugs using DailyMed drug class codes (from the drug classes API). Supports pagination for large result sets.",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn catalog_has_unique_names() {
        let tools = catalog();
        assert_eq!(tools.len(), 28);
        let names: HashSet<_> = tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names.len(), tools.len());
    }

    #[test]
    fn schemas_are_objects() {
        for tool in catalog() {
            assert_eq!(tool.input_schema["type"], "object", "{}", tool.name);
            assert!(tool.input_schema.get("$schema").is_none());
        }
    }

    #[test]
    fn set_id_schema_requires_set_id() {
        let tool = catalog().into_iter().find(|t| t.name == "get_drug_details").unwrap();
        assert_eq!(tool.input_schema["required"], json!(["setId"]));
        assert!(tool.input_schema["properties"]["setId"].is_object());
    }

    #[test]
    fn search_schema_is_flat() {
        let tool = catalog().into_iter().find(|t| t.name == "search_spls").unwrap();
        let properties = &tool.input_schema["properties"];
        for key in ["query", "drug_name", "boxed_warning", "page", "pageSize"] {
            assert!(properties.get(key).is_some(), "missing {}", key);
        }
    }

    #[test]
    fn serializes_input_schema_camel_case() {
        let value = serde_json::to_value(&catalog()[0]).unwrap();
        assert!(value.get("inputSchema").is_some());
    }
}
