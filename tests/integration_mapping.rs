//! Integration tests for loading and querying the mapping datasets

use anyhow::Result;
use dailymed_mcp::error::MappingError;
use dailymed_mcp::{DailyMedError, MappingIndex};

mod common;

use common::test_utils;

#[test]
fn loads_fixture_files_and_counts_skipped_lines() -> Result<()> {
    let index = test_utils::fixture_index()?;
    let report = index.load_report();

    assert_eq!(report.pharmacologic_class.loaded, 3);
    assert_eq!(report.pharmacologic_class.skipped, 1);
    assert_eq!(report.rxnorm.loaded, 4);
    assert_eq!(report.rxnorm.skipped, 1);

    let stats = index.statistics();
    assert_eq!(stats.rx_norm_mappings, 4);
    assert_eq!(stats.pharmacologic_class_mappings, 3);
    assert_eq!(stats.unique_set_ids, 2);
    assert_eq!(stats.unique_rx_cuis, 3);
    assert_eq!(stats.unique_spl_set_ids, 2);
    assert_eq!(stats.unique_pharmacologic_classes, 2);
    Ok(())
}

#[test]
fn lookups_by_set_id_and_rxcui() -> Result<()> {
    let index = test_utils::fixture_index()?;

    let rxnorm = index.rxnorm_mappings("set-aspirin");
    assert_eq!(rxnorm.len(), 2);
    assert_eq!(rxnorm[0].rxcui, "243670");
    assert_eq!(rxnorm[1].rxtty, "PSN");

    let classes = index.pharmacologic_class_mappings("set-aspirin");
    let class_ids: Vec<&str> = classes.iter().map(|m| m.pharma_set_id.as_str()).collect();
    assert_eq!(class_ids, ["class-nsaid", "class-platelet"]);

    let shared = index.mappings_by_rxcui("1191");
    let set_ids: Vec<&str> = shared.iter().map(|m| m.set_id.as_str()).collect();
    assert_eq!(set_ids, ["set-aspirin", "set-ibuprofen"]);

    assert!(index.rxnorm_mappings("set-broken").is_empty());
    assert!(index.rxnorm_mappings("set-orphan").is_empty());
    Ok(())
}

#[test]
fn name_search_is_case_insensitive() -> Result<()> {
    let index = test_utils::fixture_index()?;
    assert_eq!(index.search_rxnorm_by_name("ASPIRIN").len(), 3);
    assert_eq!(index.search_rxnorm_by_name("200 mg").len(), 1);
    assert!(index.search_rxnorm_by_name("warfarin").is_empty());
    Ok(())
}

#[test]
fn class_lookup_concatenates_per_label() -> Result<()> {
    let index = test_utils::fixture_index()?;

    let drugs = index.rxnorm_by_pharmacologic_class("class-nsaid");
    assert_eq!(drugs.spl_set_ids, ["set-aspirin", "set-ibuprofen"]);
    assert_eq!(drugs.rx_norm_mappings.len(), 4);

    let details = index.pharmacologic_class_details("class-nsaid");
    assert_eq!(details.related_drugs, 4);
    assert_eq!(details.title, "Pharmacologic Class class-nsaid");

    assert_eq!(index.pharmacologic_class_set_ids(), ["class-nsaid", "class-platelet"]);

    let unknown = index.rxnorm_by_pharmacologic_class("class-unknown");
    assert!(unknown.spl_set_ids.is_empty());
    assert!(unknown.rx_norm_mappings.is_empty());
    Ok(())
}

#[test]
fn missing_files_are_configuration_errors() {
    let dir = test_utils::fixtures_dir().join("does-not-exist");
    let err = MappingIndex::load_from_dir(&dir).unwrap_err();
    assert!(matches!(err, MappingError::Io { .. }));

    let err = DailyMedError::from(err);
    assert!(matches!(err, DailyMedError::Configuration(_)));
    assert!(err.to_string().contains("pharmacologic_class_mappings.txt"));
}
