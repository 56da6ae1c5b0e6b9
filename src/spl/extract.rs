//! `SplDocument` construction
//!
//! Documents come from two sources: the full XML label (sections populated)
//! and `spls.json` listing items (no sections). Both are enriched with the
//! RxNorm and pharmacologic class cross-references for their set id.

use tracing::debug;

use super::flatten::{ContentKind, flatten_all};
use super::xml::XmlNode;
use super::{FilteredPharmacologicClassMapping, FilteredRxNormMapping, SplAttachments, SplDocument, SplSection};
use crate::client::types::SplListingItem;
use crate::error::ExtractionError;
use crate::mapping::MappingIndex;

pub const UNTITLED_DOCUMENT: &str = "No title available";
pub const UNTITLED_SECTION: &str = "Untitled Section";
const UNKNOWN_EFFECTIVE_TIME: &str = "Unknown";
const DEFAULT_VERSION: &str = "1";
const MAX_HEADING_DEPTH: usize = 6;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Append nested `component/section` blocks to their parent section as
    /// markdown headings
    pub include_subsections: bool,
}

/// Extract a document with default options
pub fn extract_document(root: &XmlNode, set_id: &str, index: &MappingIndex) -> Result<SplDocument, ExtractionError> {
    extract_document_with(root, set_id, index, &ExtractOptions::default())
}

pub fn extract_document_with(
    root: &XmlNode,
    set_id: &str,
    index: &MappingIndex,
    options: &ExtractOptions,
) -> Result<SplDocument, ExtractionError> {
    if root.name != "document" {
        return Err(ExtractionError::InvalidStructure);
    }

    let title = non_empty(flatten_all(root.children_named("title"))).unwrap_or_else(|| UNTITLED_DOCUMENT.to_string());
    let effective_time = value_attribute(root, "effectiveTime").unwrap_or(UNKNOWN_EFFECTIVE_TIME);
    let version_number = value_attribute(root, "versionNumber").unwrap_or(DEFAULT_VERSION);

    let sections: Vec<SplSection> = root
        .descend(&["component", "structuredBody"])
        .map(|body| {
            body.children_named("component")
                .filter_map(|component| component.child("section"))
                .filter_map(|section| extract_section(section, options))
                .collect()
        })
        .unwrap_or_default();

    debug!("Extracted {} sections from SPL {}", sections.len(), set_id);

    let (rx_norm_mappings, pharmacologic_class_mappings) = cross_references(index, set_id);

    Ok(SplDocument {
        set_id: set_id.to_string(),
        title,
        effective_time: effective_time.to_string(),
        version_number: version_number.to_string(),
        sections,
        attachments: SplAttachments::default(),
        rx_norm_mappings,
        pharmacologic_class_mappings,
    })
}

/// Build a section-less document from a `spls.json` listing item
pub fn document_from_listing_item(item: &SplListingItem, index: &MappingIndex) -> SplDocument {
    let (rx_norm_mappings, pharmacologic_class_mappings) = cross_references(index, &item.setid);

    SplDocument {
        set_id: item.setid.clone(),
        title: item.title.clone().unwrap_or_default(),
        effective_time: item.published_date.clone().unwrap_or_default(),
        version_number: item
            .spl_version
            .clone()
            .unwrap_or_else(|| DEFAULT_VERSION.to_string()),
        sections: Vec::new(),
        attachments: item.attachments.clone(),
        rx_norm_mappings,
        pharmacologic_class_mappings,
    }
}

/// Projected cross-references for a set id; `None` when there are none
pub fn cross_references(
    index: &MappingIndex,
    set_id: &str,
) -> (
    Option<Vec<FilteredRxNormMapping>>,
    Option<Vec<FilteredPharmacologicClassMapping>>,
) {
    let rxnorm: Vec<FilteredRxNormMapping> = index
        .rxnorm_mappings(set_id)
        .into_iter()
        .map(FilteredRxNormMapping::from)
        .collect();
    let classes: Vec<FilteredPharmacologicClassMapping> = index
        .pharmacologic_class_mappings(set_id)
        .into_iter()
        .map(FilteredPharmacologicClassMapping::from)
        .collect();

    (non_empty_vec(rxnorm), non_empty_vec(classes))
}

fn extract_section(section: &XmlNode, options: &ExtractOptions) -> Option<SplSection> {
    let title = section_title(section);

    let mut blocks = vec![section_body(section)];
    if options.include_subsections {
        blocks.extend(subsection_blocks(section, 2));
    }

    let content = join_blocks(blocks);
    if content.is_empty() {
        return None;
    }

    Some(SplSection {
        id: section
            .child("id")
            .and_then(|id| id.attribute("root"))
            .map(str::to_string),
        title,
        content,
    })
}

fn section_title(section: &XmlNode) -> String {
    non_empty(flatten_all(section.children_named("title"))).unwrap_or_else(|| UNTITLED_SECTION.to_string())
}

fn section_body(section: &XmlNode) -> String {
    section
        .child("text")
        .map(|text| ContentKind::of_block(text).render())
        .unwrap_or_default()
}

fn subsection_blocks(section: &XmlNode, depth: usize) -> Vec<String> {
    let hashes = "#".repeat(depth.min(MAX_HEADING_DEPTH));

    section
        .children_named("component")
        .filter_map(|component| component.child("section"))
        .filter_map(|subsection| {
            let mut blocks = vec![section_body(subsection)];
            blocks.extend(subsection_blocks(subsection, depth + 1));
            let body = join_blocks(blocks);
            (!body.is_empty()).then(|| format!("{} {}\n\n{}", hashes, section_title(subsection), body))
        })
        .collect()
}

fn join_blocks(blocks: Vec<String>) -> String {
    blocks
        .into_iter()
        .filter(|block| !block.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
        .trim()
        .to_string()
}

fn value_attribute<'a>(root: &'a XmlNode, element: &str) -> Option<&'a str> {
    root.child(element)
        .and_then(|node| node.attribute("value"))
        .filter(|value| !value.is_empty())
}

fn non_empty(text: String) -> Option<String> {
    (!text.is_empty()).then_some(text)
}

fn non_empty_vec<T>(items: Vec<T>) -> Option<Vec<T>> {
    (!items.is_empty()).then_some(items)
}
