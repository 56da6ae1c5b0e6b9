//! Cross-reference index over the DailyMed mapping datasets
//!
//! Two pipe-delimited files are loaded once at startup:
//! - `pharmacologic_class_mappings.txt`: `SPL_SETID|SPL_VERSION|PHARMA_SETID|PHARMA_VERSION`
//! - `rxnorm_mappings.txt`: `SETID|SPL_VERSION|RXCUI|RXSTRING|RXTTY`
//!
//! [`MappingIndex`] owns every record and the four lookup tables built over
//! them. It is never mutated after construction and is shared as
//! `Arc<MappingIndex>` by the client and the tool layer.

use csv::{ReaderBuilder, StringRecord, Trim};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

use crate::error::MappingError;

pub const PHARMACOLOGIC_CLASS_MAPPINGS_FILE: &str = "pharmacologic_class_mappings.txt";
pub const RXNORM_MAPPINGS_FILE: &str = "rxnorm_mappings.txt";

/// One line of `rxnorm_mappings.txt`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RxNormMapping {
    pub set_id: String,
    pub spl_version: u32,
    pub rxcui: String,
    pub rxstring: String,
    /// RxNorm term type (PSN, SBD, SCD, BPCK, GPCK, SY)
    pub rxtty: String,
}

/// One line of `pharmacologic_class_mappings.txt`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PharmacologicClassMapping {
    pub spl_set_id: String,
    pub spl_version: u32,
    pub pharma_set_id: String,
    pub pharma_version: u32,
}

/// Per-file load outcome
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FileLoadStats {
    pub loaded: usize,
    pub skipped: usize,
}

/// Load outcome for both datasets
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadReport {
    pub pharmacologic_class: FileLoadStats,
    pub rxnorm: FileLoadStats,
}

/// Static FDA description attached to pharmacologic class lookups
#[derive(Debug, Clone, Copy, Serialize)]
pub struct FdaContext {
    pub definition: &'static str,
    pub explanation: &'static str,
    pub classification: [&'static str; 4],
}

pub const FDA_CONTEXT: FdaContext = FdaContext {
    definition: "A pharmacologic class is a group of active moieties that share scientifically documented properties",
    explanation: "According to FDA guidelines, pharmacologic classes provide clinically meaningful and scientifically valid drug classifications based on three key attributes: Mechanism of Action (MOA), Physiologic Effect (PE), and Chemical Structure (CS)",
    classification: [
        "Mechanism of Action (MOA): How the drug works at the molecular level",
        "Physiologic Effect (PE): The body's response to the drug",
        "Chemical Structure (CS): Structural characteristics of the active moiety",
        "Source: National Drug File Reference Terminology (NDF-RT)",
    ],
};

/// RxNorm concepts reachable from a pharmacologic class
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PharmacologicClassDrugs<'a> {
    pub pharma_set_id: String,
    pub spl_set_ids: Vec<&'a str>,
    pub rx_norm_mappings: Vec<&'a RxNormMapping>,
    pub fda_context: FdaContext,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationInfo {
    pub mechanism_of_action: Vec<String>,
    pub physiologic_effect: Vec<String>,
    pub chemical_structure: Vec<String>,
    pub established_pharmacologic_class: Vec<String>,
}

/// Summary view of one pharmacologic class
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PharmacologicClassDetails<'a> {
    pub set_id: String,
    pub title: String,
    /// Number of RxNorm mappings reachable from the class
    pub related_drugs: usize,
    pub spl_set_ids: Vec<&'a str>,
    pub classification_info: ClassificationInfo,
    pub fda_context: FdaContext,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingStatistics {
    pub pharmacologic_class_mappings: usize,
    pub rx_norm_mappings: usize,
    pub unique_set_ids: usize,
    pub unique_rx_cuis: usize,
    pub unique_spl_set_ids: usize,
    pub unique_pharmacologic_classes: usize,
    pub skipped_pharmacologic_class_lines: usize,
    pub skipped_rx_norm_lines: usize,
}

/// In-memory index over both mapping datasets
#[derive(Debug, Default)]
pub struct MappingIndex {
    rxnorm: Vec<RxNormMapping>,
    rxnorm_by_set_id: HashMap<String, Vec<usize>>,
    rxnorm_by_rxcui: HashMap<String, Vec<usize>>,
    rxnorm_set_ids: Vec<String>,

    pharma: Vec<PharmacologicClassMapping>,
    pharma_by_spl_set_id: HashMap<String, Vec<usize>>,
    pharma_spl_set_ids: Vec<String>,
    spl_set_ids_by_class: HashMap<String, Vec<String>>,
    class_set_ids: Vec<String>,

    report: LoadReport,
}

impl MappingIndex {
    /// Load both mapping files from disk
    pub fn load(
        pharmacologic_class_path: impl AsRef<Path>,
        rxnorm_path: impl AsRef<Path>,
    ) -> Result<Self, MappingError> {
        let pharma_file = open(pharmacologic_class_path.as_ref())?;
        let rxnorm_file = open(rxnorm_path.as_ref())?;
        Self::from_readers(pharma_file, rxnorm_file)
    }

    /// Load both files from a data directory using the standard file names
    pub fn load_from_dir(data_dir: impl AsRef<Path>) -> Result<Self, MappingError> {
        let dir = data_dir.as_ref();
        Self::load(
            dir.join(PHARMACOLOGIC_CLASS_MAPPINGS_FILE),
            dir.join(RXNORM_MAPPINGS_FILE),
        )
    }

    /// Load from arbitrary readers. Both inputs must start with a header row.
    pub fn from_readers<P: Read, R: Read>(pharmacologic_class: P, rxnorm: R) -> Result<Self, MappingError> {
        let mut index = Self::default();

        let pharma_stats = read_records(pharmacologic_class, parse_pharmacologic_class_record, |mapping| {
            index.insert_pharmacologic_class(mapping)
        })?;
        let rxnorm_stats = read_records(rxnorm, parse_rxnorm_record, |mapping| index.insert_rxnorm(mapping))?;

        index.report = LoadReport {
            pharmacologic_class: pharma_stats,
            rxnorm: rxnorm_stats,
        };

        info!(
            "Loaded {} pharmacologic class mappings and {} RxNorm mappings",
            pharma_stats.loaded, rxnorm_stats.loaded
        );
        if pharma_stats.skipped > 0 || rxnorm_stats.skipped > 0 {
            warn!(
                "Skipped malformed mapping lines: {} pharmacologic class, {} RxNorm",
                pharma_stats.skipped, rxnorm_stats.skipped
            );
        }

        Ok(index)
    }

    /// Build an index from already-parsed records
    pub fn from_records(
        pharmacologic_class: impl IntoIterator<Item = PharmacologicClassMapping>,
        rxnorm: impl IntoIterator<Item = RxNormMapping>,
    ) -> Self {
        let mut index = Self::default();
        for mapping in pharmacologic_class {
            index.insert_pharmacologic_class(mapping);
            index.report.pharmacologic_class.loaded += 1;
        }
        for mapping in rxnorm {
            index.insert_rxnorm(mapping);
            index.report.rxnorm.loaded += 1;
        }
        index
    }

    fn insert_rxnorm(&mut self, mapping: RxNormMapping) {
        let position = self.rxnorm.len();

        match self.rxnorm_by_set_id.entry(mapping.set_id.clone()) {
            Entry::Occupied(mut entry) => entry.get_mut().push(position),
            Entry::Vacant(entry) => {
                self.rxnorm_set_ids.push(mapping.set_id.clone());
                entry.insert(vec![position]);
            }
        }
        self.rxnorm_by_rxcui
            .entry(mapping.rxcui.clone())
            .or_default()
            .push(position);

        self.rxnorm.push(mapping);
    }

    fn insert_pharmacologic_class(&mut self, mapping: PharmacologicClassMapping) {
        let position = self.pharma.len();

        match self.pharma_by_spl_set_id.entry(mapping.spl_set_id.clone()) {
            Entry::Occupied(mut entry) => entry.get_mut().push(position),
            Entry::Vacant(entry) => {
                self.pharma_spl_set_ids.push(mapping.spl_set_id.clone());
                entry.insert(vec![position]);
            }
        }

        // reverse index keeps each splSetId once per class
        match self.spl_set_ids_by_class.entry(mapping.pharma_set_id.clone()) {
            Entry::Occupied(mut entry) => {
                let spl_set_ids = entry.get_mut();
                if !spl_set_ids.contains(&mapping.spl_set_id) {
                    spl_set_ids.push(mapping.spl_set_id.clone());
                }
            }
            Entry::Vacant(entry) => {
                self.class_set_ids.push(mapping.pharma_set_id.clone());
                entry.insert(vec![mapping.spl_set_id.clone()]);
            }
        }

        self.pharma.push(mapping);
    }

    pub fn load_report(&self) -> LoadReport {
        self.report
    }

    /// RxNorm mappings for an SPL set id
    pub fn rxnorm_mappings(&self, set_id: &str) -> Vec<&RxNormMapping> {
        resolve(&self.rxnorm, self.rxnorm_by_set_id.get(set_id))
    }

    /// Pharmacologic class mappings for an SPL set id
    pub fn pharmacologic_class_mappings(&self, spl_set_id: &str) -> Vec<&PharmacologicClassMapping> {
        resolve(&self.pharma, self.pharma_by_spl_set_id.get(spl_set_id))
    }

    /// RxNorm mappings sharing an RxCUI
    pub fn mappings_by_rxcui(&self, rxcui: &str) -> Vec<&RxNormMapping> {
        resolve(&self.rxnorm, self.rxnorm_by_rxcui.get(rxcui))
    }

    /// Case-insensitive substring search over `rxstring`
    pub fn search_rxnorm_by_name(&self, name: &str) -> Vec<&RxNormMapping> {
        let needle = name.to_lowercase();
        self.rxnorm
            .iter()
            .filter(|mapping| mapping.rxstring.to_lowercase().contains(&needle))
            .collect()
    }

    /// SPL set ids mapped to a pharmacologic class, in first-seen order
    pub fn spl_set_ids_for_class(&self, pharma_set_id: &str) -> Vec<&str> {
        self.spl_set_ids_by_class
            .get(pharma_set_id)
            .map(|ids| ids.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// RxNorm mappings of every SPL in a pharmacologic class.
    ///
    /// Mappings are concatenated per SPL set id, so a concept shared by two
    /// labels appears twice.
    pub fn rxnorm_by_pharmacologic_class(&self, pharma_set_id: &str) -> PharmacologicClassDrugs<'_> {
        let spl_set_ids = self.spl_set_ids_for_class(pharma_set_id);
        let rx_norm_mappings = spl_set_ids
            .iter()
            .flat_map(|spl_set_id| self.rxnorm_mappings(spl_set_id))
            .collect();

        PharmacologicClassDrugs {
            pharma_set_id: pharma_set_id.to_string(),
            spl_set_ids,
            rx_norm_mappings,
            fda_context: FDA_CONTEXT,
        }
    }

    pub fn pharmacologic_class_details(&self, pharma_set_id: &str) -> PharmacologicClassDetails<'_> {
        let drugs = self.rxnorm_by_pharmacologic_class(pharma_set_id);
        PharmacologicClassDetails {
            set_id: pharma_set_id.to_string(),
            title: format!("Pharmacologic Class {}", pharma_set_id),
            related_drugs: drugs.rx_norm_mappings.len(),
            spl_set_ids: drugs.spl_set_ids,
            classification_info: ClassificationInfo::default(),
            fda_context: FDA_CONTEXT,
        }
    }

    /// Every pharmacologic class set id, in first-seen order
    pub fn pharmacologic_class_set_ids(&self) -> Vec<&str> {
        self.class_set_ids.iter().map(String::as_str).collect()
    }

    /// SPL set ids with at least one RxNorm mapping
    pub fn rxnorm_set_ids(&self) -> Vec<&str> {
        self.rxnorm_set_ids.iter().map(String::as_str).collect()
    }

    /// SPL set ids with at least one pharmacologic class mapping
    pub fn pharmacologic_class_spl_set_ids(&self) -> Vec<&str> {
        self.pharma_spl_set_ids.iter().map(String::as_str).collect()
    }

    pub fn statistics(&self) -> MappingStatistics {
        MappingStatistics {
            pharmacologic_class_mappings: self.pharma.len(),
            rx_norm_mappings: self.rxnorm.len(),
            unique_set_ids: self.rxnorm_by_set_id.len(),
            unique_rx_cuis: self.rxnorm_by_rxcui.len(),
            unique_spl_set_ids: self.pharma_by_spl_set_id.len(),
            unique_pharmacologic_classes: self.spl_set_ids_by_class.len(),
            skipped_pharmacologic_class_lines: self.report.pharmacologic_class.skipped,
            skipped_rx_norm_lines: self.report.rxnorm.skipped,
        }
    }
}

fn open(path: &Path) -> Result<File, MappingError> {
    File::open(path).map_err(|source| MappingError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn resolve<'a, T>(records: &'a [T], positions: Option<&Vec<usize>>) -> Vec<&'a T> {
    positions
        .map(|positions| positions.iter().filter_map(|&i| records.get(i)).collect())
        .unwrap_or_default()
}

/// Stream records out of a pipe-delimited reader.
///
/// Rows that do not parse are counted and skipped. Only I/O failures abort.
fn read_records<R, T>(
    reader: R,
    parse: fn(&StringRecord) -> Option<T>,
    mut insert: impl FnMut(T),
) -> Result<FileLoadStats, MappingError>
where
    R: Read,
{
    let mut csv_reader = ReaderBuilder::new()
        .delimiter(b'|')
        .has_headers(true)
        .flexible(true)
        .quoting(false)
        .trim(Trim::All)
        .from_reader(reader);

    let mut stats = FileLoadStats::default();
    for result in csv_reader.records() {
        let record = match result {
            Ok(record) => record,
            Err(err) if err.is_io_error() => return Err(MappingError::Csv(err)),
            Err(_) => {
                stats.skipped += 1;
                continue;
            }
        };

        if record.iter().all(str::is_empty) {
            continue;
        }

        match parse(&record) {
            Some(mapping) => {
                insert(mapping);
                stats.loaded += 1;
            }
            None => stats.skipped += 1,
        }
    }

    Ok(stats)
}

/// First `N` fields of a record, provided all are present and non-empty
fn required_fields<const N: usize>(record: &StringRecord) -> Option<[&str; N]> {
    if record.len() < N {
        return None;
    }
    let mut fields = [""; N];
    for (slot, value) in fields.iter_mut().zip(record.iter()) {
        if value.is_empty() {
            return None;
        }
        *slot = value;
    }
    Some(fields)
}

fn parse_pharmacologic_class_record(record: &StringRecord) -> Option<PharmacologicClassMapping> {
    let [spl_set_id, spl_version, pharma_set_id, pharma_version] = required_fields::<4>(record)?;
    Some(PharmacologicClassMapping {
        spl_set_id: spl_set_id.to_string(),
        spl_version: spl_version.parse().ok()?,
        pharma_set_id: pharma_set_id.to_string(),
        pharma_version: pharma_version.parse().ok()?,
    })
}

fn parse_rxnorm_record(record: &StringRecord) -> Option<RxNormMapping> {
    let [set_id, spl_version, rxcui, rxstring, rxtty] = required_fields::<5>(record)?;
    Some(RxNormMapping {
        set_id: set_id.to_string(),
        spl_version: spl_version.parse().ok()?,
        rxcui: rxcui.to_string(),
        rxstring: rxstring.to_string(),
        rxtty: rxtty.to_string(),
    })
}
