//! Lipid reference dataset.
//!
//! The dataset is a CSV file with one row per test code carrying display ranges and the short
//! explanatory texts the engine uses for grounding. It is loaded once at startup and read-only
//! afterwards.
//!
//! Header names are matched after trimming, lowercasing and replacing spaces with underscores,
//! so `What it measures` and `what_it_measures` are the same column. Columns that are missing
//! and cells that are blank both read as `None`.

use crate::normalize::normalise_label;
use crate::{LipidError, LipidResult};
use lipid_types::LipidCode;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

const CODE_COLUMNS: &[&str] = &["test_code", "code", "lipid_code", "test"];
const DISPLAY_NAME_COLUMNS: &[&str] = &["display_name", "test_name", "name"];
const UNIT_COLUMNS: &[&str] = &["unit", "units"];
const DESIRABLE_COLUMNS: &[&str] = &["desirable_range", "normal_range", "optimal_range"];
const BORDERLINE_COLUMNS: &[&str] = &["borderline_high_range", "borderline_range"];
const HIGH_COLUMNS: &[&str] = &["high_range"];
const LOW_COLUMNS: &[&str] = &["low_range"];
const SEX_SPECIFIC_COLUMNS: &[&str] = &["sex_specific_ranges", "sex_specific_range"];
const MEASURES_COLUMNS: &[&str] = &["what_it_measures", "what_it_is"];
const HOW_TO_READ_COLUMNS: &[&str] = &["how_to_read_results", "how_to_read", "interpretation"];
const NEXT_STEP_COLUMNS: &[&str] = &["safe_next_step", "next_step", "recommended_next_step"];

/// Reference information for one canonical code.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceRow {
    pub code: Option<LipidCode>,
    pub display_name: Option<String>,
    pub unit: Option<String>,
    pub desirable_range: Option<String>,
    pub borderline_high_range: Option<String>,
    pub high_range: Option<String>,
    pub low_range: Option<String>,
    pub sex_specific_ranges: Option<String>,
    pub what_it_measures: Option<String>,
    pub how_to_read_results: Option<String>,
    pub safe_next_step: Option<String>,
}

/// Immutable reference dataset.
#[derive(Debug, Clone, Default)]
pub struct ReferenceDataset {
    source_name: String,
    columns: Vec<String>,
    records: Vec<Vec<Option<String>>>,
    rows: HashMap<LipidCode, ReferenceRow>,
}

impl ReferenceDataset {
    /// A dataset with no rows. Lookups always miss, so the engine degrades to thresholds only.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Loads the dataset from a CSV file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened, is not valid CSV, or has no code column.
    pub fn load(path: &Path) -> LipidResult<Self> {
        let file = std::fs::File::open(path).map_err(|source| LipidError::ReferenceOpen {
            path: path.to_path_buf(),
            source,
        })?;
        let source_name = path
            .file_name()
            .and_then(|os| os.to_str())
            .unwrap_or("reference.csv")
            .to_string();
        let dataset = Self::from_reader(source_name, file)?;
        tracing::info!(
            rows = dataset.records.len(),
            codes = dataset.rows.len(),
            "loaded lipid reference dataset from {}",
            path.display()
        );
        Ok(dataset)
    }

    /// Parses CSV content from any reader. `source_name` is used in provenance strings.
    pub fn from_reader(source_name: impl Into<String>, reader: impl Read) -> LipidResult<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let columns: Vec<String> = csv_reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();
        let keys: Vec<String> = columns.iter().map(|c| column_key(c)).collect();

        if find_column(&keys, CODE_COLUMNS).is_none() {
            return Err(LipidError::ReferenceMissingCodeColumn);
        }

        let mut records = Vec::new();
        let mut rows = HashMap::new();
        for record in csv_reader.records() {
            let record = record?;
            let cells: Vec<Option<String>> = (0..columns.len())
                .map(|i| {
                    record
                        .get(i)
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string)
                })
                .collect();

            let row = build_row(&keys, &cells);
            match row.code {
                Some(code) => {
                    rows.entry(code).or_insert(row);
                }
                None => tracing::warn!("reference row without a recognised test code skipped"),
            }
            records.push(cells);
        }

        Ok(Self {
            source_name: source_name.into(),
            columns,
            records,
            rows,
        })
    }

    /// The row for `code`, if the dataset has one.
    pub fn lookup(&self, code: LipidCode) -> Option<&ReferenceRow> {
        self.rows.get(&code)
    }

    /// Provenance string for a code's row, e.g. `lipids.csv:LDL`.
    pub fn source_for(&self, code: LipidCode) -> Option<String> {
        self.lookup(code)
            .map(|_| format!("{}:{}", self.source_name, code))
    }

    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of data rows in the file, including rows whose code was not recognised.
    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Raw rows as column-name to cell maps, for display. Blank cells are `None`.
    pub fn sample(&self, limit: usize) -> Vec<serde_json::Map<String, serde_json::Value>> {
        self.records
            .iter()
            .take(limit)
            .map(|cells| {
                self.columns
                    .iter()
                    .zip(cells)
                    .map(|(column, cell)| {
                        let value = cell
                            .as_ref()
                            .map_or(serde_json::Value::Null, |s| s.clone().into());
                        (column.clone(), value)
                    })
                    .collect()
            })
            .collect()
    }
}

fn column_key(header: &str) -> String {
    header.trim().to_lowercase().replace([' ', '-'], "_")
}

fn find_column(keys: &[String], aliases: &[&str]) -> Option<usize> {
    aliases
        .iter()
        .find_map(|alias| keys.iter().position(|k| k == alias))
}

fn build_row(keys: &[String], cells: &[Option<String>]) -> ReferenceRow {
    let get = |aliases: &[&str]| -> Option<String> {
        find_column(keys, aliases).and_then(|i| cells.get(i).cloned().flatten())
    };

    ReferenceRow {
        code: get(CODE_COLUMNS).as_deref().and_then(normalise_label),
        display_name: get(DISPLAY_NAME_COLUMNS),
        unit: get(UNIT_COLUMNS),
        desirable_range: get(DESIRABLE_COLUMNS),
        borderline_high_range: get(BORDERLINE_COLUMNS),
        high_range: get(HIGH_COLUMNS),
        low_range: get(LOW_COLUMNS),
        sex_specific_ranges: get(SEX_SPECIFIC_COLUMNS),
        what_it_measures: get(MEASURES_COLUMNS),
        how_to_read_results: get(HOW_TO_READ_COLUMNS),
        safe_next_step: get(NEXT_STEP_COLUMNS),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Write;

    pub(crate) const SAMPLE_CSV: &str = "\
test_code,display_name,unit,desirable_range,borderline_high_range,high_range,low_range,sex_specific_ranges,what_it_measures,how_to_read_results,safe_next_step
CHOL,Total cholesterol,mg/dL,<200,200-239,>=240,,,Total cholesterol measures all cholesterol in your blood.,Lower is generally better.,Discuss your overall heart risk with a clinician.
LDL,LDL cholesterol,mg/dL,<100,130-159,160-189,,,LDL carries cholesterol that can build up in artery walls.,  Higher values mean more buildup risk.  ,
HDL,HDL cholesterol,mg/dL,>=60,,,<40,Men <40; Women <50,HDL helps remove cholesterol from the bloodstream.,Higher is usually better.,Regular activity can help raise HDL.
";

    pub(crate) fn sample_dataset() -> ReferenceDataset {
        ReferenceDataset::from_reader("lipids.csv", SAMPLE_CSV.as_bytes()).expect("parse sample")
    }

    #[test]
    fn test_from_reader_indexes_rows_by_code() {
        let dataset = sample_dataset();
        assert_eq!(dataset.record_count(), 3);
        let ldl = dataset.lookup(LipidCode::Ldl).expect("LDL row");
        assert_eq!(ldl.display_name.as_deref(), Some("LDL cholesterol"));
        assert_eq!(
            ldl.how_to_read_results.as_deref(),
            Some("Higher values mean more buildup risk.")
        );
        assert_eq!(ldl.safe_next_step, None);
        assert_eq!(ldl.low_range, None);
        assert!(dataset.lookup(LipidCode::Tg).is_none());
    }

    #[test]
    fn test_source_for_only_known_codes() {
        let dataset = sample_dataset();
        assert_eq!(
            dataset.source_for(LipidCode::Hdl),
            Some("lipids.csv:HDL".to_string())
        );
        assert_eq!(dataset.source_for(LipidCode::Tg), None);
    }

    #[test]
    fn test_headers_are_matched_loosely_and_missing_columns_are_none() {
        let csv = "Test Code,What it measures\nTriglycerides,Fat in the blood.\n";
        let dataset = ReferenceDataset::from_reader("x.csv", csv.as_bytes()).expect("parse");
        let tg = dataset.lookup(LipidCode::Tg).expect("TG row");
        assert_eq!(tg.what_it_measures.as_deref(), Some("Fat in the blood."));
        assert_eq!(tg.unit, None);
        assert_eq!(tg.desirable_range, None);
    }

    #[test]
    fn test_missing_code_column_is_an_error() {
        let csv = "name,unit\nLDL,mg/dL\n";
        let err = ReferenceDataset::from_reader("x.csv", csv.as_bytes())
            .expect_err("should reject missing code column");
        assert!(matches!(err, LipidError::ReferenceMissingCodeColumn));
    }

    #[test]
    fn test_load_missing_file() {
        let err = ReferenceDataset::load(Path::new("/definitely/not/here.csv"))
            .expect_err("missing file");
        assert!(matches!(err, LipidError::ReferenceOpen { .. }));
    }

    #[test]
    fn test_load_from_disk_uses_file_name_as_source() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(SAMPLE_CSV.as_bytes()).expect("write");
        let dataset = ReferenceDataset::load(file.path()).expect("load");
        let name = file
            .path()
            .file_name()
            .and_then(|n| n.to_str())
            .expect("file name");
        assert_eq!(dataset.source_name(), name);
    }

    #[test]
    fn test_sample_maps_blank_cells_to_null() {
        let dataset = sample_dataset();
        let sample = dataset.sample(1);
        assert_eq!(sample.len(), 1);
        assert_eq!(sample[0]["test_code"], serde_json::json!("CHOL"));
        assert_eq!(sample[0]["low_range"], serde_json::Value::Null);
    }
}
