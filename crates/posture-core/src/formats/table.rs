//! # Table Format
//!
//! CSV encoding of assessment tables.
//!
//! Input is header-driven: columns are located by name, case-insensitively
//! and in any order. Unknown columns are ignored, so a previously exported
//! table (with `Score`, `Remediation`, `Priority`) can be fed back in.
//! Blank cells read as absent.
//!
//! Output always carries the full header, even for an empty table.

use crate::primitives::MAX_ROWS;
use crate::{AnnotatedAssessment, AssessmentRecord, PostureError};
use std::io::{Read, Write};

/// Column order of exported tables.
pub const ANNOTATED_COLUMNS: [&str; 8] = [
    "Control",
    "Domain",
    "Framework",
    "Value",
    "Urgency",
    "Score",
    "Remediation",
    "Priority",
];

/// Positions of the input columns in a header row.
#[derive(Debug, Default)]
struct ColumnIndex {
    control: Option<usize>,
    domain: Option<usize>,
    framework: Option<usize>,
    value: Option<usize>,
    urgency: Option<usize>,
}

impl ColumnIndex {
    fn from_headers(headers: &csv::StringRecord) -> Self {
        let mut index = Self::default();
        for (i, name) in headers.iter().enumerate() {
            let slot = match name.trim().to_ascii_lowercase().as_str() {
                "control" => &mut index.control,
                "domain" => &mut index.domain,
                "framework" => &mut index.framework,
                "value" => &mut index.value,
                "urgency" => &mut index.urgency,
                _ => continue,
            };
            // First occurrence wins on duplicate headers
            slot.get_or_insert(i);
        }
        index
    }

    fn record(&self, row: &csv::StringRecord) -> AssessmentRecord {
        let cell = |slot: Option<usize>| {
            slot.and_then(|i| row.get(i))
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        AssessmentRecord {
            control: cell(self.control),
            domain: cell(self.domain),
            framework: cell(self.framework),
            value: cell(self.value),
            urgency: cell(self.urgency),
        }
    }
}

/// Read raw records from CSV.
///
/// # Errors
/// - `PostureError::SerializationError` on malformed CSV
/// - `PostureError::TooManyRows` above `MAX_ROWS`
pub fn read_records<R: Read>(reader: R) -> Result<Vec<AssessmentRecord>, PostureError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(reader);

    let headers = csv_reader
        .headers()
        .map_err(|e| PostureError::SerializationError(format!("Invalid CSV header: {e}")))?;
    let index = ColumnIndex::from_headers(headers);

    let mut records = Vec::new();
    for result in csv_reader.records() {
        let row = result.map_err(|e| PostureError::SerializationError(e.to_string()))?;
        if records.len() >= MAX_ROWS {
            return Err(PostureError::TooManyRows(records.len() + 1, MAX_ROWS));
        }
        records.push(index.record(&row));
    }

    Ok(records)
}

/// Write annotated rows as CSV.
///
/// # Errors
/// Returns `PostureError::SerializationError` if a row cannot be encoded
/// and `PostureError::IoError` if the writer fails.
pub fn write_annotated<W: Write>(
    writer: W,
    rows: &[AnnotatedAssessment],
) -> Result<(), PostureError> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    csv_writer
        .write_record(ANNOTATED_COLUMNS)
        .map_err(|e| PostureError::SerializationError(e.to_string()))?;
    for row in rows {
        csv_writer
            .serialize(row)
            .map_err(|e| PostureError::SerializationError(e.to_string()))?;
    }
    csv_writer
        .flush()
        .map_err(|e| PostureError::IoError(e.to_string()))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Pipeline;

    #[test]
    fn reads_case_insensitive_headers_in_any_order() {
        let csv = "value,FRAMEWORK,domain,Control\n0.4,NIST,Access Control,AC-1\n";
        let records = read_records(csv.as_bytes()).expect("read");

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].control.as_deref(), Some("AC-1"));
        assert_eq!(records[0].domain.as_deref(), Some("Access Control"));
        assert_eq!(records[0].framework.as_deref(), Some("NIST"));
        assert_eq!(records[0].value.as_deref(), Some("0.4"));
        assert_eq!(records[0].urgency, None);
    }

    #[test]
    fn blank_cells_are_absent() {
        let csv = "Control,Domain,Framework,Value,Urgency\nAC-1,Access Control,NIST,  ,\n";
        let records = read_records(csv.as_bytes()).expect("read");
        assert_eq!(records[0].value, None);
        assert_eq!(records[0].urgency, None);
    }

    #[test]
    fn ignores_derived_columns() {
        let csv = "Control,Domain,Framework,Value,Urgency,Score,Remediation,Priority\n\
                   AC-1,Access Control,NIST,0.4,High,99,stale,Eliminate\n";
        let records = read_records(csv.as_bytes()).expect("read");
        let rows = Pipeline::default()
            .annotate_records(&records)
            .expect("annotate");
        assert_eq!(rows[0].score.value(), 48);
        assert_ne!(rows[0].remediation, "stale");
    }

    #[test]
    fn short_rows_are_tolerated() {
        let csv = "Control,Domain,Framework,Value\nAC-1,Access Control\n";
        let records = read_records(csv.as_bytes()).expect("read");
        assert_eq!(records[0].framework, None);
    }

    #[test]
    fn writes_header_for_empty_table() {
        let mut out = Vec::new();
        write_annotated(&mut out, &[]).expect("write");
        let text = String::from_utf8(out).expect("utf8");
        assert_eq!(
            text.trim_end(),
            "Control,Domain,Framework,Value,Urgency,Score,Remediation,Priority"
        );
    }

    #[test]
    fn writes_annotated_rows() {
        let records = vec![
            AssessmentRecord::new("AC-1", "Access Control", "NIST", "0.40").with_urgency("High"),
        ];
        let rows = Pipeline::default()
            .annotate_records(&records)
            .expect("annotate");

        let mut out = Vec::new();
        write_annotated(&mut out, &rows).expect("write");
        let text = String::from_utf8(out).expect("utf8");
        let line = text.lines().nth(1).expect("data line");

        assert!(line.starts_with("AC-1,Access Control,NIST,0.4,High,48,"));
        assert!(line.ends_with(",Do First"));
    }

    #[test]
    fn exported_table_reads_back() {
        let records = vec![
            AssessmentRecord::new("AC-1", "Access Control", "NIST", "0.40").with_urgency("High"),
            AssessmentRecord::new("PC-1", "Policy Compliance", "ISO", "0.75"),
        ];
        let pipeline = Pipeline::default();
        let rows = pipeline.annotate_records(&records).expect("annotate");

        let mut out = Vec::new();
        write_annotated(&mut out, &rows).expect("write");
        let reread = read_records(out.as_slice()).expect("read");

        assert_eq!(pipeline.annotate_records(&reread).expect("annotate"), rows);
    }
}
