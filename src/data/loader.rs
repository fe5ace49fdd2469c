use std::collections::BTreeSet;
use std::io::Read;
use std::path::Path;

use arrow::array::Array;
use arrow::util::display::array_value_to_string;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use super::model::{Cell, RawTable};
use crate::error::PipelineError;

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load an uploaded table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row; empty, `--` or a pandas NA token marks a missing cell
/// * `.parquet` – any column types; nulls, `--` and NA tokens are missing
pub fn load_file(path: &Path) -> Result<RawTable, PipelineError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "csv" | "txt" => {
            let file = std::fs::File::open(path)
                .map_err(|e| PipelineError::Parse(format!("opening {}: {e}", path.display())))?;
            read_csv(file)
        }
        "parquet" | "pq" => load_parquet(path),
        other => Err(PipelineError::Parse(format!(
            "unsupported file extension: .{other}"
        ))),
    }
}

// ---------------------------------------------------------------------------
// CSV reader
// ---------------------------------------------------------------------------

/// Parse delimited text with a header row into a [`RawTable`].
///
/// Rows with a different field count than the header fail the whole upload.
pub fn read_csv<R: Read>(input: R) -> Result<RawTable, PipelineError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .trim(csv::Trim::All)
        .from_reader(input);

    let columns: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.to_string())
        .collect();
    check_header(&columns)?;

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.map_err(|e| PipelineError::Parse(format!("row {}: {e}", row_no + 1)))?;
        rows.push(record.iter().map(Cell::from_field).collect());
    }

    finish(columns, rows)
}

// ---------------------------------------------------------------------------
// Parquet reader
// ---------------------------------------------------------------------------

/// Load a Parquet file; every value is rendered to text so the rest of the
/// pipeline treats both formats alike.
fn load_parquet(path: &Path) -> Result<RawTable, PipelineError> {
    let parse_err = |e: &dyn std::fmt::Display| PipelineError::Parse(e.to_string());

    let file = std::fs::File::open(path).map_err(|e| parse_err(&e))?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file).map_err(|e| parse_err(&e))?;
    let columns: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    check_header(&columns)?;

    let reader = builder.build().map_err(|e| parse_err(&e))?;
    let mut rows = Vec::new();

    for batch_result in reader {
        let batch = batch_result.map_err(|e| parse_err(&e))?;
        for row in 0..batch.num_rows() {
            let mut cells = Vec::with_capacity(batch.num_columns());
            for col in batch.columns() {
                if col.is_null(row) {
                    cells.push(Cell::Missing);
                } else {
                    let text = array_value_to_string(col, row).map_err(|e| parse_err(&e))?;
                    cells.push(Cell::from_field(&text));
                }
            }
            rows.push(cells);
        }
    }

    finish(columns, rows)
}

// -- Shared helpers --

/// Reject headers that are empty, duplicated, or look like a data row.
fn check_header(columns: &[String]) -> Result<(), PipelineError> {
    if columns.is_empty() {
        return Err(PipelineError::Parse("missing header row".to_string()));
    }
    if let Some(i) = columns.iter().position(|c| c.trim().is_empty()) {
        return Err(PipelineError::Parse(format!("header column {i} has no name")));
    }

    let mut seen = BTreeSet::new();
    for name in columns {
        if !seen.insert(name.as_str()) {
            return Err(PipelineError::Parse(format!("duplicate column '{name}'")));
        }
    }

    // A header whose feature names are all numbers is a data row.
    let features = &columns[1..];
    if !features.is_empty() && features.iter().all(|c| c.trim().parse::<f64>().is_ok()) {
        return Err(PipelineError::Parse(
            "first row contains only numbers; a header row is required".to_string(),
        ));
    }
    Ok(())
}

fn finish(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Result<RawTable, PipelineError> {
    let table = RawTable::new(columns, rows)?;
    if table.is_empty() {
        return Err(PipelineError::Parse("upload has no data rows".to_string()));
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENARIO: &str = "ID,Feature1,Feature2,Feature3\n\
                            s1,0.5,2.1,1.1\n\
                            s2,1.2,0.8,3.0\n\
                            s3,3.3,4.5,2.8\n";

    #[test]
    fn test_read_scenario() {
        let table = read_csv(SCENARIO.as_bytes()).unwrap();
        assert_eq!(table.columns, vec!["ID", "Feature1", "Feature2", "Feature3"]);
        assert_eq!(table.len(), 3);
        assert_eq!(table.rows[2][0], Cell::Text("s3".to_string()));
    }

    #[test]
    fn test_sentinel_becomes_missing() {
        let table = read_csv("ID,A,B\ns1,--,2\ns2,1, \n".as_bytes()).unwrap();
        assert!(table.rows[0][1].is_missing());
        assert!(table.rows[1][2].is_missing());
        assert_eq!(table.rows[0][2], Cell::Text("2".to_string()));
    }

    #[test]
    fn test_na_tokens_become_missing() {
        let table = read_csv("ID,A,B\ns1,NaN,N/A\ns2,null,7\n".as_bytes()).unwrap();
        assert!(table.rows[0][1].is_missing());
        assert!(table.rows[0][2].is_missing());
        assert!(table.rows[1][1].is_missing());
        assert_eq!(table.rows[1][2], Cell::Text("7".to_string()));
    }

    #[test]
    fn test_ragged_row_is_parse_error() {
        let err = read_csv("ID,A,B\ns1,1,2\ns2,1\n".as_bytes()).unwrap_err();
        assert!(matches!(err, PipelineError::Parse(_)));
        assert!(err.to_string().contains("row 2"), "{err}");
    }

    #[test]
    fn test_missing_header_is_parse_error() {
        let err = read_csv("s1,0.5,2.1,1.1\ns2,1.2,0.8,3.0\n".as_bytes()).unwrap_err();
        assert!(matches!(err, PipelineError::Parse(_)));
    }

    #[test]
    fn test_empty_upload_is_parse_error() {
        assert!(matches!(
            read_csv("".as_bytes()),
            Err(PipelineError::Parse(_))
        ));
        assert!(matches!(
            read_csv("ID,A\n".as_bytes()),
            Err(PipelineError::Parse(_))
        ));
    }

    #[test]
    fn test_duplicate_header_is_parse_error() {
        let err = read_csv("ID,A,A\ns1,1,2\n".as_bytes()).unwrap_err();
        assert!(matches!(err, PipelineError::Parse(_)));
    }

    #[test]
    fn test_unsupported_extension() {
        let err = load_file(Path::new("upload.xlsx")).unwrap_err();
        assert!(err.to_string().contains(".xlsx"));
    }

    #[test]
    fn test_load_csv_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("upload.csv");
        std::fs::write(&path, SCENARIO).unwrap();
        let table = load_file(&path).unwrap();
        assert_eq!(table.len(), 3);
    }
}
