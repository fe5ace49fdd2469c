use std::fmt;

use ndarray::Array2;

use crate::error::PipelineError;

/// Token that marks a missing value in uploaded files.
pub const MISSING_SENTINEL: &str = "--";

/// Tokens read as missing on top of the sentinel (the pandas `read_csv`
/// default set, matched case-sensitively).
pub const NA_VALUES: [&str; 18] = [
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Name of the derived row-sum feature.
pub const SUM_COLUMN: &str = "sum";

/// Name of the prediction column appended to exported tables.
pub const PREDICTION_COLUMN: &str = "Predicted_Group";

// ---------------------------------------------------------------------------
// Cell – a single uploaded value
// ---------------------------------------------------------------------------

/// One cell of an uploaded table. Text is kept verbatim so the identifier
/// and feature columns round-trip into the export unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Cell {
    Missing,
    Text(String),
}

impl Cell {
    /// Classify a raw field: empty, the sentinel or an NA token is missing,
    /// anything else is kept as trimmed text.
    pub fn from_field(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed == MISSING_SENTINEL || NA_VALUES.contains(&trimmed) {
            Cell::Missing
        } else {
            Cell::Text(trimmed.to_string())
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Missing)
    }

    /// Text written to CSV exports (missing cells are empty).
    pub fn export_text(&self) -> &str {
        match self {
            Cell::Missing => "",
            Cell::Text(s) => s,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Missing => write!(f, "<missing>"),
            Cell::Text(s) => write!(f, "{s}"),
        }
    }
}

// ---------------------------------------------------------------------------
// RawTable – the upload as parsed
// ---------------------------------------------------------------------------

/// Uploaded table: first column is the identifier, the rest are features.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    /// Header names in file order.
    pub columns: Vec<String>,
    /// Row-major cells; every row has `columns.len()` entries.
    pub rows: Vec<Vec<Cell>>,
}

impl RawTable {
    /// Build a table, rejecting ragged rows.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Result<Self, PipelineError> {
        if columns.is_empty() {
            return Err(PipelineError::Parse("header row is empty".to_string()));
        }
        if let Some((i, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != columns.len())
        {
            return Err(PipelineError::Parse(format!(
                "row {} has {} fields, header has {}",
                i + 1,
                row.len(),
                columns.len()
            )));
        }
        Ok(Self { columns, rows })
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Names of the feature columns (everything after the identifier).
    pub fn feature_columns(&self) -> &[String] {
        &self.columns[1..]
    }
}

// ---------------------------------------------------------------------------
// FeatureMatrix – model input
// ---------------------------------------------------------------------------

/// Numeric model input. Missing values are `NaN`.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    /// Feature names, ending with [`SUM_COLUMN`].
    pub columns: Vec<String>,
    pub values: Array2<f64>,
}

impl FeatureMatrix {
    pub fn nrows(&self) -> usize {
        self.values.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.values.ncols()
    }
}

// ---------------------------------------------------------------------------
// Diagnosis – the three predicted classes
// ---------------------------------------------------------------------------

/// Predicted group, encoded 0/1/2 in model output and exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Diagnosis {
    Cn,
    Mci,
    Ad,
}

impl Diagnosis {
    pub const ALL: [Diagnosis; 3] = [Diagnosis::Cn, Diagnosis::Mci, Diagnosis::Ad];

    pub fn code(self) -> i64 {
        match self {
            Diagnosis::Cn => 0,
            Diagnosis::Mci => 1,
            Diagnosis::Ad => 2,
        }
    }

    /// Short class name used on charts.
    pub fn name(self) -> &'static str {
        match self {
            Diagnosis::Cn => "CN",
            Diagnosis::Mci => "MCI",
            Diagnosis::Ad => "AD",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Diagnosis::Cn => "Cognitively normal",
            Diagnosis::Mci => "Mild cognitive impairment",
            Diagnosis::Ad => "Alzheimer's disease",
        }
    }
}

impl TryFrom<i64> for Diagnosis {
    type Error = PipelineError;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Diagnosis::Cn),
            1 => Ok(Diagnosis::Mci),
            2 => Ok(Diagnosis::Ad),
            other => Err(PipelineError::InvalidLabel(other)),
        }
    }
}

impl fmt::Display for Diagnosis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ---------------------------------------------------------------------------
// ResultTable – upload plus predictions
// ---------------------------------------------------------------------------

/// The uploaded table with one prediction per row.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultTable {
    pub raw: RawTable,
    pub predictions: Vec<Diagnosis>,
}

impl ResultTable {
    /// Pair a table with its predictions; lengths must agree.
    pub fn new(raw: RawTable, predictions: Vec<Diagnosis>) -> Result<Self, PipelineError> {
        if raw.len() != predictions.len() {
            return Err(PipelineError::schema(
                "result",
                format!("{} rows but {} predictions", raw.len(), predictions.len()),
            ));
        }
        Ok(Self { raw, predictions })
    }

    pub fn len(&self) -> usize {
        self.predictions.len()
    }

    /// Header of the exported table.
    pub fn columns(&self) -> Vec<String> {
        let mut columns = self.raw.columns.clone();
        columns.push(PREDICTION_COLUMN.to_string());
        columns
    }
}
