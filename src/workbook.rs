//! Loading tabular sources into grids of cell values.
//!
//! A source is either a CSV file (one unnamed table) or a spreadsheet
//! workbook (one or more named sheets). Either way the result is the same:
//! named rectangular grids of [`Value`] cells that the parser walks. Nothing
//! here interprets the grid; sheet previews exist so a caller can ask the
//! user which table to parse when a workbook has several.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use calamine::{Data, Reader, open_workbook_auto};
use log::{debug, info};
use thiserror::Error;

use crate::program::Value;

/// Rows of cells, as read from one sheet.
pub type Grid = Vec<Vec<Value>>;

/// Preview dimensions offered during sheet selection.
const PREVIEW_ROWS: usize = 5;
const PREVIEW_COLS: usize = 5;

#[derive(Debug, Error)]
pub enum WorkbookError {
    #[error("failed to read file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to read workbook: {0}")]
    Spreadsheet(#[from] calamine::Error),
    #[error("failed to read table: {0}")]
    Csv(#[from] csv::Error),
    #[error("sheet not found: {0}")]
    SheetNotFound(String),
}

/// One named table within a source.
#[derive(Debug, Clone)]
pub struct Sheet {
    pub name: String,
    pub grid: Grid,
}

/// A bounded preview of one sheet, for selection prompts.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetPreview {
    pub name: String,
    /// Exactly 5×5 cells; positions past the sheet's extent are `""`.
    pub rows: Vec<Vec<String>>,
}

/// All tables of one uploaded source, fully loaded into memory.
#[derive(Debug, Clone)]
pub struct Workbook {
    sheets: Vec<Sheet>,
}

impl Workbook {
    /// Read a source file, auto-detecting CSV against spreadsheet formats
    /// by extension.
    pub fn open(path: &Path) -> Result<Self, WorkbookError> {
        let is_csv = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("csv") || e.eq_ignore_ascii_case("tsv"));
        let workbook = if is_csv {
            let name = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "Sheet1".to_string());
            Self::from_csv_reader(&name, File::open(path)?)?
        } else {
            Self::from_spreadsheet(path)?
        };
        info!(
            "loaded {} sheet(s) from {}",
            workbook.sheets.len(),
            path.display()
        );
        Ok(workbook)
    }

    fn from_spreadsheet(path: &Path) -> Result<Self, WorkbookError> {
        let mut source = open_workbook_auto(path)?;
        let names = source.sheet_names().to_vec();
        let mut sheets = Vec::new();
        for name in names {
            let range = source.worksheet_range(&name)?;
            let grid = range
                .rows()
                .map(|row| row.iter().map(convert_cell).collect())
                .collect();
            sheets.push(Sheet { name, grid });
        }
        Ok(Self { sheets })
    }

    /// Read a single-table CSV source. Fields that parse as numbers become
    /// [`Value::Number`], matching how spreadsheet tools materialize CSV
    /// cells; everything else is kept as trimmed text.
    pub fn from_csv_reader<R: Read>(name: &str, reader: R) -> Result<Self, WorkbookError> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);
        let mut grid = Grid::new();
        for record in rdr.records() {
            let record = record?;
            grid.push(record.iter().map(classify_field).collect());
        }
        Ok(Self {
            sheets: vec![Sheet {
                name: name.to_string(),
                grid,
            }],
        })
    }

    /// Assemble a workbook from already-loaded sheets.
    pub fn from_sheets(sheets: Vec<Sheet>) -> Self {
        Self { sheets }
    }

    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }

    /// Grid of the named sheet.
    pub fn grid(&self, name: &str) -> Result<&Grid, WorkbookError> {
        self.sheets
            .iter()
            .find(|s| s.name == name)
            .map(|s| &s.grid)
            .ok_or_else(|| WorkbookError::SheetNotFound(name.to_string()))
    }

    /// The only sheet, when the source has exactly one.
    pub fn single(&self) -> Option<&Sheet> {
        match self.sheets.as_slice() {
            [sheet] => Some(sheet),
            _ => None,
        }
    }

    /// Bounded previews of every sheet, in workbook order. No sheet is
    /// parsed at this stage.
    pub fn previews(&self) -> Vec<SheetPreview> {
        self.sheets
            .iter()
            .map(|sheet| SheetPreview {
                name: sheet.name.clone(),
                rows: (0..PREVIEW_ROWS)
                    .map(|r| {
                        (0..PREVIEW_COLS)
                            .map(|c| {
                                sheet
                                    .grid
                                    .get(r)
                                    .and_then(|row| row.get(c))
                                    .map(|v| v.to_string())
                                    .unwrap_or_default()
                            })
                            .collect()
                    })
                    .collect(),
            })
            .collect()
    }
}

fn convert_cell(cell: &Data) -> Value {
    match cell {
        Data::Empty => Value::Empty,
        Data::String(s) => Value::text(s),
        Data::Float(f) => Value::Number(*f),
        Data::Int(i) => Value::Number(*i as f64),
        Data::Bool(b) => Value::text(if *b { "TRUE" } else { "FALSE" }),
        Data::DateTime(dt) => Value::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Value::text(s),
        Data::Error(e) => {
            debug!("dropping error cell: {e:?}");
            Value::Empty
        }
    }
}

fn classify_field(field: &str) -> Value {
    let trimmed = field.trim();
    if trimmed.is_empty() {
        return Value::Empty;
    }
    match trimmed.parse::<f64>() {
        Ok(n) => Value::Number(n),
        Err(_) => Value::Text(trimmed.to_string()),
    }
}
