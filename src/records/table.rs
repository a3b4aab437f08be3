use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto, Data, DataType, Range, Reader};

use crate::error::LoadError;

/// Storage format of a tabular input, decided by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Csv,
    Workbook,
    Toml,
}

impl SourceKind {
    pub fn from_path(path: &Path) -> Result<Self, LoadError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());

        match extension.as_deref() {
            Some("csv") => Ok(SourceKind::Csv),
            Some("xlsx" | "xlsm" | "xlsb" | "xls" | "ods") => Ok(SourceKind::Workbook),
            Some("toml") => Ok(SourceKind::Toml),
            _ => Err(LoadError::UnsupportedFormat {
                path: path.to_path_buf(),
            }),
        }
    }
}

/// A header row plus string cells, as read from a CSV file or a worksheet.
#[derive(Debug, Clone, Default)]
pub struct Table {
    pub name: String,
    headers: Vec<String>,
    columns: HashMap<String, usize>,
    /// Spreadsheet row number and cells of every non-blank data row.
    rows: Vec<(usize, Vec<String>)>,
}

/// One data row. `number` is the 1-based spreadsheet row (the header is row 1).
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    pub number: usize,
    table: &'a Table,
    values: &'a [String],
}

impl<'a> Row<'a> {
    /// Trimmed cell value, or "" when the column or the cell is absent.
    pub fn get(&self, column: &str) -> &'a str {
        self.table
            .columns
            .get(column)
            .and_then(|&index| self.values.get(index))
            .map(|value| value.trim())
            .unwrap_or("")
    }
}

impl Table {
    /// Header on row 1, data from row 2.
    pub fn new(name: impl Into<String>, headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self::with_header_row(name, headers, rows, 1)
    }

    /// Rows are numbered from the header's spreadsheet row before blank rows
    /// are dropped.
    pub fn with_header_row(
        name: impl Into<String>,
        headers: Vec<String>,
        rows: Vec<Vec<String>>,
        header_row: usize,
    ) -> Self {
        let rows = rows
            .into_iter()
            .enumerate()
            .map(|(index, row)| (header_row + index + 1, row))
            .collect();
        Self::from_numbered_rows(name, headers, rows)
    }

    fn from_numbered_rows(
        name: impl Into<String>,
        headers: Vec<String>,
        rows: Vec<(usize, Vec<String>)>,
    ) -> Self {
        let headers: Vec<String> = headers.into_iter().map(|h| h.trim().to_string()).collect();
        let mut columns = HashMap::new();
        for (index, header) in headers.iter().enumerate() {
            // first occurrence wins for duplicated headers
            columns.entry(header.clone()).or_insert(index);
        }

        let rows = rows
            .into_iter()
            .filter(|(_, row)| row.iter().any(|cell| !cell.trim().is_empty()))
            .collect();

        Self {
            name: name.into(),
            headers,
            columns,
            rows,
        }
    }

    /// Rows are numbered by the line they start on, so empty lines the CSV
    /// reader skips still count.
    pub fn from_csv_reader<R: Read>(name: &str, reader: R) -> Result<Self, csv::Error> {
        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = rdr.headers()?.iter().map(str::to_string).collect();
        let mut rows = Vec::new();
        for record in rdr.records() {
            let record = record?;
            let number = record
                .position()
                .map_or(rows.len() + 2, |position| position.line() as usize);
            rows.push((number, record.iter().map(str::to_string).collect()));
        }

        Ok(Self::from_numbered_rows(name, headers, rows))
    }

    pub fn from_csv_path(path: &Path, name: &str) -> Result<Self, LoadError> {
        let file = File::open(path).map_err(|source| io_error(path, source))?;
        Self::from_csv_reader(name, file).map_err(|source| LoadError::Csv {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Read one named worksheet of a workbook.
    pub fn from_sheet(path: &Path, sheet: &str) -> Result<Self, LoadError> {
        ensure_exists(path)?;
        let mut workbook = open_workbook_auto(path).map_err(|source| LoadError::Workbook {
            path: path.to_path_buf(),
            source,
        })?;

        if !workbook.sheet_names().iter().any(|name| name == sheet) {
            return Err(LoadError::MissingSheet {
                path: path.to_path_buf(),
                sheet: sheet.to_string(),
            });
        }

        let range = workbook
            .worksheet_range(sheet)
            .map_err(|source| LoadError::Workbook {
                path: path.to_path_buf(),
                source,
            })?;

        Ok(Self::from_range(sheet, &range))
    }

    /// Read the first worksheet of a workbook, whatever its name.
    pub fn from_first_sheet(path: &Path) -> Result<Self, LoadError> {
        ensure_exists(path)?;
        let mut workbook = open_workbook_auto(path).map_err(|source| LoadError::Workbook {
            path: path.to_path_buf(),
            source,
        })?;

        let name = workbook.sheet_names().first().cloned().unwrap_or_default();
        let range = match workbook.worksheet_range_at(0) {
            Some(range) => range.map_err(|source| LoadError::Workbook {
                path: path.to_path_buf(),
                source,
            })?,
            None => {
                return Err(LoadError::MissingSheet {
                    path: path.to_path_buf(),
                    sheet: "<first sheet>".to_string(),
                })
            }
        };

        Ok(Self::from_range(&name, &range))
    }

    fn from_range(name: &str, range: &Range<Data>) -> Self {
        // the range starts at the first used cell, not necessarily A1
        let header_row = range.start().map_or(1, |(row, _)| row as usize + 1);
        let mut rows = range.rows();
        let headers = rows
            .next()
            .map(|row| row.iter().map(cell_to_string).collect())
            .unwrap_or_default();
        let rows = rows
            .map(|row| row.iter().map(cell_to_string).collect())
            .collect();

        Self::with_header_row(name, headers, rows, header_row)
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.contains_key(column)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn require_columns(&self, required: &[&str]) -> Result<(), LoadError> {
        let missing: Vec<String> = required
            .iter()
            .filter(|column| !self.has_column(column))
            .map(|column| column.to_string())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(LoadError::MissingColumns {
                table: self.name.clone(),
                columns: missing,
            })
        }
    }

    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        self.rows.iter().map(move |(number, values)| Row {
            number: *number,
            table: self,
            values,
        })
    }
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        // subaccounts typed as numbers read back as 108000, not 108000.0
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::DateTime(_) | Data::DateTimeIso(_) => cell
            .as_date()
            .map(|date| date.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| cell.to_string()),
        other => other.to_string(),
    }
}

fn ensure_exists(path: &Path) -> Result<(), LoadError> {
    if path.exists() {
        Ok(())
    } else {
        Err(LoadError::NotFound {
            path: path.to_path_buf(),
        })
    }
}

fn io_error(path: &Path, source: std::io::Error) -> LoadError {
    if source.kind() == std::io::ErrorKind::NotFound {
        LoadError::NotFound {
            path: PathBuf::from(path),
        }
    } else {
        LoadError::Io {
            path: PathBuf::from(path),
            source,
        }
    }
}
