use std::path::PathBuf;

/// Fatal failures while reading input tables or the exceptions file.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Input file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse CSV {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Failed to open workbook {}: {source}", path.display())]
    Workbook {
        path: PathBuf,
        #[source]
        source: calamine::Error,
    },

    #[error("Sheet '{sheet}' not found in {}", path.display())]
    MissingSheet { path: PathBuf, sheet: String },

    #[error("Missing columns in '{table}': {}", columns.join(", "))]
    MissingColumns { table: String, columns: Vec<String> },

    #[error("Unsupported file type: {} (expected .csv, .toml, .xlsx, .xlsm, .xlsb, .xls or .ods)", path.display())]
    UnsupportedFormat { path: PathBuf },

    #[error("Failed to parse exceptions file {}: {source}", path.display())]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}
