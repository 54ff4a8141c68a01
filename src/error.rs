use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Spreadsheet error: {0}")]
    Sheet(String),

    #[error("Invalid date (expected YYYYMMDD): {0}")]
    InvalidDate(String),

    #[error("Invalid month (expected YYYYMM): {0}")]
    InvalidMonth(String),

    #[error("Template not found: {0}")]
    TemplateMissing(String),

    #[error("Backup check failed for {0}: digest mismatch")]
    BackupMismatch(String),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Other(String),
}

/// Violations of the category table layout. Any of these is fatal at startup.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegistryError {
    #[error("{category}: slots={declared} != range {start}-{end} ({expected})")]
    SlotMismatch {
        category: String,
        declared: u32,
        start: u32,
        end: u32,
        expected: u32,
    },

    #[error("{category}: end row {end} is before start row {start}")]
    InvertedRange { category: String, start: u32, end: u32 },

    #[error("{category}: row {row} is inside the header block (data starts at row {first})")]
    HeaderOverlap { category: String, row: u32, first: u32 },

    #[error("row {row}: claimed by both {first} and {second}")]
    RowCollision {
        row: u32,
        first: String,
        second: String,
    },

    #[error("{category}: row {row} is past the last sheet row ({limit})")]
    RowLimit { category: String, row: u32, limit: u32 },

    #[error("duplicate category name: {0}")]
    DuplicateName(String),

    #[error("alias {alias} points to unknown category {target}")]
    DanglingAlias { alias: String, target: String },

    #[error("alias {0}: target must be a category name string")]
    AliasNotText(String),
}

pub type Result<T> = std::result::Result<T, LedgerError>;
