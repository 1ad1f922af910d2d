use crate::domain::errors::ErrorKind;

/// Fatal parse failures. Any of these rejects the whole upload.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("unsupported file format: use .csv or .xlsx")]
    UnsupportedFormat(String),

    #[error("file is required")]
    MissingFile,

    #[error("failed to parse file: file is empty")]
    Empty,

    #[error("failed to parse file: missing required column: {0}")]
    MissingColumn(&'static str),

    #[error("failed to parse file: row {row}: family_group is required")]
    MissingFamilyGroup { row: usize },

    #[error("failed to parse file: row {row}: family_group must be a number, got '{value}'")]
    InvalidFamilyGroup { row: usize, value: String },

    #[error("failed to parse file: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to parse file: {0}")]
    Xlsx(#[from] calamine::XlsxError),

    #[error("failed to read upload: {0}")]
    Upload(String),
}

impl ImportError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Validation
    }
}
