use thiserror::Error;

/// Fatal failures of a single export call.
///
/// Dropped schedule records and missing images are not errors; they are
/// reported through [`crate::placement::Diagnostics`] and the log instead.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("No schedules to export")]
    EmptySchedule,
    #[error("Failed to create PDF: {0}")]
    Pdf(String),
    #[error("Failed to write CSV: {0}")]
    Csv(String),
    #[error("Failed to read schedules: {0}")]
    Input(String),
    #[error("Invalid branding configuration: {0}")]
    Config(String),
    #[error("Invalid date format: {0}")]
    Date(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<csv::Error> for ExportError {
    fn from(e: csv::Error) -> Self {
        ExportError::Csv(e.to_string())
    }
}
