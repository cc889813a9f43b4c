use thiserror::Error;

/// Main error type for the gridfold pipeline
#[derive(Error, Debug)]
pub enum GfError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Data error: {0}")]
    Data(#[from] DataError),

    /// Failure raised by a training backend, carried through untouched.
    #[error(transparent)]
    Backend(anyhow::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl GfError {
    /// Wrap a backend failure without altering it.
    pub fn backend(error: anyhow::Error) -> Self {
        GfError::Backend(error)
    }

    /// Borrow the backend's original error, if this is a backend failure.
    pub fn backend_source(&self) -> Option<&anyhow::Error> {
        match self {
            GfError::Backend(e) => Some(e),
            _ => None,
        }
    }
}

/// Data-related errors
#[derive(Error, Debug)]
pub enum DataError {
    #[error("Misaligned data: {features} feature rows but {targets} targets")]
    Misaligned { features: usize, targets: usize },

    #[error("Ragged features: row {row} has {found} columns, expected {expected}")]
    Ragged {
        row: usize,
        found: usize,
        expected: usize,
    },

    #[error("Empty data: {message}")]
    Empty { message: String },

    #[error("Invalid fold {fold}: {message}")]
    InvalidFold { fold: usize, message: String },

    #[error("Row index {index} out of bounds for {len} rows")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("Overfit ratio undefined for row {row}: training error {train_error} is not positive")]
    NonPositiveTrainError { row: usize, train_error: f64 },

    #[error("Invalid size metric {value:?} at row {row}")]
    InvalidSize { row: usize, value: String },

    #[error("Evolution log parse error in {path} at record {record}: {message}")]
    LogParse {
        path: String,
        record: usize,
        message: String,
    },
}

/// Result type alias for gridfold operations
pub type GfResult<T> = Result<T, GfError>;

/// Macro for creating configuration errors
#[macro_export]
macro_rules! config_error {
    ($($arg:tt)*) => {
        $crate::GfError::Config(format!($($arg)*))
    };
}

/// Macro for creating empty-data errors
#[macro_export]
macro_rules! empty_data {
    ($($arg:tt)*) => {
        $crate::GfError::Data($crate::DataError::Empty { message: format!($($arg)*) })
    };
}
