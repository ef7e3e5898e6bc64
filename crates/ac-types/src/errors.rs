use thiserror::Error;

/// Main error type for the ACAML system
#[derive(Error, Debug)]
pub enum AcError {
    #[error("Data error: {0}")]
    Data(#[from] DataError),

    #[error("Search failed in oracle '{oracle}': {source}")]
    SearchFailed {
        oracle: String,
        #[source]
        source: OracleError,
    },

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl AcError {
    /// Wrap an oracle failure as the fatal run error.
    pub fn search_failed(oracle: impl Into<String>, source: OracleError) -> Self {
        Self::SearchFailed {
            oracle: oracle.into(),
            source,
        }
    }

    pub fn is_search_failure(&self) -> bool {
        matches!(self, Self::SearchFailed { .. })
    }
}

/// Dataset construction and loading errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DataError {
    #[error("Column not found: {column}")]
    ColumnNotFound { column: String },

    #[error("Duplicate column name: {column}")]
    DuplicateColumn { column: String },

    #[error("Column {column} has {actual} values, expected {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    #[error("Column {column} is not numeric; encode it before building features")]
    NonNumericFeature { column: String },

    #[error("Row {row} has {actual} values, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid data format: {message}")]
    InvalidFormat { message: String },

    #[error("Data loading failed: {message}")]
    LoadingFailed { message: String },

    #[error("Data parsing error: {message}")]
    ParseError { message: String },
}

/// Errors raised by an estimator while fitting or predicting
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Model {model} has not been fitted")]
    NotFitted { model: String },

    #[error("Cannot fit {model} on an empty training set")]
    EmptyTrainingSet { model: String },

    #[error("Feature count mismatch: model expects {expected}, got {actual}")]
    FeatureCountMismatch { expected: usize, actual: usize },

    #[error("Target has {actual} values for {expected} rows")]
    TargetLengthMismatch { expected: usize, actual: usize },

    #[error("Invalid parameter {name}: {message}")]
    InvalidParameter { name: String, message: String },

    #[error("Model {model} diverged during fitting")]
    Diverged { model: String },

    #[error("Unknown class index {index}")]
    UnknownClass { index: usize },

    #[error("Unsupported operation: {message}")]
    Unsupported { message: String },
}

/// Failures reported by a search oracle
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OracleError {
    #[error("training partition is empty")]
    EmptyTrainingSet,

    #[error("training features have {features} rows but target has {targets} values")]
    ShapeMismatch { features: usize, targets: usize },

    #[error("malformed data: {message}")]
    MalformedData { message: String },

    #[error("infeasible request: {message}")]
    Infeasible { message: String },

    #[error("no candidate converged after {attempted} trials (last error: {last_error})")]
    NoCandidateConverged { attempted: usize, last_error: String },

    #[error("scoring failed: {message}")]
    Scoring { message: String },

    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Failures raised by an attribution capability
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AttributionError {
    #[error("background data is empty")]
    EmptyBackground,

    #[error("no rows to explain")]
    EmptyRows,

    #[error("background has {background} features but rows have {rows}")]
    FeatureMismatch { background: usize, rows: usize },

    #[error("model output is not finite")]
    NonFiniteOutput,

    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Result type alias for ACAML operations
pub type AcResult<T> = Result<T, AcError>;

/// Macro for creating validation errors
#[macro_export]
macro_rules! validation_error {
    ($($arg:tt)*) => {
        $crate::AcError::Validation(format!($($arg)*))
    };
}

/// Macro for creating internal errors
#[macro_export]
macro_rules! internal_error {
    ($($arg:tt)*) => {
        $crate::AcError::Internal(format!($($arg)*))
    };
}

/// Macro for creating configuration errors
#[macro_export]
macro_rules! config_error {
    ($($arg:tt)*) => {
        $crate::AcError::Config(format!($($arg)*))
    };
}
