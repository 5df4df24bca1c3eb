use crate::models::{ItemId, ItemIndex};

/// Trained artifacts are malformed or mutually inconsistent.
///
/// Raised only while building a [`crate::store::ModelStore`]; a process that
/// hits this must not serve requests.
#[derive(thiserror::Error, Debug)]
pub enum LoadError {
    #[error("factor matrix has {factor_rows} rows but bias vector has {bias_len} entries")]
    ShapeMismatch { factor_rows: usize, bias_len: usize },

    #[error("factor row {row} has {found} columns, expected {expected}")]
    RaggedFactors {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("factor dimension must be at least 1")]
    EmptyDimension,

    #[error("non-finite value in {what} at item index {index}")]
    NonFiniteValue { what: &'static str, index: ItemIndex },

    #[error("item {item_id} maps to index {index}, outside [0, {item_count})")]
    IndexOutOfRange {
        item_id: ItemId,
        index: ItemIndex,
        item_count: usize,
    },

    #[error("index {index} is claimed by both {first} and {second}")]
    DuplicateIndex {
        index: ItemIndex,
        first: ItemId,
        second: ItemId,
    },

    #[error("no item id maps to index {index}")]
    MissingIndex { index: ItemIndex },

    #[error("failed to read artifacts: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse artifacts: {0}")]
    Parse(#[from] serde_json::Error),
}

/// The regularized normal equations could not be solved.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum SolveError {
    #[error("normal-equations matrix ({dimension}x{dimension}) is not positive-definite")]
    NotPositiveDefinite { dimension: usize },

    #[error("user vector solution contains non-finite values")]
    NonFiniteSolution,
}

/// Per-request failure. Both variants are recoverable by the caller.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum RecommendError {
    #[error("no usable ratings in request")]
    InsufficientData,

    #[error("solve failed: {0}")]
    Solve(#[from] SolveError),
}

pub type RecommendResult<T> = Result<T, RecommendError>;
