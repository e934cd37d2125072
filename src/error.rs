use thiserror::Error;

/// Configuration and interpretation failures for L-System trees.
///
/// Every variant except [`TreeError::Symbios`] points at a defect in a species
/// table or in the output its grammar produced; none of them are retried.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TreeError {
    #[error("symbol '{symbol}' is produced by the grammar but has no block generation")]
    MissingBlockRule { symbol: char },

    #[error("seed axion '{seed}' does not start with a symbol that has a replacement rule")]
    InertSeed { seed: String },

    #[error("replacement rule for '{symbol}' has an invalid weight {weight}")]
    InvalidWeight { symbol: char, weight: f32 },

    #[error("replacement weights for '{symbol}' sum to {total}, which exceeds 1.0")]
    WeightOverflow { symbol: char, total: f32 },

    #[error("']' at element {index} pops an empty branch stack")]
    UnbalancedPop { index: usize },

    #[error("{open} branch(es) are never closed")]
    UnclosedBranch { open: usize },

    #[error("'[' at element {index} exceeds the maximum branch depth of {max_depth}")]
    StackOverflow { index: usize, max_depth: usize },

    #[error("symbol '{symbol}' has no turtle operation")]
    UnmappedSymbol { symbol: char },

    #[error("symbol ID {id} at element {index} has no turtle operation")]
    UnmappedSymbolId { id: u16, index: usize },

    #[error("parameter '{parameter}' of '{symbol}' is not a number")]
    InvalidParameter { symbol: char, parameter: String },

    #[error("a plant with ID '{0}' is already registered")]
    DuplicatePlugin(String),

    #[error("symbios error: {0}")]
    Symbios(String),
}
