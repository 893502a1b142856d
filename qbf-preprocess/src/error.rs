//! Error types produced while building and configuring a formula.

use thiserror::Error;

/// Errors that can occur while the ingest event stream is being consumed.
///
/// These mirror the error taxonomy's "ingest errors": they are unrecoverable for the formula
/// being built, so callers are expected to abort the current instance rather than attempt repair.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("declare_max_var_id called more than once")]
    MaxVarAlreadyDeclared,

    #[error("variable {0} used before declare_max_var_id was called")]
    NoMaxVarDeclared(u32),

    #[error("variable {var} exceeds the declared maximum of {max_var}")]
    VarOutOfRange { var: u32, max_var: u32 },

    #[error("variable {0} is already quantified in another block")]
    VariableAlreadyQuantified(u32),

    #[error("literal for undeclared or unquantified variable {0}")]
    UndeclaredVariable(u32),

    #[error("add_var_to_qblock called with no open quantifier block")]
    NoOpenQBlock,

    #[error("add_literal called while a quantifier block is still open")]
    QBlockStillOpen,
}

/// Errors reported while applying a configuration option.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown option '{0}'")]
    UnknownOption(String),

    #[error("option '{option}' expects a numeric value, got '{value}'")]
    NotANumber { option: String, value: String },

    #[error("option '{0}' does not take a value")]
    UnexpectedValue(String),

    #[error("option '{0}' requires a value")]
    MissingValue(String),
}

/// Errors from a call to [`crate::formula::Formula::preprocess`].
///
/// Per the resource model, a soft time limit or a per-check propagation budget are not errors:
/// they degrade gracefully (the driver loop stops early, or a single check is treated as
/// inconclusive). Only conditions the engine cannot proceed past are represented here.
#[derive(Debug, Error)]
pub enum PreprocessError {
    #[error("memory limit of {limit_mb} MB exceeded (approximately {used_mb} MB in use)")]
    MemoryLimitExceeded { limit_mb: u64, used_mb: u64 },
}
