use std::io;

use crate::dynamic::BackingKind;
use crate::monitoring::CoreError;

#[derive(Debug, thiserror::Error)]
/// An error that can occur while resolving, binding or projecting a column.
pub enum ColumnError {
    #[error("filtering on {kind} column '{column}' not supported")]
    /// The column kind cannot construct predicates.
    ///
    /// This must surface as a query error, it is never downgraded to an
    /// always true or always false filter.
    UnsupportedOperation { kind: ColumnKindLabel, column: String },
    #[error(transparent)]
    /// The renderer or data adapter of a bound column could not be built.
    Construction(#[from] ConstructionError),
    #[error("missing separator in dynamic column '{0}'")]
    MissingSeparator(String),
    #[error("unknown dynamic column '{0}'")]
    UnknownDynamicColumn(String),
    #[error("empty column name for dynamic column '{0}'")]
    EmptyColumnName(String),
    #[error("duplicate dynamic column '{0}'")]
    DuplicateDynamicColumn(String),
    #[error("Core Error: {0}")]
    Core(#[from] CoreError),
    #[error("IO Error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
/// A failure raised while constructing the collaborators of a bound column.
pub enum ConstructionError {
    #[error("invalid arguments for column '{column}': {reason}")]
    /// The argument string given with the column reference is malformed.
    InvalidArguments { column: String, reason: String },
    #[error("{0}")]
    /// The leaf column refused the parts it was given.
    Rejected(String),
}

impl ConstructionError {
    pub(crate) fn invalid_arguments(column: &str, reason: impl Into<String>) -> Self {
        Self::InvalidArguments {
            column: column.to_string(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
/// Describes the column in an [ColumnError::UnsupportedOperation] message.
pub enum ColumnKindLabel {
    /// A dynamic column which has not been bound yet.
    Dynamic(BackingKind),
    /// A column bound to its data source.
    Bound(BackingKind),
}

impl std::fmt::Display for ColumnKindLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dynamic(kind) => write!(f, "dynamic {kind}"),
            Self::Bound(kind) => write!(f, "{kind}"),
        }
    }
}
