// Shared error type for the WFST core.
//
// The variants fall into three groups (see `ErrorKind`): caller misuse,
// violated algorithm preconditions, and operations a semiring or structure
// does not define. Algorithms fail fast: a half-built result is dropped,
// never returned.

/// Coarse classification of an [`FstError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caller misuse: bad ids, mismatched tables, mutating frozen data.
    InvalidArgument,
    /// A documented algorithm precondition was violated by the input.
    InvariantViolation,
    /// The operation is not defined for this semiring or structure.
    Unsupported,
}

/// Error type shared by the transducer model, the semiring algebra, and the
/// graph algorithms.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FstError {
    #[error("transducer has no start state")]
    NoStartState,
    #[error("no such state: {0}")]
    NoSuchState(u32),
    #[error("cannot delete the start state ({0})")]
    DeleteStartState(u32),
    #[error("symbol table mismatch: left output symbols != right input symbols")]
    SymbolTableMismatch,
    #[error("unknown symbol: {0}")]
    UnknownSymbol(String),
    #[error("frozen symbol table cannot be modified")]
    FrozenModification,
    #[error("divide by zero weight")]
    DivideByZero,

    #[error("non-functional transducer: {0}")]
    NonFunctional(String),
    #[error("gallic plus on unequal label sequences in restrict mode")]
    GallicRestrictViolation,
    #[error("corrupt transducer: {0}")]
    CorruptModel(String),

    #[error("unsupported operation: {0}")]
    UnsupportedOperation(&'static str),
}

impl FstError {
    /// Which group of the error taxonomy this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            FstError::NoStartState
            | FstError::NoSuchState(_)
            | FstError::DeleteStartState(_)
            | FstError::SymbolTableMismatch
            | FstError::UnknownSymbol(_)
            | FstError::FrozenModification
            | FstError::DivideByZero => ErrorKind::InvalidArgument,
            FstError::NonFunctional(_)
            | FstError::GallicRestrictViolation
            | FstError::CorruptModel(_) => ErrorKind::InvariantViolation,
            FstError::UnsupportedOperation(_) => ErrorKind::Unsupported,
        }
    }
}
