//! Serialization boundary for weft transducers.
//!
//! Two interchangeable surfaces over the same model:
//!
//! - [`binary`] -- The WFB binary format: magic header, NUL-terminated
//!   symbol tables, fixed-size `bytemuck` state/arc records
//! - [`text`] -- OpenFST-style text format: `src dst ilabel olabel [weight]`
//!   arc lines, `state [weight]` final lines, `symbol<TAB>id` symbol files
//!
//! Both are lossless for topology, labels and weights, and both loaders
//! re-validate the model invariants (dense ids, resolved arc targets, valid
//! start) before handing out a transducer. File-level writes go through a
//! temp file in the destination directory and are renamed into place, so a
//! failed run never leaves a partial output behind.

pub mod binary;
pub mod text;

use weft_core::error::FstError;

/// Errors crossing the serialization boundary.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("invalid magic number in header")]
    InvalidMagic,
    #[error("unsupported format version {0}")]
    UnsupportedVersion(u8),
    #[error("file too short: expected at least {expected} bytes, got {actual}")]
    TooShort { expected: usize, actual: usize },
    #[error("unknown semiring tag {0:#04x}")]
    UnknownSemiring(u8),
    #[error("semiring mismatch: file holds {found}, caller asked for {requested}")]
    SemiringMismatch {
        found: &'static str,
        requested: &'static str,
    },
    #[error("record alignment error")]
    Alignment,
    #[error("malformed text at line {line}: {reason}")]
    MalformedText { line: usize, reason: String },
    #[error(transparent)]
    Model(#[from] FstError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Write `bytes` to `path` atomically: the data lands in a temp file in the
/// same directory and is persisted over the destination in one rename.
pub fn write_atomic(path: &std::path::Path, bytes: &[u8]) -> Result<(), IoError> {
    use std::io::Write;
    let dir = path.parent().unwrap_or_else(|| std::path::Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.persist(path).map_err(|e| IoError::Io(e.error))?;
    Ok(())
}
