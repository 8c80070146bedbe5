//! # Error Taxonomy
//!
//! Typed errors for the codec, carrying the byte offset at which a
//! violation was detected. Errors are surfaced through `eyre::Report` like
//! the rest of the crate; callers that need to branch on the failure mode
//! can downcast:
//!
//! ```ignore
//! let err = zmem::read(&schema, &truncated).unwrap_err();
//! let zerr = err.downcast_ref::<ZmemError>().unwrap();
//! assert_eq!(zerr.kind, ErrorKind::UnexpectedEnd);
//! ```
//!
//! ## Categories
//!
//! | Category | Kinds | Path |
//! |----------|-------|------|
//! | Input shape | UnexpectedEnd, SizeHeaderMismatch, OffsetOutOfRange, VectorCountOverflow, MapUnsorted, MapDuplicateKey | decoder, untrusted input |
//! | Resource | BufferTooSmall | writer in growing mode with a capacity limit |
//! | Policy (strict mode) | OptionalInvalidFlag, NonCanonicalBoolean | decoder with `DecodeOptions { strict: true }` |
//!
//! ## Offset Conventions
//!
//! - `UnexpectedEnd`: the first byte offset that was required but absent.
//! - All other kinds: the offset of the word or flag that violated the rule.
//!
//! The decoder abandons its partial result on the first error; no recovery
//! is attempted.

/// The closed set of codec failure modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The buffer ends before a required byte.
    UnexpectedEnd,
    /// A size or count header disagrees with the surrounding structure.
    SizeHeaderMismatch,
    /// An inline reference or offset-table entry points outside the
    /// declared content region.
    OffsetOutOfRange,
    /// An element count whose byte span cannot be represented.
    VectorCountOverflow,
    /// Map entries are not in ascending key order.
    MapUnsorted,
    /// Two map entries share a key.
    MapDuplicateKey,
    /// An optional's present flag is neither 0 nor 1 (strict mode only).
    OptionalInvalidFlag,
    /// A boolean byte is neither 0 nor 1 (strict mode only).
    NonCanonicalBoolean,
    /// The growing writer hit its capacity limit.
    BufferTooSmall,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::UnexpectedEnd => "unexpected end of input",
            ErrorKind::SizeHeaderMismatch => "size header mismatch",
            ErrorKind::OffsetOutOfRange => "offset out of range",
            ErrorKind::VectorCountOverflow => "vector count overflow",
            ErrorKind::MapUnsorted => "map entries not sorted by key",
            ErrorKind::MapDuplicateKey => "duplicate map key",
            ErrorKind::OptionalInvalidFlag => "optional flag is not 0 or 1",
            ErrorKind::NonCanonicalBoolean => "boolean byte is not 0 or 1",
            ErrorKind::BufferTooSmall => "buffer capacity exceeded",
        }
    }
}

/// A codec error with the byte offset where it was detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZmemError {
    pub kind: ErrorKind,
    pub offset: usize,
}

impl ZmemError {
    pub fn new(kind: ErrorKind, offset: usize) -> Self {
        Self { kind, offset }
    }
}

impl std::fmt::Display for ZmemError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} at byte {}", self.kind.as_str(), self.offset)
    }
}

impl std::error::Error for ZmemError {}

/// Builds an `eyre::Report` from a kind and offset.
pub(crate) fn err(kind: ErrorKind, offset: usize) -> eyre::Report {
    eyre::Report::new(ZmemError::new(kind, offset))
}
