use cookie_factory::GenError;
use nom::error::{ErrorKind, ParseError};
use thiserror::Error;

/// Errors raised while reading or writing pcap-ng data
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PcapError {
    /// No more data: the input is empty
    #[error("end of file")]
    Eof,
    /// The underlying reader failed
    #[error("read error")]
    ReadError,
    /// The input ends in the middle of a block
    #[error("unexpected end of file (truncated block)")]
    UnexpectedEof,

    /// The section header magic could not be found, or does not give a byte order
    #[error("section header not recognized")]
    HeaderNotRecognized,
    /// A block declares a total length smaller than its framing
    #[error("invalid block length {0}")]
    InvalidBlockLength(u32),
    /// Leading and trailing block lengths differ
    #[error("block length mismatch (leading {leading}, trailing {trailing})")]
    FrameLengthMismatch { leading: u32, trailing: u32 },
    /// A block does not fit in the maximum buffer size of a streaming reader
    #[error("block needs at least {needed} bytes, maximum block size is {max}")]
    BlockTooLarge { needed: usize, max: usize },
    /// A declared length does not fit in the remaining bytes of the block
    #[error("{what}: declared length {declared} exceeds remaining {available} bytes")]
    LengthMismatch {
        what: &'static str,
        declared: usize,
        available: usize,
    },

    /// A format violation was reported while the strictness policy is `Fail`
    #[error("strictness violation: {0}")]
    Strictness(String),

    /// The interface id is not registered in the section
    #[error("interface {0} is not registered in this section")]
    UnknownInterface(u32),
    /// A field value does not match the field type
    #[error("invalid value for {field}: {reason}")]
    InvalidFieldValue { field: String, reason: String },
    /// The block cannot be a member of a section
    #[error("{0} cannot be a member of a section")]
    InvalidMember(&'static str),

    /// Serializing a block failed (including write errors)
    #[error("serialization error: {0}")]
    Serialize(String),

    #[error("nom error: {0:?}")]
    NomError(ErrorKind),
}

impl PcapError {
    pub(crate) fn invalid_value<F: Into<String>, R: Into<String>>(field: F, reason: R) -> Self {
        PcapError::InvalidFieldValue {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl<I> ParseError<I> for PcapError {
    fn from_error_kind(_input: I, kind: ErrorKind) -> Self {
        PcapError::NomError(kind)
    }
    fn append(_input: I, _kind: ErrorKind, other: Self) -> Self {
        other
    }
}

impl From<GenError> for PcapError {
    fn from(e: GenError) -> Self {
        PcapError::Serialize(format!("{:?}", e))
    }
}

impl From<nom::Err<PcapError>> for PcapError {
    fn from(e: nom::Err<PcapError>) -> Self {
        match e {
            nom::Err::Error(e) | nom::Err::Failure(e) => e,
            nom::Err::Incomplete(_) => PcapError::UnexpectedEof,
        }
    }
}
