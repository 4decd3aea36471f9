//! Wire-layer failures.

use std::io;

use thiserror::Error;

use crate::version::VersionError;

pub type WireResult<T> = Result<T, WireError>;

/// Why a wire read or write failed.
///
/// Every decode failure is terminal for the stream it occurred on. There is
/// no resynchronization: a reader that hits any of these must drop the
/// stream, because field boundaries are only implied by the protocol
/// version both peers agreed on.
#[derive(Debug, Error)]
pub enum WireError {
    #[error("unexpected end of stream")]
    UnexpectedEof,
    #[error("invalid variable-length integer encoding")]
    InvalidVInt,
    #[error("invalid boolean byte [{0:#04x}]")]
    InvalidBoolean(u8),
    #[error("invalid utf-8 in wire string")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
    #[error("value of [{len}] bytes does not fit in a wire length prefix")]
    LengthOverflow { len: usize },
    #[error(transparent)]
    Version(#[from] VersionError),
    #[error(transparent)]
    Io(#[from] io::Error),
}
