//! Reading key names out of an RDB snapshot file.
//!
//! Only what KEYS needs is decoded: the header, the auxiliary and database
//! sections and plain string entries. Values are skipped.

mod encoding;
mod key_scanner;

use thiserror::Error;

pub use key_scanner::{parse_keys, read_snapshot_keys};

#[derive(Error, Debug)]
pub enum RdbError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid magic string")]
    InvalidMagicString,
    #[error("invalid RDB version {0:?}")]
    InvalidVersion(String),
    #[error("unexpected end of file at byte {0}")]
    UnexpectedEof(usize),
    #[error("invalid length encoding 0x{0:02X}")]
    InvalidLengthEncoding(u8),
    #[error("LZF-compressed strings are not supported")]
    CompressedString,
    #[error("unsupported value type 0x{0:02X}")]
    UnsupportedValueType(u8),
}
