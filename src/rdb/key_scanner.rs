use std::path::Path;

use tracing::debug;

use crate::rdb::{RdbError, encoding::RdbReader};

const MAGIC_STRING: &[u8] = b"REDIS";
const METADATA_OPCODE: u8 = 0xFA;
const RESIZE_DB_OPCODE: u8 = 0xFB;
const EXPIRATION_MILLISECONDS_OPCODE: u8 = 0xFC;
const EXPIRATION_SECONDS_OPCODE: u8 = 0xFD;
const DATABASE_OPCODE: u8 = 0xFE;
const END_OF_FILE_OPCODE: u8 = 0xFF;
const STRING_VALUE_TYPE: u8 = 0x00;

pub async fn read_snapshot_keys(path: &Path) -> Result<Vec<String>, RdbError> {
    let bytes = tokio::fs::read(path).await?;

    parse_keys(&bytes)
}

/// Lists the keys stored in an RDB image, in file order.
///
/// Expiry timestamps are skipped, so keys that have already expired are
/// listed too.
pub fn parse_keys(bytes: &[u8]) -> Result<Vec<String>, RdbError> {
    let mut reader = RdbReader::new(bytes);
    let mut keys = Vec::new();

    parse_header(&mut reader)?;

    while !reader.is_at_end() {
        match reader.read_u8()? {
            METADATA_OPCODE => {
                let name = reader.read_string()?;
                let value = reader.read_string()?;
                debug!(%name, %value, "snapshot metadata");
            }
            DATABASE_OPCODE => {
                reader.read_length()?;
            }
            RESIZE_DB_OPCODE => {
                reader.read_length()?;
                reader.read_length()?;
            }
            EXPIRATION_SECONDS_OPCODE => {
                reader.read_bytes(4)?;
                let value_type = reader.read_u8()?;
                keys.push(read_entry(&mut reader, value_type)?);
            }
            EXPIRATION_MILLISECONDS_OPCODE => {
                reader.read_bytes(8)?;
                let value_type = reader.read_u8()?;
                keys.push(read_entry(&mut reader, value_type)?);
            }
            // The checksum after this marker is not verified.
            END_OF_FILE_OPCODE => break,
            value_type => keys.push(read_entry(&mut reader, value_type)?),
        }
    }

    Ok(keys)
}

fn parse_header(reader: &mut RdbReader) -> Result<(), RdbError> {
    if reader.read_bytes(MAGIC_STRING.len())? != MAGIC_STRING {
        return Err(RdbError::InvalidMagicString);
    }

    let version = String::from_utf8_lossy(reader.read_bytes(4)?).into_owned();

    match version.parse::<u32>() {
        Ok(1..=12) => Ok(()),
        _ => Err(RdbError::InvalidVersion(version)),
    }
}

fn read_entry(reader: &mut RdbReader, value_type: u8) -> Result<String, RdbError> {
    if value_type != STRING_VALUE_TYPE {
        return Err(RdbError::UnsupportedValueType(value_type));
    }

    let key = reader.read_string()?;
    reader.read_string()?;

    Ok(key)
}
