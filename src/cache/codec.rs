//! Compact binary encoding of a [`SauceRecord`] for the key/value cache
//!
//! Layout: zlib( JSON array of nullable strings in [`SauceField::SCHEMA`]
//! order ). A record with every field null encodes to zero bytes, which is
//! also what an empty payload decodes back to.

use std::io::{Read, Write};

use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;

use crate::errors::{CodecError, CodecResult};
use crate::models::{SauceField, SauceRecord};

/// Encode a record for storage
pub fn encode(record: &SauceRecord) -> CodecResult<Vec<u8>> {
    if record.is_blank() {
        return Ok(Vec::new());
    }

    let values: Vec<Option<&str>> = record.fields().map(|(_, value)| value).collect();
    let json = serde_json::to_vec(&values)?;

    let mut encoder = ZlibEncoder::new(Vec::with_capacity(json.len()), Compression::fast());
    encoder.write_all(&json)?;
    Ok(encoder.finish()?)
}

/// Rebuild a record from a stored payload
///
/// Payloads written by an older schema (fewer fields) decode with the
/// missing trailing fields left null.
pub fn decode(image_url: &str, bytes: &[u8]) -> CodecResult<SauceRecord> {
    let mut record = SauceRecord::new(image_url);
    if bytes.is_empty() {
        return Ok(record);
    }

    let mut json = Vec::new();
    ZlibDecoder::new(bytes).read_to_end(&mut json)?;

    let values: Vec<Option<String>> = serde_json::from_slice(&json)?;
    if values.len() > SauceField::COUNT {
        return Err(CodecError::SchemaMismatch {
            found: values.len(),
            expected: SauceField::COUNT,
        });
    }

    for (field, value) in SauceField::SCHEMA.into_iter().zip(values) {
        let Some(value) = value else { continue };
        if field == SauceField::ErrorKind {
            let kind = value
                .parse()
                .map_err(|_| CodecError::UnknownErrorKind { value: value.clone() })?;
            record.set_error_kind(kind);
        } else {
            record.update_if_absent(field, Some(value));
        }
    }

    Ok(record)
}
