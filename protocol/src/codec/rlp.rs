//! RLP encoding of flat field lists.
//!
//! Both transaction shapes serialize to a single RLP list whose items are
//! all byte strings. These helpers encode such a list and parse it back,
//! rejecting anything that is not exactly one flat list of strings.

use alloy_rlp::{Encodable, Header};

use super::CodecError;

/// Encodes `fields` as one RLP list of byte strings.
pub fn encode_list<F: AsRef<[u8]>>(fields: &[F]) -> Vec<u8> {
    let payload_length: usize = fields.iter().map(|f| f.as_ref().length()).sum();
    let header = Header {
        list: true,
        payload_length,
    };

    // A list header is at most 9 bytes.
    let mut out = Vec::with_capacity(payload_length + 9);
    header.encode(&mut out);
    for field in fields {
        field.as_ref().encode(&mut out);
    }
    out
}

/// Decodes an RLP list of byte strings.
///
/// Errors on a non-list top level, nested lists, truncated input, or
/// trailing bytes after the list.
pub fn decode_list(mut buf: &[u8]) -> Result<Vec<Vec<u8>>, CodecError> {
    let header = Header::decode(&mut buf).map_err(|e| CodecError::Rlp(e.to_string()))?;
    if !header.list {
        return Err(CodecError::ExpectedList);
    }
    if buf.len() != header.payload_length {
        return Err(CodecError::LengthMismatch {
            declared: header.payload_length,
            actual: buf.len(),
        });
    }

    let mut fields = Vec::new();
    while !buf.is_empty() {
        let item = Header::decode(&mut buf).map_err(|e| CodecError::Rlp(e.to_string()))?;
        if item.list {
            return Err(CodecError::UnexpectedList);
        }
        if buf.len() < item.payload_length {
            return Err(CodecError::LengthMismatch {
                declared: item.payload_length,
                actual: buf.len(),
            });
        }
        let (payload, rest) = buf.split_at(item.payload_length);
        fields.push(payload.to_vec());
        buf = rest;
    }
    Ok(fields)
}
