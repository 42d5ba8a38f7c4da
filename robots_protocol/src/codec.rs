// Binary wire codec: big-endian primitives and length-prefixed composites.
//
// Everything on the wire is built from five shapes: unsigned integers
// (big-endian), strings (one-byte length, then raw bytes), lists (four-byte
// length, then elements) and mappings (four-byte length, then key/value
// pairs in ascending key order). Decoding works incrementally off any
// `Read`, so a TCP stream can be consumed message by message without
// knowing sizes up front.

use std::collections::BTreeMap;
use std::io::{self, Read};

use thiserror::Error;

/// Why a stream can no longer be decoded. Fatal for the stream that
/// produced it: the connection is dropped, not resynchronized.
#[derive(Debug, Error)]
pub enum WireError {
    #[error("stream error: {0}")]
    Io(#[from] io::Error),
    #[error("unrecognised {kind} tag: {tag}")]
    BadTag { kind: &'static str, tag: u8 },
    #[error("string is not valid UTF-8")]
    BadString(#[from] std::string::FromUtf8Error),
}

/// Serialize a value into an output buffer. Encoding is infallible; all
/// length limits (names of at most 255 bytes, list sizes within u32) are
/// guaranteed by the types and the call sites.
pub trait Encode {
    fn encode(&self, buf: &mut Vec<u8>);
}

/// Deserialize a value by consuming exactly its wire representation.
pub trait Decode: Sized {
    fn decode(r: &mut impl Read) -> Result<Self, WireError>;
}

impl Encode for u8 {
    fn encode(&self, buf: &mut Vec<u8>) {
        buf.push(*self);
    }
}

impl Decode for u8 {
    fn decode(r: &mut impl Read) -> Result<Self, WireError> {
        let mut bytes = [0u8; 1];
        r.read_exact(&mut bytes)?;
        Ok(bytes[0])
    }
}

impl Encode for u16 {
    fn encode(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.to_be_bytes());
    }
}

impl Decode for u16 {
    fn decode(r: &mut impl Read) -> Result<Self, WireError> {
        let mut bytes = [0u8; 2];
        r.read_exact(&mut bytes)?;
        Ok(u16::from_be_bytes(bytes))
    }
}

impl Encode for u32 {
    fn encode(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.to_be_bytes());
    }
}

impl Decode for u32 {
    fn decode(r: &mut impl Read) -> Result<Self, WireError> {
        let mut bytes = [0u8; 4];
        r.read_exact(&mut bytes)?;
        Ok(u32::from_be_bytes(bytes))
    }
}

impl Encode for String {
    fn encode(&self, buf: &mut Vec<u8>) {
        debug_assert!(self.len() <= u8::MAX as usize);
        #[expect(clippy::cast_possible_truncation)]
        buf.push(self.len() as u8);
        buf.extend_from_slice(self.as_bytes());
    }
}

impl Decode for String {
    fn decode(r: &mut impl Read) -> Result<Self, WireError> {
        let len = u8::decode(r)?;
        let mut bytes = vec![0u8; usize::from(len)];
        r.read_exact(&mut bytes)?;
        Ok(String::from_utf8(bytes)?)
    }
}

impl<T: Encode> Encode for Vec<T> {
    fn encode(&self, buf: &mut Vec<u8>) {
        #[expect(clippy::cast_possible_truncation)]
        (self.len() as u32).encode(buf);
        for item in self {
            item.encode(buf);
        }
    }
}

impl<T: Decode> Decode for Vec<T> {
    fn decode(r: &mut impl Read) -> Result<Self, WireError> {
        let len = u32::decode(r)?;
        // No up-front reservation: a hostile length prefix should fail on
        // the first missing element, not on an oversized allocation.
        let mut items = Vec::new();
        for _ in 0..len {
            items.push(T::decode(r)?);
        }
        Ok(items)
    }
}

impl<K: Encode, V: Encode> Encode for BTreeMap<K, V> {
    fn encode(&self, buf: &mut Vec<u8>) {
        #[expect(clippy::cast_possible_truncation)]
        (self.len() as u32).encode(buf);
        // BTreeMap iteration is ascending by key, which is exactly the
        // order the wire format requires.
        for (key, value) in self {
            key.encode(buf);
            value.encode(buf);
        }
    }
}

impl<K: Decode + Ord, V: Decode> Decode for BTreeMap<K, V> {
    fn decode(r: &mut impl Read) -> Result<Self, WireError> {
        let len = u32::decode(r)?;
        let mut map = BTreeMap::new();
        for _ in 0..len {
            let key = K::decode(r)?;
            let value = V::decode(r)?;
            map.insert(key, value);
        }
        Ok(map)
    }
}
