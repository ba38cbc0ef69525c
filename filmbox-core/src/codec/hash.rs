//! Truncated BLAKE3 integrity codec

use crate::codec::properties::{optional_u64, PropertyMap};
use crate::codec::{Codec, CodecCapacity, Decoded, ErasureSet};
use crate::constants::property_names::LENGTH;
use crate::constants::{codec_names, BLAKE3_HASH_SIZE};
use crate::error::FilmboxError;
use crate::stats::DecodeStats;
use bytes::{BufMut, BytesMut};
use serde::{Deserialize, Serialize};

/// Typed configuration of the hash codec
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashConfig {
    /// Trailer length in bytes (1..=32)
    pub length: usize,
}

impl Default for HashConfig {
    fn default() -> Self {
        Self {
            length: BLAKE3_HASH_SIZE,
        }
    }
}

impl HashConfig {
    /// Read the optional `length` property
    pub fn from_properties(props: &PropertyMap) -> Result<Self, FilmboxError> {
        let length = optional_u64(props, LENGTH, BLAKE3_HASH_SIZE as u64)?;
        if length == 0 || length > BLAKE3_HASH_SIZE as u64 {
            return Err(FilmboxError::InvalidProperty {
                property: LENGTH.into(),
                reason: format!("{} is outside 1..={}", length, BLAKE3_HASH_SIZE),
            });
        }
        Ok(Self {
            length: length as usize,
        })
    }
}

/// Integrity codec appending the leading bytes of a BLAKE3 digest
#[derive(Debug, Clone)]
pub struct HashCodec {
    config: HashConfig,
    capacity: CodecCapacity,
}

impl HashCodec {
    /// Build from a typed configuration
    pub fn new(config: HashConfig) -> Self {
        Self {
            config,
            capacity: CodecCapacity {
                encoded_block_size: config.length,
                encoded_data_size: config.length,
                decoded_block_size: 0,
                decoded_data_size: 0,
            },
        }
    }

    /// Build from a property map; `length` is optional
    pub fn from_properties(props: &PropertyMap) -> Result<Self, FilmboxError> {
        Ok(Self::new(HashConfig::from_properties(props)?))
    }

    fn digest(&self, data: &[u8]) -> blake3::Hash {
        blake3::hash(data)
    }
}

impl Codec for HashCodec {
    fn name(&self) -> &'static str {
        codec_names::HASH
    }

    fn is_error_correcting(&self) -> bool {
        false
    }

    fn capacity(&self) -> CodecCapacity {
        self.capacity
    }

    fn init_capacity(&mut self, encoded_size: usize) -> Result<CodecCapacity, FilmboxError> {
        self.capacity = CodecCapacity::with_trailer(self.name(), encoded_size, self.config.length)?;
        Ok(self.capacity)
    }

    fn encode(&self, mut data: BytesMut) -> Result<BytesMut, FilmboxError> {
        let digest = self.digest(&data);
        data.put_slice(&digest.as_bytes()[..self.config.length]);
        Ok(data)
    }

    fn decode(&self, mut data: BytesMut, _erasures: &ErasureSet) -> Decoded {
        let length = self.config.length;
        let payload_len = data.len().saturating_sub(length);
        let valid = data.len() >= length && {
            let (payload, trailer) = data.split_at(payload_len);
            &self.digest(payload).as_bytes()[..length] == trailer
        };
        data.truncate(payload_len);

        Decoded {
            data,
            valid,
            stats: DecodeStats::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::properties::properties;

    #[test]
    fn test_truncated_digest() {
        let c = HashCodec::from_properties(&properties([(LENGTH, 12u64)])).unwrap();
        let encoded = c.encode(BytesMut::from(&b"abc"[..])).unwrap();
        assert_eq!(encoded.len(), 15);
        assert_eq!(&encoded[3..], &blake3::hash(b"abc").as_bytes()[..12]);

        let decoded = c.decode(encoded, &ErasureSet::new());
        assert!(decoded.valid);
        assert_eq!(&decoded.data[..], b"abc");
    }

    #[test]
    fn test_damaged_trailer() {
        let c = HashCodec::new(HashConfig::default());
        let mut encoded = c.encode(BytesMut::from(&b"abc"[..])).unwrap();
        let last = encoded.len() - 1;
        encoded[last] ^= 1;
        let decoded = c.decode(encoded, &ErasureSet::new());
        assert!(!decoded.valid);
        assert_eq!(&decoded.data[..], b"abc");
    }

    #[test]
    fn test_length_bounds() {
        assert!(HashCodec::from_properties(&properties([(LENGTH, 0u64)])).is_err());
        assert!(HashCodec::from_properties(&properties([(LENGTH, 33u64)])).is_err());
    }
}
