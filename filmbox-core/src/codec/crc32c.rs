//! CRC-32C integrity codec
//!
//! 4-byte big-endian trailer computed with the `crc32c` crate. Unlike the
//! CRC-64 codec the trailer is stripped and compared rather than folded back
//! into the register.

use crate::codec::properties::{optional_u64, PropertyMap};
use crate::codec::{Codec, CodecCapacity, Decoded, ErasureSet};
use crate::constants::property_names::SEED;
use crate::constants::{codec_names, CRC32C_SIZE};
use crate::error::FilmboxError;
use crate::stats::DecodeStats;
use bytes::{BufMut, BytesMut};
use serde::{Deserialize, Serialize};

/// Typed configuration of the CRC-32C codec
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Crc32cConfig {
    /// Value the checksum is appended to (0 for plain CRC-32C)
    pub seed: u32,
}

impl Crc32cConfig {
    /// Read the optional `seed` property
    pub fn from_properties(props: &PropertyMap) -> Result<Self, FilmboxError> {
        let seed = optional_u64(props, SEED, 0)?;
        let seed = u32::try_from(seed).map_err(|_| FilmboxError::InvalidProperty {
            property: SEED.into(),
            reason: format!("{:#x} does not fit in 32 bits", seed),
        })?;
        Ok(Self { seed })
    }
}

/// Integrity codec with a CRC-32C trailer
#[derive(Debug, Clone)]
pub struct Crc32cCodec {
    config: Crc32cConfig,
    capacity: CodecCapacity,
}

impl Crc32cCodec {
    /// Build from a typed configuration
    pub fn new(config: Crc32cConfig) -> Self {
        Self {
            config,
            capacity: CodecCapacity {
                encoded_block_size: CRC32C_SIZE,
                encoded_data_size: CRC32C_SIZE,
                decoded_block_size: 0,
                decoded_data_size: 0,
            },
        }
    }

    /// Build from a property map; `seed` is optional
    pub fn from_properties(props: &PropertyMap) -> Result<Self, FilmboxError> {
        Ok(Self::new(Crc32cConfig::from_properties(props)?))
    }

    fn checksum(&self, data: &[u8]) -> u32 {
        crc32c::crc32c_append(self.config.seed, data)
    }
}

impl Codec for Crc32cCodec {
    fn name(&self) -> &'static str {
        codec_names::CRC32C
    }

    fn is_error_correcting(&self) -> bool {
        false
    }

    fn capacity(&self) -> CodecCapacity {
        self.capacity
    }

    fn init_capacity(&mut self, encoded_size: usize) -> Result<CodecCapacity, FilmboxError> {
        self.capacity = CodecCapacity::with_trailer(self.name(), encoded_size, CRC32C_SIZE)?;
        Ok(self.capacity)
    }

    fn encode(&self, mut data: BytesMut) -> Result<BytesMut, FilmboxError> {
        let crc = self.checksum(&data);
        data.put_u32(crc);
        Ok(data)
    }

    fn decode(&self, mut data: BytesMut, _erasures: &ErasureSet) -> Decoded {
        let payload_len = data.len().saturating_sub(CRC32C_SIZE);
        let valid = data.len() >= CRC32C_SIZE && {
            let (payload, trailer) = data.split_at(payload_len);
            let expected = u32::from_be_bytes([trailer[0], trailer[1], trailer[2], trailer[3]]);
            self.checksum(payload) == expected
        };
        data.truncate(payload_len);

        Decoded {
            data,
            valid,
            stats: DecodeStats::default(),
        }
    }
}
