//! CRC-64 integrity codec
//!
//! Appends an 8-byte big-endian CRC trailer. The CRC is a plain MSB-first
//! register seeded with the configured `seed`, with no reflection and no final
//! XOR, so running it over payload plus trailer leaves a zero register. Decode
//! relies on exactly that; this trailer layout must not change.

use crate::codec::properties::{required_u64, PropertyMap};
use crate::codec::{Codec, CodecCapacity, Decoded, ErasureSet};
use crate::constants::property_names::{POLYNOMIAL, SEED};
use crate::constants::{codec_names, CRC64_SIZE};
use crate::error::FilmboxError;
use crate::stats::DecodeStats;
use bytes::{BufMut, BytesMut};
use serde::{Deserialize, Serialize};

/// Typed configuration of the CRC-64 codec
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Crc64Config {
    /// Generator polynomial, implicit top bit omitted
    pub polynomial: u64,
    /// Initial register value
    pub seed: u64,
}

impl Crc64Config {
    /// Read the required `polynomial` and `seed` properties
    pub fn from_properties(props: &PropertyMap) -> Result<Self, FilmboxError> {
        Ok(Self {
            polynomial: required_u64(props, codec_names::CRC64, POLYNOMIAL)?,
            seed: required_u64(props, codec_names::CRC64, SEED)?,
        })
    }
}

/// Table-driven CRC-64 calculator
#[derive(Clone)]
pub struct Crc64 {
    table: [u64; 256],
}

impl Crc64 {
    /// Build the lookup table for `polynomial`
    pub fn new(polynomial: u64) -> Self {
        let mut table = [0u64; 256];
        for (i, entry) in table.iter_mut().enumerate() {
            let mut crc = (i as u64) << 56;
            for _ in 0..8 {
                crc = if crc & (1 << 63) != 0 {
                    (crc << 1) ^ polynomial
                } else {
                    crc << 1
                };
            }
            *entry = crc;
        }
        Self { table }
    }

    /// Continue a CRC from register value `crc` over `data`
    pub fn update(&self, mut crc: u64, data: &[u8]) -> u64 {
        for &byte in data {
            let index = ((crc >> 56) as u8 ^ byte) as usize;
            crc = self.table[index] ^ (crc << 8);
        }
        crc
    }
}

/// Integrity codec with a self-verifying CRC-64 trailer
pub struct Crc64Codec {
    config: Crc64Config,
    crc: Crc64,
    capacity: CodecCapacity,
}

impl core::fmt::Debug for Crc64Codec {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Crc64Codec")
            .field("config", &self.config)
            .field("capacity", &self.capacity)
            .finish()
    }
}

impl Crc64Codec {
    /// Build from a typed configuration
    pub fn new(config: Crc64Config) -> Self {
        Self {
            config,
            crc: Crc64::new(config.polynomial),
            // Smallest container: a bare trailer
            capacity: CodecCapacity {
                encoded_block_size: CRC64_SIZE,
                encoded_data_size: CRC64_SIZE,
                decoded_block_size: 0,
                decoded_data_size: 0,
            },
        }
    }

    /// Build from a property map; `polynomial` and `seed` are required
    pub fn from_properties(props: &PropertyMap) -> Result<Self, FilmboxError> {
        Ok(Self::new(Crc64Config::from_properties(props)?))
    }

    /// Configuration in use
    pub fn config(&self) -> &Crc64Config {
        &self.config
    }

    /// CRC of `data` starting from the configured seed
    pub fn checksum(&self, data: &[u8]) -> u64 {
        self.crc.update(self.config.seed, data)
    }
}

impl Codec for Crc64Codec {
    fn name(&self) -> &'static str {
        codec_names::CRC64
    }

    fn is_error_correcting(&self) -> bool {
        false
    }

    fn capacity(&self) -> CodecCapacity {
        self.capacity
    }

    fn init_capacity(&mut self, encoded_size: usize) -> Result<CodecCapacity, FilmboxError> {
        self.capacity = CodecCapacity::with_trailer(self.name(), encoded_size, CRC64_SIZE)?;
        Ok(self.capacity)
    }

    fn encode(&self, mut data: BytesMut) -> Result<BytesMut, FilmboxError> {
        let crc = self.checksum(&data);
        data.put_u64(crc);
        Ok(data)
    }

    fn decode(&self, mut data: BytesMut, _erasures: &ErasureSet) -> Decoded {
        let crc = self.checksum(&data);
        // Shorter than a trailer is invalid even when the register ends at
        // zero, e.g. a zero seed over an empty or all-zero buffer.
        let valid = data.len() >= CRC64_SIZE && crc == 0;
        data.truncate(data.len().saturating_sub(CRC64_SIZE));

        Decoded {
            data,
            valid,
            stats: DecodeStats::default(),
        }
    }
}
