//! Reed-Solomon erasure codec (feature `fec-rs`)
//!
//! The container is cut into `data_shards + parity_shards` equal shards.
//! Erasure positions mark whole shards as missing; up to `parity_shards`
//! missing shards are rebuilt. Without erasures the parity is only verified.

use crate::codec::properties::{required_u64, PropertyMap};
use crate::codec::{Codec, CodecCapacity, Decoded, ErasureSet};
use crate::constants::codec_names;
use crate::constants::property_names::{DATA_SHARDS, PARITY_SHARDS};
use crate::error::FilmboxError;
use crate::stats::DecodeStats;
use bytes::{BufMut, BytesMut};
use reed_solomon_erasure::galois_8::ReedSolomon;
use serde::{Deserialize, Serialize};

#[cfg(feature = "logging")]
use tracing::{debug, warn};

/// Typed configuration of the Reed-Solomon codec
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReedSolomonConfig {
    /// Shards carrying payload
    pub data_shards: usize,
    /// Shards carrying parity
    pub parity_shards: usize,
}

impl ReedSolomonConfig {
    /// Read the required `data_shards` and `parity_shards` properties
    pub fn from_properties(props: &PropertyMap) -> Result<Self, FilmboxError> {
        Ok(Self {
            data_shards: required_u64(props, codec_names::REED_SOLOMON, DATA_SHARDS)? as usize,
            parity_shards: required_u64(props, codec_names::REED_SOLOMON, PARITY_SHARDS)?
                as usize,
        })
    }

    fn total_shards(&self) -> usize {
        self.data_shards + self.parity_shards
    }
}

/// Erasure-correcting codec over GF(2^8)
pub struct ReedSolomonCodec {
    config: ReedSolomonConfig,
    rs: ReedSolomon,
    capacity: CodecCapacity,
    shard_len: usize,
}

impl core::fmt::Debug for ReedSolomonCodec {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ReedSolomonCodec")
            .field("config", &self.config)
            .field("capacity", &self.capacity)
            .field("shard_len", &self.shard_len)
            .finish()
    }
}

impl ReedSolomonCodec {
    /// Build from a typed configuration
    pub fn new(config: ReedSolomonConfig) -> Result<Self, FilmboxError> {
        let rs = ReedSolomon::new(config.data_shards, config.parity_shards).map_err(|e| {
            FilmboxError::InvalidProperty {
                property: format!("{}/{}", DATA_SHARDS, PARITY_SHARDS),
                reason: format!("{:?}", e),
            }
        })?;
        let total = config.total_shards();
        Ok(Self {
            config,
            rs,
            capacity: CodecCapacity {
                encoded_block_size: total,
                encoded_data_size: total,
                decoded_block_size: config.data_shards,
                decoded_data_size: config.data_shards,
            },
            shard_len: 1,
        })
    }

    /// Build from a property map
    pub fn from_properties(props: &PropertyMap) -> Result<Self, FilmboxError> {
        Self::new(ReedSolomonConfig::from_properties(props)?)
    }

    /// Bytes per shard after negotiation
    pub fn shard_len(&self) -> usize {
        self.shard_len
    }

    fn split(&self, data: &[u8]) -> Vec<Vec<u8>> {
        data.chunks(self.shard_len).map(|c| c.to_vec()).collect()
    }

    fn invalid(&self, mut data: BytesMut, stats: DecodeStats) -> Decoded {
        data.truncate(self.capacity.decoded_data_size);
        Decoded {
            data,
            valid: false,
            stats,
        }
    }
}

impl Codec for ReedSolomonCodec {
    fn name(&self) -> &'static str {
        codec_names::REED_SOLOMON
    }

    fn is_error_correcting(&self) -> bool {
        true
    }

    fn capacity(&self) -> CodecCapacity {
        self.capacity
    }

    fn init_capacity(&mut self, encoded_size: usize) -> Result<CodecCapacity, FilmboxError> {
        let total = self.config.total_shards();
        let shard_len = encoded_size / total;
        if shard_len == 0 {
            return Err(FilmboxError::CapacityTooSmall {
                codec: self.name().to_string(),
                requested: encoded_size,
                minimum: total,
            });
        }
        self.shard_len = shard_len;
        self.capacity = CodecCapacity {
            encoded_block_size: encoded_size,
            encoded_data_size: shard_len * total,
            decoded_block_size: shard_len * self.config.data_shards,
            decoded_data_size: shard_len * self.config.data_shards,
        };
        #[cfg(feature = "logging")]
        debug!(
            "Reed-Solomon {}+{} over {} bytes: shard {} bytes",
            self.config.data_shards, self.config.parity_shards, encoded_size, shard_len
        );
        Ok(self.capacity)
    }

    fn encode(&self, data: BytesMut) -> Result<BytesMut, FilmboxError> {
        if data.len() != self.capacity.decoded_data_size {
            return Err(FilmboxError::PayloadSizeMismatch {
                expected: self.capacity.decoded_data_size,
                actual: data.len(),
            });
        }

        let mut shards = self.split(&data);
        shards.resize(self.config.total_shards(), vec![0u8; self.shard_len]);
        self.rs
            .encode(&mut shards)
            .map_err(|e| FilmboxError::Serialization(format!("{:?}", e)))?;

        let mut out = BytesMut::with_capacity(self.capacity.encoded_data_size);
        for shard in &shards {
            out.put_slice(shard);
        }
        Ok(out)
    }

    fn decode(&self, mut data: BytesMut, erasures: &ErasureSet) -> Decoded {
        let encoded_len = self.capacity.encoded_data_size;
        let weight = self.config.parity_shards as f32;
        if data.len() < encoded_len {
            #[cfg(feature = "logging")]
            warn!(
                "Reed-Solomon input of {} bytes is shorter than {}",
                data.len(),
                encoded_len
            );
            let stats = DecodeStats {
                unresolved_errors: 1,
                fec_accumulated_weight: weight,
                ..Default::default()
            };
            return self.invalid(data, stats);
        }
        data.truncate(encoded_len);

        let mut missing: Vec<usize> = erasures
            .iter()
            .filter(|&p| p < encoded_len)
            .map(|p| p / self.shard_len)
            .collect();
        missing.dedup();

        let mut stats = DecodeStats {
            fec_accumulated_amount: missing.len() as f32,
            fec_accumulated_weight: weight,
            ..Default::default()
        };

        if missing.len() > self.config.parity_shards {
            stats.unresolved_errors = missing.len();
            return self.invalid(data, stats);
        }

        let mut shards: Vec<Option<Vec<u8>>> = self.split(&data).into_iter().map(Some).collect();
        for &index in &missing {
            shards[index] = None;
        }
        if !missing.is_empty() && self.rs.reconstruct(&mut shards).is_err() {
            stats.unresolved_errors = missing.len();
            return self.invalid(data, stats);
        }

        let shards: Vec<Vec<u8>> = shards.into_iter().flatten().collect();
        let consistent = self.rs.verify(&shards).unwrap_or(false);
        if !consistent {
            stats.unresolved_errors += 1;
            return self.invalid(data, stats);
        }
        stats.resolved_errors = missing.len();

        let mut out = BytesMut::with_capacity(self.capacity.decoded_data_size);
        for shard in shards.iter().take(self.config.data_shards) {
            out.put_slice(shard);
        }
        Decoded {
            data: out,
            valid: true,
            stats,
        }
    }
}
