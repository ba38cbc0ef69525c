//! Codec pipeline: an ordered chain of codec stages
//!
//! `stages[0]` is the outermost stage, the one closest to the medium. Capacity
//! is negotiated outside-in: each stage's decoded data size becomes the
//! encoded size requested from the next. Encode runs innermost first, decode
//! outermost first.

use crate::codec::{self, Codec, CodecCapacity, ErasureSet, PropertyMap};
use crate::error::FilmboxError;
use crate::stats::DecodeStats;
use bytes::BytesMut;
use serde::{Deserialize, Serialize};

#[cfg(feature = "logging")]
use tracing::{debug, warn};

/// One stage of a [`PipelineConfig`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageConfig {
    /// Codec name understood by [`codec::create`]
    pub codec: String,
    /// Properties handed to the codec constructor
    #[serde(default)]
    pub properties: PropertyMap,
}

/// Serializable description of a pipeline, outermost stage first
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Stages from the medium inwards
    pub stages: Vec<StageConfig>,
}

/// Result of capacity negotiation across the whole chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineCapacity {
    /// Container size requested from the outermost stage
    pub encoded_size: usize,
    /// Bytes the outermost stage emits on encode
    pub encoded_data_size: usize,
    /// Usable payload bytes left after every stage
    pub decoded_data_size: usize,
    /// Negotiated sizes of each stage, outermost first
    pub stages: Vec<CodecCapacity>,
}

impl PipelineCapacity {
    /// Bytes consumed by all stages together
    pub fn total_overhead(&self) -> usize {
        self.encoded_size - self.decoded_data_size
    }
}

/// Result of a pipeline decode
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineDecode {
    /// Innermost decoded buffer
    pub data: BytesMut,
    /// False when any stage reported failure
    pub valid: bool,
    /// Metrics summed over every stage
    pub stats: DecodeStats,
}

/// An ordered chain of owned codec stages
pub struct CodecPipeline {
    stages: Vec<Box<dyn Codec>>,
    capacity: Option<PipelineCapacity>,
}

impl core::fmt::Debug for CodecPipeline {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CodecPipeline")
            .field("stages", &self.stage_names())
            .field("capacity", &self.capacity)
            .finish()
    }
}

impl CodecPipeline {
    /// Build from already constructed stages, outermost first
    pub fn new(stages: Vec<Box<dyn Codec>>) -> Self {
        Self {
            stages,
            capacity: None,
        }
    }

    /// Construct every stage of `config`
    ///
    /// Aborts on the first stage that fails; stages built so far are dropped.
    pub fn from_config(config: &PipelineConfig) -> Result<Self, FilmboxError> {
        let stages = config
            .stages
            .iter()
            .map(|stage| codec::create(&stage.codec, &stage.properties))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(stages))
    }

    /// Number of stages
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Whether the pipeline has no stages
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Stage names, outermost first
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Negotiated capacity, if [`init_capacity`](Self::init_capacity) succeeded
    pub fn capacity(&self) -> Option<&PipelineCapacity> {
        self.capacity.as_ref()
    }

    /// Negotiate sizes for an outer container of `encoded_size` bytes
    ///
    /// On failure the previous negotiation is discarded.
    pub fn init_capacity(&mut self, encoded_size: usize) -> Result<&PipelineCapacity, FilmboxError> {
        self.capacity = None;
        let mut requested = encoded_size;
        let mut sizes = Vec::with_capacity(self.stages.len());

        for stage in self.stages.iter_mut() {
            let cap = stage.init_capacity(requested).map_err(|e| {
                #[cfg(feature = "logging")]
                warn!("Stage '{}' rejected {} bytes: {}", stage.name(), requested, e);
                e
            })?;
            #[cfg(feature = "logging")]
            debug!(
                "Stage '{}': encoded {}/{} -> decoded {}",
                stage.name(),
                cap.encoded_data_size,
                cap.encoded_block_size,
                cap.decoded_data_size
            );
            requested = cap.decoded_data_size;
            sizes.push(cap);
        }

        let capacity = PipelineCapacity {
            encoded_size,
            encoded_data_size: sizes.first().map_or(encoded_size, |c| c.encoded_data_size),
            decoded_data_size: requested,
            stages: sizes,
        };
        Ok(&*self.capacity.insert(capacity))
    }

    /// Encode `payload` through every stage, innermost first
    ///
    /// Requires negotiated capacity. The payload may be shorter than the
    /// usable size only when no stage is error-correcting; correcting stages
    /// need whole shards.
    pub fn encode(&self, payload: BytesMut) -> Result<BytesMut, FilmboxError> {
        let capacity = self
            .capacity
            .as_ref()
            .ok_or(FilmboxError::CapacityNotInitialized)?;
        let exact = self.stages.iter().any(|s| s.is_error_correcting());
        let fits = if exact {
            payload.len() == capacity.decoded_data_size
        } else {
            payload.len() <= capacity.decoded_data_size
        };
        if !fits {
            return Err(FilmboxError::PayloadSizeMismatch {
                expected: capacity.decoded_data_size,
                actual: payload.len(),
            });
        }

        self.stages
            .iter()
            .rev()
            .try_fold(payload, |data, stage| stage.encode(data))
    }

    /// Decode `data` through every stage, outermost first
    ///
    /// Every stage runs even after a failure so buffer sizes stay consistent.
    /// Erasures refer to positions of the outer buffer and are only handed to
    /// the outermost stage.
    pub fn decode(&self, data: BytesMut, erasures: &ErasureSet) -> PipelineDecode {
        let none = ErasureSet::new();
        let mut result = PipelineDecode {
            data,
            valid: true,
            stats: DecodeStats::default(),
        };

        for (i, stage) in self.stages.iter().enumerate() {
            let stage_erasures = if i == 0 { erasures } else { &none };
            let decoded = stage.decode(result.data, stage_erasures);
            if !decoded.valid {
                #[cfg(feature = "logging")]
                debug!("Stage '{}' failed validation", stage.name());
                result.valid = false;
            }
            result.stats += decoded.stats;
            result.data = decoded.data;
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::properties;
    use crate::constants::property_names::{LENGTH, POLYNOMIAL, SEED};
    use crate::constants::CRC64_ECMA_POLYNOMIAL;

    fn crc64_stage(seed: u64) -> StageConfig {
        StageConfig {
            codec: "crc64".into(),
            properties: properties([(POLYNOMIAL, CRC64_ECMA_POLYNOMIAL), (SEED, seed)]),
        }
    }

    fn two_stage() -> CodecPipeline {
        CodecPipeline::from_config(&PipelineConfig {
            stages: vec![
                crc64_stage(1),
                StageConfig {
                    codec: "hash".into(),
                    properties: properties([(LENGTH, 16u64)]),
                },
            ],
        })
        .unwrap()
    }

    #[test]
    fn test_negotiation_subtracts_each_stage() {
        let mut p = two_stage();
        let cap = p.init_capacity(100).unwrap();
        assert_eq!(cap.decoded_data_size, 76);
        assert_eq!(cap.total_overhead(), 24);
        assert_eq!(cap.stages[0].decoded_data_size, 92);
        assert_eq!(cap.stages[1].encoded_block_size, 92);

        assert!(p.init_capacity(23).is_err());
        assert!(p.capacity().is_none());
        assert_eq!(p.init_capacity(24).unwrap().decoded_data_size, 0);
    }

    #[test]
    fn test_round_trip() {
        let mut p = two_stage();
        p.init_capacity(64).unwrap();
        let encoded = p.encode(BytesMut::from(&b"hello"[..])).unwrap();
        assert_eq!(encoded.len(), 5 + 24);

        let decoded = p.decode(encoded, &ErasureSet::new());
        assert!(decoded.valid);
        assert_eq!(&decoded.data[..], b"hello");
        assert!(decoded.stats.is_clean());
    }

    #[test]
    fn test_failure_still_runs_every_stage() {
        let mut p = two_stage();
        p.init_capacity(64).unwrap();
        let mut encoded = p.encode(BytesMut::from(&b"hello"[..])).unwrap();
        encoded[0] ^= 0x80;

        let decoded = p.decode(encoded, &ErasureSet::new());
        assert!(!decoded.valid);
        assert_eq!(decoded.data.len(), 5);
    }

    #[test]
    fn test_encode_needs_capacity() {
        let p = two_stage();
        assert_eq!(
            p.encode(BytesMut::from(&b"x"[..])).unwrap_err(),
            FilmboxError::CapacityNotInitialized
        );
    }

    #[test]
    fn test_oversized_payload_rejected() {
        let mut p = two_stage();
        p.init_capacity(30).unwrap();
        assert!(matches!(
            p.encode(BytesMut::from(&[0u8; 7][..])),
            Err(FilmboxError::PayloadSizeMismatch {
                expected: 6,
                actual: 7
            })
        ));
    }

    #[test]
    fn test_construction_aborts_on_bad_stage() {
        let config = PipelineConfig {
            stages: vec![
                crc64_stage(0),
                StageConfig {
                    codec: "crc64".into(),
                    properties: properties([(SEED, 0u64)]),
                },
            ],
        };
        assert!(matches!(
            CodecPipeline::from_config(&config),
            Err(FilmboxError::MissingProperty {
                property: "polynomial",
                ..
            })
        ));
    }

    #[test]
    fn test_config_from_json() {
        let config: PipelineConfig = serde_json::from_str(
            r#"{"stages": [{"codec": "crc64", "properties": {"polynomial": "0x42F0E1EBA9EA3693", "seed": 0}},
                           {"codec": "crc32c"}]}"#,
        )
        .unwrap();
        let mut p = CodecPipeline::from_config(&config).unwrap();
        assert_eq!(p.stage_names(), vec!["crc64", "crc32c"]);
        assert_eq!(p.init_capacity(20).unwrap().decoded_data_size, 8);
    }

    #[test]
    fn test_empty_pipeline_is_identity() {
        let mut p = CodecPipeline::new(Vec::new());
        assert!(p.is_empty());
        assert_eq!(p.init_capacity(10).unwrap().decoded_data_size, 10);
        let encoded = p.encode(BytesMut::from(&b"abc"[..])).unwrap();
        let decoded = p.decode(encoded, &ErasureSet::new());
        assert!(decoded.valid);
        assert_eq!(&decoded.data[..], b"abc");
    }

    #[cfg(feature = "fec-rs")]
    #[test]
    fn test_erasures_reach_outer_fec_stage() {
        use crate::constants::property_names::{DATA_SHARDS, PARITY_SHARDS};

        let mut p = CodecPipeline::from_config(&PipelineConfig {
            stages: vec![
                StageConfig {
                    codec: "reed-solomon".into(),
                    properties: properties([(DATA_SHARDS, 4u64), (PARITY_SHARDS, 2u64)]),
                },
                crc64_stage(0),
            ],
        })
        .unwrap();
        let cap = p.init_capacity(60).unwrap().clone();
        assert_eq!(cap.decoded_data_size, 32);

        let payload: Vec<u8> = (0..32u8).collect();
        let mut encoded = p.encode(BytesMut::from(&payload[..])).unwrap();
        assert_eq!(encoded.len(), 60);
        encoded[5] = !encoded[5];

        let decoded = p.decode(encoded, &ErasureSet::from_positions([5]));
        assert!(decoded.valid);
        assert_eq!(&decoded.data[..], &payload[..]);
        assert_eq!(decoded.stats.resolved_errors, 1);
    }
}
