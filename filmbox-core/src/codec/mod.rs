//! Codec stages
//!
//! Every stage implements [`Codec`]: it negotiates its sizes from an encoded
//! container size, grows a buffer by its overhead on encode and shrinks it by
//! the same amount on decode. Stages are chained by
//! [`CodecPipeline`](crate::pipeline::CodecPipeline).

pub mod crc32c;
pub mod crc64;
pub mod hash;
pub mod properties;
#[cfg(feature = "fec-rs")]
pub mod reed_solomon;

use crate::constants::codec_names;
use crate::error::FilmboxError;
use crate::stats::DecodeStats;
use bytes::BytesMut;

pub use properties::{properties, PropertyMap, PropertyValue};

/// Sizes fixed by capacity negotiation, all in bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CodecCapacity {
    /// Container size handed to the stage
    pub encoded_block_size: usize,
    /// Bytes the stage actually emits on encode
    pub encoded_data_size: usize,
    /// Block size seen by the next inner stage
    pub decoded_block_size: usize,
    /// Usable payload bytes after this stage's overhead
    pub decoded_data_size: usize,
}

impl CodecCapacity {
    /// Capacity of a stage with a constant trailer of `overhead` bytes
    pub fn with_trailer(
        codec: &str,
        encoded_size: usize,
        overhead: usize,
    ) -> Result<Self, FilmboxError> {
        if encoded_size < overhead {
            return Err(FilmboxError::CapacityTooSmall {
                codec: codec.to_string(),
                requested: encoded_size,
                minimum: overhead,
            });
        }
        Ok(Self {
            encoded_block_size: encoded_size,
            encoded_data_size: encoded_size,
            decoded_block_size: encoded_size - overhead,
            decoded_data_size: encoded_size - overhead,
        })
    }

    /// Bytes added on encode and removed on decode
    pub fn overhead(&self) -> usize {
        self.encoded_data_size - self.decoded_data_size
    }
}

/// Buffer positions known to be unreliable before decoding
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErasureSet {
    positions: Vec<usize>,
}

impl ErasureSet {
    /// An empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from positions in any order; duplicates are dropped
    pub fn from_positions<I: IntoIterator<Item = usize>>(positions: I) -> Self {
        let mut positions: Vec<usize> = positions.into_iter().collect();
        positions.sort_unstable();
        positions.dedup();
        Self { positions }
    }

    /// Flag one more position
    pub fn insert(&mut self, position: usize) {
        if let Err(at) = self.positions.binary_search(&position) {
            self.positions.insert(at, position);
        }
    }

    /// Whether `position` is flagged
    pub fn contains(&self, position: usize) -> bool {
        self.positions.binary_search(&position).is_ok()
    }

    /// Flagged positions in ascending order
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.positions.iter().copied()
    }

    /// Number of flagged positions
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Whether nothing is flagged
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// Result of a single decode
///
/// `data` is always shrunk by the stage overhead. When `valid` is false its
/// contents must not be trusted.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded {
    /// Decoded buffer
    pub data: BytesMut,
    /// Whether validation (or correction) succeeded
    pub valid: bool,
    /// Quality metrics of this decode
    pub stats: DecodeStats,
}

/// A transform stage of the codec pipeline
pub trait Codec: Send {
    /// Identifying name
    fn name(&self) -> &'static str;

    /// Whether the stage can repair data, not just detect damage
    fn is_error_correcting(&self) -> bool;

    /// Sizes from the most recent negotiation
    fn capacity(&self) -> CodecCapacity;

    /// Negotiate sizes for a container of `encoded_size` bytes
    ///
    /// Fails when the container cannot hold the stage's overhead.
    fn init_capacity(&mut self, encoded_size: usize) -> Result<CodecCapacity, FilmboxError>;

    /// Add this stage's redundancy to `data`
    fn encode(&self, data: BytesMut) -> Result<BytesMut, FilmboxError>;

    /// Validate and/or repair `data`, removing this stage's redundancy
    fn decode(&self, data: BytesMut, erasures: &ErasureSet) -> Decoded;

    /// Adjust a runtime parameter; stages without any accept and ignore it
    fn set_property(&mut self, _name: &str, _value: &PropertyValue) -> Result<(), FilmboxError> {
        Ok(())
    }
}

/// Construct a codec by name from its properties
pub fn create(name: &str, props: &PropertyMap) -> Result<Box<dyn Codec>, FilmboxError> {
    match name {
        codec_names::CRC64 => Ok(Box::new(crc64::Crc64Codec::from_properties(props)?)),
        codec_names::CRC32C => Ok(Box::new(crc32c::Crc32cCodec::from_properties(props)?)),
        codec_names::HASH => Ok(Box::new(hash::HashCodec::from_properties(props)?)),
        #[cfg(feature = "fec-rs")]
        codec_names::REED_SOLOMON => Ok(Box::new(
            reed_solomon::ReedSolomonCodec::from_properties(props)?,
        )),
        other => {
            #[cfg(feature = "logging")]
            tracing::error!("Unknown codec '{}'", other);
            Err(FilmboxError::UnknownCodec(other.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::property_names::{POLYNOMIAL, SEED};

    #[test]
    fn test_trailer_capacity() {
        let cap = CodecCapacity::with_trailer("crc64", 100, 8).unwrap();
        assert_eq!(cap.decoded_data_size, 92);
        assert_eq!(cap.overhead(), 8);
        assert!(CodecCapacity::with_trailer("crc64", 7, 8).is_err());
        assert_eq!(CodecCapacity::with_trailer("crc64", 8, 8).unwrap().decoded_data_size, 0);
    }

    #[test]
    fn test_erasure_set_is_sorted_and_unique() {
        let mut set = ErasureSet::from_positions([9, 3, 3, 7]);
        set.insert(5);
        set.insert(7);
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![3, 5, 7, 9]);
        assert!(set.contains(5));
        assert!(!set.contains(4));
        assert_eq!(set.len(), 4);
    }

    #[test]
    fn test_factory() {
        let props = properties([(POLYNOMIAL, 0x1Bu64), (SEED, 0)]);
        let codec = create("crc64", &props).unwrap();
        assert_eq!(codec.name(), "crc64");
        assert!(!codec.is_error_correcting());

        assert!(matches!(
            create("turbo", &props),
            Err(FilmboxError::UnknownCodec(_))
        ));
    }
}
