//! Constants shared by the codecs and the frame layout

/// Size of the CRC-64 trailer in bytes
pub const CRC64_SIZE: usize = 8;

/// Size of the CRC-32C trailer in bytes
pub const CRC32C_SIZE: usize = 4;

/// Size of a full BLAKE3 digest in bytes
pub const BLAKE3_HASH_SIZE: usize = 32;

/// ECMA-182 polynomial, the usual choice for the CRC-64 codec
pub const CRC64_ECMA_POLYNOMIAL: u64 = 0x42F0_E1EB_A9EA_3693;

/// Codec names as they appear in pipeline configuration
pub mod codec_names {
    /// CRC-64 self-verifying trailer
    pub const CRC64: &str = "crc64";
    /// CRC-32C trailer
    pub const CRC32C: &str = "crc32c";
    /// Truncated BLAKE3 trailer
    pub const HASH: &str = "hash";
    /// Reed-Solomon erasure codec
    pub const REED_SOLOMON: &str = "reed-solomon";
}

/// Property keys understood by the codecs
pub mod property_names {
    /// CRC generator polynomial (unsigned 64-bit)
    pub const POLYNOMIAL: &str = "polynomial";
    /// CRC register seed (unsigned 64-bit)
    pub const SEED: &str = "seed";
    /// Trailer length in bytes
    pub const LENGTH: &str = "length";
    /// Reed-Solomon data shard count
    pub const DATA_SHARDS: &str = "data_shards";
    /// Reed-Solomon parity shard count
    pub const PARITY_SHARDS: &str = "parity_shards";
}

/// Intensity of an unprinted (background) pixel
pub const WHITE: u8 = 255;

/// Intensity of a corner mark pixel
pub const BLACK: u8 = 0;

/// Default dark/light threshold used by the corner-mark locator
pub const DEFAULT_MARK_THRESHOLD: u8 = 96;

/// Default tolerated ratio between found and nominal corner-mark area
pub const DEFAULT_MIN_FILL: f32 = 0.6;

/// Default largest corner-mark fit residual, in pixels
pub const DEFAULT_MAX_RESIDUAL: f32 = 2.0;

/// Size in bytes of the payload length header carried in the metadata region
pub const METADATA_HEADER_SIZE: usize = 4;

/// Size in bytes of the payload length prefix encoded with the content
pub const LENGTH_PREFIX_SIZE: usize = 4;
