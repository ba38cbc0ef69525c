//! Error types for filmbox operations


/// Errors that can occur while tracking frames or running codecs
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FilmboxError {
    /// A codec was constructed without one of its required properties
    #[error("Codec '{codec}' requires property '{property}' to be set")]
    MissingProperty {
        /// Name of the codec being constructed.
        codec: &'static str,
        /// Name of the missing property.
        property: &'static str,
    },

    /// A property was present but held an unusable value
    #[error("Invalid value for property '{property}': {reason}")]
    InvalidProperty {
        /// Name of the offending property.
        property: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// No codec is registered under the requested name
    #[error("Unknown codec: {0}")]
    UnknownCodec(String),

    /// The requested container cannot hold a stage's fixed overhead
    #[error("Codec '{codec}' cannot fit in {requested} bytes (needs at least {minimum})")]
    CapacityTooSmall {
        /// Name of the stage that rejected the size.
        codec: String,
        /// The encoded size that was requested.
        requested: usize,
        /// Smallest encoded size the stage accepts.
        minimum: usize,
    },

    /// Encode was attempted before capacity negotiation
    #[error("Capacity has not been negotiated")]
    CapacityNotInitialized,

    /// A buffer did not have the size a stage expects
    #[error("Payload size mismatch: expected {expected} bytes, got {actual}")]
    PayloadSizeMismatch {
        /// The number of bytes expected.
        expected: usize,
        /// The number of bytes actually supplied.
        actual: usize,
    },

    /// The frame descriptor violates its layout invariants
    #[error("Malformed frame descriptor: {0}")]
    MalformedFrame(String),

    /// Corner marks could not be located with sufficient confidence
    #[error("Alignment failed: {0}")]
    AlignmentFailed(String),

    /// A sampler was asked to read outside the image
    #[error("Sample at ({x:.1}, {y:.1}) lies outside the {width}x{height} image")]
    SamplingOutOfBounds {
        /// Horizontal image coordinate of the sample.
        x: f32,
        /// Vertical image coordinate of the sample.
        y: f32,
        /// Image width in pixels.
        width: usize,
        /// Image height in pixels.
        height: usize,
    },

    /// The tracker hit a fatal sampling error earlier in this session
    #[error("Tracker session is faulted by an earlier geometry mismatch")]
    TrackerFaulted,

    /// Pixel buffer dimensions are inconsistent with its data
    #[error("Invalid image buffer: {0}")]
    InvalidImage(String),

    /// IO error during read/write
    #[error("IO error: {0}")]
    Io(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl FilmboxError {
    /// Whether the caller may retry with the next captured frame.
    ///
    /// Alignment failures are per-frame. Everything else either aborts
    /// construction or points at a configuration defect.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, FilmboxError::AlignmentFailed(_))
    }
}

impl From<std::io::Error> for FilmboxError {
    fn from(err: std::io::Error) -> Self {
        FilmboxError::Io(err.to_string())
    }
}
