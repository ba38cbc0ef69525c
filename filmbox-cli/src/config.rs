//! JSON format configuration shared by all subcommands

use anyhow::{Context, Result};
use filmbox_core::{CodecPipeline, FrameDescriptor, PipelineConfig, TrackingMode};
use serde::{Deserialize, Serialize};
use std::fs;

/// Frame layout, either generated from a few numbers or spelled out in full
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FrameLayout {
    /// [`FrameDescriptor::default_layout`] parameters
    Layout {
        /// Cell size in pixels
        cell: usize,
        /// Content columns
        columns: usize,
        /// Content rows
        rows: usize,
        /// Bits per content symbol
        bits_per_symbol: u8,
    },
    /// Complete descriptor
    Explicit(FrameDescriptor),
}

impl FrameLayout {
    /// Resolve to a concrete descriptor
    pub fn descriptor(&self) -> FrameDescriptor {
        match self {
            FrameLayout::Layout {
                cell,
                columns,
                rows,
                bits_per_symbol,
            } => FrameDescriptor::default_layout(*cell, *columns, *rows, *bits_per_symbol),
            FrameLayout::Explicit(frame) => frame.clone(),
        }
    }
}

/// Everything needed to box or unbox a frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormatConfig {
    /// Frame layout
    pub frame: FrameLayout,
    /// Codec stages, outermost first
    pub pipeline: PipelineConfig,
    /// Tracking mode used by `decode` unless overridden
    #[serde(default)]
    pub tracking: TrackingMode,
}

impl FormatConfig {
    /// Read and parse a JSON config file
    pub fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path))
    }

    /// Frame descriptor, validated
    pub fn frame(&self) -> Result<FrameDescriptor> {
        let frame = self.frame.descriptor();
        frame.validate().context("Frame layout is invalid")?;
        Ok(frame)
    }

    /// Freshly constructed pipeline
    pub fn pipeline(&self) -> Result<CodecPipeline> {
        CodecPipeline::from_config(&self.pipeline).context("Failed to build codec pipeline")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_shorthand() {
        let config: FormatConfig = serde_json::from_str(
            r#"{
                "frame": {"cell": 4, "columns": 24, "rows": 8, "bits_per_symbol": 2},
                "pipeline": {"stages": [{"codec": "crc32c"}]},
                "tracking": {"mode": "analog", "threshold": 80}
            }"#,
        )
        .unwrap();

        let frame = config.frame().unwrap();
        assert_eq!(frame, FrameDescriptor::default_layout(4, 24, 8, 2));
        match config.tracking {
            TrackingMode::Analog(params) => assert_eq!(params.threshold, 80),
            TrackingMode::Simulated => panic!("expected analog tracking"),
        }
    }

    #[test]
    fn test_explicit_descriptor_round_trips() {
        let config = FormatConfig {
            frame: FrameLayout::Explicit(FrameDescriptor::default_layout(3, 16, 4, 1)),
            pipeline: PipelineConfig::default(),
            tracking: TrackingMode::Simulated,
        };
        let json = serde_json::to_string(&config).unwrap();
        let back: FormatConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.frame.descriptor(), config.frame.descriptor());
        assert_eq!(back.tracking, TrackingMode::Simulated);
    }
}
