//! Processor configuration.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// What the queue does when ingest would exceed its capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Discard the oldest queued samples so the incoming block always fits.
    #[default]
    DropOldest,
    /// Keep the backlog, discard the part of the incoming block that does not fit.
    DropNewest,
}

/// When the hop threshold is compared against the queue length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateMode {
    /// Once per render call, against the backlog at the start of the call.
    #[default]
    Block,
    /// Before every output position, against the current backlog.
    Sample,
}

/// Configuration for a [`RateProcessor`](crate::RateProcessor).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessorConfig {
    /// Frame size the hop threshold is derived from. Independent of the
    /// output length requested per render call.
    pub logical_frame_size: usize,
    pub initial_speed: f64,
    /// Maximum number of queued samples. Allocated up front.
    pub queue_capacity: usize,
    pub overflow: OverflowPolicy,
    pub gate: GateMode,
}

impl ProcessorConfig {
    pub const DEFAULT_LOGICAL_FRAME_SIZE: usize = 128;
    /// ~5.9 seconds of mono audio at 44.1 kHz.
    pub const DEFAULT_QUEUE_CAPACITY: usize = 1 << 18;

    pub fn with_logical_frame_size(mut self, frames: usize) -> Self {
        self.logical_frame_size = frames;
        self
    }

    pub fn with_initial_speed(mut self, speed: f64) -> Self {
        self.initial_speed = speed;
        self
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    pub fn with_overflow(mut self, policy: OverflowPolicy) -> Self {
        self.overflow = policy;
        self
    }

    pub fn with_gate(mut self, mode: GateMode) -> Self {
        self.gate = mode;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.logical_frame_size == 0 {
            return Err(Error::InvalidConfig(
                "logical_frame_size must be greater than 0".into(),
            ));
        }
        if self.queue_capacity == 0 {
            return Err(Error::InvalidConfig(
                "queue_capacity must be greater than 0".into(),
            ));
        }
        if self.queue_capacity < self.logical_frame_size {
            return Err(Error::InvalidConfig(format!(
                "queue_capacity {} is smaller than logical_frame_size {}",
                self.queue_capacity, self.logical_frame_size
            )));
        }
        if !self.initial_speed.is_finite() || self.initial_speed <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "initial_speed {} must be finite and greater than 0",
                self.initial_speed
            )));
        }
        Ok(())
    }
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            logical_frame_size: Self::DEFAULT_LOGICAL_FRAME_SIZE,
            initial_speed: 1.0,
            queue_capacity: Self::DEFAULT_QUEUE_CAPACITY,
            overflow: OverflowPolicy::default(),
            gate: GateMode::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ProcessorConfig::default();
        assert_eq!(config.logical_frame_size, 128);
        assert_eq!(config.initial_speed, 1.0);
        assert_eq!(config.overflow, OverflowPolicy::DropOldest);
        assert_eq!(config.gate, GateMode::Block);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_zero_frame_size() {
        let config = ProcessorConfig::default().with_logical_frame_size(0);
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_capacity_below_frame_size() {
        let config = ProcessorConfig::default()
            .with_logical_frame_size(256)
            .with_queue_capacity(128);
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_bad_initial_speed() {
        for speed in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let config = ProcessorConfig::default().with_initial_speed(speed);
            assert!(config.validate().is_err(), "speed {speed} accepted");
        }
    }

    #[test]
    fn test_deserialize_partial() {
        let config: ProcessorConfig =
            serde_json::from_str(r#"{"logical_frame_size":256,"gate":"sample"}"#).unwrap();
        assert_eq!(config.logical_frame_size, 256);
        assert_eq!(config.gate, GateMode::Sample);
        assert_eq!(config.queue_capacity, ProcessorConfig::DEFAULT_QUEUE_CAPACITY);
        assert_eq!(config.overflow, OverflowPolicy::DropOldest);
    }
}
