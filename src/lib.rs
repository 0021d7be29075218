//! # Hopgate - Variable-speed PCM playback
//!
//! Plays decoded audio through a real-time rate-adaptive buffer processor.
//!
//! ## Architecture
//!
//! Hopgate is an umbrella crate around:
//! - **hopgate-core** - Sample queue, gated drain, channel fan-out, control messages
//!
//! and adds the host side: PCM sources, the audio callback state, the speed
//! controller with playback-rate mirrors, and a CPAL output engine.
//!
//! ## Quick Start
//!
//! ```ignore
//! use hopgate::prelude::*;
//!
//! let mut engine = PlaybackEngine::builder()
//!     .memory_source(MemorySource::new(decoded_mono))
//!     .build()?;
//!
//! engine.start()?;
//! engine.speed().set_speed(1.5)?;
//! ```
//!
//! ## Feature Flags
//!
//! - `output` (default) - CPAL output device support

/// Re-export of hopgate-core for direct access
pub use hopgate_core as core;

pub use hopgate_core::{
    hop_threshold, AtomicDouble, ControlMessage, ControlPort, GateMode, OverflowPolicy,
    ProcessorConfig, QueueMetrics, QueueMetricsSnapshot, RateProcessor, SpeedHandle,
};

mod error;
pub use error::{Error, Result};

mod builder;
mod callback;
mod source;
mod speed;

pub use builder::PlaybackEngineBuilder;
pub use callback::CallbackState;
pub use source::{MemoryRateMirror, MemorySource, PcmSource};
pub use speed::{RateMirror, SpeedController};

#[cfg(feature = "output")]
mod engine;

#[cfg(feature = "output")]
pub use engine::PlaybackEngine;

/// Convenience prelude for common imports
pub mod prelude {
    #[cfg(feature = "output")]
    pub use crate::PlaybackEngine;

    pub use crate::{
        CallbackState, MemorySource, PcmSource, PlaybackEngineBuilder, RateMirror,
        SpeedController,
    };

    pub use crate::core::{ControlMessage, GateMode, ProcessorConfig, RateProcessor};
}
