//! Real-time rate-adaptive PCM buffer processor.
//!
//! A host pushes decoded mono PCM into a [`RateProcessor`] and asks it for a
//! fixed-size output block once per audio callback. Output is produced only
//! once the queued backlog reaches a hop threshold derived from the current
//! speed factor; otherwise the block is silence. Every output channel gets the
//! same content.
//!
//! # Primary API
//!
//! - [`RateProcessor`]: ingest and render (audio thread)
//! - [`SpeedHandle`] / [`ControlPort`]: speed updates (control threads)
//! - [`ProcessorConfig`]: frame size, queue bound, overflow and gate policy
//! - [`QueueMetrics`]: backlog, drops, underruns
//!
//! # Example
//!
//! ```
//! use hopgate_core::{ProcessorConfig, RateProcessor};
//!
//! let mut processor = RateProcessor::new(ProcessorConfig::default())?;
//! let speed = processor.handle();
//!
//! processor.push(&[0.25; 300]);
//! speed.set_speed(2.0)?;
//!
//! let block = processor.render(128, 2);
//! assert_eq!(block[0], block[1]);
//! assert_eq!(processor.queued(), 172);
//! # Ok::<(), hopgate_core::Error>(())
//! ```

pub mod error;
pub use error::{Error, Result};

pub mod config;
pub use config::{GateMode, OverflowPolicy, ProcessorConfig};

pub mod control;
pub use control::{validate_speed, ControlMessage, ControlPort, SpeedHandle};

pub mod drain;
pub use drain::{hop_threshold, DrainOutcome, Gate};

pub(crate) mod lockfree;
pub use lockfree::AtomicDouble;

pub mod metrics;
pub use metrics::{QueueMetrics, QueueMetricsSnapshot};

mod processor;
pub use processor::RateProcessor;

pub mod queue;
pub use queue::{PushOutcome, SampleQueue};
