//! Builder for the callback state and, with `output`, the playback engine.

use hopgate_core::{ProcessorConfig, RateProcessor};
use std::sync::Arc;

use crate::callback::CallbackState;
use crate::source::{MemorySource, PcmSource};
use crate::speed::{RateMirror, SpeedController};
use crate::{Error, Result};

#[cfg(feature = "output")]
use crate::engine::PlaybackEngine;

/// Assembles a source, a processor, and a speed controller.
///
/// A [`MemorySource`] registers its playback-rate control as a mirror, so
/// speed changes reach both the source and the processor.
///
/// # Example
///
/// ```
/// use hopgate::prelude::*;
///
/// let (mut state, speed) = PlaybackEngineBuilder::default()
///     .memory_source(MemorySource::new(vec![0.5f32; 4096]))
///     .build_callback()?;
///
/// speed.set_speed(1.25)?;
/// let mut out = vec![0.0f32; 256];
/// state.process_interleaved(&mut out, 2);
/// # Ok::<(), hopgate::Error>(())
/// ```
#[derive(Default)]
pub struct PlaybackEngineBuilder {
    output_device: Option<usize>,
    config: ProcessorConfig,
    source: Option<Box<dyn PcmSource>>,
    mirrors: Vec<Arc<dyn RateMirror>>,
}

impl PlaybackEngineBuilder {
    pub fn output_device(mut self, index: usize) -> Self {
        self.output_device = Some(index);
        self
    }

    /// Default: [`ProcessorConfig::default`]
    pub fn config(mut self, config: ProcessorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn source(mut self, source: impl PcmSource + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn memory_source(mut self, source: MemorySource) -> Self {
        self.mirrors.push(Arc::new(source.rate_mirror()));
        self.source = Some(Box::new(source));
        self
    }

    pub fn mirror(mut self, mirror: Arc<dyn RateMirror>) -> Self {
        self.mirrors.push(mirror);
        self
    }

    /// Build the device-independent pieces: the callback state and its speed
    /// controller. The initial speed is applied to every mirror.
    pub fn build_callback(self) -> Result<(CallbackState, SpeedController)> {
        let source = self
            .source
            .ok_or_else(|| Error::InvalidConfig("no source configured".into()))?;
        let processor = RateProcessor::new(self.config)?;

        let initial_speed = processor.speed();
        let mut speed = SpeedController::new(processor.handle());
        for mirror in self.mirrors {
            mirror.set_playback_rate(initial_speed);
            speed.add_mirror(mirror);
        }

        Ok((CallbackState::new(source, processor), speed))
    }

    #[cfg(feature = "output")]
    pub fn build(self) -> Result<PlaybackEngine> {
        let device = self.output_device;
        let (state, speed) = self.build_callback()?;
        PlaybackEngine::new(device, state, speed)
    }
}
