//! Speed control for a playing stream.

use hopgate_core::SpeedHandle;
use std::sync::Arc;

use crate::Result;

/// A native playback-rate control that mirrors the processor's speed.
///
/// The host applies the same value to its media source in parallel with
/// driving the processor; the processor itself never sees mirrors.
pub trait RateMirror: Send + Sync {
    fn set_playback_rate(&self, rate: f64);
}

/// Fans a validated speed change out to the processor and every mirror.
#[derive(Clone)]
pub struct SpeedController {
    handle: SpeedHandle,
    mirrors: Vec<Arc<dyn RateMirror>>,
}

impl SpeedController {
    pub fn new(handle: SpeedHandle) -> Self {
        Self {
            handle,
            mirrors: Vec::new(),
        }
    }

    pub fn with_mirror(mut self, mirror: Arc<dyn RateMirror>) -> Self {
        self.mirrors.push(mirror);
        self
    }

    pub fn add_mirror(&mut self, mirror: Arc<dyn RateMirror>) {
        self.mirrors.push(mirror);
    }

    /// Rejects values that are not finite and greater than 0. Nothing is
    /// forwarded on rejection.
    pub fn set_speed(&self, value: f64) -> Result<()> {
        self.handle.set_speed(value)?;
        for mirror in &self.mirrors {
            mirror.set_playback_rate(value);
        }
        tracing::debug!(value, mirrors = self.mirrors.len(), "speed changed");
        Ok(())
    }

    pub fn speed(&self) -> f64 {
        self.handle.speed()
    }

    pub fn handle(&self) -> &SpeedHandle {
        &self.handle
    }
}
