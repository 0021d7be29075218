//! Decoded PCM sources that feed the processor.
//!
//! Decoding is out of scope: sources hand over mono `f32` samples that have
//! already been decoded elsewhere.

use hopgate_core::AtomicDouble;
use std::sync::Arc;

use crate::speed::RateMirror;

/// Supplier of mono input samples for the real-time callback.
///
/// `read` is called from the audio thread and must not block or allocate.
pub trait PcmSource: Send {
    /// Fill the front of `out` and return how many samples were written.
    /// Fewer than `out.len()` means the source ran dry for this call.
    fn read(&mut self, out: &mut [f32]) -> usize;

    fn is_finished(&self) -> bool {
        false
    }
}

impl<S: PcmSource + ?Sized> PcmSource for Box<S> {
    fn read(&mut self, out: &mut [f32]) -> usize {
        (**self).read(out)
    }

    fn is_finished(&self) -> bool {
        (**self).is_finished()
    }
}

/// Plays an in-memory buffer with a native playback-rate control.
///
/// The read position advances by the playback rate per output sample
/// (nearest sample, no interpolation). The rate is set through the
/// [`MemoryRateMirror`] returned by [`rate_mirror`](Self::rate_mirror).
pub struct MemorySource {
    samples: Arc<[f32]>,
    position: f64,
    rate: Arc<AtomicDouble>,
}

impl MemorySource {
    pub fn new(samples: impl Into<Arc<[f32]>>) -> Self {
        Self {
            samples: samples.into(),
            position: 0.0,
            rate: Arc::new(AtomicDouble::new(1.0)),
        }
    }

    /// Keep channel 0 of an interleaved buffer.
    pub fn from_interleaved(data: &[f32], channels: usize) -> Self {
        let primary: Vec<f32> = data.iter().step_by(channels.max(1)).copied().collect();
        Self::new(primary)
    }

    pub fn rate_mirror(&self) -> MemoryRateMirror {
        MemoryRateMirror {
            rate: Arc::clone(&self.rate),
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Current read position in source samples.
    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn rewind(&mut self) {
        self.position = 0.0;
    }
}

impl PcmSource for MemorySource {
    fn read(&mut self, out: &mut [f32]) -> usize {
        let rate = self.rate.get();
        let mut written = 0;

        for slot in out.iter_mut() {
            let Some(&sample) = self.samples.get(self.position as usize) else {
                break;
            };
            *slot = sample;
            self.position += rate;
            written += 1;
        }

        written
    }

    fn is_finished(&self) -> bool {
        self.position as usize >= self.samples.len()
    }
}

/// Playback-rate control of a [`MemorySource`], shareable across threads.
#[derive(Debug, Clone)]
pub struct MemoryRateMirror {
    rate: Arc<AtomicDouble>,
}

impl MemoryRateMirror {
    pub fn playback_rate(&self) -> f64 {
        self.rate.get()
    }
}

impl RateMirror for MemoryRateMirror {
    fn set_playback_rate(&self, rate: f64) {
        self.rate.set(rate);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(len: usize) -> Vec<f32> {
        (0..len).map(|i| i as f32).collect()
    }

    #[test]
    fn test_reads_in_order_until_dry() {
        let mut source = MemorySource::new(ramp(5));
        let mut out = [0.0; 4];
        assert_eq!(source.read(&mut out), 4);
        assert_eq!(out, [0.0, 1.0, 2.0, 3.0]);
        assert!(!source.is_finished());

        assert_eq!(source.read(&mut out), 1);
        assert_eq!(out[0], 4.0);
        assert!(source.is_finished());
        assert_eq!(source.read(&mut out), 0);
    }

    #[test]
    fn test_rate_mirror_steps_position() {
        let mut source = MemorySource::new(ramp(16));
        let mirror = source.rate_mirror();
        mirror.set_playback_rate(2.0);
        assert_eq!(mirror.playback_rate(), 2.0);

        let mut out = [0.0; 4];
        source.read(&mut out);
        assert_eq!(out, [0.0, 2.0, 4.0, 6.0]);
        assert_eq!(source.position(), 8.0);
    }

    #[test]
    fn test_fractional_rate_repeats_samples() {
        let mut source = MemorySource::new(ramp(4));
        source.rate_mirror().set_playback_rate(0.5);

        let mut out = [0.0; 4];
        source.read(&mut out);
        assert_eq!(out, [0.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn test_from_interleaved_keeps_channel_zero() {
        let source = MemorySource::from_interleaved(&[1.0, -1.0, 2.0, -2.0, 3.0, -3.0], 2);
        assert_eq!(source.len(), 3);

        let mut source = source;
        let mut out = [0.0; 3];
        source.read(&mut out);
        assert_eq!(out, [1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_rewind() {
        let mut source = MemorySource::new(ramp(2));
        let mut out = [0.0; 2];
        source.read(&mut out);
        assert!(source.is_finished());
        source.rewind();
        assert!(!source.is_finished());
        assert_eq!(source.position(), 0.0);
    }
}
