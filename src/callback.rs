//! Real-time audio callback: pull from the source, ingest, render.

use hopgate_core::{QueueMetrics, RateProcessor};
use std::sync::Arc;

use crate::source::PcmSource;

/// State owned by the audio callback. Only touch from the audio thread.
pub struct CallbackState {
    source: Box<dyn PcmSource>,
    processor: RateProcessor,
    /// Input block, `logical_frame_size` long
    input: Vec<f32>,
}

impl CallbackState {
    pub fn new(source: Box<dyn PcmSource>, processor: RateProcessor) -> Self {
        let block = processor.config().logical_frame_size;
        Self {
            source,
            processor,
            input: vec![0.0; block],
        }
    }

    /// Render an interleaved device buffer.
    ///
    /// Pulls one source sample per output frame, in `logical_frame_size`
    /// pieces, and ingests all of it before rendering, so the buffer's own
    /// input is visible to its drain. The whole buffer is then rendered as a
    /// single call with a single speed read.
    #[inline]
    pub fn process_interleaved(&mut self, out: &mut [f32], channels: usize) {
        if channels == 0 {
            return;
        }

        let mut remaining = out.len() / channels;
        let block = self.input.len();
        while remaining > 0 {
            let want = remaining.min(block);
            let read = self.source.read(&mut self.input[..want]);
            if read == 0 {
                break;
            }
            self.processor.push(&self.input[..read]);
            remaining -= read;
        }

        self.processor.render_interleaved(out, channels);
    }

    pub fn processor(&self) -> &RateProcessor {
        &self.processor
    }

    pub fn processor_mut(&mut self) -> &mut RateProcessor {
        &mut self.processor
    }

    pub fn metrics(&self) -> Arc<QueueMetrics> {
        self.processor.metrics()
    }

    pub fn source_finished(&self) -> bool {
        self.source.is_finished()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySource;

    fn state(samples: Vec<f32>) -> CallbackState {
        CallbackState::new(
            Box::new(MemorySource::new(samples)),
            RateProcessor::default(),
        )
    }

    #[test]
    fn test_unit_speed_passes_through() {
        let input: Vec<f32> = (1..=256).map(|i| i as f32).collect();
        let mut state = state(input.clone());

        let mut out = vec![0.0; 256 * 2];
        state.process_interleaved(&mut out, 2);

        let left: Vec<f32> = out.iter().step_by(2).copied().collect();
        let right: Vec<f32> = out.iter().skip(1).step_by(2).copied().collect();
        assert_eq!(left, input);
        assert_eq!(right, left);
        assert_eq!(state.processor().queued(), 0);
    }

    #[test]
    fn test_double_speed_waits_for_backlog() {
        let mut state = state(vec![0.5; 1024]);
        state.processor().handle().set_speed(2.0).unwrap();

        // Threshold 256: the first block only queues, the second drains.
        let mut out = vec![9.0; 128];
        state.process_interleaved(&mut out, 1);
        assert!(out.iter().all(|&s| s == 0.0));

        state.process_interleaved(&mut out, 1);
        assert!(out.iter().all(|&s| s == 0.5));
        assert_eq!(state.processor().queued(), 128);
    }

    #[test]
    fn test_source_end_goes_silent() {
        let mut state = state(vec![1.0; 100]);
        let mut out = vec![9.0; 128];
        state.process_interleaved(&mut out, 1);
        assert!(state.source_finished());
        assert!(out.iter().all(|&s| s == 0.0));
        assert_eq!(state.metrics().snapshot().backlog, 100);
    }

    #[test]
    fn test_large_device_buffer_is_one_block() {
        // 200 source samples into a 256-frame buffer: the gate opens once on
        // the full backlog and drains past the logical frame size.
        let input: Vec<f32> = (1..=200).map(|i| i as f32).collect();
        let mut state = state(input.clone());

        let mut out = vec![9.0; 256];
        state.process_interleaved(&mut out, 1);
        assert_eq!(&out[..200], input.as_slice());
        assert!(out[200..].iter().all(|&s| s == 0.0));

        let snapshot = state.metrics().snapshot();
        assert_eq!(snapshot.render_calls, 1);
        assert_eq!(snapshot.samples_pushed, 200);
    }

    #[test]
    fn test_zero_channels_is_noop() {
        let mut state = state(vec![1.0; 128]);
        let mut out = vec![9.0; 4];
        state.process_interleaved(&mut out, 0);
        assert_eq!(out, vec![9.0; 4]);
        assert_eq!(state.processor().queued(), 0);
    }
}
