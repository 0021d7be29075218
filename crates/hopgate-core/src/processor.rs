//! The render path: ingest, gated drain, and channel fan-out.

use std::sync::Arc;

use crate::config::ProcessorConfig;
use crate::control::SpeedHandle;
use crate::drain::{hop_threshold, DrainOutcome, Gate};
use crate::lockfree::AtomicDouble;
use crate::metrics::QueueMetrics;
use crate::queue::SampleQueue;
use crate::Result;

/// Real-time rate-adaptive buffer processor.
///
/// Call [`process`](Self::process) (or [`push`](Self::push) followed by a
/// render method) once per host block. The speed factor is read once per
/// render call, so a concurrent [`SpeedHandle`] update never splits a block
/// between two speeds.
///
/// # RT Safety
/// `push`, `ingest`, `render_into`, `render_interleaved` and `process` do not
/// allocate, lock, log, or block. Storage is sized at construction.
pub struct RateProcessor {
    config: ProcessorConfig,
    queue: SampleQueue,
    speed: Arc<AtomicDouble>,
    metrics: Arc<QueueMetrics>,
    /// Mono block for interleaved rendering, `logical_frame_size` long
    scratch: Vec<f32>,
}

impl RateProcessor {
    pub fn new(config: ProcessorConfig) -> Result<Self> {
        config.validate()?;
        tracing::debug!(
            logical_frame_size = config.logical_frame_size,
            queue_capacity = config.queue_capacity,
            overflow = ?config.overflow,
            gate = ?config.gate,
            "creating rate processor"
        );
        Ok(Self::from_valid(config))
    }

    fn from_valid(config: ProcessorConfig) -> Self {
        Self {
            queue: SampleQueue::new(config.queue_capacity, config.overflow),
            speed: Arc::new(AtomicDouble::new(config.initial_speed)),
            metrics: Arc::new(QueueMetrics::new()),
            scratch: vec![0.0; config.logical_frame_size],
            config,
        }
    }

    /// Append samples for the primary input channel.
    #[inline]
    pub fn push(&mut self, samples: &[f32]) {
        if samples.is_empty() {
            return;
        }
        let outcome = self.queue.push(samples);
        self.metrics.record_push(outcome, self.queue.len());
    }

    /// Ingest a multi-channel input block. Only channel 0 is queued.
    #[inline]
    pub fn ingest(&mut self, inputs: &[&[f32]]) {
        if let Some(primary) = inputs.first() {
            self.push(primary);
        }
    }

    /// Render one block into planar outputs.
    ///
    /// The block length is the length of channel 0. Every other channel gets
    /// the same content; positions past channel 0's length are silence. With
    /// no output channels nothing is drained.
    #[inline]
    pub fn render_into(&mut self, outputs: &mut [&mut [f32]]) {
        let Some((primary, rest)) = outputs.split_first_mut() else {
            return;
        };

        let gate = self.latch_gate();
        let outcome = gate.drain(&mut self.queue, primary);
        self.record(outcome);

        for channel in rest.iter_mut() {
            let shared = channel.len().min(primary.len());
            channel[..shared].copy_from_slice(&primary[..shared]);
            channel[shared..].fill(0.0);
        }
    }

    /// Render into an interleaved buffer, writing each value to every channel.
    ///
    /// One call is one block: the speed is read and the gate latched once, so
    /// the output matches [`render_into`](Self::render_into) for the same frame
    /// count. The mono scratch is reused in `logical_frame_size` pieces. A
    /// trailing partial frame is zeroed.
    #[inline]
    pub fn render_interleaved(&mut self, out: &mut [f32], channels: usize) {
        if channels == 0 {
            return;
        }

        let frames = out.len() / channels;
        let (body, tail) = out.split_at_mut(frames * channels);
        tail.fill(0.0);

        let gate = self.latch_gate();
        let block = self.scratch.len();
        let mut outcome = DrainOutcome::default();
        for chunk in body.chunks_mut(block * channels) {
            let mono = &mut self.scratch[..chunk.len() / channels];
            outcome += gate.drain(&mut self.queue, mono);

            for (frame, &value) in chunk.chunks_exact_mut(channels).zip(mono.iter()) {
                frame.fill(value);
            }
        }
        self.record(outcome);
    }

    /// One host cycle: ingest, then render. A block's own samples are visible
    /// to the same call's drain.
    #[inline]
    pub fn process(&mut self, inputs: &[&[f32]], outputs: &mut [&mut [f32]]) {
        self.ingest(inputs);
        self.render_into(outputs);
    }

    /// Allocating render for non-real-time callers.
    pub fn render(&mut self, frames: usize, channels: usize) -> Vec<Vec<f32>> {
        let mut buffers = vec![vec![0.0f32; frames]; channels];
        {
            let mut views: Vec<&mut [f32]> =
                buffers.iter_mut().map(|b| b.as_mut_slice()).collect();
            self.render_into(&mut views);
        }
        buffers
    }

    /// Threshold the next render call would use at the current speed.
    #[inline]
    pub fn hop_threshold(&self) -> usize {
        hop_threshold(self.config.logical_frame_size, self.speed.get())
    }

    /// Control handle for this processor's speed factor.
    pub fn handle(&self) -> SpeedHandle {
        SpeedHandle::new(Arc::clone(&self.speed))
    }

    pub fn metrics(&self) -> Arc<QueueMetrics> {
        Arc::clone(&self.metrics)
    }

    pub fn speed(&self) -> f64 {
        self.speed.get()
    }

    /// Samples currently queued.
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    /// Discard the backlog. Counts towards dropped samples.
    pub fn reset(&mut self) {
        let discarded = self.queue.clear();
        self.metrics.record_clear(discarded);
    }

    /// Read the speed once and fix the gate for the call about to render.
    #[inline]
    fn latch_gate(&self) -> Gate {
        Gate::latch(&self.queue, self.hop_threshold(), self.config.gate)
    }

    #[inline]
    fn record(&self, outcome: DrainOutcome) {
        self.metrics
            .record_render(outcome.popped, outcome.silent, self.queue.len());
    }
}

impl Default for RateProcessor {
    fn default() -> Self {
        Self::from_valid(ProcessorConfig::default())
    }
}
