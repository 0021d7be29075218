//! Queue health counters.
//!
//! Written from the render path with relaxed atomics, read from any thread.
//!
//! Every sample counted in `samples_pushed` ends up in exactly one of
//! `samples_popped`, `samples_dropped` or the backlog. Input the overflow
//! policy refused at the door is counted in `samples_rejected` only.

use crate::queue::PushOutcome;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Counters for a processor's sample queue.
#[derive(Debug, Default)]
pub struct QueueMetrics {
    /// Samples accepted into the queue
    samples_pushed: AtomicU64,
    /// Samples drained into output
    samples_popped: AtomicU64,
    /// Queued samples discarded by eviction or reset
    samples_dropped: AtomicU64,
    /// Incoming samples that never entered the queue
    samples_rejected: AtomicU64,
    /// Render calls with at least one silence-filled position
    underrun_blocks: AtomicU64,
    /// Output positions filled with silence
    silent_samples: AtomicU64,
    render_calls: AtomicU64,
    /// Queue length after the last push or render
    backlog: AtomicUsize,
}

impl QueueMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub(crate) fn record_push(&self, outcome: PushOutcome, backlog: usize) {
        self.samples_pushed
            .fetch_add(outcome.accepted as u64, Ordering::Relaxed);
        if outcome.evicted > 0 {
            self.samples_dropped
                .fetch_add(outcome.evicted as u64, Ordering::Relaxed);
        }
        if outcome.rejected > 0 {
            self.samples_rejected
                .fetch_add(outcome.rejected as u64, Ordering::Relaxed);
        }
        self.backlog.store(backlog, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_render(&self, popped: usize, silent: usize, backlog: usize) {
        self.render_calls.fetch_add(1, Ordering::Relaxed);
        self.samples_popped
            .fetch_add(popped as u64, Ordering::Relaxed);
        if silent > 0 {
            self.underrun_blocks.fetch_add(1, Ordering::Relaxed);
            self.silent_samples
                .fetch_add(silent as u64, Ordering::Relaxed);
        }
        self.backlog.store(backlog, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_clear(&self, discarded: usize) {
        self.samples_dropped
            .fetch_add(discarded as u64, Ordering::Relaxed);
        self.backlog.store(0, Ordering::Relaxed);
    }

    /// Current queue length as last observed by the render path.
    #[inline]
    pub fn backlog(&self) -> usize {
        self.backlog.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn samples_dropped(&self) -> u64 {
        self.samples_dropped.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn samples_rejected(&self) -> u64 {
        self.samples_rejected.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn underrun_blocks(&self) -> u64 {
        self.underrun_blocks.load(Ordering::Relaxed)
    }

    /// Take a snapshot of current metrics.
    pub fn snapshot(&self) -> QueueMetricsSnapshot {
        QueueMetricsSnapshot {
            samples_pushed: self.samples_pushed.load(Ordering::Relaxed),
            samples_popped: self.samples_popped.load(Ordering::Relaxed),
            samples_dropped: self.samples_dropped.load(Ordering::Relaxed),
            samples_rejected: self.samples_rejected.load(Ordering::Relaxed),
            underrun_blocks: self.underrun_blocks.load(Ordering::Relaxed),
            silent_samples: self.silent_samples.load(Ordering::Relaxed),
            render_calls: self.render_calls.load(Ordering::Relaxed),
            backlog: self.backlog.load(Ordering::Relaxed),
        }
    }

    /// Reset all counters. The backlog gauge is left alone.
    pub fn reset(&self) {
        self.samples_pushed.store(0, Ordering::Relaxed);
        self.samples_popped.store(0, Ordering::Relaxed);
        self.samples_dropped.store(0, Ordering::Relaxed);
        self.samples_rejected.store(0, Ordering::Relaxed);
        self.underrun_blocks.store(0, Ordering::Relaxed);
        self.silent_samples.store(0, Ordering::Relaxed);
        self.render_calls.store(0, Ordering::Relaxed);
    }
}

/// Point-in-time copy of [`QueueMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QueueMetricsSnapshot {
    pub samples_pushed: u64,
    pub samples_popped: u64,
    pub samples_dropped: u64,
    pub samples_rejected: u64,
    pub underrun_blocks: u64,
    pub silent_samples: u64,
    pub render_calls: u64,
    pub backlog: usize,
}

impl QueueMetricsSnapshot {
    /// Fraction of rendered positions that were silence-filled.
    pub fn silence_ratio(&self) -> f64 {
        let total = self.samples_popped + self.silent_samples;
        if total == 0 {
            0.0
        } else {
            self.silent_samples as f64 / total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn accepted(count: usize) -> PushOutcome {
        PushOutcome {
            accepted: count,
            ..Default::default()
        }
    }

    #[test]
    fn test_record_push_and_render() {
        let metrics = QueueMetrics::new();
        metrics.record_push(accepted(200), 200);
        metrics.record_render(128, 0, 72);
        metrics.record_render(0, 128, 72);

        let snap = metrics.snapshot();
        assert_eq!(snap.samples_pushed, 200);
        assert_eq!(snap.samples_popped, 128);
        assert_eq!(snap.render_calls, 2);
        assert_eq!(snap.underrun_blocks, 1);
        assert_eq!(snap.silent_samples, 128);
        assert_eq!(snap.backlog, 72);
        assert_relative_eq!(snap.silence_ratio(), 0.5);
    }

    #[test]
    fn test_dropped_and_clear() {
        let metrics = QueueMetrics::new();
        metrics.record_push(
            PushOutcome {
                accepted: 10,
                rejected: 3,
                evicted: 5,
            },
            10,
        );
        metrics.record_clear(10);
        assert_eq!(metrics.samples_dropped(), 15);
        assert_eq!(metrics.samples_rejected(), 3);
        assert_eq!(metrics.backlog(), 0);
    }

    #[test]
    fn test_reset_keeps_backlog() {
        let metrics = QueueMetrics::new();
        metrics.record_push(accepted(64), 64);
        metrics.record_render(0, 128, 64);
        metrics.reset();

        let snap = metrics.snapshot();
        assert_eq!(snap.samples_pushed, 0);
        assert_eq!(snap.underrun_blocks, 0);
        assert_eq!(snap.backlog, 64);
        assert_eq!(snap.silence_ratio(), 0.0);
    }
}
