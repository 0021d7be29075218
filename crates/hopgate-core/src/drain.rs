//! Hop threshold and gated drain.
//!
//! This is a threshold-gated rate changer, not an overlap-add time stretcher.
//! The speed only decides how much backlog must exist before output is
//! produced. Once the gate is open, samples leave the queue one per output
//! position with no resampling, windowing, or look-ahead.

use crate::config::GateMode;
use crate::queue::SampleQueue;

/// Number of queued samples required before a render call may drain.
///
/// `floor(logical_frame_size * speed)`, saturating: a negative or NaN speed
/// yields 0 (gate always open), an infinite or huge one `usize::MAX` (gate
/// never opens).
#[inline]
pub fn hop_threshold(logical_frame_size: usize, speed: f64) -> usize {
    (logical_frame_size as f64 * speed).floor() as usize
}

/// Counts for one drain pass. `popped + silent` equals the slice length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DrainOutcome {
    pub popped: usize,
    pub silent: usize,
}

impl DrainOutcome {
    #[inline]
    pub fn is_underrun(&self) -> bool {
        self.silent > 0
    }
}

impl std::ops::AddAssign for DrainOutcome {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        self.popped += rhs.popped;
        self.silent += rhs.silent;
    }
}

/// Gate state for one render call.
///
/// Latched once from the threshold and the backlog at the start of the call
/// and then applied to every slice the call writes. A call split into several
/// drain passes produces the same output as a single pass over its length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Gate {
    mode: GateMode,
    threshold: usize,
}

impl Gate {
    #[inline]
    pub fn latch(queue: &SampleQueue, threshold: usize, mode: GateMode) -> Self {
        let threshold = match mode {
            // Open: pop until dry. Closed: the bounded queue never reaches MAX.
            GateMode::Block if queue.len() >= threshold => 0,
            GateMode::Block => usize::MAX,
            GateMode::Sample => threshold,
        };
        Self { mode, threshold }
    }

    #[inline]
    pub fn drain(&self, queue: &mut SampleQueue, out: &mut [f32]) -> DrainOutcome {
        drain(queue, self.threshold, self.mode, out)
    }
}

/// Fill every slot of `out` from `queue`, silence where the gate is closed.
#[inline]
pub fn drain(
    queue: &mut SampleQueue,
    threshold: usize,
    mode: GateMode,
    out: &mut [f32],
) -> DrainOutcome {
    match mode {
        GateMode::Block => drain_block(queue, threshold, out),
        GateMode::Sample => drain_per_sample(queue, threshold, out),
    }
}

fn drain_block(queue: &mut SampleQueue, threshold: usize, out: &mut [f32]) -> DrainOutcome {
    let popped = if queue.len() >= threshold {
        queue.pop_into(out)
    } else {
        0
    };
    out[popped..].fill(0.0);

    DrainOutcome {
        popped,
        silent: out.len() - popped,
    }
}

fn drain_per_sample(queue: &mut SampleQueue, threshold: usize, out: &mut [f32]) -> DrainOutcome {
    let mut outcome = DrainOutcome::default();

    for slot in out.iter_mut() {
        let sample = if queue.len() >= threshold {
            queue.pop()
        } else {
            None
        };

        match sample {
            Some(value) => {
                *slot = value;
                outcome.popped += 1;
            }
            None => {
                *slot = 0.0;
                outcome.silent += 1;
            }
        }
    }

    outcome
}
