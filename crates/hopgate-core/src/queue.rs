//! Bounded FIFO of mono samples between ingest and drain.

use crate::config::OverflowPolicy;
use ringbuf::{traits::*, HeapRb};

/// Result of a [`SampleQueue::push`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PushOutcome {
    /// Incoming samples now in the queue.
    pub accepted: usize,
    /// Incoming samples that never entered the queue.
    pub rejected: usize,
    /// Previously queued samples discarded to make room.
    pub evicted: usize,
}

impl PushOutcome {
    /// Every sample the overflow policy discarded.
    #[inline]
    pub fn dropped(&self) -> usize {
        self.rejected + self.evicted
    }
}

/// Sample queue backed by a preallocated heap ring buffer.
///
/// Appends at the tail, pops from the head, never reorders. Values pass through
/// verbatim, non-finite ones included. Neither `push` nor `pop` allocates.
pub struct SampleQueue {
    rb: HeapRb<f32>,
    policy: OverflowPolicy,
}

impl SampleQueue {
    pub fn new(capacity: usize, policy: OverflowPolicy) -> Self {
        Self {
            rb: HeapRb::new(capacity.max(1)),
            policy,
        }
    }

    /// Append `samples` in order, applying the overflow policy if they do not fit.
    #[inline]
    pub fn push(&mut self, samples: &[f32]) -> PushOutcome {
        match self.policy {
            OverflowPolicy::DropNewest => {
                let accepted = self.rb.push_slice(samples);
                PushOutcome {
                    accepted,
                    rejected: samples.len() - accepted,
                    evicted: 0,
                }
            }
            OverflowPolicy::DropOldest => {
                let capacity = self.capacity();
                // Only the newest `capacity` samples can survive.
                let (truncated, incoming) = if samples.len() > capacity {
                    (
                        samples.len() - capacity,
                        &samples[samples.len() - capacity..],
                    )
                } else {
                    (0, samples)
                };

                let overflow = incoming.len().saturating_sub(self.rb.vacant_len());
                let evicted = if overflow > 0 {
                    self.rb.skip(overflow)
                } else {
                    0
                };

                let accepted = self.rb.push_slice(incoming);
                PushOutcome {
                    accepted,
                    rejected: truncated,
                    evicted,
                }
            }
        }
    }

    #[inline]
    pub fn pop(&mut self) -> Option<f32> {
        self.rb.try_pop()
    }

    /// Pop up to `out.len()` samples into the front of `out`. Returns the count.
    #[inline]
    pub fn pop_into(&mut self, out: &mut [f32]) -> usize {
        self.rb.pop_slice(out)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rb.occupied_len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rb.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.rb.capacity().get()
    }

    pub fn policy(&self) -> OverflowPolicy {
        self.policy
    }

    /// Discard the whole backlog. Returns how many samples were discarded.
    pub fn clear(&mut self) -> usize {
        let queued = self.rb.occupied_len();
        self.rb.skip(queued)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(start: usize, len: usize) -> Vec<f32> {
        (start..start + len).map(|i| i as f32).collect()
    }

    #[test]
    fn test_fifo_order() {
        let mut queue = SampleQueue::new(16, OverflowPolicy::DropOldest);
        queue.push(&[1.0, 2.0]);
        queue.push(&[3.0]);
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.pop(), Some(1.0));
        assert_eq!(queue.pop(), Some(2.0));
        assert_eq!(queue.pop(), Some(3.0));
        assert_eq!(queue.pop(), None);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_values_pass_verbatim() {
        let mut queue = SampleQueue::new(8, OverflowPolicy::DropOldest);
        queue.push(&[f32::NAN, f32::INFINITY, 7.5, -3.0]);
        assert!(queue.pop().unwrap().is_nan());
        assert_eq!(queue.pop(), Some(f32::INFINITY));
        assert_eq!(queue.pop(), Some(7.5));
        assert_eq!(queue.pop(), Some(-3.0));
    }

    #[test]
    fn test_empty_push_is_noop() {
        let mut queue = SampleQueue::new(8, OverflowPolicy::DropNewest);
        let outcome = queue.push(&[]);
        assert_eq!(outcome, PushOutcome::default());
        assert!(queue.is_empty());
    }

    #[test]
    fn test_drop_oldest_evicts_head() {
        let mut queue = SampleQueue::new(4, OverflowPolicy::DropOldest);
        queue.push(&ramp(0, 3));
        let outcome = queue.push(&ramp(3, 3));
        assert_eq!(outcome.accepted, 3);
        assert_eq!(outcome.evicted, 2);
        assert_eq!(outcome.rejected, 0);

        let mut out = [0.0; 4];
        assert_eq!(queue.pop_into(&mut out), 4);
        assert_eq!(out, [2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_drop_oldest_oversized_block_keeps_tail() {
        let mut queue = SampleQueue::new(4, OverflowPolicy::DropOldest);
        queue.push(&ramp(0, 2));
        let outcome = queue.push(&ramp(100, 10));
        assert_eq!(outcome.accepted, 4);
        assert_eq!(outcome.rejected, 6);
        assert_eq!(outcome.evicted, 2);
        assert_eq!(outcome.dropped(), 8);

        let mut out = [0.0; 4];
        queue.pop_into(&mut out);
        assert_eq!(out, [106.0, 107.0, 108.0, 109.0]);
    }

    #[test]
    fn test_drop_newest_keeps_backlog() {
        let mut queue = SampleQueue::new(4, OverflowPolicy::DropNewest);
        queue.push(&ramp(0, 3));
        let outcome = queue.push(&ramp(3, 3));
        assert_eq!(outcome.accepted, 1);
        assert_eq!(outcome.rejected, 2);
        assert_eq!(outcome.evicted, 0);

        let mut out = [0.0; 4];
        queue.pop_into(&mut out);
        assert_eq!(out, [0.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_pop_into_partial() {
        let mut queue = SampleQueue::new(8, OverflowPolicy::DropOldest);
        queue.push(&[1.0, 2.0]);
        let mut out = [9.0; 4];
        assert_eq!(queue.pop_into(&mut out), 2);
        assert_eq!(&out[..2], &[1.0, 2.0]);
        assert_eq!(&out[2..], &[9.0, 9.0]);
    }

    #[test]
    fn test_clear() {
        let mut queue = SampleQueue::new(8, OverflowPolicy::DropOldest);
        queue.push(&ramp(0, 5));
        assert_eq!(queue.clear(), 5);
        assert!(queue.is_empty());
        assert_eq!(queue.capacity(), 8);
    }
}
