//! Aligned history of the four corner channels
//!
//! The detector decides *when* a footstep happened on the primary channel; the
//! tracker needs the corner samples from that same interval. `CornerHistory`
//! keeps the most recent corner frames keyed by detector tick so an event's
//! tick span can be turned into four time-aligned windows.

use std::collections::VecDeque;

/// Fixed-capacity ring buffer of synchronized corner frames.
#[derive(Clone, Debug)]
pub struct CornerHistory {
    frames: VecDeque<[f64; 4]>,
    capacity: usize,
    /// Tick index of the oldest retained frame
    first_tick: u64,
}

impl CornerHistory {
    /// Create a history retaining up to `capacity` frames
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            frames: VecDeque::with_capacity(capacity),
            capacity,
            first_tick: 0,
        }
    }

    /// Append the frame for the next tick, evicting the oldest when full.
    pub fn push(&mut self, corners: [f64; 4]) {
        if self.frames.len() == self.capacity {
            self.frames.pop_front();
            self.first_tick += 1;
        }
        self.frames.push_back(corners);
    }

    /// Tick index the next pushed frame will receive
    #[must_use]
    pub fn next_tick(&self) -> u64 {
        self.first_tick + self.frames.len() as u64
    }

    /// Tick index of the oldest retained frame
    #[must_use]
    pub fn first_tick(&self) -> u64 {
        self.first_tick
    }

    /// Number of retained frames
    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Whether the history is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Per-corner windows covering ticks `start..=end`.
    ///
    /// The span is clipped to what is still retained. Returns the clipped
    /// start tick with the windows, or `None` if nothing of the span remains.
    #[must_use]
    pub fn window(&self, start: u64, end: u64) -> Option<(u64, [Vec<f64>; 4])> {
        let last = self.next_tick().checked_sub(1)?;
        let start = start.max(self.first_tick);
        let end = end.min(last);
        if self.frames.is_empty() || start > end {
            return None;
        }

        #[allow(clippy::cast_possible_truncation)]
        let lo = (start - self.first_tick) as usize;
        #[allow(clippy::cast_possible_truncation)]
        let hi = (end - self.first_tick) as usize;

        let mut windows: [Vec<f64>; 4] =
            std::array::from_fn(|_| Vec::with_capacity(hi - lo + 1));
        for frame in self.frames.range(lo..=hi) {
            for (window, &value) in windows.iter_mut().zip(frame.iter()) {
                window.push(value);
            }
        }
        Some((start, windows))
    }

    /// Drop all frames and restart tick numbering at zero
    pub fn clear(&mut self) {
        self.frames.clear();
        self.first_tick = 0;
    }
}
