//! Frame/interval clock for the terminal host.
//!
//! Engines ask for frames and autoplay intervals through the
//! [`Scheduler`] trait; the main loop calls [`FrameScheduler::take_due`] on
//! every tick and hands the returned handles back to whichever engine is
//! mounted.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use ideo_stack::core::schedule::{FrameHandle, Scheduler, TimerHandle};

/// Longest frame delta handed to the engines.  A stalled terminal should
/// not make springs jump.
const MAX_FRAME_DT: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy)]
struct Interval {
    period: Duration,
    next_due: Instant,
}

/// Callbacks that came due on one tick.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Due {
    pub frames: Vec<FrameHandle>,
    pub timers: Vec<TimerHandle>,
    /// Time since the previous frame tick.
    pub dt: Duration,
}

/// Hands out handles and decides when they fire.
#[derive(Debug)]
pub struct FrameScheduler {
    next: u64,
    frame_period: Duration,
    /// Clock as of the last `take_due`; new intervals count from here.
    now: Instant,
    last_frame: Instant,
    frames: Vec<FrameHandle>,
    intervals: BTreeMap<TimerHandle, Interval>,
}

impl FrameScheduler {
    pub fn new(frame_period: Duration, now: Instant) -> Self {
        Self {
            next: 0,
            frame_period,
            now,
            last_frame: now,
            frames: Vec::new(),
            intervals: BTreeMap::new(),
        }
    }

    pub fn frame_period(&self) -> Duration {
        self.frame_period
    }

    pub fn set_frame_period(&mut self, period: Duration) {
        self.frame_period = period;
    }

    /// Collect everything due at `now`.  Pending frames fire once a frame
    /// period has passed; each interval fires at most once per call, and a
    /// late interval skips the periods it missed.
    pub fn take_due(&mut self, now: Instant) -> Due {
        self.now = now;
        let mut due = Due::default();

        let since = now.saturating_duration_since(self.last_frame);
        if !self.frames.is_empty() && since >= self.frame_period {
            due.frames = std::mem::take(&mut self.frames);
            due.dt = since.min(MAX_FRAME_DT);
            self.last_frame = now;
        } else if self.frames.is_empty() {
            // Idle: the next frame measures from here, not from the last
            // animation.
            self.last_frame = now;
        }

        for (&handle, interval) in self.intervals.iter_mut() {
            if interval.next_due <= now {
                due.timers.push(handle);
                while interval.next_due <= now {
                    interval.next_due += interval.period;
                }
            }
        }
        due
    }

    fn next_handle(&mut self) -> u64 {
        self.next += 1;
        self.next
    }
}

impl Scheduler for FrameScheduler {
    fn request_frame(&mut self) -> FrameHandle {
        let handle = FrameHandle(self.next_handle());
        self.frames.push(handle);
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        self.frames.retain(|h| *h != handle);
    }

    fn set_interval(&mut self, period: Duration) -> TimerHandle {
        let handle = TimerHandle(self.next_handle());
        let period = period.max(Duration::from_millis(1));
        self.intervals.insert(
            handle,
            Interval {
                period,
                next_due: self.now + period,
            },
        );
        tracing::debug!(?handle, ?period, "interval started");
        handle
    }

    fn clear_interval(&mut self, handle: TimerHandle) {
        self.intervals.remove(&handle);
    }
}
