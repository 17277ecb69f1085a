//! Frame and timer scheduling contract between engines and their host.
//!
//! Engines never spawn anything themselves.  On `mount` they ask the host's
//! [`Scheduler`] for a frame callback and, if configured, an autoplay
//! interval; the host later calls back with the handle it issued.  Handles
//! let an engine reject callbacks that were already in flight when it
//! cancelled them, so a disposed engine can never be mutated by a stale
//! frame or tick.

use std::time::Duration;

/// Identifies one requested animation frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameHandle(pub u64);

/// Identifies one repeating interval timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(pub u64);

/// Host-side scheduling capability.
pub trait Scheduler {
    /// Ask for one callback on the next display frame.
    fn request_frame(&mut self) -> FrameHandle;
    fn cancel_frame(&mut self, handle: FrameHandle);
    /// Start a repeating timer firing every `period`.
    fn set_interval(&mut self, period: Duration) -> TimerHandle;
    fn clear_interval(&mut self, handle: TimerHandle);
}

/// Where an engine is in its mount/dispose cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Lifecycle {
    #[default]
    Created,
    Mounted,
    Disposed,
}

/// The scheduling resources one engine currently holds.
///
/// Engines keep their handles here so acquisition and release live in one
/// place: [`EngineSchedule::release`] returns everything to the scheduler.
#[derive(Debug, Default)]
pub(crate) struct EngineSchedule {
    pub lifecycle: Lifecycle,
    pub frame: Option<FrameHandle>,
    pub timer: Option<TimerHandle>,
}

impl EngineSchedule {
    pub fn is_mounted(&self) -> bool {
        self.lifecycle == Lifecycle::Mounted
    }

    /// Accepts `handle` only if it is the frame this engine is waiting on,
    /// consuming it.
    pub fn take_frame(&mut self, handle: FrameHandle) -> bool {
        if self.is_mounted() && self.frame == Some(handle) {
            self.frame = None;
            true
        } else {
            false
        }
    }

    pub fn owns_timer(&self, handle: TimerHandle) -> bool {
        self.is_mounted() && self.timer == Some(handle)
    }

    pub fn request_frame(&mut self, sched: &mut impl Scheduler) {
        if self.frame.is_none() {
            self.frame = Some(sched.request_frame());
        }
    }

    pub fn release(&mut self, sched: &mut impl Scheduler) {
        if let Some(frame) = self.frame.take() {
            sched.cancel_frame(frame);
        }
        if let Some(timer) = self.timer.take() {
            sched.clear_interval(timer);
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! A recording scheduler for engine tests.

    use super::*;

    #[derive(Debug, Default)]
    pub struct SpyScheduler {
        next: u64,
        pub frames_requested: Vec<FrameHandle>,
        pub frames_cancelled: Vec<FrameHandle>,
        pub intervals: Vec<(TimerHandle, Duration)>,
        pub intervals_cleared: Vec<TimerHandle>,
    }

    impl SpyScheduler {
        pub fn last_frame(&self) -> Option<FrameHandle> {
            self.frames_requested.last().copied()
        }

        pub fn last_interval(&self) -> Option<TimerHandle> {
            self.intervals.last().map(|(h, _)| *h)
        }

        /// Frames requested and not cancelled.
        pub fn live_frames(&self) -> usize {
            self.frames_requested
                .iter()
                .filter(|h| !self.frames_cancelled.contains(h))
                .count()
        }

        pub fn live_intervals(&self) -> usize {
            self.intervals
                .iter()
                .filter(|(h, _)| !self.intervals_cleared.contains(h))
                .count()
        }
    }

    impl Scheduler for SpyScheduler {
        fn request_frame(&mut self) -> FrameHandle {
            self.next += 1;
            let h = FrameHandle(self.next);
            self.frames_requested.push(h);
            h
        }

        fn cancel_frame(&mut self, handle: FrameHandle) {
            self.frames_cancelled.push(handle);
        }

        fn set_interval(&mut self, period: Duration) -> TimerHandle {
            self.next += 1;
            let h = TimerHandle(self.next);
            self.intervals.push((h, period));
            h
        }

        fn clear_interval(&mut self, handle: TimerHandle) {
            self.intervals_cleared.push(handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::SpyScheduler;
    use super::*;

    #[test]
    fn release_returns_everything() {
        let mut spy = SpyScheduler::default();
        let mut s = EngineSchedule {
            lifecycle: Lifecycle::Mounted,
            ..Default::default()
        };
        s.request_frame(&mut spy);
        s.timer = Some(spy.set_interval(Duration::from_secs(1)));
        assert_eq!(spy.live_frames(), 1);
        assert_eq!(spy.live_intervals(), 1);

        s.release(&mut spy);
        assert_eq!(spy.live_frames(), 0);
        assert_eq!(spy.live_intervals(), 0);
        assert!(s.frame.is_none() && s.timer.is_none());
    }

    #[test]
    fn frame_handles_are_single_use() {
        let mut spy = SpyScheduler::default();
        let mut s = EngineSchedule {
            lifecycle: Lifecycle::Mounted,
            ..Default::default()
        };
        s.request_frame(&mut spy);
        let h = spy.last_frame().unwrap();
        assert!(s.take_frame(h));
        assert!(!s.take_frame(h));
    }

    #[test]
    fn unmounted_rejects_callbacks() {
        let mut s = EngineSchedule {
            lifecycle: Lifecycle::Disposed,
            frame: Some(FrameHandle(1)),
            timer: Some(TimerHandle(2)),
        };
        assert!(!s.take_frame(FrameHandle(1)));
        assert!(!s.owns_timer(TimerHandle(2)));
    }
}
