//! Circular scroll strip.
//!
//! N cards are tiled twice on a belt of `2·N` slots.  The scroll offset is
//! smoothed toward its target every frame and wrapped into one pass of the
//! belt for layout, so the strip loops without a seam in either direction.
//! Each slot is bent onto an arc by [`compute_bend`].

use std::time::Duration;

use super::drag::{CardDrag, DragConfig, Tilt};
use super::geometry::{compute_bend, lerp, normalized_scroll, BendTransform};
use super::schedule::{EngineSchedule, FrameHandle, Lifecycle, Scheduler, TimerHandle};

/// Options recognised by [`CircularScrollEngine`].
#[derive(Debug, Clone, PartialEq)]
pub struct CircularConfig {
    /// Arc intensity in pixels.  0 = flat row.
    pub bend: f64,
    pub scroll_speed: f64,
    /// Fraction of the remaining distance covered per frame, in `(0, 1]`.
    pub scroll_ease: f64,
    pub autoplay: bool,
    pub autoplay_delay: Duration,
    pub pause_on_hover: bool,
    pub card_width: f64,
    pub card_height: f64,
    /// Extra pixels around the centre slot that still count as focused.
    pub focus_margin: f64,
    /// Pointer drag multiplier, applied on top of `scroll_speed`.
    pub drag_factor: f64,
}

impl Default for CircularConfig {
    fn default() -> Self {
        Self {
            bend: 1.0,
            scroll_speed: 2.0,
            scroll_ease: 0.05,
            autoplay: false,
            autoplay_delay: Duration::from_millis(3000),
            pause_on_hover: false,
            card_width: 208.0,
            card_height: 208.0,
            focus_margin: 20.0,
            drag_factor: 0.04,
        }
    }
}

/// Raw and smoothed scroll positions.  Neither is wrapped.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScrollOffset {
    pub current: f64,
    pub target: f64,
}

impl ScrollOffset {
    /// One smoothing step toward `target`.
    pub fn smooth(&mut self, ease: f64) {
        self.current = lerp(self.current, self.target, ease.clamp(0.0, 1.0));
    }
}

/// An in-progress drag of the strip itself.
#[derive(Debug, Clone, Copy)]
struct StripDrag {
    start_x: f64,
    baseline: f64,
}

/// One tiled slot as it should be drawn.
#[derive(Debug, Clone)]
pub struct SlotView<'a, T> {
    /// Slot index in `0..2N`.
    pub slot: usize,
    /// Item shown, `slot % N`.
    pub item_index: usize,
    pub item: &'a T,
    pub strip_position: f64,
    pub x_from_center: f64,
    /// Left edge relative to the container.
    pub screen_left: f64,
    pub bend: BendTransform,
    pub focused: bool,
    /// Tilt/drag offset, only ever non-zero on the focused slot.
    pub drag_offset: (f64, f64),
    pub tilt: Tilt,
}

/// Looping, arc-bent card strip driven by wheel, drag and autoplay.
#[derive(Debug)]
pub struct CircularScrollEngine<T> {
    config: CircularConfig,
    items: Vec<T>,
    scroll: ScrollOffset,
    viewport: (f64, f64),
    hovered: bool,
    strip_drag: Option<StripDrag>,
    floating: CardDrag,
    schedule: EngineSchedule,
}

impl<T> CircularScrollEngine<T> {
    pub fn new(config: CircularConfig, items: Vec<T>) -> Self {
        Self {
            config,
            items,
            scroll: ScrollOffset::default(),
            viewport: (208.0, 208.0),
            hovered: false,
            strip_drag: None,
            floating: CardDrag::new(DragConfig::floating()),
            schedule: EngineSchedule::default(),
        }
    }

    pub fn config(&self) -> &CircularConfig {
        &self.config
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn scroll(&self) -> ScrollOffset {
        self.scroll
    }

    pub fn viewport(&self) -> (f64, f64) {
        self.viewport
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.schedule.lifecycle
    }

    pub fn is_hovered(&self) -> bool {
        self.hovered
    }

    pub fn is_dragging(&self) -> bool {
        self.strip_drag.is_some() || self.floating.is_dragging()
    }

    fn accepts_input(&self) -> bool {
        self.schedule.lifecycle != Lifecycle::Disposed && !self.is_empty()
    }

    /// Width of one pass over the items.
    pub fn total_strip_width(&self) -> f64 {
        self.items.len() as f64 * self.config.card_width
    }

    /// Width of the doubled belt.
    pub fn strip_width(&self) -> f64 {
        self.total_strip_width() * 2.0
    }

    /// Smoothed offset wrapped into `[0, total_strip_width)`.
    pub fn normalized(&self) -> f64 {
        normalized_scroll(self.scroll.current, self.total_strip_width())
    }

    /// Horizontal translation of the whole belt relative to the container.
    pub fn strip_translate(&self) -> f64 {
        -self.normalized() + self.viewport.0 / 2.0 - self.config.card_width / 2.0
    }

    // ── lifecycle ───────────────────────────────────────────────

    /// Start the frame loop and, with two or more items, the autoplay timer.
    pub fn mount(&mut self, sched: &mut impl Scheduler) {
        self.schedule.release(sched);
        self.schedule.lifecycle = Lifecycle::Mounted;
        self.acquire(sched);
        tracing::debug!(
            cards = self.len(),
            autoplay = self.schedule.timer.is_some(),
            "circular strip mounted"
        );
    }

    fn acquire(&mut self, sched: &mut impl Scheduler) {
        if self.is_empty() {
            return;
        }
        self.schedule.request_frame(sched);
        if self.config.autoplay && self.len() > 1 && self.schedule.timer.is_none() {
            self.schedule.timer = Some(sched.set_interval(self.config.autoplay_delay));
        }
    }

    /// Cancel the frame loop and timer and drop any drag in progress.
    pub fn dispose(&mut self, sched: &mut impl Scheduler) {
        self.schedule.release(sched);
        self.schedule.lifecycle = Lifecycle::Disposed;
        self.strip_drag = None;
        self.floating.cancel();
        self.hovered = false;
        tracing::debug!("circular strip disposed");
    }

    /// Replace the items.  The strip starts over from offset zero, and the
    /// frame loop and autoplay timer follow the new item count.
    pub fn reseed(&mut self, items: Vec<T>, sched: &mut impl Scheduler) {
        if self.schedule.lifecycle == Lifecycle::Disposed {
            return;
        }
        self.items = items;
        self.scroll = ScrollOffset::default();
        self.strip_drag = None;
        self.floating = CardDrag::new(DragConfig::floating());
        if self.schedule.is_mounted() {
            self.schedule.release(sched);
            self.acquire(sched);
        }
        tracing::debug!(cards = self.len(), "circular strip reseeded");
    }

    /// Swap in new options, restarting or stopping autoplay to match.  A
    /// disposed strip keeps them for its next `mount`.
    pub fn reconfigure(&mut self, config: CircularConfig, sched: &mut impl Scheduler) {
        self.config = config;
        if self.schedule.is_mounted() {
            if let Some(timer) = self.schedule.timer.take() {
                sched.clear_interval(timer);
            }
            self.acquire(sched);
        }
    }

    // ── scheduled callbacks ─────────────────────────────────────

    /// Smooth `current` toward `target` and schedule the next frame.
    pub fn on_frame(&mut self, handle: FrameHandle, dt: Duration, sched: &mut impl Scheduler) -> bool {
        if !self.schedule.take_frame(handle) {
            return false;
        }
        self.scroll.smooth(self.config.scroll_ease);
        self.floating.step(dt.as_secs_f64());
        self.schedule.request_frame(sched);
        true
    }

    /// Autoplay: push the target one card along.
    pub fn on_interval(&mut self, handle: TimerHandle) -> bool {
        if !self.schedule.owns_timer(handle) || self.len() < 2 {
            return false;
        }
        if self.config.pause_on_hover && self.hovered {
            return false;
        }
        self.scroll.target += self.config.card_width;
        true
    }

    // ── input ───────────────────────────────────────────────────

    pub fn resize(&mut self, width: f64, height: f64) {
        self.viewport = (width.max(0.0), height.max(0.0));
    }

    pub fn pointer_enter(&mut self) {
        if self.schedule.lifecycle != Lifecycle::Disposed {
            self.hovered = true;
        }
    }

    pub fn pointer_leave(&mut self) {
        self.hovered = false;
    }

    /// Wheel step; the host suppresses the default scroll.
    pub fn wheel(&mut self, delta_y: f64) {
        if !self.accepts_input() || delta_y == 0.0 || !delta_y.is_finite() {
            return;
        }
        let direction = if delta_y > 0.0 { 1.0 } else { -1.0 };
        self.scroll.target += direction * self.config.scroll_speed * 0.5 * self.config.card_width;
    }

    /// Press at container coordinates `(x, y)`.  A press on the focused card
    /// tilts that card; anywhere else grabs the strip.
    pub fn pointer_down(&mut self, x: f64, y: f64) {
        if !self.accepts_input() {
            return;
        }
        if self.is_over_focused(x, y) {
            self.floating.begin(x, y);
            return;
        }
        self.strip_drag = Some(StripDrag {
            start_x: x,
            baseline: self.scroll.current,
        });
    }

    pub fn pointer_move(&mut self, x: f64, y: f64) {
        if self.floating.is_dragging() {
            self.floating.update(x, y);
            return;
        }
        if let Some(drag) = self.strip_drag {
            let factor = self.config.scroll_speed * self.config.drag_factor;
            self.scroll.target = drag.baseline + (drag.start_x - x) * factor;
        }
    }

    /// Release.  The strip does not snap; smoothing carries on toward
    /// whatever target the drag left.
    pub fn pointer_up(&mut self) {
        self.strip_drag = None;
        self.floating.release();
    }

    fn is_over_focused(&self, x: f64, y: f64) -> bool {
        let top = (self.viewport.1 - self.config.card_height) / 2.0;
        if y < top || y > top + self.config.card_height {
            return false;
        }
        self.slot_geometry()
            .filter(|g| g.focused)
            .any(|g| x >= g.screen_left && x <= g.screen_left + self.config.card_width)
    }

    // ── layout ──────────────────────────────────────────────────

    fn slot_geometry(&self) -> impl Iterator<Item = SlotGeometry> + '_ {
        let n = self.items.len();
        let cw = self.config.card_width;
        let (vw, _) = self.viewport;
        let scroll = self.normalized();
        let focus_radius = cw / 2.0 + self.config.focus_margin;
        (0..2 * n).map(move |slot| {
            let strip_position = slot as f64 * cw;
            let x_from_center = strip_position - scroll - vw / 2.0 + cw / 2.0;
            SlotGeometry {
                slot,
                strip_position,
                x_from_center,
                screen_left: vw / 2.0 + x_from_center - cw / 2.0,
                bend: compute_bend(x_from_center, vw, self.config.bend),
                focused: x_from_center.abs() <= focus_radius,
            }
        })
    }

    /// All `2·N` slots in strip order.
    pub fn slots(&self) -> Vec<SlotView<'_, T>> {
        let n = self.items.len();
        if n == 0 {
            return Vec::new();
        }
        let offset = self.floating.offset();
        let tilt = self.floating.tilt();
        self.slot_geometry()
            .map(|g| SlotView {
                slot: g.slot,
                item_index: g.slot % n,
                item: &self.items[g.slot % n],
                strip_position: g.strip_position,
                x_from_center: g.x_from_center,
                screen_left: g.screen_left,
                bend: g.bend,
                focused: g.focused,
                drag_offset: if g.focused { offset } else { (0.0, 0.0) },
                tilt: if g.focused { tilt } else { Tilt::default() },
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy)]
struct SlotGeometry {
    slot: usize,
    strip_position: f64,
    x_from_center: f64,
    screen_left: f64,
    bend: BendTransform,
    focused: bool,
}
