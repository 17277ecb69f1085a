//! Per-card tilt and drag-to-dismiss gesture.
//!
//! A [`CardDrag`] follows one pointer from press to release.  While held,
//! the card follows the pointer (scaled by an elastic factor) and tilts
//! toward it.  On release the card is either dismissed, which the owning
//! engine turns into a reorder, or springs back to rest.
//!
//! The drag offset never leaves this type: engines only see the
//! [`DragOutcome`] of a completed gesture.

use super::motion::{Spring, SpringConfig};

/// Maps pointer offset to tilt: `±input_px` saturates at `±max_deg`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TiltRange {
    pub input_px: f64,
    pub max_deg: f64,
}

impl TiltRange {
    /// Stack cards: ±100 px → ±60°.
    pub const STACK: TiltRange = TiltRange {
        input_px: 100.0,
        max_deg: 60.0,
    };
    /// Focused card of the circular strip: ±80 px → ±12°.
    pub const FLOATING: TiltRange = TiltRange {
        input_px: 80.0,
        max_deg: 12.0,
    };

    fn map(&self, offset: f64) -> f64 {
        if self.input_px <= 0.0 {
            return 0.0;
        }
        (offset / self.input_px).clamp(-1.0, 1.0) * self.max_deg
    }
}

/// Simulated 3D tilt in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Tilt {
    /// Around the horizontal axis, driven by vertical offset.
    pub rotate_x: f64,
    /// Around the vertical axis, driven by horizontal offset.
    pub rotate_y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragConfig {
    /// Pixels of travel on either axis before a release dismisses the card.
    pub sensitivity: f64,
    /// Static card: no drag, no tilt.
    pub disabled: bool,
    pub tilt: TiltRange,
    /// Fraction of pointer travel the card visibly follows.
    pub elastic: f64,
    /// When false, releases always spring back.
    pub dismissable: bool,
}

impl Default for DragConfig {
    fn default() -> Self {
        Self {
            sensitivity: 200.0,
            disabled: false,
            tilt: TiltRange::STACK,
            elastic: 0.6,
            dismissable: true,
        }
    }
}

impl DragConfig {
    /// Tilt-only behaviour of the focused circular card.
    pub fn floating() -> Self {
        Self {
            tilt: TiltRange::FLOATING,
            elastic: 0.5,
            dismissable: false,
            ..Self::default()
        }
    }
}

/// Result of releasing a drag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragOutcome {
    /// Travel exceeded the sensitivity; the card should go to the back.
    SendToBack,
    /// Under the threshold; the card animates back to rest.
    SpringBack,
    /// No drag was in progress.
    Ignored,
}

/// Spring used to return a released card to rest.
const RETURN_SPRING: SpringConfig = SpringConfig {
    stiffness: 500.0,
    damping: 40.0,
    mass: 1.0,
};

/// Tilt/drag state for one card.
#[derive(Debug, Clone)]
pub struct CardDrag {
    config: DragConfig,
    /// Pointer position at the press that started this gesture.
    press: Option<(f64, f64)>,
    /// Raw offset left over from an interrupted spring-back.
    carried: (f64, f64),
    /// Pointer travel since `press`.  Only this counts toward dismissal.
    travel: (f64, f64),
    returning: Option<(Spring, Spring)>,
}

impl CardDrag {
    pub fn new(config: DragConfig) -> Self {
        Self {
            config,
            press: None,
            carried: (0.0, 0.0),
            travel: (0.0, 0.0),
            returning: None,
        }
    }

    pub fn config(&self) -> &DragConfig {
        &self.config
    }

    pub fn is_dragging(&self) -> bool {
        self.press.is_some()
    }

    /// True while a drag is held or the card is still springing back.
    pub fn is_active(&self) -> bool {
        self.press.is_some() || self.returning.is_some()
    }

    /// Press at `(x, y)`.  Returns `false` when dragging is disabled.
    pub fn begin(&mut self, x: f64, y: f64) -> bool {
        if self.config.disabled {
            return false;
        }
        // Grabbing mid-return continues from the displayed offset.
        let (ox, oy) = self.offset();
        let elastic = self.elastic();
        self.carried = (ox / elastic, oy / elastic);
        self.travel = (0.0, 0.0);
        self.press = Some((x, y));
        self.returning = None;
        true
    }

    pub fn update(&mut self, x: f64, y: f64) {
        if let Some((px, py)) = self.press {
            self.travel = (x - px, y - py);
        }
    }

    /// Finish the gesture.
    pub fn release(&mut self) -> DragOutcome {
        if self.press.take().is_none() {
            return DragOutcome::Ignored;
        }
        let (dx, dy) = self.travel;
        let s = self.config.sensitivity;
        if self.config.dismissable && (dx.abs() > s || dy.abs() > s) {
            // The owner reorders; this card is re-laid out from rest.
            self.carried = (0.0, 0.0);
            self.travel = (0.0, 0.0);
            self.returning = None;
            return DragOutcome::SendToBack;
        }
        self.start_return();
        DragOutcome::SpringBack
    }

    /// Abort without dismissing.
    pub fn cancel(&mut self) {
        if self.press.take().is_some() {
            self.start_return();
        }
    }

    fn start_return(&mut self) {
        let (x, y) = self.offset();
        let mut sx = Spring::new(RETURN_SPRING, x);
        let mut sy = Spring::new(RETURN_SPRING, y);
        sx.retarget(0.0);
        sy.retarget(0.0);
        self.carried = (0.0, 0.0);
        self.travel = (0.0, 0.0);
        self.returning = Some((sx, sy));
    }

    /// Advance the spring-back animation.
    pub fn step(&mut self, dt: f64) {
        if let Some((sx, sy)) = self.returning.as_mut() {
            sx.step(dt);
            sy.step(dt);
            if sx.is_settled() && sy.is_settled() {
                self.returning = None;
            }
        }
    }

    fn elastic(&self) -> f64 {
        if self.config.elastic > 0.0 {
            self.config.elastic
        } else {
            1.0
        }
    }

    /// Displayed offset in pixels.
    pub fn offset(&self) -> (f64, f64) {
        if self.config.disabled {
            return (0.0, 0.0);
        }
        if let Some((sx, sy)) = &self.returning {
            return (sx.value(), sy.value());
        }
        let e = self.elastic();
        (
            (self.carried.0 + self.travel.0) * e,
            (self.carried.1 + self.travel.1) * e,
        )
    }

    pub fn tilt(&self) -> Tilt {
        if self.config.disabled {
            return Tilt::default();
        }
        let (x, y) = self.offset();
        Tilt {
            rotate_x: -self.config.tilt.map(y),
            rotate_y: self.config.tilt.map(x),
        }
    }
}
