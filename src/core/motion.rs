//! Pose animation: damped springs and cubic-bezier tweens.
//!
//! Stack layouts only say where a card *should* be.  The animators here move
//! the displayed pose toward that target a frame at a time, and accept new
//! targets mid-flight without jumping.

use std::time::Duration;

/// Integration step for springs.  Frame deltas are split into sub-steps of
/// at most this size so large frame gaps stay stable.
const SPRING_SUBSTEP: f64 = 1.0 / 240.0;

/// Below both thresholds a spring snaps onto its target.
const REST_DELTA: f64 = 0.01;
const REST_SPEED: f64 = 0.01;

// ───────────────────────────────────────── spring ────────────

/// Physical parameters of a damped spring.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpringConfig {
    pub stiffness: f64,
    pub damping: f64,
    pub mass: f64,
}

impl Default for SpringConfig {
    fn default() -> Self {
        Self {
            stiffness: 80.0,
            damping: 24.0,
            mass: 0.9,
        }
    }
}

/// One scalar driven by a damped spring.
#[derive(Debug, Clone)]
pub struct Spring {
    config: SpringConfig,
    value: f64,
    velocity: f64,
    target: f64,
}

impl Spring {
    pub fn new(config: SpringConfig, value: f64) -> Self {
        Self {
            config,
            value,
            velocity: 0.0,
            target: value,
        }
    }

    /// Aim at a new target, keeping the current velocity.
    pub fn retarget(&mut self, target: f64) {
        self.target = target;
    }

    pub fn step(&mut self, dt: f64) {
        if self.is_settled() || dt <= 0.0 {
            return;
        }
        let mass = self.config.mass.max(f64::EPSILON);
        let mut remaining = dt;
        while remaining > 0.0 {
            let h = remaining.min(SPRING_SUBSTEP);
            let force = -self.config.stiffness * (self.value - self.target)
                - self.config.damping * self.velocity;
            self.velocity += force / mass * h;
            self.value += self.velocity * h;
            remaining -= h;
        }
        if (self.value - self.target).abs() < REST_DELTA && self.velocity.abs() < REST_SPEED {
            self.value = self.target;
            self.velocity = 0.0;
        }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn target(&self) -> f64 {
        self.target
    }

    pub fn is_settled(&self) -> bool {
        self.value == self.target && self.velocity == 0.0
    }
}

// ───────────────────────────────────────── easing ────────────

/// CSS-style `cubic-bezier(x1, y1, x2, y2)` easing curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubicBezier {
    x1: f64,
    y1: f64,
    x2: f64,
    y2: f64,
}

impl CubicBezier {
    /// Ease-out curve used for card slides.
    pub const CARD_SLIDE: CubicBezier = CubicBezier {
        x1: 0.25,
        y1: 0.46,
        x2: 0.45,
        y2: 0.94,
    };

    pub const LINEAR: CubicBezier = CubicBezier {
        x1: 0.0,
        y1: 0.0,
        x2: 1.0,
        y2: 1.0,
    };

    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self {
            x1: x1.clamp(0.0, 1.0),
            y1,
            x2: x2.clamp(0.0, 1.0),
            y2,
        }
    }

    fn sample(a1: f64, a2: f64, t: f64) -> f64 {
        let u = 1.0 - t;
        3.0 * u * u * t * a1 + 3.0 * u * t * t * a2 + t * t * t
    }

    fn sample_derivative(a1: f64, a2: f64, t: f64) -> f64 {
        let u = 1.0 - t;
        3.0 * u * u * a1 + 6.0 * u * t * (a2 - a1) + 3.0 * t * t * (1.0 - a2)
    }

    /// Eased progress for linear progress `x` in `[0, 1]`.
    pub fn solve(&self, x: f64) -> f64 {
        let x = x.clamp(0.0, 1.0);
        if x == 0.0 || x == 1.0 {
            return x;
        }

        // Newton first, bisection if the slope is too flat.
        let mut t = x;
        for _ in 0..8 {
            let err = Self::sample(self.x1, self.x2, t) - x;
            if err.abs() < 1e-7 {
                return Self::sample(self.y1, self.y2, t);
            }
            let d = Self::sample_derivative(self.x1, self.x2, t);
            if d.abs() < 1e-6 {
                break;
            }
            t -= err / d;
        }

        let (mut lo, mut hi) = (0.0, 1.0);
        t = x;
        for _ in 0..40 {
            let v = Self::sample(self.x1, self.x2, t);
            if (v - x).abs() < 1e-7 {
                break;
            }
            if v < x {
                lo = t;
            } else {
                hi = t;
            }
            t = (lo + hi) / 2.0;
        }
        Self::sample(self.y1, self.y2, t)
    }
}

// ───────────────────────────────────────── tween ─────────────

/// Time-based interpolation between two values.
#[derive(Debug, Clone)]
pub struct Tween {
    from: f64,
    to: f64,
    elapsed: f64,
    duration: f64,
    easing: CubicBezier,
}

impl Tween {
    pub fn new(value: f64, duration: Duration, easing: CubicBezier) -> Self {
        Self {
            from: value,
            to: value,
            elapsed: 0.0,
            duration: duration.as_secs_f64(),
            easing,
        }
    }

    /// Restart from the currently displayed value toward `target`.
    pub fn retarget(&mut self, target: f64) {
        if target == self.to {
            return;
        }
        self.from = self.value();
        self.to = target;
        self.elapsed = 0.0;
    }

    pub fn step(&mut self, dt: f64) {
        if dt > 0.0 {
            self.elapsed = (self.elapsed + dt).min(self.duration);
        }
    }

    pub fn value(&self) -> f64 {
        if self.duration <= 0.0 || self.elapsed >= self.duration {
            return self.to;
        }
        let p = self.easing.solve(self.elapsed / self.duration);
        self.from + (self.to - self.from) * p
    }

    pub fn target(&self) -> f64 {
        self.to
    }

    pub fn is_settled(&self) -> bool {
        self.duration <= 0.0 || self.elapsed >= self.duration
    }
}

// ───────────────────────────────────────── pose ──────────────

/// Where a card sits relative to its slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    /// Horizontal offset in pixels.
    pub x: f64,
    /// Degrees.
    pub rotate_z: f64,
    pub scale: f64,
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            x: 0.0,
            rotate_z: 0.0,
            scale: 1.0,
        }
    }
}

/// How pose changes are animated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Transition {
    Spring(SpringConfig),
    Tween { duration: Duration, easing: CubicBezier },
}

impl Transition {
    /// 400 ms ease-out slide used by the horizontal-scroll deck.
    pub fn card_slide() -> Self {
        Transition::Tween {
            duration: Duration::from_millis(400),
            easing: CubicBezier::CARD_SLIDE,
        }
    }
}

#[derive(Debug, Clone)]
enum Channel {
    Spring(Spring),
    Tween(Tween),
}

impl Channel {
    fn new(transition: Transition, value: f64) -> Self {
        match transition {
            Transition::Spring(cfg) => Channel::Spring(Spring::new(cfg, value)),
            Transition::Tween { duration, easing } => {
                Channel::Tween(Tween::new(value, duration, easing))
            }
        }
    }

    fn retarget(&mut self, target: f64) {
        match self {
            Channel::Spring(s) => s.retarget(target),
            Channel::Tween(t) => t.retarget(target),
        }
    }

    fn step(&mut self, dt: f64) {
        match self {
            Channel::Spring(s) => s.step(dt),
            Channel::Tween(t) => t.step(dt),
        }
    }

    fn value(&self) -> f64 {
        match self {
            Channel::Spring(s) => s.value(),
            Channel::Tween(t) => t.value(),
        }
    }

    fn is_settled(&self) -> bool {
        match self {
            Channel::Spring(s) => s.is_settled(),
            Channel::Tween(t) => t.is_settled(),
        }
    }
}

/// A pose whose channels each animate toward the latest target.
#[derive(Debug, Clone)]
pub struct AnimatedPose {
    x: Channel,
    rotate_z: Channel,
    scale: Channel,
}

impl AnimatedPose {
    /// Start at rest on `pose`.  First layouts snap; only later changes animate.
    pub fn new(transition: Transition, pose: Pose) -> Self {
        Self {
            x: Channel::new(transition, pose.x),
            rotate_z: Channel::new(transition, pose.rotate_z),
            scale: Channel::new(transition, pose.scale),
        }
    }

    pub fn retarget(&mut self, pose: Pose) {
        self.x.retarget(pose.x);
        self.rotate_z.retarget(pose.rotate_z);
        self.scale.retarget(pose.scale);
    }

    pub fn step(&mut self, dt: f64) {
        self.x.step(dt);
        self.rotate_z.step(dt);
        self.scale.step(dt);
    }

    pub fn current(&self) -> Pose {
        Pose {
            x: self.x.value(),
            rotate_z: self.rotate_z.value(),
            scale: self.scale.value(),
        }
    }

    pub fn is_settled(&self) -> bool {
        self.x.is_settled() && self.rotate_z.is_settled() && self.scale.is_settled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spring_settles_on_target() {
        let mut s = Spring::new(SpringConfig::default(), 0.0);
        s.retarget(100.0);
        for _ in 0..600 {
            s.step(1.0 / 60.0);
        }
        assert!(s.is_settled());
        assert_eq!(s.value(), 100.0);
    }

    #[test]
    fn spring_keeps_velocity_on_retarget() {
        let mut s = Spring::new(SpringConfig::default(), 0.0);
        s.retarget(100.0);
        s.step(0.1);
        let moving = s.value();
        assert!(moving > 0.0);
        s.retarget(-100.0);
        s.step(1.0 / 240.0);
        // Still carried forward by momentum for at least one sub-step.
        assert!(s.value() > moving);
    }

    #[test]
    fn bezier_endpoints_and_monotonic() {
        let e = CubicBezier::CARD_SLIDE;
        assert_eq!(e.solve(0.0), 0.0);
        assert_eq!(e.solve(1.0), 1.0);
        let mut prev = 0.0;
        for i in 1..20 {
            let v = e.solve(i as f64 / 20.0);
            assert!(v >= prev);
            prev = v;
        }
        // Ease-out: ahead of linear at the midpoint.
        assert!(e.solve(0.5) > 0.5);
    }

    #[test]
    fn linear_bezier_is_identity() {
        for i in 0..=10 {
            let x = i as f64 / 10.0;
            assert!((CubicBezier::LINEAR.solve(x) - x).abs() < 1e-5);
        }
    }

    #[test]
    fn tween_reaches_target_after_duration() {
        let mut t = Tween::new(0.0, Duration::from_millis(400), CubicBezier::CARD_SLIDE);
        t.retarget(10.0);
        t.step(0.2);
        let mid = t.value();
        assert!(mid > 0.0 && mid < 10.0);
        t.step(0.3);
        assert!(t.is_settled());
        assert_eq!(t.value(), 10.0);
    }

    #[test]
    fn tween_retarget_starts_from_displayed_value() {
        let mut t = Tween::new(0.0, Duration::from_millis(400), CubicBezier::LINEAR);
        t.retarget(10.0);
        t.step(0.2);
        let shown = t.value();
        t.retarget(-10.0);
        assert!((t.value() - shown).abs() < 1e-9);
    }

    #[test]
    fn animated_pose_snaps_on_creation() {
        let pose = Pose {
            x: 12.0,
            rotate_z: 4.0,
            scale: 0.9,
        };
        let a = AnimatedPose::new(Transition::card_slide(), pose);
        assert_eq!(a.current(), pose);
        assert!(a.is_settled());
    }
}
