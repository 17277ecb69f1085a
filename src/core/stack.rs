//! Finite card stack.
//!
//! A [`StackEngine`] owns an ordered deck and turns clicks, drag releases
//! and autoplay ticks into a single *advance* operation.  How advancing
//! works is fixed at construction by [`TransitionMode`]:
//!
//! * `Stack`: the front card (last in `order`) moves to index 0, the
//!   visual back.  `order` stays a permutation of the seeded cards.
//! * `HorizontalScroll`: `order` never changes; a cursor walks it modulo
//!   its length and only a bounded window around the cursor is laid out.
//!
//! Both policies sit behind [`DeckPolicy`] so each keeps its own invariant.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};

use thiserror::Error;

use super::drag::{CardDrag, DragConfig, DragOutcome, Tilt, TiltRange};
use super::item::{stable_random_rotate, CardId, CardItem};
use super::motion::{AnimatedPose, Pose, SpringConfig, Transition};
use super::schedule::{EngineSchedule, FrameHandle, Lifecycle, Scheduler, TimerHandle};

/// Window positions laid out on each side of the cursor.
pub const VISIBLE_RANGE: i32 = 6;
/// Cards further than this from the cursor don't load their image.
pub const IMAGE_LOAD_RANGE: i32 = 6;
/// Clicks this soon after a drag-dismiss are the tail of that gesture.
pub const CLICK_SUPPRESS_WINDOW: Duration = Duration::from_millis(300);

const ROTATE_STEP_DEG: f64 = 4.0;
const SCALE_STEP: f64 = 0.06;
const WINDOW_SCALE_STEP: f64 = 0.23;
const WINDOW_MAX_SHRINK: f64 = 0.35;
/// Offsets in card widths between the cursor card and its neighbours.
const FOCUS_GAP: f64 = 0.8;
const BACK_STEP: f64 = 0.65;

// ───────────────────────────────────────── config ────────────

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unknown transition mode `{0}` (expected `stack` or `horizontalScroll`)")]
    UnknownTransitionMode(String),
}

/// How an advance changes the deck.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransitionMode {
    /// Reorder: the front card goes to the back.
    #[default]
    Stack,
    /// Cursor: the deck is fixed, the focus slides along it.
    HorizontalScroll,
}

impl TransitionMode {
    pub const ALL: &[TransitionMode] = &[TransitionMode::Stack, TransitionMode::HorizontalScroll];

    pub fn as_str(self) -> &'static str {
        match self {
            TransitionMode::Stack => "stack",
            TransitionMode::HorizontalScroll => "horizontalScroll",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TransitionMode::Stack => "Stack",
            TransitionMode::HorizontalScroll => "Horizontal Scroll",
        }
    }
}

impl fmt::Display for TransitionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransitionMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "stack" => Ok(TransitionMode::Stack),
            "horizontalScroll" | "horizontal-scroll" | "horizontal_scroll" => {
                Ok(TransitionMode::HorizontalScroll)
            }
            other => Err(ConfigError::UnknownTransitionMode(other.to_string())),
        }
    }
}

/// Options recognised by [`StackEngine`].
#[derive(Debug, Clone, PartialEq)]
pub struct StackConfig {
    /// Per-card tilt jitter derived from the card id.
    pub random_rotation: bool,
    /// Drag distance (px) that dismisses the front card.
    pub sensitivity: f64,
    pub send_to_back_on_click: bool,
    pub autoplay: bool,
    pub autoplay_delay: Duration,
    pub pause_on_hover: bool,
    /// Below `mobile_breakpoint` px, disable drag and advance on click.
    pub mobile_click_only: bool,
    pub mobile_breakpoint: f64,
    /// Lay the cards out side by side instead of stacked.
    pub spread_horizontal: bool,
    pub spread_gap: f64,
    pub spread_card_width: f64,
    /// Sideways peek of cards behind the front one.  0 = straight stack.
    pub back_spread_px: f64,
    pub transition_mode: TransitionMode,
    pub animation: SpringConfig,
    pub card_width: f64,
    pub card_height: f64,
}

impl Default for StackConfig {
    fn default() -> Self {
        Self {
            random_rotation: false,
            sensitivity: 200.0,
            send_to_back_on_click: false,
            autoplay: false,
            autoplay_delay: Duration::from_millis(3000),
            pause_on_hover: false,
            mobile_click_only: false,
            mobile_breakpoint: 768.0,
            spread_horizontal: false,
            spread_gap: 8.0,
            spread_card_width: 100.0,
            back_spread_px: 0.0,
            transition_mode: TransitionMode::Stack,
            animation: SpringConfig::default(),
            card_width: 208.0,
            card_height: 208.0,
        }
    }
}

impl StackConfig {
    fn jitter(&self, id: CardId) -> f64 {
        if self.random_rotation {
            stable_random_rotate(id)
        } else {
            0.0
        }
    }

    fn transition(&self) -> Transition {
        match self.transition_mode {
            TransitionMode::Stack => Transition::Spring(self.animation),
            TransitionMode::HorizontalScroll => Transition::card_slide(),
        }
    }

    fn drag_config(&self) -> DragConfig {
        DragConfig {
            sensitivity: self.sensitivity,
            tilt: TiltRange::STACK,
            ..DragConfig::default()
        }
    }
}

// ───────────────────────────────────────── placement ─────────

/// Rotation/scale pivot as a fraction of the card's size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Origin {
    pub x: f64,
    pub y: f64,
}

impl Origin {
    pub const CENTER: Origin = Origin { x: 0.5, y: 0.5 };
    pub const BOTTOM_RIGHT: Origin = Origin { x: 0.9, y: 0.9 };
}

/// Target layout of one card.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CardPlacement {
    pub id: CardId,
    /// Index into the deck's `order`.
    pub stack_index: usize,
    /// Signed distance from the front card; 0 is the front.
    pub position: i32,
    pub pose: Pose,
    /// Paint order, higher on top.
    pub z_index: i32,
    pub focused: bool,
    pub load_image: bool,
    pub origin: Origin,
}

// ───────────────────────────────────────── policies ──────────

/// What an advance policy must provide.
pub trait DeckPolicy<T> {
    fn items(&self) -> &[CardItem<T>];

    fn len(&self) -> usize {
        self.items().len()
    }

    fn is_empty(&self) -> bool {
        self.items().is_empty()
    }

    /// Id of the focused card.
    fn front(&self) -> Option<CardId>;

    /// Move the focus to the next card.
    fn advance(&mut self);

    /// The front card was dismissed.
    fn dismiss_front(&mut self) {
        self.advance();
    }

    /// Card `id` was dismissed.
    fn send_to_back(&mut self, id: CardId);

    /// Placements of the cards that should currently be rendered.
    fn current_window(&self, config: &StackConfig) -> Vec<CardPlacement>;
}

/// Reorder policy: `order.last()` is the front.
#[derive(Debug, Clone)]
pub struct ReorderDeck<T> {
    order: Vec<CardItem<T>>,
}

impl<T> ReorderDeck<T> {
    pub fn new(order: Vec<CardItem<T>>) -> Self {
        Self { order }
    }
}

impl<T> DeckPolicy<T> for ReorderDeck<T> {
    fn items(&self) -> &[CardItem<T>] {
        &self.order
    }

    fn front(&self) -> Option<CardId> {
        self.order.last().map(|c| c.id)
    }

    fn advance(&mut self) {
        if let Some(card) = self.order.pop() {
            self.order.insert(0, card);
        }
    }

    fn send_to_back(&mut self, id: CardId) {
        if let Some(index) = self.order.iter().position(|c| c.id == id) {
            let card = self.order.remove(index);
            self.order.insert(0, card);
        }
    }

    fn current_window(&self, config: &StackConfig) -> Vec<CardPlacement> {
        let len = self.order.len();
        let Some(top) = len.checked_sub(1) else {
            return Vec::new();
        };
        self.order
            .iter()
            .enumerate()
            .map(|(index, card)| {
                let distance = top - index;
                let back_offset = if config.back_spread_px > 0.0 && distance > 0 {
                    let side = if distance % 2 == 1 { 1.0 } else { -1.0 };
                    distance as f64 * config.back_spread_px * side
                } else {
                    0.0
                };
                let scale = (1.0 + index as f64 * SCALE_STEP - len as f64 * SCALE_STEP).max(0.0);
                CardPlacement {
                    id: card.id,
                    stack_index: index,
                    position: distance as i32,
                    pose: Pose {
                        x: back_offset,
                        rotate_z: distance as f64 * ROTATE_STEP_DEG + config.jitter(card.id),
                        scale,
                    },
                    z_index: index as i32,
                    focused: index == top,
                    load_image: true,
                    origin: Origin::BOTTOM_RIGHT,
                }
            })
            .collect()
    }
}

/// Cursor policy: `order` is fixed, `scroll_index` walks it.
#[derive(Debug, Clone)]
pub struct CursorDeck<T> {
    order: Vec<CardItem<T>>,
    scroll_index: usize,
}

impl<T> CursorDeck<T> {
    pub fn new(order: Vec<CardItem<T>>) -> Self {
        Self {
            order,
            scroll_index: 0,
        }
    }

    pub fn scroll_index(&self) -> usize {
        self.scroll_index
    }

    /// Deck index shown at window position `position`.
    fn index_at(&self, position: i32) -> usize {
        let n = self.order.len() as i64;
        let raw = n - 1 - self.scroll_index as i64 - i64::from(position);
        raw.rem_euclid(n) as usize
    }
}

/// Horizontal offset of window position `p`, in card widths.
fn window_offset(p: i32) -> f64 {
    match p {
        0 => 0.0,
        p if p > 0 => FOCUS_GAP + f64::from(p - 1) * BACK_STEP,
        p => -(FOCUS_GAP + f64::from(p.abs() - 1) * BACK_STEP),
    }
}

impl<T> DeckPolicy<T> for CursorDeck<T> {
    fn items(&self) -> &[CardItem<T>] {
        &self.order
    }

    fn front(&self) -> Option<CardId> {
        if self.order.is_empty() {
            return None;
        }
        Some(self.order[self.index_at(0)].id)
    }

    fn advance(&mut self) {
        self.scroll_index = (self.scroll_index + 1) % self.order.len().max(1);
    }

    fn send_to_back(&mut self, _id: CardId) {
        // The window is always centred on the cursor.
        self.advance();
    }

    fn current_window(&self, config: &StackConfig) -> Vec<CardPlacement> {
        let n = self.order.len();
        if n == 0 {
            return Vec::new();
        }

        // Small decks wrap into the window more than once; each card is
        // placed once, nearest the cursor, upcoming side on ties.
        let mut positions: Vec<i32> = (-VISIBLE_RANGE..=VISIBLE_RANGE).collect();
        positions.sort_by_key(|p| (p.abs(), -p));
        let mut seen = HashSet::new();
        let mut placements = Vec::new();

        for position in positions {
            let stack_index = self.index_at(position);
            if !seen.insert(stack_index) {
                continue;
            }
            let card = &self.order[stack_index];
            let is_front = position == 0;
            let distance = position.abs();
            let back_offset = match position.signum() {
                1 => -config.back_spread_px,
                -1 => config.back_spread_px,
                _ => 0.0,
            };
            let scale = if is_front {
                1.0
            } else {
                1.0 - (f64::from(distance) * WINDOW_SCALE_STEP).min(WINDOW_MAX_SHRINK)
            };
            let jitter = config.jitter(card.id);
            placements.push(CardPlacement {
                id: card.id,
                stack_index,
                position,
                pose: Pose {
                    x: window_offset(position) * config.card_width + back_offset,
                    rotate_z: if is_front {
                        jitter
                    } else {
                        f64::from(distance) * ROTATE_STEP_DEG + jitter
                    },
                    scale,
                },
                z_index: n as i32 - distance,
                focused: is_front,
                load_image: distance <= IMAGE_LOAD_RANGE,
                origin: Origin::CENTER,
            });
        }

        placements.sort_by_key(|p| p.position);
        placements
    }
}

/// The policy chosen for one engine instance.
#[derive(Debug, Clone)]
pub enum Deck<T> {
    Reorder(ReorderDeck<T>),
    Cursor(CursorDeck<T>),
}

impl<T> Deck<T> {
    pub fn new(mode: TransitionMode, items: Vec<CardItem<T>>) -> Self {
        match mode {
            TransitionMode::Stack => Deck::Reorder(ReorderDeck::new(items)),
            TransitionMode::HorizontalScroll => Deck::Cursor(CursorDeck::new(items)),
        }
    }

    pub fn mode(&self) -> TransitionMode {
        match self {
            Deck::Reorder(_) => TransitionMode::Stack,
            Deck::Cursor(_) => TransitionMode::HorizontalScroll,
        }
    }

    /// Rebuild under `mode`, keeping the same front card.
    pub fn convert(self, mode: TransitionMode) -> Self {
        if self.mode() == mode {
            return self;
        }
        let items = match self {
            Deck::Reorder(d) => d.order,
            Deck::Cursor(d) => {
                let mut order = d.order;
                order.rotate_right(d.scroll_index);
                order
            }
        };
        Deck::new(mode, items)
    }
}

impl<T> DeckPolicy<T> for Deck<T> {
    fn items(&self) -> &[CardItem<T>] {
        match self {
            Deck::Reorder(d) => d.items(),
            Deck::Cursor(d) => d.items(),
        }
    }

    fn front(&self) -> Option<CardId> {
        match self {
            Deck::Reorder(d) => d.front(),
            Deck::Cursor(d) => d.front(),
        }
    }

    fn advance(&mut self) {
        match self {
            Deck::Reorder(d) => d.advance(),
            Deck::Cursor(d) => d.advance(),
        }
    }

    fn send_to_back(&mut self, id: CardId) {
        match self {
            Deck::Reorder(d) => d.send_to_back(id),
            Deck::Cursor(d) => d.send_to_back(id),
        }
    }

    fn current_window(&self, config: &StackConfig) -> Vec<CardPlacement> {
        match self {
            Deck::Reorder(d) => d.current_window(config),
            Deck::Cursor(d) => d.current_window(config),
        }
    }
}

/// Side-by-side row used when `spread_horizontal` is set.
fn spread_row<T>(deck: &Deck<T>, config: &StackConfig) -> Vec<CardPlacement> {
    let items = deck.items();
    let front = deck.front();
    let pitch = config.spread_card_width + config.spread_gap;
    let center = (items.len() as f64 - 1.0) / 2.0;
    items
        .iter()
        .enumerate()
        .map(|(index, card)| CardPlacement {
            id: card.id,
            stack_index: index,
            position: index as i32 - center.round() as i32,
            pose: Pose {
                x: (index as f64 - center) * pitch,
                rotate_z: config.jitter(card.id),
                scale: 1.0,
            },
            z_index: index as i32,
            focused: Some(card.id) == front,
            load_image: true,
            origin: Origin::CENTER,
        })
        .collect()
}

// ───────────────────────────────────────── engine ────────────

/// One card as it should be drawn this frame.
#[derive(Debug, Clone)]
pub struct CardView<'a, T> {
    pub item: &'a CardItem<T>,
    /// Where the layout wants the card.
    pub placement: CardPlacement,
    /// Where the card is displayed right now (animated toward `placement`).
    pub pose: Pose,
    pub drag_offset: (f64, f64),
    pub tilt: Tilt,
    pub draggable: bool,
}

/// A deck of cards with reorder/cursor advance, drag-dismiss, click and
/// autoplay triggers.
#[derive(Debug)]
pub struct StackEngine<T> {
    config: StackConfig,
    deck: Deck<T>,
    viewport_width: f64,
    hovered: bool,
    drags: HashMap<CardId, CardDrag>,
    held: Option<CardId>,
    suppress_clicks_until: Option<Instant>,
    poses: HashMap<CardId, AnimatedPose>,
    schedule: EngineSchedule,
}

impl<T> StackEngine<T> {
    pub fn new(config: StackConfig, items: Vec<CardItem<T>>) -> Self {
        let deck = Deck::new(config.transition_mode, items);
        Self {
            viewport_width: f64::INFINITY,
            config,
            deck,
            hovered: false,
            drags: HashMap::new(),
            held: None,
            suppress_clicks_until: None,
            poses: HashMap::new(),
            schedule: EngineSchedule::default(),
        }
    }

    pub fn config(&self) -> &StackConfig {
        &self.config
    }

    pub fn deck(&self) -> &Deck<T> {
        &self.deck
    }

    pub fn items(&self) -> &[CardItem<T>] {
        self.deck.items()
    }

    pub fn len(&self) -> usize {
        self.deck.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deck.is_empty()
    }

    pub fn front(&self) -> Option<CardId> {
        self.deck.front()
    }

    /// Card ids back to front.
    pub fn order_ids(&self) -> Vec<CardId> {
        self.deck.items().iter().map(|c| c.id).collect()
    }

    /// Cursor position in horizontal-scroll mode.
    pub fn scroll_index(&self) -> Option<usize> {
        match &self.deck {
            Deck::Cursor(d) => Some(d.scroll_index()),
            Deck::Reorder(_) => None,
        }
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.schedule.lifecycle
    }

    pub fn is_hovered(&self) -> bool {
        self.hovered
    }

    fn accepts_input(&self) -> bool {
        self.schedule.lifecycle != Lifecycle::Disposed
    }

    pub fn is_mobile(&self) -> bool {
        self.viewport_width < self.config.mobile_breakpoint
    }

    pub fn drag_disabled(&self) -> bool {
        self.config.mobile_click_only && self.is_mobile()
    }

    pub fn click_enabled(&self) -> bool {
        self.config.send_to_back_on_click || self.drag_disabled()
    }

    // ── lifecycle ───────────────────────────────────────────────

    /// Acquire the frame loop and, when it can do anything, the autoplay
    /// interval.  An empty deck acquires nothing.
    pub fn mount(&mut self, sched: &mut impl Scheduler) {
        self.schedule.release(sched);
        self.schedule.lifecycle = Lifecycle::Mounted;
        self.acquire(sched);
        tracing::debug!(
            cards = self.len(),
            mode = %self.config.transition_mode,
            autoplay = self.schedule.timer.is_some(),
            "stack mounted"
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

    /// Release every scheduled callback and end any gesture.  After this the
    /// engine ignores callbacks and input.
    pub fn dispose(&mut self, sched: &mut impl Scheduler) {
        self.schedule.release(sched);
        self.schedule.lifecycle = Lifecycle::Disposed;
        self.hovered = false;
        self.held = None;
        self.drags.clear();
        tracing::debug!("stack disposed");
    }

    /// Replace the deck.  Order and cursor reset completely.
    pub fn reseed(&mut self, items: Vec<CardItem<T>>, sched: &mut impl Scheduler) {
        if !self.accepts_input() {
            return;
        }
        self.deck = Deck::new(self.config.transition_mode, items);
        self.poses.clear();
        self.drags.clear();
        self.held = None;
        if self.schedule.is_mounted() {
            if self.len() <= 1 {
                if let Some(timer) = self.schedule.timer.take() {
                    sched.clear_interval(timer);
                }
            }
            if self.is_empty() {
                if let Some(frame) = self.schedule.frame.take() {
                    sched.cancel_frame(frame);
                }
            }
            self.acquire(sched);
        }
        tracing::debug!(cards = self.len(), "stack reseeded");
    }

    /// Swap in new options.  A transition-mode change rebuilds the deck
    /// around the current front card; the autoplay timer follows the new
    /// `autoplay` flag.  A disposed engine keeps the options for its next
    /// `mount`.
    pub fn reconfigure(&mut self, config: StackConfig, sched: &mut impl Scheduler) {
        if config.transition_mode != self.deck.mode() {
            let deck = std::mem::replace(&mut self.deck, Deck::new(config.transition_mode, Vec::new()));
            self.deck = deck.convert(config.transition_mode);
            self.poses.clear();
        }
        self.config = config;
        if self.schedule.is_mounted() {
            if let Some(timer) = self.schedule.timer.take() {
                sched.clear_interval(timer);
            }
            self.acquire(sched);
        }
        tracing::debug!(
            mode = %self.config.transition_mode,
            autoplay = self.schedule.timer.is_some(),
            "stack reconfigured"
        );
    }

    // ── scheduled callbacks ─────────────────────────────────────

    /// One animation frame.  Returns `false` for a callback this engine no
    /// longer owns.
    pub fn on_frame(&mut self, handle: FrameHandle, dt: Duration, sched: &mut impl Scheduler) -> bool {
        if !self.schedule.take_frame(handle) {
            return false;
        }
        let dt = dt.as_secs_f64();

        for drag in self.drags.values_mut() {
            drag.step(dt);
        }
        let held = self.held;
        self.drags.retain(|id, d| d.is_active() || Some(*id) == held);

        let placements = self.layout();
        let transition = self.config.transition();
        let live: HashSet<CardId> = placements.iter().map(|p| p.id).collect();
        self.poses.retain(|id, _| live.contains(id));
        for p in &placements {
            let pose = self
                .poses
                .entry(p.id)
                .or_insert_with(|| AnimatedPose::new(transition, p.pose));
            pose.retarget(p.pose);
            pose.step(dt);
        }

        if !self.is_empty() {
            self.schedule.request_frame(sched);
        }
        true
    }

    /// One autoplay tick.  Returns `true` if it advanced the deck.
    pub fn on_interval(&mut self, handle: TimerHandle) -> bool {
        if !self.schedule.owns_timer(handle) || self.len() < 2 {
            return false;
        }
        if self.config.pause_on_hover && self.hovered {
            return false;
        }
        self.advance();
        true
    }

    // ── operations ──────────────────────────────────────────────

    /// Move the front designation to the next card.
    pub fn advance(&mut self) {
        if !self.accepts_input() || self.is_empty() {
            return;
        }
        self.deck.advance();
        tracing::debug!(front = ?self.front(), "stack advanced");
    }

    /// Dismiss card `id`: to the back in stack mode, one step of the cursor
    /// in horizontal-scroll mode.
    pub fn send_to_back(&mut self, id: CardId) {
        if !self.accepts_input() || self.is_empty() {
            return;
        }
        self.deck.send_to_back(id);
        tracing::debug!(card = id, front = ?self.front(), "card sent to back");
    }

    pub fn resize(&mut self, viewport_width: f64) {
        self.viewport_width = viewport_width;
        if self.drag_disabled() {
            self.pointer_cancel();
        }
    }

    pub fn pointer_enter(&mut self) {
        if self.accepts_input() {
            self.hovered = true;
        }
    }

    pub fn pointer_leave(&mut self) {
        self.hovered = false;
    }

    /// Press on card `id`.  Only the front card can be dragged.
    pub fn pointer_down(&mut self, id: CardId, x: f64, y: f64) -> bool {
        if !self.accepts_input() || self.drag_disabled() || self.front() != Some(id) {
            return false;
        }
        let config = self.config.drag_config();
        let drag = self.drags.entry(id).or_insert_with(|| CardDrag::new(config));
        if drag.config() != &config {
            // Options changed since this card was last dragged.
            *drag = CardDrag::new(config);
        }
        if drag.begin(x, y) {
            self.held = Some(id);
            true
        } else {
            false
        }
    }

    pub fn pointer_move(&mut self, x: f64, y: f64) {
        if let Some(drag) = self.held.and_then(|id| self.drags.get_mut(&id)) {
            drag.update(x, y);
        }
    }

    /// Release the held card.  Returns `true` if the release dismissed it.
    pub fn pointer_up(&mut self, now: Instant) -> bool {
        let Some(id) = self.held.take() else {
            return false;
        };
        let outcome = match self.drags.get_mut(&id) {
            Some(drag) => drag.release(),
            None => DragOutcome::Ignored,
        };
        if outcome != DragOutcome::SendToBack {
            return false;
        }
        self.drags.remove(&id);
        self.suppress_clicks_until = Some(now + CLICK_SUPPRESS_WINDOW);
        self.send_to_back(id);
        true
    }

    /// Abandon the held gesture.  The card springs back; nothing is dismissed.
    pub fn pointer_cancel(&mut self) {
        if let Some(drag) = self.held.take().and_then(|id| self.drags.get_mut(&id)) {
            drag.cancel();
        }
    }

    /// Click on card `id`.  Returns `true` if it advanced the deck.
    pub fn click(&mut self, id: CardId, now: Instant) -> bool {
        if !self.accepts_input() || !self.click_enabled() {
            return false;
        }
        if self.suppress_clicks_until.is_some_and(|until| now < until) {
            tracing::debug!(card = id, "click swallowed after drag dismiss");
            return false;
        }
        if !self.layout().iter().any(|p| p.id == id) {
            return false;
        }
        self.send_to_back(id);
        true
    }

    // ── layout ──────────────────────────────────────────────────

    /// Target placements for the cards currently rendered.
    pub fn layout(&self) -> Vec<CardPlacement> {
        if self.config.spread_horizontal {
            spread_row(&self.deck, &self.config)
        } else {
            self.deck.current_window(&self.config)
        }
    }

    /// Cards to draw, back to front.
    pub fn cards(&self) -> Vec<CardView<'_, T>> {
        let items = self.deck.items();
        let disabled = self.drag_disabled();
        let mut views: Vec<CardView<'_, T>> = self
            .layout()
            .into_iter()
            .map(|placement| {
                let drag = self.drags.get(&placement.id);
                CardView {
                    item: &items[placement.stack_index],
                    pose: self
                        .poses
                        .get(&placement.id)
                        .map(AnimatedPose::current)
                        .unwrap_or(placement.pose),
                    drag_offset: drag.map(CardDrag::offset).unwrap_or((0.0, 0.0)),
                    tilt: drag.map(CardDrag::tilt).unwrap_or_default(),
                    draggable: !disabled && placement.focused,
                    placement,
                }
            })
            .collect();
        views.sort_by_key(|v| v.placement.z_index);
        views
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::item::intake_with_ids;
    use crate::core::schedule::testing::SpyScheduler;

    const FRAME: Duration = Duration::from_millis(16);

    /// Deck `[A, B, C, D]` back to front, ids 1..=4.
    fn abcd(mode: TransitionMode) -> StackEngine<&'static str> {
        let items = vec![
            CardItem::new(1, "A"),
            CardItem::new(2, "B"),
            CardItem::new(3, "C"),
            CardItem::new(4, "D"),
        ];
        StackEngine::new(
            StackConfig {
                transition_mode: mode,
                ..StackConfig::default()
            },
            items,
        )
    }

    fn contents(engine: &StackEngine<&'static str>) -> Vec<&'static str> {
        engine.items().iter().map(|c| c.content).collect()
    }

    #[test]
    fn advance_moves_front_to_back() {
        let mut e = abcd(TransitionMode::Stack);
        assert_eq!(e.front(), Some(4));
        e.advance();
        assert_eq!(contents(&e), vec!["D", "A", "B", "C"]);
        assert_eq!(e.front(), Some(3));
        for _ in 0..3 {
            e.advance();
        }
        assert_eq!(contents(&e), vec!["A", "B", "C", "D"]);
    }

    #[test]
    fn reorder_keeps_permutation() {
        let mut e = abcd(TransitionMode::Stack);
        let now = Instant::now();
        for step in 0..50u32 {
            match step % 3 {
                0 => e.advance(),
                1 => e.send_to_back(step % 4 + 1),
                _ => {
                    let front = e.front().unwrap();
                    e.pointer_down(front, 0.0, 0.0);
                    e.pointer_move(500.0, 0.0);
                    e.pointer_up(now);
                }
            }
            let mut ids = e.order_ids();
            ids.sort_unstable();
            assert_eq!(ids, vec![1, 2, 3, 4]);
        }
    }

    #[test]
    fn policies_agree_on_dismiss_front() {
        let mut reorder = ReorderDeck::new(abcd(TransitionMode::Stack).items().to_vec());
        reorder.dismiss_front();
        assert_eq!(reorder.front(), Some(3));

        let mut cursor = CursorDeck::new(abcd(TransitionMode::Stack).items().to_vec());
        cursor.dismiss_front();
        assert_eq!(cursor.front(), Some(3));
        assert_eq!(cursor.scroll_index(), 1);
    }

    #[test]
    fn send_to_back_preserves_relative_order() {
        let mut e = abcd(TransitionMode::Stack);
        e.send_to_back(2);
        assert_eq!(contents(&e), vec!["B", "A", "C", "D"]);
        // Unknown ids are ignored.
        e.send_to_back(99);
        assert_eq!(contents(&e), vec!["B", "A", "C", "D"]);
    }

    #[test]
    fn cursor_wraps_modulo_len() {
        let mut e = abcd(TransitionMode::HorizontalScroll);
        for _ in 0..5 {
            e.advance();
        }
        assert_eq!(e.scroll_index(), Some(1));
        // Cursor mode never reorders.
        assert_eq!(contents(&e), vec!["A", "B", "C", "D"]);
    }

    #[test]
    fn cursor_front_walks_backwards_through_order() {
        let mut e = abcd(TransitionMode::HorizontalScroll);
        assert_eq!(e.front(), Some(4));
        e.advance();
        assert_eq!(e.front(), Some(3));
    }

    #[test]
    fn cursor_dismiss_ignores_card_identity() {
        let mut e = abcd(TransitionMode::HorizontalScroll);
        e.send_to_back(1);
        assert_eq!(e.scroll_index(), Some(1));
    }

    #[test]
    fn empty_deck_is_inert() {
        let mut spy = SpyScheduler::default();
        let mut e: StackEngine<&str> = StackEngine::new(
            StackConfig {
                autoplay: true,
                ..StackConfig::default()
            },
            Vec::new(),
        );
        e.mount(&mut spy);
        e.advance();
        e.send_to_back(1);
        assert!(!e.pointer_down(1, 0.0, 0.0));
        assert!(!e.pointer_up(Instant::now()));
        assert!(e.is_empty());
        assert!(e.layout().is_empty());
        assert_eq!(spy.live_frames(), 0);
        assert_eq!(spy.live_intervals(), 0);

        let mut cursor: StackEngine<&str> = StackEngine::new(
            StackConfig {
                transition_mode: TransitionMode::HorizontalScroll,
                ..StackConfig::default()
            },
            Vec::new(),
        );
        cursor.advance();
        assert_eq!(cursor.scroll_index(), Some(0));
        assert_eq!(cursor.front(), None);
    }

    #[test]
    fn single_card_has_no_autoplay() {
        let mut spy = SpyScheduler::default();
        let mut e = StackEngine::new(
            StackConfig {
                autoplay: true,
                ..StackConfig::default()
            },
            vec![CardItem::new(1, "only")],
        );
        e.mount(&mut spy);
        assert_eq!(spy.live_intervals(), 0);
        e.advance();
        assert_eq!(e.front(), Some(1));
    }

    #[test]
    fn autoplay_advances_on_tick() {
        let mut spy = SpyScheduler::default();
        let mut e = abcd(TransitionMode::Stack);
        e.config.autoplay = true;
        e.mount(&mut spy);
        let (timer, period) = spy.intervals[0];
        assert_eq!(period, Duration::from_millis(3000));
        assert!(e.on_interval(timer));
        assert_eq!(e.front(), Some(3));
    }

    #[test]
    fn hover_pauses_autoplay() {
        let mut spy = SpyScheduler::default();
        let mut e = abcd(TransitionMode::HorizontalScroll);
        e.config.autoplay = true;
        e.config.pause_on_hover = true;
        e.mount(&mut spy);
        let timer = spy.last_interval().unwrap();

        e.pointer_enter();
        for _ in 0..5 {
            assert!(!e.on_interval(timer));
        }
        assert_eq!(e.scroll_index(), Some(0));

        e.pointer_leave();
        assert!(e.on_interval(timer));
        assert_eq!(e.scroll_index(), Some(1));
    }

    #[test]
    fn hover_without_pause_flag_keeps_playing() {
        let mut spy = SpyScheduler::default();
        let mut e = abcd(TransitionMode::Stack);
        e.config.autoplay = true;
        e.mount(&mut spy);
        e.pointer_enter();
        assert!(e.on_interval(spy.last_interval().unwrap()));
    }

    #[test]
    fn manual_advance_does_not_restart_interval() {
        let mut spy = SpyScheduler::default();
        let mut e = abcd(TransitionMode::Stack);
        e.config.autoplay = true;
        e.mount(&mut spy);
        e.advance();
        e.advance();
        assert_eq!(spy.intervals.len(), 1);
        assert!(spy.intervals_cleared.is_empty());
    }

    #[test]
    fn dispose_stops_everything() {
        let mut spy = SpyScheduler::default();
        let mut e = abcd(TransitionMode::Stack);
        e.config.autoplay = true;
        e.mount(&mut spy);
        let frame = spy.last_frame().unwrap();
        let timer = spy.last_interval().unwrap();

        e.dispose(&mut spy);
        assert_eq!(spy.live_frames(), 0);
        assert_eq!(spy.live_intervals(), 0);

        let before = e.order_ids();
        let requested = spy.frames_requested.len();
        assert!(!e.on_frame(frame, FRAME, &mut spy));
        assert!(!e.on_interval(timer));
        e.advance();
        e.pointer_enter();
        assert_eq!(e.order_ids(), before);
        assert!(!e.is_hovered());
        assert_eq!(spy.frames_requested.len(), requested);
    }

    #[test]
    fn frame_loop_reschedules_itself() {
        let mut spy = SpyScheduler::default();
        let mut e = abcd(TransitionMode::Stack);
        e.mount(&mut spy);
        for _ in 0..3 {
            let h = spy.last_frame().unwrap();
            assert!(e.on_frame(h, FRAME, &mut spy));
        }
        assert_eq!(spy.frames_requested.len(), 4);
        // The consumed handle cannot be replayed.
        assert!(!e.on_frame(FrameHandle(1), FRAME, &mut spy));
    }

    #[test]
    fn drag_dismiss_then_click_advances_once() {
        let mut e = abcd(TransitionMode::Stack);
        e.config.send_to_back_on_click = true;
        let now = Instant::now();
        assert!(e.pointer_down(4, 0.0, 0.0));
        e.pointer_move(0.0, 250.0);
        assert!(e.pointer_up(now));
        assert_eq!(e.front(), Some(3));

        // Trailing click of the same gesture is swallowed.
        assert!(!e.click(3, now + Duration::from_millis(10)));
        assert_eq!(e.front(), Some(3));

        assert!(e.click(3, now + Duration::from_millis(400)));
        assert_eq!(e.front(), Some(2));
    }

    #[test]
    fn short_drag_does_not_dismiss() {
        let mut e = abcd(TransitionMode::Stack);
        e.pointer_down(4, 0.0, 0.0);
        e.pointer_move(199.0, 0.0);
        assert!(!e.pointer_up(Instant::now()));
        assert_eq!(e.front(), Some(4));
    }

    #[test]
    fn cancelled_drag_never_dismisses() {
        let mut e = abcd(TransitionMode::Stack);
        assert!(e.pointer_down(4, 0.0, 0.0));
        e.pointer_move(320.0, 0.0);
        e.pointer_cancel();
        assert!(!e.pointer_up(Instant::now()));
        assert_eq!(e.front(), Some(4));
        assert_eq!(e.order_ids(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn drag_picks_up_new_sensitivity() {
        let mut spy = SpyScheduler::default();
        let mut e = abcd(TransitionMode::Stack);
        e.mount(&mut spy);
        e.pointer_down(4, 0.0, 0.0);
        e.pointer_move(60.0, 0.0);
        assert!(!e.pointer_up(Instant::now()));

        let touchy = StackConfig {
            sensitivity: 50.0,
            ..e.config().clone()
        };
        e.reconfigure(touchy, &mut spy);
        e.pointer_down(4, 0.0, 0.0);
        e.pointer_move(60.0, 0.0);
        assert!(e.pointer_up(Instant::now()));
        assert_eq!(e.front(), Some(3));
    }

    #[test]
    fn only_front_card_drags() {
        let mut e = abcd(TransitionMode::Stack);
        assert!(!e.pointer_down(1, 0.0, 0.0));
        assert!(e.pointer_down(4, 0.0, 0.0));
    }

    #[test]
    fn clicks_need_opt_in_or_mobile() {
        let mut e = abcd(TransitionMode::Stack);
        let now = Instant::now();
        assert!(!e.click(4, now));

        e.config.mobile_click_only = true;
        e.resize(400.0);
        assert!(e.drag_disabled());
        assert!(!e.pointer_down(4, 0.0, 0.0));
        assert!(e.click(4, now));
        assert_eq!(e.front(), Some(3));

        e.resize(1200.0);
        assert!(!e.click(3, now));
    }

    #[test]
    fn reseed_resets_order_and_cursor() {
        let mut spy = SpyScheduler::default();
        let mut e = abcd(TransitionMode::HorizontalScroll);
        e.mount(&mut spy);
        e.advance();
        e.advance();
        let fresh = intake_with_ids([(7, "x"), (8, "y"), (9, "z")]).unwrap();
        e.reseed(fresh, &mut spy);
        assert_eq!(e.scroll_index(), Some(0));
        assert_eq!(e.order_ids(), vec![9, 8, 7]);
        assert_eq!(e.front(), Some(7));
    }

    #[test]
    fn reseed_to_empty_releases_frame_loop() {
        let mut spy = SpyScheduler::default();
        let mut e = abcd(TransitionMode::Stack);
        e.config.autoplay = true;
        e.mount(&mut spy);
        e.reseed(Vec::new(), &mut spy);
        assert_eq!(spy.live_frames(), 0);
        assert_eq!(spy.live_intervals(), 0);
    }

    #[test]
    fn stack_layout_fans_out() {
        let mut e = abcd(TransitionMode::Stack);
        e.config.back_spread_px = 10.0;
        let layout = e.layout();
        let front = layout.iter().find(|p| p.focused).unwrap();
        assert_eq!(front.id, 4);
        assert_eq!(front.pose.x, 0.0);
        assert_eq!(front.pose.rotate_z, 0.0);

        let by_distance = |d: i32| layout.iter().find(|p| p.position == d).unwrap();
        assert_eq!(by_distance(1).pose.x, 10.0);
        assert_eq!(by_distance(2).pose.x, -20.0);
        assert_eq!(by_distance(3).pose.x, 30.0);
        assert_eq!(by_distance(3).pose.rotate_z, 12.0);
        assert!(by_distance(3).pose.scale < by_distance(1).pose.scale);
    }

    #[test]
    fn jitter_is_stable_across_layouts() {
        let mut e = abcd(TransitionMode::Stack);
        e.config.random_rotation = true;
        let first = e.layout();
        let again = e.layout();
        assert_eq!(first, again);
        let front = first.iter().find(|p| p.focused).unwrap();
        assert_eq!(front.pose.rotate_z, stable_random_rotate(4));
    }

    #[test]
    fn cursor_window_is_bounded_and_unique() {
        let items = (1..=40).map(|id| CardItem::new(id, ())).collect();
        let e = StackEngine::new(
            StackConfig {
                transition_mode: TransitionMode::HorizontalScroll,
                ..StackConfig::default()
            },
            items,
        );
        let layout = e.layout();
        assert_eq!(layout.len(), (2 * VISIBLE_RANGE + 1) as usize);
        let ids: HashSet<_> = layout.iter().map(|p| p.id).collect();
        assert_eq!(ids.len(), layout.len());
        for p in &layout {
            assert!(p.pose.scale >= 0.65 - 1e-9);
        }
        let front = layout.iter().find(|p| p.position == 0).unwrap();
        assert_eq!(front.pose.scale, 1.0);
        assert_eq!(front.z_index, 40);
    }

    #[test]
    fn cursor_window_small_deck_places_each_card_once() {
        let e = abcd(TransitionMode::HorizontalScroll);
        let layout = e.layout();
        assert_eq!(layout.len(), 4);
        let positions: Vec<_> = layout.iter().map(|p| p.position).collect();
        assert_eq!(positions, vec![-1, 0, 1, 2]);
    }

    #[test]
    fn cursor_window_offsets() {
        let mut e = abcd(TransitionMode::HorizontalScroll);
        e.config.back_spread_px = 5.0;
        let layout = e.layout();
        let at = |p: i32| layout.iter().find(|c| c.position == p).unwrap().pose;
        assert_eq!(at(0).x, 0.0);
        assert!((at(1).x - (0.8 * 208.0 - 5.0)).abs() < 1e-9);
        assert!((at(2).x - (1.45 * 208.0 - 5.0)).abs() < 1e-9);
        assert!((at(-1).x - (-0.8 * 208.0 + 5.0)).abs() < 1e-9);
        assert!((at(1).scale - 0.77).abs() < 1e-9);
        assert!((at(2).scale - 0.65).abs() < 1e-9);
    }

    #[test]
    fn spread_row_is_centred() {
        let mut e = abcd(TransitionMode::Stack);
        e.config.spread_horizontal = true;
        let xs: Vec<f64> = e.layout().iter().map(|p| p.pose.x).collect();
        assert_eq!(xs, vec![-162.0, -54.0, 54.0, 162.0]);
    }

    #[test]
    fn frames_animate_toward_new_layout() {
        let mut spy = SpyScheduler::default();
        let mut e = abcd(TransitionMode::Stack);
        e.mount(&mut spy);
        let h = spy.last_frame().unwrap();
        e.on_frame(h, FRAME, &mut spy);
        e.advance();

        let h = spy.last_frame().unwrap();
        e.on_frame(h, FRAME, &mut spy);
        let new_front = e.cards().into_iter().find(|v| v.item.id == 3).unwrap();
        // Moving from one step back (4°) toward the front (0°).
        assert!(new_front.pose.rotate_z > 0.0 && new_front.pose.rotate_z < 4.0);

        for _ in 0..600 {
            let h = spy.last_frame().unwrap();
            e.on_frame(h, FRAME, &mut spy);
        }
        let settled = e.cards().into_iter().find(|v| v.item.id == 3).unwrap();
        assert_eq!(settled.pose, settled.placement.pose);
    }

    #[test]
    fn cards_paint_back_to_front() {
        let e = abcd(TransitionMode::Stack);
        let ids: Vec<_> = e.cards().iter().map(|v| v.item.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
        assert!(e.cards().last().unwrap().draggable);
    }

    #[test]
    fn reconfigure_switches_policy_around_front() {
        let mut spy = SpyScheduler::default();
        let mut e = abcd(TransitionMode::HorizontalScroll);
        e.mount(&mut spy);
        e.advance();
        assert_eq!(e.front(), Some(3));

        let stack = StackConfig {
            transition_mode: TransitionMode::Stack,
            ..e.config().clone()
        };
        e.reconfigure(stack, &mut spy);
        assert_eq!(e.scroll_index(), None);
        assert_eq!(e.front(), Some(3));
        assert_eq!(contents(&e), vec!["D", "A", "B", "C"]);

        let cursor = StackConfig {
            transition_mode: TransitionMode::HorizontalScroll,
            ..e.config().clone()
        };
        e.reconfigure(cursor, &mut spy);
        assert_eq!(e.front(), Some(3));
        assert_eq!(e.scroll_index(), Some(0));
    }

    #[test]
    fn reconfigure_toggles_autoplay_timer() {
        let mut spy = SpyScheduler::default();
        let mut e = abcd(TransitionMode::Stack);
        e.mount(&mut spy);
        assert_eq!(spy.live_intervals(), 0);

        let on = StackConfig {
            autoplay: true,
            ..e.config().clone()
        };
        e.reconfigure(on, &mut spy);
        assert_eq!(spy.live_intervals(), 1);
        let timer = spy.last_interval().unwrap();
        assert!(e.on_interval(timer));

        let off = StackConfig {
            autoplay: false,
            ..e.config().clone()
        };
        e.reconfigure(off, &mut spy);
        assert_eq!(spy.live_intervals(), 0);
        assert!(!e.on_interval(timer));
        assert_eq!(spy.live_frames(), 1);
    }

    #[test]
    fn reconfigure_while_disposed_applies_on_mount() {
        let mut spy = SpyScheduler::default();
        let mut e = abcd(TransitionMode::Stack);
        e.mount(&mut spy);
        e.dispose(&mut spy);

        let on = StackConfig {
            autoplay: true,
            ..e.config().clone()
        };
        e.reconfigure(on, &mut spy);
        assert!(e.config().autoplay);
        assert!(spy.intervals.is_empty());

        e.mount(&mut spy);
        assert_eq!(spy.live_intervals(), 1);
    }

    #[test]
    fn transition_mode_parses() {
        assert_eq!("stack".parse(), Ok(TransitionMode::Stack));
        assert_eq!(
            "horizontalScroll".parse(),
            Ok(TransitionMode::HorizontalScroll)
        );
        assert_eq!(
            "horizontal-scroll".parse(),
            Ok(TransitionMode::HorizontalScroll)
        );
        assert!("carousel".parse::<TransitionMode>().is_err());
    }
}
