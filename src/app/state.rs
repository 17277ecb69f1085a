//! Central application state.
//!
//! All mutable state lives here so that the rest of the app can be pure
//! functions over `&AppState` (rendering) or `&mut AppState` (event handling).

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Instant;

use ratatui::layout::Rect;

use ideo_stack::core::circular::CircularScrollEngine;
use ideo_stack::core::item::{intake, CardId};
use ideo_stack::core::stack::StackEngine;

use crate::app::gallery::GalleryCard;
use crate::app::scheduler::FrameScheduler;
use crate::config::AppConfig;
use crate::ui::card::ImageCache;
use crate::ui::circular_view::circular_frames;
use crate::ui::layout::{AppLayout, CellMetrics};

/// Which engine fills the gallery area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum GalleryView {
    #[default]
    Stack,
    Circular,
}

impl GalleryView {
    pub fn label(self) -> &'static str {
        match self {
            GalleryView::Stack => "Stack",
            GalleryView::Circular => "Circular",
        }
    }

    pub fn other(self) -> Self {
        match self {
            GalleryView::Stack => GalleryView::Circular,
            GalleryView::Circular => GalleryView::Stack,
        }
    }
}

/// Which view / overlay is currently active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActiveView {
    #[default]
    Gallery,
    SettingsMenu,
    ControlsSubmenu,
}

/// A left-button press still waiting for its release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Press {
    /// Stack card under the pointer when pressed.
    pub card: Option<CardId>,
    /// Whether the engine took the press as a drag.
    pub dragging: bool,
}

/// Top-level application state.
pub struct AppState {
    pub view: GalleryView,
    pub active_view: ActiveView,
    pub stack: StackEngine<GalleryCard>,
    pub circular: CircularScrollEngine<GalleryCard>,
    /// Host clock for both engines.
    pub scheduler: FrameScheduler,
    pub config: AppConfig,
    /// Write config changes to disk.
    pub persist: bool,
    /// Decoded thumbnails by source path.
    pub images: ImageCache,
    /// Paths handed to the decoder and not back yet, or failed for good.
    pub images_requested: HashSet<PathBuf>,
    pub terminal_area: Rect,
    pub press: Option<Press>,
    /// Pointer is over the gallery area.
    pub hovering: bool,
    /// Controls the main event loop.
    pub should_quit: bool,
    /// An optional status message shown in the bottom bar.
    pub status_message: Option<String>,
    /// Currently highlighted item in the settings menu.
    pub settings_selected: usize,
    /// Currently highlighted item in the controls submenu.
    pub controls_selected: usize,
    /// When `true`, the controls submenu is waiting for the user to press
    /// a key to rebind the action at `controls_selected`.
    pub awaiting_rebind: bool,
}

impl AppState {
    pub fn new(cards: Vec<GalleryCard>, config: AppConfig, view: GalleryView, now: Instant) -> Self {
        let stack = StackEngine::new(config.stack.clone(), intake(cards.clone()));
        let circular = CircularScrollEngine::new(config.circular.clone(), cards);
        let mut state = Self {
            view,
            active_view: ActiveView::default(),
            stack,
            circular,
            scheduler: FrameScheduler::new(config.frame_period(), now),
            config,
            persist: true,
            images: ImageCache::new(),
            images_requested: HashSet::new(),
            terminal_area: Rect::default(),
            press: None,
            hovering: false,
            should_quit: false,
            status_message: None,
            settings_selected: 0,
            controls_selected: 0,
            awaiting_rebind: false,
        };
        state.mount_active();
        state
    }

    pub fn metrics(&self) -> CellMetrics {
        CellMetrics::new(self.config.cell_width_px, self.config.cell_height_px)
    }

    pub fn layout(&self) -> AppLayout {
        AppLayout::from_area(self.terminal_area)
    }

    /// Record the terminal size and pass the gallery's pixel size on.
    pub fn set_terminal_area(&mut self, area: Rect) {
        self.terminal_area = area;
        let (w, h) = self.metrics().viewport_px(self.layout().gallery_area);
        self.stack.resize(w);
        self.circular.resize(w, h);
    }

    fn mount_active(&mut self) {
        match self.view {
            GalleryView::Stack => self.stack.mount(&mut self.scheduler),
            GalleryView::Circular => self.circular.mount(&mut self.scheduler),
        }
    }

    fn dispose_active(&mut self) {
        match self.view {
            GalleryView::Stack => self.stack.dispose(&mut self.scheduler),
            GalleryView::Circular => self.circular.dispose(&mut self.scheduler),
        }
    }

    /// Tear down the visible engine and bring up the other one.
    pub fn switch_view(&mut self) {
        self.dispose_active();
        self.press = None;
        self.view = self.view.other();
        self.mount_active();
        if self.hovering {
            self.pointer_enter();
        }
        tracing::info!(view = self.view.label(), "view switched");
    }

    pub fn pointer_enter(&mut self) {
        match self.view {
            GalleryView::Stack => self.stack.pointer_enter(),
            GalleryView::Circular => self.circular.pointer_enter(),
        }
    }

    pub fn pointer_leave(&mut self) {
        match self.view {
            GalleryView::Stack => self.stack.pointer_leave(),
            GalleryView::Circular => self.circular.pointer_leave(),
        }
    }

    /// Push the current config into both engines and the clock.
    pub fn apply_config(&mut self) {
        self.stack.reconfigure(self.config.stack.clone(), &mut self.scheduler);
        self.circular.reconfigure(self.config.circular.clone(), &mut self.scheduler);
        self.scheduler.set_frame_period(self.config.frame_period());
    }

    pub fn save_config(&mut self) {
        if !self.persist {
            return;
        }
        if let Err(err) = self.config.save() {
            tracing::warn!(%err, "could not save config");
            self.status_message = Some(format!("Config not saved: {err}"));
        }
    }

    pub fn toggle_autoplay(&mut self) {
        let on = !self.config.stack.autoplay;
        self.config.set_autoplay(on);
        self.apply_config();
        self.save_config();
        self.status_message = Some(format!("Autoplay {}", if on { "on" } else { "off" }));
    }

    /// Fire whatever the clock says is due.  Returns `true` if anything
    /// changed on screen.
    pub fn tick(&mut self, now: Instant) -> bool {
        let due = self.scheduler.take_due(now);
        let mut changed = false;
        for handle in due.frames {
            // Only the engine that requested a handle accepts it.
            changed |= self.stack.on_frame(handle, due.dt, &mut self.scheduler);
            changed |= self.circular.on_frame(handle, due.dt, &mut self.scheduler);
        }
        for handle in due.timers {
            changed |= self.stack.on_interval(handle);
            changed |= self.circular.on_interval(handle);
        }
        changed
    }

    /// Images the visible cards want that have not been requested yet.
    pub fn wanted_images(&self) -> Vec<PathBuf> {
        let wanted: Vec<&PathBuf> = match self.view {
            GalleryView::Stack => self
                .stack
                .layout()
                .iter()
                .filter(|p| p.load_image)
                .filter_map(|p| self.stack.items()[p.stack_index].content.image.as_ref())
                .collect(),
            GalleryView::Circular => {
                let area = self.layout().gallery_area;
                circular_frames(&self.circular, area, self.metrics())
                    .into_iter()
                    .filter_map(|f| f.card.image.as_ref())
                    .collect()
            }
        };
        let mut seen = HashSet::new();
        wanted
            .into_iter()
            .filter(|p| !self.images.contains_key(*p) && !self.images_requested.contains(*p))
            .filter(|p| seen.insert(*p))
            .cloned()
            .collect()
    }
}
