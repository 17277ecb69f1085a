//! Terminal card gallery.
//!
//! Shows a directory of images (or generated text cards) as a draggable card
//! stack or as an endless bent strip.  Run with `--help` for options.

mod app;
mod config;
mod ui;

use std::io::{self, Stdout};
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{DisableFocusChange, DisableMouseCapture, EnableFocusChange, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, layout::Rect, widgets::Paragraph, Frame, Terminal};
use tokio::sync::mpsc;

use ideo_stack::core::stack::TransitionMode;

use crate::app::{
    event::{spawn_event_reader, AppEvent},
    gallery::{placeholder_cards, scan_images, GalleryCard},
    handler,
    image_runtime::{spawn_image_decode, ImageLoaded},
    state::{ActiveView, AppState, GalleryView},
};
use crate::ui::{circular_view::CircularView, popup, stack_view::StackView, theme::Theme};

// ───────────────────────────────────────── CLI ───────────────

#[derive(Parser, Debug)]
#[command(name = env!("CARGO_PKG_NAME"), version, about = "Card stack and circular gallery for the terminal")]
struct Cli {
    /// Directory of images to show.  Without it, text cards are generated.
    path: Option<PathBuf>,

    /// View to open with.
    #[arg(long, value_enum, default_value_t = GalleryView::Stack)]
    view: GalleryView,

    /// Stack transition mode: `stack` or `horizontal-scroll`.
    #[arg(long)]
    mode: Option<TransitionMode>,

    /// Start with autoplay on.
    #[arg(long)]
    autoplay: bool,

    /// Curvature of the circular strip, in pixels.  0 is flat.
    #[arg(long, allow_negative_numbers = true)]
    bend: Option<f64>,

    /// Number of generated cards when no directory is given.
    #[arg(long, default_value_t = 8)]
    cards: usize,

    /// How many directory levels to scan for images.
    #[arg(long, default_value_t = 1)]
    depth: usize,
}

impl Cli {
    /// Apply command-line overrides on top of the saved config.
    fn apply(&self, config: &mut config::AppConfig) {
        if let Some(mode) = self.mode {
            config.stack.transition_mode = mode;
        }
        if self.autoplay {
            config.set_autoplay(true);
        }
        if let Some(bend) = self.bend.filter(|b| b.is_finite()) {
            config.circular.bend = bend;
        }
    }

    fn load_cards(&self) -> Result<(Vec<GalleryCard>, Option<String>)> {
        let Some(root) = &self.path else {
            return Ok((placeholder_cards(self.cards), None));
        };
        let cards = scan_images(root, self.depth)
            .with_context(|| format!("scanning {} for images", root.display()))?;
        if cards.is_empty() {
            let message = format!("No images in {}", root.display());
            return Ok((placeholder_cards(self.cards), Some(message)));
        }
        Ok((cards, None))
    }
}

// ───────────────────────────────────────── terminal ──────────

/// Raw mode, alternate screen and mouse capture for as long as it lives.
struct TerminalGuard {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl TerminalGuard {
    fn enter() -> Result<Self> {
        enable_raw_mode().context("enabling raw mode")?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture, EnableFocusChange)
            .context("entering alternate screen")?;
        let terminal = Terminal::new(CrosstermBackend::new(stdout)).context("creating terminal")?;
        Ok(Self { terminal })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(
            self.terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture,
            DisableFocusChange
        );
        let _ = self.terminal.show_cursor();
    }
}

// ───────────────────────────────────────── drawing ───────────

fn draw(frame: &mut Frame, state: &AppState) {
    let layout = state.layout();
    let metrics = state.metrics();

    match state.view {
        GalleryView::Stack => frame.render_widget(
            StackView {
                engine: &state.stack,
                images: &state.images,
                metrics,
                held: state.press.filter(|p| p.dragging).and_then(|p| p.card),
            },
            layout.gallery_area,
        ),
        GalleryView::Circular => frame.render_widget(
            CircularView {
                engine: &state.circular,
                images: &state.images,
                metrics,
            },
            layout.gallery_area,
        ),
    }

    let status = match (&state.status_message, state.active_view) {
        (_, ActiveView::SettingsMenu | ActiveView::ControlsSubmenu) => String::new(),
        (Some(message), _) => format!(" {message}"),
        (None, _) => format!(" {} │ {}", view_summary(state), state.config.status_bar_hint()),
    };
    frame.render_widget(Paragraph::new(status).style(Theme::status_bar_style()), layout.status_area);

    match state.active_view {
        ActiveView::SettingsMenu => frame.render_widget(popup::SettingsPopup { state }, frame.area()),
        ActiveView::ControlsSubmenu => frame.render_widget(
            popup::ControlsPopup {
                config: &state.config,
                selected: state.controls_selected,
                awaiting_rebind: state.awaiting_rebind,
            },
            frame.area(),
        ),
        ActiveView::Gallery => {}
    }
}

fn view_summary(state: &AppState) -> String {
    let autoplay = if state.config.stack.autoplay { " · autoplay" } else { "" };
    match state.view {
        GalleryView::Stack => format!(
            "{} ({}){autoplay}",
            state.view.label(),
            state.stack.config().transition_mode.label()
        ),
        GalleryView::Circular => format!(
            "{} (bend {}){autoplay}",
            state.view.label(),
            state.circular.config().bend
        ),
    }
}

/// Start decoding every image the visible cards want.
fn request_images(state: &mut AppState, tx: &mpsc::UnboundedSender<ImageLoaded>) {
    for path in state.wanted_images() {
        state.images_requested.insert(path.clone());
        spawn_image_decode(tx.clone(), path);
    }
}

fn accept_image(state: &mut AppState, loaded: ImageLoaded) {
    match loaded.result {
        Ok(img) => {
            state.images_requested.remove(&loaded.path);
            state.images.insert(loaded.path, img);
        }
        // Stays in `images_requested` so it is not retried.
        Err(err) => tracing::warn!(path = %loaded.path.display(), %err, "image decode failed"),
    }
}

/// Route one terminal event.  Returns `false` for a tick.
fn dispatch(state: &mut AppState, event: AppEvent) -> bool {
    let now = Instant::now();
    match event {
        AppEvent::Key(k) => handler::handle_key(state, k),
        AppEvent::Mouse(m) => handler::handle_mouse(state, m, now),
        AppEvent::Resize(w, h) => state.set_terminal_area(Rect::new(0, 0, w, h)),
        AppEvent::FocusLost => handler::handle_focus_lost(state),
        AppEvent::Tick => return false,
    }
    true
}

// ───────────────────────────────────────── main ─────────────

#[tokio::main]
async fn main() -> Result<()> {
    // Silent unless RUST_LOG is set; stderr so the UI on stdout stays clean.
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let mut user_config = config::AppConfig::load();
    cli.apply(&mut user_config);
    let (cards, notice) = cli.load_cards()?;
    tracing::info!(cards = cards.len(), view = cli.view.label(), "starting gallery");

    let mut state = AppState::new(cards, user_config, cli.view, Instant::now());
    state.status_message = notice;

    let mut guard = TerminalGuard::enter()?;
    let size = guard.terminal.size().context("reading terminal size")?;
    state.set_terminal_area(Rect::new(0, 0, size.width, size.height));

    let mut events = spawn_event_reader(state.scheduler.frame_period());
    let (image_tx, mut image_rx) = mpsc::unbounded_channel::<ImageLoaded>();

    loop {
        state.tick(Instant::now());
        request_images(&mut state, &image_tx);
        guard.terminal.draw(|frame| draw(frame, &state))?;

        tokio::select! {
            biased;

            Some(event) = events.recv() => {
                dispatch(&mut state, event);
                // Coalesce a burst of mouse motion into one redraw.
                while let Ok(event) = events.try_recv() {
                    if !dispatch(&mut state, event) {
                        break;
                    }
                }
            }

            Some(loaded) = image_rx.recv() => {
                accept_image(&mut state, loaded);
                while let Ok(loaded) = image_rx.try_recv() {
                    accept_image(&mut state, loaded);
                }
            }

            else => break,
        }

        if state.should_quit {
            break;
        }
    }

    drop(guard);
    Ok(())
}
