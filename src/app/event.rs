//! Terminal event pump.
//!
//! A background task polls crossterm and forwards what the gallery cares
//! about over a channel.  When the terminal is quiet for one frame period it
//! sends a `Tick` instead, which drives the animation clock.

use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyEvent, MouseEvent};
use tokio::sync::mpsc;

/// High-level events consumed by the application.
#[derive(Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Mouse(MouseEvent),
    Resize(u16, u16),
    /// The terminal lost focus; treated as the pointer leaving.
    FocusLost,
    Tick,
}

impl AppEvent {
    fn from_crossterm(ev: CtEvent) -> Option<Self> {
        match ev {
            CtEvent::Key(k) => Some(AppEvent::Key(k)),
            CtEvent::Mouse(m) => Some(AppEvent::Mouse(m)),
            CtEvent::Resize(w, h) => Some(AppEvent::Resize(w, h)),
            CtEvent::FocusLost => Some(AppEvent::FocusLost),
            _ => None,
        }
    }
}

/// Spawn the pump.  `tick_rate` is normally the frame period.
pub fn spawn_event_reader(tick_rate: Duration) -> mpsc::UnboundedReceiver<AppEvent> {
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        loop {
            let next = match event::poll(tick_rate) {
                Ok(true) => match event::read() {
                    Ok(ev) => AppEvent::from_crossterm(ev),
                    Err(err) => {
                        tracing::warn!(%err, "terminal read failed");
                        None
                    }
                },
                Ok(false) => Some(AppEvent::Tick),
                Err(err) => {
                    tracing::warn!(%err, "terminal poll failed");
                    Some(AppEvent::Tick)
                }
            };
            if let Some(ev) = next {
                if tx.send(ev).is_err() {
                    break; // receiver dropped
                }
            }
        }
    });

    rx
}
