//! Headless card engines – geometry, motion, gestures, and the two decks.
//!
//! Nothing in this module depends on any TUI or rendering crate.  Engines
//! are driven entirely through method calls and a host [`schedule::Scheduler`],
//! so the same types back the terminal gallery and the unit tests.

pub mod circular;
pub mod drag;
pub mod geometry;
pub mod item;
pub mod motion;
pub mod schedule;
pub mod stack;
