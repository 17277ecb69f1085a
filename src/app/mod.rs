//! Application orchestration: state, clock, input handling and background
//! loading for the terminal gallery.

pub mod event;
pub mod gallery;
pub mod handler;
pub mod image_runtime;
pub mod scheduler;
pub mod settings;
pub mod state;
