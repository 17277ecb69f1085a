//! UI / rendering layer: everything that touches Ratatui widgets.
//!
//! This layer turns engine layouts into cells on the terminal.  No
//! filesystem I/O happens here.

pub mod card;
pub mod circular_view;
pub mod layout;
pub mod popup;
pub mod stack_view;
pub mod theme;
