//! `ideo_stack` – interactive card galleries without a renderer.
//!
//! Two engines live in [`core`]:
//!
//! * [`core::stack::StackEngine`] – a finite deck whose front card can be
//!   dragged away, clicked or auto-advanced, in either the classic *stack*
//!   mode or the cursor-based *horizontal scroll* mode.
//! * [`core::circular::CircularScrollEngine`] – an endless strip bent onto an
//!   arc, moved by wheel, drag and autoplay.
//!
//! Both produce plain layout data (poses, z-order, slot geometry) that any
//! front end can draw.  The `ideo-stack` binary is one such front end.

pub mod core;
