//! Neura CLI library - configuration, logging and the terminal surface.
//!
//! Kept separate from main.rs so the pieces can be tested without a terminal.

pub mod config;
pub mod highlight;
pub mod logging;
pub mod terminal;
