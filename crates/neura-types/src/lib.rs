//! Shared types for the Neura chat client.

mod context;
mod model;
mod ollama;
mod turn;

pub use context::*;
pub use model::*;
pub use ollama::*;
pub use turn::*;
