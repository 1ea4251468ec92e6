//! Shared types for the image studio.

mod generation;
mod project;

pub use generation::*;
pub use project::*;
