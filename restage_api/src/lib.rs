//! Shared restage data models consumed by the core library and the CLI.

pub mod reconcile;
pub mod status;

pub use reconcile::*;
pub use status::*;
