//! Configuration for the stamp engine
//!
//! Settings are layered: built-in defaults, then an optional JSON config
//! file, then `STAMP_*` environment variables, then explicit overrides from
//! the caller. The layer that last touched a setting is kept alongside it.

pub mod config;
pub mod loader;


pub use config::*;
pub use loader::*;
