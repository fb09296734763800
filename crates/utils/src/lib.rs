//! Shared utilities for the stamp workspace
//!
//! Small building blocks used by more than one crate: atomic file
//! replacement for the history store, the memoizing cache behind merged
//! exclude rules, XDG locations and tracing setup.

pub mod atomic_file;
pub mod memo;
pub mod tracing;
pub mod xdg;

pub use atomic_file::*;
pub use memo::{canonical_set_key, MemoCache};
pub use xdg::*;
