//! Background Tasks Module
//!
//! Detached tasks spawned by the worker whose results nobody awaits.
//!
//! # Tasks
//! - Background refresh: re-fetches a cached resource and overwrites the entry

mod refresh;

pub use refresh::spawn_background_refresh;
