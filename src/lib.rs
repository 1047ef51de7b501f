//! Calendar core for `daygrid`: date-keyed events with write-through
//! storage, filtering, import/export and cached weather forecasts.
//!
//! The terminal front end in `main.rs` is one consumer of this library.

pub mod calendar;
pub mod config;
pub mod error;
pub mod logging;
pub mod storage;
pub mod theme;
pub mod weather;
