//! cachebench: a multi-threaded benchmark harness for pluggable cache
//! backends.
//!
//! See `DESIGN.md` for internal architecture and decisions.

pub mod backend;
pub mod config;
pub mod driver;
pub mod error;
pub mod generator;
pub mod payload;
pub mod prelude;
pub mod report;
pub mod trace;
