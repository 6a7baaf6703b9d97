//! Shared utilities for Hiroba.
//!
//! - `logger`: tracing subscriber setup
//! - `time`: clock abstraction and timestamp formatting
//! - `sanitize`: strict markup stripping for user-supplied text

pub mod logger;
pub mod sanitize;
pub mod time;
