//! Huella - Pure Rust execution-event tracer
//!
//! This library formats call/return events from a scripting runtime as an
//! indented text trace showing call-stack depth, with pluggable filtering,
//! script-name resolution for placeholder locations, and auto-instrumentation
//! of designated methods.

pub mod cli;
pub mod config;
pub mod event;
pub mod filter;
pub mod formatter;
pub mod instrument;
pub mod replay;
pub mod resolver;
pub mod session;
