//! zetopo - Level Zero accelerator discovery library
//!
//! This library discovers compute-accelerator devices through the Level
//! Zero API, collects descriptive and memory-capacity metadata for each
//! device and its subdevices, and grafts the resulting nodes into a host
//! system-topology tree.
//!
//! # Modules
//!
//! - [`cli`]: Command-line interface definitions
//! - [`commands`]: Command handlers
//! - [`config`]: The two environment switches
//! - [`discovery`]: The discovery controller and collectors
//! - [`domain`]: Domain models
//! - [`error`]: Error types
//! - [`session`]: Per-run discovery session context
//! - [`topology`]: Host-tree interface and device nodes
//! - [`ze`]: Level Zero abstraction layer

pub mod cli;
pub mod commands;
pub mod config;
pub mod discovery;
pub mod domain;
pub mod error;
pub mod session;
pub mod topology;
pub mod ze;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use error::{AppError, Result};
