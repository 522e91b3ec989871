//! Level Zero abstraction layer
//!
//! Provides trait-based abstractions over the Level Zero loader library
//! for testability, plus the libloading-backed real implementation.

pub mod loader;
pub mod sys;
pub mod traits;

pub use loader::{ZeDevice, ZeLoader};
pub use traits::{AccelDevice, AccelPlatform};
