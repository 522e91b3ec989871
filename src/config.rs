//! Discovery configuration
//!
//! Exactly two environment switches control discovery:
//!
//! - `ZES_ENABLE_SYSMAN` requests early activation of the vendor's
//!   management (sysman) subsystem. It must be set before the runtime
//!   initializes; reading it here is best-effort and only affects how
//!   later diagnostics are worded, never whether discovery runs.
//! - `ZETOPO_MEMORY_SOURCE` overrides automatic memory-source selection.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Vendor environment switch requesting sysman device creation.
pub const ENV_ENABLE_SYSMAN: &str = "ZES_ENABLE_SYSMAN";

/// Override for automatic memory-source selection.
pub const ENV_MEMORY_SOURCE: &str = "ZETOPO_MEMORY_SOURCE";

/// How the memory inventory source is chosen.
///
/// Default is automatic: probe the detailed (sysman) source once and fall
/// back to the basic (core API) source if it errors out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MemorySourceOverride {
    /// Automatic, detailed preferred
    #[default]
    Auto,
    /// Force the basic per-domain source
    Basic,
    /// Force the detailed per-module source
    Detailed,
    /// Force the basic source and keep the integrated-silicon "DDR" domain
    /// that is normally skipped (it duplicates host memory)
    BasicWithDdr,
}

impl FromStr for MemorySourceOverride {
    type Err = ConfigError;

    /// Numeric aliases match the original switch: 1 = basic, 0 = detailed,
    /// 2 = basic including DDR.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "basic" | "1" => Ok(Self::Basic),
            "detailed" | "0" => Ok(Self::Detailed),
            "basic-ddr" | "basic_ddr" | "2" => Ok(Self::BasicWithDdr),
            "auto" | "" => Ok(Self::Auto),
            other => Err(ConfigError::InvalidMemorySource(other.to_string())),
        }
    }
}

impl fmt::Display for MemorySourceOverride {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => write!(f, "auto"),
            Self::Basic => write!(f, "basic"),
            Self::Detailed => write!(f, "detailed"),
            Self::BasicWithDdr => write!(f, "basic-ddr"),
        }
    }
}

/// Whether sysman activation was requested in time.
///
/// Used only to word the one-time diagnostic when extended property queries
/// fail; it never gates execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SysmanHint {
    /// The switch was already set before discovery ran
    #[default]
    Preset,
    /// The switch was unset; we set it ourselves, possibly after the
    /// runtime already initialized without sysman
    EnabledLate,
    /// The switch was explicitly set to 0
    Disabled,
}

/// Parsed discovery configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Memory-source override (default: automatic)
    pub memory_source: MemorySourceOverride,
    /// Sysman activation hint for diagnostics
    pub sysman_hint: SysmanHint,
}

impl DiscoveryConfig {
    /// Read both switches from the process environment.
    ///
    /// Reading is side-effect free. When `ZES_ENABLE_SYSMAN` is unset the
    /// late hint is recorded and discovery sets the switch itself, after
    /// the topology filter check and before the runtime initializes; if
    /// the runtime was already initialized by someone else the request
    /// comes too late and extended queries will fail (hence [`SysmanHint`]).
    pub fn from_env() -> Self {
        let sysman_hint = match std::env::var(ENV_ENABLE_SYSMAN) {
            Err(_) => SysmanHint::EnabledLate,
            Ok(v) if v.trim() == "0" => SysmanHint::Disabled,
            Ok(_) => SysmanHint::Preset,
        };

        let memory_source = match std::env::var(ENV_MEMORY_SOURCE) {
            Err(_) => MemorySourceOverride::Auto,
            Ok(v) => v.parse().unwrap_or_else(|e| {
                log::warn!("{}; falling back to automatic selection", e);
                MemorySourceOverride::Auto
            }),
        };

        Self {
            memory_source,
            sysman_hint,
        }
    }
}
