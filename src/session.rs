//! Per-run discovery session context
//!
//! Holds the state the original backend kept in process-wide statics: the
//! committed memory-source decision, the one-time diagnostic flags, and the
//! global device sequence counter. A session is created once per discovery
//! run and passed `&mut` into every collector; reusing one across runs
//! preserves the cached decision.

use crate::config::{DiscoveryConfig, SysmanHint};
use serde::{Deserialize, Serialize};

/// Which memory inventory source is committed for this session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MemorySource {
    /// Per-module inventory through the management API
    Detailed,
    /// Per-domain inventory through the core API
    Basic,
}

/// Mutable discovery-run state.
#[derive(Debug, Clone)]
pub struct DiscoverySession {
    config: DiscoveryConfig,
    memory_source: Option<MemorySource>,
    management_warnings: u32,
    warned_unknown_kind: bool,
    next_sequence: u32,
}

impl DiscoverySession {
    /// Create a fresh session with nothing decided yet.
    pub fn new(config: DiscoveryConfig) -> Self {
        Self {
            config,
            memory_source: None,
            management_warnings: 0,
            warned_unknown_kind: false,
            next_sequence: 0,
        }
    }

    /// The configuration this session runs under.
    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    /// Hand out the next root-device sequence number. Monotonic across all
    /// drivers, never reset.
    pub fn next_sequence(&mut self) -> u32 {
        let seq = self.next_sequence;
        self.next_sequence += 1;
        seq
    }

    /// The committed memory source, or `None` while undecided.
    pub fn memory_source(&self) -> Option<MemorySource> {
        self.memory_source
    }

    /// Commit the memory-source decision. Later calls see it through
    /// [`Self::memory_source`] and skip re-probing.
    pub fn commit_memory_source(&mut self, source: MemorySource) {
        if self.memory_source.is_none() {
            log::debug!("memory source committed to {source:?}");
            self.memory_source = Some(source);
        }
    }

    /// Emit the extended-property failure diagnostic, at most once per
    /// session, worded by the sysman activation hint.
    pub fn warn_management_failure(&mut self) {
        if self.management_warnings > 0 {
            self.management_warnings += 1;
            return;
        }
        self.management_warnings = 1;
        match self.config.sysman_hint {
            SysmanHint::EnabledLate => log::warn!(
                "management property query failed (ZES_ENABLE_SYSMAN=1 set too late?); \
                 continuing without extended attributes"
            ),
            SysmanHint::Disabled => log::warn!(
                "management property query failed (ZES_ENABLE_SYSMAN=0); \
                 continuing without extended attributes"
            ),
            SysmanHint::Preset => log::warn!(
                "management property query failed; continuing without extended attributes"
            ),
        }
    }

    /// Whether the one-time management diagnostic has been emitted.
    pub fn management_warned(&self) -> bool {
        self.management_warnings > 0
    }

    /// Number of management failures observed, emitted or not.
    pub fn management_failure_count(&self) -> u32 {
        self.management_warnings
    }

    /// Log an unrecognized device-kind value, at most once per session.
    pub fn warn_unknown_kind(&mut self, raw: u32) {
        if !self.warned_unknown_kind {
            self.warned_unknown_kind = true;
            log::warn!("unexpected device type {raw}, recording as Unknown");
        }
    }
}
