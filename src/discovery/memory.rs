//! Memory collector
//!
//! Two mutually exclusive inventory sources exist. The detailed source
//! enumerates physical modules through the management API and can attribute
//! them to subdevices in one pass over the root device. The basic source
//! enumerates named domains through the always-available core API, must be
//! invoked once per node, and on integrated silicon reports a "DDR" domain
//! that duplicates host memory.
//!
//! The source is decided at most once per session: an override wins,
//! otherwise the detailed source is probed and any error-free outcome
//! (zero modules included) commits it; an API error commits the basic
//! source. Later invocations reuse the committed decision.

use crate::config::MemorySourceOverride;
use crate::domain::{bytes_to_kb, MemoryKind};
use crate::error::ZeError;
use crate::session::{DiscoverySession, MemorySource};
use crate::topology::DeviceNode;
use crate::ze::AccelDevice;

/// Collect memory attributes for a device and all of its subdevices.
///
/// Called exactly once per root device; `sub_nodes` are the detached
/// subdevice nodes, parallel to `subdevices`.
pub fn collect<D: AccelDevice>(
    device: &D,
    root_node: &mut DeviceNode,
    is_integrated: bool,
    subdevices: &[D],
    sub_nodes: &mut [DeviceNode],
    session: &mut DiscoverySession,
) {
    let source = match session.memory_source() {
        Some(source) => source,
        None => match session.config().memory_source {
            MemorySourceOverride::Basic | MemorySourceOverride::BasicWithDdr => {
                session.commit_memory_source(MemorySource::Basic);
                MemorySource::Basic
            }
            MemorySourceOverride::Detailed => {
                session.commit_memory_source(MemorySource::Detailed);
                MemorySource::Detailed
            }
            MemorySourceOverride::Auto => {
                // The probe doubles as the first collection.
                match collect_detailed(device, root_node, sub_nodes) {
                    Ok(()) => {
                        session.commit_memory_source(MemorySource::Detailed);
                        return;
                    }
                    Err(e) => {
                        log::debug!("detailed memory probe failed ({e}), using basic source");
                        session.commit_memory_source(MemorySource::Basic);
                        MemorySource::Basic
                    }
                }
            }
        },
    };

    match source {
        MemorySource::Detailed => {
            if let Err(e) = collect_detailed(device, root_node, sub_nodes) {
                log::debug!("detailed memory query failed on {}: {e}", root_node.name);
            }
        }
        MemorySource::Basic => {
            let ignore_ddr = is_integrated
                && session.config().memory_source != MemorySourceOverride::BasicWithDdr;
            collect_basic(device, root_node, ignore_ddr);
            for (sub, sub_node) in subdevices.iter().zip(sub_nodes.iter_mut()) {
                collect_basic(sub, sub_node, ignore_ddr);
            }
        }
    }
}

/// Per-node size accumulator, keyed by normalized kind. The runtime may
/// report several same-kind modules for one node; each
/// `LevelZero<Kind>Size` attribute must still be emitted at most once.
#[derive(Clone, Copy, Default)]
struct KindTotals {
    hbm_kb: u64,
    ddr_kb: u64,
    other_kb: u64,
}

impl KindTotals {
    fn add(&mut self, kind: MemoryKind, kb: u64) {
        match kind {
            MemoryKind::Hbm => self.hbm_kb += kb,
            MemoryKind::Ddr => self.ddr_kb += kb,
            MemoryKind::Other => self.other_kb += kb,
        }
    }

    fn emit(self, node: &mut DeviceNode) {
        for (kind, kb) in [
            (MemoryKind::Hbm, self.hbm_kb),
            (MemoryKind::Ddr, self.ddr_kb),
            (MemoryKind::Other, self.other_kb),
        ] {
            if kb > 0 {
                node.add_attr(format!("LevelZero{}Size", kind.label()), kb.to_string());
            }
        }
    }
}

/// Detailed source: one enumeration over the root device covers every
/// subdevice. Errors mean the management subsystem is unavailable.
fn collect_detailed<D: AccelDevice>(
    device: &D,
    root_node: &mut DeviceNode,
    sub_nodes: &mut [DeviceNode],
) -> Result<(), ZeError> {
    let modules = device.memory_modules()?;
    log::debug!(
        "found {} memory modules on {}",
        modules.len(),
        root_node.name
    );

    let mut total_hbm_kb: u64 = 0;
    let mut total_ddr_kb: u64 = 0;
    let mut sub_totals = vec![KindTotals::default(); sub_nodes.len()];

    for (m, module) in modules.iter().enumerate() {
        let mut size = module.physical_size;
        if size == 0 {
            // The static properties sometimes omit the size; the dynamic
            // state query usually has it.
            if let Ok(state_size) = device.memory_module_state_size(m as u32) {
                log::debug!("module #{m} has zero physical size, using state size instead");
                size = state_size;
            }
        }

        let kb = bytes_to_kb(size);
        match module.kind {
            MemoryKind::Hbm => total_hbm_kb += kb,
            MemoryKind::Ddr => total_ddr_kb += kb,
            MemoryKind::Other => {}
        }

        if size == 0 {
            continue;
        }

        if module.on_subdevice {
            match sub_totals.get_mut(module.subdevice_id as usize) {
                Some(totals) => totals.add(module.kind, kb),
                // Misreported index: no per-node attribution, but the size
                // stays in the root totals above rather than vanishing.
                None => log::warn!(
                    "memory module #{m} on unexpected subdevice #{}",
                    module.subdevice_id
                ),
            }
        }
    }

    for (sub_node, totals) in sub_nodes.iter_mut().zip(sub_totals) {
        totals.emit(sub_node);
    }

    // Root totals go on last, once every subdevice has been seen.
    if total_hbm_kb > 0 {
        root_node.add_attr("LevelZeroHBMSize", total_hbm_kb.to_string());
    }
    if total_ddr_kb > 0 {
        root_node.add_attr("LevelZeroDDRSize", total_ddr_kb.to_string());
    }

    Ok(())
}

/// Basic source: per-domain sizes for a single node.
fn collect_basic<D: AccelDevice>(device: &D, node: &mut DeviceNode, ignore_ddr: bool) {
    let domains = match device.memory_domains() {
        Ok(domains) => domains,
        Err(e) => {
            log::debug!("memory domain query failed on {}: {e}", node.name);
            return;
        }
    };
    log::debug!("found {} memory domains on {}", domains.len(), node.name);

    // Same-named domains sum into one attribute, in first-seen order.
    let mut totals: Vec<(String, u64)> = Vec::new();
    for domain in &domains {
        if domain.total_size == 0 {
            continue;
        }
        // On integrated silicon the "DDR" domain is the host RAM, already
        // represented elsewhere in the topology.
        if ignore_ddr && domain.name == "DDR" {
            continue;
        }
        let label = domain.label();
        match totals.iter_mut().find(|(l, _)| l.as_str() == label) {
            Some((_, kb)) => *kb += bytes_to_kb(domain.total_size),
            None => totals.push((label.to_string(), bytes_to_kb(domain.total_size))),
        }
    }
    for (label, kb) in totals {
        node.add_attr(format!("LevelZero{label}Size"), kb.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DiscoveryConfig;
    use crate::domain::{MemoryDomain, MemoryModule};
    use crate::mock::MockAccel;
    use crate::topology::NodeKind;

    fn session() -> DiscoverySession {
        DiscoverySession::new(DiscoveryConfig::default())
    }

    fn session_with(source: MemorySourceOverride) -> DiscoverySession {
        DiscoverySession::new(DiscoveryConfig {
            memory_source: source,
            ..Default::default()
        })
    }

    fn root() -> DeviceNode {
        DeviceNode::new("accel0", NodeKind::Root)
    }

    fn sub(idx: u32) -> DeviceNode {
        DeviceNode::new(format!("accel0.{idx}"), NodeKind::Sub)
    }

    fn hbm_module(bytes: u64) -> MemoryModule {
        MemoryModule {
            kind: MemoryKind::Hbm,
            physical_size: bytes,
            on_subdevice: false,
            subdevice_id: 0,
        }
    }

    #[test]
    fn test_detailed_root_aggregate_in_kb() {
        let device = MockAccel::new().with_memory_modules(vec![hbm_module(17179869184)]);
        let mut node = root();
        collect(&device, &mut node, false, &[], &mut [], &mut session());

        assert_eq!(node.attr("LevelZeroHBMSize"), Some("16777216"));
        assert_eq!(node.attr("LevelZeroDDRSize"), None);
    }

    #[test]
    fn test_detailed_subdevice_attribution_and_totals() {
        let device = MockAccel::new().with_memory_modules(vec![
            MemoryModule {
                kind: MemoryKind::Hbm,
                physical_size: 2 << 30,
                on_subdevice: true,
                subdevice_id: 0,
            },
            MemoryModule {
                kind: MemoryKind::Hbm,
                physical_size: 2 << 30,
                on_subdevice: true,
                subdevice_id: 1,
            },
        ]);
        let subdevices = vec![MockAccel::new(), MockAccel::new()];
        let mut sub_nodes = vec![sub(0), sub(1)];
        let mut node = root();
        collect(
            &device,
            &mut node,
            false,
            &subdevices,
            &mut sub_nodes,
            &mut session(),
        );

        // 2 GiB per subdevice, 4 GiB total.
        assert_eq!(sub_nodes[0].attr("LevelZeroHBMSize"), Some("2097152"));
        assert_eq!(sub_nodes[1].attr("LevelZeroHBMSize"), Some("2097152"));
        assert_eq!(node.attr("LevelZeroHBMSize"), Some("4194304"));
    }

    #[test]
    fn test_detailed_same_kind_modules_on_one_subdevice_sum() {
        // Two HBM stacks on the same tile collapse into one attribute.
        let device = MockAccel::new().with_memory_modules(vec![
            MemoryModule {
                kind: MemoryKind::Hbm,
                physical_size: 1 << 30,
                on_subdevice: true,
                subdevice_id: 0,
            },
            MemoryModule {
                kind: MemoryKind::Hbm,
                physical_size: 1 << 30,
                on_subdevice: true,
                subdevice_id: 0,
            },
        ]);
        let subdevices = vec![MockAccel::new()];
        let mut sub_nodes = vec![sub(0)];
        let mut node = root();
        collect(
            &device,
            &mut node,
            false,
            &subdevices,
            &mut sub_nodes,
            &mut session(),
        );

        assert_eq!(sub_nodes[0].attr("LevelZeroHBMSize"), Some("2097152"));
        assert_eq!(
            sub_nodes[0].attrs().filter(|(k, _)| *k == "LevelZeroHBMSize").count(),
            1
        );
        assert_eq!(node.attr("LevelZeroHBMSize"), Some("2097152"));
    }

    #[test]
    fn test_detailed_out_of_range_subdevice_counts_in_totals_only() {
        let device = MockAccel::new().with_memory_modules(vec![MemoryModule {
            kind: MemoryKind::Hbm,
            physical_size: 1 << 30,
            on_subdevice: true,
            subdevice_id: 5,
        }]);
        let subdevices = vec![MockAccel::new(), MockAccel::new()];
        let mut sub_nodes = vec![sub(0), sub(1)];
        let mut node = root();
        collect(
            &device,
            &mut node,
            false,
            &subdevices,
            &mut sub_nodes,
            &mut session(),
        );

        assert_eq!(sub_nodes[0].attr("LevelZeroHBMSize"), None);
        assert_eq!(sub_nodes[1].attr("LevelZeroHBMSize"), None);
        assert_eq!(node.attr("LevelZeroHBMSize"), Some("1048576"));
    }

    #[test]
    fn test_detailed_zero_size_uses_state_query() {
        let device = MockAccel::new()
            .with_memory_modules(vec![hbm_module(0)])
            .with_memory_state_size(0, 1 << 30);
        let mut node = root();
        collect(&device, &mut node, false, &[], &mut [], &mut session());
        assert_eq!(node.attr("LevelZeroHBMSize"), Some("1048576"));
    }

    #[test]
    fn test_detailed_ddr_family_aggregates_under_ddr() {
        let device = MockAccel::new().with_memory_modules(vec![
            MemoryModule {
                kind: MemoryKind::Ddr,
                physical_size: 1 << 30,
                on_subdevice: false,
                subdevice_id: 0,
            },
            MemoryModule {
                kind: MemoryKind::Ddr,
                physical_size: 1 << 30,
                on_subdevice: false,
                subdevice_id: 0,
            },
        ]);
        let mut node = root();
        collect(&device, &mut node, false, &[], &mut [], &mut session());
        assert_eq!(node.attr("LevelZeroDDRSize"), Some("2097152"));
    }

    #[test]
    fn test_probe_commits_detailed_on_empty_inventory() {
        let device = MockAccel::new().with_memory_modules(vec![]);
        let mut session = session();
        let mut node = root();
        collect(&device, &mut node, false, &[], &mut [], &mut session);
        assert_eq!(session.memory_source(), Some(MemorySource::Detailed));
        assert_eq!(node.attrs().count(), 0);
    }

    #[test]
    fn test_probe_failure_commits_basic_permanently() {
        let device = MockAccel::new()
            .with_memory_modules_error(ZeError::ManagementUnavailable("no sysman".into()))
            .with_memory_domains(vec![MemoryDomain {
                name: "HBM".to_string(),
                total_size: 1 << 30,
            }]);
        let mut session = session();

        let mut node = root();
        collect(&device, &mut node, false, &[], &mut [], &mut session);
        assert_eq!(session.memory_source(), Some(MemorySource::Basic));
        assert_eq!(node.attr("LevelZeroHBMSize"), Some("1048576"));

        // Subsequent devices must not re-probe the detailed source.
        for _ in 0..5 {
            let mut node = root();
            collect(&device, &mut node, false, &[], &mut [], &mut session);
        }
        assert_eq!(device.memory_module_calls(), 1);
    }

    #[test]
    fn test_basic_invoked_per_node() {
        let domain = MemoryDomain {
            name: "HBM".to_string(),
            total_size: 1 << 30,
        };
        let device = MockAccel::new().with_memory_domains(vec![domain.clone()]);
        let subdevices = vec![
            MockAccel::new().with_memory_domains(vec![domain.clone()]),
            MockAccel::new().with_memory_domains(vec![domain]),
        ];
        let mut sub_nodes = vec![sub(0), sub(1)];
        let mut node = root();
        let mut session = session_with(MemorySourceOverride::Basic);
        collect(
            &device,
            &mut node,
            false,
            &subdevices,
            &mut sub_nodes,
            &mut session,
        );

        assert_eq!(node.attr("LevelZeroHBMSize"), Some("1048576"));
        assert_eq!(sub_nodes[0].attr("LevelZeroHBMSize"), Some("1048576"));
        assert_eq!(sub_nodes[1].attr("LevelZeroHBMSize"), Some("1048576"));
    }

    #[test]
    fn test_basic_integrated_skips_ddr_domain() {
        let device = MockAccel::new().with_memory_domains(vec![MemoryDomain {
            name: "DDR".to_string(),
            total_size: 8 << 30,
        }]);
        let mut node = root();
        let mut session = session_with(MemorySourceOverride::Basic);
        collect(&device, &mut node, true, &[], &mut [], &mut session);
        assert_eq!(node.attr("LevelZeroDDRSize"), None);
    }

    #[test]
    fn test_basic_override_keeps_integrated_ddr() {
        let device = MockAccel::new().with_memory_domains(vec![MemoryDomain {
            name: "DDR".to_string(),
            total_size: 8 << 30,
        }]);
        let mut node = root();
        let mut session = session_with(MemorySourceOverride::BasicWithDdr);
        collect(&device, &mut node, true, &[], &mut [], &mut session);
        assert_eq!(node.attr("LevelZeroDDRSize"), Some("8388608"));
    }

    #[test]
    fn test_basic_discrete_keeps_ddr_domain() {
        let device = MockAccel::new().with_memory_domains(vec![MemoryDomain {
            name: "DDR".to_string(),
            total_size: 8 << 30,
        }]);
        let mut node = root();
        let mut session = session_with(MemorySourceOverride::Basic);
        collect(&device, &mut node, false, &[], &mut [], &mut session);
        assert_eq!(node.attr("LevelZeroDDRSize"), Some("8388608"));
    }

    #[test]
    fn test_basic_same_name_domains_sum() {
        let device = MockAccel::new().with_memory_domains(vec![
            MemoryDomain {
                name: "HBM".to_string(),
                total_size: 1 << 30,
            },
            MemoryDomain {
                name: "HBM".to_string(),
                total_size: 1 << 30,
            },
        ]);
        let mut node = root();
        let mut session = session_with(MemorySourceOverride::Basic);
        collect(&device, &mut node, false, &[], &mut [], &mut session);

        assert_eq!(node.attr("LevelZeroHBMSize"), Some("2097152"));
        assert_eq!(node.attrs().count(), 1);
    }

    #[test]
    fn test_basic_skips_zero_size_and_labels_anonymous_domains() {
        let device = MockAccel::new().with_memory_domains(vec![
            MemoryDomain {
                name: "HBM".to_string(),
                total_size: 0,
            },
            MemoryDomain {
                name: String::new(),
                total_size: 1 << 30,
            },
        ]);
        let mut node = root();
        let mut session = session_with(MemorySourceOverride::Basic);
        collect(&device, &mut node, false, &[], &mut [], &mut session);

        assert_eq!(node.attr("LevelZeroHBMSize"), None);
        assert_eq!(node.attr("LevelZeroMemorySize"), Some("1048576"));
    }

    #[test]
    fn test_detailed_override_skips_probe_fallback() {
        // Forced detailed: a failing management API leaves the node bare
        // instead of falling back to the basic source.
        let device = MockAccel::new()
            .with_memory_modules_error(ZeError::ManagementUnavailable("no sysman".into()))
            .with_memory_domains(vec![MemoryDomain {
                name: "HBM".to_string(),
                total_size: 1 << 30,
            }]);
        let mut node = root();
        let mut session = session_with(MemorySourceOverride::Detailed);
        collect(&device, &mut node, false, &[], &mut [], &mut session);

        assert_eq!(session.memory_source(), Some(MemorySource::Detailed));
        assert_eq!(node.attrs().count(), 0);
    }
}
