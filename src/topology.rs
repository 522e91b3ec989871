//! Host topology interface and device node model
//!
//! Discovery builds fully-detached [`DeviceNode`] values and hands each one
//! to the host tree through a single [`HostTopology::insert`] call that
//! takes ownership. [`SystemTopology`] is a concrete arena-backed tree used
//! by the CLI and by tests; a real host can implement [`HostTopology`] over
//! its own structure.

use crate::domain::BusAddress;
use serde::{Deserialize, Serialize};

/// Identifier of a node inside a host topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub usize);

/// Whether a node represents a root device or a subdevice partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    /// Top-level accelerator device
    Root,
    /// Vendor-defined partition of a root device
    Sub,
}

/// A synthesized accelerator node.
///
/// Attributes are an ordered key/value list; insertion order is preserved
/// and a key never repeats within one node. Subdevice children only ever
/// hang off root nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceNode {
    /// Unique name within one discovery run (`accel<seq>` or
    /// `accel<seq>.<subidx>`)
    pub name: String,
    /// Root or subdevice
    pub kind: NodeKind,
    /// Subtype marker
    pub subtype: String,
    attrs: Vec<(String, String)>,
    /// Subdevice children (roots only)
    pub children: Vec<DeviceNode>,
}

impl DeviceNode {
    /// Create a detached node with the backend subtype marker.
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            subtype: "LevelZero".to_string(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Append an attribute, preserving insertion order.
    pub fn add_attr(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        debug_assert!(
            self.attr(&key).is_none(),
            "duplicate attribute key {key} on node {}",
            self.name
        );
        self.attrs.push((key, value.into()));
    }

    /// Look up an attribute by key.
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// All attributes in insertion order.
    pub fn attrs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attrs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Interface the host topology exposes to discovery.
pub trait HostTopology {
    /// Whether accelerator-class nodes are kept at all. When false,
    /// discovery returns before touching the vendor API.
    fn keeps_accelerator_nodes(&self) -> bool;

    /// Look up the bus-peripheral node a previous bus scan placed at
    /// `address`.
    fn find_bus_peripheral(&self, address: &BusAddress) -> Option<NodeId>;

    /// Record a derived link speed (GB/s) on a bus-peripheral node.
    fn set_link_speed(&mut self, node: NodeId, gbps: f32);

    /// The attachment fallback when no bus peripheral matches.
    fn root(&self) -> NodeId;

    /// Insert `node` under `parent`, taking ownership.
    fn insert(&mut self, parent: NodeId, node: DeviceNode) -> NodeId;
}

/// A discovered accelerator with its resolved attachment point.
#[derive(Debug, Clone, Copy)]
pub struct Attachment<'a> {
    /// Bus address of the parent peripheral, when one matched
    pub bus: Option<&'a BusAddress>,
    /// The inserted root node
    pub node: &'a DeviceNode,
}

#[derive(Debug, Clone, PartialEq)]
enum Payload {
    Root,
    BusPeripheral {
        address: BusAddress,
        link_speed_gbps: Option<f32>,
    },
    Accel(DeviceNode),
}

#[derive(Debug, Clone)]
struct Entry {
    parent: Option<NodeId>,
    payload: Payload,
}

/// Arena-backed system topology tree.
///
/// Seed it with the bus peripherals an earlier scan found, then hand it to
/// discovery.
#[derive(Debug, Clone)]
pub struct SystemTopology {
    entries: Vec<Entry>,
    keep_accelerators: bool,
}

impl SystemTopology {
    /// Create a tree holding only the machine root.
    pub fn new() -> Self {
        Self {
            entries: vec![Entry {
                parent: None,
                payload: Payload::Root,
            }],
            keep_accelerators: true,
        }
    }

    /// Configure whether accelerator nodes are kept (the type filter).
    pub fn with_accelerator_filter(mut self, keep: bool) -> Self {
        self.keep_accelerators = keep;
        self
    }

    /// Seed a bus-peripheral node under the machine root.
    pub fn add_bus_peripheral(&mut self, address: BusAddress) -> NodeId {
        let id = NodeId(self.entries.len());
        self.entries.push(Entry {
            parent: Some(self.root()),
            payload: Payload::BusPeripheral {
                address,
                link_speed_gbps: None,
            },
        });
        id
    }

    /// Link speed recorded on a bus-peripheral node, if any.
    pub fn link_speed(&self, node: NodeId) -> Option<f32> {
        match self.entries.get(node.0)?.payload {
            Payload::BusPeripheral {
                link_speed_gbps, ..
            } => link_speed_gbps,
            _ => None,
        }
    }

    /// The accelerator node stored at `node`, if it is one.
    pub fn accel_node(&self, node: NodeId) -> Option<&DeviceNode> {
        match &self.entries.get(node.0)?.payload {
            Payload::Accel(dev) => Some(dev),
            _ => None,
        }
    }

    /// All inserted accelerator roots with their attachment points, in
    /// insertion order.
    pub fn accelerators(&self) -> impl Iterator<Item = Attachment<'_>> {
        self.entries.iter().filter_map(|entry| match &entry.payload {
            Payload::Accel(node) => {
                let bus = entry.parent.and_then(|p| match &self.entries[p.0].payload {
                    Payload::BusPeripheral { address, .. } => Some(address),
                    _ => None,
                });
                Some(Attachment { bus, node })
            }
            _ => None,
        })
    }
}

impl Default for SystemTopology {
    fn default() -> Self {
        Self::new()
    }
}

impl HostTopology for SystemTopology {
    fn keeps_accelerator_nodes(&self) -> bool {
        self.keep_accelerators
    }

    fn find_bus_peripheral(&self, address: &BusAddress) -> Option<NodeId> {
        self.entries.iter().position(|entry| {
            matches!(&entry.payload, Payload::BusPeripheral { address: a, .. } if a == address)
        }).map(NodeId)
    }

    fn set_link_speed(&mut self, node: NodeId, gbps: f32) {
        if let Some(entry) = self.entries.get_mut(node.0) {
            if let Payload::BusPeripheral {
                link_speed_gbps, ..
            } = &mut entry.payload
            {
                *link_speed_gbps = Some(gbps);
            }
        }
    }

    fn root(&self) -> NodeId {
        NodeId(0)
    }

    fn insert(&mut self, parent: NodeId, node: DeviceNode) -> NodeId {
        let id = NodeId(self.entries.len());
        self.entries.push(Entry {
            parent: Some(parent),
            payload: Payload::Accel(node),
        });
        id
    }
}
