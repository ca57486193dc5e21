//! Host-side parameter marshalling for networked servo-motor nodes.
//!
//! Each node on a multi-drop channel exposes banks of fixed-point
//! registers. This crate carries the host's view of them: static
//! per-class descriptor tables, the raw codec, unit converters into
//! engineering units, a per-node value cache and the orchestrated
//! Get/Set paths over a caller-supplied [`Transport`].
//!
//! Typical flow: open a channel, create a [`NetworkRegistry`] for it,
//! then identify each node with [`ParamAccess::setup_node`]. After that
//! [`ParamAccess::get`] and [`ParamAccess::set`] move values in
//! engineering units, hiding the wire widths, scales, firmware quirks
//! and dependency parameters behind the descriptor tables.

mod access;
mod cache;
pub mod codec;
mod convert;
pub mod descriptor;
mod firmware;
mod node;
mod types;

pub use access::{ParamAccess, ParameterInfo, Transport};
pub use cache::{CachedValue, ParameterBank};
pub use convert::{Converter, Direction, TestPoint, RAS_PRESETS};
pub use descriptor::{NodeClass, ParameterDescriptor};
pub use firmware::{
    supports, threshold, FirmwareVersion, Milestone, MilestoneEntry, Platform,
    ADVANCED_MILESTONES, COMPACT_MILESTONES,
};
pub use node::{
    ChangeCallback, ChangeEvent, FactoryDefault, MonitorState, NetworkRegistry, NodeRecord,
    SeedKind, ADVANCED_FACTORY_DEFAULTS, COMPACT_FACTORY_DEFAULTS,
};
pub use types::{
    node_addr, param, AccessClass, Error, IntoNodeAddress, NodeAddress, ParameterAddress,
    RawValue, SignPolicy, UnitKind, MAX_BANKS, MAX_NODES,
};
