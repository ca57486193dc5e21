//! Node records and the per-channel [`NetworkRegistry`].
//!
//! The registry owns every identified node on one network channel. It
//! replaces any notion of ambient global inventory: the orchestrator
//! receives it by reference and nothing in this crate touches shared
//! static state.

use std::sync::Arc;

use log::debug;

use crate::cache::ParameterBank;
use crate::convert::TestPoint;
use crate::descriptor::NodeClass;
use crate::firmware::{FirmwareVersion, Platform};
use crate::types::{
    BankRangeSnafu, Error, NodeAddress, ParamRangeSnafu, ParameterAddress, MAX_NODES,
};
use snafu::OptionExt;

/// Monitor-port state a node carries between gain conversions.
///
/// The gain converter both returns a value and persists the resulting
/// display scale here; keeping the slot explicit keeps that side effect
/// visible.
#[derive(Debug, Clone)]
pub struct MonitorState {
    /// Currently monitored test point.
    pub test_point: TestPoint,
    /// Full-scale display range last computed by the gain converter.
    pub full_scale: f64,
    /// True once `full_scale` reflects the current gain.
    pub set: bool,
}

impl Default for MonitorState {
    fn default() -> Self {
        Self {
            test_point: TestPoint::VelMeas,
            full_scale: 0.,
            set: false,
        }
    }
}

/// A parameter-change notification.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ChangeEvent {
    /// Network channel number.
    pub channel: u8,
    /// Node the parameter lives on.
    pub node: NodeAddress,
    /// The parameter that changed.
    pub param: ParameterAddress,
    /// Its new engineering value.
    pub value: f64,
}

/// Per-class change-notification callback, invoked synchronously inside
/// Get/Set before they return. Must not re-enter parameter access for
/// the same parameter on the same node.
pub type ChangeCallback = Arc<dyn Fn(ChangeEvent) + Send + Sync>;

/// One identified node: its class binding, bank storage and extension
/// state.
pub struct NodeRecord {
    class: NodeClass,
    banks: Vec<ParameterBank>,
    pub(crate) fw_version: FirmwareVersion,
    pub(crate) platform: Platform,
    pub(crate) monitor: MonitorState,
}

impl NodeRecord {
    pub(crate) fn new(
        class: NodeClass,
        fw_version: FirmwareVersion,
        platform: Platform,
    ) -> Self {
        Self {
            class,
            banks: class.banks().iter().map(|t| ParameterBank::new(t)).collect(),
            fw_version,
            platform,
            monitor: MonitorState::default(),
        }
    }

    /// The node's class.
    pub fn class(&self) -> NodeClass {
        self.class
    }

    /// Firmware version read at identification time.
    pub fn firmware(&self) -> FirmwareVersion {
        self.fw_version
    }

    /// Hardware platform derived at identification time.
    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Number of banks allocated for this node.
    pub fn bank_count(&self) -> usize {
        self.banks.len()
    }

    /// Monitor-port state.
    pub fn monitor(&self) -> &MonitorState {
        &self.monitor
    }

    /// The bank's descriptor table and cached slots.
    pub fn bank(&self, bank: u8) -> Result<&ParameterBank, Error> {
        self.banks
            .get(bank as usize)
            .context(BankRangeSnafu { bank })
    }

    pub(crate) fn bank_mut(&mut self, bank: u8) -> Result<&mut ParameterBank, Error> {
        self.banks
            .get_mut(bank as usize)
            .context(BankRangeSnafu { bank })
    }

    fn invalidate(&mut self) {
        for bank in &mut self.banks {
            bank.invalidate();
        }
    }
}

/// Which parameters a factory-default row seeds.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SeedKind {
    /// RAM working copy only.
    Ram,
    /// Non-volatile parameter.
    NonVolatile,
    /// Non-volatile, read back after writing.
    NonVolatileVerified,
}

/// One factory-default seeding row, applied at node setup when the
/// node's firmware and platform match and the parameter is still
/// unconfigured.
pub struct FactoryDefault {
    /// How the value is seeded.
    pub kind: SeedKind,
    /// The parameter to seed.
    pub param: ParameterAddress,
    /// Default engineering value.
    pub value: f64,
    /// First firmware version the row applies to.
    pub min_version: FirmwareVersion,
    /// Hardware platform the row applies to.
    pub platform: Platform,
}

const fn seed(
    kind: SeedKind,
    param: ParameterAddress,
    value: f64,
    min_version: u16,
    platform: Platform,
) -> FactoryDefault {
    FactoryDefault {
        kind,
        param,
        value,
        min_version: FirmwareVersion::from_raw(min_version),
        platform,
    }
}

use crate::descriptor::{app_param, core_param, drive_param};
use crate::types::param;

/// Factory defaults of the compact class.
#[rustfmt::skip]
pub static COMPACT_FACTORY_DEFAULTS: &[FactoryDefault] = &[
    seed(SeedKind::NonVolatileVerified, param(0, core_param::HW_CONFIG_REG), 1., 0, Platform::Standard),
    seed(SeedKind::NonVolatileVerified, param(0, core_param::HW_CONFIG_REG), 257., 0, Platform::HighVoltage),
    seed(SeedKind::NonVolatile, param(0, core_param::VEL_LIM), 100_000., 0, Platform::Any),
    seed(SeedKind::NonVolatile, param(0, core_param::ACC_LIM), 1_000_000., 0, Platform::Any),
    seed(SeedKind::NonVolatile, param(0, core_param::STOP_DECEL), 2_000_000., 0, Platform::Any),
    seed(SeedKind::NonVolatile, param(1, drive_param::RMS_SLOW_TC), 2., 0x1601, Platform::Any),
    seed(SeedKind::NonVolatile, param(2, app_param::A_START), 5., 0, Platform::Any),
    seed(SeedKind::Ram, param(0, core_param::IN_RANGE_WIN), 100., 0, Platform::Any),
];

/// Factory defaults of the advanced class.
#[rustfmt::skip]
pub static ADVANCED_FACTORY_DEFAULTS: &[FactoryDefault] = &[
    seed(SeedKind::NonVolatileVerified, param(0, core_param::HW_CONFIG_REG), 1., 0, Platform::Any),
    seed(SeedKind::NonVolatile, param(0, core_param::VEL_LIM), 50_000., 0, Platform::Any),
    seed(SeedKind::NonVolatile, param(0, core_param::ACC_LIM), 500_000., 0, Platform::Any),
];

pub(crate) fn factory_defaults(class: NodeClass) -> &'static [FactoryDefault] {
    match class {
        NodeClass::Compact => COMPACT_FACTORY_DEFAULTS,
        NodeClass::Advanced => ADVANCED_FACTORY_DEFAULTS,
    }
}

/// All identified nodes on one network channel, plus the per-class
/// change callbacks.
///
/// Created when the channel opens, dropped when it closes. Passed by
/// reference into [`ParamAccess`](crate::ParamAccess).
pub struct NetworkRegistry {
    channel: u8,
    nodes: [Option<NodeRecord>; MAX_NODES],
    compact_callback: Option<ChangeCallback>,
    advanced_callback: Option<ChangeCallback>,
}

impl NetworkRegistry {
    /// Create an empty registry for `channel`.
    pub fn new(channel: u8) -> Self {
        Self {
            channel,
            nodes: Default::default(),
            compact_callback: None,
            advanced_callback: None,
        }
    }

    /// The channel number this registry serves.
    pub fn channel(&self) -> u8 {
        self.channel
    }

    /// The record for `node`, if it has been identified.
    pub fn node(&self, node: NodeAddress) -> Option<&NodeRecord> {
        self.nodes[node.index()].as_ref()
    }

    pub(crate) fn node_mut(&mut self, node: NodeAddress) -> Option<&mut NodeRecord> {
        self.nodes[node.index()].as_mut()
    }

    pub(crate) fn install(&mut self, node: NodeAddress, record: NodeRecord) {
        self.nodes[node.index()] = Some(record);
    }

    /// Free a node's banks and extension state. Idempotent: tearing
    /// down an unknown node is a no-op.
    pub fn teardown_node(&mut self, node: NodeAddress) {
        if self.nodes[node.index()].take().is_some() {
            debug!("channel {}: node {} torn down", self.channel, *node);
        }
    }

    /// Register the change callback for a node class, returning the
    /// previous one.
    pub fn register_change_callback(
        &mut self,
        class: NodeClass,
        callback: ChangeCallback,
    ) -> Option<ChangeCallback> {
        let slot = match class {
            NodeClass::Compact => &mut self.compact_callback,
            NodeClass::Advanced => &mut self.advanced_callback,
        };
        slot.replace(callback)
    }

    pub(crate) fn callback_for(&self, class: NodeClass) -> Option<ChangeCallback> {
        match class {
            NodeClass::Compact => self.compact_callback.clone(),
            NodeClass::Advanced => self.advanced_callback.clone(),
        }
    }

    /// Invalidate every cached value of every node on the channel.
    pub fn invalidate_all(&mut self) {
        for record in self.nodes.iter_mut().flatten() {
            record.invalidate();
        }
    }

    /// Invalidate every cached value of one node.
    pub fn invalidate_node(&mut self, node: NodeAddress) -> Result<(), Error> {
        let record = self
            .node_mut(node)
            .ok_or(Error::NotInitialized)?;
        record.invalidate();
        Ok(())
    }

    /// Invalidate one cached parameter, with full range checking.
    pub fn invalidate_param(
        &mut self,
        node: NodeAddress,
        param: ParameterAddress,
    ) -> Result<(), Error> {
        let record = self
            .node_mut(node)
            .ok_or(Error::NotInitialized)?;
        let bank = record.bank_mut(param.bank())?;
        let slot = bank.slot_mut(param.index()).context(ParamRangeSnafu {
            index: param.index(),
        })?;
        slot.invalidate();
        Ok(())
    }

    /// Select the monitor-port test point for a node. The next gain
    /// conversion dispatches on it.
    pub fn select_monitor_source(
        &mut self,
        node: NodeAddress,
        test_point: TestPoint,
    ) -> Result<(), Error> {
        let record = self
            .node_mut(node)
            .ok_or(Error::NotInitialized)?;
        record.monitor.test_point = test_point;
        record.monitor.set = false;
        Ok(())
    }
}
