//! Parameter access orchestration: the cached Get/Set paths, node
//! identification and factory-default seeding.
//!
//! [`ParamAccess`] borrows a [`NetworkRegistry`] and a [`Transport`]
//! for the duration of a call sequence. It owns no state of its own, so
//! the caller decides how registry and transport are shared between
//! threads.

use log::debug;
use snafu::{ensure, OptionExt};

use crate::codec;
use crate::convert::{Direction, TestPoint};
use crate::descriptor::{core_param, NodeClass, ParameterDescriptor};
use crate::firmware::{FirmwareVersion, Platform};
use crate::node::{factory_defaults, NetworkRegistry, NodeRecord, SeedKind};
use crate::types::{
    AccessClass, Error, NodeAddress, ParamRangeSnafu, ParameterAddress, RawValue, UnitKind,
    ValueSizeSnafu, WrongDeviceTypeSnafu,
};

/// Raw parameter transfer over one network channel.
///
/// Implementations frame and exchange the actual packets. They report
/// transport conditions through the crate [`Error`] type: `NetClosed`,
/// `Timeout`, `NodeOffline` or `CommandFailed`.
pub trait Transport {
    /// Read the raw buffer of one parameter.
    fn raw_get(&mut self, node: NodeAddress, param: ParameterAddress) -> Result<RawValue, Error>;

    /// Write a raw buffer to one parameter.
    fn raw_set(
        &mut self,
        node: NodeAddress,
        param: ParameterAddress,
        data: &[u8],
    ) -> Result<(), Error>;
}

/// Descriptor summary returned alongside a value by
/// [`ParamAccess::get_info`].
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ParameterInfo {
    /// Access-class bitmask, [`AccessClass::UNKNOWN`] for parameters
    /// outside the class tables.
    pub class: AccessClass,
    /// Physical-unit tag.
    pub unit: UnitKind,
    /// Wire width in bytes.
    pub width: usize,
    /// Fixed-point scale between raw and base units.
    pub scale: f64,
    /// Scale multiplies on decode instead of dividing.
    pub reciprocal: bool,
}

impl ParameterInfo {
    fn from_descriptor(desc: &ParameterDescriptor) -> Self {
        Self {
            class: desc.class,
            unit: desc.unit,
            width: desc.byte_count(),
            scale: desc.scale,
            reciprocal: desc.reciprocal,
        }
    }

    /// Synthetic info for a parameter outside the class tables, sized
    /// by the buffer the node actually returned.
    fn unknown(width: usize) -> Self {
        Self {
            class: AccessClass::UNKNOWN,
            unit: UnitKind::NoUnit,
            width,
            scale: 1.,
            reciprocal: false,
        }
    }
}

/// Low 32 bits of an accumulator register's engineering view.
fn bits32(v: f64) -> u32 {
    v as i64 as u32
}

/// The cached parameter access paths over one registry and transport.
pub struct ParamAccess<'a, T: Transport> {
    registry: &'a mut NetworkRegistry,
    transport: &'a mut T,
}

impl<'a, T: Transport> ParamAccess<'a, T> {
    /// Bind a registry and transport for a call sequence.
    pub fn new(registry: &'a mut NetworkRegistry, transport: &'a mut T) -> Self {
        Self {
            registry,
            transport,
        }
    }

    /// The registry this accessor works against.
    pub fn registry(&self) -> &NetworkRegistry {
        self.registry
    }

    /// Identify `node`, bind its class tables and seed factory
    /// defaults.
    ///
    /// Any previous record for the node is torn down first, so re-running
    /// setup after a node replacement starts from a cold cache.
    ///
    /// # Errors
    /// [`Error::WrongDeviceType`] if the node's device ID doesn't match
    /// `class`; transport errors propagate.
    pub fn setup_node(&mut self, node: NodeAddress, class: NodeClass) -> Result<(), Error> {
        self.registry.teardown_node(node);

        let dev_id = self.read_ident(node, core_param::DEV_ID)?;
        ensure!((dev_id >> 8) as u8 == class.device_type(), WrongDeviceTypeSnafu);

        let fw = FirmwareVersion::from_raw(self.read_ident(node, core_param::FW_VERS)?);
        let hw = self.read_ident(node, core_param::HW_VERS)?;
        let platform = if (hw >> 8) >= 1 {
            Platform::HighVoltage
        } else {
            Platform::Standard
        };

        self.registry
            .install(node, NodeRecord::new(class, fw, platform));
        debug!(
            "channel {}: node {} is {:?} fw {} on {:?}",
            self.registry.channel(),
            *node,
            class,
            fw,
            platform
        );

        self.seed_defaults(node, class, fw, platform);
        Ok(())
    }

    fn read_ident(&mut self, node: NodeAddress, index: u8) -> Result<u16, Error> {
        let raw = self.transport.raw_get(node, index.into())?;
        ensure!(raw.len() >= 2, ValueSizeSnafu);
        Ok(u16::from_le_bytes([raw[0], raw[1]]))
    }

    /// Apply the class factory-default table: rows whose firmware and
    /// platform gates pass and whose parameter still reads back as
    /// unconfigured get the default written. Individual row failures are
    /// logged and skipped, setup itself keeps going.
    fn seed_defaults(
        &mut self,
        node: NodeAddress,
        class: NodeClass,
        fw: FirmwareVersion,
        platform: Platform,
    ) {
        for row in factory_defaults(class) {
            if fw < row.min_version || !row.platform.matches(platform) {
                continue;
            }
            match self.get(node, row.param) {
                Ok(current) if current == 0. => {
                    let verify = row.kind == SeedKind::NonVolatileVerified;
                    if let Err(err) = self.set(node, row.param, row.value, verify) {
                        debug!(
                            "node {}: seeding {:?} failed: {}",
                            *node, row.param, err
                        );
                    }
                }
                Ok(_) => {}
                Err(err) => {
                    debug!(
                        "node {}: seeding read of {:?} failed: {}",
                        *node, row.param, err
                    );
                }
            }
        }
    }

    /// Read a parameter's engineering value.
    ///
    /// Cached non-real-time values are returned without touching the
    /// wire. Real-time classes, cold slots and addresses carrying the
    /// option (cache bypass) bit always read the node.
    ///
    /// # Errors
    /// [`Error::NotInitialized`] before [`setup_node`](Self::setup_node),
    /// [`Error::BankRange`] for a bank the node doesn't have; transport
    /// errors propagate and mark the slot non-existent.
    pub fn get(&mut self, node: NodeAddress, param: ParameterAddress) -> Result<f64, Error> {
        self.get_info(node, param).map(|(value, _)| value)
    }

    /// [`get`](Self::get), also returning the descriptor summary.
    pub fn get_info(
        &mut self,
        node: NodeAddress,
        param: ParameterAddress,
    ) -> Result<(f64, ParameterInfo), Error> {
        let record = self.registry.node(node).ok_or(Error::NotInitialized)?;
        let class = record.class();
        let bank = record.bank(param.bank())?;
        let index = param.index();

        if (index as usize) >= bank.len() {
            return self.get_unknown(class, node, param);
        }
        let desc = bank.descriptor(index).context(ParamRangeSnafu { index })?;

        let option = param.option();
        let (initial, cached_exists) = if option {
            // The option bit works on a scratch slot, the persistent
            // cache entry is neither consulted nor updated.
            (0., false)
        } else {
            let slot = bank.slot(index).context(ParamRangeSnafu { index })?;
            (slot.value, slot.exists)
        };

        let force = desc.class.contains(AccessClass::RT)
            || desc.class.is_none()
            || option
            || !cached_exists;

        let mut observed = initial;
        if force {
            let raw = match self.transport.raw_get(node, param) {
                Ok(raw) => raw,
                Err(err) => {
                    if !option {
                        if let Some(slot) = self.slot_mut(node, param) {
                            slot.exists = false;
                        }
                    }
                    return Err(err);
                }
            };
            let desc_for_codec = if desc.is_reserved() { None } else { Some(desc) };
            let decoded = codec::decode(desc_for_codec, &raw);
            let mut value = decoded.value;
            if let Some(conv) = desc.converter {
                // Dependency reads recurse through self, so no slot
                // borrow may be live across this call.
                value = conv.apply(Direction::ToEngineering, self, node, value);
            }
            if !option {
                if let Some(slot) = self.slot_mut(node, param) {
                    slot.raw = raw;
                    slot.value = value;
                    slot.exists = decoded.supported;
                }
            }
            observed = value;
        }

        let clr = desc.class.contains(AccessClass::CLR);
        let returned = if clr {
            // Accumulator registers merge with whatever was left in the
            // cache and hand the whole accumulation to the caller once.
            let merged = (bits32(observed) | bits32(initial)) as f64;
            if !option {
                if let Some(slot) = self.slot_mut(node, param) {
                    slot.value = 0.;
                }
            }
            merged
        } else {
            observed
        };

        if returned != initial {
            self.notify(class, node, param, returned);
            if clr && !option {
                // The callback may have read the slot; leave it consumed.
                if let Some(slot) = self.slot_mut(node, param) {
                    slot.value = 0.;
                }
            }
        }

        Ok((returned, ParameterInfo::from_descriptor(desc)))
    }

    /// Fallback for parameters outside the class tables: read through,
    /// decode as a plain integer and report a synthetic descriptor. The
    /// cache is never touched and every read notifies.
    fn get_unknown(
        &mut self,
        class: NodeClass,
        node: NodeAddress,
        param: ParameterAddress,
    ) -> Result<(f64, ParameterInfo), Error> {
        let raw = self.transport.raw_get(node, param)?;
        let decoded = codec::decode(None, &raw);
        let info = ParameterInfo::unknown(raw.len());
        self.notify(class, node, param, decoded.value);
        Ok((decoded.value, info))
    }

    /// Write a parameter from an engineering value.
    ///
    /// The value is converted, encoded and clamped exactly as the node
    /// will hold it; the cache and the change notification both carry
    /// that read-back-equivalent value rather than the caller's input.
    /// With `verify` the parameter is read back and compared.
    ///
    /// # Errors
    /// Addressing errors as for [`get`](Self::get);
    /// [`Error::CommandFailed`] when verification reads back different
    /// bytes. A failed write marks the slot non-existent.
    pub fn set(
        &mut self,
        node: NodeAddress,
        param: ParameterAddress,
        value: f64,
        verify: bool,
    ) -> Result<(), Error> {
        let record = self.registry.node(node).ok_or(Error::NotInitialized)?;
        let class = record.class();
        let bank = record.bank(param.bank())?;
        let index = param.index();

        let desc = if (index as usize) < bank.len() {
            bank.descriptor(index).filter(|d| !d.is_reserved())
        } else {
            None
        };

        let width = match desc {
            Some(d) => d.byte_count(),
            // Unknown parameter: learn the wire width from the node.
            None => self.transport.raw_get(node, param)?.len(),
        };

        let mut base = value;
        if let Some(conv) = desc.and_then(|d| d.converter) {
            base = conv.apply(Direction::ToBits, self, node, value);
        }
        let raw = codec::encode(desc, width, base);

        // Re-decode what actually goes on the wire so the cached value
        // reflects the node's clamped and quantized copy.
        let decoded = codec::decode(desc, &raw);
        let mut eng = decoded.value;
        if let Some(conv) = desc.and_then(|d| d.converter) {
            eng = conv.apply(Direction::ToEngineering, self, node, decoded.value);
        }

        let cacheable = desc.is_some() && !param.option();
        if let Err(err) = self.transport.raw_set(node, param, &raw) {
            if cacheable {
                if let Some(slot) = self.slot_mut(node, param) {
                    slot.exists = false;
                }
            }
            return Err(err);
        }

        if verify {
            // The write already landed; any verify failure, read-back
            // errors included, must stop the cache serving the old value.
            let echo = match self.transport.raw_get(node, param) {
                Ok(echo) => echo,
                Err(err) => {
                    if cacheable {
                        if let Some(slot) = self.slot_mut(node, param) {
                            slot.exists = false;
                        }
                    }
                    return Err(err);
                }
            };
            if echo[..] != raw[..] {
                if cacheable {
                    if let Some(slot) = self.slot_mut(node, param) {
                        slot.exists = false;
                    }
                }
                return Err(Error::CommandFailed);
            }
        }

        if cacheable {
            if let Some(slot) = self.slot_mut(node, param) {
                slot.value = eng;
                slot.raw = raw;
                slot.exists = decoded.supported;
            }
        }
        self.notify(class, node, param, eng);
        Ok(())
    }

    /// Write a variable-length (string) slot from raw bytes.
    ///
    /// Human-entered names end up inside XML-bearing payloads on the
    /// node, so string chunks pass through
    /// [`codec::clean_for_xml`] before they go on the wire. The cache
    /// keeps the sanitized bytes; string slots have no numeric view and
    /// fire no change notification.
    ///
    /// # Errors
    /// Addressing errors as for [`get`](Self::get);
    /// [`Error::ParamRange`] if the slot is not variable-length,
    /// [`Error::ValueSize`] if `data` exceeds the slot's capacity. A
    /// failed write marks the slot non-existent.
    pub fn set_raw(
        &mut self,
        node: NodeAddress,
        param: ParameterAddress,
        data: &[u8],
    ) -> Result<(), Error> {
        let record = self.registry.node(node).ok_or(Error::NotInitialized)?;
        let bank = record.bank(param.bank())?;
        let index = param.index();
        let desc = bank
            .descriptor(index)
            .filter(|d| d.is_variable())
            .context(ParamRangeSnafu { index })?;

        let mut raw = RawValue::new();
        raw.try_extend_from_slice(data)
            .map_err(|_| Error::ValueSize)?;
        ensure!(raw.len() <= desc.byte_count(), ValueSizeSnafu);
        if desc.unit == UnitKind::StringChunk {
            codec::clean_for_xml(&mut raw);
        }

        if let Err(err) = self.transport.raw_set(node, param, &raw) {
            if !param.option() {
                if let Some(slot) = self.slot_mut(node, param) {
                    slot.exists = false;
                }
            }
            return Err(err);
        }
        if !param.option() {
            if let Some(slot) = self.slot_mut(node, param) {
                slot.value = 0.;
                slot.raw = raw;
                slot.exists = true;
            }
        }
        Ok(())
    }

    fn slot_mut(
        &mut self,
        node: NodeAddress,
        param: ParameterAddress,
    ) -> Option<&mut crate::cache::CachedValue> {
        self.registry
            .node_mut(node)?
            .bank_mut(param.bank())
            .ok()?
            .slot_mut(param.index())
    }

    fn notify(&self, class: NodeClass, node: NodeAddress, param: ParameterAddress, value: f64) {
        if let Some(callback) = self.registry.callback_for(class) {
            callback(crate::node::ChangeEvent {
                channel: self.registry.channel(),
                node,
                param: param.without_option(),
                value,
            });
        }
    }

    /// Converter dependency read: any failure reports as absent, the
    /// caller substitutes its fail-soft zero.
    pub(crate) fn dep(&mut self, node: NodeAddress, param: ParameterAddress) -> Option<f64> {
        match self.get(node, param) {
            Ok(value) => Some(value),
            Err(err) => {
                log::trace!("dependency {:?} on node {} unavailable: {}", param, *node, err);
                None
            }
        }
    }

    pub(crate) fn class_of(&self, node: NodeAddress) -> Option<NodeClass> {
        self.registry.node(node).map(|r| r.class())
    }

    pub(crate) fn firmware_of(&self, node: NodeAddress) -> Option<FirmwareVersion> {
        self.registry.node(node).map(|r| r.firmware())
    }

    pub(crate) fn monitor_test_point(&self, node: NodeAddress) -> Option<TestPoint> {
        self.registry.node(node).map(|r| r.monitor().test_point)
    }

    pub(crate) fn mark_monitor_unset(&mut self, node: NodeAddress) {
        if let Some(record) = self.registry.node_mut(node) {
            record.monitor.set = false;
        }
    }

    pub(crate) fn store_monitor(&mut self, node: NodeAddress, full_scale: f64) {
        if let Some(record) = self.registry.node_mut(node) {
            record.monitor.full_scale = full_scale;
            record.monitor.set = true;
        }
    }
}

#[cfg(test)]
mod info_tests {
    use super::*;

    #[test]
    fn unknown_info_shape() {
        let info = ParameterInfo::unknown(4);
        assert!(info.class.is_unknown());
        assert_eq!(info.unit, UnitKind::NoUnit);
        assert_eq!(info.width, 4);
        assert_eq!(info.scale, 1.);
        assert!(!info.reciprocal);
    }

    #[test]
    fn accumulator_bit_view() {
        assert_eq!(bits32(0.), 0);
        assert_eq!(bits32(5.), 5);
        assert_eq!(bits32((1u32 << 31) as f64), 1 << 31);
    }
}
