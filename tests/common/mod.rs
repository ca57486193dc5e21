#![allow(dead_code)]

use std::collections::HashMap;

use servoreg_proto::descriptor::{core_param, drive_param};
use servoreg_proto::{
    node_addr, param, Error, NodeAddress, NodeClass, ParamAccess, ParameterAddress, RawValue,
    Transport,
};

/// In-memory register file standing in for a network channel: one raw
/// buffer per (node, parameter) address. The option bit never selects a
/// different register, matching the wire format.
pub struct SimTransport {
    registers: HashMap<(u8, u16), Vec<u8>>,
    pub reads: usize,
    pub writes: usize,
    do_read_error: bool,
    do_write_error: bool,
}

impl SimTransport {
    pub fn new() -> SimTransport {
        SimTransport {
            registers: HashMap::new(),
            reads: 0,
            writes: 0,
            do_read_error: false,
            do_write_error: false,
        }
    }

    pub fn load(&mut self, node: NodeAddress, param: ParameterAddress, bytes: &[u8]) {
        self.registers
            .insert((*node, param.without_option().raw()), bytes.to_vec());
    }

    pub fn raw_bytes(&self, node: NodeAddress, param: ParameterAddress) -> Option<&[u8]> {
        self.registers
            .get(&(*node, param.without_option().raw()))
            .map(Vec::as_slice)
    }

    /// Fail the next read with a timeout.
    pub fn trigger_read_error(&mut self) {
        self.do_read_error = true;
    }

    /// Fail the next write with a timeout.
    pub fn trigger_write_error(&mut self) {
        self.do_write_error = true;
    }
}

impl Transport for SimTransport {
    fn raw_get(&mut self, node: NodeAddress, param: ParameterAddress) -> Result<RawValue, Error> {
        if self.do_read_error {
            self.do_read_error = false;
            return Err(Error::Timeout);
        }
        self.reads += 1;
        let bytes = self
            .registers
            .get(&(*node, param.without_option().raw()))
            .ok_or(Error::NodeOffline)?;
        let mut raw = RawValue::new();
        raw.try_extend_from_slice(bytes)
            .map_err(|_| Error::ValueSize)?;
        Ok(raw)
    }

    fn raw_set(
        &mut self,
        node: NodeAddress,
        param: ParameterAddress,
        data: &[u8],
    ) -> Result<(), Error> {
        if self.do_write_error {
            self.do_write_error = false;
            return Err(Error::Timeout);
        }
        self.writes += 1;
        self.registers
            .insert((*node, param.without_option().raw()), data.to_vec());
        Ok(())
    }
}

pub const NODE: NodeAddress = node_addr(1);

pub fn le2(v: u16) -> [u8; 2] {
    v.to_le_bytes()
}

pub fn le4(v: u32) -> [u8; 4] {
    v.to_le_bytes()
}

/// Register image of a compact node: identity words plus the drive
/// constants the converters depend on.
///
/// 1 ms sample time, 8 A drive, 16 A ADC full scale, 800-count encoder
/// with matching command density, 8-pole motor, 75 V factory bus
/// full scale, 4 A / 3 A RMS limits.
pub fn load_compact_image(t: &mut SimTransport, node: NodeAddress) {
    t.load(node, param(0, core_param::DEV_ID), &le2((12 << 8) | 7));
    t.load(node, param(0, core_param::FW_VERS), &le2(0x1601));
    t.load(node, param(0, core_param::HW_VERS), &le2(0x0003));
    t.load(node, param(0, core_param::OPTION_REG), &le4(0));
    t.load(node, param(0, core_param::SAMPLE_PERIOD), &le4(1_000_000));

    t.load(node, param(1, drive_param::I_MAX), &le2(8 << 9));
    t.load(node, param(1, drive_param::ADC_MAX), &le2(8192));
    t.load(node, param(1, drive_param::ENC_DENS), &le2(800));
    t.load(node, param(1, drive_param::POLES), &le2(8));
    t.load(node, param(1, drive_param::CMD_CNTS_PER_REV), &le4(800));
    t.load(node, param(1, drive_param::FACT_FS_BUSV), &le2(75));
    t.load(node, param(1, drive_param::RMS_LIM), &le4(1 << 24));
    t.load(node, param(1, drive_param::RMS_SLOW_LIM), &le4(9_437_184));
}

/// Identify the compact node and return the channel state.
pub fn compact_node(t: &mut SimTransport) -> servoreg_proto::NetworkRegistry {
    let _ = env_logger::builder().is_test(true).try_init();
    load_compact_image(t, NODE);
    let mut registry = servoreg_proto::NetworkRegistry::new(0);
    ParamAccess::new(&mut registry, t)
        .setup_node(NODE, NodeClass::Compact)
        .expect("compact setup");
    registry
}
