//! Static parameter descriptor tables, one set of banks per node class.
//!
//! Tables are positional: a parameter's index in its bank is its on-wire
//! parameter number. Reserved slots carry [`AccessClass::NONE`] and stay
//! in place so the numbering matches the nodes.

use crate::convert::Converter;
use crate::types::{AccessClass, SignPolicy, UnitKind};

/// Immutable description of one parameter slot, shared by every node of
/// a class.
#[derive(Debug, Copy, Clone)]
pub struct ParameterDescriptor {
    /// Scale multiplies on decode instead of dividing.
    pub reciprocal: bool,
    /// Sign handling of the wire representation.
    pub sign: SignPolicy,
    /// Access-class bitmask.
    pub class: AccessClass,
    /// Physical-unit tag.
    pub unit: UnitKind,
    /// Byte width on the wire; negative means variable length up to the
    /// magnitude.
    pub width: i8,
    /// Fixed-point scale between raw and base units.
    pub scale: f64,
    /// Key under which the parameter appears in a saved configuration
    /// file, if it is persisted there.
    pub config_key: Option<&'static str>,
    /// Human-readable name.
    pub description: &'static str,
    /// Optional unit converter between base and engineering units.
    pub converter: Option<Converter>,
}

impl ParameterDescriptor {
    /// Wire byte count for fixed-width slots, maximum for variable ones.
    pub const fn byte_count(&self) -> usize {
        if self.width < 0 {
            -(self.width as i16) as usize
        } else {
            self.width as usize
        }
    }

    /// True for variable-length (string/blob) slots.
    pub const fn is_variable(&self) -> bool {
        self.width < 0
    }

    /// True if the slot holds no parameter.
    pub const fn is_reserved(&self) -> bool {
        self.class.is_none()
    }
}

#[allow(clippy::too_many_arguments)]
const fn row(
    reciprocal: bool,
    sign: SignPolicy,
    class: AccessClass,
    unit: UnitKind,
    width: i8,
    scale: f64,
    config_key: Option<&'static str>,
    description: &'static str,
    converter: Option<Converter>,
) -> ParameterDescriptor {
    ParameterDescriptor {
        reciprocal,
        sign,
        class,
        unit,
        width,
        scale,
        config_key,
        description,
        converter,
    }
}

const RESERVED: ParameterDescriptor = row(
    false,
    SignPolicy::Signed,
    AccessClass::NONE,
    UnitKind::NoUnit,
    0,
    1.,
    None,
    "",
    None,
);

/// Device-type code of the advanced (full servo) class.
pub const DEVTYPE_ADVANCED: u8 = 8;
/// Device-type code of the integrated path-follower family.
pub const DEVTYPE_PATH_FOLLOWER: u8 = 11;
/// Device-type code of the compact (SC) class.
pub const DEVTYPE_COMPACT: u8 = 12;

/// The node classes this crate knows descriptor tables for.
#[derive(PartialEq, Eq, Debug, Copy, Clone, Hash)]
pub enum NodeClass {
    /// Compact integrated servo, three banks.
    Compact,
    /// Advanced servo drive, two banks.
    Advanced,
}

impl NodeClass {
    /// Device-type code the node must report for this class.
    pub const fn device_type(self) -> u8 {
        match self {
            NodeClass::Compact => DEVTYPE_COMPACT,
            NodeClass::Advanced => DEVTYPE_ADVANCED,
        }
    }

    /// The bank tables of this class, in bank order.
    pub fn banks(self) -> &'static [&'static [ParameterDescriptor]] {
        match self {
            NodeClass::Compact => COMPACT_BANKS,
            NodeClass::Advanced => ADVANCED_BANKS,
        }
    }
}

/// Well-known core-bank (bank 0) parameter indices.
pub mod core_param {
    /// Device identity word.
    pub const DEV_ID: u8 = 0;
    /// Firmware version word.
    pub const FW_VERS: u8 = 1;
    /// Hardware revision word.
    pub const HW_VERS: u8 = 2;
    /// User identity string, first chunk.
    pub const USER_ID0: u8 = 4;
    /// User identity string, second chunk.
    pub const USER_ID1: u8 = 5;
    /// Factory option register.
    pub const OPTION_REG: u8 = 6;
    /// Hardware configuration register.
    pub const HW_CONFIG_REG: u8 = 7;
    /// Sample period in nanoseconds.
    pub const SAMPLE_PERIOD: u8 = 8;
    /// Alert register.
    pub const ALERT_REG: u8 = 9;
    /// Status register, accumulating.
    pub const STATUS_ACCUM: u8 = 10;
    /// Status register, real time.
    pub const STATUS_RT: u8 = 11;
    /// Warning register, accumulating.
    pub const WARN_ACCUM: u8 = 12;
    /// Warning register, real time.
    pub const WARN_RT: u8 = 13;
    /// Network diagnostic: fragment count.
    pub const NET_ERR_FRAG: u8 = 14;
    /// Network diagnostic: checksum failures.
    pub const NET_ERR_CHKSUM: u8 = 15;
    /// Network diagnostic: stray characters.
    pub const NET_ERR_STRAY: u8 = 16;
    /// Network diagnostic: receive overruns.
    pub const NET_ERR_OVERRUN: u8 = 17;
    /// Free-running sample timestamp.
    pub const TIMESTAMP: u8 = 18;
    /// Velocity limit.
    pub const VEL_LIM: u8 = 20;
    /// Acceleration limit.
    pub const ACC_LIM: u8 = 21;
    /// Jog velocity.
    pub const JOG_VEL: u8 = 22;
    /// Jog acceleration.
    pub const JOG_ACC: u8 = 23;
    /// Stop deceleration rate.
    pub const STOP_DECEL: u8 = 24;
    /// Post-move dwell time.
    pub const MOVE_DWELL: u8 = 25;
    /// Reference acceleration smoothing selector.
    pub const RAS: u8 = 26;
    /// Measured velocity.
    pub const VEL_MEAS: u8 = 27;
    /// Commanded velocity.
    pub const VEL_CMD: u8 = 28;
    /// Commanded torque.
    pub const TRQ_CMD: u8 = 29;
    /// Measured torque.
    pub const TRQ_MEAS: u8 = 30;
    /// Fast RMS load level.
    pub const RMS_LEVEL: u8 = 31;
    /// Slow RMS load level.
    pub const RMS_SLOW_LEVEL: u8 = 32;
    /// In-range position window.
    pub const IN_RANGE_WIN: u8 = 33;
    /// Tracking error limit.
    pub const TRK_ERR_LIM: u8 = 34;
    /// Monitor port test-point select.
    pub const MON_SOURCE: u8 = 35;
    /// Monitor port gain.
    pub const MON_GAIN: u8 = 36;
    /// Monitor port filter time constant.
    pub const MON_FILTER: u8 = 37;
    /// Step-input speed limit.
    pub const SPD_LIM: u8 = 38;
    /// Measured position.
    pub const POSN_MEAS: u8 = 39;
}

/// Well-known drive-bank (bank 1) parameter indices.
pub mod drive_param {
    /// ADC full-scale current.
    pub const ADC_MAX: u8 = 0;
    /// Drive maximum current.
    pub const I_MAX: u8 = 1;
    /// Fast RMS shutdown limit.
    pub const RMS_LIM: u8 = 2;
    /// Fast RMS time constant.
    pub const RMS_TC: u8 = 3;
    /// Slow RMS shutdown limit.
    pub const RMS_SLOW_LIM: u8 = 4;
    /// Slow RMS time constant.
    pub const RMS_SLOW_TC: u8 = 5;
    /// Current-loop integrator time constant.
    pub const IB_TC: u8 = 6;
    /// Torque limit.
    pub const TRQ_LIM: u8 = 7;
    /// Torque foldback time constant.
    pub const TRQ_FLDBK_TC: u8 = 8;
    /// Measured bus voltage.
    pub const BUS_VOLTS: u8 = 9;
    /// Factory full-scale bus voltage.
    pub const FACT_FS_BUSV: u8 = 10;
    /// Encoder density, ticks per revolution.
    pub const ENC_DENS: u8 = 11;
    /// Motor pole count.
    pub const POLES: u8 = 12;
    /// Command counts per revolution.
    pub const CMD_CNTS_PER_REV: u8 = 13;
    /// Commutation angle.
    pub const COMM_ANGLE: u8 = 14;
    /// Acceleration feedforward gain.
    pub const KFA: u8 = 15;
    /// Jerk feedforward gain.
    pub const KFJ: u8 = 16;
    /// Anti-hunt voltage filter time constant.
    pub const AH_FILT_TC: u8 = 17;
    /// Foldback torque limit.
    pub const FLDBK_TRQ: u8 = 18;
    /// Drive temperature.
    pub const TEMP: u8 = 19;
}

/// Well-known application-bank (bank 2) parameter indices.
pub mod app_param {
    /// Homing velocity.
    pub const HOME_VEL: u8 = 0;
    /// Homing acceleration.
    pub const HOME_ACC: u8 = 1;
    /// Homing offset distance.
    pub const HOME_OFFSET: u8 = 2;
    /// Positive soft travel limit.
    pub const SOFT_LIM_POS: u8 = 3;
    /// Negative soft travel limit.
    pub const SOFT_LIM_NEG: u8 = 4;
    /// User description string, chunks 0..=3 at consecutive indices.
    pub const USER_DESC0: u8 = 6;
    /// Move acceleration ramp start.
    pub const A_START: u8 = 10;
    /// Move acceleration ramp end.
    pub const B_END: u8 = 11;
}

use SignPolicy::{PositiveOnly, Signed, Unsigned};
use UnitKind::*;

const RO: AccessClass = AccessClass::RO;
const RO_RT: AccessClass = AccessClass::RO_RT;
const ROC_RT: AccessClass = AccessClass::ROC_RT;
const NV_CFG: AccessClass = AccessClass::NV.union(AccessClass::CFG);
const NV_CFG_ADV: AccessClass = NV_CFG.union(AccessClass::ADV);
const NV_MTR: AccessClass = AccessClass::NV.union(AccessClass::MTR);
const NV_MTR_RISK: AccessClass = NV_MTR.union(AccessClass::RESET_RISK);
const RO_MTR: AccessClass = AccessClass::RO.union(AccessClass::MTR);
const NV_CFG_RISK: AccessClass = NV_CFG.union(AccessClass::RESET_RISK);

const SCALE_Q8: f64 = (1u32 << 8) as f64;
const SCALE_Q9: f64 = (1u32 << 9) as f64;
const SCALE_Q12: f64 = (1u32 << 12) as f64;
const SCALE_Q13: f64 = (1u32 << 13) as f64;
const SCALE_Q14: f64 = (1u32 << 14) as f64;
const SCALE_Q15: f64 = (1u32 << 15) as f64;
const SCALE_Q17: f64 = (1u32 << 17) as f64;
const SCALE_Q18: f64 = (1u32 << 18) as f64;

/// Compact-class core bank (bank 0).
#[rustfmt::skip]
pub static COMPACT_CORE: &[ParameterDescriptor] = &[
    /*  0 */ row(false, Unsigned, RO, DeviceId, 2, SCALE_Q8, None, "Device ID", None),
    /*  1 */ row(false, Unsigned, RO, FirmwareVersion, 2, SCALE_Q12, None, "Firmware version", None),
    /*  2 */ row(false, Unsigned, RO, HardwareVersion, 2, SCALE_Q8, None, "Hardware revision", None),
    /*  3 */ RESERVED,
    /*  4 */ row(false, Unsigned, NV_CFG, StringChunk, -8, 1., Some("UserID0"), "User ID 0", None),
    /*  5 */ row(false, Unsigned, NV_CFG, StringChunk, -8, 1., Some("UserID1"), "User ID 1", None),
    /*  6 */ row(false, Unsigned, RO, BitField, 4, 1., None, "Option register", None),
    /*  7 */ row(false, Unsigned, NV_CFG_RISK, BitField, 4, 1., Some("HwConfigReg"), "HW config register", None),
    /*  8 */ row(false, PositiveOnly, RO, TimeUs, 4, 1000., None, "Sample period", None),
    /*  9 */ row(false, Unsigned, RO_RT, BitField, 12, 1., None, "Alert register", None),
    /* 10 */ row(false, Unsigned, ROC_RT, BitField, 4, 1., None, "Status accum register", None),
    /* 11 */ row(false, Unsigned, RO_RT, BitField, 4, 1., None, "Status RT register", None),
    /* 12 */ row(false, Unsigned, ROC_RT, BitField, 4, 1., None, "Warning accum register", None),
    /* 13 */ row(false, Unsigned, RO_RT, BitField, 4, 1., None, "Warning RT register", None),
    /* 14 */ row(false, Unsigned, ROC_RT, NoUnit, 2, 1., None, "Net fragment count", None),
    /* 15 */ row(false, Unsigned, ROC_RT, NoUnit, 2, 1., None, "Net checksum count", None),
    /* 16 */ row(false, Unsigned, ROC_RT, NoUnit, 2, 1., None, "Net stray count", None),
    /* 17 */ row(false, Unsigned, ROC_RT, NoUnit, 2, 1., None, "Net overrun count", None),
    /* 18 */ row(false, Unsigned, RO_RT, TimeSample, 2, 1., None, "Timestamp", None),
    /* 19 */ RESERVED,
    /* 20 */ row(false, PositiveOnly, NV_CFG, TicksPerSec, 4, SCALE_Q17, Some("VelLim"), "Velocity limit", Some(Converter::Velocity)),
    /* 21 */ row(false, PositiveOnly, NV_CFG, TicksPerSec2, 4, SCALE_Q17, Some("AccLim"), "Acceleration limit", Some(Converter::Acceleration)),
    /* 22 */ row(false, Signed, NV_CFG, TicksPerSec, 4, SCALE_Q17, Some("JogVel"), "Jog velocity", Some(Converter::VelocityRounded)),
    /* 23 */ row(false, PositiveOnly, NV_CFG, TicksPerSec2, 4, SCALE_Q17, Some("JogAcc"), "Jog acceleration", Some(Converter::Acceleration)),
    /* 24 */ row(false, PositiveOnly, NV_CFG, TicksPerSec2, 4, SCALE_Q17, Some("StopDecel"), "Stop deceleration", Some(Converter::Acceleration)),
    /* 25 */ row(false, PositiveOnly, NV_CFG, TimeMs, 4, 1., Some("MoveDwell"), "Post-move dwell", Some(Converter::TimeMs)),
    /* 26 */ row(false, Unsigned, NV_CFG, TimeMs, 4, 1., Some("Ras"), "RAS selector", Some(Converter::Jerk)),
    /* 27 */ row(false, Signed, RO_RT, TicksPerSec, 4, SCALE_Q18, None, "Velocity, measured", Some(Converter::Velocity)),
    /* 28 */ row(false, Signed, RO_RT, TicksPerSec, 4, SCALE_Q18, None, "Velocity, commanded", Some(Converter::Velocity)),
    /* 29 */ row(false, Signed, RO_RT, Amperes, 2, SCALE_Q15, None, "Torque, commanded", Some(Converter::Amperes)),
    /* 30 */ row(false, Signed, RO_RT, Amperes, 2, SCALE_Q13, None, "Torque, measured", Some(Converter::MeasuredAmperes)),
    /* 31 */ row(false, Unsigned, RO_RT, PercentMax, 4, 1., None, "RMS level", Some(Converter::RmsLevel { slow: false })),
    /* 32 */ row(false, Unsigned, RO_RT, PercentMax, 4, 1., None, "RMS level, slow", Some(Converter::RmsLevel { slow: true })),
    /* 33 */ row(false, PositiveOnly, NV_CFG, Ticks, 4, 1., Some("InRangeWin"), "In-range window", Some(Converter::PositionLimit)),
    /* 34 */ row(false, PositiveOnly, NV_CFG, Ticks, 4, 1., Some("TrkErrLim"), "Tracking error limit", Some(Converter::PositionLimit)),
    /* 35 */ row(false, Unsigned, NV_CFG, BitField, 2, 1., Some("MonSource"), "Monitor test point", None),
    /* 36 */ row(false, PositiveOnly, NV_CFG, NoUnit, 4, 1., Some("MonGain"), "Monitor gain", Some(Converter::MonitorGain)),
    /* 37 */ row(false, PositiveOnly, NV_CFG, TimeMs, 2, 1., Some("MonFilter"), "Monitor filter TC", Some(Converter::FilterTc99)),
    /* 38 */ row(false, PositiveOnly, NV_CFG, StepsPerSec, 4, SCALE_Q17, Some("SpdLim"), "Step speed limit", Some(Converter::SpeedLimit)),
    /* 39 */ row(false, Signed, RO_RT, Ticks, 4, 1., None, "Position, measured", None),
];

/// Compact-class drive bank (bank 1).
#[rustfmt::skip]
pub static COMPACT_DRIVE: &[ParameterDescriptor] = &[
    /*  0 */ row(false, PositiveOnly, RO, Amperes, 2, SCALE_Q14, None, "ADC full-scale current", Some(Converter::AdcMax)),
    /*  1 */ row(false, PositiveOnly, RO, Amperes, 2, SCALE_Q9, None, "Drive max current", None),
    /*  2 */ row(false, PositiveOnly, NV_MTR_RISK, Amperes, 4, 1., Some("RmsLim"), "RMS limit", Some(Converter::RmsLimit32)),
    /*  3 */ row(false, PositiveOnly, NV_MTR, TimeS, 2, 1., Some("RmsTc"), "RMS time constant", Some(Converter::RmsTc)),
    /*  4 */ row(false, PositiveOnly, NV_MTR_RISK, Amperes, 4, 1., Some("RmsSlowLim"), "RMS limit, slow", Some(Converter::RmsLimit32)),
    /*  5 */ row(false, PositiveOnly, NV_MTR, TimeMin, 2, 1., Some("RmsSlowTc"), "RMS TC, slow", Some(Converter::RmsSlowTc)),
    /*  6 */ row(false, PositiveOnly, NV_MTR, TimeMs, 2, 1., Some("IbTc"), "Ib RMS time constant", Some(Converter::IbRmsTc)),
    /*  7 */ row(false, PositiveOnly, NV_CFG, Amperes, 2, SCALE_Q15, Some("TrqLim"), "Torque limit", Some(Converter::Amperes)),
    /*  8 */ row(false, PositiveOnly, NV_CFG, TimeMs, 2, 1., Some("TrqFldbkTc"), "Torque foldback TC", Some(Converter::FilterTc99)),
    /*  9 */ row(false, Unsigned, RO_RT, Volts, 2, SCALE_Q15, None, "Bus voltage", Some(Converter::BusVolts)),
    /* 10 */ row(false, PositiveOnly, RO, Volts, 2, 1., None, "Factory FS bus voltage", None),
    /* 11 */ row(false, PositiveOnly, RO_MTR, Ticks, 2, 1., None, "Encoder density", None),
    /* 12 */ row(false, PositiveOnly, RO_MTR, NoUnit, 2, 1., None, "Motor poles", None),
    /* 13 */ row(false, PositiveOnly, NV_CFG, Ticks, 4, 1., Some("CmdCntsPerRev"), "Command counts/rev", None),
    /* 14 */ row(false, Signed, RO_RT, Degrees, 4, 1., None, "Commutation angle", Some(Converter::Angle)),
    /* 15 */ row(false, Signed, NV_CFG_ADV, NoUnit, 4, 1., Some("Kfa"), "Accel feedforward", Some(Converter::ClampTo27Bits)),
    /* 16 */ row(false, Signed, NV_CFG_ADV, NoUnit, 4, 1., Some("Kfj"), "Jerk feedforward", Some(Converter::ClampTo27Bits)),
    /* 17 */ row(false, PositiveOnly, NV_CFG, TimeMs, 2, 1., Some("AhFiltTc"), "Anti-hunt filter TC", Some(Converter::FilterTc1e)),
    /* 18 */ row(false, PositiveOnly, NV_CFG, Amperes, 2, SCALE_Q15, Some("FldbkTrq"), "Foldback torque", Some(Converter::Amperes)),
    /* 19 */ row(false, Signed, RO_RT, DegreesC, 2, SCALE_Q8, None, "Drive temperature", None),
];

/// Compact-class application bank (bank 2).
#[rustfmt::skip]
pub static COMPACT_APP: &[ParameterDescriptor] = &[
    /*  0 */ row(false, PositiveOnly, NV_CFG, TicksPerSec, 4, SCALE_Q17, Some("HomeVel"), "Homing velocity", Some(Converter::Velocity)),
    /*  1 */ row(false, PositiveOnly, NV_CFG, TicksPerSec2, 4, SCALE_Q17, Some("HomeAcc"), "Homing acceleration", Some(Converter::Acceleration)),
    /*  2 */ row(false, Signed, NV_CFG, Ticks, 4, 1., Some("HomeOffset"), "Homing offset", None),
    /*  3 */ row(false, Signed, NV_CFG, Ticks, 4, 1., Some("SoftLimPos"), "Soft limit, positive", None),
    /*  4 */ row(false, Signed, NV_CFG, Ticks, 4, 1., Some("SoftLimNeg"), "Soft limit, negative", None),
    /*  5 */ RESERVED,
    /*  6 */ row(false, Unsigned, NV_CFG, StringChunk, -8, 1., Some("UserDesc0"), "User description 0", None),
    /*  7 */ row(false, Unsigned, NV_CFG, StringChunk, -8, 1., Some("UserDesc1"), "User description 1", None),
    /*  8 */ row(false, Unsigned, NV_CFG, StringChunk, -8, 1., Some("UserDesc2"), "User description 2", None),
    /*  9 */ row(false, Unsigned, NV_CFG, StringChunk, -8, 1., Some("UserDesc3"), "User description 3", None),
    /* 10 */ row(false, PositiveOnly, NV_CFG, TimeMs, 4, 1., Some("AStart"), "Accel ramp start", Some(Converter::TimeMs)),
    /* 11 */ row(false, PositiveOnly, NV_CFG, TimeMs, 4, 1., Some("BEnd"), "Accel ramp end", Some(Converter::TimeMs)),
];

static COMPACT_BANKS: &[&[ParameterDescriptor]] = &[COMPACT_CORE, COMPACT_DRIVE, COMPACT_APP];

/// Advanced-class core bank (bank 0). Same numbering as the compact
/// core bank for the slots both classes share.
#[rustfmt::skip]
pub static ADVANCED_CORE: &[ParameterDescriptor] = &[
    /*  0 */ row(false, Unsigned, RO, DeviceId, 2, SCALE_Q8, None, "Device ID", None),
    /*  1 */ row(false, Unsigned, RO, FirmwareVersion, 2, SCALE_Q12, None, "Firmware version", None),
    /*  2 */ row(false, Unsigned, RO, HardwareVersion, 2, SCALE_Q8, None, "Hardware revision", None),
    /*  3 */ RESERVED,
    /*  4 */ row(false, Unsigned, NV_CFG, StringChunk, -8, 1., Some("UserID0"), "User ID 0", None),
    /*  5 */ row(false, Unsigned, NV_CFG, StringChunk, -8, 1., Some("UserID1"), "User ID 1", None),
    /*  6 */ row(false, Unsigned, RO, BitField, 4, 1., None, "Option register", None),
    /*  7 */ row(false, Unsigned, NV_CFG_RISK, BitField, 4, 1., Some("HwConfigReg"), "HW config register", None),
    /*  8 */ row(false, PositiveOnly, RO, TimeUs, 4, 1000., None, "Sample period", None),
    /*  9 */ row(false, Unsigned, RO_RT, BitField, 12, 1., None, "Alert register", None),
    /* 10 */ row(false, Unsigned, ROC_RT, BitField, 4, 1., None, "Status accum register", None),
    /* 11 */ row(false, Unsigned, RO_RT, BitField, 4, 1., None, "Status RT register", None),
    /* 12 */ row(false, Unsigned, ROC_RT, BitField, 4, 1., None, "Warning accum register", None),
    /* 13 */ row(false, Unsigned, RO_RT, BitField, 4, 1., None, "Warning RT register", None),
    /* 14 */ row(false, Unsigned, ROC_RT, NoUnit, 2, 1., None, "Net fragment count", None),
    /* 15 */ row(false, Unsigned, ROC_RT, NoUnit, 2, 1., None, "Net checksum count", None),
    /* 16 */ row(false, Unsigned, ROC_RT, NoUnit, 2, 1., None, "Net stray count", None),
    /* 17 */ row(false, Unsigned, ROC_RT, NoUnit, 2, 1., None, "Net overrun count", None),
    /* 18 */ row(false, Unsigned, RO_RT, TimeSample, 2, 1., None, "Timestamp", None),
    /* 19 */ RESERVED,
    /* 20 */ row(false, PositiveOnly, NV_CFG, TicksPerSec, 4, SCALE_Q17, Some("VelLim"), "Velocity limit", Some(Converter::Velocity)),
    /* 21 */ row(false, PositiveOnly, NV_CFG, TicksPerSec2, 4, SCALE_Q17, Some("AccLim"), "Acceleration limit", Some(Converter::Acceleration)),
    /* 22 */ row(false, Signed, NV_CFG, TicksPerSec, 4, SCALE_Q17, Some("JogVel"), "Jog velocity", Some(Converter::VelocityRounded)),
    /* 23 */ row(false, PositiveOnly, NV_CFG, TicksPerSec2, 4, SCALE_Q17, Some("JogAcc"), "Jog acceleration", Some(Converter::Acceleration)),
    /* 24 */ row(false, PositiveOnly, NV_CFG, TicksPerSec2, 4, SCALE_Q17, Some("StopDecel"), "Stop deceleration", Some(Converter::Acceleration)),
    /* 25 */ row(false, PositiveOnly, NV_CFG, TimeMs, 4, 1., Some("MoveDwell"), "Post-move dwell", Some(Converter::TimeMs)),
    /* 26 */ row(false, Unsigned, NV_CFG, TimeMs, 4, 1., Some("Ras"), "RAS selector", Some(Converter::Jerk)),
    /* 27 */ row(false, Signed, RO_RT, TicksPerSec, 4, SCALE_Q18, None, "Velocity, measured", Some(Converter::Velocity)),
    /* 28 */ row(false, Signed, RO_RT, TicksPerSec, 4, SCALE_Q18, None, "Velocity, commanded", Some(Converter::Velocity)),
    /* 29 */ row(false, Signed, RO_RT, Amperes, 2, SCALE_Q15, None, "Torque, commanded", Some(Converter::Amperes)),
    /* 30 */ row(false, Signed, RO_RT, Amperes, 2, SCALE_Q13, None, "Torque, measured", Some(Converter::MeasuredAmperes)),
    /* 31 */ row(false, Unsigned, RO_RT, PercentMax, 4, 1., None, "RMS level", Some(Converter::RmsLevel { slow: false })),
    /* 32 */ RESERVED,
    /* 33 */ row(false, PositiveOnly, NV_CFG, Ticks, 4, 1., Some("InRangeWin"), "In-range window", None),
    /* 34 */ row(false, PositiveOnly, NV_CFG, Ticks, 4, 1., Some("TrkErrLim"), "Tracking error limit", None),
    /* 35 */ row(false, Unsigned, NV_CFG, BitField, 2, 1., Some("MonSource"), "Monitor test point", None),
    /* 36 */ row(false, PositiveOnly, NV_CFG, NoUnit, 4, 1., Some("MonGain"), "Monitor gain", Some(Converter::MonitorGain)),
    /* 37 */ row(false, PositiveOnly, NV_CFG, TimeMs, 2, 1., Some("MonFilter"), "Monitor filter TC", Some(Converter::FilterTc99)),
];

/// Advanced-class drive bank (bank 1).
#[rustfmt::skip]
pub static ADVANCED_DRIVE: &[ParameterDescriptor] = &[
    /*  0 */ row(false, PositiveOnly, RO, Amperes, 2, SCALE_Q14, None, "ADC full-scale current", Some(Converter::AdcMax)),
    /*  1 */ row(false, PositiveOnly, RO, Amperes, 2, SCALE_Q9, None, "Drive max current", None),
    /*  2 */ row(false, PositiveOnly, NV_MTR_RISK, Amperes, 4, 1., Some("RmsLim"), "RMS limit", Some(Converter::RmsLimit32)),
    /*  3 */ row(false, PositiveOnly, NV_MTR, TimeS, 2, 1., Some("RmsTc"), "RMS time constant", Some(Converter::RmsTc)),
    /*  4 */ RESERVED,
    /*  5 */ RESERVED,
    /*  6 */ row(false, PositiveOnly, NV_MTR, TimeMs, 2, 1., Some("IbTc"), "Ib RMS time constant", Some(Converter::IbRmsTc)),
    /*  7 */ row(false, PositiveOnly, NV_CFG, Amperes, 2, SCALE_Q15, Some("TrqLim"), "Torque limit", Some(Converter::Amperes)),
    /*  8 */ row(false, PositiveOnly, NV_CFG, TimeMs, 2, 1., Some("TrqFldbkTc"), "Torque foldback TC", Some(Converter::FilterTc99)),
    /*  9 */ row(false, Unsigned, RO_RT, Volts, 2, SCALE_Q15, None, "Bus voltage", Some(Converter::BusVolts)),
    /* 10 */ row(false, PositiveOnly, RO, Volts, 2, 1., None, "Factory FS bus voltage", None),
    /* 11 */ row(false, PositiveOnly, RO_MTR, Ticks, 2, 1., None, "Encoder density", None),
    /* 12 */ row(false, PositiveOnly, RO_MTR, NoUnit, 2, 1., None, "Motor poles", None),
    /* 13 */ RESERVED,
    /* 14 */ row(false, Signed, RO_RT, Degrees, 4, 1., None, "Commutation angle", Some(Converter::Angle)),
    /* 15 */ row(false, Signed, NV_CFG_ADV, NoUnit, 4, 1., Some("Kfa"), "Accel feedforward", Some(Converter::ClampTo27Bits)),
    /* 16 */ row(false, Signed, NV_CFG_ADV, NoUnit, 4, 1., Some("Kfj"), "Jerk feedforward", Some(Converter::ClampTo27Bits)),
    /* 17 */ row(false, PositiveOnly, NV_CFG, TimeMs, 2, 1., Some("AhFiltTc"), "Anti-hunt filter TC", Some(Converter::FilterTc1e)),
    /* 18 */ row(false, PositiveOnly, NV_CFG, Amperes, 2, SCALE_Q15, Some("FldbkTrq"), "Foldback torque", Some(Converter::Amperes)),
    /* 19 */ row(false, Signed, RO_RT, DegreesC, 2, SCALE_Q8, None, "Drive temperature", None),
];

static ADVANCED_BANKS: &[&[ParameterDescriptor]] = &[ADVANCED_CORE, ADVANCED_DRIVE];

#[cfg(test)]
mod table_tests {
    use super::*;

    #[test]
    fn well_known_slots_line_up() {
        let core = COMPACT_CORE;
        assert_eq!(core[core_param::SAMPLE_PERIOD as usize].unit, UnitKind::TimeUs);
        assert_eq!(core[core_param::DEV_ID as usize].unit, UnitKind::DeviceId);
        assert!(core[core_param::STATUS_ACCUM as usize]
            .class
            .contains(AccessClass::CLR));
        assert!(core[3].is_reserved());

        let drive = COMPACT_DRIVE;
        assert_eq!(drive[drive_param::I_MAX as usize].scale, SCALE_Q9);
        assert!(drive[drive_param::ADC_MAX as usize].converter.is_some());
    }

    #[test]
    fn both_classes_share_core_numbering() {
        for idx in [
            core_param::DEV_ID,
            core_param::FW_VERS,
            core_param::SAMPLE_PERIOD,
            core_param::VEL_LIM,
            core_param::MON_GAIN,
        ] {
            let c = &COMPACT_CORE[idx as usize];
            let a = &ADVANCED_CORE[idx as usize];
            assert_eq!(c.unit, a.unit, "unit mismatch at index {}", idx);
            assert_eq!(c.width, a.width, "width mismatch at index {}", idx);
        }
    }

    #[test]
    fn bank_counts() {
        assert_eq!(NodeClass::Compact.banks().len(), 3);
        assert_eq!(NodeClass::Advanced.banks().len(), 2);
        assert_eq!(NodeClass::Compact.device_type(), DEVTYPE_COMPACT);
    }
}

