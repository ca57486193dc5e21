//! Firmware version handling and the feature-milestone tables consulted
//! by version-gated converters.

use core::fmt;

use crate::descriptor::NodeClass;

/// Packed firmware version word: `{major: 4, minor: 4, build: 8}` bits.
#[derive(PartialEq, Eq, PartialOrd, Ord, Debug, Copy, Clone, Hash)]
#[repr(transparent)]
pub struct FirmwareVersion(u16);

impl FirmwareVersion {
    /// Wrap a raw on-wire version word.
    pub const fn from_raw(raw: u16) -> Self {
        Self(raw)
    }

    /// The raw on-wire version word.
    pub const fn raw(self) -> u16 {
        self.0
    }

    /// Major version, upper nibble.
    pub const fn major(self) -> u8 {
        (self.0 >> 12) as u8
    }

    /// Minor version.
    pub const fn minor(self) -> u8 {
        ((self.0 >> 8) & 0xf) as u8
    }

    /// Build number, low byte.
    pub const fn build(self) -> u8 {
        (self.0 & 0xff) as u8
    }
}

impl fmt::Display for FirmwareVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major(), self.minor(), self.build())
    }
}

/// Feature milestones whose presence depends on the node's firmware
/// version. Converters consult these instead of comparing against
/// inline version constants.
#[derive(PartialEq, Eq, Debug, Copy, Clone)]
#[non_exhaustive]
pub enum Milestone {
    /// Wider RMS limit encoding (32-bit register).
    RmsLimit32,
    /// Separate fast and slow RMS protection loops.
    DualRms,
    /// Continuous (non-preset) reference acceleration smoothing.
    EnhancedRas,
    /// Soft travel limits.
    SoftLimits,
    /// Bus-voltage-compensated operation.
    BusVoltAdjust,
    /// Configurable minimum operating voltage.
    MinVoltage,
    /// User-adjustable temperature limit.
    UserTemp,
    /// Expanded I/O link support.
    IoExpansion,
}

/// One milestone threshold for a node class.
pub struct MilestoneEntry {
    /// The gated feature.
    pub milestone: Milestone,
    /// First firmware version carrying it.
    pub version: FirmwareVersion,
}

const fn entry(milestone: Milestone, raw: u16) -> MilestoneEntry {
    MilestoneEntry {
        milestone,
        version: FirmwareVersion::from_raw(raw),
    }
}

/// Milestones of the compact node class, ascending by version.
pub const COMPACT_MILESTONES: &[MilestoneEntry] = &[
    entry(Milestone::EnhancedRas, 0x0000),
    entry(Milestone::SoftLimits, 0x1600),
    entry(Milestone::DualRms, 0x1601),
    entry(Milestone::BusVoltAdjust, 0x1606),
    entry(Milestone::MinVoltage, 0x1607),
    entry(Milestone::UserTemp, 0x1608),
];

/// Milestones of the advanced node class, ascending by version.
pub const ADVANCED_MILESTONES: &[MilestoneEntry] = &[
    entry(Milestone::IoExpansion, 0x5200),
    entry(Milestone::EnhancedRas, 0x5300),
    entry(Milestone::SoftLimits, 0x5400),
    entry(Milestone::RmsLimit32, 0x5403),
];

/// The first firmware version of `class` that carries `milestone`,
/// or `None` if the class has always had it.
pub fn threshold(class: NodeClass, milestone: Milestone) -> Option<FirmwareVersion> {
    let table = match class {
        NodeClass::Compact => COMPACT_MILESTONES,
        NodeClass::Advanced => ADVANCED_MILESTONES,
    };
    table
        .iter()
        .find(|e| e.milestone == milestone)
        .map(|e| e.version)
}

/// Whether firmware `version` of `class` carries `milestone`.
///
/// A milestone absent from the class table was never gated for that
/// class and counts as supported.
pub fn supports(class: NodeClass, version: FirmwareVersion, milestone: Milestone) -> bool {
    match threshold(class, milestone) {
        Some(first) => version >= first,
        None => true,
    }
}

/// Hardware platform variant of a node, derived from its hardware
/// revision at setup time. Gates factory-default seeding rows.
#[derive(PartialEq, Eq, Debug, Copy, Clone)]
pub enum Platform {
    /// Matches every platform (only meaningful in seeding tables).
    Any,
    /// Base hardware.
    Standard,
    /// High-voltage hardware revision.
    HighVoltage,
}

impl Platform {
    /// True when a table row gated on `self` applies to a node on
    /// platform `node`.
    pub fn matches(self, node: Platform) -> bool {
        self == Platform::Any || self == node
    }
}

#[cfg(test)]
mod firmware_tests {
    use super::*;

    #[test]
    fn version_fields() {
        let v = FirmwareVersion::from_raw(0x1623);
        assert_eq!(v.major(), 1);
        assert_eq!(v.minor(), 6);
        assert_eq!(v.build(), 0x23);
        assert_eq!(v.to_string(), "1.6.35");
    }

    #[test]
    fn version_ordering() {
        assert!(FirmwareVersion::from_raw(0x1601) > FirmwareVersion::from_raw(0x1600));
        assert!(FirmwareVersion::from_raw(0x5403) < FirmwareVersion::from_raw(0x5500));
    }

    #[test]
    fn milestone_gating() {
        let old = FirmwareVersion::from_raw(0x1600);
        let new = FirmwareVersion::from_raw(0x1601);
        assert!(!supports(NodeClass::Compact, old, Milestone::DualRms));
        assert!(supports(NodeClass::Compact, new, Milestone::DualRms));
        // Never gated for this class.
        assert!(supports(NodeClass::Compact, old, Milestone::RmsLimit32));
        // Advanced RAS presets end at the enhanced milestone.
        let legacy = FirmwareVersion::from_raw(0x5203);
        assert!(!supports(NodeClass::Advanced, legacy, Milestone::EnhancedRas));
    }
}
