//! Range-checked addressing types and the descriptor vocabulary shared
//! by the codec, the converters and the value cache.

use snafu::{ensure, OptionExt, Snafu};

use arrayvec::ArrayVec;
use core::convert::{TryFrom, TryInto};
use core::ops::{BitOr, Deref};

/// Error type for the whole crate.
///
/// The transport-flavored variants (`NetClosed`, `Timeout`, `NodeOffline`,
/// `CommandFailed`) are constructed by [`Transport`](crate::Transport)
/// implementations and propagated through the parameter access paths.
#[derive(Debug, Snafu, PartialEq, Eq, Copy, Clone)]
#[snafu(visibility(pub(crate)))]
#[non_exhaustive]
pub enum Error {
    /// The value isn't a valid node address.
    #[snafu(display("Invalid node address"))]
    InvalidAddress,
    /// The value can't form a valid parameter address.
    #[snafu(display("Invalid parameter address"))]
    InvalidParameter,
    /// The bank index is outside the node's allocated banks.
    #[snafu(display("Bank {} out of range", bank))]
    BankRange {
        /// The offending bank index.
        bank: u8,
    },
    /// The parameter index is outside the bank's table.
    #[snafu(display("Parameter index {} out of range", index))]
    ParamRange {
        /// The offending parameter index.
        index: u8,
    },
    /// Node-class setup has not run (or the node was torn down).
    #[snafu(display("Node parameter storage not initialized"))]
    NotInitialized,
    /// A raw buffer's size doesn't match the descriptor's byte width.
    #[snafu(display("Raw buffer size doesn't match the parameter width"))]
    ValueSize,
    /// The node reports a device type other than the expected class.
    #[snafu(display("Node device type doesn't match the expected class"))]
    WrongDeviceType,
    /// The network channel is closed.
    #[snafu(display("Network channel closed"))]
    NetClosed,
    /// No response from the node within the transport's deadline.
    #[snafu(display("Node response timed out"))]
    Timeout,
    /// The node did not respond at all.
    #[snafu(display("Node offline"))]
    NodeOffline,
    /// The node answered with an error status.
    #[snafu(display("Node rejected the command"))]
    CommandFailed,
}

const fn invalid_address() -> InvalidAddressSnafu {
    InvalidAddressSnafu
}

const fn invalid_parameter() -> InvalidParameterSnafu {
    InvalidParameterSnafu
}

/// Raw on-wire parameter payload.
///
/// Numeric parameters occupy 1, 2, 3, 4, 6 or 8 bytes little-endian;
/// string-chunk parameters may be longer.
pub type RawValue = ArrayVec<u8, 16>;

/// `NodeAddress` is a range-checked [0, 15] integer, the node's position
/// on one multi-drop channel.
///
/// ## Example
/// ```
/// use servoreg_proto::NodeAddress;
/// use std::convert::TryInto;
/// let addr = NodeAddress::new(10).unwrap();
/// let addr: NodeAddress = 10.try_into().unwrap();
/// ```
#[derive(PartialEq, Eq, PartialOrd, Ord, Debug, Copy, Clone, Hash)]
#[repr(transparent)]
pub struct NodeAddress(u8);

/// Maximum number of nodes on one channel.
pub const MAX_NODES: usize = 16;

/// Create a new [`NodeAddress`], panics if it is out of range.
pub const fn node_addr(a: u8) -> NodeAddress {
    if a < MAX_NODES as u8 {
        return NodeAddress(a);
    }
    panic!("Invalid node address.")
}

impl NodeAddress {
    /// Create a new address, checking that it is in \[0, 15\].
    /// # Errors
    /// Returns [`Error::InvalidAddress`] if `address` is out of range.
    pub fn new(address: impl TryInto<u8>) -> Result<Self, Error> {
        let address = address.try_into().ok().with_context(invalid_address)?;
        ensure!((address as usize) < MAX_NODES, invalid_address());
        Ok(Self(address))
    }

    pub(crate) const fn index(self) -> usize {
        self.0 as usize
    }
}

impl Deref for NodeAddress {
    type Target = u8;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl PartialEq<usize> for NodeAddress {
    fn eq(&self, other: &usize) -> bool {
        self.0 as usize == *other
    }
}

/// Trait to convert `T: TryInto<u8>` into a [`NodeAddress`].
pub trait IntoNodeAddress {
    /// Convert self to a `NodeAddress`.
    /// # Errors
    /// Returns [`Error::InvalidAddress`] if self isn't a valid address.
    fn into_node_address(self) -> Result<NodeAddress, Error>;
}

impl IntoNodeAddress for NodeAddress {
    fn into_node_address(self) -> Result<NodeAddress, Error> {
        Ok(self)
    }
}

impl<T> IntoNodeAddress for T
where
    T: TryInto<u8>,
{
    fn into_node_address(self) -> Result<NodeAddress, Error> {
        NodeAddress::new(self)
    }
}

impl TryFrom<usize> for NodeAddress {
    type Error = Error;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}


/// `ParameterAddress` identifies one parameter slot on a node.
///
/// The on-wire packing is `{param: 7 bits, option: 1 bit, bank: 2 bits}`
/// in a single integer. The option bit requests a non-cached snapshot of
/// the parameter for one call; it does not select a different slot on
/// the node.
#[derive(PartialEq, Eq, PartialOrd, Ord, Debug, Copy, Clone, Hash)]
#[repr(transparent)]
pub struct ParameterAddress(u16);

const PARAM_MASK: u16 = 0x7f;
const OPTION_BIT: u16 = 0x80;
const BANK_SHIFT: u16 = 8;
const BANK_MASK: u16 = 0x3;

/// Number of banks addressable on the wire.
pub const MAX_BANKS: usize = 4;

/// Create a new [`ParameterAddress`], panics if bank or index is out of range.
pub const fn param(bank: u8, index: u8) -> ParameterAddress {
    if bank as u16 <= BANK_MASK && index as u16 <= PARAM_MASK {
        ParameterAddress(((bank as u16) << BANK_SHIFT) | index as u16)
    } else {
        panic!("Invalid parameter address.")
    }
}

impl ParameterAddress {
    /// Create a new `ParameterAddress`, checking bank ∈ \[0, 3\] and
    /// index ∈ \[0, 127\].
    /// # Errors
    /// Returns [`Error::InvalidParameter`] on out-of-range input.
    pub fn new(bank: impl TryInto<u8>, index: impl TryInto<u8>) -> Result<Self, Error> {
        let bank: u8 = bank.try_into().ok().with_context(invalid_parameter)?;
        let index: u8 = index.try_into().ok().with_context(invalid_parameter)?;
        ensure!(
            bank as u16 <= BANK_MASK && index as u16 <= PARAM_MASK,
            invalid_parameter()
        );
        Ok(Self(((bank as u16) << BANK_SHIFT) | index as u16))
    }

    /// Reconstruct an address from its on-wire packing.
    /// # Errors
    /// Returns [`Error::InvalidParameter`] if bits outside the layout are set.
    pub fn from_raw(raw: u16) -> Result<Self, Error> {
        ensure!(
            raw & !(PARAM_MASK | OPTION_BIT | (BANK_MASK << BANK_SHIFT)) == 0,
            invalid_parameter()
        );
        Ok(Self(raw))
    }

    /// The same address with the option (cache bypass) bit set.
    #[must_use]
    pub const fn with_option(self) -> Self {
        Self(self.0 | OPTION_BIT)
    }

    /// The same address with the option bit cleared.
    #[must_use]
    pub const fn without_option(self) -> Self {
        Self(self.0 & !OPTION_BIT)
    }

    /// Parameter index within the bank, 0..=127.
    pub const fn index(self) -> u8 {
        (self.0 & PARAM_MASK) as u8
    }

    /// Bank number, 0..=3.
    pub const fn bank(self) -> u8 {
        ((self.0 >> BANK_SHIFT) & BANK_MASK) as u8
    }

    /// Whether the cache-bypass option bit is set.
    pub const fn option(self) -> bool {
        self.0 & OPTION_BIT != 0
    }

    /// The on-wire packed form.
    pub const fn raw(self) -> u16 {
        self.0
    }
}

impl From<u8> for ParameterAddress {
    /// A bare index addresses bank 0 without the option bit.
    fn from(index: u8) -> Self {
        Self(index as u16 & PARAM_MASK)
    }
}


/// Access-class bitmask of a parameter descriptor.
///
/// The flags mirror the node's own parameter attribute word: who may
/// write the parameter, where it lives, and how reads interact with the
/// host-side cache.
#[derive(PartialEq, Eq, Debug, Copy, Clone, Hash)]
#[repr(transparent)]
pub struct AccessClass(u16);

impl AccessClass {
    /// Reserved slot, no parameter here.
    pub const NONE: Self = Self(0);
    /// Read-only for the host.
    pub const RO: Self = Self(1 << 0);
    /// Volatile on the node, lost at power-down.
    pub const VOL: Self = Self(1 << 1);
    /// Non-volatile, persisted on the node.
    pub const NV: Self = Self(1 << 2);
    /// Real-time: the cache is never trusted, every read hits the node.
    pub const RT: Self = Self(1 << 3);
    /// Clear-on-read accumulator register.
    pub const CLR: Self = Self(1 << 4);
    /// RAM-resident working copy of a non-volatile parameter.
    pub const RAM: Self = Self(1 << 5);
    /// Present on advanced models only.
    pub const ADV: Self = Self(1 << 6);
    /// Belongs in the main section of a saved configuration file.
    pub const CFG: Self = Self(1 << 7);
    /// Belongs in the motor section of a saved configuration file.
    pub const MTR: Self = Self(1 << 8);
    /// Changing this parameter risks a shutdown until the node resets.
    pub const RESET_RISK: Self = Self(1 << 11);
    /// Synthetic class reported for parameters outside the tables.
    pub const UNKNOWN: Self = Self(0xffff);

    /// Read-only real-time register.
    pub const RO_RT: Self = Self(Self::RO.0 | Self::RT.0);
    /// Read-only real-time clear-on-read accumulator.
    pub const ROC_RT: Self = Self(Self::RO.0 | Self::RT.0 | Self::CLR.0);
    /// Advanced-model configuration parameter.
    pub const CFG_ADV: Self = Self(Self::CFG.0 | Self::ADV.0);
    /// Motor-file parameter whose change risks a shutdown.
    pub const MTR_RISK: Self = Self(Self::MTR.0 | Self::RESET_RISK.0);

    /// Combine two flag sets; usable in const table definitions where
    /// `BitOr` is not.
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// True if every flag in `flags` is set in `self`.
    pub const fn contains(self, flags: Self) -> bool {
        self.0 & flags.0 == flags.0
    }

    /// True for a reserved (no parameter) slot.
    pub const fn is_none(self) -> bool {
        self.0 == Self::NONE.0
    }

    /// True for the synthetic unknown-parameter class.
    pub const fn is_unknown(self) -> bool {
        self.0 == Self::UNKNOWN.0
    }
}

impl BitOr for AccessClass {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

#[cfg(test)]
mod access_class_tests {
    use super::AccessClass;

    #[test]
    fn flag_composition() {
        let c = AccessClass::ROC_RT;
        assert!(c.contains(AccessClass::RO));
        assert!(c.contains(AccessClass::RT));
        assert!(c.contains(AccessClass::CLR));
        assert!(!c.contains(AccessClass::NV));
        assert!(!c.is_none());

        assert!(AccessClass::NONE.is_none());
        assert!(AccessClass::UNKNOWN.is_unknown());
        assert!(AccessClass::UNKNOWN.contains(AccessClass::RT));
    }
}

/// Sign handling for a parameter's fixed-point wire representation.
#[derive(PartialEq, Eq, Debug, Copy, Clone)]
pub enum SignPolicy {
    /// Raw bits are an unsigned quantity.
    Unsigned,
    /// Raw bits are two's-complement signed.
    Signed,
    /// Signed width on the wire, but only non-negative values are legal.
    PositiveOnly,
}

/// Physical-unit tag of a parameter's engineering value.
#[derive(PartialEq, Eq, Debug, Copy, Clone)]
#[non_exhaustive]
pub enum UnitKind {
    /// No intrinsic unit.
    NoUnit,
    /// Value is a bit field.
    BitField,
    /// Distance in encoder ticks.
    Ticks,
    /// Volts.
    Volts,
    /// Amperes.
    Amperes,
    /// Seconds.
    TimeS,
    /// Milliseconds.
    TimeMs,
    /// Microseconds.
    TimeUs,
    /// Minutes.
    TimeMin,
    /// Sample times.
    TimeSample,
    /// Hours.
    Hours,
    /// Ticks per second.
    TicksPerSec,
    /// Ticks per second squared.
    TicksPerSec2,
    /// Steps per second.
    StepsPerSec,
    /// Fixed-width ASCII string chunk.
    StringChunk,
    /// Device identity word, rendered as "TYPE.MODEL".
    DeviceId,
    /// Firmware version word, rendered as "MAJOR.MINOR.BUILD".
    FirmwareVersion,
    /// Hardware revision word, rendered letter-plus-minor.
    HardwareVersion,
    /// Electrical degrees.
    Degrees,
    /// Degrees Celsius.
    DegreesC,
    /// Percent of a configured maximum.
    PercentMax,
    /// Frequency in Hz.
    Hertz,
}
