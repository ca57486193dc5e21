//! Per-node value cache: one slot per (bank, parameter) holding the
//! last raw buffer and converted value.

use crate::descriptor::ParameterDescriptor;
use crate::types::RawValue;

/// One cached parameter value.
///
/// `value` is only meaningful while `exists` is true. Invalidation
/// clears the flag and zeroes the value; the raw buffer and the
/// descriptor binding stay untouched.
#[derive(Debug, Clone, Default)]
pub struct CachedValue {
    /// Last raw buffer moved over the wire for this slot.
    pub raw: RawValue,
    /// Last engineering-unit value.
    pub value: f64,
    /// True once the slot has seen a successful read or set.
    pub exists: bool,
    /// Informational: the slot is on a poll list.
    pub polled: bool,
}

impl CachedValue {
    pub(crate) fn invalidate(&mut self) {
        self.exists = false;
        self.value = 0.;
    }
}

/// A bank: the class descriptor table bound to this node's value slots.
#[derive(Debug)]
pub struct ParameterBank {
    descriptors: &'static [ParameterDescriptor],
    values: Vec<CachedValue>,
}

impl ParameterBank {
    /// Bind a class table, with every slot zeroed and non-existent.
    pub(crate) fn new(descriptors: &'static [ParameterDescriptor]) -> Self {
        Self {
            descriptors,
            values: vec![CachedValue::default(); descriptors.len()],
        }
    }

    /// Number of parameter slots in this bank.
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// True if the bank has no slots.
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Descriptor for `index`, if it is inside the table.
    pub fn descriptor(&self, index: u8) -> Option<&'static ParameterDescriptor> {
        self.descriptors.get(index as usize)
    }

    /// Cached slot for `index`.
    pub fn slot(&self, index: u8) -> Option<&CachedValue> {
        self.values.get(index as usize)
    }

    pub(crate) fn slot_mut(&mut self, index: u8) -> Option<&mut CachedValue> {
        self.values.get_mut(index as usize)
    }

    /// Invalidate every slot in the bank.
    pub(crate) fn invalidate(&mut self) {
        for slot in &mut self.values {
            slot.invalidate();
        }
    }
}
