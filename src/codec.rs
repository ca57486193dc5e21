//! Fixed-point codec between raw on-wire buffers and host-side doubles.
//!
//! The decode side dispatches on the buffer length actually received;
//! the descriptor only governs sign handling and scaling. Identity-kind
//! parameters (device ID, firmware and hardware versions) additionally
//! render to a short display string via [`render_ident`].

use core::fmt::Write;

use arrayvec::ArrayString;
use log::warn;

use crate::descriptor::{
    ParameterDescriptor, DEVTYPE_ADVANCED, DEVTYPE_COMPACT, DEVTYPE_PATH_FOLLOWER,
};
use crate::firmware::FirmwareVersion;
use crate::types::{RawValue, SignPolicy, UnitKind};

/// Result of decoding a raw buffer.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Decoded {
    /// Base-unit numeric view of the buffer.
    pub value: f64,
    /// False when the buffer length has no numeric interpretation.
    pub supported: bool,
}

const UNSUPPORTED: Decoded = Decoded {
    value: 0.,
    supported: false,
};

fn signed_decode(raw: &[u8], sign: SignPolicy) -> Option<i64> {
    Some(match raw.len() {
        1 => raw[0] as i8 as i64,
        2 => i16::from_le_bytes([raw[0], raw[1]]) as i64,
        3 => {
            // Bit 23 carries the sign for 3-byte quantities.
            let ext = if raw[2] & 0x80 != 0 { 0xff } else { 0 };
            i32::from_le_bytes([raw[0], raw[1], raw[2], ext]) as i64
        }
        4 => i32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]) as i64,
        6 => {
            let ext = if raw[5] & 0x80 != 0 && sign == SignPolicy::Signed {
                0xff
            } else {
                0
            };
            i64::from_le_bytes([raw[0], raw[1], raw[2], raw[3], raw[4], raw[5], ext, ext])
        }
        8 => i64::from_le_bytes([
            raw[0], raw[1], raw[2], raw[3], raw[4], raw[5], raw[6], raw[7],
        ]),
        _ => return None,
    })
}

/// Decode a raw buffer into its base-unit numeric value.
///
/// With no descriptor the buffer reads as a plain signed little-endian
/// integer. Variable-length (string) slots report `supported` with a
/// zero numeric view; callers use the raw buffer instead.
pub fn decode(desc: Option<&ParameterDescriptor>, raw: &[u8]) -> Decoded {
    if let Some(d) = desc {
        if !d.class.is_none() && d.width <= 0 {
            // String/blob slot: any length up to the maximum exists,
            // none of them numerically.
            return Decoded {
                value: 0.,
                supported: true,
            };
        }
    }

    let sign = desc.map_or(SignPolicy::Signed, |d| d.sign);
    let mut val = match signed_decode(raw, sign) {
        Some(v) => v,
        None => return UNSUPPORTED,
    };

    let desc = match desc {
        Some(d) if !d.class.is_none() => d,
        // Generic or reserved slot: plain integer, no scaling.
        _ => {
            return Decoded {
                value: val as f64,
                supported: true,
            }
        }
    };

    if matches!(
        desc.unit,
        UnitKind::DeviceId | UnitKind::FirmwareVersion | UnitKind::HardwareVersion
    ) {
        // Identity words stay unscaled so they compare as raw integers.
        return Decoded {
            value: val as f64,
            supported: true,
        };
    }

    if sign != SignPolicy::Signed {
        val = match raw.len() {
            // Single bytes stay signed, the node's chars are signed.
            1 => raw[0] as i8 as i64,
            2 => u16::from_le_bytes([raw[0], raw[1]]) as i64,
            3 => i32::from_le_bytes([raw[0], raw[1], raw[2], 0]) as i64,
            4 => i32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]) as i64,
            6 | 8 => val,
            _ => return UNSUPPORTED,
        };
    }

    let v = val as f64;
    let value = if !desc.reciprocal && desc.scale != 0. {
        if val != 0 {
            v / desc.scale
        } else {
            0.
        }
    } else {
        v * desc.scale
    };
    Decoded {
        value,
        supported: true,
    }
}

fn clamp_to_width(sign: SignPolicy, width: usize, v: i128) -> i128 {
    let bits = 8 * width as u32;
    match sign {
        SignPolicy::Signed => {
            let max = (1i128 << (bits - 1)) - 1;
            if v > max {
                max
            } else if v < -max {
                -(max + 1)
            } else {
                v
            }
        }
        SignPolicy::Unsigned => v & ((1i128 << bits) - 1),
        SignPolicy::PositiveOnly => {
            let max = (1i128 << (bits - 1)) - 1;
            if v > max {
                max
            } else if v < 0 {
                0
            } else {
                v
            }
        }
    }
}

/// Encode a base-unit value into `width` raw bytes.
///
/// Values beyond the representable range of `(width, sign)` clamp to the
/// boundary; they never wrap. Widths without a wire encoding (6, or
/// anything outside 1/2/3/4/8) produce a zero-filled buffer and a
/// warning, matching the nodes' behavior of ignoring such writes.
pub fn encode(desc: Option<&ParameterDescriptor>, width: usize, value: f64) -> RawValue {
    let lvalue: i128 = match desc {
        None => (value + 0.5) as i128,
        Some(d) => {
            let bias = if d.scale > 1. { 0.5 } else { 0. };
            let scaled = if !d.reciprocal {
                value * d.scale + bias
            } else if value != 0. {
                value / d.scale + bias
            } else {
                0.
            };
            clamp_to_width(d.sign, width.min(8).max(1), scaled as i128)
        }
    };

    let mut out = RawValue::new();
    match width {
        1 => out.push(lvalue as u8),
        2 => out.extend((lvalue as i16).to_le_bytes()),
        3 => out.extend([lvalue as u8, (lvalue >> 8) as u8, (lvalue >> 16) as u8]),
        4 => out.extend((lvalue as i32).to_le_bytes()),
        8 => out.extend((lvalue as i64).to_le_bytes()),
        _ => {
            warn!("no wire encoding for {}-byte parameters", width);
            for _ in 0..width.min(out.capacity()) {
                out.push(0);
            }
        }
    }
    out
}

/// Render an identity-kind parameter word to its display string.
///
/// Returns `None` for unit kinds that have no string form.
pub fn render_ident(kind: UnitKind, raw: u16) -> Option<ArrayString<16>> {
    let mut s = ArrayString::new();
    match kind {
        UnitKind::DeviceId => {
            let model = raw & 0xff;
            match (raw >> 8) as u8 {
                DEVTYPE_ADVANCED => s.push_str("MD"),
                DEVTYPE_PATH_FOLLOWER => s.push_str("CP"),
                DEVTYPE_COMPACT => s.push_str("CS"),
                other => {
                    let _ = write!(s, "{}", other);
                }
            }
            let _ = write!(s, ".{}", model);
        }
        UnitKind::FirmwareVersion => {
            let _ = write!(s, "{}", FirmwareVersion::from_raw(raw));
        }
        UnitKind::HardwareVersion => {
            let minor = raw & 0xff;
            let major = (raw >> 8) as u8;
            if major < 26 {
                let _ = write!(s, "{}{}", (b'A' + major) as char, minor);
            } else {
                let _ = write!(
                    s,
                    "{}{}{}",
                    (b'A' + major / 26) as char,
                    (b'A' + major % 26) as char,
                    minor
                );
            }
        }
        _ => return None,
    }
    Some(s)
}

/// Sanitize a human-entered name in place before it goes on the wire
/// inside an XML-bearing payload.
///
/// Control characters become spaces; `< > & ' "` and anything at or
/// above 0x7f become underscores.
pub fn clean_for_xml(bytes: &mut [u8]) {
    for b in bytes.iter_mut() {
        *b = match *b {
            ch if ch < b' ' => b' ',
            ch if ch >= 0x7f => b'_',
            b'<' | b'>' | b'&' | b'\'' | b'"' => b'_',
            ch => ch,
        };
    }
}
