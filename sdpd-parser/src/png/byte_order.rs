//! Byte order normalization
//!
//!     PNG stores every multi-byte integer big-endian. This module answers two questions
//!     for the scanner: what the host byte order is, and how a fixed-width value encoded
//!     in some byte order looks in host order.
//!
//!     The conversion works on raw byte arrays so that callers can then use the native
//!     `from_ne_bytes` constructors of the integer types.

/// Byte ordering of an encoded value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Little,
    Big,
}

impl Endian {
    /// The byte order of the machine we are running on.
    pub const fn host() -> Self {
        if cfg!(target_endian = "little") {
            Endian::Little
        } else {
            Endian::Big
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Endian::Little => "little-endian",
            Endian::Big => "big-endian",
        }
    }
}

pub fn host_is_little_endian() -> bool {
    Endian::host() == Endian::Little
}

/// Convert a value of width `N` encoded in `from` order into host order.
///
/// When the orders already agree the bytes are returned untouched.
pub fn to_host_order<const N: usize>(mut bytes: [u8; N], from: Endian) -> [u8; N] {
    if from != Endian::host() {
        bytes.reverse();
    }
    bytes
}

/// Decode a big-endian `u32` as stored in chunk length fields.
pub fn be_u32(bytes: [u8; 4]) -> u32 {
    u32::from_ne_bytes(to_host_order(bytes, Endian::Big))
}
