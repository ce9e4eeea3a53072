//! Fixed-width little-endian encodings of instruction operands.
//!
//! Patched operands are either 32-bit immediates or 32-bit IEEE-754 constants,
//! both stored little-endian in the module image.

use crate::error::CodecError;

/// Width in bytes of every encoded value
pub const WIDTH: usize = 4;

/// A value with a fixed 4-byte little-endian layout.
pub trait LeBytes: Sized + Copy {
    /// Encode the value as 4 little-endian bytes.
    fn to_bytes(self) -> [u8; WIDTH];

    /// Decode a value from the first 4 bytes of `bytes`.
    ///
    /// Fails when fewer than 4 bytes are given. Trailing bytes are ignored.
    fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError>;
}

impl LeBytes for u32 {
    fn to_bytes(self) -> [u8; WIDTH] {
        self.to_le_bytes()
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        Ok(u32::from_le_bytes(leading(bytes)?))
    }
}

impl LeBytes for f32 {
    fn to_bytes(self) -> [u8; WIDTH] {
        self.to_le_bytes()
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        Ok(f32::from_le_bytes(leading(bytes)?))
    }
}

fn leading(bytes: &[u8]) -> Result<[u8; WIDTH], CodecError> {
    bytes
        .get(..WIDTH)
        .and_then(|slice| slice.try_into().ok())
        .ok_or(CodecError::TooShort {
            expected: WIDTH,
            actual: bytes.len(),
        })
}

/// Encode `value` as a 32-bit little-endian integer.
pub fn u32_to_bytes(value: u32) -> [u8; WIDTH] {
    value.to_bytes()
}

/// Encode `value` in its IEEE-754 little-endian layout.
pub fn f32_to_bytes(value: f32) -> [u8; WIDTH] {
    value.to_bytes()
}

/// Reinterpret the first 4 bytes as an IEEE-754 float.
pub fn f32_from_bytes(bytes: &[u8]) -> Result<f32, CodecError> {
    f32::from_bytes(bytes)
}
