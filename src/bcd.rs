//! Packed BCD conversions for the PCF8563 time registers.
//!
//! The PCF8563 stores every time and date component as packed binary-coded
//! decimal: the high nibble holds the tens digit and the low nibble holds the
//! units digit. These helpers are pure and never fail; range handling is left
//! to the register layer.

/// Decodes a packed BCD byte into its binary value.
///
/// Bytes with nibbles above 9 are not rejected. They decode to a
/// deterministic value (at most 165 for `0xFF`) which callers clamp.
pub const fn decode(raw: u8) -> u8 {
    (raw >> 4) * 10 + (raw & 0x0F)
}

/// Encodes a binary value (0-99) as a packed BCD byte.
///
/// Callers must reduce the value into 0-99 first.
pub const fn encode(value: u8) -> u8 {
    (value / 10) * 16 + (value % 10)
}
