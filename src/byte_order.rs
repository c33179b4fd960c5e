//! Helpers for explicit network byte-order conversions.
//!
//! These helpers keep Clippy expectations scoped to the conversion points so
//! protocol code can remain explicit about wire endianness without repeating
//! lint annotations. The frame header uses an unsigned length and a signed
//! type tag, so both flavours are provided.

/// Serialise a `u32` in network byte order (big-endian).
///
/// # Examples
///
/// ```
/// use tagwire::byte_order::write_network_u32;
///
/// assert_eq!(write_network_u32(0x1234_5678), [0x12, 0x34, 0x56, 0x78]);
/// ```
#[must_use]
pub fn write_network_u32(value: u32) -> [u8; 4] {
    #[expect(
        clippy::big_endian_bytes,
        reason = "Network byte order requires big-endian bytes."
    )]
    value.to_be_bytes()
}

/// Parse a network-order `u32` from its on-wire representation.
///
/// # Examples
///
/// ```
/// use tagwire::byte_order::read_network_u32;
///
/// assert_eq!(read_network_u32([0x12, 0x34, 0x56, 0x78]), 0x1234_5678);
/// ```
#[must_use]
pub fn read_network_u32(bytes: [u8; 4]) -> u32 {
    #[expect(
        clippy::big_endian_bytes,
        reason = "Network byte order requires big-endian bytes."
    )]
    u32::from_be_bytes(bytes)
}

/// Serialise an `i32` in network byte order (big-endian).
///
/// # Examples
///
/// ```
/// use tagwire::byte_order::write_network_i32;
///
/// assert_eq!(write_network_i32(1), [0x00, 0x00, 0x00, 0x01]);
/// assert_eq!(write_network_i32(-1), [0xFF, 0xFF, 0xFF, 0xFF]);
/// ```
#[must_use]
pub fn write_network_i32(value: i32) -> [u8; 4] {
    #[expect(
        clippy::big_endian_bytes,
        reason = "Network byte order requires big-endian bytes."
    )]
    value.to_be_bytes()
}

/// Parse a network-order `i32` from its on-wire representation.
///
/// # Examples
///
/// ```
/// use tagwire::byte_order::read_network_i32;
///
/// assert_eq!(read_network_i32([0x00, 0x00, 0x00, 0x01]), 1);
/// assert_eq!(read_network_i32([0xFF, 0xFF, 0xFF, 0xFF]), -1);
/// ```
#[must_use]
pub fn read_network_i32(bytes: [u8; 4]) -> i32 {
    #[expect(
        clippy::big_endian_bytes,
        reason = "Network byte order requires big-endian bytes."
    )]
    i32::from_be_bytes(bytes)
}

#[cfg(test)]
mod tests {
    //! Round-trip tests for network byte-order conversion helpers.

    use rstest::rstest;

    use super::{read_network_i32, read_network_u32, write_network_i32, write_network_u32};

    #[rstest]
    #[case(0u32, [0, 0, 0, 0])]
    #[case(1u32, [0, 0, 0, 1])]
    #[case(0x1234_5678u32, [0x12, 0x34, 0x56, 0x78])]
    #[case(u32::MAX, [0xFF, 0xFF, 0xFF, 0xFF])]
    fn unsigned_round_trip(#[case] value: u32, #[case] wire: [u8; 4]) {
        assert_eq!(write_network_u32(value), wire);
        assert_eq!(read_network_u32(wire), value);
    }

    #[rstest]
    #[case(0i32, [0, 0, 0, 0])]
    #[case(1i32, [0, 0, 0, 1])]
    #[case(-1i32, [0xFF, 0xFF, 0xFF, 0xFF])]
    #[case(i32::MIN, [0x80, 0, 0, 0])]
    #[case(i32::MAX, [0x7F, 0xFF, 0xFF, 0xFF])]
    fn signed_round_trip(#[case] value: i32, #[case] wire: [u8; 4]) {
        assert_eq!(write_network_i32(value), wire);
        assert_eq!(read_network_i32(wire), value);
    }
}
