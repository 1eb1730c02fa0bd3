//! 24-bit flash addresses

/// Number of address bytes sent after the opcode
pub const ADDRESS_LEN: usize = 3;

/// Size of the space reachable with a 3-byte address (16 MiB)
pub const ADDRESS_SPACE: u32 = 1 << 24;

/// Encode an address as 3 big-endian bytes
///
/// Bits above bit 23 are dropped.
pub const fn encode_address(addr: u32) -> [u8; ADDRESS_LEN] {
    [(addr >> 16) as u8, (addr >> 8) as u8, addr as u8]
}
