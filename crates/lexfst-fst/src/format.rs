// Compiled dictionary header: parsing, validation and writing.

use lexfst_core::Direction;

use crate::FstError;

/// Header magic constants (little-endian).
const COOKIE1: u32 = 0x7846_4C6C;
const COOKIE2: u32 = 0x0000_0001;

/// Size of the binary header in bytes.
pub const HEADER_SIZE: usize = 16;

/// Parsed header of a compiled dictionary.
///
/// The header occupies the first 16 bytes:
/// - bytes 0..4: cookie1 (magic number)
/// - bytes 4..8: cookie2 (format version)
/// - byte 8: feature flags (must be zero)
/// - byte 9: compilation direction (0 = lr, 1 = rl)
/// - bytes 10..16: reserved (zero)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub direction: Direction,
}

/// Parses and validates the 16-byte header.
pub fn parse_header(data: &[u8]) -> Result<Header, FstError> {
    if data.len() < HEADER_SIZE {
        return Err(FstError::TooShort {
            expected: HEADER_SIZE,
            actual: data.len(),
        });
    }

    let cookie1 = u32::from_le_bytes([data[0], data[1], data[2], data[3]]);
    let cookie2 = u32::from_le_bytes([data[4], data[5], data[6], data[7]]);

    if cookie1 != COOKIE1 || cookie2 != COOKIE2 {
        return Err(FstError::InvalidMagic);
    }
    if data[8] != 0 {
        return Err(FstError::UnsupportedFeatures(data[8]));
    }
    let direction = Direction::from_byte(data[9]).ok_or(FstError::InvalidDirection(data[9]))?;

    Ok(Header { direction })
}

/// Append the 16-byte header to `out`.
pub fn write_header(out: &mut Vec<u8>, header: &Header) {
    let mut buf = [0u8; HEADER_SIZE];
    buf[..4].copy_from_slice(&COOKIE1.to_le_bytes());
    buf[4..8].copy_from_slice(&COOKIE2.to_le_bytes());
    buf[9] = header.direction.to_byte();
    out.extend_from_slice(&buf);
}
