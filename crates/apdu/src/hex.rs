//! Hexadecimal encoding and decoding of byte sequences
//!
//! The textual form is always two characters per byte with no separators.
//! Encoding produces uppercase; decoding accepts either case.

use crate::error::Error;

/// Encode a byte sequence into its uppercase hexadecimal representation
pub fn encode_hex<T: AsRef<[u8]>>(bytes: T) -> String {
    hex::encode_upper(bytes)
}

/// Decode a hex string into a byte sequence
///
/// Case-insensitive on input. Fails if the input has an odd number of
/// characters or contains a non-hex digit.
pub fn decode_hex<T: AsRef<[u8]>>(input: T) -> Result<Vec<u8>, Error> {
    Ok(hex::decode(input)?)
}
