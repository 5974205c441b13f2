//! The two-byte status word closing every response APDU

use std::fmt;

/// SW1-SW2 pair carried in the last two bytes of a response
///
/// Plain value type; the predicates below cover the two statuses this
/// system branches on, everything else is compared against an expected
/// value verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatusWord {
    /// SW1, the status category byte
    pub sw1: u8,
    /// SW2, the qualifier byte
    pub sw2: u8,
}

impl StatusWord {
    /// Build a status word from its two raw bytes
    pub const fn new(sw1: u8, sw2: u8) -> Self {
        Self { sw1, sw2 }
    }

    /// Build a status word from its big-endian `u16` form, SW1 in the
    /// high byte
    pub const fn from_u16(status: u16) -> Self {
        Self {
            sw1: (status >> 8) as u8,
            sw2: status as u8,
        }
    }

    /// The big-endian `u16` form, SW1 in the high byte
    pub const fn to_u16(&self) -> u16 {
        ((self.sw1 as u16) << 8) | (self.sw2 as u16)
    }

    /// Whether this is the unconditional success status (90 00)
    pub const fn is_success(&self) -> bool {
        self.sw1 == 0x90 && self.sw2 == 0x00
    }

    /// Whether this status asks for a continuation fetch (61 XX)
    ///
    /// A continuation signal, not success: SW2 carries the remaining
    /// length and the rest must be pulled with a GET RESPONSE command.
    pub const fn is_more_data_available(&self) -> bool {
        self.sw1 == 0x61
    }

    /// The pending byte count of a 61 XX status, `None` otherwise
    pub const fn remaining_bytes(&self) -> Option<u8> {
        if self.is_more_data_available() {
            Some(self.sw2)
        } else {
            None
        }
    }
}

impl fmt::Display for StatusWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02X} {:02X}", self.sw1, self.sw2)
    }
}

/// Common status words
pub mod common {
    use super::StatusWord;

    /// Success (90 00)
    pub const SUCCESS: StatusWord = StatusWord::new(0x90, 0x00);

    /// File or application not found (6A 82)
    pub const FILE_NOT_FOUND: StatusWord = StatusWord::new(0x6A, 0x82);
}
