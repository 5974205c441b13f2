//! APDU protocol utilities for ISO/IEC 7816-4 smartcards
//!
//! This crate provides the protocol layer for talking to a smartcard-like
//! device over a proximity link:
//!
//! - Hex encoding and decoding of byte sequences
//! - SELECT-by-AID command construction
//! - Response status word extraction and comparison
//! - Chained transceive for responses delivered in multiple parts (61 XX)
//! - Status-enforcing transceive helpers
//! - The [`IsoCard`] capability trait hiding host-platform differences
//!
//! All protocol-layer errors propagate synchronously to the direct caller;
//! nothing in this crate retries.
#![forbid(unsafe_code)]
#![warn(missing_docs, rustdoc::missing_crate_level_docs)]

// Re-export bytes for convenience
pub use bytes::{Bytes, BytesMut};

pub mod card;
pub mod command;
pub mod error;
pub mod hex;
pub mod response;
pub mod status;
pub mod transceive;

pub use card::IsoCard;
pub use command::{select_by_aid, select_by_app_id};
pub use error::{Error, TransportError};
pub use hex::{decode_hex, encode_hex};
pub use response::{has_status, response_data, status_bytes};
pub use status::StatusWord;
pub use transceive::{transceive_chained, transceive_require_ok, transceive_require_status};

/// Prelude module containing commonly used traits and types
pub mod prelude {
    pub use crate::{Bytes, BytesMut, Error, TransportError};

    pub use crate::card::IsoCard;
    pub use crate::command::{GET_RESPONSE, select_by_aid, select_by_app_id};
    pub use crate::hex::{decode_hex, encode_hex};
    pub use crate::response::{has_status, response_data, status_bytes};
    pub use crate::status::{StatusWord, common as status};
    pub use crate::transceive::{
        transceive_chained, transceive_require_ok, transceive_require_status,
    };
}
