//! SELECT command construction
//!
//! Builds SELECT-by-AID command APDUs, optionally composing the AID from
//! a fixed vendor prefix, an assigned application id and a caller-supplied
//! suffix.

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::Error;
use crate::hex::decode_hex;

/// Vendor AID prefix prepended by [`select_by_app_id`]
pub const VENDOR_AID_PREFIX: &str = "A00000061700";

/// SELECT-by-name header: CLA=00, INS=A4, P1=04, P2=00
const SELECT_HEADER: [u8; 4] = [0x00, 0xA4, 0x04, 0x00];

/// GET RESPONSE command used to fetch continuation data after a 61 XX status
pub const GET_RESPONSE: [u8; 5] = [0x00, 0xC0, 0x00, 0x00, 0x00];

/// SELECT with an empty AID, usable as a harmless probe command
pub const SELECT_PROBE: [u8; 5] = [0x00, 0xA4, 0x04, 0x00, 0x00];

/// Build a SELECT command APDU from an application AID
///
/// Produces `00 A4 04 00 <len> <aid bytes>` where `<len>` is the single
/// length byte.
///
/// # Errors
/// Fails if `aid` is not well-formed hex or its byte length cannot be
/// represented in one length byte.
pub fn select_by_aid(aid: &str) -> Result<Bytes, Error> {
    let aid = decode_hex(aid)?;
    if aid.len() > 0xFF {
        return Err(Error::AidTooLong(aid.len()));
    }

    let mut buffer = BytesMut::with_capacity(SELECT_HEADER.len() + 1 + aid.len());
    buffer.put_slice(&SELECT_HEADER);
    buffer.put_u8(aid.len() as u8);
    buffer.put_slice(&aid);
    Ok(buffer.freeze())
}

/// Build a SELECT command APDU from an assigned application id
///
/// The AID is composed as vendor prefix ++ `app_id` ++ `suffix`, then
/// handed to [`select_by_aid`].
pub fn select_by_app_id(app_id: &str, suffix: &str) -> Result<Bytes, Error> {
    let aid = format!("{VENDOR_AID_PREFIX}{app_id}{suffix}");
    select_by_aid(&aid)
}
