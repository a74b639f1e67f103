// Copyright (c) 2023 The Radix Ledger App Authors

//! Decoder for cataloged DSON (CBOR) field values
//!
//! Each cataloged interval must cover exactly one value: a byte string
//! carrying a DSON type prefix for addresses, amounts and token ids,
//! or a text string for the serializer.

use byteorder::{BigEndian, ByteOrder};

use crate::apdu::atom::{ADDRESS_LEN, AMOUNT_LEN, TOKEN_ID_MAX_LEN};

use super::{catalog::FieldKind, Error};

/// CBOR major type for byte strings
const MAJOR_BYTES: u8 = 2;
/// CBOR major type for UTF-8 text strings
const MAJOR_TEXT: u8 = 3;

/// DSON prefix for addresses
pub const DSON_PREFIX_ADDRESS: u8 = 0x04;
/// DSON prefix for 256-bit unsigned integers
pub const DSON_PREFIX_UINT256: u8 = 0x05;
/// DSON prefix for resource identifiers (RRI)
pub const DSON_PREFIX_RRI: u8 = 0x06;

/// Decoded field payload, borrowed from the window
#[derive(Copy, Clone, PartialEq, Debug)]
pub enum FieldValue<'a> {
    Address(&'a [u8; ADDRESS_LEN]),
    Amount(&'a [u8; AMOUNT_LEN]),
    Serializer(&'a str),
    TokenId(&'a [u8]),
}

impl<'a> FieldValue<'a> {
    pub fn kind(&self) -> FieldKind {
        match self {
            FieldValue::Address(_) => FieldKind::Address,
            FieldValue::Amount(_) => FieldKind::Amount,
            FieldValue::Serializer(_) => FieldKind::Serializer,
            FieldValue::TokenId(_) => FieldKind::TokenId,
        }
    }
}

/// Decode the raw bytes of a cataloged interval as the expected field kind
#[cfg_attr(feature = "noinline", inline(never))]
pub fn decode_field(kind: FieldKind, raw: &[u8]) -> Result<FieldValue, Error> {
    let v = match kind {
        FieldKind::Address => {
            let p = prefixed_bytes(raw, DSON_PREFIX_ADDRESS)?;
            FieldValue::Address(p.try_into().map_err(|_| Error::MalformedEncoding)?)
        }
        FieldKind::Amount => {
            let p = prefixed_bytes(raw, DSON_PREFIX_UINT256)?;
            FieldValue::Amount(p.try_into().map_err(|_| Error::MalformedEncoding)?)
        }
        FieldKind::Serializer => {
            let p = payload(raw, MAJOR_TEXT)?;
            FieldValue::Serializer(core::str::from_utf8(p).map_err(|_| Error::MalformedEncoding)?)
        }
        FieldKind::TokenId => {
            let p = prefixed_bytes(raw, DSON_PREFIX_RRI)?;
            if p.is_empty() || p.len() > TOKEN_ID_MAX_LEN {
                return Err(Error::MalformedEncoding);
            }
            FieldValue::TokenId(p)
        }
    };

    Ok(v)
}

/// Fetch a byte string payload, checking and stripping the DSON prefix
fn prefixed_bytes(raw: &[u8], prefix: u8) -> Result<&[u8], Error> {
    match payload(raw, MAJOR_BYTES)? {
        [p, rest @ ..] if *p == prefix => Ok(rest),
        _ => {
            #[cfg(feature = "log")]
            log::error!("unexpected DSON prefix (expected {:02x})", prefix);

            Err(Error::MalformedEncoding)
        }
    }
}

/// Parse a CBOR string header, returning the payload
///
/// The header and payload must cover `raw` exactly.
fn payload(raw: &[u8], major: u8) -> Result<&[u8], Error> {
    let h = *raw.first().ok_or(Error::MalformedEncoding)?;

    if h >> 5 != major {
        #[cfg(feature = "log")]
        log::error!("unexpected CBOR major type {} (expected {})", h >> 5, major);

        return Err(Error::MalformedEncoding);
    }

    let (len, header_len) = match h & 0x1f {
        n @ 0..=23 => (n as usize, 1),
        24 if raw.len() >= 2 => (raw[1] as usize, 2),
        25 if raw.len() >= 3 => (BigEndian::read_u16(&raw[1..3]) as usize, 3),
        _ => return Err(Error::MalformedEncoding),
    };

    if header_len + len != raw.len() {
        #[cfg(feature = "log")]
        log::error!(
            "CBOR length {} does not match field length {}",
            header_len + len,
            raw.len()
        );

        return Err(Error::MalformedEncoding);
    }

    Ok(&raw[header_len..])
}
