// Copyright (c) 2023 The Radix Ledger App Authors

//! Application version APDUs
//!
//! Used by hosts to confirm the radix application is running, which
//! version it is and which signing features it supports.

use encdec::{Decode, DecodeOwned, Encode};

use super::{ApduError, ApduStatic, Instruction, RADIX_APDU_CLA, RADIX_PROTO_VERSION};

/// Fetch application version, returns [AppInfoResp]
#[derive(Copy, Clone, PartialEq, Debug, Default, Encode, Decode)]
#[encdec(error = "ApduError")]
pub struct AppInfoReq;

impl ApduStatic for AppInfoReq {
    const CLA: u8 = RADIX_APDU_CLA;
    const INS: u8 = Instruction::GetAppInfo as u8;
}

/// Application version response APDU
///
/// The leading version triple is the complete reply of earlier app releases,
/// hosts reading only three bytes keep working.
///
/// ## Encoding
///
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |     MAJOR     |     MINOR     |     PATCH     |     PROTO     |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |             FLAGS             |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Copy, Clone, PartialEq, Debug, Encode, Decode)]
#[encdec(error = "ApduError")]
pub struct AppInfoResp {
    pub major: u8,
    pub minor: u8,
    pub patch: u8,

    /// Protocol version (see [RADIX_PROTO_VERSION])
    pub proto: u8,

    /// Supported signing features
    pub flags: AppFlags,
}

impl ApduStatic for AppInfoResp {
    const CLA: u8 = RADIX_APDU_CLA;
    const INS: u8 = Instruction::GetAppInfo as u8;
}

impl AppInfoResp {
    /// Create a version response for the current protocol
    pub fn new(version: [u8; 3], flags: AppFlags) -> Self {
        let [major, minor, patch] = version;

        Self {
            major,
            minor,
            patch,
            proto: RADIX_PROTO_VERSION,
            flags,
        }
    }

    pub fn version(&self) -> [u8; 3] {
        [self.major, self.minor, self.patch]
    }
}

bitflags::bitflags! {
    /// Application feature flags
    pub struct AppFlags: u16 {
        /// Streamed atom signing
        const HAS_SIGN_ATOM = 1 << 0;

        /// Signing host-provided hashes
        const HAS_SIGN_HASH = 1 << 1;

        /// Public key export via [GetPublicKeyReq][crate::public_key::GetPublicKeyReq]
        const HAS_PUBLIC_KEY = 1 << 2;

        /// Transfers are reported for review via [TransferReq][crate::atom::TransferReq]
        const HAS_TRANSFER_REVIEW = 1 << 8;
    }
}

impl Encode for AppFlags {
    type Error = ApduError;

    fn encode_len(&self) -> Result<usize, ApduError> {
        Ok(2)
    }

    fn encode(&self, buff: &mut [u8]) -> Result<usize, ApduError> {
        if buff.len() < 2 {
            return Err(ApduError::InvalidLength);
        }

        buff[..2].copy_from_slice(&self.bits().to_le_bytes());

        Ok(2)
    }
}

/// Unknown flags are dropped so older hosts accept newer apps
impl DecodeOwned for AppFlags {
    type Output = Self;

    type Error = ApduError;

    fn decode_owned(buff: &[u8]) -> Result<(Self::Output, usize), ApduError> {
        if buff.len() < 2 {
            return Err(ApduError::InvalidLength);
        }

        let bits = u16::from_le_bytes([buff[0], buff[1]]);

        Ok((AppFlags::from_bits_truncate(bits), 2))
    }
}
