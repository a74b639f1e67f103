// Copyright (c) 2023 The Radix Ledger App Authors

//! Public key APDUs

use encdec::{Decode, Encode};

use crate::{
    helpers::arr, path::Bip32Path, ApduError, ApduStatic, Instruction, RADIX_APDU_CLA,
};

/// Length of a compressed secp256k1 public key
pub const PUBLIC_KEY_LEN: usize = 33;

/// Fetch the compressed public key for a key path, returns [PublicKeyResp]
///
/// ## Encoding:
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                                                               |
/// /                  BIP32_PATH (see [Bip32Path])                 /
/// |                                                               |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Copy, Clone, PartialEq, Debug, Encode, Decode)]
#[encdec(error = "ApduError")]
pub struct GetPublicKeyReq {
    pub path: Bip32Path,
}

impl ApduStatic for GetPublicKeyReq {
    const CLA: u8 = RADIX_APDU_CLA;
    const INS: u8 = Instruction::GetPublicKey as u8;
}

impl GetPublicKeyReq {
    pub fn new(path: Bip32Path) -> Self {
        Self { path }
    }
}

/// Compressed secp256k1 public key
///
/// ## Encoding:
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                                                               |
/// /                     PUBLIC_KEY (33 bytes)                     /
/// |                                                               |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Copy, Clone, PartialEq, Debug, Encode, Decode)]
#[encdec(error = "ApduError")]
pub struct PublicKeyResp {
    #[encdec(with = "arr")]
    pub public_key: [u8; PUBLIC_KEY_LEN],
}

impl ApduStatic for PublicKeyResp {
    const CLA: u8 = RADIX_APDU_CLA;
    const INS: u8 = Instruction::GetPublicKey as u8;
}

impl PublicKeyResp {
    pub fn new(public_key: [u8; PUBLIC_KEY_LEN]) -> Self {
        Self { public_key }
    }
}
