// Copyright (c) 2023 The Radix Ledger App Authors

//! Hash signing APDU

use encdec::{Decode, Encode};

use crate::{
    helpers::arr, path::Bip32Path, ApduError, ApduStatic, Instruction, RADIX_APDU_CLA,
};

/// Request signing of a host-provided hash, returns [AtomInfo][crate::atom::AtomInfo]
///
/// Once the hash is approved the signature is fetched with
/// [SignatureReq][crate::atom::SignatureReq].
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
/// |                                                               |
/// /                         HASH (32 bytes)                       /
/// |                                                               |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Copy, Clone, PartialEq, Debug, Encode, Decode)]
#[encdec(error = "ApduError")]
pub struct SignHashReq {
    /// Signing key path
    pub path: Bip32Path,

    /// Hash to be signed
    #[encdec(with = "arr")]
    pub hash: [u8; 32],
}

impl ApduStatic for SignHashReq {
    const CLA: u8 = RADIX_APDU_CLA;
    const INS: u8 = Instruction::SignHash as u8;
}

impl SignHashReq {
    pub fn new(path: Bip32Path, hash: [u8; 32]) -> Self {
        Self { path, hash }
    }
}
