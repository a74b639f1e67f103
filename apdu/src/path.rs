// Copyright (c) 2023 The Radix Ledger App Authors

//! BIP32 key paths for signing requests
//!
//! The host supplies only the account, change and address index components,
//! purpose and coin type are fixed by the application.

use encdec::{DecodeOwned, Encode};

use crate::ApduError;

/// Hardened derivation flag
pub const HARDENED: u32 = 1 << 31;

/// BIP44 purpose component (hardened)
pub const BIP32_PURPOSE: u32 = 44 | HARDENED;

/// Radix coin type component (hardened)
pub const BIP32_COIN_TYPE: u32 = 536 | HARDENED;

/// Key path tail supplied by the host
///
/// ## Encoding:
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                            ACCOUNT                            |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                            CHANGE                             |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                         ADDRESS_INDEX                         |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default, Encode)]
#[encdec(error = "ApduError")]
pub struct Bip32Path {
    /// Account index (always hardened on derivation)
    pub account: u32,
    /// Change flag, must be 0 or 1
    pub change: u32,
    /// Address index
    pub address_index: u32,
}

impl Bip32Path {
    /// Encoded length of a [`Bip32Path`]
    pub const LEN: usize = 12;

    /// Create a new path, `change` must be 0 or 1
    pub fn new(account: u32, change: u32, address_index: u32) -> Result<Self, ApduError> {
        if change > 1 {
            return Err(ApduError::InvalidEncoding);
        }

        Ok(Self {
            account,
            change,
            address_index,
        })
    }

    /// Full derivation path (`44'/536'/account'/change/address_index`)
    pub fn components(&self) -> [u32; 5] {
        [
            BIP32_PURPOSE,
            BIP32_COIN_TYPE,
            self.account | HARDENED,
            self.change,
            self.address_index,
        ]
    }
}

impl core::fmt::Display for Bip32Path {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "44'/536'/{}'/{}/{}",
            self.account & !HARDENED,
            self.change,
            self.address_index
        )
    }
}

impl DecodeOwned for Bip32Path {
    type Output = Self;

    type Error = ApduError;

    fn decode_owned(buff: &[u8]) -> Result<(Self::Output, usize), Self::Error> {
        if buff.len() < Self::LEN {
            return Err(ApduError::InvalidLength);
        }

        let mut c = [0u32; 3];
        for (i, v) in c.iter_mut().enumerate() {
            let mut b = [0u8; 4];
            b.copy_from_slice(&buff[i * 4..][..4]);
            *v = u32::from_le_bytes(b);
        }

        let [account, change, address_index] = c;

        let p = Self::new(account, change, address_index)?;

        Ok((p, Self::LEN))
    }
}
