// Copyright (c) 2023 The Radix Ledger App Authors

//! Application State APDUs
//!

use encdec::{DecodeOwned, Encode};
use ledger_proto::ApduError;
use num_enum::TryFromPrimitive;
use strum::{Display, EnumIter, EnumString, EnumVariantNames};

/// Engine state enumeration
/// used in [`AtomInfo`][crate::atom::AtomInfo] to communicate signing progress
#[derive(
    Copy, Clone, PartialEq, Debug, EnumString, Display, EnumVariantNames, EnumIter, TryFromPrimitive,
)]
#[repr(u8)]
pub enum AtomState {
    Init = 0x00,
    Catalog = 0x01,
    Stream = 0x02,
    PendingTransfer = 0x10,
    PendingNonTransfer = 0x11,
    PendingHash = 0x12,
    Ready = 0x20,
    Complete = 0x40,
    Denied = 0x41,
    Error = 0xFF,
}

impl AtomState {
    /// Check whether the engine is waiting on user review
    pub fn is_pending(&self) -> bool {
        matches!(
            self,
            AtomState::PendingTransfer | AtomState::PendingNonTransfer | AtomState::PendingHash
        )
    }
}

impl Encode for AtomState {
    type Error = ApduError;

    fn encode_len(&self) -> Result<usize, ApduError> {
        Ok(1)
    }

    fn encode(&self, buff: &mut [u8]) -> Result<usize, ApduError> {
        if buff.is_empty() {
            return Err(ApduError::InvalidLength);
        }

        buff[0] = *self as u8;
        Ok(1)
    }
}

impl DecodeOwned for AtomState {
    type Output = Self;

    type Error = ApduError;

    fn decode_owned(buff: &[u8]) -> Result<(Self::Output, usize), ApduError> {
        if buff.is_empty() {
            return Err(ApduError::InvalidLength);
        }

        match Self::try_from(buff[0]) {
            Ok(v) => Ok((v, 1)),
            Err(_) => Err(ApduError::InvalidEncoding),
        }
    }
}

/// Atom digest, the double SHA-256 of the streamed atom bytes
/// as signed by the device
#[derive(Copy, Clone, PartialEq, Default, Encode)]
pub struct Digest([u8; 32]);

impl Digest {
    /// Create a new (empty) digest
    pub const fn new() -> Self {
        Self([0u8; 32])
    }

    /// Access raw digest bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl From<[u8; 32]> for Digest {
    fn from(d: [u8; 32]) -> Self {
        Self(d)
    }
}

/// Debug format [Digest] as hex
impl core::fmt::Debug for Digest {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        for b in &self.0[..] {
            write!(f, "{b:02x}")?;
        }
        Ok(())
    }
}

/// Display [Digest] as hex
impl core::fmt::Display for Digest {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        for b in &self.0[..] {
            write!(f, "{b:02x}")?;
        }
        Ok(())
    }
}

/// Decode [Digest] into owned array
impl DecodeOwned for Digest {
    type Output = Digest;

    type Error = encdec::Error;

    fn decode_owned(buff: &[u8]) -> Result<(Self::Output, usize), Self::Error> {
        if buff.len() < 32 {
            return Err(encdec::Error::Length);
        }

        let mut d = [0u8; 32];
        d.copy_from_slice(&buff[..32]);
        Ok((Self(d), 32))
    }
}
