// Copyright (c) 2023 The Radix Ledger App Authors

//! Per-item accumulator for transfer fields

use heapless::Vec;
use zeroize::Zeroize;

use crate::apdu::atom::{ADDRESS_LEN, AMOUNT_LEN, TOKEN_ID_MAX_LEN};

use super::{decode::FieldValue, Error, TRANSFER_SERIALIZER};

bitflags::bitflags! {
    /// Fields applied to the current item
    #[derive(Default)]
    pub struct TransferFlags: u8 {
        const ADDRESS = 1 << 0;
        const AMOUNT = 1 << 1;
        const SERIALIZER = 1 << 2;
        const TOKEN_ID = 1 << 3;
    }
}

/// Token transfer extracted from an atom
#[derive(Clone, PartialEq, Debug)]
pub struct Transfer {
    /// Recipient address (magic byte, compressed public key, checksum)
    pub address: [u8; ADDRESS_LEN],
    /// Big-endian 256-bit amount
    pub amount: [u8; AMOUNT_LEN],
    /// Token definition reference
    pub token_id: Vec<u8, TOKEN_ID_MAX_LEN>,
}

impl Transfer {
    pub const fn new() -> Self {
        Self {
            address: [0u8; ADDRESS_LEN],
            amount: [0u8; AMOUNT_LEN],
            token_id: Vec::new(),
        }
    }

    /// Compressed public key carried by the recipient address
    pub fn public_key(&self) -> &[u8] {
        &self.address[1..34]
    }

    /// Check whether the recipient address belongs to the provided public key
    pub fn is_to(&self, public_key: &[u8; 33]) -> bool {
        self.public_key() == &public_key[..]
    }
}

impl Default for Transfer {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of applying a field to a [TransferBuilder]
#[derive(Copy, Clone, PartialEq, Debug)]
pub enum Outcome {
    /// Field stored, more fields required
    PartialProgress,
    /// Serializer identifies a non-transfer item
    NonTransferItem,
    /// Final field of a transfer applied
    TransferComplete,
}

/// Accumulates fields for the current item, enforcing
/// address, amount, serializer, token id ordering
#[derive(Clone, PartialEq, Debug, Default)]
pub struct TransferBuilder {
    flags: TransferFlags,
    transfer: Transfer,
}

impl TransferBuilder {
    pub const fn new() -> Self {
        Self {
            flags: TransferFlags::empty(),
            transfer: Transfer::new(),
        }
    }

    pub fn flags(&self) -> TransferFlags {
        self.flags
    }

    /// Completed transfer, if any
    pub fn transfer(&self) -> Option<&Transfer> {
        match self.flags.is_all() {
            true => Some(&self.transfer),
            false => None,
        }
    }

    /// Apply a decoded field to the current item
    pub fn apply(&mut self, value: FieldValue) -> Result<Outcome, Error> {
        let value_fields = TransferFlags::ADDRESS | TransferFlags::AMOUNT;

        let outcome = match value {
            FieldValue::Address(a) => {
                self.expect(TransferFlags::empty())?;
                self.transfer.address.copy_from_slice(a);
                self.flags |= TransferFlags::ADDRESS;

                Outcome::PartialProgress
            }
            FieldValue::Amount(a) => {
                self.expect(TransferFlags::ADDRESS)?;
                self.transfer.amount.copy_from_slice(a);
                self.flags |= TransferFlags::AMOUNT;

                Outcome::PartialProgress
            }
            FieldValue::Serializer(s) => {
                if self.flags.contains(TransferFlags::SERIALIZER) {
                    return Err(Error::SequenceViolation);
                }

                // The serializer must agree with the fields already applied
                let is_transfer = s == TRANSFER_SERIALIZER;
                match (is_transfer, self.flags) {
                    (true, f) if f == value_fields => (),
                    (false, f) if f.is_empty() => (),
                    _ => {
                        #[cfg(feature = "log")]
                        log::error!("serializer '{}' does not match item fields", s);

                        return Err(Error::ProtocolMismatch);
                    }
                }

                self.flags |= TransferFlags::SERIALIZER;

                match is_transfer {
                    true => Outcome::PartialProgress,
                    false => Outcome::NonTransferItem,
                }
            }
            FieldValue::TokenId(t) => {
                self.expect(value_fields | TransferFlags::SERIALIZER)?;
                self.transfer.token_id =
                    Vec::from_slice(t).map_err(|_| Error::MalformedEncoding)?;
                self.flags |= TransferFlags::TOKEN_ID;

                Outcome::TransferComplete
            }
        };

        Ok(outcome)
    }

    /// Clear the builder for the next item
    pub fn reset(&mut self) {
        self.flags = TransferFlags::empty();
        self.transfer.address.zeroize();
        self.transfer.amount.zeroize();
        self.transfer.token_id.clear();
    }

    fn expect(&self, flags: TransferFlags) -> Result<(), Error> {
        if self.flags != flags {
            #[cfg(feature = "log")]
            log::error!("field applied with {:?}, expected {:?}", self.flags, flags);

            return Err(Error::SequenceViolation);
        }

        Ok(())
    }
}
