// Copyright (c) 2023 The Radix Ledger App Authors

//! Field catalog, the host-declared location of every reviewed field

use heapless::Vec;
use strum::{Display, EnumIter, EnumString, EnumVariantNames};

use crate::apdu::atom::FieldCatalogEntry;

use super::{interval::ByteInterval, transfer::TransferFlags, Error, MAX_FIELD_SIZE, MAX_ITEMS};

/// Kind of a cataloged field, in stream order
#[derive(Copy, Clone, PartialEq, Debug, EnumString, Display, EnumVariantNames, EnumIter)]
pub enum FieldKind {
    Address,
    Amount,
    Serializer,
    TokenId,
}

/// Field locations for a single item
#[derive(Copy, Clone, PartialEq, Debug, Default)]
pub struct CatalogEntry {
    pub address: ByteInterval,
    pub amount: ByteInterval,
    pub serializer: ByteInterval,
    pub token_id: ByteInterval,
}

impl CatalogEntry {
    /// Interval for the provided field kind
    pub fn interval(&self, kind: FieldKind) -> ByteInterval {
        match kind {
            FieldKind::Address => self.address,
            FieldKind::Amount => self.amount,
            FieldKind::Serializer => self.serializer,
            FieldKind::TokenId => self.token_id,
        }
    }

    /// Transferrable items carry address, amount and token id fields
    pub fn is_transferrable(&self) -> bool {
        !self.address.is_empty()
    }

    /// Fields present for this item, in stream order
    pub fn fields(&self) -> impl Iterator<Item = (FieldKind, ByteInterval)> + '_ {
        [
            FieldKind::Address,
            FieldKind::Amount,
            FieldKind::Serializer,
            FieldKind::TokenId,
        ]
        .into_iter()
        .map(|k| (k, self.interval(k)))
        .filter(|(_, i)| !i.is_empty())
    }

    /// Check entry is either fully transferrable or serializer-only
    fn check_shape(&self) -> Result<(), Error> {
        let value_fields = [self.address, self.amount, self.token_id];

        let all_set = value_fields.iter().all(|i| !i.is_empty());
        let none_set = value_fields.iter().all(|i| i.is_empty());

        if self.serializer.is_empty() || !(all_set || none_set) {
            return Err(Error::ProtocolMismatch);
        }

        Ok(())
    }
}

impl From<FieldCatalogEntry> for CatalogEntry {
    fn from(e: FieldCatalogEntry) -> Self {
        Self {
            address: e.address.into(),
            amount: e.amount.into(),
            serializer: e.serializer.into(),
            token_id: e.token_id.into(),
        }
    }
}

/// Ordered catalog of items for an atom
///
/// Entries are validated on insertion so every accepted catalog describes
/// fields that fit the window, lie within the atom and appear in stream order.
#[derive(Clone, PartialEq, Debug)]
pub struct FieldCatalog {
    entries: Vec<CatalogEntry, MAX_ITEMS>,
    atom_len: usize,
    last_end: usize,
}

impl FieldCatalog {
    /// Create an empty catalog for an atom of `atom_len` bytes
    pub const fn new(atom_len: u16) -> Self {
        Self {
            entries: Vec::new(),
            atom_len: atom_len as usize,
            last_end: 0,
        }
    }

    /// Validate and append an entry
    pub fn push(&mut self, entry: CatalogEntry) -> Result<(), Error> {
        entry.check_shape()?;

        let mut last_end = self.last_end;

        for (_kind, i) in entry.fields() {
            if i.len() > MAX_FIELD_SIZE {
                #[cfg(feature = "log")]
                log::error!("{} field length {} exceeds maximum", _kind, i.len());

                return Err(Error::CapacityExceeded);
            }

            if i.end() > self.atom_len || i.start() < last_end {
                #[cfg(feature = "log")]
                log::error!("{} field {:?} out of order or past atom end", _kind, i);

                return Err(Error::ProtocolMismatch);
            }

            last_end = i.end();
        }

        self.entries
            .push(entry)
            .map_err(|_| Error::CapacityExceeded)?;
        self.last_end = last_end;

        Ok(())
    }

    pub fn get(&self, index: usize) -> Option<&CatalogEntry> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Select the next field to parse for an item given the fields already applied.
///
/// Returns `None` once every field of the item has been applied.
pub fn next_field_for(
    entry: &CatalogEntry,
    flags: TransferFlags,
) -> Option<(FieldKind, ByteInterval)> {
    let kind = if !entry.is_transferrable() {
        match flags.contains(TransferFlags::SERIALIZER) {
            false => FieldKind::Serializer,
            true => return None,
        }
    } else if !flags.contains(TransferFlags::ADDRESS) {
        FieldKind::Address
    } else if !flags.contains(TransferFlags::AMOUNT) {
        FieldKind::Amount
    } else if !flags.contains(TransferFlags::SERIALIZER) {
        FieldKind::Serializer
    } else if !flags.contains(TransferFlags::TOKEN_ID) {
        FieldKind::TokenId
    } else {
        return None;
    };

    Some((kind, entry.interval(kind)))
}
