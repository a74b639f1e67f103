// Copyright (c) 2023 The Radix Ledger App Authors

//! Streaming atom parser
//!
//! Each chunk is hashed, merged into the [StreamWindow] and scanned for the
//! next cataloged field. Fields are decoded once fully present, fields that
//! straddle a chunk boundary are retained for completion by the next chunk.
//! Completed items suspend parsing for user review, parsing resumes from the
//! bytes still held in the window on approval.

use strum::{Display, EnumIter, EnumString, EnumVariantNames};

use crate::apdu::{atom::FieldCatalogEntry, path::Bip32Path};

use super::{
    catalog::{next_field_for, FieldCatalog},
    counter::ItemCounter,
    decode::decode_field,
    hasher::AtomHasher,
    transfer::{Outcome, Transfer, TransferBuilder},
    window::StreamWindow,
    Error, MAX_CHUNK_SIZE,
};

/// Points at which signing suspends for user review
#[derive(
    Copy, Clone, PartialEq, Debug, Default, EnumString, Display, EnumVariantNames, EnumIter,
)]
pub enum Review {
    /// Transfer to a third party
    #[default]
    Transfer,
    /// Item carrying non-transfer data
    NonTransfer,
    /// Final digest prior to signing
    Hash,
}

/// Parser progress following new input or approval
#[derive(Copy, Clone, PartialEq, Debug)]
pub enum Step {
    /// Awaiting further atom bytes
    NeedMore,
    /// Suspended pending user review
    Review(Review),
}

/// State for a single atom signing session
pub struct ParseSession {
    path: Bip32Path,
    own_key: [u8; 33],

    catalog: FieldCatalog,
    counter: ItemCounter,
    window: StreamWindow,
    builder: TransferBuilder,
    hasher: AtomHasher,

    item: usize,
    pending: Option<Review>,
    blanket_accept: bool,

    signature: Option<[u8; 64]>,
}

impl ParseSession {
    /// Create a new session, `own_key` is the compressed public key for `path`
    pub fn new(
        path: Bip32Path,
        own_key: [u8; 33],
        atom_len: u16,
        num_items: u8,
        num_transfers: u8,
    ) -> Result<Self, Error> {
        if atom_len == 0 {
            return Err(Error::InvalidLength);
        }

        Ok(Self {
            path,
            own_key,
            catalog: FieldCatalog::new(atom_len),
            counter: ItemCounter::new(num_items, num_transfers)?,
            window: StreamWindow::new(),
            builder: TransferBuilder::new(),
            hasher: AtomHasher::new(atom_len),
            item: 0,
            pending: None,
            blanket_accept: false,
            signature: None,
        })
    }

    /// Number of catalog entries still expected
    pub fn catalog_remaining(&self) -> usize {
        self.counter.total() as usize - self.catalog.len()
    }

    /// Load catalog entries, returning the number still expected
    #[cfg_attr(feature = "noinline", inline(never))]
    pub fn load_catalog(&mut self, entries: &[FieldCatalogEntry]) -> Result<usize, Error> {
        if entries.len() > self.catalog_remaining() {
            #[cfg(feature = "log")]
            log::error!(
                "{} catalog entries exceed declared items ({} remaining)",
                entries.len(),
                self.catalog_remaining()
            );

            return Err(Error::ProtocolMismatch);
        }

        for e in entries {
            self.catalog.push((*e).into())?;
        }

        Ok(self.catalog_remaining())
    }

    /// Hash and parse the next chunk of the atom
    #[cfg_attr(feature = "noinline", inline(never))]
    pub fn push_chunk(&mut self, chunk: &[u8]) -> Result<Step, Error> {
        if self.pending.is_some() {
            return Err(Error::ApprovalPending);
        }
        if self.catalog_remaining() != 0 {
            return Err(Error::InvalidState);
        }
        if chunk.is_empty() || chunk.len() > MAX_CHUNK_SIZE {
            return Err(Error::InvalidLength);
        }

        // Every byte is hashed, including those later retained as spillover
        self.hasher.update(chunk)?;

        // Once every item is identified remaining bytes are only hashed
        if !self.counter.is_complete() {
            self.window.append(chunk)?;
        }

        #[cfg(feature = "log")]
        log::debug!(
            "chunk of {} bytes, consumed {}/{}, window {}..{}",
            chunk.len(),
            self.hasher.consumed(),
            self.hasher.total(),
            self.window.start(),
            self.window.end()
        );

        self.parse()
    }

    /// Accept the item under review and resume parsing
    #[cfg_attr(feature = "noinline", inline(never))]
    pub fn approve(&mut self) -> Result<Step, Error> {
        match self.pending {
            Some(Review::Transfer) => (),
            Some(Review::NonTransfer) => self.blanket_accept = true,
            _ => return Err(Error::InvalidState),
        }

        self.pending = None;
        self.builder.reset();

        self.parse()
    }

    fn parse(&mut self) -> Result<Step, Error> {
        while !self.counter.is_complete() {
            let entry = self.catalog.get(self.item).ok_or(Error::InvalidState)?;
            let (kind, interval) =
                next_field_for(entry, self.builder.flags()).ok_or(Error::InvalidState)?;

            // Fields already discarded can not be recovered
            if interval.start() < self.window.start() {
                #[cfg(feature = "log")]
                log::error!("{} field {:?} precedes window", kind, interval);

                return Err(Error::ProtocolMismatch);
            }

            // Field not yet started, discard skipped bytes
            if interval.start() >= self.window.end() {
                self.window.consume_to(interval.start());
                return self.wait();
            }

            // Field straddles the chunk boundary
            if interval.end() > self.window.end() {
                self.window.retain_spillover(interval.start());
                return self.wait();
            }

            let raw = self.window.slice(&interval).ok_or(Error::InvalidState)?;
            let value = decode_field(kind, raw)?;
            let outcome = self.builder.apply(value)?;

            #[cfg(feature = "log")]
            log::debug!("item {} {} field {:?}: {:?}", self.item, kind, interval, outcome);

            self.window.consume_to(interval.end());

            match outcome {
                Outcome::PartialProgress => (),
                Outcome::NonTransferItem => {
                    self.counter.identified_other()?;
                    self.item += 1;

                    if !self.blanket_accept {
                        return Ok(self.suspend(Review::NonTransfer));
                    }
                    self.builder.reset();
                }
                Outcome::TransferComplete => {
                    self.counter.identified_transfer()?;
                    self.item += 1;

                    let own = match self.builder.transfer() {
                        Some(t) => t.is_to(&self.own_key),
                        None => false,
                    };
                    if !own {
                        return Ok(self.suspend(Review::Transfer));
                    }

                    #[cfg(feature = "log")]
                    log::debug!("transfer to own address, skipping review");

                    self.builder.reset();
                }
            }
        }

        self.window.clear();

        match self.hasher.is_complete() {
            true => Ok(self.suspend(Review::Hash)),
            false => Ok(Step::NeedMore),
        }
    }

    fn wait(&self) -> Result<Step, Error> {
        if self.hasher.is_complete() {
            #[cfg(feature = "log")]
            log::error!(
                "atom ended with {} of {} items identified",
                self.item,
                self.counter.total()
            );

            return Err(Error::ProtocolMismatch);
        }

        Ok(Step::NeedMore)
    }

    fn suspend(&mut self, review: Review) -> Step {
        #[cfg(feature = "log")]
        log::debug!("suspending for {} review", review);

        self.pending = Some(review);
        Step::Review(review)
    }

    /// Review currently pending, if any
    pub fn pending(&self) -> Option<Review> {
        self.pending
    }

    /// Transfer awaiting review
    pub fn transfer(&self) -> Option<&Transfer> {
        match self.pending {
            Some(Review::Transfer) => self.builder.transfer(),
            _ => None,
        }
    }

    pub fn path(&self) -> &Bip32Path {
        &self.path
    }

    /// Atom digest, available once the final byte has been hashed
    pub fn digest(&self) -> Option<&[u8; 32]> {
        self.hasher.digest()
    }

    pub fn counter(&self) -> &ItemCounter {
        &self.counter
    }

    pub fn consumed(&self) -> usize {
        self.hasher.consumed()
    }

    /// Percentage of the atom hashed so far
    pub fn progress(&self) -> usize {
        self.hasher.consumed() * 100 / self.hasher.total()
    }

    pub fn window(&self) -> &StreamWindow {
        &self.window
    }

    /// Store the signature following approval of the digest
    pub fn set_signature(&mut self, signature: [u8; 64]) -> Result<(), Error> {
        if self.pending != Some(Review::Hash) {
            return Err(Error::InvalidState);
        }

        self.pending = None;
        self.signature = Some(signature);

        Ok(())
    }

    pub fn signature(&self) -> Option<&[u8; 64]> {
        self.signature.as_ref()
    }
}
