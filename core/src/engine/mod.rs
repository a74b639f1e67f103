// Copyright (c) 2023 The Radix Ledger App Authors

//! The [Engine] provides functionality required by hardware wallets.
//!
//! This handles [Event] inputs and returns [Output] responses to the caller,
//! see [apdu][crate::apdu] for APDU protocol / encoding specifications.

use strum::{Display, EnumIter, EnumString, EnumVariantNames};

use crate::apdu::{app_info::AppFlags, atom::FieldCatalogEntry, path::Bip32Path};

mod catalog;
pub use catalog::{next_field_for, CatalogEntry, FieldCatalog, FieldKind};

mod counter;
pub use counter::ItemCounter;

mod decode;
pub use decode::{decode_field, FieldValue};

mod error;
pub use error::Error;

mod event;
pub use event::Event;

mod function;
pub use function::{Function, HashSession};

mod hasher;
pub use hasher::AtomHasher;

mod interval;
pub use interval::ByteInterval;

mod output;
pub use output::{Output, APP_VERSION};

mod parser;
pub use parser::{ParseSession, Review, Step};

mod transfer;
pub use transfer::{Outcome, Transfer, TransferBuilder, TransferFlags};

mod window;
pub use window::StreamWindow;

pub use crate::apdu::{MAX_CHUNK_SIZE, MAX_ITEMS};

/// Maximum encoded length of a single cataloged field
pub const MAX_FIELD_SIZE: usize = 70;

/// Window capacity, a full chunk plus the largest partial field retained from the previous chunk
pub const WINDOW_SIZE: usize = MAX_CHUNK_SIZE + MAX_FIELD_SIZE - 1;

static_assertions::const_assert_eq!(WINDOW_SIZE, 324);

/// Serializer identifying transferrable token particles
pub const TRANSFER_SERIALIZER: &str = "radix.particles.transferrable_tokens";

/// Engine internal state enumeration
#[derive(Copy, Clone, PartialEq, Debug, EnumString, Display, EnumVariantNames, EnumIter)]
pub enum State {
    /// Idle state, no session running
    Init,
    /// Atom signing in progress
    SignAtom(ParseState),
    /// Waiting on user review
    Pending(Review),
    /// Signature available
    Ready,
    /// Rejected by the user
    Deny,
    /// Session failed
    Error,
    /// Session complete
    Complete,
}

/// Atom signing sub-states
#[derive(
    Copy, Clone, PartialEq, Debug, Default, EnumString, Display, EnumVariantNames, EnumIter,
)]
pub enum ParseState {
    /// Streaming atom bytes
    #[default]
    Stream,
    /// Awaiting catalog entries (number remaining)
    Catalog(u8),
}

/// [Engine] provides hardware-independent support for Radix atom signing
///
pub struct Engine<DRV: Driver> {
    state: State,
    function: Function,
    drv: DRV,
}

/// [`Driver`] trait provides platform support for [`Engine`] instances
pub trait Driver {
    /// Compressed secp256k1 public key for a BIP-0032 derivation path
    fn public_key(&self, path: &[u32; 5]) -> [u8; 33];

    /// Sign a 32-byte digest with the key for a BIP-0032 derivation path
    fn sign_digest(&self, path: &[u32; 5], digest: &[u8; 32]) -> [u8; 64];
}

impl<T: Driver> Driver for &mut T {
    fn public_key(&self, path: &[u32; 5]) -> [u8; 33] {
        T::public_key(self, path)
    }

    fn sign_digest(&self, path: &[u32; 5], digest: &[u8; 32]) -> [u8; 64] {
        T::sign_digest(self, path, digest)
    }
}

impl<DRV: Driver> Engine<DRV> {
    /// Create a new engine instance with the provided driver
    pub const fn new(drv: DRV) -> Self {
        Self {
            state: State::Init,
            function: Function::new(),
            drv,
        }
    }

    /// Handle incoming events
    #[cfg_attr(feature = "noinline", inline(never))]
    pub fn update(&mut self, evt: &Event) -> Result<Output, Error> {
        #[cfg(feature = "log")]
        log::trace!("event: {:02x?}", evt);

        match (self.state, evt) {
            // Empty event, do nothing
            (_, Event::None) => (),

            // Fetch application info
            (_, Event::GetAppInfo) => {
                return Ok(Output::AppInfo {
                    flags: AppFlags::HAS_SIGN_ATOM
                        | AppFlags::HAS_SIGN_HASH
                        | AppFlags::HAS_PUBLIC_KEY
                        | AppFlags::HAS_TRANSFER_REVIEW,
                })
            }

            // Export public key, any running session is left untouched
            (_, Event::GetPublicKey { path }) => {
                #[cfg(feature = "log")]
                log::debug!("public key for {}", path);

                return Ok(Output::PublicKey(self.drv.public_key(&path.components())));
            }

            // Start atom signing, replacing any existing session
            (
                _,
                Event::SignAtomInit {
                    path,
                    atom_len,
                    num_items,
                    num_transfers,
                },
            ) => self
                .sign_atom_init(*path, *atom_len, *num_items, *num_transfers)
                .map_err(|e| self.fail(e))?,

            // Start hash signing, replacing any existing session
            (_, Event::SignHash { path, hash }) => {
                self.function.sign_hash_init(*path, *hash);
                self.state = State::Pending(Review::Hash);
            }

            // Load field catalog
            (State::SignAtom(ParseState::Catalog(_)), Event::SignAtomCatalog(entries)) => {
                self.load_catalog(entries).map_err(|e| self.fail(e))?
            }

            // Stream atom bytes
            (State::SignAtom(ParseState::Stream), Event::SignAtomBytes(chunk)) => {
                self.push_chunk(chunk).map_err(|e| self.fail(e))?
            }

            // Refuse progress while waiting on the user
            (State::Pending(_), Event::SignAtomBytes(_) | Event::GetSignature) => {
                return Err(Error::ApprovalPending)
            }

            // Fetch transfer under review
            (State::Pending(Review::Transfer), Event::GetTransfer) => {
                return match self.transfer().cloned() {
                    Some(t) => Ok(Output::Transfer(t)),
                    None => Err(self.fail(Error::InvalidState)),
                };
            }

            // Rejected sessions refuse further progress
            (
                State::Deny,
                Event::SignAtomCatalog(_)
                | Event::SignAtomBytes(_)
                | Event::GetTransfer
                | Event::GetSignature,
            ) => return Err(Error::UserRejected),

            // Fetch signature following approval
            (State::Ready, Event::GetSignature) => {
                return match self.function.signature() {
                    Some((digest, signature)) => Ok(Output::Signature { digest, signature }),
                    None => Err(self.fail(Error::InvalidState)),
                };
            }

            // Complete session
            (_, Event::Complete) => {
                self.function.clear();
                self.state = State::Complete;
            }

            // Fetch session state / information
            (_, Event::GetInfo) => (),

            // Handle unexpected events
            _e => {
                #[cfg(feature = "log")]
                log::error!("Unexpected event in state {:?}: {:02x?}", self.state, _e);

                return Err(Error::UnexpectedEvent);
            }
        }

        // Default to returning updated state
        Ok(self.info())
    }

    /// Fetch current engine state
    pub fn state(&self) -> State {
        self.state
    }

    /// Approve the pending review, resuming parsing or signing the approved digest
    pub fn approve(&mut self) -> Result<(), Error> {
        let r = match self.state {
            State::Pending(r) => r,
            _ => return Err(Error::InvalidState),
        };

        #[cfg(feature = "log")]
        log::debug!("{} approved", r);

        let res = match r {
            Review::Transfer | Review::NonTransfer => self.resume(),
            Review::Hash => self.sign(),
        };

        res.map_err(|e| self.fail(e))
    }

    /// Deny a pending review, aborting the session
    pub fn deny(&mut self) {
        #[cfg(feature = "log")]
        log::debug!("denied in state {}", self.state);

        self.function.clear();
        self.state = State::Deny;
    }

    /// Reset engine state
    pub fn reset(&mut self) {
        self.function.clear();
        self.state = State::Init;
    }

    /// Fetch progress (percentage of atom bytes consumed) for atom signing
    pub fn progress(&self) -> Option<usize> {
        self.function.sign_atom_ref().map(|s| s.progress())
    }

    /// Fetch the transfer awaiting review
    pub fn transfer(&self) -> Option<&Transfer> {
        match self.state {
            State::Pending(Review::Transfer) => (),
            _ => return None,
        }

        self.function.sign_atom_ref().and_then(|s| s.transfer())
    }

    /// Fetch the digest awaiting approval or signed
    pub fn digest(&self) -> Option<[u8; 32]> {
        match self.state {
            State::Pending(Review::Hash) | State::Ready => (),
            _ => return None,
        }

        self.function.signing_request().map(|(_p, d)| d)
    }

    #[cfg_attr(feature = "noinline", inline(never))]
    fn sign_atom_init(
        &mut self,
        path: Bip32Path,
        atom_len: u16,
        num_items: u8,
        num_transfers: u8,
    ) -> Result<(), Error> {
        #[cfg(feature = "log")]
        log::debug!(
            "sign atom {}, {} bytes, {} items ({} transfers)",
            path,
            atom_len,
            num_items,
            num_transfers
        );

        // Own key is resolved once per session for change detection
        let own_key = self.drv.public_key(&path.components());

        let s = self
            .function
            .sign_atom_init(path, own_key, atom_len, num_items, num_transfers)?;

        self.state = State::SignAtom(catalog_state(s.catalog_remaining()));

        Ok(())
    }

    #[cfg_attr(feature = "noinline", inline(never))]
    fn load_catalog(&mut self, entries: &[FieldCatalogEntry]) -> Result<(), Error> {
        let s = self.function.sign_atom().ok_or(Error::InvalidState)?;

        let remaining = s.load_catalog(entries)?;

        self.state = State::SignAtom(catalog_state(remaining));

        Ok(())
    }

    #[cfg_attr(feature = "noinline", inline(never))]
    fn push_chunk(&mut self, chunk: &[u8]) -> Result<(), Error> {
        let s = self.function.sign_atom().ok_or(Error::InvalidState)?;

        let step = s.push_chunk(chunk)?;
        self.step(step);

        Ok(())
    }

    fn resume(&mut self) -> Result<(), Error> {
        let s = self.function.sign_atom().ok_or(Error::InvalidState)?;

        let step = s.approve()?;
        self.step(step);

        Ok(())
    }

    #[cfg_attr(feature = "noinline", inline(never))]
    fn sign(&mut self) -> Result<(), Error> {
        let (path, digest) = self
            .function
            .signing_request()
            .ok_or(Error::InvalidState)?;

        let signature = self.drv.sign_digest(&path.components(), &digest);
        self.function.set_signature(signature)?;

        self.state = State::Ready;

        Ok(())
    }

    fn step(&mut self, step: Step) {
        self.state = match step {
            Step::NeedMore => State::SignAtom(ParseState::Stream),
            Step::Review(r) => State::Pending(r),
        };
    }

    /// Abort the session on fatal errors
    fn fail(&mut self, e: Error) -> Error {
        if e.is_fatal() {
            #[cfg(feature = "log")]
            log::error!("session failed in state {}: {:?}", self.state, e);

            self.function.clear();
            self.state = State::Error;
        }

        e
    }

    fn info(&self) -> Output {
        let s = self.function.sign_atom_ref();

        let value = match self.state {
            State::SignAtom(ParseState::Catalog(n)) => n,
            _ => self.progress().unwrap_or(0) as u8,
        };

        Output::State {
            state: self.state,
            value,
            consumed: s.map(|s| s.consumed() as u16).unwrap_or(0),
            transfers: s.map(|s| s.counter().transfers()).unwrap_or(0),
            others: s.map(|s| s.counter().others()).unwrap_or(0),
        }
    }
}

fn catalog_state(remaining: usize) -> ParseState {
    match remaining {
        0 => ParseState::Stream,
        n => ParseState::Catalog(n as u8),
    }
}
