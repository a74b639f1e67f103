// Copyright (c) 2023 The Radix Ledger App Authors

//! Protocol / APDU definitions for Radix app communication
//!
//! This module provides a protocol specification and reference implementation for
//! streaming atoms to a Radix hardware wallet for review and signing.
//!
//! APDUs use a primitive binary encoding to simplify implementation on constrained
//! platforms and with unsupported host languages.
//!
//! Encodings are intended to be _roughly_ equivalent to packed c structures while
//! maintaining 32-bit field alignment where practical.
//! All integer field encodings are little-endian.
//!
//! Public keys are exported with [`GetPublicKeyReq`][public_key::GetPublicKeyReq],
//! host-computed hashes are signed with [`SignHashReq`][hash::SignHashReq].
//!
//! ## Signing an atom
//!
//! 1. Issue [`SignAtomInit`][atom::SignAtomInit] with the key path, the atom length
//!    and the number of items (up particles) and transfers contained in the atom
//! 2. Issue one or more [`SignAtomCatalog`][atom::SignAtomCatalog] APDUs carrying
//!    a [`FieldCatalogEntry`][atom::FieldCatalogEntry] per item, in stream order
//! 3. Stream the atom via [`SignAtomBytes`][atom::SignAtomBytes], at most
//!    [`MAX_CHUNK_SIZE`] bytes at a time, polling with [`AtomInfoReq`][atom::AtomInfoReq]
//!    while the returned [`AtomState`][state::AtomState] is pending user review
//! 4. Once the state is [`AtomState::Ready`][state::AtomState::Ready] fetch the signature
//!    with [`SignatureReq`][atom::SignatureReq]
//! 5. Issue [`AtomComplete`][atom::AtomComplete] to release the session
//!

#![no_std]

pub use ledger_proto::{ApduError, ApduReq, ApduStatic};

pub mod app_info;
pub mod atom;
pub mod hash;
pub mod path;
pub mod prelude;
pub mod public_key;
pub mod state;

mod helpers;

/// Radix APDU Class
pub const RADIX_APDU_CLA: u8 = 0xaa;

/// Protocol version reported in [`AppInfoResp`][app_info::AppInfoResp]
pub const RADIX_PROTO_VERSION: u8 = 0x01;

/// Maximum number of atom bytes carried by a single [`SignAtomBytes`][atom::SignAtomBytes] APDU
pub const MAX_CHUNK_SIZE: usize = 255;

/// Maximum number of items (up particles) that may be declared for a single atom
pub const MAX_ITEMS: usize = 15;

/// Status word for a successful exchange
pub const SW_OK: u16 = 0x9000;

/// Base status word for engine errors, the error code occupies the low byte
pub const SW_ENGINE_ERROR: u16 = 0x6d00;

/// Radix APDU instruction codes
#[derive(Copy, Clone, Debug, PartialEq)]
#[repr(u8)]
pub enum Instruction {
    /// Fetch application version and features
    GetAppInfo = 0x01,

    /// Sign a host-provided 32 byte hash
    SignHash = 0x04,

    /// Fetch the public key for a key path
    GetPublicKey = 0x08,

    /// Start an atom signing session
    SignAtomInit = 0x10,

    /// Load field catalog entries for the atom
    SignAtomCatalog = 0x11,

    /// Stream a chunk of atom bytes
    SignAtomBytes = 0x12,

    /// Fetch session state
    GetInfo = 0x20,

    /// Fetch the transfer awaiting review
    GetTransfer = 0x21,

    /// Fetch the signature once approved
    GetSignature = 0x22,

    /// Complete (release) the current session
    Complete = 0x30,
}
