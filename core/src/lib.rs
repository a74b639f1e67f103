// Copyright (c) 2023 The Radix Ledger App Authors

//! Radix hardware wallet core
//!
//! This provides a common [Engine][engine] supporting streamed atom parsing,
//! review and signing for execution on hardware wallets.
//!
//! Interactions with the [Engine][engine] are performed via [Event][engine::Event]s and [Output][engine::Output]s,
//! see [radix_ledger_apdu] for APDU objects and wire encodings.
//!
//! ## Operations
//!
//! Prior to interacting with a hardware wallet the client should issue an
//! [`AppInfoReq`][radix_ledger_apdu::app_info::AppInfoReq] to fetch an
//! [`AppInfoResp`][radix_ledger_apdu::app_info::AppInfoResp] containing application information
//! including the applet version, protocol version, and flags for available features.
//!
//! ### Fetching a public key
//!
//! [`GetPublicKeyReq`][radix_ledger_apdu::public_key::GetPublicKeyReq] returns the
//! compressed public key for a key path as a
//! [`PublicKeyResp`][radix_ledger_apdu::public_key::PublicKeyResp]. This is answered
//! immediately and leaves any running signing session untouched.
//!
//! ### Signing an atom
//!
//! Atoms are never held in full on the device. The host declares the atom length
//! and the location of every field the user must review, then streams the atom in
//! chunks. The engine hashes each byte exactly once, in order, while extracting
//! the declared fields from a small sliding window.
//!
//! 1. Issue [`SignAtomInit`][radix_ledger_apdu::atom::SignAtomInit] with the key path,
//!    atom length and item counts
//! 2. Issue [`SignAtomCatalog`][radix_ledger_apdu::atom::SignAtomCatalog] until every item
//!    has a [`FieldCatalogEntry`][radix_ledger_apdu::atom::FieldCatalogEntry]
//! 3. Stream the atom with [`SignAtomBytes`][radix_ledger_apdu::atom::SignAtomBytes].
//!    Each response is an [`AtomInfo`][radix_ledger_apdu::atom::AtomInfo]; while the
//!    state is pending the device is waiting on the user and further bytes are refused,
//!    poll with [`AtomInfoReq`][radix_ledger_apdu::atom::AtomInfoReq] and resend once the
//!    engine returns to streaming. Transfers under review may be fetched with
//!    [`TransferReq`][radix_ledger_apdu::atom::TransferReq].
//! 4. Once every item is identified and the final byte is hashed the user reviews the
//!    digest, on approval the engine moves to [`AtomState::Ready`][radix_ledger_apdu::state::AtomState::Ready]
//!    and [`SignatureReq`][radix_ledger_apdu::atom::SignatureReq] returns the digest and signature
//! 5. Issue [`AtomComplete`][radix_ledger_apdu::atom::AtomComplete] to release the session
//!
//! Any protocol violation aborts the session, the engine moves to an error state and
//! reports the failure as a distinct status word (see [Error::status][engine::Error::status]).
//!
//! ### Signing a hash
//!
//! [`SignHashReq`][radix_ledger_apdu::hash::SignHashReq] requests a signature over a host
//! provided hash, following user approval the signature is fetched as above.
//!

#![cfg_attr(not(feature = "std"), no_std)]

pub use radix_ledger_apdu::{self as apdu};

pub mod engine;
