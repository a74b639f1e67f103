// Copyright (c) 2023 The Radix Ledger App Authors

//! Prelude to simplify downstream use of APDU objects
//!

pub use crate::{
    app_info::{AppFlags, AppInfoReq, AppInfoResp},
    atom::{
        AtomComplete, AtomInfo, AtomInfoReq, FieldCatalogEntry, FieldRange, SignAtomBytes,
        SignAtomCatalog, SignAtomInit, SignatureReq, SignatureResp, TransferReq, TransferResp,
    },
    hash::SignHashReq,
    path::Bip32Path,
    public_key::{GetPublicKeyReq, PublicKeyResp},
    state::{AtomState, Digest},
};
