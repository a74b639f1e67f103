// Copyright (c) 2023 The Radix Ledger App Authors

use encdec::Decode;
use heapless::Vec;

use ledger_proto::{ApduError, ApduStatic};

use crate::apdu::{prelude::*, MAX_ITEMS};

/// [`Engine`][super::Engine] input events, typically decoded from request [APDUs][crate::apdu]
#[derive(Clone, Debug, PartialEq)]
pub enum Event<'a> {
    None,

    /// Fetch application information
    GetAppInfo,

    /// Fetch the public key for a key path
    GetPublicKey { path: Bip32Path },

    /// Sign a host-provided hash
    SignHash { path: Bip32Path, hash: [u8; 32] },

    /// Start an atom signing session
    SignAtomInit {
        path: Bip32Path,
        atom_len: u16,
        num_items: u8,
        num_transfers: u8,
    },

    /// Load field catalog entries
    SignAtomCatalog(Vec<FieldCatalogEntry, MAX_ITEMS>),

    /// Stream a chunk of atom bytes
    SignAtomBytes(&'a [u8]),

    /// Fetch session info / state
    GetInfo,

    /// Fetch the transfer awaiting review
    GetTransfer,

    /// Fetch the signature once approved
    GetSignature,

    /// Complete the current session
    Complete,
}

/// Helper for decoding APDUs to events
fn decode_event<'a, T>(buff: &'a [u8]) -> Result<Event, ApduError>
where
    T: Decode<'a, Error = ApduError>,
    Event<'a>: From<T::Output>,
{
    T::decode(buff).map(|(v, _n)| Event::from(v))
}

impl<'a> Event<'a> {
    /// Parse an incoming APDU to engine event
    #[cfg_attr(feature = "noinline", inline(never))]
    pub fn parse(ins: u8, buff: &'a [u8]) -> Result<Self, ApduError> {
        match ins {
            AppInfoReq::INS => decode_event::<AppInfoReq>(buff),
            GetPublicKeyReq::INS => decode_event::<GetPublicKeyReq>(buff),
            SignHashReq::INS => decode_event::<SignHashReq>(buff),

            SignAtomInit::INS => decode_event::<SignAtomInit>(buff),
            SignAtomCatalog::INS => decode_event::<SignAtomCatalog>(buff),
            SignAtomBytes::INS => decode_event::<SignAtomBytes>(buff),

            AtomInfoReq::INS => decode_event::<AtomInfoReq>(buff),
            TransferReq::INS => decode_event::<TransferReq>(buff),
            SignatureReq::INS => decode_event::<SignatureReq>(buff),
            AtomComplete::INS => decode_event::<AtomComplete>(buff),

            _ => {
                #[cfg(feature = "log")]
                log::warn!("unrecognised instruction: 0x{:02x}", ins);

                Err(ApduError::InvalidEncoding)
            }
        }
    }
}

impl<'a> From<AppInfoReq> for Event<'a> {
    fn from(_: AppInfoReq) -> Self {
        Event::GetAppInfo
    }
}

impl<'a> From<GetPublicKeyReq> for Event<'a> {
    fn from(a: GetPublicKeyReq) -> Self {
        Event::GetPublicKey { path: a.path }
    }
}

impl<'a> From<SignHashReq> for Event<'a> {
    fn from(a: SignHashReq) -> Self {
        Event::SignHash {
            path: a.path,
            hash: a.hash,
        }
    }
}

impl<'a> From<SignAtomInit> for Event<'a> {
    fn from(a: SignAtomInit) -> Self {
        Event::SignAtomInit {
            path: a.path,
            atom_len: a.atom_len,
            num_items: a.num_items,
            num_transfers: a.num_transfers,
        }
    }
}

impl<'a> From<SignAtomCatalog> for Event<'a> {
    fn from(a: SignAtomCatalog) -> Self {
        Event::SignAtomCatalog(a.entries)
    }
}

impl<'a> From<SignAtomBytes<'a>> for Event<'a> {
    fn from(a: SignAtomBytes<'a>) -> Self {
        Event::SignAtomBytes(a.chunk)
    }
}

impl<'a> From<AtomInfoReq> for Event<'a> {
    fn from(_: AtomInfoReq) -> Self {
        Event::GetInfo
    }
}

impl<'a> From<TransferReq> for Event<'a> {
    fn from(_: TransferReq) -> Self {
        Event::GetTransfer
    }
}

impl<'a> From<SignatureReq> for Event<'a> {
    fn from(_: SignatureReq) -> Self {
        Event::GetSignature
    }
}

impl<'a> From<AtomComplete> for Event<'a> {
    fn from(_: AtomComplete) -> Self {
        Event::Complete
    }
}
