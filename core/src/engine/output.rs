// Copyright (c) 2023 The Radix Ledger App Authors

use encdec::Encode;

use ledger_proto::ApduError;

use crate::{
    apdu::{self, app_info::AppFlags, public_key::PUBLIC_KEY_LEN, state::AtomState},
    engine::{ParseState, Review, State, Transfer},
};

/// Application version reported via [`Output::AppInfo`]
pub const APP_VERSION: [u8; 3] = [
    version_digits(env!("CARGO_PKG_VERSION_MAJOR")),
    version_digits(env!("CARGO_PKG_VERSION_MINOR")),
    version_digits(env!("CARGO_PKG_VERSION_PATCH")),
];

const fn version_digits(s: &str) -> u8 {
    let b = s.as_bytes();
    let mut v = 0u8;
    let mut i = 0;

    while i < b.len() {
        v = v.wrapping_mul(10).wrapping_add(b[i].wrapping_sub(b'0'));
        i += 1;
    }

    v
}

/// [`Engine`][super::Engine] outputs (in response to events), typically encoded to response [APDUs][crate::apdu]
#[derive(Clone, PartialEq, Debug)]
pub enum Output {
    None,

    /// Engine state
    State {
        state: State,
        value: u8,
        consumed: u16,
        transfers: u8,
        others: u8,
    },

    /// Application information
    AppInfo { flags: AppFlags },

    /// Compressed public key
    PublicKey([u8; PUBLIC_KEY_LEN]),

    /// Transfer awaiting review
    Transfer(Transfer),

    /// Approved digest and signature
    Signature {
        digest: [u8; 32],
        signature: [u8; 64],
    },
}

impl Output {
    /// Encode an [`Output`] object to a response [APDU]
    #[cfg_attr(feature = "noinline", inline(never))]
    pub fn encode(&self, buff: &mut [u8]) -> Result<usize, ApduError> {
        match self {
            Output::None => Ok(0),
            Output::State {
                state,
                value,
                consumed,
                transfers,
                others,
            } => apdu::atom::AtomInfo {
                state: state.state(),
                value: *value,
                consumed: *consumed,
                transfers: *transfers,
                others: *others,
            }
            .encode(buff),
            Output::AppInfo { flags } => {
                apdu::app_info::AppInfoResp::new(APP_VERSION, *flags).encode(buff)
            }
            Output::PublicKey(k) => apdu::public_key::PublicKeyResp::new(*k).encode(buff),
            Output::Transfer(t) => {
                apdu::atom::TransferResp::new(t.address, t.amount, &t.token_id)?.encode(buff)
            }
            Output::Signature { digest, signature } => {
                apdu::atom::SignatureResp::new((*digest).into(), *signature).encode(buff)
            }
        }
    }

    /// Fetch state for outputs containing this
    pub fn state(&self) -> Option<State> {
        match &self {
            Output::State { state, .. } => Some(*state),
            _ => None,
        }
    }
}

impl PartialEq<State> for Output {
    fn eq(&self, other: &State) -> bool {
        match self {
            Output::State { state, .. } => state == other,
            _ => false,
        }
    }
}

impl State {
    /// Map [engine](crate::engine) states to [apdu][apdu::state::AtomState] states for transmission
    pub fn state(&self) -> AtomState {
        match self {
            State::Init => AtomState::Init,
            State::SignAtom(ParseState::Catalog(_)) => AtomState::Catalog,
            State::SignAtom(ParseState::Stream) => AtomState::Stream,
            State::Pending(Review::Transfer) => AtomState::PendingTransfer,
            State::Pending(Review::NonTransfer) => AtomState::PendingNonTransfer,
            State::Pending(Review::Hash) => AtomState::PendingHash,
            State::Ready => AtomState::Ready,
            State::Deny => AtomState::Denied,
            State::Error => AtomState::Error,
            State::Complete => AtomState::Complete,
        }
    }
}
