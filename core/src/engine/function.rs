// Copyright (c) 2023 The Radix Ledger App Authors

use zeroize::Zeroize;

use crate::apdu::path::Bip32Path;

use super::{parser::ParseSession, Error};

/// Context for signing a host-provided hash
pub struct HashSession {
    path: Bip32Path,
    hash: [u8; 32],
    signature: Option<[u8; 64]>,
}

impl HashSession {
    pub fn new(path: Bip32Path, hash: [u8; 32]) -> Self {
        Self {
            path,
            hash,
            signature: None,
        }
    }

    pub fn path(&self) -> &Bip32Path {
        &self.path
    }

    pub fn hash(&self) -> &[u8; 32] {
        &self.hash
    }

    pub fn signature(&self) -> Option<&[u8; 64]> {
        self.signature.as_ref()
    }
}

impl Drop for HashSession {
    fn drop(&mut self) {
        self.hash.zeroize();
    }
}

pub struct Function {
    inner: FunctionType,
}

impl Default for Function {
    fn default() -> Self {
        Self {
            inner: FunctionType::None,
        }
    }
}

/// Enum for internal state machines to allow stack to be shared between functions
#[allow(clippy::large_enum_variant)]
enum FunctionType {
    None,
    SignAtom(ParseSession),
    SignHash(HashSession),
}

impl Function {
    /// Create a new / empty function context
    pub const fn new() -> Self {
        Self {
            inner: FunctionType::None,
        }
    }

    /// Setup atom signing context
    #[cfg_attr(feature = "noinline", inline(never))]
    pub fn sign_atom_init(
        &mut self,
        path: Bip32Path,
        own_key: [u8; 33],
        atom_len: u16,
        num_items: u8,
        num_transfers: u8,
    ) -> Result<&mut ParseSession, Error> {
        // Clear function prior to init (executes drop)
        self.clear();

        let s = ParseSession::new(path, own_key, atom_len, num_items, num_transfers)?;
        self.inner = FunctionType::SignAtom(s);

        match &mut self.inner {
            FunctionType::SignAtom(s) => Ok(s),
            _ => Err(Error::InvalidState),
        }
    }

    /// Fetch atom signing context
    pub fn sign_atom(&mut self) -> Option<&mut ParseSession> {
        match &mut self.inner {
            FunctionType::SignAtom(s) => Some(s),
            _ => None,
        }
    }

    /// Fetch atom signing context
    pub fn sign_atom_ref(&self) -> Option<&ParseSession> {
        match &self.inner {
            FunctionType::SignAtom(s) => Some(s),
            _ => None,
        }
    }

    /// Setup hash signing context
    #[cfg_attr(feature = "noinline", inline(never))]
    pub fn sign_hash_init(&mut self, path: Bip32Path, hash: [u8; 32]) {
        self.clear();

        self.inner = FunctionType::SignHash(HashSession::new(path, hash));
    }

    /// Fetch hash signing context
    pub fn sign_hash_ref(&self) -> Option<&HashSession> {
        match &self.inner {
            FunctionType::SignHash(s) => Some(s),
            _ => None,
        }
    }

    /// Fetch key path and digest awaiting signature
    pub fn signing_request(&self) -> Option<(Bip32Path, [u8; 32])> {
        match &self.inner {
            FunctionType::SignAtom(s) => s.digest().map(|d| (*s.path(), *d)),
            FunctionType::SignHash(s) => Some((s.path, s.hash)),
            FunctionType::None => None,
        }
    }

    /// Store signature for the active function
    pub fn set_signature(&mut self, signature: [u8; 64]) -> Result<(), Error> {
        match &mut self.inner {
            FunctionType::SignAtom(s) => s.set_signature(signature),
            FunctionType::SignHash(s) => {
                s.signature = Some(signature);
                Ok(())
            }
            FunctionType::None => Err(Error::InvalidState),
        }
    }

    /// Fetch signed digest and signature for the active function
    pub fn signature(&self) -> Option<([u8; 32], [u8; 64])> {
        match &self.inner {
            FunctionType::SignAtom(s) => match (s.digest(), s.signature()) {
                (Some(d), Some(sig)) => Some((*d, *sig)),
                _ => None,
            },
            FunctionType::SignHash(s) => s.signature.map(|sig| (s.hash, sig)),
            FunctionType::None => None,
        }
    }

    /// Clear context, executing drop if required
    #[cfg_attr(feature = "noinline", inline(never))]
    pub fn clear(&mut self) {
        self.inner = FunctionType::None;
    }
}
