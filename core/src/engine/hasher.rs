// Copyright (c) 2023 The Radix Ledger App Authors

use sha2::{Digest as _, Sha256};

use super::Error;

/// Running SHA-256 over the atom stream, finalised as a double hash
/// once the declared length has been consumed
#[derive(Clone)]
pub struct AtomHasher {
    ctx: Sha256,
    consumed: usize,
    total: usize,
    digest: Option<[u8; 32]>,
}

impl AtomHasher {
    /// Create a hasher expecting `total` bytes
    pub fn new(total: u16) -> Self {
        Self {
            ctx: Sha256::new(),
            consumed: 0,
            total: total as usize,
            digest: None,
        }
    }

    /// Fold the next chunk of the stream into the digest
    pub fn update(&mut self, chunk: &[u8]) -> Result<(), Error> {
        if self.consumed + chunk.len() > self.total {
            #[cfg(feature = "log")]
            log::error!(
                "chunk of {} bytes overruns atom ({} / {})",
                chunk.len(),
                self.consumed,
                self.total
            );

            return Err(Error::InvalidLength);
        }

        self.ctx.update(chunk);
        self.consumed += chunk.len();

        if self.consumed == self.total {
            let first = self.ctx.finalize_reset();
            let second = Sha256::digest(first);

            let mut d = [0u8; 32];
            d.copy_from_slice(&second);
            self.digest = Some(d);
        }

        Ok(())
    }

    /// Finalised digest, available once every byte has been consumed
    pub fn digest(&self) -> Option<&[u8; 32]> {
        self.digest.as_ref()
    }

    pub fn is_complete(&self) -> bool {
        self.digest.is_some()
    }

    pub fn consumed(&self) -> usize {
        self.consumed
    }

    pub fn total(&self) -> usize {
        self.total
    }
}
