// Copyright (c) 2023 The Radix Ledger App Authors

//! Bounded window over the atom stream
//!
//! The window holds the suffix of the stream that has been received but not
//! yet consumed, `bytes[..len]` maps to absolute offsets `[start, start + len)`.

use super::{interval::ByteInterval, Error, WINDOW_SIZE};

pub struct StreamWindow {
    start: usize,
    len: usize,
    bytes: [u8; WINDOW_SIZE],
}

impl StreamWindow {
    /// Create an empty window at the start of the stream
    pub const fn new() -> Self {
        Self {
            start: 0,
            len: 0,
            bytes: [0u8; WINDOW_SIZE],
        }
    }

    /// Absolute offset of the first held byte
    pub fn start(&self) -> usize {
        self.start
    }

    /// Absolute offset one past the last held byte
    pub fn end(&self) -> usize {
        self.start + self.len
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Append a received chunk
    pub fn append(&mut self, chunk: &[u8]) -> Result<(), Error> {
        if self.len + chunk.len() > WINDOW_SIZE {
            #[cfg(feature = "log")]
            log::error!(
                "window overflow ({} held, {} received)",
                self.len,
                chunk.len()
            );

            return Err(Error::CapacityExceeded);
        }

        self.bytes[self.len..][..chunk.len()].copy_from_slice(chunk);
        self.len += chunk.len();

        Ok(())
    }

    /// Discard held bytes before the absolute `offset`
    ///
    /// Offsets past the window end discard everything held, the window then
    /// resumes at the current end.
    pub fn consume_to(&mut self, offset: usize) {
        #[cfg(feature = "log")]
        log::trace!("consume {}..{}", self.start, offset.min(self.end()));

        self.shift(offset);
    }

    /// Retain a partially received field starting at the absolute `offset`,
    /// moving it to the front of the window to be completed by the next chunk
    pub fn retain_spillover(&mut self, offset: usize) {
        #[cfg(feature = "log")]
        log::trace!("retain spillover {}..{}", offset, self.end());

        debug_assert!(offset < self.end());

        self.shift(offset);
    }

    /// Held bytes for an interval, if fully present
    pub fn slice(&self, interval: &ByteInterval) -> Option<&[u8]> {
        if interval.start() < self.start || interval.end() > self.end() {
            return None;
        }

        let local = interval.start() - self.start;
        Some(&self.bytes[local..][..interval.len()])
    }

    /// Discard all held bytes, keeping the stream position
    pub fn clear(&mut self) {
        self.shift(self.end());
    }

    fn shift(&mut self, offset: usize) {
        if offset <= self.start {
            return;
        }

        let n = (offset - self.start).min(self.len);

        self.bytes.copy_within(n..self.len, 0);
        self.bytes[self.len - n..self.len].fill(0);

        self.len -= n;
        self.start += n;
    }
}

impl Default for StreamWindow {
    fn default() -> Self {
        Self::new()
    }
}
