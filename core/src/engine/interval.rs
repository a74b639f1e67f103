// Copyright (c) 2023 The Radix Ledger App Authors

use crate::apdu::atom::FieldRange;

/// Location of a field within the full atom stream (not the local window)
///
/// A zero length marks an absent field.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub struct ByteInterval {
    pub start: u16,
    pub length: u16,
}

impl ByteInterval {
    pub const fn new(start: u16, length: u16) -> Self {
        Self { start, length }
    }

    /// Absolute offset of the first byte
    pub fn start(&self) -> usize {
        self.start as usize
    }

    /// Absolute offset one past the last byte
    pub fn end(&self) -> usize {
        self.start as usize + self.length as usize
    }

    pub fn len(&self) -> usize {
        self.length as usize
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }
}

impl From<FieldRange> for ByteInterval {
    fn from(r: FieldRange) -> Self {
        Self::new(r.start, r.len)
    }
}
