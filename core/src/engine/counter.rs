// Copyright (c) 2023 The Radix Ledger App Authors

use super::{Error, MAX_ITEMS};

/// Declared and identified item counts, used to detect parse completion
#[derive(Copy, Clone, PartialEq, Debug, Default)]
pub struct ItemCounter {
    declared_transfers: u8,
    declared_others: u8,
    seen_transfers: u8,
    seen_others: u8,
}

impl ItemCounter {
    /// Create a new counter from the declared item totals
    pub fn new(num_items: u8, num_transfers: u8) -> Result<Self, Error> {
        if num_items as usize > MAX_ITEMS {
            return Err(Error::CapacityExceeded);
        }
        if num_transfers > num_items {
            return Err(Error::ProtocolMismatch);
        }

        Ok(Self {
            declared_transfers: num_transfers,
            declared_others: num_items - num_transfers,
            seen_transfers: 0,
            seen_others: 0,
        })
    }

    /// Record an identified transfer
    pub fn identified_transfer(&mut self) -> Result<(), Error> {
        if self.seen_transfers >= self.declared_transfers {
            return Err(Error::CounterOverrun);
        }

        self.seen_transfers += 1;
        Ok(())
    }

    /// Record an identified non-transfer item
    pub fn identified_other(&mut self) -> Result<(), Error> {
        if self.seen_others >= self.declared_others {
            return Err(Error::CounterOverrun);
        }

        self.seen_others += 1;
        Ok(())
    }

    /// Check whether every declared item has been identified
    pub fn is_complete(&self) -> bool {
        self.seen_transfers == self.declared_transfers && self.seen_others == self.declared_others
    }

    pub fn transfers(&self) -> u8 {
        self.seen_transfers
    }

    pub fn others(&self) -> u8 {
        self.seen_others
    }

    pub fn total(&self) -> u8 {
        self.declared_transfers + self.declared_others
    }
}
