// Copyright (c) 2023 The Radix Ledger App Authors

use crate::apdu::SW_ENGINE_ERROR;

/// [Engine][super::Engine] errors
///
/// Codes are stable and reported to the host as `0x6d00 | code`.
#[derive(Copy, Clone, PartialEq, Debug)]
#[cfg_attr(feature = "thiserror", derive(thiserror::Error))]
#[repr(u8)]
pub enum Error {
    /// Invalid argument length
    #[cfg_attr(feature = "thiserror", error("Invalid argument length"))]
    InvalidLength = 0x00,

    /// Unexpected event
    #[cfg_attr(feature = "thiserror", error("Unexpected event"))]
    UnexpectedEvent = 0x01,

    /// Invalid engine state
    #[cfg_attr(feature = "thiserror", error("invalid engine state"))]
    InvalidState = 0x0a,

    /// Message encoding failed
    #[cfg_attr(feature = "thiserror", error("message encoding failed"))]
    EncodingFailed = 0x0b,

    /// Pending user approval
    #[cfg_attr(feature = "thiserror", error("pending user approval"))]
    ApprovalPending = 0x0c,

    /// Request rejected by the user
    #[cfg_attr(feature = "thiserror", error("rejected by user"))]
    UserRejected = 0x0f,

    /// Atom contents disagree with the declared catalog
    #[cfg_attr(feature = "thiserror", error("atom does not match declared catalog"))]
    ProtocolMismatch = 0x10,

    /// Field encoding does not match the expected type
    #[cfg_attr(feature = "thiserror", error("malformed field encoding"))]
    MalformedEncoding = 0x11,

    /// Field or chunk exceeds device buffers
    #[cfg_attr(feature = "thiserror", error("device capacity exceeded"))]
    CapacityExceeded = 0x12,

    /// More items identified than declared
    #[cfg_attr(feature = "thiserror", error("item counter overrun"))]
    CounterOverrun = 0x13,

    /// Field applied out of order
    #[cfg_attr(feature = "thiserror", error("field sequence violation"))]
    SequenceViolation = 0x14,

    /// Unknown / not-yet defined error (placeholder)
    #[cfg_attr(feature = "thiserror", error("unknown"))]
    Unknown = 0xf0,
}

impl Error {
    /// Status word reported to the host for this error
    pub fn status(&self) -> u16 {
        SW_ENGINE_ERROR | *self as u8 as u16
    }

    /// Check whether an error aborts the active session
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Error::UnexpectedEvent | Error::ApprovalPending | Error::UserRejected
        )
    }
}
