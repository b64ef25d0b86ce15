//! Result codes for the public query surface
//!
//! Mirrors the XInput error contract: every query either succeeds, rejects
//! its arguments, or reports the device as absent/unsupported. "No keystroke
//! pending" is not an error and is modelled as `Ok(None)` by the keystroke
//! query instead.

use thiserror::Error;

/// Failure codes returned by the public query functions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    /// Slot index out of range or otherwise malformed request
    #[error("bad argument")]
    BadArgument,

    /// No virtual device is connected at the addressed slot
    #[error("device not connected")]
    DeviceNotConnected,

    /// The operation is valid but this device never supports it
    #[error("not supported")]
    NotSupported,
}

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, Error>;
