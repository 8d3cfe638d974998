use std::time::Duration;

use thiserror::Error;

use crate::wireless::types::AdapterState;

/// Unified error type for kestrel-wireless
#[derive(Error, Debug)]
pub enum WirelessError {
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    #[error("cannot {operation} while adapter is {state}")]
    InvalidState {
        operation: &'static str,
        state: AdapterState,
    },

    #[error("cannot {operation}: another operation is in flight")]
    Busy { operation: &'static str },

    #[error("operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("operation cancelled")]
    Cancelled,

    #[error("link negotiation failed: {0}")]
    Link(String),

    #[error("coprocessor fault: {0}")]
    Hardware(String),

    #[error("settings error: {0}")]
    Settings(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type WirelessResult<T> = Result<T, WirelessError>;
