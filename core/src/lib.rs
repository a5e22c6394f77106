//! Core components for the Naija Transfer remittance client
//!
//! - [`sync`]: periodic synchronization of externally-sourced values
//! - [`amount`]: integer STX amounts and Naira conversion
//! - [`error`]: fetch error taxonomy shared with the network layer

pub mod amount;
pub mod error;
pub mod sync;

pub use amount::{
    estimate_naira, format_kobo, format_stx, parse_stx_amount, AmountError, ExchangeRate,
    MICRO_STX_PER_STX,
};
pub use error::{FetchError, SyncError};
pub use sync::{PeriodicValueSync, SyncHandle, SyncStatus, SyncedValue};
