//! Stacks network access for Naija Transfer
//!
//! - c32check addresses ([`address`])
//! - Clarity value serialization ([`clarity`])
//! - the remittance contract's calls ([`contract`])
//! - the HTTP client for read-only calls and account history ([`stacks_client`])

pub mod address;
pub mod clarity;
pub mod contract;
pub mod error;
pub mod stacks_client;

pub use address::{AddressError, StacksAddress, StacksNetwork};
pub use clarity::{ClarityError, ClarityValue, PrincipalData};
pub use contract::{
    AnchorMode, ContractCallRequest, ContractId, PostConditionMode, FN_GET_BALANCE,
    FN_GET_EXCHANGE_RATE, FN_REGISTER_USER, FN_SEND_REMITTANCE,
};
pub use error::ClientError;
pub use stacks_client::{
    ReadOnlyResponse, StacksClient, TransactionPage, TransactionRecord, TransactionStatus,
};
