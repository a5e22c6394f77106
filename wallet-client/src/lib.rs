//! Naija Transfer client
//!
//! Keeps the Naira exchange rate and the user's remittance balance fresh in
//! the background, and hands remittance and registration calls to a Stacks
//! wallet for signing.
//!
//! The front end and the [`service`] task only talk through the event enums
//! in [`events`]; [`state::AppState`] folds service events into what the
//! [`view`] functions render.

pub mod chain_api;
pub mod config;
pub mod console;
pub mod events;
pub mod forms;
pub mod service;
pub mod state;
pub mod view;
pub mod wallet_provider;

pub use chain_api::{ChainApi, ContractApi};
pub use config::{Config, ConfigError};
pub use console::{Command, CommandError};
pub use events::{Screen, ServiceEvent, UiEvent};
pub use state::AppState;
pub use wallet_provider::{
    ContractCallOutcome, Session, WalletError, WalletProvider, WatchOnlyWallet,
};
