//! Event types for communication between the front end and the service task.
//!
//! These two enums are the only interface between whatever renders the
//! screens and the asynchronous service task.

use naija_core::{ExchangeRate, SyncedValue};
use naija_network::TransactionPage;

// ============================================================================
// UI → Service
// ============================================================================

/// Commands sent from the front end to the background service task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    /// Open the wallet's authentication flow.
    ConnectWallet,

    /// End the wallet session and stop balance polling.
    SignOut,

    /// The user navigated to a new screen; the service may prefetch data.
    NavigatedTo(Screen),

    /// Send `amount` STX (decimal text, as typed) to `recipient`.
    SendRemittance { recipient: String, amount: String },

    /// Bind a display name to a bank account number.
    RegisterUser { name: String, bank_account: String },

    /// Fetch the balance now instead of waiting for the next tick.
    RefreshBalance,

    /// Reload the first page of history.
    RefreshHistory,

    /// Append the next page of history.
    LoadMoreHistory,

    /// Clean shutdown.
    Shutdown,
}

/// Screens the client can display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    /// Connect prompt, shown while no session is active
    Welcome,
    Balance,
    Send,
    Register,
    History,
}

impl Screen {
    /// Screens reachable from the navigation bar once connected
    pub const NAV: [Screen; 4] = [Screen::Balance, Screen::Send, Screen::Register, Screen::History];

    pub fn title(&self) -> &'static str {
        match self {
            Screen::Welcome => "Welcome",
            Screen::Balance => "Your Balance",
            Screen::Send => "Send Remittance",
            Screen::Register => "User Registration",
            Screen::History => "Transaction History",
        }
    }
}

// ============================================================================
// Service → UI
// ============================================================================

/// Events sent from the service task back to the front end.
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceEvent {
    /// A wallet session is active for `address`.
    Connected { address: String },

    /// The session ended.
    SignedOut,

    /// New exchange-rate snapshot, already scaled.
    ExchangeRateUpdated(SyncedValue<ExchangeRate>),

    /// New balance snapshot, in micro-STX.
    BalanceUpdated(SyncedValue<u128>),

    /// A history request is outstanding.
    HistoryLoading,

    /// A page of history. `append` is set for "load more" pages.
    HistoryLoaded { page: TransactionPage, append: bool },

    /// History could not be loaded.
    HistoryFailed { message: String, append: bool },

    /// The wallet signed and broadcast a contract call.
    ContractCallFinished { function: String, tx_id: String },

    /// The user dismissed the wallet prompt.
    ContractCallCancelled { function: String },

    /// Something went wrong.
    Error(String),
}
