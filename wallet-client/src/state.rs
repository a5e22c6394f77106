//! Application state owned by the front end.
//!
//! Mutated only by applying [`ServiceEvent`]s and by form input. Views read
//! it and never talk to the service directly.

use chrono::{DateTime, Utc};
use naija_core::{estimate_naira, format_stx, ExchangeRate, SyncedValue};
use naija_network::{TransactionRecord, FN_REGISTER_USER, FN_SEND_REMITTANCE};
use std::time::Duration;

use crate::config::Config;
use crate::events::{Screen, ServiceEvent, UiEvent};

#[derive(Debug, Clone)]
pub struct AppState {
    pub screen: Screen,

    // -- Session --
    pub address: Option<String>,

    // -- Synced values --
    pub exchange_rate: SyncedValue<ExchangeRate>,
    pub balance: SyncedValue<u128>,
    /// Snapshots older than this are flagged as stale
    pub rate_stale_after: Duration,
    pub balance_stale_after: Duration,

    // -- History --
    pub transactions: Vec<TransactionRecord>,
    pub history_loading: bool,
    pub history_error: Option<String>,
    pub history_total: u64,
    pub history_has_more: bool,

    // -- Forms --
    pub send_recipient: String,
    pub send_amount: String,
    pub register_name: String,
    pub register_bank_account: String,
    /// Contract function awaiting the wallet prompt
    pub pending_call: Option<String>,
    pub last_tx_id: Option<String>,

    pub error: Option<String>,
    pub success: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            screen: Screen::Welcome,
            address: None,
            exchange_rate: SyncedValue::idle(),
            balance: SyncedValue::idle(),
            rate_stale_after: Duration::from_secs(120),
            balance_stale_after: Duration::from_secs(60),
            transactions: Vec::new(),
            history_loading: false,
            history_error: None,
            history_total: 0,
            history_has_more: false,
            send_recipient: String::new(),
            send_amount: String::new(),
            register_name: String::new(),
            register_bank_account: String::new(),
            pending_call: None,
            last_tx_id: None,
            error: None,
            success: None,
        }
    }
}

impl AppState {
    /// Staleness windows at twice the configured poll periods
    pub fn new(config: &Config) -> Self {
        Self {
            rate_stale_after: config.exchange_rate_period() * 2,
            balance_stale_after: config.balance_period() * 2,
            ..Self::default()
        }
    }

    pub fn is_connected(&self) -> bool {
        self.address.is_some()
    }

    /// Switch screens, returning the event that tells the service about it.
    /// Everything but the connect prompt requires a session.
    pub fn navigate(&mut self, screen: Screen) -> UiEvent {
        self.screen = if self.is_connected() {
            screen
        } else {
            Screen::Welcome
        };
        self.error = None;
        self.success = None;
        UiEvent::NavigatedTo(self.screen)
    }

    /// Submit the send form as typed
    pub fn submit_send(&mut self) -> UiEvent {
        self.pending_call = Some(FN_SEND_REMITTANCE.to_string());
        self.error = None;
        self.success = None;
        UiEvent::SendRemittance {
            recipient: self.send_recipient.clone(),
            amount: self.send_amount.clone(),
        }
    }

    /// Submit the registration form as typed
    pub fn submit_registration(&mut self) -> UiEvent {
        self.pending_call = Some(FN_REGISTER_USER.to_string());
        self.error = None;
        self.success = None;
        UiEvent::RegisterUser {
            name: self.register_name.clone(),
            bank_account: self.register_bank_account.clone(),
        }
    }

    pub fn apply(&mut self, event: ServiceEvent) {
        match event {
            ServiceEvent::Connected { address } => {
                self.address = Some(address);
                if self.screen == Screen::Welcome {
                    self.screen = Screen::Balance;
                }
                self.error = None;
            }

            ServiceEvent::SignedOut => {
                // The exchange rate keeps syncing without a session
                *self = Self {
                    exchange_rate: self.exchange_rate.clone(),
                    rate_stale_after: self.rate_stale_after,
                    balance_stale_after: self.balance_stale_after,
                    ..Self::default()
                };
            }

            ServiceEvent::ExchangeRateUpdated(rate) => {
                self.exchange_rate = rate;
            }

            ServiceEvent::BalanceUpdated(balance) => {
                self.balance = balance;
            }

            ServiceEvent::HistoryLoading => {
                self.history_loading = true;
                self.history_error = None;
            }

            ServiceEvent::HistoryLoaded { page, append } => {
                self.history_loading = false;
                self.history_error = None;
                self.history_total = page.total;
                self.history_has_more = page.has_more();
                if append {
                    self.transactions.extend(page.records);
                } else {
                    self.transactions = page.records;
                }
            }

            ServiceEvent::HistoryFailed { message, append } => {
                self.history_loading = false;
                self.history_error = Some(message);
                if !append {
                    self.transactions.clear();
                    self.history_total = 0;
                    self.history_has_more = false;
                }
            }

            ServiceEvent::ContractCallFinished { function, tx_id } => {
                self.pending_call = None;
                self.error = None;
                if function == FN_SEND_REMITTANCE {
                    self.send_recipient.clear();
                    self.send_amount.clear();
                    self.success = Some(format!("Remittance sent: {}", tx_id));
                } else if function == FN_REGISTER_USER {
                    self.register_name.clear();
                    self.register_bank_account.clear();
                    self.success = Some(format!("Registration submitted: {}", tx_id));
                } else {
                    self.success = Some(format!("Transaction submitted: {}", tx_id));
                }
                self.last_tx_id = Some(tx_id);
            }

            ServiceEvent::ContractCallCancelled { function } => {
                self.pending_call = None;
                self.success = None;
                self.error = Some(format!("{} cancelled in wallet", function));
            }

            ServiceEvent::Error(message) => {
                self.pending_call = None;
                self.success = None;
                self.error = Some(message);
            }
        }
    }

    // ========================================================================
    // View helpers
    // ========================================================================

    pub fn balance_stx(&self) -> Option<String> {
        self.balance.value().map(|b| format_stx(*b))
    }

    /// Naira value of the balance; needs both a balance and a rate
    pub fn balance_naira(&self) -> Option<String> {
        let balance = self.balance.value()?;
        let rate = self.exchange_rate.value()?;
        Some(rate.convert(*balance))
    }

    /// Naira per STX
    pub fn rate_per_stx(&self) -> Option<String> {
        self.exchange_rate.value().map(ExchangeRate::per_stx)
    }

    /// Naira estimate for the amount typed into the send form
    pub fn estimated_naira(&self) -> String {
        estimate_naira(&self.send_amount, self.exchange_rate.value())
    }

    pub fn rate_is_stale(&self, now: DateTime<Utc>) -> bool {
        self.exchange_rate.value().is_some()
            && self.exchange_rate.is_stale(self.rate_stale_after, now)
    }

    pub fn balance_is_stale(&self, now: DateTime<Utc>) -> bool {
        self.balance.value().is_some() && self.balance.is_stale(self.balance_stale_after, now)
    }
}
