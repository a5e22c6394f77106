//! Background service task: a single `select!` loop.
//!
//! The service owns all async I/O. It receives [`UiEvent`]s from the front
//! end, drives the exchange-rate and balance syncs, calls the wallet and the
//! chain API, and sends [`ServiceEvent`]s back.
//!
//! The exchange-rate sync runs for the life of the service. The balance sync
//! runs while a wallet session is active.

use naija_core::{format_stx, ExchangeRate, FetchError, PeriodicValueSync, SyncHandle, SyncedValue};
use naija_network::{ContractCallRequest, ContractId, StacksAddress, StacksNetwork};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

use crate::chain_api::ChainApi;
use crate::config::Config;
use crate::events::{Screen, ServiceEvent, UiEvent};
use crate::forms;
use crate::wallet_provider::{ContractCallOutcome, Session, WalletError, WalletProvider};

type BalanceReceiver = watch::Receiver<SyncedValue<u128>>;

/// Run the service loop until the cancellation token fires, the front end
/// asks for shutdown, or the front end goes away.
pub async fn run<A, W>(
    token: CancellationToken,
    mut ui_rx: mpsc::UnboundedReceiver<UiEvent>,
    svc_tx: mpsc::UnboundedSender<ServiceEvent>,
    config: Config,
    api: A,
    wallet: W,
) where
    A: ChainApi,
    W: WalletProvider,
{
    let (network, contract) = match (config.stacks_network(), config.contract_id()) {
        (Ok(network), Ok(contract)) => (network, contract),
        (Err(e), _) | (_, Err(e)) => {
            log::error!("❌ Service not started: {}", e);
            let _ = svc_tx.send(ServiceEvent::Error(e.to_string()));
            return;
        }
    };

    let rate_api = api.clone();
    let rate_sync = match PeriodicValueSync::start(
        "exchange-rate",
        move || {
            let api = rate_api.clone();
            async move { api.exchange_rate().await.map_err(FetchError::from) }
        },
        config.exchange_rate_period(),
    ) {
        Ok(handle) => handle,
        Err(e) => {
            log::error!("❌ Exchange rate sync not started: {}", e);
            let _ = svc_tx.send(ServiceEvent::Error(e.to_string()));
            return;
        }
    };
    let rate_scale = config.rate_scale;
    let mut rate_rx = rate_sync.subscribe();
    let scaled = |raw: &SyncedValue<u128>| raw.map(|v| ExchangeRate::new(*v, rate_scale));
    let _ = svc_tx.send(ServiceEvent::ExchangeRateUpdated(scaled(
        &*rate_rx.borrow_and_update(),
    )));

    let mut state = ServiceState {
        svc_tx,
        api,
        wallet,
        network,
        contract,
        balance_period: config.balance_period(),
        page_size: config.history_page_size,
        session: None,
        balance_sync: None,
        balance_rx: None,
        history_next_offset: 0,
    };

    log::info!("🚀 Service loop started ({}, {})", state.network, state.contract);

    loop {
        tokio::select! {
            _ = token.cancelled() => {
                log::info!("🛑 Service loop shutting down");
                break;
            }

            Ok(()) = rate_rx.changed() => {
                let snapshot = scaled(&*rate_rx.borrow_and_update());
                state.send(ServiceEvent::ExchangeRateUpdated(snapshot));
            }

            Some(changed) = async {
                if let Some(ref mut rx) = state.balance_rx {
                    Some(rx.changed().await)
                } else {
                    std::future::pending::<Option<Result<(), watch::error::RecvError>>>().await
                }
            } => {
                match changed {
                    Ok(()) => state.forward_balance(),
                    Err(_) => state.balance_rx = None,
                }
            }

            event = ui_rx.recv() => {
                match event {
                    None | Some(UiEvent::Shutdown) => break,
                    Some(event) => state.handle(event).await,
                }
            }
        }
    }

    rate_sync.stop();
    state.stop_balance_sync();
    log::info!("👋 Service loop exited");
}

struct ServiceState<A, W> {
    svc_tx: mpsc::UnboundedSender<ServiceEvent>,
    api: A,
    wallet: W,
    network: StacksNetwork,
    contract: ContractId,
    balance_period: Duration,
    page_size: u32,
    session: Option<Session>,
    balance_sync: Option<SyncHandle<u128>>,
    balance_rx: Option<BalanceReceiver>,
    history_next_offset: u32,
}

impl<A: ChainApi, W: WalletProvider> ServiceState<A, W> {
    fn send(&self, event: ServiceEvent) {
        let _ = self.svc_tx.send(event);
    }

    async fn handle(&mut self, event: UiEvent) {
        match event {
            UiEvent::ConnectWallet => self.connect().await,

            UiEvent::SignOut => self.sign_out(),

            UiEvent::NavigatedTo(screen) => match screen {
                Screen::History => self.load_history(false).await,
                Screen::Balance => self.refresh_balance(),
                Screen::Welcome | Screen::Send | Screen::Register => {}
            },

            UiEvent::SendRemittance { recipient, amount } => {
                self.send_remittance(&recipient, &amount).await
            }

            UiEvent::RegisterUser { name, bank_account } => {
                self.register_user(&name, &bank_account).await
            }

            UiEvent::RefreshBalance => self.refresh_balance(),

            UiEvent::RefreshHistory => self.load_history(false).await,

            UiEvent::LoadMoreHistory => self.load_history(true).await,

            // Handled by the loop
            UiEvent::Shutdown => {}
        }
    }

    async fn connect(&mut self) {
        if let Some(ref session) = self.session {
            self.send(ServiceEvent::Connected {
                address: session.address.to_string(),
            });
            return;
        }

        match self.wallet.open_auth().await {
            Ok(session) => {
                if session.network() != self.network {
                    log::warn!(
                        "Wallet address {} is not on {}",
                        session.address,
                        self.network
                    );
                    self.wallet.sign_out();
                    self.send(ServiceEvent::Error(format!(
                        "Wallet is on {}, expected {}",
                        session.network(),
                        self.network
                    )));
                    return;
                }

                log::info!("🔓 Connected: {}", session.address);
                let address = session.address;
                self.session = Some(session);
                self.history_next_offset = 0;
                self.send(ServiceEvent::Connected {
                    address: address.to_string(),
                });
                self.start_balance_sync(address);
            }
            Err(e) => {
                log::warn!("Wallet connection failed: {}", e);
                self.send(ServiceEvent::Error(format!("Wallet connection failed: {}", e)));
            }
        }
    }

    fn sign_out(&mut self) {
        self.wallet.sign_out();
        self.stop_balance_sync();
        if let Some(session) = self.session.take() {
            log::info!("🔒 Signed out: {}", session.address);
        }
        self.history_next_offset = 0;
        self.send(ServiceEvent::SignedOut);
    }

    fn start_balance_sync(&mut self, owner: StacksAddress) {
        self.stop_balance_sync();

        let api = self.api.clone();
        let started = PeriodicValueSync::start(
            "balance",
            move || {
                let api = api.clone();
                async move { api.balance(owner).await.map_err(FetchError::from) }
            },
            self.balance_period,
        );

        match started {
            Ok(handle) => {
                self.balance_rx = Some(handle.subscribe());
                self.balance_sync = Some(handle);
                self.forward_balance();
            }
            Err(e) => {
                log::error!("❌ Balance sync not started: {}", e);
                self.send(ServiceEvent::Error(e.to_string()));
            }
        }
    }

    fn stop_balance_sync(&mut self) {
        if let Some(handle) = self.balance_sync.take() {
            handle.stop();
        }
        self.balance_rx = None;
    }

    fn forward_balance(&mut self) {
        let snapshot = match self.balance_rx {
            Some(ref mut rx) => rx.borrow_and_update().clone(),
            None => return,
        };
        self.send(ServiceEvent::BalanceUpdated(snapshot));
    }

    fn refresh_balance(&self) {
        if let Some(ref handle) = self.balance_sync {
            if !handle.refresh_now() {
                log::debug!("Balance refresh skipped, fetch already in flight");
            }
        }
    }

    /// Fetch one page of history. Failures are reported once and not retried.
    async fn load_history(&mut self, append: bool) {
        let Some(owner) = self.session.as_ref().map(|s| s.address) else {
            self.send(ServiceEvent::HistoryFailed {
                message: WalletError::NotConnected.to_string(),
                append,
            });
            return;
        };
        let offset = if append { self.history_next_offset } else { 0 };

        self.send(ServiceEvent::HistoryLoading);
        match self.api.transactions(owner, self.page_size, offset).await {
            Ok(page) => {
                self.history_next_offset = page.next_offset();
                self.send(ServiceEvent::HistoryLoaded { page, append });
            }
            Err(e) => {
                log::warn!("History fetch failed: {}", e);
                self.send(ServiceEvent::HistoryFailed {
                    message: format!("Could not load transactions: {}", e),
                    append,
                });
            }
        }
    }

    async fn send_remittance(&mut self, recipient: &str, amount: &str) {
        if self.session.is_none() {
            self.send(ServiceEvent::Error(WalletError::NotConnected.to_string()));
            return;
        }
        let valid = match forms::validate_send(recipient, amount, self.network) {
            Ok(valid) => valid,
            Err(e) => {
                self.send(ServiceEvent::Error(e.to_string()));
                return;
            }
        };

        log::info!(
            "💸 Sending {} STX to {}",
            format_stx(u128::from(valid.micro_stx)),
            valid.recipient
        );
        let request = ContractCallRequest::send_remittance(
            self.network,
            self.contract.clone(),
            valid.recipient,
            valid.micro_stx,
        );
        self.submit(request).await;
    }

    async fn register_user(&mut self, name: &str, bank_account: &str) {
        if self.session.is_none() {
            self.send(ServiceEvent::Error(WalletError::NotConnected.to_string()));
            return;
        }
        let (name, bank_account) = match forms::validate_registration(name, bank_account) {
            Ok(fields) => fields,
            Err(e) => {
                self.send(ServiceEvent::Error(e.to_string()));
                return;
            }
        };

        let request = match ContractCallRequest::register_user(
            self.network,
            self.contract.clone(),
            &name,
            &bank_account,
        ) {
            Ok(request) => request,
            Err(e) => {
                self.send(ServiceEvent::Error(e.to_string()));
                return;
            }
        };
        log::info!("📝 Registering {}", name);
        self.submit(request).await;
    }

    /// Hand a call to the wallet and report how the prompt ended
    async fn submit(&mut self, request: ContractCallRequest) {
        let function = request.function_name.clone();
        match self.wallet.contract_call(request).await {
            Ok(ContractCallOutcome::Finished { tx_id }) => {
                log::info!("✅ {} broadcast: {}", function, tx_id);
                self.send(ServiceEvent::ContractCallFinished { function, tx_id });
                self.refresh_balance();
            }
            Ok(ContractCallOutcome::Cancelled) => {
                log::info!("{} cancelled in wallet", function);
                self.send(ServiceEvent::ContractCallCancelled { function });
            }
            Err(e) => {
                log::warn!("{} failed: {}", function, e);
                self.send(ServiceEvent::Error(e.to_string()));
            }
        }
    }
}
