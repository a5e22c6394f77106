//! Balance screen: the contract balance in STX and its Naira value.

use chrono::{DateTime, Utc};
use naija_core::SyncStatus;
use std::fmt::Write;

use crate::state::AppState;

pub fn render(state: &AppState, now: DateTime<Utc>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Your Balance");

    match state.balance_stx() {
        Some(stx) => {
            let _ = writeln!(out, "  {} STX", stx);
            match state.balance_naira() {
                Some(naira) => {
                    let _ = writeln!(out, "  ≈ ₦{}", naira);
                }
                None => {
                    let _ = writeln!(out, "  ≈ ₦ --");
                }
            }
            if state.balance_is_stale(now) {
                let _ = writeln!(
                    out,
                    "  (last updated over {}s ago)",
                    state.balance_stale_after.as_secs()
                );
            }
        }
        None if state.balance.status() == SyncStatus::Error => {
            let _ = writeln!(out, "  Balance unavailable");
        }
        None => {
            let _ = writeln!(out, "  Loading...");
        }
    }

    if let Some(err) = state.balance.last_error() {
        let _ = writeln!(out, "  Last refresh failed ({})", err.kind());
    }

    let _ = writeln!(out, "\n{}", super::rate_line(state, now));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::ServiceEvent;
    use naija_core::{ExchangeRate, SyncedValue};

    #[test]
    fn test_loading_then_value() {
        let mut state = AppState::default();
        let now = Utc::now();
        assert!(render(&state, now).contains("Loading..."));

        state.apply(ServiceEvent::BalanceUpdated(SyncedValue::ready(1_000_000, now)));
        state.apply(ServiceEvent::ExchangeRateUpdated(SyncedValue::ready(
            ExchangeRate::new(1500, 1),
            now,
        )));
        let text = render(&state, now);
        assert!(text.contains("1.000000 STX"));
        assert!(text.contains("≈ ₦1500.00"));
        assert!(text.contains("₦1500.00 per STX"));
        assert!(!text.contains("stale"));
    }

    #[test]
    fn test_stale_balance_flagged() {
        let mut state = AppState::default();
        let fetched = Utc::now();
        state.apply(ServiceEvent::BalanceUpdated(SyncedValue::ready(5, fetched)));
        let later = fetched + chrono::Duration::seconds(300);
        assert!(render(&state, later).contains("last updated over 60s ago"));
    }
}
