//! Text views: pure rendering functions.
//!
//! Each submodule renders one screen from [`AppState`]. No async, no network,
//! no wallet logic.

pub mod balance;
pub mod history;
pub mod register;
pub mod send;
pub mod welcome;

use chrono::{DateTime, Utc};
use std::fmt::Write;

use crate::events::Screen;
use crate::state::AppState;
use crate::wallet_provider::APP_NAME;

/// Render the current screen with the header and footer around it
pub fn render(state: &AppState, now: DateTime<Utc>) -> String {
    let mut out = header(state);
    let body = match state.screen {
        Screen::Welcome => welcome::render(state),
        Screen::Balance => balance::render(state, now),
        Screen::Send => send::render(state, now),
        Screen::Register => register::render(state),
        Screen::History => history::render(state),
    };
    out.push_str(&body);
    out.push_str(&messages(state));
    out.push_str(&footer());
    out
}

/// Title bar and navigation
pub fn header(state: &AppState) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== {} ===", APP_NAME);
    match state.address {
        Some(ref address) => {
            let nav: Vec<String> = Screen::NAV
                .iter()
                .map(|s| {
                    if *s == state.screen {
                        format!("[{}]", s.title())
                    } else {
                        s.title().to_string()
                    }
                })
                .collect();
            let _ = writeln!(out, "{} | Sign Out", nav.join(" | "));
            let _ = writeln!(out, "Signed in as {}", address);
        }
        None => {
            let _ = writeln!(out, "Connect Wallet");
        }
    }
    out.push('\n');
    out
}

fn messages(state: &AppState) -> String {
    let mut out = String::new();
    if let Some(ref error) = state.error {
        let _ = writeln!(out, "\n❌ {}", error);
    }
    if let Some(ref success) = state.success {
        let _ = writeln!(out, "\n✅ {}", success);
    }
    out
}

fn footer() -> String {
    format!(
        "\n(c) {}. All rights reserved.\nPowered by Stacks Blockchain\n",
        APP_NAME
    )
}

/// "₦1500.00 per STX", with a staleness marker
pub(crate) fn rate_line(state: &AppState, now: DateTime<Utc>) -> String {
    match state.rate_per_stx() {
        Some(rate) => {
            let stale = if state.rate_is_stale(now) { " (stale)" } else { "" };
            format!("Exchange rate: ₦{} per STX{}", rate, stale)
        }
        None if state.exchange_rate.is_loading() => "Exchange rate: loading...".to_string(),
        None if state.exchange_rate.last_error().is_some() => {
            "Exchange rate: unavailable".to_string()
        }
        None => "Exchange rate: waiting for first update".to_string(),
    }
}
