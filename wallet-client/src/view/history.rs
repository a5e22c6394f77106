//! History screen: one page (or more) of account transactions.

use chrono::{DateTime, Utc};
use naija_core::format_stx;
use naija_network::TransactionRecord;
use std::fmt::Write;

use crate::state::AppState;

pub fn render(state: &AppState) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Transaction History");

    if state.history_loading && state.transactions.is_empty() {
        let _ = writeln!(out, "  Loading transactions...");
        return out;
    }
    if let Some(ref error) = state.history_error {
        let _ = writeln!(out, "  {}", error);
    }
    if state.transactions.is_empty() && state.history_error.is_none() {
        let _ = writeln!(out, "  No transactions yet");
    }

    for tx in &state.transactions {
        out.push_str(&row(tx));
    }

    if state.history_loading {
        let _ = writeln!(out, "  Loading more...");
    } else if state.history_has_more {
        let _ = writeln!(
            out,
            "  Showing {} of {} [Load more]",
            state.transactions.len(),
            state.history_total
        );
    }
    out
}

fn row(tx: &TransactionRecord) -> String {
    let date = DateTime::<Utc>::from_timestamp(tx.timestamp, 0)
        .filter(|_| tx.timestamp > 0 && tx.status.is_final())
        .map(|d| d.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "awaiting confirmation".to_string());
    format!(
        "  - {} | {} STX | {} | {}\n",
        tx.tx_type,
        format_stx(tx.amount),
        tx.status,
        date
    )
}
