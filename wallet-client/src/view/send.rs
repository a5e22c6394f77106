//! Send screen: recipient, STX amount and the Naira estimate.

use chrono::{DateTime, Utc};
use std::fmt::Write;

use crate::state::AppState;

pub fn render(state: &AppState, now: DateTime<Utc>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Send Remittance");
    let _ = writeln!(out, "  Recipient Address: {}", placeholder(&state.send_recipient));
    let _ = writeln!(out, "  Amount in STX:     {}", placeholder(&state.send_amount));
    let _ = writeln!(out, "  Estimated amount in Naira: ₦{}", state.estimated_naira());
    let _ = writeln!(out, "  {}", super::rate_line(state, now));

    if state.pending_call.is_some() {
        let _ = writeln!(out, "\n  Waiting for wallet confirmation...");
    } else {
        let _ = writeln!(out, "\n  [Send]");
    }
    if let Some(ref tx_id) = state.last_tx_id {
        let _ = writeln!(out, "  Last transaction: {}", tx_id);
    }
    out
}

pub(crate) fn placeholder(value: &str) -> &str {
    if value.is_empty() {
        "-"
    } else {
        value
    }
}
