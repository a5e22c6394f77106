//! Registration screen: display name and bank account.

use std::fmt::Write;

use super::send::placeholder;
use crate::state::AppState;

pub fn render(state: &AppState) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "User Registration");
    let _ = writeln!(out, "  Full Name:           {}", placeholder(&state.register_name));
    let _ = writeln!(
        out,
        "  Bank Account Number: {}",
        placeholder(&state.register_bank_account)
    );
    if state.pending_call.is_some() {
        let _ = writeln!(out, "\n  Waiting for wallet confirmation...");
    } else {
        let _ = writeln!(out, "\n  [Register]");
    }
    out
}
