//! Connect prompt, shown while no wallet session is active.

use std::fmt::Write;

use crate::state::AppState;

pub fn render(state: &AppState) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Send STX home and see what it is worth in Naira.");
    let _ = writeln!(out, "Connect a Stacks wallet to get started.");
    if let Some(rate) = state.rate_per_stx() {
        let _ = writeln!(out, "\nToday: ₦{} per STX", rate);
    }
    out
}
