//! Line commands for the terminal front end.
//!
//! Each command stands in for a button or form in the screens: it updates
//! [`AppState`] the same way the forms do and yields the [`UiEvent`]s to send
//! to the service.

use std::str::FromStr;
use thiserror::Error;

use crate::events::{Screen, UiEvent};
use crate::state::AppState;

pub const HELP: &str = "\
Commands:
  connect                       connect the wallet
  signout                       end the wallet session
  balance                       show the balance screen
  send                          show the send screen
  amount <stx>                  fill in the amount and show the Naira estimate
  send <address> <stx>          send a remittance
  register                      show the registration screen
  register <name> <account>     register a name with a bank account number
  history                       show transaction history
  more                          load the next page of history
  refresh                       refresh the current screen
  help                          show this help
  quit                          exit";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("Unknown command '{0}' (type 'help')")]
    Unknown(String),

    #[error("Usage: {0}")]
    Usage(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Connect,
    SignOut,
    Show(Screen),
    Amount(String),
    Send { recipient: String, amount: String },
    Register { name: String, bank_account: String },
    More,
    Refresh,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Err(CommandError::Usage("help"));
        };
        let args: Vec<&str> = words.collect();

        let command = match (verb.to_ascii_lowercase().as_str(), args.as_slice()) {
            ("connect", []) => Command::Connect,
            ("signout" | "logout", []) => Command::SignOut,
            ("balance", []) => Command::Show(Screen::Balance),
            ("history", []) => Command::Show(Screen::History),
            ("send", []) => Command::Show(Screen::Send),
            ("send", [recipient, amount]) => Command::Send {
                recipient: recipient.to_string(),
                amount: amount.to_string(),
            },
            ("send", _) => return Err(CommandError::Usage("send <address> <stx>")),
            ("amount", [amount]) => Command::Amount(amount.to_string()),
            ("amount", _) => return Err(CommandError::Usage("amount <stx>")),
            ("register", []) => Command::Show(Screen::Register),
            // The account number is the last word; the name may have spaces
            ("register", [name @ .., account]) if !name.is_empty() => Command::Register {
                name: name.join(" "),
                bank_account: account.to_string(),
            },
            ("register", _) => return Err(CommandError::Usage("register <name> <account>")),
            ("more", []) => Command::More,
            ("refresh", []) => Command::Refresh,
            ("help" | "?", _) => Command::Help,
            ("quit" | "exit", _) => Command::Quit,
            _ => return Err(CommandError::Unknown(line.trim().to_string())),
        };
        Ok(command)
    }
}

/// Apply `command` to the state and return the events for the service.
///
/// `Help` and `Quit` are left to the caller and yield nothing.
pub fn apply(state: &mut AppState, command: Command) -> Vec<UiEvent> {
    match command {
        Command::Connect => vec![UiEvent::ConnectWallet],

        Command::SignOut => vec![UiEvent::SignOut],

        Command::Show(screen) => vec![state.navigate(screen)],

        Command::Amount(amount) => {
            let shown = state.navigate(Screen::Send);
            state.send_amount = amount;
            vec![shown]
        }

        Command::Send { recipient, amount } => {
            let shown = state.navigate(Screen::Send);
            state.send_recipient = recipient;
            state.send_amount = amount;
            vec![shown, state.submit_send()]
        }

        Command::Register { name, bank_account } => {
            let shown = state.navigate(Screen::Register);
            state.register_name = name;
            state.register_bank_account = bank_account;
            vec![shown, state.submit_registration()]
        }

        Command::More => vec![UiEvent::LoadMoreHistory],

        Command::Refresh => match state.screen {
            Screen::History => vec![UiEvent::RefreshHistory],
            _ => vec![UiEvent::RefreshBalance],
        },

        Command::Help | Command::Quit => Vec::new(),
    }
}
