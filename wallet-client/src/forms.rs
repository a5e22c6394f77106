//! Input validation for the send and registration forms

use naija_core::{parse_stx_amount, AmountError};
use naija_network::{AddressError, StacksAddress, StacksNetwork};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormError {
    #[error("Recipient address is required")]
    MissingRecipient,

    #[error("Invalid recipient address: {0}")]
    InvalidRecipient(AddressError),

    #[error("Recipient is a {0} address")]
    WrongNetwork(StacksNetwork),

    #[error("{0}")]
    Amount(#[from] AmountError),

    #[error("Amount must be greater than zero")]
    ZeroAmount,

    #[error("Name is required")]
    MissingName,

    #[error("Bank account is required")]
    MissingBankAccount,

    #[error("Bank account may only contain ASCII characters")]
    InvalidBankAccount,
}

/// A send form that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidSend {
    pub recipient: StacksAddress,
    pub micro_stx: u64,
}

/// Check a recipient and decimal STX amount as typed.
pub fn validate_send(
    recipient: &str,
    amount: &str,
    network: StacksNetwork,
) -> Result<ValidSend, FormError> {
    let recipient = recipient.trim();
    if recipient.is_empty() {
        return Err(FormError::MissingRecipient);
    }
    let recipient: StacksAddress = recipient.parse().map_err(FormError::InvalidRecipient)?;
    if recipient.network() != network {
        return Err(FormError::WrongNetwork(recipient.network()));
    }

    let micro_stx = parse_stx_amount(amount)?;
    if micro_stx == 0 {
        return Err(FormError::ZeroAmount);
    }

    Ok(ValidSend {
        recipient,
        micro_stx,
    })
}

/// Trimmed `(name, bank_account)`, both required
pub fn validate_registration(
    name: &str,
    bank_account: &str,
) -> Result<(String, String), FormError> {
    let name = name.trim();
    let bank_account = bank_account.trim();
    if name.is_empty() {
        return Err(FormError::MissingName);
    }
    if bank_account.is_empty() {
        return Err(FormError::MissingBankAccount);
    }
    if !bank_account.is_ascii() {
        return Err(FormError::InvalidBankAccount);
    }
    Ok((name.to_string(), bank_account.to_string()))
}
