//! The remittance contract and the calls made against it

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::address::{AddressError, StacksAddress, StacksNetwork};
use crate::clarity::{ClarityError, ClarityValue};

/// Read-only: current Naira per STX rate
pub const FN_GET_EXCHANGE_RATE: &str = "get-exchange-rate";
/// Read-only: remittance balance of a principal, in micro-STX
pub const FN_GET_BALANCE: &str = "get-balance";
/// Write: `(send-remittance (recipient principal) (amount uint))`
pub const FN_SEND_REMITTANCE: &str = "send-remittance";
/// Write: `(register-user (name (string-utf8 ..)) (bank-account (string-ascii ..)))`
pub const FN_REGISTER_USER: &str = "register-user";

/// Fully-qualified contract identifier, `ADDRESS.contract-name`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContractId {
    pub address: StacksAddress,
    pub name: String,
}

impl ContractId {
    pub fn new(address: StacksAddress, name: &str) -> Result<Self, AddressError> {
        validate_contract_name(name)?;
        Ok(Self {
            address,
            name: name.to_string(),
        })
    }
}

/// Contract names: 1-128 chars, a leading letter, then letters, digits, `-` or `_`
pub fn validate_contract_name(name: &str) -> Result<(), AddressError> {
    let mut chars = name.chars();
    let valid = name.len() <= 128
        && chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(AddressError::InvalidContractName(name.to_string()))
    }
}

impl FromStr for ContractId {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (address, name) = s
            .split_once('.')
            .ok_or_else(|| AddressError::InvalidContractName(s.to_string()))?;
        Self::new(address.parse()?, name)
    }
}

impl fmt::Display for ContractId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}.{}", self.address, self.name)
    }
}

/// Where a wallet may anchor the transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnchorMode {
    OnChainOnly = 1,
    OffChainOnly = 2,
    Any = 3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PostConditionMode {
    Allow = 1,
    Deny = 2,
}

/// A state-changing contract call, handed to the wallet to sign and broadcast
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractCallRequest {
    pub network: StacksNetwork,
    pub contract: ContractId,
    pub function_name: String,
    pub function_args: Vec<ClarityValue>,
    pub anchor_mode: AnchorMode,
    pub post_condition_mode: PostConditionMode,
}

impl ContractCallRequest {
    pub fn new(
        network: StacksNetwork,
        contract: ContractId,
        function_name: &str,
        function_args: Vec<ClarityValue>,
    ) -> Self {
        Self {
            network,
            contract,
            function_name: function_name.to_string(),
            function_args,
            anchor_mode: AnchorMode::OnChainOnly,
            post_condition_mode: PostConditionMode::Allow,
        }
    }

    /// `send-remittance` of `micro_stx` to `recipient`
    pub fn send_remittance(
        network: StacksNetwork,
        contract: ContractId,
        recipient: StacksAddress,
        micro_stx: u64,
    ) -> Self {
        Self::new(
            network,
            contract,
            FN_SEND_REMITTANCE,
            vec![
                ClarityValue::principal(recipient),
                ClarityValue::UInt(u128::from(micro_stx)),
            ],
        )
    }

    /// `register-user` binding a display name to a bank account number
    pub fn register_user(
        network: StacksNetwork,
        contract: ContractId,
        name: &str,
        bank_account: &str,
    ) -> Result<Self, ClarityError> {
        Ok(Self::new(
            network,
            contract,
            FN_REGISTER_USER,
            vec![
                ClarityValue::string_utf8(name),
                ClarityValue::string_ascii(bank_account)?,
            ],
        ))
    }

    /// Arguments in the hex form wallets and the API accept
    pub fn function_args_hex(&self) -> Result<Vec<String>, ClarityError> {
        self.function_args.iter().map(ClarityValue::to_hex).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONTRACT: &str = "SP2J6ZY48GV1EZ5V2V5RB9MP66SW86PYKKNRV9EJ7.naija-transfer";

    #[test]
    fn test_contract_id_round_trip() {
        let id: ContractId = CONTRACT.parse().unwrap();
        assert_eq!(id.name, "naija-transfer");
        assert_eq!(id.to_string(), CONTRACT);
    }

    #[test]
    fn test_contract_name_rules() {
        assert!(validate_contract_name("naija_transfer-v2").is_ok());
        assert!(validate_contract_name("").is_err());
        assert!(validate_contract_name("2fast").is_err());
        assert!(validate_contract_name("has space").is_err());
        assert!(validate_contract_name(&"a".repeat(129)).is_err());
        assert!("SP2J6ZY48GV1EZ5V2V5RB9MP66SW86PYKKNRV9EJ7".parse::<ContractId>().is_err());
    }

    #[test]
    fn test_send_remittance_args() {
        let id: ContractId = CONTRACT.parse().unwrap();
        let recipient: StacksAddress = "SP000000000000000000002Q6VF78".parse().unwrap();
        let call =
            ContractCallRequest::send_remittance(StacksNetwork::Mainnet, id, recipient, 2_500_000);

        assert_eq!(call.function_name, FN_SEND_REMITTANCE);
        assert_eq!(call.anchor_mode, AnchorMode::OnChainOnly);
        assert_eq!(call.post_condition_mode, PostConditionMode::Allow);

        let args = call.function_args_hex().unwrap();
        assert_eq!(args.len(), 2);
        assert_eq!(
            args[0],
            "0x05160000000000000000000000000000000000000000"
        );
        assert_eq!(args[1], "0x01000000000000000000000000002625a0");
    }

    #[test]
    fn test_register_user_requires_ascii_account() {
        let id: ContractId = CONTRACT.parse().unwrap();
        let call = ContractCallRequest::register_user(
            StacksNetwork::Mainnet,
            id.clone(),
            "Chidi Okafor",
            "0123456789",
        )
        .unwrap();
        assert_eq!(call.function_name, FN_REGISTER_USER);
        assert_eq!(call.function_args[0], ClarityValue::string_utf8("Chidi Okafor"));

        assert!(ContractCallRequest::register_user(
            StacksNetwork::Mainnet,
            id,
            "Chidi",
            "０１２",
        )
        .is_err());
    }
}
