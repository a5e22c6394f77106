//! Stacks API client
//!
//! Talks to a Stacks API node over HTTPS:
//! - `POST /v2/contracts/call-read/{address}/{contract}/{function}` for
//!   read-only contract calls (exchange rate, balance)
//! - `GET /extended/v1/address/{address}/transactions` for account history

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::{debug, info};

use crate::address::{StacksAddress, StacksNetwork};
use crate::clarity::ClarityValue;
use crate::contract::{ContractId, FN_GET_BALANCE, FN_GET_EXCHANGE_RATE};
use crate::error::ClientError;

/// Longest error body kept in [`ClientError::Http`]
const MAX_ERROR_BODY: usize = 256;

#[derive(Debug, Clone)]
pub struct StacksClient {
    api_url: String,
    network: StacksNetwork,
    client: Client,
}

/// Body of a read-only call
#[derive(Debug, Serialize)]
struct ReadOnlyRequest {
    sender: String,
    arguments: Vec<String>,
}

/// Result of a read-only call
#[derive(Debug, Clone, Deserialize)]
pub struct ReadOnlyResponse {
    pub okay: bool,
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub cause: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawTransactionList {
    limit: u32,
    offset: u32,
    total: u64,
    results: Vec<RawTransaction>,
}

#[derive(Debug, Deserialize)]
struct RawTransaction {
    tx_id: String,
    tx_type: String,
    tx_status: String,
    #[serde(default)]
    burn_block_time: Option<i64>,
    #[serde(default)]
    receipt_time: Option<i64>,
    #[serde(default)]
    sender_address: Option<String>,
    #[serde(default)]
    token_transfer: Option<RawTokenTransfer>,
    #[serde(default)]
    contract_call: Option<RawContractCall>,
}

#[derive(Debug, Deserialize)]
struct RawTokenTransfer {
    recipient_address: String,
    amount: String,
}

#[derive(Debug, Deserialize)]
struct RawContractCall {
    function_name: String,
}

/// Transaction status as reported by the explorer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionStatus {
    Success,
    Pending,
    AbortByResponse,
    AbortByPostCondition,
    Other(String),
}

impl TransactionStatus {
    pub fn from_api(s: &str) -> Self {
        match s {
            "success" => TransactionStatus::Success,
            "pending" => TransactionStatus::Pending,
            "abort_by_response" => TransactionStatus::AbortByResponse,
            "abort_by_post_condition" => TransactionStatus::AbortByPostCondition,
            other => TransactionStatus::Other(other.to_string()),
        }
    }

    pub fn is_final(&self) -> bool {
        !matches!(self, TransactionStatus::Pending)
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TransactionStatus::Success => write!(f, "success"),
            TransactionStatus::Pending => write!(f, "pending"),
            TransactionStatus::AbortByResponse => write!(f, "aborted (response)"),
            TransactionStatus::AbortByPostCondition => write!(f, "aborted (post-condition)"),
            TransactionStatus::Other(s) => write!(f, "{}", s),
        }
    }
}

/// One row of the account history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub tx_id: String,
    /// `token_transfer`, `contract_call`, `smart_contract`, `coinbase`, ...
    pub tx_type: String,
    /// Transferred micro-STX; 0 for anything but token transfers
    pub amount: u128,
    pub status: TransactionStatus,
    /// Unix seconds; anchor block time, or mempool receipt time while pending
    pub timestamp: i64,
    pub sender: Option<String>,
    pub recipient: Option<String>,
    pub function_name: Option<String>,
}

/// One page of account history
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TransactionPage {
    pub records: Vec<TransactionRecord>,
    pub limit: u32,
    pub offset: u32,
    pub total: u64,
}

impl TransactionPage {
    pub fn has_more(&self) -> bool {
        u64::from(self.offset) + (self.records.len() as u64) < self.total
    }

    pub fn next_offset(&self) -> u32 {
        self.offset.saturating_add(self.records.len() as u32)
    }
}

impl StacksClient {
    /// Create a client for `network`, using its public API unless `api_url`
    /// overrides it
    pub fn new(network: StacksNetwork, api_url: Option<String>) -> Result<Self, ClientError> {
        let api_url = api_url
            .unwrap_or_else(|| network.default_api_url().to_string())
            .trim_end_matches('/')
            .to_string();

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        info!("📡 Stacks API client initialized: {} ({})", api_url, network);

        Ok(Self {
            api_url,
            network,
            client,
        })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn network(&self) -> StacksNetwork {
        self.network
    }

    /// Evaluate a read-only function. `(err ..)` results are returned as
    /// [`ClientError::ContractErr`].
    pub async fn call_read_only(
        &self,
        contract: &ContractId,
        function: &str,
        args: &[ClarityValue],
        sender: &StacksAddress,
    ) -> Result<ClarityValue, ClientError> {
        let url = format!(
            "{}/v2/contracts/call-read/{}/{}/{}",
            self.api_url, contract.address, contract.name, function
        );
        let request = ReadOnlyRequest {
            sender: sender.to_string(),
            arguments: args
                .iter()
                .map(ClarityValue::to_hex)
                .collect::<Result<_, _>>()?,
        };

        debug!("→ call-read {}::{} ({} args)", contract, function, args.len());

        let response = self.client.post(&url).json(&request).send().await?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::http(status, truncate(&body)));
        }

        let body: ReadOnlyResponse = response.json().await.map_err(|e| {
            ClientError::InvalidResponse(format!("Failed to parse call-read response: {}", e))
        })?;

        Self::parse_read_only_response(body)
    }

    /// Turn a call-read body into a value, failing on `okay: false` and on
    /// `(err ..)` results
    pub fn parse_read_only_response(body: ReadOnlyResponse) -> Result<ClarityValue, ClientError> {
        if !body.okay {
            return Err(ClientError::CallRejected(
                body.cause.unwrap_or_else(|| "no cause given".to_string()),
            ));
        }

        let hex = body
            .result
            .ok_or_else(|| ClientError::InvalidResponse("No result in call-read response".into()))?;
        let value = ClarityValue::from_hex(&hex)?;

        if value.is_response_err() {
            return Err(ClientError::ContractErr(value.to_string()));
        }
        Ok(value)
    }

    /// Current exchange rate in the contract's fixed-point units
    pub async fn get_exchange_rate(&self, contract: &ContractId) -> Result<u128, ClientError> {
        let value = self
            .call_read_only(contract, FN_GET_EXCHANGE_RATE, &[], &contract.address)
            .await?;
        let rate = expect_uint(&value)?;
        info!("✅ Exchange rate: {}", rate);
        Ok(rate)
    }

    /// Remittance balance of `owner` in micro-STX
    pub async fn get_balance(
        &self,
        contract: &ContractId,
        owner: &StacksAddress,
    ) -> Result<u128, ClientError> {
        let value = self
            .call_read_only(
                contract,
                FN_GET_BALANCE,
                &[ClarityValue::principal(*owner)],
                owner,
            )
            .await?;
        let balance = expect_uint(&value)?;
        info!("✅ Balance of {}: {} micro-STX", owner, balance);
        Ok(balance)
    }

    /// One page of transactions touching `address`, newest first
    pub async fn get_transactions(
        &self,
        address: &StacksAddress,
        limit: u32,
        offset: u32,
    ) -> Result<TransactionPage, ClientError> {
        let url = format!(
            "{}/extended/v1/address/{}/transactions",
            self.api_url, address
        );

        debug!("→ transactions {} limit={} offset={}", address, limit, offset);

        let response = self
            .client
            .get(&url)
            .query(&[("limit", limit), ("offset", offset)])
            .send()
            .await?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::http(status, truncate(&body)));
        }

        let body: serde_json::Value = response.json().await.map_err(|e| {
            ClientError::InvalidResponse(format!("Failed to parse transactions response: {}", e))
        })?;

        let page = Self::parse_transaction_page(body)?;
        info!(
            "✅ Retrieved {} of {} transactions",
            page.records.len(),
            page.total
        );
        Ok(page)
    }

    /// Map an explorer transaction list into [`TransactionRecord`]s
    pub fn parse_transaction_page(body: serde_json::Value) -> Result<TransactionPage, ClientError> {
        let raw: RawTransactionList = serde_json::from_value(body)
            .map_err(|e| ClientError::InvalidResponse(format!("Bad transaction list: {}", e)))?;

        let records = raw
            .results
            .into_iter()
            .map(|tx| {
                let (amount, recipient) = match tx.token_transfer {
                    Some(transfer) => {
                        let amount = transfer.amount.parse::<u128>().map_err(|_| {
                            ClientError::InvalidResponse(format!(
                                "Bad amount '{}' in {}",
                                transfer.amount, tx.tx_id
                            ))
                        })?;
                        (amount, Some(transfer.recipient_address))
                    }
                    None => (0, None),
                };

                Ok(TransactionRecord {
                    timestamp: tx.burn_block_time.or(tx.receipt_time).unwrap_or(0),
                    status: TransactionStatus::from_api(&tx.tx_status),
                    function_name: tx.contract_call.map(|c| c.function_name),
                    tx_id: tx.tx_id,
                    tx_type: tx.tx_type,
                    amount,
                    sender: tx.sender_address,
                    recipient,
                })
            })
            .collect::<Result<Vec<_>, ClientError>>()?;

        Ok(TransactionPage {
            records,
            limit: raw.limit,
            offset: raw.offset,
            total: raw.total,
        })
    }
}

fn expect_uint(value: &ClarityValue) -> Result<u128, ClientError> {
    value.as_u128().ok_or_else(|| ClientError::UnexpectedValue {
        expected: "uint",
        got: value.to_string(),
    })
}

fn truncate(body: &str) -> String {
    body.chars().take(MAX_ERROR_BODY).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_read_only_ok_uint() {
        let body = ReadOnlyResponse {
            okay: true,
            result: Some("0x0701000000000000000000000000000005dc".into()),
            cause: None,
        };
        let value = StacksClient::parse_read_only_response(body).unwrap();
        assert_eq!(expect_uint(&value).unwrap(), 1500);
    }

    #[test]
    fn test_read_only_err_result() {
        let body = ReadOnlyResponse {
            okay: true,
            result: Some("0x080100000000000000000000000000000001".into()),
            cause: None,
        };
        match StacksClient::parse_read_only_response(body) {
            Err(ClientError::ContractErr(msg)) => assert_eq!(msg, "(err u1)"),
            other => panic!("expected ContractErr, got {:?}", other),
        }
    }

    #[test]
    fn test_read_only_rejected() {
        let body: ReadOnlyResponse = serde_json::from_value(json!({
            "okay": false,
            "cause": "Unchecked(NoSuchContract(\"SP000000000000000000002Q6VF78.nope\"))"
        }))
        .unwrap();
        assert!(matches!(
            StacksClient::parse_read_only_response(body),
            Err(ClientError::CallRejected(_))
        ));
    }

    #[test]
    fn test_read_only_missing_result() {
        let body = ReadOnlyResponse {
            okay: true,
            result: None,
            cause: None,
        };
        assert!(matches!(
            StacksClient::parse_read_only_response(body),
            Err(ClientError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_non_numeric_result() {
        let value = ClarityValue::Bool(true);
        assert!(matches!(
            expect_uint(&value),
            Err(ClientError::UnexpectedValue { expected: "uint", .. })
        ));
    }

    #[test]
    fn test_parse_transaction_page() {
        let body = json!({
            "limit": 2,
            "offset": 0,
            "total": 3,
            "results": [
                {
                    "tx_id": "0xaaa",
                    "tx_type": "token_transfer",
                    "tx_status": "success",
                    "burn_block_time": 1_690_000_000,
                    "sender_address": "SP2J6ZY48GV1EZ5V2V5RB9MP66SW86PYKKNRV9EJ7",
                    "token_transfer": {
                        "recipient_address": "SP000000000000000000002Q6VF78",
                        "amount": "2500000",
                        "memo": "0x"
                    }
                },
                {
                    "tx_id": "0xbbb",
                    "tx_type": "contract_call",
                    "tx_status": "pending",
                    "receipt_time": 1_690_000_100,
                    "contract_call": {
                        "contract_id": "SP2J6ZY48GV1EZ5V2V5RB9MP66SW86PYKKNRV9EJ7.naija-transfer",
                        "function_name": "send-remittance"
                    }
                }
            ]
        });

        let page = StacksClient::parse_transaction_page(body).unwrap();
        assert_eq!(page.records.len(), 2);
        assert!(page.has_more());
        assert_eq!(page.next_offset(), 2);

        let transfer = &page.records[0];
        assert_eq!(transfer.tx_type, "token_transfer");
        assert_eq!(transfer.amount, 2_500_000);
        assert_eq!(transfer.status, TransactionStatus::Success);
        assert_eq!(transfer.timestamp, 1_690_000_000);
        assert_eq!(
            transfer.recipient.as_deref(),
            Some("SP000000000000000000002Q6VF78")
        );

        let call = &page.records[1];
        assert_eq!(call.amount, 0);
        assert_eq!(call.status, TransactionStatus::Pending);
        assert_eq!(call.timestamp, 1_690_000_100);
        assert_eq!(call.function_name.as_deref(), Some("send-remittance"));
    }

    #[test]
    fn test_parse_unknown_status_and_last_page() {
        let body = json!({
            "limit": 50,
            "offset": 50,
            "total": 51,
            "results": [
                {
                    "tx_id": "0xccc",
                    "tx_type": "coinbase",
                    "tx_status": "dropped_stale_garbage_collect"
                }
            ]
        });
        let page = StacksClient::parse_transaction_page(body).unwrap();
        assert!(!page.has_more());
        assert_eq!(
            page.records[0].status,
            TransactionStatus::Other("dropped_stale_garbage_collect".into())
        );
        assert_eq!(page.records[0].timestamp, 0);
    }

    #[test]
    fn test_parse_rejects_malformed_amount() {
        let body = json!({
            "limit": 1, "offset": 0, "total": 1,
            "results": [{
                "tx_id": "0xddd", "tx_type": "token_transfer", "tx_status": "success",
                "token_transfer": {
                    "recipient_address": "SP000000000000000000002Q6VF78",
                    "amount": "lots"
                }
            }]
        });
        assert!(matches!(
            StacksClient::parse_transaction_page(body),
            Err(ClientError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_parse_rejects_missing_results() {
        assert!(StacksClient::parse_transaction_page(json!({ "error": "not found" })).is_err());
    }

    #[test]
    fn test_api_url_defaults_and_override() {
        let client = StacksClient::new(StacksNetwork::Testnet, None).unwrap();
        assert_eq!(client.api_url(), "https://api.testnet.hiro.so");

        let client =
            StacksClient::new(StacksNetwork::Mainnet, Some("http://localhost:3999/".into()))
                .unwrap();
        assert_eq!(client.api_url(), "http://localhost:3999");
    }
}
