//! Read access to the remittance contract and account history.
//!
//! The service only talks to the chain through [`ChainApi`], so it can run
//! against a canned implementation in tests.

use naija_network::{ClientError, ContractId, StacksAddress, StacksClient, TransactionPage};
use std::future::Future;

pub trait ChainApi: Clone + Send + Sync + 'static {
    /// Raw `get-exchange-rate` result, before scaling
    fn exchange_rate(&self) -> impl Future<Output = Result<u128, ClientError>> + Send;

    /// `get-balance` of `owner`, in micro-STX
    fn balance(
        &self,
        owner: StacksAddress,
    ) -> impl Future<Output = Result<u128, ClientError>> + Send;

    fn transactions(
        &self,
        owner: StacksAddress,
        limit: u32,
        offset: u32,
    ) -> impl Future<Output = Result<TransactionPage, ClientError>> + Send;
}

/// [`ChainApi`] backed by the Stacks API and one contract deployment
#[derive(Debug, Clone)]
pub struct ContractApi {
    client: StacksClient,
    contract: ContractId,
}

impl ContractApi {
    pub fn new(client: StacksClient, contract: ContractId) -> Self {
        Self { client, contract }
    }
}

impl ChainApi for ContractApi {
    async fn exchange_rate(&self) -> Result<u128, ClientError> {
        self.client.get_exchange_rate(&self.contract).await
    }

    async fn balance(&self, owner: StacksAddress) -> Result<u128, ClientError> {
        self.client.get_balance(&self.contract, &owner).await
    }

    async fn transactions(
        &self,
        owner: StacksAddress,
        limit: u32,
        offset: u32,
    ) -> Result<TransactionPage, ClientError> {
        self.client.get_transactions(&owner, limit, offset).await
    }
}
