use alloy::primitives::{Address, B256, Bytes, U256};
use async_trait::async_trait;

use crate::error::Result;

/// A transaction about to be sized, signed and submitted. `to` is absent
/// for contract creation. Gas limit and nonce are assigned later, by the
/// executor and the account manager respectively.
#[derive(Clone, Debug, Default)]
pub struct TxRequest {
    pub from: Address,
    pub to: Option<Address>,
    pub data: Bytes,
    pub value: U256,
    pub gas_price: u128,
}

/// The slice of a mined receipt the pipeline acts on.
#[derive(Clone, Debug)]
pub struct TxReceipt {
    pub status: bool,
    pub contract_address: Option<Address>,
    pub transaction_hash: B256,
}

/// The node surface the pipeline consumes. Implemented over a live HTTP
/// provider by [`Connector`](super::Connector) and by an in-memory node in
/// tests, so every stage can run against simulated execution.
#[async_trait]
pub trait EthRpc: Send + Sync {
    /// Latest block height. Only used to probe node reachability.
    async fn latest_block_number(&self) -> Result<u64>;

    async fn estimate_gas(&self, request: &TxRequest) -> Result<u64>;

    /// Simulated execution at the latest confirmed state. No state change.
    async fn call(&self, request: &TxRequest) -> Result<Bytes>;

    async fn send_raw_transaction(&self, raw: &[u8]) -> Result<B256>;

    async fn transaction_receipt(&self, hash: B256) -> Result<Option<TxReceipt>>;

    /// Confirmed transaction count for an address, the nonce seed.
    async fn transaction_count(&self, address: Address) -> Result<u64>;

    async fn network_id(&self) -> Result<u64>;
}
