use alloy::eips::BlockNumberOrTag;
use alloy::primitives::{Address, B256, Bytes, TxKind};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::{TransactionInput, TransactionRequest};
use async_trait::async_trait;

use super::executor::PollPolicy;
use super::rpc::{EthRpc, TxReceipt, TxRequest};
use crate::error::Result;

/// Live node connection: an HTTP provider exposed through [`EthRpc`].
pub struct Connector {
    provider: DynProvider,
}

impl Connector {
    pub async fn connect(rpc_url: &str) -> Result<Self> {
        let provider = ProviderBuilder::new().connect(rpc_url).await?.erased();
        Ok(Self { provider })
    }

    fn call_request(request: &TxRequest) -> TransactionRequest {
        TransactionRequest {
            from: Some(request.from),
            to: request.to.map(TxKind::Call),
            value: (!request.value.is_zero()).then_some(request.value),
            input: TransactionInput::new(request.data.clone()),
            ..Default::default()
        }
    }
}

#[async_trait]
impl EthRpc for Connector {
    async fn latest_block_number(&self) -> Result<u64> {
        let block = self
            .provider
            .get_block_by_number(BlockNumberOrTag::Latest)
            .await?;
        Ok(block.map(|b| b.header.number).unwrap_or_default())
    }

    async fn estimate_gas(&self, request: &TxRequest) -> Result<u64> {
        Ok(self.provider.estimate_gas(Self::call_request(request)).await?)
    }

    async fn call(&self, request: &TxRequest) -> Result<Bytes> {
        Ok(self.provider.call(Self::call_request(request)).await?)
    }

    async fn send_raw_transaction(&self, raw: &[u8]) -> Result<B256> {
        let pending = self.provider.send_raw_transaction(raw).await?;
        Ok(*pending.tx_hash())
    }

    async fn transaction_receipt(&self, hash: B256) -> Result<Option<TxReceipt>> {
        let receipt = self.provider.get_transaction_receipt(hash).await?;
        Ok(receipt.map(|r| TxReceipt {
            status: r.status(),
            contract_address: r.contract_address,
            transaction_hash: r.transaction_hash,
        }))
    }

    async fn transaction_count(&self, address: Address) -> Result<u64> {
        Ok(self.provider.get_transaction_count(address).await?)
    }

    async fn network_id(&self) -> Result<u64> {
        Ok(self.provider.get_net_version().await?)
    }
}

/// Block until the node answers a block query, retrying at the policy's
/// interval. Unbounded by default; only runs before the pipeline starts,
/// never mid-run.
pub async fn spin_until_connected(rpc: &dyn EthRpc, rpc_url: &str, poll: PollPolicy) -> Result<()> {
    let mut attempts = 0u32;
    loop {
        tracing::info!(url = rpc_url, "probing node");
        match rpc.latest_block_number().await {
            Ok(_) => return Ok(()),
            Err(err) => {
                attempts += 1;
                if let Some(max) = poll.max_attempts
                    && attempts >= max
                {
                    return Err(err);
                }
                tracing::debug!(error = %err, "node not reachable yet");
                tokio::time::sleep(poll.interval).await;
            }
        }
    }
}
