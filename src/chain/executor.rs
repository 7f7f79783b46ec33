use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::{Address, B256};

use super::account::AccountManager;
use super::rpc::{EthRpc, TxReceipt, TxRequest};
use crate::error::{Error, Result};

/// Ceiling applied to padded gas estimates. A policy value, not the
/// protocol block limit; overridable from the CLI.
pub const DEFAULT_GAS_CEILING: u64 = 6_950_000;

#[derive(Clone, Copy, Debug)]
pub struct GasConfig {
    pub ceiling: u64,
}

impl Default for GasConfig {
    fn default() -> Self {
        Self {
            ceiling: DEFAULT_GAS_CEILING,
        }
    }
}

impl GasConfig {
    /// Pad an estimate by 10% (rounded down), clamped to the ceiling.
    pub fn padded(&self, estimate: u64) -> u64 {
        self.ceiling.min(estimate + estimate / 10)
    }
}

/// Cadence for a wait loop. Unbounded by default: a transaction that never
/// confirms suspends the pipeline, because there is no cancellation path
/// for an already-broadcast payload. Callers wanting a bounded wait set
/// `max_attempts`.
#[derive(Clone, Copy, Debug)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: Option<u32>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            max_attempts: None,
        }
    }
}

/// Turns a [`TxRequest`] into a submitted, confirmed transaction: sizes the
/// gas, signs through the account manager, broadcasts, and polls for the
/// receipt. Shared by every contract handle in a run.
pub struct Executor {
    rpc: Arc<dyn EthRpc>,
    accounts: AccountManager,
    gas: GasConfig,
    poll: PollPolicy,
    gas_price: u128,
}

impl Executor {
    pub fn new(
        rpc: Arc<dyn EthRpc>,
        accounts: AccountManager,
        gas: GasConfig,
        poll: PollPolicy,
        gas_price: u128,
    ) -> Self {
        Self {
            rpc,
            accounts,
            gas,
            poll,
            gas_price,
        }
    }

    pub fn rpc(&self) -> &dyn EthRpc {
        self.rpc.as_ref()
    }

    /// The address transactions originate from unless a sender override is
    /// given.
    pub fn sender(&self) -> Address {
        self.accounts.address()
    }

    pub fn gas_price(&self) -> u128 {
        self.gas_price
    }

    /// Estimate, sign, broadcast and confirm. Fails with
    /// [`Error::TransactionFailed`] when the receipt reports a revert;
    /// `context` labels the transaction in logs and errors.
    pub async fn execute(&self, request: &TxRequest, context: &str) -> Result<TxReceipt> {
        let estimate = self.rpc.estimate_gas(request).await?;
        let gas_limit = self.gas.padded(estimate);
        let signed = self
            .accounts
            .sign_transaction(self.rpc.as_ref(), request, gas_limit)
            .await?;
        tracing::info!(
            context,
            nonce = signed.nonce,
            gas = gas_limit,
            gas_price = request.gas_price,
            "submitting transaction"
        );
        let hash = self.rpc.send_raw_transaction(&signed.raw).await?;
        let receipt = self.wait_for_receipt(hash, context).await?;
        if !receipt.status {
            return Err(Error::TransactionFailed {
                context: context.to_string(),
                receipt,
            });
        }
        Ok(receipt)
    }

    /// Poll for a receipt at the configured interval until one appears or
    /// the (optional) attempt bound is exhausted.
    pub async fn wait_for_receipt(&self, hash: B256, context: &str) -> Result<TxReceipt> {
        let mut attempts = 0u32;
        loop {
            if let Some(receipt) = self.rpc.transaction_receipt(hash).await? {
                return Ok(receipt);
            }
            attempts += 1;
            if let Some(max) = self.poll.max_attempts
                && attempts >= max
            {
                return Err(Error::ReceiptTimeout {
                    context: context.to_string(),
                    hash,
                });
            }
            tokio::time::sleep(self.poll.interval).await;
        }
    }
}
