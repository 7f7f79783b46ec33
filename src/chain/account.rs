use std::collections::HashMap;
use std::collections::hash_map::Entry;

use alloy::consensus::{SignableTransaction, TxEnvelope, TxLegacy};
use alloy::eips::eip2718::Encodable2718;
use alloy::network::TxSignerSync;
use alloy::primitives::{Address, TxKind};
use alloy::signers::local::PrivateKeySigner;
use tokio::sync::Mutex;

use super::rpc::{EthRpc, TxRequest};
use crate::error::Result;

/// A signed, broadcast-ready payload. The nonce rides along for logging.
pub struct SignedTx {
    pub raw: Vec<u8>,
    pub nonce: u64,
}

/// Owns the signing key and the per-address nonce sequence.
///
/// Nonces are seeded from the network the first time an address is used
/// and incremented locally on every signature afterwards. They are never
/// re-fetched: a re-fetch would race transactions that are broadcast but
/// not yet mined. The mutex keeps the increment atomic should callers
/// ever issue transactions concurrently.
pub struct AccountManager {
    signer: PrivateKeySigner,
    chain_id: u64,
    nonces: Mutex<HashMap<Address, u64>>,
}

impl AccountManager {
    pub fn new(signer: PrivateKeySigner, chain_id: u64) -> Self {
        Self {
            signer,
            chain_id,
            nonces: Mutex::new(HashMap::new()),
        }
    }

    /// The address transactions are signed for by default.
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Hand out the next nonce for `address`, incrementing the cache.
    pub async fn next_nonce(&self, rpc: &dyn EthRpc, address: Address) -> Result<u64> {
        let mut nonces = self.nonces.lock().await;
        let slot = match nonces.entry(address) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(rpc.transaction_count(address).await?),
        };
        let nonce = *slot;
        *slot += 1;
        Ok(nonce)
    }

    /// Assign the next nonce for `request.from`, then serialize and sign a
    /// legacy transaction bound to the configured chain id.
    pub async fn sign_transaction(
        &self,
        rpc: &dyn EthRpc,
        request: &TxRequest,
        gas_limit: u64,
    ) -> Result<SignedTx> {
        let nonce = self.next_nonce(rpc, request.from).await?;
        let mut tx = TxLegacy {
            chain_id: Some(self.chain_id),
            nonce,
            gas_price: request.gas_price,
            gas_limit,
            to: match request.to {
                Some(address) => TxKind::Call(address),
                None => TxKind::Create,
            },
            value: request.value,
            input: request.data.clone(),
        };
        let signature = self.signer.sign_transaction_sync(&mut tx)?;
        let signed = tx.into_signed(signature);
        let raw = TxEnvelope::Legacy(signed).encoded_2718();
        Ok(SignedTx { raw, nonce })
    }
}
