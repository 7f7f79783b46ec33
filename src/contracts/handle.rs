use std::sync::Arc;

use alloy::dyn_abi::DynSolValue;
use alloy::json_abi::JsonAbi;
use alloy::primitives::{Address, U256};

use super::bindings::FunctionTable;
use super::codec;
use crate::chain::{EthRpc, Executor, TxRequest};
use crate::error::{Error, Result};

/// Runtime handle to a deployed contract: an address and its dispatch
/// table, bound to the shared transaction executor. Read-only after
/// construction.
pub struct Contract {
    name: String,
    address: Address,
    fns: FunctionTable,
    executor: Arc<Executor>,
}

/// Overrides for a local (simulated) call.
#[derive(Clone, Copy, Debug, Default)]
pub struct CallOptions {
    pub sender: Option<Address>,
    pub value: Option<U256>,
}

/// Overrides for a submitted transaction.
#[derive(Clone, Copy, Debug, Default)]
pub struct SendOptions {
    pub sender: Option<Address>,
    pub gas_price: Option<u128>,
    pub value: Option<U256>,
}

impl Contract {
    pub fn attach(name: &str, address: Address, abi: &JsonAbi, executor: Arc<Executor>) -> Self {
        Self {
            name: name.to_string(),
            address,
            fns: FunctionTable::from_abi(name, abi),
            executor,
        }
    }

    #[allow(dead_code)]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Simulated execution against the latest confirmed state, decoded
    /// into the function's declared outputs. No transaction is built and
    /// no nonce is consumed.
    pub async fn call(&self, function: &str, args: &[DynSolValue]) -> Result<Vec<DynSolValue>> {
        self.call_as(function, args, CallOptions::default()).await
    }

    pub async fn call_as(
        &self,
        function: &str,
        args: &[DynSolValue],
        options: CallOptions,
    ) -> Result<Vec<DynSolValue>> {
        let entry = self.fns.function(function)?;
        let data = codec::encode_call(entry, args)?;
        let request = TxRequest {
            from: options.sender.unwrap_or_else(|| self.executor.sender()),
            to: Some(self.address),
            data,
            value: options.value.unwrap_or_default(),
            gas_price: self.executor.gas_price(),
        };
        let raw = self.executor.rpc().call(&request).await?;
        codec::decode_return(entry, &raw)
    }

    /// A zero-argument getter returning a single address.
    pub async fn call_address(&self, function: &str) -> Result<Address> {
        let value = self.call_single(function, &[]).await?;
        value.as_address().ok_or_else(|| Error::Decoding {
            context: format!("{}.{function}", self.name),
            reason: "return value is not an address".to_string(),
        })
    }

    /// A getter returning a single unsigned integer.
    pub async fn call_u256(&self, function: &str, args: &[DynSolValue]) -> Result<U256> {
        let value = self.call_single(function, args).await?;
        value
            .as_uint()
            .map(|(value, _)| value)
            .ok_or_else(|| Error::Decoding {
                context: format!("{}.{function}", self.name),
                reason: "return value is not an unsigned integer".to_string(),
            })
    }

    async fn call_single(&self, function: &str, args: &[DynSolValue]) -> Result<DynSolValue> {
        let mut values = self.call(function, args).await?;
        if values.len() != 1 {
            return Err(Error::Decoding {
                context: format!("{}.{function}", self.name),
                reason: format!("expected a single return value, got {}", values.len()),
            });
        }
        Ok(values.remove(0))
    }

    /// Submit a state-changing call and block until it confirms. Returns
    /// nothing: execution results do not travel back through receipts, so
    /// success is all a caller learns. `label` is diagnostic context only.
    pub async fn send(&self, function: &str, args: &[DynSolValue], label: &str) -> Result<()> {
        self.send_as(function, args, label, SendOptions::default())
            .await
    }

    pub async fn send_as(
        &self,
        function: &str,
        args: &[DynSolValue],
        label: &str,
        options: SendOptions,
    ) -> Result<()> {
        let entry = self.fns.transactional(function)?;
        let data = codec::encode_call(entry, args)?;
        let request = TxRequest {
            from: options.sender.unwrap_or_else(|| self.executor.sender()),
            to: Some(self.address),
            data,
            value: options.value.unwrap_or_default(),
            gas_price: options.gas_price.unwrap_or_else(|| self.executor.gas_price()),
        };
        self.executor.execute(&request, label).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::keccak256;
    use alloy::signers::local::PrivateKeySigner;

    use super::*;
    use crate::chain::rpc::testing::MockNode;
    use crate::chain::{AccountManager, GasConfig, PollPolicy};

    const TOKEN_ABI: &str = r#"[
        {
            "type": "function",
            "name": "mint",
            "inputs": [{"name": "wad", "type": "uint256"}],
            "outputs": [],
            "stateMutability": "nonpayable"
        },
        {
            "type": "function",
            "name": "balanceOf",
            "inputs": [{"name": "guy", "type": "address"}],
            "outputs": [{"name": "", "type": "uint256"}],
            "stateMutability": "view"
        },
        {
            "type": "function",
            "name": "deposit",
            "inputs": [],
            "outputs": [],
            "stateMutability": "payable"
        }
    ]"#;

    fn token(node: Arc<MockNode>) -> Contract {
        let abi: JsonAbi = serde_json::from_str(TOKEN_ABI).unwrap();
        let accounts = AccountManager::new(PrivateKeySigner::random(), 1);
        let poll = PollPolicy {
            interval: std::time::Duration::from_millis(1),
            max_attempts: None,
        };
        let executor = Arc::new(Executor::new(node, accounts, GasConfig::default(), poll, 1));
        Contract::attach("DSToken", Address::repeat_byte(0x42), &abi, executor)
    }

    #[tokio::test]
    async fn local_calls_decode_without_submitting() {
        let node = Arc::new(MockNode::new());
        node.push_return(U256::from(1234).to_be_bytes::<32>().to_vec().into());
        let token = token(node.clone());

        let balance = token
            .call_u256(
                "balanceOf",
                &[DynSolValue::Address(Address::repeat_byte(0x07))],
            )
            .await
            .unwrap();

        assert_eq!(balance, U256::from(1234));
        assert!(node.sent().is_empty());

        let calls = node.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].to, Some(Address::repeat_byte(0x42)));
        let selector = &keccak256("balanceOf(address)".as_bytes())[..4];
        assert_eq!(&calls[0].data[..4], selector);
    }

    #[tokio::test]
    async fn sends_submit_exactly_one_matching_transaction() {
        let node = Arc::new(MockNode::new());
        let token = token(node.clone());

        token
            .send(
                "mint",
                &[DynSolValue::Uint(U256::from(100), 256)],
                "DSToken.mint",
            )
            .await
            .unwrap();

        let sent = node.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, Some(Address::repeat_byte(0x42)));
        let selector = &keccak256("mint(uint256)".as_bytes())[..4];
        assert_eq!(&sent[0].input[..4], selector);
        assert_eq!(U256::from_be_slice(&sent[0].input[4..]), U256::from(100));
    }

    #[tokio::test]
    async fn constant_functions_cannot_be_sent() {
        let node = Arc::new(MockNode::new());
        let token = token(node);

        let err = token
            .send(
                "balanceOf",
                &[DynSolValue::Address(Address::ZERO)],
                "DSToken.balanceOf",
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ConstantFunction { .. }));
    }

    #[tokio::test]
    async fn attached_value_rides_the_transaction() {
        let node = Arc::new(MockNode::new());
        let token = token(node.clone());

        token
            .send_as(
                "deposit",
                &[],
                "gem.deposit",
                SendOptions {
                    value: Some(U256::from(1_000)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(node.sent()[0].value, U256::from(1_000));
    }
}
