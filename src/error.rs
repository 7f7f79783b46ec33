use alloy::primitives::B256;

use crate::chain::TxReceipt;

/// Core error taxonomy. Everything here is terminal for a deployment run:
/// the orchestrator performs no recovery and already-confirmed transactions
/// are left as-is.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("encoding `{context}`: {reason}")]
    Encoding { context: String, reason: String },

    #[error("decoding output of `{context}`: {reason}")]
    Decoding { context: String, reason: String },

    #[error("contract `{0}` has no constructor but constructor arguments were supplied")]
    MissingConstructor(String),

    #[error("contract `{contract}` has no function `{function}`")]
    UnknownFunction { contract: String, function: String },

    #[error("`{contract}.{function}` is constant (view or pure) and cannot be sent as a transaction")]
    ConstantFunction { contract: String, function: String },

    #[error("no compiled artifact for contract `{0}`")]
    UnknownContract(String),

    #[error("transaction `{context}` reverted (hash {hash})", hash = .receipt.transaction_hash)]
    TransactionFailed { context: String, receipt: TxReceipt },

    #[error("creation of `{0}` confirmed without a contract address")]
    NoContractAddress(String),

    #[error("gave up waiting for receipt of `{context}` (hash {hash})")]
    ReceiptTimeout { context: String, hash: B256 },

    #[error(transparent)]
    Rpc(#[from] alloy::transports::TransportError),

    #[error(transparent)]
    Signer(#[from] alloy::signers::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
