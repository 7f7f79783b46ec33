mod account;
mod connector;
mod executor;
pub mod rpc;

pub use account::{AccountManager, SignedTx};
pub use connector::{Connector, spin_until_connected};
pub use executor::{DEFAULT_GAS_CEILING, Executor, GasConfig, PollPolicy};
pub use rpc::{EthRpc, TxReceipt, TxRequest};
