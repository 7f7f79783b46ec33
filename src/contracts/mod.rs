mod abi;
mod bindings;
pub mod codec;
mod handle;

pub use abi::{ContractArtifact, Contracts};
pub use bindings::FunctionTable;
pub use handle::{CallOptions, Contract, SendOptions};
