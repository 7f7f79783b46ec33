mod deployer;
pub mod manifest;

pub use deployer::{ContractDeployer, DeployOptions};
pub use manifest::{DeploymentManifest, RoleAddresses};
