use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use eyre::{Result, WrapErr};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

const CONFIG_DIR: &str = "smelter";
const CONFIG_FILE: &str = "config.toml";
const LOCAL_CONFIG_FILE: &str = "smelter.toml";

/// Tool configuration: named target networks plus defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub networks: HashMap<String, NetworkConfig>,

    #[serde(default)]
    pub defaults: Option<Defaults>,
}

/// One target network and the account used against it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub rpc_url: String,
    pub chain_id: u64,

    /// Gas price in wei applied to every transaction of a run.
    #[serde(default = "default_gas_price")]
    pub gas_price: u128,

    /// Environment variable holding the hex signing key.
    #[serde(default = "default_key_env")]
    pub key_env: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Defaults {
    pub network: Option<String>,
}

fn default_gas_price() -> u128 {
    1_000_000_000
}

fn default_key_env() -> String {
    "ETH_PRIVATE_KEY".to_string()
}

impl AppConfig {
    /// Load configuration from `smelter.toml` in the working directory,
    /// falling back to the user config directory, then to an empty
    /// configuration.
    pub fn load() -> Result<Self> {
        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            return Self::load_from(&local);
        }
        if let Some(config_dir) = dirs::config_dir() {
            let path = config_dir.join(CONFIG_DIR).join(CONFIG_FILE);
            if path.exists() {
                return Self::load_from(&path);
            }
        }
        Ok(Self::default())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).wrap_err("Failed to parse config file")
    }

    /// Get a network by name, falling back to the configured default.
    pub fn get_network(&self, name: Option<&str>) -> Option<(&String, &NetworkConfig)> {
        if let Some(name) = name {
            self.networks.get_key_value(name)
        } else if let Some(default_name) = self
            .defaults
            .as_ref()
            .and_then(|defaults| defaults.network.as_ref())
        {
            self.networks.get_key_value(default_name)
        } else {
            self.networks.iter().next()
        }
    }
}

impl NetworkConfig {
    /// Read the signing key from the configured environment variable. The
    /// key never lands in the config file itself.
    pub fn resolve_private_key(&self) -> Result<Zeroizing<String>> {
        std::env::var(&self.key_env)
            .map(Zeroizing::new)
            .wrap_err_with(|| format!("environment variable `{}` is not set", self.key_env))
    }
}
