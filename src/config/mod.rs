mod settings;

pub use settings::{AppConfig, Defaults, NetworkConfig};
