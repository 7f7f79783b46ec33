use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Logical contract role ("tub", "oasisDex", …) → deployed address.
pub type RoleAddresses = BTreeMap<String, Address>;

/// Role addresses keyed by network id, persisted as `addresses.json`.
///
/// Persisting merges with whatever is already at the path: the entry for
/// the same network is replaced wholesale, entries for other networks are
/// preserved.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DeploymentManifest {
    #[serde(flatten)]
    networks: BTreeMap<String, RoleAddresses>,
}

impl DeploymentManifest {
    /// Read a manifest from disk; a missing file is an empty manifest.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn insert(&mut self, network_id: u64, addresses: RoleAddresses) {
        self.networks.insert(network_id.to_string(), addresses);
    }

    pub fn network(&self, network_id: u64) -> Option<&RoleAddresses> {
        self.networks.get(&network_id.to_string())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

/// Merge this run's addresses into the manifest at `path` and write it
/// back. Only called after the whole pipeline has succeeded, so a failed
/// run never leaves a partial manifest behind.
pub fn persist(path: &Path, network_id: u64, addresses: RoleAddresses) -> Result<DeploymentManifest> {
    let mut manifest = DeploymentManifest::load(path)?;
    manifest.insert(network_id, addresses);
    manifest.save(path)?;
    Ok(manifest)
}

/// The fixed role → variable mapping exposed to downstream tooling.
const ENV_EXPORTS: &[(&str, &str)] = &[
    ("gem", "SAI_GEM"),
    ("gov", "SAI_GOV"),
    ("pip", "SAI_PIP"),
    ("pep", "SAI_PEP"),
    ("pit", "SAI_PIT"),
    ("adm", "SAI_ADM"),
    ("sai", "SAI_SAI"),
    ("sin", "SAI_SIN"),
    ("skr", "SAI_SKR"),
    ("dad", "SAI_DAD"),
    ("mom", "SAI_MOM"),
    ("vox", "SAI_VOX"),
    ("tub", "SAI_TUB"),
    ("tap", "SAI_TAP"),
    ("top", "SAI_TOP"),
    ("oasisDex", "SAI_OASIS"),
];

/// Render the flat environment-style document. Roles absent from the run
/// (the optional market, for instance) are simply omitted.
pub fn render_env(addresses: &RoleAddresses) -> String {
    let mut out = String::new();
    for (role, variable) in ENV_EXPORTS {
        if let Some(address) = addresses.get(*role) {
            out.push_str(&format!("{variable}={address}\n"));
        }
    }
    out
}

pub fn write_env(path: &Path, addresses: &RoleAddresses) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, render_env(addresses))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addresses(pairs: &[(&str, u8)]) -> RoleAddresses {
        pairs
            .iter()
            .map(|(role, byte)| (role.to_string(), Address::repeat_byte(*byte)))
            .collect()
    }

    #[test]
    fn persisting_preserves_other_networks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("addresses.json");

        persist(&path, 4, addresses(&[("gem", 0x01), ("tub", 0x02)])).unwrap();
        let merged = persist(&path, 1, addresses(&[("gem", 0x03)])).unwrap();

        assert_eq!(merged.network(4), Some(&addresses(&[("gem", 0x01), ("tub", 0x02)])));
        assert_eq!(merged.network(1), Some(&addresses(&[("gem", 0x03)])));

        let reloaded = DeploymentManifest::load(&path).unwrap();
        assert_eq!(reloaded, merged);
    }

    #[test]
    fn same_network_entries_are_replaced_wholesale() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("addresses.json");

        persist(&path, 1, addresses(&[("gem", 0x01), ("tub", 0x02)])).unwrap();
        let merged = persist(&path, 1, addresses(&[("gem", 0x03)])).unwrap();

        // The stale "tub" from the earlier run must not leak through.
        assert_eq!(merged.network(1), Some(&addresses(&[("gem", 0x03)])));
    }

    #[test]
    fn a_missing_manifest_reads_as_empty() {
        let manifest = DeploymentManifest::load(Path::new("/nonexistent/addresses.json")).unwrap();
        assert_eq!(manifest, DeploymentManifest::default());
    }

    #[test]
    fn env_rendering_uses_fixed_names_and_skips_absent_roles() {
        let env = render_env(&addresses(&[("gem", 0x01), ("tub", 0x02)]));
        let gem = Address::repeat_byte(0x01);
        let tub = Address::repeat_byte(0x02);
        assert_eq!(env, format!("SAI_GEM={gem}\nSAI_TUB={tub}\n"));
    }
}
