use std::collections::BTreeMap;

use alloy::json_abi::{Function, JsonAbi, StateMutability};

use crate::error::{Error, Result};

/// Per-contract dispatch table: one callable entry per function *name*.
///
/// Overloaded names collapse to their first ABI occurrence and later
/// overloads are skipped. Deployment recipes address functions by bare
/// name; true overload resolution is not attempted. Recipes needing a
/// specific overload must rely on ABI declaration order.
#[derive(Clone, Debug)]
pub struct FunctionTable {
    contract: String,
    by_name: BTreeMap<String, Function>,
}

impl FunctionTable {
    pub fn from_abi(contract: &str, abi: &JsonAbi) -> Self {
        let mut by_name = BTreeMap::new();
        for function in abi.functions() {
            by_name
                .entry(function.name.clone())
                .or_insert_with(|| function.clone());
        }
        Self {
            contract: contract.to_string(),
            by_name,
        }
    }

    /// Look up a function for a local (simulated) call.
    pub fn function(&self, name: &str) -> Result<&Function> {
        self.by_name
            .get(name)
            .ok_or_else(|| Error::UnknownFunction {
                contract: self.contract.clone(),
                function: name.to_string(),
            })
    }

    /// Look up a function for a submitted transaction. Only mutating
    /// functions get a write path; view/pure entries are rejected.
    pub fn transactional(&self, name: &str) -> Result<&Function> {
        let function = self.function(name)?;
        if matches!(
            function.state_mutability,
            StateMutability::View | StateMutability::Pure
        ) {
            return Err(Error::ConstantFunction {
                contract: self.contract.clone(),
                function: name.to_string(),
            });
        }
        Ok(function)
    }

    #[allow(dead_code)]
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(json: &str) -> FunctionTable {
        let abi: JsonAbi = serde_json::from_str(json).unwrap();
        FunctionTable::from_abi("DSToken", &abi)
    }

    #[test]
    fn overloads_collapse_to_the_first_occurrence() {
        let table = table(
            r#"[
                {
                    "type": "function",
                    "name": "mint",
                    "inputs": [{"name": "wad", "type": "uint256"}],
                    "outputs": [],
                    "stateMutability": "nonpayable"
                },
                {
                    "type": "function",
                    "name": "mint",
                    "inputs": [
                        {"name": "guy", "type": "address"},
                        {"name": "wad", "type": "uint256"}
                    ],
                    "outputs": [],
                    "stateMutability": "nonpayable"
                }
            ]"#,
        );

        assert_eq!(table.len(), 1);
        let mint = table.function("mint").unwrap();
        assert_eq!(mint.inputs.len(), 1);
        assert_eq!(mint.inputs[0].ty, "uint256");
    }

    #[test]
    fn unknown_names_are_reported_with_the_contract() {
        let table = table("[]");
        let err = table.function("mint").unwrap_err();
        match err {
            Error::UnknownFunction { contract, function } => {
                assert_eq!(contract, "DSToken");
                assert_eq!(function, "mint");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn constant_functions_have_no_write_path() {
        let table = table(
            r#"[
                {
                    "type": "function",
                    "name": "balanceOf",
                    "inputs": [{"name": "guy", "type": "address"}],
                    "outputs": [{"name": "", "type": "uint256"}],
                    "stateMutability": "view"
                },
                {
                    "type": "function",
                    "name": "transfer",
                    "inputs": [
                        {"name": "dst", "type": "address"},
                        {"name": "wad", "type": "uint256"}
                    ],
                    "outputs": [{"name": "", "type": "bool"}],
                    "stateMutability": "nonpayable"
                }
            ]"#,
        );

        assert!(table.transactional("transfer").is_ok());
        let err = table.transactional("balanceOf").unwrap_err();
        assert!(matches!(err, Error::ConstantFunction { .. }));
    }
}
