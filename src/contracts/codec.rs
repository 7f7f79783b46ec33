use alloy::dyn_abi::{DynSolValue, FunctionExt, JsonAbiExt};
use alloy::json_abi::{Function, Param};
use alloy::primitives::{B256, Bytes, U256};

use super::abi::ContractArtifact;
use crate::error::{Error, Result};

/// Encode a function call: 4-byte selector followed by the canonically
/// ABI-encoded arguments (static head words, dynamic tails). Byte-exact
/// with [`decode_return`]'s expectations on the output side.
pub fn encode_call(function: &Function, args: &[DynSolValue]) -> Result<Bytes> {
    check_arity(&describe(function), function.inputs.len(), args.len())?;
    function
        .abi_encode_input(args)
        .map(Bytes::from)
        .map_err(|err| Error::Encoding {
            context: describe(function),
            reason: err.to_string(),
        })
}

/// Decode raw return data against the function's declared output types.
pub fn decode_return(function: &Function, data: &[u8]) -> Result<Vec<DynSolValue>> {
    function
        .abi_decode_output(data)
        .map_err(|err| Error::Decoding {
            context: describe(function),
            reason: err.to_string(),
        })
}

/// Creation payload for an artifact: the bytecode as-is when no arguments
/// are supplied, otherwise bytecode followed by the encoded constructor
/// arguments. Supplying arguments to an ABI without a constructor is an
/// error.
pub fn deploy_data(artifact: &ContractArtifact, args: &[DynSolValue]) -> Result<Bytes> {
    if args.is_empty() {
        return Ok(artifact.bytecode.clone());
    }
    let context = format!("{} constructor", artifact.name);
    let constructor = artifact
        .constructor()
        .ok_or_else(|| Error::MissingConstructor(artifact.name.clone()))?;
    check_arity(&context, constructor.inputs.len(), args.len())?;
    let encoded = constructor
        .abi_encode_input(args)
        .map_err(|err| Error::Encoding {
            context,
            reason: err.to_string(),
        })?;
    let mut data = artifact.bytecode.to_vec();
    data.extend_from_slice(&encoded);
    Ok(data.into())
}

fn check_arity(context: &str, expected: usize, got: usize) -> Result<()> {
    if expected != got {
        return Err(Error::Encoding {
            context: context.to_string(),
            reason: format!("expected {expected} argument(s), got {got}"),
        });
    }
    Ok(())
}

/// Render `name(arg0: type, …)` for logs and error context. ABI entries
/// routinely omit parameter names; those fall back to positional `argN`
/// placeholders.
pub fn describe(function: &Function) -> String {
    let params: Vec<String> = function
        .inputs
        .iter()
        .enumerate()
        .map(|(index, input)| format!("{}: {}", param_name(input, index), input.ty))
        .collect();
    format!("{}({})", function.name, params.join(", "))
}

pub fn param_name(param: &Param, index: usize) -> String {
    if param.name.is_empty() {
        format!("arg{index}")
    } else {
        param.name.clone()
    }
}

/// An ASCII symbol right-padded into a 32-byte word, the shape token
/// constructors take their names in ("GOV", "SAI", …).
pub fn symbol_b32(symbol: &str) -> DynSolValue {
    let mut word = [0u8; 32];
    let bytes = symbol.as_bytes();
    let len = bytes.len().min(32);
    word[..len].copy_from_slice(&bytes[..len]);
    DynSolValue::FixedBytes(B256::from(word), 32)
}

/// A number left-padded into a 32-byte word, the shape price feeds are
/// poked with.
pub fn u256_b32(value: U256) -> DynSolValue {
    DynSolValue::FixedBytes(B256::from(value), 32)
}

#[cfg(test)]
mod tests {
    use alloy::json_abi::JsonAbi;
    use alloy::primitives::{Address, keccak256};

    use super::*;

    fn abi(json: &str) -> JsonAbi {
        serde_json::from_str(json).unwrap()
    }

    fn function(abi: &JsonAbi, name: &str) -> Function {
        abi.function(name).unwrap()[0].clone()
    }

    const TOKEN_ABI: &str = r#"[
        {
            "type": "function",
            "name": "mint",
            "inputs": [{"name": "", "type": "uint256"}],
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
            "name": "shape",
            "inputs": [],
            "outputs": [
                {"name": "", "type": "address"},
                {"name": "", "type": "bool"},
                {"name": "", "type": "bytes32"},
                {"name": "", "type": "string"},
                {"name": "", "type": "bytes"},
                {"name": "", "type": "uint256[]"}
            ],
            "stateMutability": "view"
        }
    ]"#;

    #[test]
    fn calls_are_selector_prefixed_and_word_encoded() {
        let abi = abi(TOKEN_ABI);
        let mint = function(&abi, "mint");

        let data = encode_call(&mint, &[DynSolValue::Uint(U256::from(100), 256)]).unwrap();

        let selector = &keccak256("mint(uint256)".as_bytes())[..4];
        assert_eq!(&data[..4], selector);
        assert_eq!(data.len(), 4 + 32);
        assert_eq!(U256::from_be_slice(&data[4..]), U256::from(100));
    }

    #[test]
    fn outputs_round_trip_across_static_and_dynamic_types() {
        let abi = abi(TOKEN_ABI);
        let shape = function(&abi, "shape");

        let values = vec![
            DynSolValue::Address(Address::repeat_byte(0x11)),
            DynSolValue::Bool(true),
            DynSolValue::FixedBytes(B256::repeat_byte(0x22), 32),
            DynSolValue::String("sai".to_string()),
            DynSolValue::Bytes(vec![0xde, 0xad, 0xbe, 0xef]),
            DynSolValue::Array(vec![
                DynSolValue::Uint(U256::from(1), 256),
                DynSolValue::Uint(U256::from(2), 256),
            ]),
        ];

        let encoded = shape.abi_encode_output(&values).unwrap();
        let decoded = decode_return(&shape, &encoded).unwrap();
        assert_eq!(decoded, values);
    }

    #[test]
    fn arity_mismatches_are_encoding_errors() {
        let abi = abi(TOKEN_ABI);
        let mint = function(&abi, "mint");

        let err = encode_call(&mint, &[]).unwrap_err();
        assert!(matches!(err, Error::Encoding { .. }), "got {err}");
    }

    #[test]
    fn type_mismatches_are_encoding_errors() {
        let abi = abi(TOKEN_ABI);
        let mint = function(&abi, "mint");

        let err = encode_call(&mint, &[DynSolValue::Bool(true)]).unwrap_err();
        assert!(matches!(err, Error::Encoding { .. }), "got {err}");
    }

    #[test]
    fn truncated_return_data_is_a_decoding_error() {
        let abi = abi(TOKEN_ABI);
        let balance_of = function(&abi, "balanceOf");

        let err = decode_return(&balance_of, &[0u8; 16]).unwrap_err();
        assert!(matches!(err, Error::Decoding { .. }), "got {err}");
    }

    fn artifact(abi_json: &str) -> ContractArtifact {
        ContractArtifact {
            name: "DSToken".to_string(),
            abi: abi(abi_json),
            bytecode: Bytes::from(vec![0x60, 0x60]),
        }
    }

    #[test]
    fn bytecode_passes_through_without_constructor_args() {
        let artifact = artifact("[]");
        let data = deploy_data(&artifact, &[]).unwrap();
        assert_eq!(data, artifact.bytecode);
    }

    #[test]
    fn constructor_args_are_appended_to_the_bytecode() {
        let artifact = artifact(
            r#"[{
                "type": "constructor",
                "inputs": [{"name": "symbol_", "type": "bytes32"}],
                "stateMutability": "nonpayable"
            }]"#,
        );

        let data = deploy_data(&artifact, &[symbol_b32("GOV")]).unwrap();
        assert_eq!(&data[..2], artifact.bytecode.as_ref());
        assert_eq!(data.len(), 2 + 32);
        assert_eq!(&data[2..5], b"GOV");
        assert!(data[5..].iter().all(|b| *b == 0));
    }

    #[test]
    fn args_without_a_constructor_entry_are_rejected() {
        let artifact = artifact("[]");
        let err = deploy_data(&artifact, &[symbol_b32("GOV")]).unwrap_err();
        assert!(matches!(err, Error::MissingConstructor(name) if name == "DSToken"));
    }

    #[test]
    fn unnamed_parameters_render_as_positional_placeholders() {
        let abi = abi(TOKEN_ABI);
        assert_eq!(describe(&function(&abi, "mint")), "mint(arg0: uint256)");
        assert_eq!(
            describe(&function(&abi, "balanceOf")),
            "balanceOf(guy: address)"
        );
    }

    #[test]
    fn number_words_are_left_padded() {
        let DynSolValue::FixedBytes(word, 32) = u256_b32(U256::from(0x01ff)) else {
            panic!("expected a fixed-bytes word");
        };
        assert_eq!(word[30], 0x01);
        assert_eq!(word[31], 0xff);
        assert!(word[..30].iter().all(|b| *b == 0));
    }
}
