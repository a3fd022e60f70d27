//! Minimal ABI encoding for contract call data.
//!
//! Covers the static types used by transfer-style and view calls. Dynamic
//! types (strings, arrays) are out of scope; callers with richer needs can
//! pass pre-encoded call data to the transaction builder directly.

use alloy_primitives::{Address, B256, U256};

use crate::error::{Error, Result};
use crate::types::keccak256_hash;

/// A single static-type argument for a contract call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbiValue {
    Address(Address),
    Uint(U256),
    Bool(bool),
    FixedBytes(B256),
}

impl AbiValue {
    fn encode_word(&self) -> [u8; 32] {
        let mut word = [0u8; 32];
        match self {
            AbiValue::Address(addr) => word[12..].copy_from_slice(addr.as_slice()),
            AbiValue::Uint(value) => word = value.to_be_bytes::<32>(),
            AbiValue::Bool(flag) => word[31] = u8::from(*flag),
            AbiValue::FixedBytes(bytes) => word.copy_from_slice(bytes.as_slice()),
        }
        word
    }
}

/// Number of parameters declared by a canonical function signature.
fn parameter_count(signature: &str) -> Result<usize> {
    if signature.contains(char::is_whitespace) {
        return Err(Error::BuildFailure(format!(
            "function signature '{}' must be canonical (no whitespace)",
            signature
        )));
    }
    let open = signature
        .find('(')
        .ok_or_else(|| Error::BuildFailure(format!("malformed function signature '{}'", signature)))?;
    let inner = signature[open + 1..]
        .strip_suffix(')')
        .ok_or_else(|| Error::BuildFailure(format!("malformed function signature '{}'", signature)))?;
    if inner.is_empty() {
        Ok(0)
    } else {
        Ok(inner.split(',').count())
    }
}

/// Encode a contract call: 4-byte selector followed by one 32-byte word
/// per argument.
///
/// The signature must be canonical, e.g. `transfer(address,uint256)`.
pub fn encode_call(signature: &str, args: &[AbiValue]) -> Result<Vec<u8>> {
    let expected = parameter_count(signature)?;
    if args.len() != expected {
        return Err(Error::BuildFailure(format!(
            "function '{}' takes {} arguments, got {}",
            signature,
            expected,
            args.len()
        )));
    }

    let selector = &keccak256_hash(signature.as_bytes())[..4];
    let mut data = Vec::with_capacity(4 + 32 * args.len());
    data.extend_from_slice(selector);
    for arg in args {
        data.extend_from_slice(&arg.encode_word());
    }
    Ok(data)
}

/// Decode a single uint256 return word, as produced by view calls like
/// `balanceOf(address)`.
pub fn decode_uint(data: &[u8]) -> Result<U256> {
    if data.len() != 32 {
        return Err(Error::Deserialization(format!(
            "expected a 32-byte return word, got {} bytes",
            data.len()
        )));
    }
    Ok(U256::from_be_slice(data))
}
