//! Unit tests for ABI call-data encoding

use alloy_primitives::{Address, B256, U256};
use chainsig_core::{encode_call, AbiValue, Error};

fn fixture_address() -> Address {
    "0x57d1f309c9e4231800ae6bf1737b1b8fab526a63"
        .parse()
        .unwrap()
}

// ============================================================================
// Selector and Word Layout
// ============================================================================

#[test]
fn test_golden_transfer_call_data() {
    // transfer(X, 100) where X is the golden derived address.
    let data = encode_call(
        "transfer(address,uint256)",
        &[
            AbiValue::Address(fixture_address()),
            AbiValue::Uint(U256::from(100u64)),
        ],
    )
    .unwrap();

    assert_eq!(
        hex::encode(&data),
        concat!(
            "a9059cbb",
            "00000000000000000000000057d1f309c9e4231800ae6bf1737b1b8fab526a63",
            "0000000000000000000000000000000000000000000000000000000000000064",
        )
    );
}

#[test]
fn test_known_selectors() {
    let addr = AbiValue::Address(fixture_address());
    let amount = AbiValue::Uint(U256::ZERO);
    let cases: [(&str, Vec<AbiValue>, &str); 4] = [
        ("transfer(address,uint256)", vec![addr.clone(), amount.clone()], "a9059cbb"),
        ("balanceOf(address)", vec![addr.clone()], "70a08231"),
        ("approve(address,uint256)", vec![addr, amount], "095ea7b3"),
        ("decimals()", vec![], "313ce567"),
    ];
    for (signature, args, selector) in cases {
        let data = encode_call(signature, &args).unwrap();
        assert_eq!(hex::encode(&data[..4]), selector, "selector of {}", signature);
    }
}

#[test]
fn test_encoding_is_pure() {
    let args = [
        AbiValue::Address(fixture_address()),
        AbiValue::Uint(U256::from(100u64)),
    ];
    let a = encode_call("transfer(address,uint256)", &args).unwrap();
    let b = encode_call("transfer(address,uint256)", &args).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_every_argument_takes_one_word() {
    let data = encode_call(
        "f(address,uint256,bool,bytes32)",
        &[
            AbiValue::Address(fixture_address()),
            AbiValue::Uint(U256::MAX),
            AbiValue::Bool(true),
            AbiValue::FixedBytes(B256::repeat_byte(0xcd)),
        ],
    )
    .unwrap();
    assert_eq!(data.len(), 4 + 4 * 32);

    // uint256::MAX fills its word, the bool word is all zero but its last
    // byte, and fixed bytes pass through unchanged.
    assert_eq!(&data[36..68], [0xffu8; 32]);
    assert_eq!(data[68 + 31], 1);
    assert!(data[68..68 + 31].iter().all(|b| *b == 0));
    assert_eq!(&data[100..132], [0xcdu8; 32]);
}

// ============================================================================
// Rejection Paths
// ============================================================================

#[test]
fn test_arity_mismatch_rejected() {
    let cases: [(&str, usize); 3] = [
        ("transfer(address,uint256)", 1),
        ("decimals()", 1),
        ("balanceOf(address)", 0),
    ];
    for (signature, supplied) in cases {
        let args = vec![AbiValue::Bool(false); supplied];
        match encode_call(signature, &args) {
            Err(Error::BuildFailure(_)) => {}
            other => panic!("Expected BuildFailure for {:?}, got {:?}", signature, other),
        }
    }
}

#[test]
fn test_non_canonical_signatures_rejected() {
    for bad in [
        "transfer",
        "transfer(address",
        "transfer address,uint256)",
        "transfer(address, uint256)",
    ] {
        match encode_call(bad, &[]) {
            Err(Error::BuildFailure(_)) => {}
            other => panic!("Expected BuildFailure for {:?}, got {:?}", bad, other),
        }
    }
}
