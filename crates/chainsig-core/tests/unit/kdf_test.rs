//! Unit tests for key derivation
//!
//! These tests verify the additive derivation scheme against fixed fixtures:
//! the same (owner, path) pair must always land on the same EVM address, and
//! the golden values pin the exact epsilon and address for a known root key.

use chainsig_core::{
    derive_address, derive_child_public_key, derive_epsilon, ChildPublicKey, DerivationPath, Error,
    RootPublicKey,
};
use k256::{ProjectivePoint, Scalar};

/// Root key fixture: the public point of the scalar 7.
const ROOT_KEY_TEXT: &str =
    "secp256k1:2rYZMPLvdVcuUX6y2EFB3m5F8eC25sssVG3G9dJc2QzZDd4oi3hgXXT2G1Ay9FwDL1mHm4ZcbixChmQNGC5knKkV";

const OWNER: &str = "alice.example";

fn root_key() -> RootPublicKey {
    ROOT_KEY_TEXT.parse().unwrap()
}

fn path(s: &str) -> DerivationPath {
    DerivationPath::new(s).unwrap()
}

// ============================================================================
// Golden Fixtures
// ============================================================================

#[test]
fn test_root_key_fixture_matches_scalar_seven() {
    let expected = (ProjectivePoint::GENERATOR * Scalar::from(7u64)).to_affine();
    assert_eq!(root_key().as_point(), &expected);
    assert_eq!(root_key().to_string(), ROOT_KEY_TEXT);
}

#[test]
fn test_golden_epsilon() {
    let epsilon = derive_epsilon(OWNER, &path("evm-1")).unwrap();
    assert_eq!(
        hex::encode(epsilon.to_bytes()),
        "c5dc98ac76276e128129606ec4922b6b1df0b60533c8d8da4946d80b003799c6"
    );
}

#[test]
fn test_golden_address() {
    let derived = derive_address(&root_key(), OWNER, &path("evm-1")).unwrap();
    assert_eq!(
        format!("{:#x}", derived.address),
        "0x57d1f309c9e4231800ae6bf1737b1b8fab526a63"
    );
}

#[test]
fn test_address_matches_child_key_hash() {
    let derived = derive_address(&root_key(), OWNER, &path("evm-1")).unwrap();
    assert_eq!(derived.address, derived.public_key.evm_address());
}

// ============================================================================
// Determinism
// ============================================================================

#[test]
fn test_derivation_is_deterministic() {
    let root = root_key();
    let a = derive_address(&root, OWNER, &path("evm-1")).unwrap();
    let b = derive_address(&root, OWNER, &path("evm-1")).unwrap();
    assert_eq!(a.address, b.address);
    assert_eq!(a.public_key, b.public_key);
}

#[test]
fn test_owner_and_path_both_separate_keys() {
    let root = root_key();
    let base = derive_address(&root, OWNER, &path("evm-1")).unwrap();
    let other_path = derive_address(&root, OWNER, &path("evm-2")).unwrap();
    let other_owner = derive_address(&root, "bob.example", &path("evm-1")).unwrap();

    assert_ne!(base.address, other_path.address);
    assert_ne!(base.address, other_owner.address);
    assert_ne!(other_path.address, other_owner.address);
}

#[test]
fn test_owner_path_split_is_unambiguous() {
    // The comma in the epsilon preimage separates owner from path, so an
    // owner ending where another path begins must not collide.
    let root = root_key();
    let a = derive_child_public_key(&root, "alice.example", &path("x,evm-1")).unwrap();
    let b = derive_child_public_key(&root, "alice.example,x", &path("evm-1")).unwrap();
    assert_ne!(a, b);
}

// ============================================================================
// Input Validation
// ============================================================================

#[test]
fn test_empty_owner_rejected() {
    match derive_epsilon("", &path("evm-1")) {
        Err(Error::DerivationFailure(_)) => {}
        other => panic!("Expected DerivationFailure, got {:?}", other),
    }
}

#[test]
fn test_empty_path_rejected() {
    match DerivationPath::new("") {
        Err(Error::DerivationFailure(_)) => {}
        other => panic!("Expected DerivationFailure, got {:?}", other),
    }
}

#[test]
fn test_malformed_root_keys_rejected() {
    let cases = [
        "",
        "secp256k1:",
        "ed25519:2rYZMPLvdVcuUX6y2EFB3m5F8eC25sssVG3G9dJc2QzZ",
        "secp256k1:0OIl",
        "secp256k1:2xyz",
    ];
    for case in cases {
        match case.parse::<RootPublicKey>() {
            Err(Error::DerivationFailure(_)) => {}
            other => panic!("Expected DerivationFailure for {:?}, got {:?}", case, other),
        }
    }
}

#[test]
fn test_off_curve_root_key_rejected() {
    // Valid base58, 64 bytes, but (1, 1) is not on secp256k1.
    let mut coords = [0u8; 64];
    coords[31] = 1;
    coords[63] = 1;
    let text = format!("secp256k1:{}", bs58::encode(coords).into_string());
    match text.parse::<RootPublicKey>() {
        Err(Error::DerivationFailure(_)) => {}
        other => panic!("Expected DerivationFailure, got {:?}", other),
    }
}

#[test]
fn test_child_key_text_round_trips_through_root_parser() {
    let child = derive_child_public_key(&root_key(), OWNER, &path("evm-1")).unwrap();
    let text = child.to_base58_string();
    let reparsed: RootPublicKey = text.parse().unwrap();
    assert_eq!(
        ChildPublicKey::new(*reparsed.as_point()).unwrap().evm_address(),
        child.evm_address()
    );
}
