//! Additive key derivation for coordinator-held root keys.
//!
//! The MPC network holds a single root key pair. Every (owner, path) pair
//! maps to a deterministic scalar offset `epsilon`; the child public key is
//! `root + epsilon * G`, so anyone can derive addresses from the published
//! root key while only the network can sign for them.

use std::fmt;
use std::str::FromStr;

use alloy_primitives::Address;
use k256::{
    elliptic_curve::{ops::Reduce, sec1::FromEncodedPoint},
    AffinePoint, EncodedPoint, ProjectivePoint, Scalar, U256,
};

use crate::error::{Error, Result};
use crate::types::{sha3_256_hash, ChildPublicKey, DerivationPath};

/// Domain separator prepended to every epsilon derivation input.
pub const EPSILON_DERIVATION_PREFIX: &str = "near-mpc-recovery v0.1.0 epsilon derivation:";

/// Text prefix of root keys as published by the coordinator contract.
pub const ROOT_KEY_PREFIX: &str = "secp256k1:";

// ============ Root Public Key ============

/// The coordinator network's root public key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RootPublicKey(AffinePoint);

impl RootPublicKey {
    pub fn from_point(point: AffinePoint) -> Result<Self> {
        if point == AffinePoint::IDENTITY {
            return Err(Error::DerivationFailure(
                "root key is the point at infinity".into(),
            ));
        }
        Ok(Self(point))
    }

    pub fn as_point(&self) -> &AffinePoint {
        &self.0
    }
}

impl FromStr for RootPublicKey {
    type Err = Error;

    /// Parse the coordinator's text format: `secp256k1:` followed by the
    /// base58 encoding of the 64-byte `x || y` coordinates.
    fn from_str(s: &str) -> Result<Self> {
        let encoded = s.strip_prefix(ROOT_KEY_PREFIX).ok_or_else(|| {
            Error::DerivationFailure(format!("root key must start with '{}'", ROOT_KEY_PREFIX))
        })?;
        let coordinates = bs58::decode(encoded)
            .into_vec()
            .map_err(|e| Error::DerivationFailure(format!("root key is not valid base58: {}", e)))?;
        if coordinates.len() != 64 {
            return Err(Error::DerivationFailure(format!(
                "root key must decode to 64 bytes, got {}",
                coordinates.len()
            )));
        }

        let mut sec1 = [0u8; 65];
        sec1[0] = 0x04;
        sec1[1..].copy_from_slice(&coordinates);
        let encoded_point = EncodedPoint::from_bytes(sec1)
            .map_err(|e| Error::DerivationFailure(format!("root key is malformed: {}", e)))?;
        let point = Option::<AffinePoint>::from(AffinePoint::from_encoded_point(&encoded_point))
            .ok_or_else(|| {
                Error::DerivationFailure("root key is not on the secp256k1 curve".into())
            })?;
        Self::from_point(point)
    }
}

impl fmt::Display for RootPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key = ChildPublicKey::new(self.0).map_err(|_| fmt::Error)?;
        write!(f, "{}", key.to_base58_string())
    }
}

// ============ Derivation ============

/// Compute the scalar offset for an (owner, path) pair.
pub fn derive_epsilon(owner_id: &str, path: &DerivationPath) -> Result<Scalar> {
    if owner_id.is_empty() {
        return Err(Error::DerivationFailure(
            "owner account id must not be empty".into(),
        ));
    }
    let input = format!("{}{},{}", EPSILON_DERIVATION_PREFIX, owner_id, path);
    let hash = sha3_256_hash(input.as_bytes());
    Ok(<Scalar as Reduce<U256>>::reduce_bytes(&hash.into()))
}

/// Derive the child public key `root + epsilon * G` for an (owner, path) pair.
pub fn derive_child_public_key(
    root: &RootPublicKey,
    owner_id: &str,
    path: &DerivationPath,
) -> Result<ChildPublicKey> {
    let epsilon = derive_epsilon(owner_id, path)?;
    let child = ProjectivePoint::from(*root.as_point()) + ProjectivePoint::GENERATOR * epsilon;
    ChildPublicKey::new(child.to_affine())
}

/// A derived child key together with the EVM address it controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DerivedAddress {
    pub public_key: ChildPublicKey,
    pub address: Address,
}

/// Derive the EVM account an (owner, path) pair controls through the
/// coordinator network.
pub fn derive_address(
    root: &RootPublicKey,
    owner_id: &str,
    path: &DerivationPath,
) -> Result<DerivedAddress> {
    let public_key = derive_child_public_key(root, owner_id, path)?;
    let address = public_key.evm_address();
    Ok(DerivedAddress {
        public_key,
        address,
    })
}
