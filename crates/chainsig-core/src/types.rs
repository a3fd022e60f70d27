//! Core types shared across the signing pipeline

use std::fmt;

use alloy_primitives::Address;
use k256::{
    ecdsa::{RecoveryId, Signature as EcdsaSignature},
    elliptic_curve::{point::AffineCoordinates, sec1::ToEncodedPoint},
    AffinePoint,
};
use serde::{Deserialize, Serialize};
use tiny_keccak::{Hasher, Keccak, Sha3};

use crate::error::{Error, Result};

// ============ Derivation Path ============

/// A validated key-derivation path.
///
/// Paths are arbitrary non-empty strings chosen by the caller. The same
/// (owner, path) pair always derives the same child key, so a path acts
/// as a stable sub-account identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DerivationPath(String);

impl DerivationPath {
    pub fn new(path: impl Into<String>) -> Result<Self> {
        let path = path.into();
        if path.is_empty() {
            return Err(Error::DerivationFailure(
                "derivation path must not be empty".into(),
            ));
        }
        Ok(Self(path))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for DerivationPath {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Self::new(s)
    }
}

impl From<DerivationPath> for String {
    fn from(path: DerivationPath) -> String {
        path.0
    }
}

impl AsRef<str> for DerivationPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DerivationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============ Child Public Key ============

/// A derived secp256k1 public key, guaranteed to be a valid curve point.
///
/// The point-at-infinity is rejected at construction, so every value of
/// this type has a well-defined 65-byte uncompressed encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChildPublicKey(AffinePoint);

impl ChildPublicKey {
    pub fn new(point: AffinePoint) -> Result<Self> {
        if point == AffinePoint::IDENTITY {
            return Err(Error::DerivationFailure(
                "derived key is the point at infinity".into(),
            ));
        }
        Ok(Self(point))
    }

    pub fn as_point(&self) -> &AffinePoint {
        &self.0
    }

    /// SEC1 uncompressed encoding: `0x04 || x || y`.
    pub fn uncompressed(&self) -> [u8; 65] {
        let encoded = self.0.to_encoded_point(false);
        let mut out = [0u8; 65];
        out.copy_from_slice(encoded.as_bytes());
        out
    }

    /// The key in the coordinator's text format: `secp256k1:` followed by
    /// the base58 encoding of the 64-byte `x || y` coordinates.
    pub fn to_base58_string(&self) -> String {
        let uncompressed = self.uncompressed();
        format!("secp256k1:{}", bs58::encode(&uncompressed[1..]).into_string())
    }

    /// The EVM address controlled by this key: the low 20 bytes of the
    /// Keccak-256 hash of the uncompressed coordinates.
    pub fn evm_address(&self) -> Address {
        let uncompressed = self.uncompressed();
        let hash = keccak256_hash(&uncompressed[1..]);
        Address::from_slice(&hash[12..])
    }

    pub fn x_coordinate(&self) -> [u8; 32] {
        let mut out = [0u8; 32];
        out.copy_from_slice(self.0.x().as_slice());
        out
    }
}

// ============ MPC Signature ============

/// Wire shape of the compressed point `R` inside a coordinator response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerializableAffinePoint {
    /// Hex-encoded SEC1 compressed point (66 chars, `02`/`03` prefix).
    pub affine_point: String,
}

/// Wire shape of the scalar `s` inside a coordinator response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerializableScalar {
    /// Hex-encoded 32-byte scalar (64 chars).
    pub scalar: String,
}

/// Raw signature material returned by the MPC coordinator contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignatureResponse {
    pub big_r: SerializableAffinePoint,
    pub s: SerializableScalar,
    pub recovery_id: u8,
}

/// A structurally validated ECDSA signature from the MPC network.
///
/// Construction enforces that `r` and `s` are non-zero scalars below the
/// curve order, that `s` is in the low half of the order (EIP-2), and
/// that the recovery id is a valid y-parity bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MpcSignature {
    pub r: [u8; 32],
    pub s: [u8; 32],
    pub recovery_id: u8,
}

impl MpcSignature {
    pub fn new(r: [u8; 32], s: [u8; 32], recovery_id: u8) -> Result<Self> {
        if recovery_id > 1 {
            return Err(Error::SignatureInvalid(format!(
                "recovery id {} out of range, expected 0 or 1",
                recovery_id
            )));
        }
        let sig = EcdsaSignature::from_scalars(r, s)
            .map_err(|_| Error::SignatureInvalid("r or s is zero or exceeds the curve order".into()))?;
        if sig.normalize_s().is_some() {
            return Err(Error::SignatureInvalid(
                "s is in the high half of the curve order".into(),
            ));
        }
        Ok(Self { r, s, recovery_id })
    }

    /// Parse and validate a coordinator response.
    ///
    /// Structural checks (recovery id range, point prefix, hex lengths)
    /// run before any scalar arithmetic.
    pub fn from_response(response: &SignatureResponse) -> Result<Self> {
        if response.recovery_id > 1 {
            return Err(Error::SignatureInvalid(format!(
                "recovery id {} out of range, expected 0 or 1",
                response.recovery_id
            )));
        }

        let point_hex = &response.big_r.affine_point;
        if point_hex.len() != 66 {
            return Err(Error::SignatureInvalid(format!(
                "big_r must be 66 hex chars, got {}",
                point_hex.len()
            )));
        }
        if !point_hex.starts_with("02") && !point_hex.starts_with("03") {
            return Err(Error::SignatureInvalid(
                "big_r is not a SEC1 compressed point".into(),
            ));
        }

        let scalar_hex = &response.s.scalar;
        if scalar_hex.len() != 64 {
            return Err(Error::SignatureInvalid(format!(
                "s must be 64 hex chars, got {}",
                scalar_hex.len()
            )));
        }

        // The x-coordinate of R is the signature's r scalar.
        let r_bytes = hex::decode(&point_hex[2..])
            .map_err(|e| Error::SignatureInvalid(format!("big_r is not valid hex: {}", e)))?;
        let s_bytes = hex::decode(scalar_hex)
            .map_err(|e| Error::SignatureInvalid(format!("s is not valid hex: {}", e)))?;

        let mut r = [0u8; 32];
        r.copy_from_slice(&r_bytes);
        let mut s = [0u8; 32];
        s.copy_from_slice(&s_bytes);

        Self::new(r, s, response.recovery_id)
    }

    pub fn to_ecdsa(&self) -> Result<(EcdsaSignature, RecoveryId)> {
        let sig = EcdsaSignature::from_scalars(self.r, self.s)
            .map_err(|_| Error::SignatureInvalid("r or s is zero or exceeds the curve order".into()))?;
        let recovery_id = RecoveryId::from_byte(self.recovery_id)
            .ok_or_else(|| Error::SignatureInvalid("recovery id out of range".into()))?;
        Ok((sig, recovery_id))
    }

    /// The EIP-1559 y-parity bit.
    pub fn y_parity(&self) -> u8 {
        self.recovery_id
    }
}

// ============ Hashing ============

/// Compute the Keccak-256 hash of the input
pub fn keccak256_hash(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    let mut output = [0u8; 32];
    hasher.update(data);
    hasher.finalize(&mut output);
    output
}

/// Compute the SHA3-256 hash of the input
pub fn sha3_256_hash(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha3::v256();
    let mut output = [0u8; 32];
    hasher.update(data);
    hasher.finalize(&mut output);
    output
}
