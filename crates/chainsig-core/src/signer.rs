//! End-to-end signing pipeline.
//!
//! [`ChainSigner`] ties the pieces together: derive the sender account from
//! the coordinator's root key, build an EIP-1559 transaction, request the
//! MPC signature, validate and reassemble the result, and broadcast it.
//!
//! Signing is split into two phases around the coordinator round trip.
//! `begin_signing` checkpoints the session and dispatches the request;
//! `complete_signing` picks the checkpoint back up, validates the response
//! against it, and consumes it. The split allows the response to arrive in
//! a different process than the request, which is the normal case when the
//! wallet interaction goes through a redirect.

use std::sync::Arc;

use alloy_primitives::{Address, U256};
use k256::ecdsa::VerifyingKey;
use tracing::{info, instrument};

use crate::chain::evm::{Eip1559Transaction, EvmClient, SignedTransaction};
use crate::chain::{ChainId, TxHash};
use crate::coordinator::{CoordinatorClient, RetryPolicy, WalletConnector};
use crate::error::{Error, Result};
use crate::kdf::{self, DerivedAddress, RootPublicKey};
use crate::session::{SessionStore, SigningSession};
use crate::types::{keccak256_hash, DerivationPath, MpcSignature, SignatureResponse};

/// An unsigned transaction together with the digest the MPC network signs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltTransaction {
    pub transaction: Eip1559Transaction,
    pub payload: [u8; 32],
}

/// The full signing pipeline for one coordinator deployment and one target
/// chain.
pub struct ChainSigner {
    evm: EvmClient,
    coordinator: CoordinatorClient,
    store: Arc<dyn SessionStore>,
    root_key: RootPublicKey,
}

impl ChainSigner {
    /// The coordinator's root key is parsed eagerly so a bad key fails here
    /// rather than mid-flow.
    pub fn new(
        evm: EvmClient,
        coordinator: CoordinatorClient,
        store: Arc<dyn SessionStore>,
    ) -> Result<Self> {
        let root_key: RootPublicKey = coordinator.config().root_public_key.parse()?;
        Ok(Self {
            evm,
            coordinator,
            store,
            root_key,
        })
    }

    pub fn evm(&self) -> &EvmClient {
        &self.evm
    }

    pub fn root_key(&self) -> &RootPublicKey {
        &self.root_key
    }

    /// The EVM account an (owner, path) pair controls.
    pub fn derive_address(&self, owner_id: &str, path: &DerivationPath) -> Result<DerivedAddress> {
        kdf::derive_address(&self.root_key, owner_id, path)
    }

    /// Assemble an unsigned transaction and its signature payload.
    #[instrument(skip(self, data))]
    pub async fn build_transaction(
        &self,
        sender: Address,
        to: Address,
        value: U256,
        data: Vec<u8>,
    ) -> Result<BuiltTransaction> {
        self.build_transaction_with_limit(sender, to, value, data, None)
            .await
    }

    pub async fn build_transaction_with_limit(
        &self,
        sender: Address,
        to: Address,
        value: U256,
        data: Vec<u8>,
        gas_limit: Option<u64>,
    ) -> Result<BuiltTransaction> {
        let transaction = self
            .evm
            .build_transaction(sender, to, value, data, gas_limit)
            .await?;
        let payload = transaction.signing_hash();
        info!(
            nonce = transaction.nonce,
            chain_id = transaction.chain_id,
            "Built unsigned transaction"
        );
        Ok(BuiltTransaction {
            transaction,
            payload,
        })
    }

    /// Phase one: checkpoint the session, then dispatch the signature
    /// request to the coordinator.
    ///
    /// The payload is recomputed from the transaction bytes, so the
    /// checkpoint and the dispatched request can never disagree.
    #[instrument(skip(self, wallet, built))]
    pub async fn begin_signing(
        &self,
        wallet: &dyn WalletConnector,
        path: &DerivationPath,
        built: &BuiltTransaction,
        retry: RetryPolicy,
    ) -> Result<SignatureResponse> {
        let session = SigningSession::new(path.clone(), built.transaction.serialize_unsigned());
        let payload = built.transaction.signing_hash();
        self.coordinator
            .request_signature(wallet, self.store.as_ref(), &session, payload, retry)
            .await
    }

    /// Phase two: resume the pending checkpoint, validate the response
    /// against it, and consume it.
    ///
    /// The checkpoint is cleared whether or not validation succeeds, so a
    /// bad response cannot be retried against a stale session.
    #[instrument(skip(self, response))]
    pub async fn complete_signing(
        &self,
        owner_id: &str,
        response: &SignatureResponse,
    ) -> Result<SignedTransaction> {
        let session = self.store.resume().await?.ok_or(Error::NoPendingSession)?;

        let outcome = self.reconstruct_for_session(owner_id, &session, response);
        let cleared = self.store.clear().await;
        let signed = outcome?;
        cleared?;

        info!(hash = %signed.hash_hex(), "Reconstructed signed transaction");
        Ok(signed)
    }

    fn reconstruct_for_session(
        &self,
        owner_id: &str,
        session: &SigningSession,
        response: &SignatureResponse,
    ) -> Result<SignedTransaction> {
        let transaction = Eip1559Transaction::decode_unsigned(&session.transaction)?;
        let expected = self.derive_address(owner_id, &session.path)?.address;
        reconstruct_signature(&transaction, response, expected)
    }

    /// The pending session checkpoint, if any.
    pub async fn pending_session(&self) -> Result<Option<SigningSession>> {
        self.store.resume().await
    }

    /// Broadcast a reconstructed transaction to the target chain.
    #[instrument(skip(self, signed))]
    pub async fn relay(&self, signed: &SignedTransaction) -> Result<TxHash> {
        let tx_hash = self.evm.broadcast(signed).await?;
        info!(hash = %tx_hash.hash, "Relayed transaction");
        Ok(tx_hash)
    }
}

/// Validate raw signature material against a transaction and the signer it
/// must recover to, producing broadcast-ready bytes.
///
/// Checks run cheapest first: structural shape of the response, then scalar
/// range and low-s form, then key recovery against the expected signer.
pub fn reconstruct_signature(
    transaction: &Eip1559Transaction,
    response: &SignatureResponse,
    expected_signer: Address,
) -> Result<SignedTransaction> {
    let signature = MpcSignature::from_response(response)?;
    let (ecdsa_sig, recovery_id) = signature.to_ecdsa()?;

    let payload = transaction.signing_hash();
    let verifying_key = VerifyingKey::recover_from_prehash(&payload, &ecdsa_sig, recovery_id)
        .map_err(|e| Error::SignatureInvalid(format!("key recovery failed: {}", e)))?;

    let recovered = verifying_key_address(&verifying_key);
    if recovered != expected_signer {
        return Err(Error::SignatureInvalid(format!(
            "recovered signer {} does not match expected {}",
            recovered, expected_signer
        )));
    }

    let raw = transaction.encode_signed(&signature);
    Ok(SignedTransaction::new(ChainId(transaction.chain_id), raw))
}

fn verifying_key_address(key: &VerifyingKey) -> Address {
    let encoded = key.to_encoded_point(false);
    let hash = keccak256_hash(&encoded.as_bytes()[1..]);
    Address::from_slice(&hash[12..])
}
