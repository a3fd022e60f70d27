//! Client for the MPC signing coordinator contract.
//!
//! The coordinator is a contract on the source chain. A sign call carries the
//! 32-byte payload and a derivation path; the MPC network answers with raw
//! signature material that [`crate::signer`] reconstructs and validates.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::error::{Error, Result};
use crate::session::{SessionStore, SigningSession};
use crate::types::SignatureResponse;

/// Contract method that requests an MPC signature.
pub const SIGN_METHOD: &str = "sign";

/// Gas attached to a sign call: 250 Tgas.
pub const DEFAULT_SIGN_GAS: u64 = 250_000_000_000_000;

/// Deposit attached to a sign call: 0.25 NEAR in yocto units.
pub const DEFAULT_SIGN_DEPOSIT_YOCTO: u128 = 250_000_000_000_000_000_000_000;

/// Key version of the current secp256k1 root key.
pub const DEFAULT_KEY_VERSION: u32 = 0;

pub const MAINNET_CONTRACT_ID: &str = "v1.signer";
pub const TESTNET_CONTRACT_ID: &str = "v1.signer-prod.testnet";

/// Published root public keys of the coordinator deployments.
pub const MAINNET_ROOT_PUBLIC_KEY: &str =
    "secp256k1:3tFRbMqmoa6AAALMrEFAYCEoHcqKxeW38YptwowBVBtXK1vo36HDbUWuR6EZmoK4JcH6HDkNMGGqP1ouV7VZUWya";
pub const TESTNET_ROOT_PUBLIC_KEY: &str =
    "secp256k1:4NfTiv3UsGahebgTaHyD9vF8KYKMBnfd6kh94mK6xv8fGBiJB8TBtFMP5WWXz6B89Ac1fbpzPwAvoyQebemHFwx3";

// ============ Wallet Connection ============

/// Connection to the user's wallet on the source chain.
///
/// The pipeline never holds source-chain keys; every contract call goes
/// through the wallet, which authenticates as the user's account.
#[async_trait]
pub trait WalletConnector: Send + Sync {
    /// Call a change method and return its decoded result value.
    async fn call_method(
        &self,
        contract_id: &str,
        method: &str,
        args: serde_json::Value,
        gas: u64,
        deposit_yocto: u128,
    ) -> Result<serde_json::Value>;
}

// ============ Configuration ============

/// Settings for one coordinator deployment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    pub contract_id: String,
    /// Root public key in the coordinator's text format.
    pub root_public_key: String,
    pub gas: u64,
    pub deposit_yocto: u128,
    pub key_version: u32,
}

impl CoordinatorConfig {
    pub fn mainnet() -> Self {
        Self::custom(MAINNET_CONTRACT_ID, MAINNET_ROOT_PUBLIC_KEY)
    }

    pub fn testnet() -> Self {
        Self::custom(TESTNET_CONTRACT_ID, TESTNET_ROOT_PUBLIC_KEY)
    }

    pub fn custom(contract_id: &str, root_public_key: &str) -> Self {
        Self {
            contract_id: contract_id.to_string(),
            root_public_key: root_public_key.to_string(),
            gas: DEFAULT_SIGN_GAS,
            deposit_yocto: DEFAULT_SIGN_DEPOSIT_YOCTO,
            key_version: DEFAULT_KEY_VERSION,
        }
    }

    pub fn with_gas(mut self, gas: u64) -> Self {
        self.gas = gas;
        self
    }

    pub fn with_deposit(mut self, deposit_yocto: u128) -> Self {
        self.deposit_yocto = deposit_yocto;
        self
    }
}

// ============ Sign Calls ============

/// Argument block of the contract's sign method.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignRequest {
    /// The 32-byte digest to sign, as a plain byte array.
    pub payload: [u8; 32],
    pub path: String,
    pub key_version: u32,
}

/// What happens to the checkpoint when the coordinator rejects a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetryPolicy {
    /// Drop the checkpoint; the caller rebuilds the transaction from scratch.
    #[default]
    ClearCheckpoint,
    /// Keep the checkpoint so the identical request can be re-dispatched.
    KeepCheckpoint,
}

/// Dispatches signature requests to a coordinator deployment.
pub struct CoordinatorClient {
    config: CoordinatorConfig,
}

impl CoordinatorClient {
    pub fn new(config: CoordinatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// Checkpoint the session, then ask the MPC network to sign the payload.
    ///
    /// The checkpoint is written before dispatch so the flow can be resumed
    /// if the wallet round trip interrupts the process. A returned response
    /// is raw material; it has passed no validation yet.
    #[instrument(skip(self, wallet, store, session, payload))]
    pub async fn request_signature(
        &self,
        wallet: &dyn WalletConnector,
        store: &dyn SessionStore,
        session: &SigningSession,
        payload: [u8; 32],
        retry: RetryPolicy,
    ) -> Result<SignatureResponse> {
        store.checkpoint(session).await?;

        let request = SignRequest {
            payload,
            path: session.path.as_str().to_string(),
            key_version: self.config.key_version,
        };
        let args = serde_json::json!({ "request": request });

        info!(
            contract_id = %self.config.contract_id,
            path = %session.path,
            "Dispatching signature request"
        );

        let value = match wallet
            .call_method(
                &self.config.contract_id,
                SIGN_METHOD,
                args,
                self.config.gas,
                self.config.deposit_yocto,
            )
            .await
        {
            Ok(value) => value,
            Err(e) => {
                let rejection = match e {
                    Error::SigningRejected(_) => e,
                    other => Error::SigningRejected(other.to_string()),
                };
                if retry == RetryPolicy::ClearCheckpoint {
                    if let Err(clear_err) = store.clear().await {
                        warn!(error = %clear_err, "Failed to clear checkpoint after rejection");
                    }
                }
                warn!(error = %rejection, "Coordinator rejected signature request");
                return Err(rejection);
            }
        };

        // The call succeeded on-chain, so the checkpoint stays even if the
        // response body is unreadable.
        serde_json::from_value(value)
            .map_err(|e| Error::Deserialization(format!("malformed coordinator response: {}", e)))
    }
}
