//! # chainsig-core
//!
//! Sign transactions for foreign chains with a key held by an MPC network
//! and controlled by a source-chain account.
//!
//! The coordinator network publishes a single root public key. Every
//! (owner account, derivation path) pair maps deterministically to a child
//! key and the EVM address it controls; only the network can produce
//! signatures for it, and only when the owning account asks. This crate
//! covers the full client-side flow: derive the address, build an EIP-1559
//! transaction, request the signature, validate and reassemble the result,
//! and broadcast it to the target chain.
//!
//! ## Architecture
//!
//! - [`kdf`] — additive key derivation from the published root key
//! - [`chain`] — EVM transactions, the JSON-RPC transport, broadcast
//! - [`abi`] — call-data encoding for contract transactions
//! - [`session`] — durable checkpoints for in-flight signing sessions
//! - [`coordinator`] — the coordinator contract client and wallet connection
//! - [`signer`] — the end-to-end pipeline
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use chainsig_core::{
//!     ChainSigner, CoordinatorClient, CoordinatorConfig, DerivationPath,
//!     EvmClient, EvmConfig, FileSessionStore, RetryPolicy,
//! };
//!
//! let signer = ChainSigner::new(
//!     EvmClient::new(EvmConfig::ethereum_sepolia())?,
//!     CoordinatorClient::new(CoordinatorConfig::testnet()),
//!     Arc::new(FileSessionStore::new("/var/lib/chainsig", "alice.example")),
//! )?;
//!
//! let path = DerivationPath::new("evm-1")?;
//! let sender = signer.derive_address("alice.example", &path)?;
//!
//! let built = signer
//!     .build_transaction(sender.address, recipient, amount, vec![])
//!     .await?;
//! let response = signer
//!     .begin_signing(&wallet, &path, &built, RetryPolicy::default())
//!     .await?;
//! let signed = signer.complete_signing("alice.example", &response).await?;
//! let receipt = signer.relay(&signed).await?;
//! ```

pub mod abi;
pub mod chain;
pub mod coordinator;
pub mod error;
pub mod kdf;
pub mod session;
pub mod signer;
pub mod types;

pub use abi::{encode_call, AbiValue};
pub use chain::evm::{
    Eip1559Transaction, EvmClient, EvmConfig, SignedTransaction, DEFAULT_GAS_LIMIT,
};
pub use chain::{Balance, ChainId, GasPrice, RpcClient, TxHash};
pub use coordinator::{
    CoordinatorClient, CoordinatorConfig, RetryPolicy, SignRequest, WalletConnector,
};
pub use error::{Error, Result};
pub use kdf::{
    derive_address, derive_child_public_key, derive_epsilon, DerivedAddress, RootPublicKey,
};
pub use session::{FileSessionStore, MemorySessionStore, SessionStore, SigningSession};
pub use signer::{reconstruct_signature, BuiltTransaction, ChainSigner};
pub use types::{ChildPublicKey, DerivationPath, MpcSignature, SignatureResponse};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
