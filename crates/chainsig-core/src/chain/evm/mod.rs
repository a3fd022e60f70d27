//! EVM target-chain support: EIP-1559 transactions and the RPC operations
//! the signing pipeline needs (nonce, fees, balance, view calls, broadcast).

use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_rlp::{Decodable, Encodable, RlpDecodable, RlpEncodable};
use serde::{Deserialize, Serialize};

use crate::chain::{Balance, ChainId, GasPrice, RpcClient, TxHash};
use crate::error::{Error, Result};
use crate::types::{keccak256_hash, MpcSignature};

/// EIP-2718 type byte for EIP-1559 transactions.
pub const EIP1559_TX_TYPE: u8 = 0x02;

/// Gas limit applied when the caller does not supply one. Covers a plain
/// transfer plus a simple token call.
pub const DEFAULT_GAS_LIMIT: u64 = 50_000;

// ============ Chain Configuration ============

/// Connection settings for an EVM chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvmConfig {
    pub chain_id: ChainId,
    pub rpc_urls: Vec<String>,
    pub explorer_url: Option<String>,
    pub native_symbol: String,
}

impl EvmConfig {
    pub fn ethereum_mainnet() -> Self {
        Self {
            chain_id: ChainId::ETHEREUM_MAINNET,
            rpc_urls: vec![
                "https://eth.llamarpc.com".to_string(),
                "https://rpc.ankr.com/eth".to_string(),
                "https://cloudflare-eth.com".to_string(),
            ],
            explorer_url: Some("https://etherscan.io".to_string()),
            native_symbol: "ETH".to_string(),
        }
    }

    pub fn ethereum_sepolia() -> Self {
        Self {
            chain_id: ChainId::ETHEREUM_SEPOLIA,
            rpc_urls: vec![
                "https://rpc.sepolia.org".to_string(),
                "https://rpc.ankr.com/eth_sepolia".to_string(),
            ],
            explorer_url: Some("https://sepolia.etherscan.io".to_string()),
            native_symbol: "ETH".to_string(),
        }
    }

    pub fn aurora_mainnet() -> Self {
        Self {
            chain_id: ChainId::AURORA_MAINNET,
            rpc_urls: vec!["https://mainnet.aurora.dev".to_string()],
            explorer_url: Some("https://explorer.aurora.dev".to_string()),
            native_symbol: "ETH".to_string(),
        }
    }

    pub fn custom(chain_id: u64, rpc_urls: Vec<String>, native_symbol: &str) -> Self {
        Self {
            chain_id: ChainId(chain_id),
            rpc_urls,
            explorer_url: None,
            native_symbol: native_symbol.to_string(),
        }
    }

    pub fn with_explorer(mut self, url: &str) -> Self {
        self.explorer_url = Some(url.to_string());
        self
    }
}

// ============ Transactions ============

/// An unsigned EIP-1559 transaction.
///
/// Field order matches the RLP schema, so the derived encoding is the
/// canonical one.
#[derive(Debug, Clone, PartialEq, Eq, RlpEncodable, RlpDecodable)]
pub struct Eip1559Transaction {
    pub chain_id: u64,
    pub nonce: u64,
    pub max_priority_fee_per_gas: u128,
    pub max_fee_per_gas: u128,
    pub gas_limit: u64,
    pub to: Address,
    pub value: U256,
    pub data: Bytes,
    pub access_list: Vec<AccessListItem>,
}

/// EIP-2930 access list entry.
#[derive(Debug, Clone, PartialEq, Eq, RlpEncodable, RlpDecodable)]
pub struct AccessListItem {
    pub address: Address,
    pub storage_keys: Vec<B256>,
}

impl Eip1559Transaction {
    /// Type-prefixed RLP of the unsigned transaction. This is the exact
    /// preimage of the signature payload and the format checkpointed by
    /// the session store.
    pub fn serialize_unsigned(&self) -> Vec<u8> {
        let mut encoded = vec![EIP1559_TX_TYPE];
        self.encode(&mut encoded);
        encoded
    }

    /// The 32-byte digest the MPC network signs.
    pub fn signing_hash(&self) -> [u8; 32] {
        keccak256_hash(&self.serialize_unsigned())
    }

    /// Parse bytes produced by [`serialize_unsigned`](Self::serialize_unsigned).
    pub fn decode_unsigned(bytes: &[u8]) -> Result<Self> {
        match bytes.split_first() {
            Some((&EIP1559_TX_TYPE, payload)) => {
                let mut buf = payload;
                let tx = Self::decode(&mut buf)
                    .map_err(|e| Error::Deserialization(format!("invalid transaction RLP: {}", e)))?;
                if !buf.is_empty() {
                    return Err(Error::Deserialization(
                        "trailing bytes after transaction RLP".into(),
                    ));
                }
                Ok(tx)
            }
            Some((other, _)) => Err(Error::Deserialization(format!(
                "unsupported transaction type byte 0x{:02x}",
                other
            ))),
            None => Err(Error::Deserialization("empty transaction bytes".into())),
        }
    }

    /// Append the signature and produce broadcast-ready bytes.
    pub fn encode_signed(&self, signature: &MpcSignature) -> Vec<u8> {
        let y_parity = signature.y_parity();
        let r = U256::from_be_slice(&signature.r);
        let s = U256::from_be_slice(&signature.s);

        let payload_length =
            self.rlp_payload_length() + y_parity.length() + r.length() + s.length();

        let mut out = Vec::with_capacity(payload_length + 8);
        out.push(EIP1559_TX_TYPE);
        alloy_rlp::Header {
            list: true,
            payload_length,
        }
        .encode(&mut out);
        self.chain_id.encode(&mut out);
        self.nonce.encode(&mut out);
        self.max_priority_fee_per_gas.encode(&mut out);
        self.max_fee_per_gas.encode(&mut out);
        self.gas_limit.encode(&mut out);
        self.to.encode(&mut out);
        self.value.encode(&mut out);
        self.data.encode(&mut out);
        self.access_list.encode(&mut out);
        y_parity.encode(&mut out);
        r.encode(&mut out);
        s.encode(&mut out);
        out
    }

    fn rlp_payload_length(&self) -> usize {
        self.chain_id.length()
            + self.nonce.length()
            + self.max_priority_fee_per_gas.length()
            + self.max_fee_per_gas.length()
            + self.gas_limit.length()
            + self.to.length()
            + self.value.length()
            + self.data.length()
            + self.access_list.length()
    }
}

/// A fully signed transaction ready for broadcast.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignedTransaction {
    pub chain_id: ChainId,
    /// Type-prefixed RLP bytes including the signature.
    pub raw: Vec<u8>,
    /// Keccak-256 of the raw bytes.
    pub hash: [u8; 32],
}

impl SignedTransaction {
    pub fn new(chain_id: ChainId, raw: Vec<u8>) -> Self {
        let hash = keccak256_hash(&raw);
        Self { chain_id, raw, hash }
    }

    pub fn raw_hex(&self) -> String {
        format!("0x{}", hex::encode(&self.raw))
    }

    pub fn hash_hex(&self) -> String {
        format!("0x{}", hex::encode(self.hash))
    }
}

// ============ Chain Client ============

/// RPC-backed client for a single EVM chain.
pub struct EvmClient {
    config: EvmConfig,
    rpc: RpcClient,
}

impl EvmClient {
    pub fn new(config: EvmConfig) -> Result<Self> {
        let rpc = RpcClient::new(config.rpc_urls.clone())?;
        Ok(Self { config, rpc })
    }

    pub fn config(&self) -> &EvmConfig {
        &self.config
    }

    pub async fn get_nonce(&self, address: Address) -> Result<u64> {
        let result = self
            .rpc
            .call(
                "eth_getTransactionCount",
                serde_json::json!([encode_address(&address), "latest"]),
            )
            .await?;
        parse_hex_u64(&result)
    }

    /// Current fee quotes: `eth_gasPrice` for the fee cap and
    /// `eth_maxPriorityFeePerGas` for the tip.
    pub async fn query_gas_price(&self) -> Result<GasPrice> {
        let fee = self.rpc.call("eth_gasPrice", serde_json::json!([])).await?;
        let tip = self
            .rpc
            .call("eth_maxPriorityFeePerGas", serde_json::json!([]))
            .await?;
        Ok(GasPrice {
            max_fee_per_gas: parse_hex_u128(&fee)?,
            max_priority_fee_per_gas: parse_hex_u128(&tip)?,
        })
    }

    pub async fn get_balance(&self, address: Address) -> Result<Balance> {
        let result = self
            .rpc
            .call(
                "eth_getBalance",
                serde_json::json!([encode_address(&address), "latest"]),
            )
            .await?;
        let raw = parse_hex_u128(&result)?;
        Ok(Balance::new(raw, 18, &self.config.native_symbol))
    }

    /// Execute a read-only contract call and return the raw result bytes.
    pub async fn call_view(&self, to: Address, data: &[u8]) -> Result<Vec<u8>> {
        let params = serde_json::json!([
            {
                "to": encode_address(&to),
                "data": format!("0x{}", hex::encode(data)),
            },
            "latest",
        ]);
        let result = self.rpc.call("eth_call", params).await?;
        let text = result
            .as_str()
            .ok_or_else(|| Error::Rpc("eth_call returned a non-string result".into()))?;
        hex::decode(text.trim_start_matches("0x")).map_err(Into::into)
    }

    /// Assemble an unsigned transaction: nonce and fees come from the
    /// chain, everything else from the caller.
    pub async fn build_transaction(
        &self,
        sender: Address,
        to: Address,
        value: U256,
        data: Vec<u8>,
        gas_limit: Option<u64>,
    ) -> Result<Eip1559Transaction> {
        if value.is_zero() && data.is_empty() {
            return Err(Error::BuildFailure(
                "transaction must transfer value or carry call data".into(),
            ));
        }

        let nonce = self
            .get_nonce(sender)
            .await
            .map_err(|e| Error::BuildFailure(format!("nonce lookup failed: {}", e)))?;
        let fees = self
            .query_gas_price()
            .await
            .map_err(|e| Error::BuildFailure(format!("fee lookup failed: {}", e)))?;

        Ok(Eip1559Transaction {
            chain_id: self.config.chain_id.0,
            nonce,
            max_priority_fee_per_gas: fees.max_priority_fee_per_gas,
            max_fee_per_gas: fees.max_fee_per_gas,
            gas_limit: gas_limit.unwrap_or(DEFAULT_GAS_LIMIT),
            to,
            value,
            data: Bytes::from(data),
            access_list: Vec::new(),
        })
    }

    /// Submit a signed transaction via `eth_sendRawTransaction`.
    pub async fn broadcast(&self, signed: &SignedTransaction) -> Result<TxHash> {
        let result = self
            .rpc
            .call("eth_sendRawTransaction", serde_json::json!([signed.raw_hex()]))
            .await
            .map_err(|e| Error::RelayFailure(e.to_string()))?;
        let hash = result.as_str().ok_or_else(|| {
            Error::RelayFailure("eth_sendRawTransaction returned a non-string result".into())
        })?;

        let mut tx_hash = TxHash::new(hash);
        if let Some(explorer) = &self.config.explorer_url {
            tx_hash = tx_hash.with_explorer_url(explorer);
        }
        Ok(tx_hash)
    }
}

fn encode_address(address: &Address) -> String {
    format!("0x{}", hex::encode(address.as_slice()))
}

fn parse_hex_u64(value: &serde_json::Value) -> Result<u64> {
    let text = value
        .as_str()
        .ok_or_else(|| Error::Rpc("expected a hex string result".into()))?;
    u64::from_str_radix(text.trim_start_matches("0x"), 16)
        .map_err(|e| Error::Rpc(format!("invalid hex quantity '{}': {}", text, e)))
}

fn parse_hex_u128(value: &serde_json::Value) -> Result<u128> {
    let text = value
        .as_str()
        .ok_or_else(|| Error::Rpc("expected a hex string result".into()))?;
    u128::from_str_radix(text.trim_start_matches("0x"), 16)
        .map_err(|e| Error::Rpc(format!("invalid hex quantity '{}': {}", text, e)))
}
