//! Target-chain plumbing: chain identifiers, balances, and the JSON-RPC
//! transport shared by all EVM operations.

pub mod evm;

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Error, Result};

// ============ Chain Identity ============

/// An EVM chain id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChainId(pub u64);

impl ChainId {
    pub const ETHEREUM_MAINNET: ChainId = ChainId(1);
    pub const ETHEREUM_SEPOLIA: ChainId = ChainId(11155111);
    pub const AURORA_MAINNET: ChainId = ChainId(1313161554);

    pub fn name(&self) -> &'static str {
        match self.0 {
            1 => "Ethereum Mainnet",
            11155111 => "Ethereum Sepolia",
            1313161554 => "Aurora Mainnet",
            _ => "Unknown",
        }
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.0)
    }
}

impl From<u64> for ChainId {
    fn from(id: u64) -> Self {
        ChainId(id)
    }
}

impl From<ChainId> for u64 {
    fn from(id: ChainId) -> Self {
        id.0
    }
}

// ============ Balances and Fees ============

/// A native-token balance with display formatting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Balance {
    /// Raw amount in the smallest unit (wei for EVM chains).
    pub raw: u128,
    /// Human-readable amount.
    pub formatted: String,
    pub symbol: String,
    pub decimals: u8,
}

impl Balance {
    pub fn new(raw: u128, decimals: u8, symbol: &str) -> Self {
        Self {
            raw,
            formatted: format_units(raw, decimals),
            symbol: symbol.to_string(),
            decimals,
        }
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.formatted, self.symbol)
    }
}

/// Format a raw amount as a decimal string, trimming trailing zeros.
pub fn format_units(raw: u128, decimals: u8) -> String {
    let divisor = 10u128.pow(decimals as u32);
    let whole = raw / divisor;
    let frac = raw % divisor;
    if frac == 0 {
        whole.to_string()
    } else {
        let frac_str = format!("{:0width$}", frac, width = decimals as usize);
        format!("{}.{}", whole, frac_str.trim_end_matches('0'))
    }
}

/// Current EIP-1559 fee quotes from the target chain.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GasPrice {
    pub max_fee_per_gas: u128,
    pub max_priority_fee_per_gas: u128,
}

/// A broadcast transaction hash, optionally with an explorer link.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxHash {
    pub hash: String,
    pub explorer_url: Option<String>,
}

impl TxHash {
    pub fn new(hash: impl Into<String>) -> Self {
        Self {
            hash: hash.into(),
            explorer_url: None,
        }
    }

    pub fn with_explorer_url(mut self, base_url: &str) -> Self {
        self.explorer_url = Some(format!("{}/tx/{}", base_url.trim_end_matches('/'), self.hash));
        self
    }
}

// ============ JSON-RPC Transport ============

/// JSON-RPC client with automatic failover across multiple endpoints.
///
/// Endpoints are tried in round-robin order starting from the last one
/// that answered, so a healthy endpoint keeps serving until it fails.
pub struct RpcClient {
    urls: Vec<String>,
    client: reqwest::Client,
    current: AtomicUsize,
}

impl RpcClient {
    pub fn new(urls: Vec<String>) -> Result<Self> {
        if urls.is_empty() {
            return Err(Error::InvalidConfig("at least one RPC URL is required".into()));
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| Error::Rpc(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            urls,
            client,
            current: AtomicUsize::new(0),
        })
    }

    pub async fn call(&self, method: &str, params: serde_json::Value) -> Result<serde_json::Value> {
        let request = serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });

        let start = self.current.load(Ordering::Relaxed);
        let mut last_error = None;

        for offset in 0..self.urls.len() {
            let index = (start + offset) % self.urls.len();
            let url = &self.urls[index];

            match self.try_call(url, &request).await {
                Ok(value) => {
                    self.current.store(index, Ordering::Relaxed);
                    return Ok(value);
                }
                Err(e) => {
                    warn!(url = %url, error = %e, "RPC endpoint failed, trying next");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| Error::Rpc("no RPC endpoints configured".into())))
    }

    async fn try_call(&self, url: &str, request: &serde_json::Value) -> Result<serde_json::Value> {
        let response = self
            .client
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(|e| Error::Rpc(format!("request to {} failed: {}", url, e)))?;

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| Error::Rpc(format!("invalid JSON from {}: {}", url, e)))?;

        if let Some(error) = body.get("error") {
            return Err(Error::Rpc(format!("RPC error from {}: {}", url, error)));
        }

        body.get("result")
            .cloned()
            .ok_or_else(|| Error::Rpc(format!("missing result field from {}", url)))
    }
}
