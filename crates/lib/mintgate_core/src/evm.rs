//! Chain-facing clients: ERC-20 reads over raw JSON-RPC and token
//! deployment through the operator's deploy relay.

use alloy_primitives::{Address, B256, U256, hex};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::{ChainConfig, RelayConfig};
use crate::deploy::{Deployed, DeployerError, SimulatedDeployment, TokenDeployer};
use crate::eligibility::{LedgerError, TokenLedger};
use crate::models::TokenConfig;

/// `balanceOf(address)`.
const SELECTOR_BALANCE_OF: [u8; 4] = [0x70, 0xa0, 0x82, 0x31];
/// `decimals()`.
const SELECTOR_DECIMALS: [u8; 4] = [0x31, 0x3c, 0xe5, 0x67];

// =============================================================================
// JSON-RPC ledger
// =============================================================================

#[derive(Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u32,
    method: &'static str,
    params: (CallParams<'a>, &'static str),
}

#[derive(Serialize)]
struct CallParams<'a> {
    to: &'a str,
    data: &'a str,
}

#[derive(Deserialize)]
struct RpcResponse {
    result: Option<String>,
    error: Option<RpcErrorBody>,
}

#[derive(Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

/// ERC-20 reader going through a plain `eth_call` endpoint.
#[derive(Debug, Clone)]
pub struct EvmTokenLedger {
    client: Client,
    config: ChainConfig,
}

impl EvmTokenLedger {
    pub fn new(config: ChainConfig) -> Result<Self, LedgerError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| LedgerError::Transport(format!("failed to build RPC client: {e}")))?;
        Ok(Self { client, config })
    }

    /// Issue one `eth_call` against the asset contract and return the raw
    /// result word.
    async fn eth_call(&self, calldata: &str) -> Result<U256, LedgerError> {
        let to = self.config.asset_token.to_string();
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: 1,
            method: "eth_call",
            params: (
                CallParams {
                    to: &to,
                    data: calldata,
                },
                "latest",
            ),
        };

        let resp = self
            .client
            .post(self.config.rpc_url.clone())
            .json(&request)
            .send()
            .await
            .map_err(|e| LedgerError::Transport(format!("RPC request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp
                .text()
                .await
                .unwrap_or_else(|_| "<no body>".to_string());
            return Err(LedgerError::Transport(format!(
                "RPC endpoint answered {status}: {body}"
            )));
        }

        let body: RpcResponse = resp
            .json()
            .await
            .map_err(|e| LedgerError::Decode(format!("RPC response parse error: {e}")))?;

        if let Some(err) = body.error {
            return Err(LedgerError::Rpc {
                code: err.code,
                message: err.message,
            });
        }
        let result = body
            .result
            .ok_or_else(|| LedgerError::Decode("RPC response carries neither result nor error".into()))?;
        decode_word(&result)
    }
}

#[async_trait]
impl TokenLedger for EvmTokenLedger {
    async fn read_balance(&self, address: Address) -> Result<U256, LedgerError> {
        self.eth_call(&encode_address_call(SELECTOR_BALANCE_OF, address))
            .await
    }

    async fn read_decimals(&self) -> Result<u8, LedgerError> {
        let word = self
            .eth_call(&hex::encode_prefixed(SELECTOR_DECIMALS))
            .await?;
        u8::try_from(word).map_err(|_| LedgerError::Decode(format!("decimals out of range: {word}")))
    }
}

/// Calldata for a one-address-argument call: the 4-byte selector followed
/// by the address left-padded to a 32-byte word.
fn encode_address_call(selector: [u8; 4], address: Address) -> String {
    let mut data = [0u8; 36];
    data[..4].copy_from_slice(&selector);
    data[16..].copy_from_slice(address.as_slice());
    hex::encode_prefixed(data)
}

/// Decode one hex-encoded 256-bit word from an `eth_call` result.
fn decode_word(result: &str) -> Result<U256, LedgerError> {
    let digits = result.trim_start_matches("0x");
    if digits.is_empty() {
        return Err(LedgerError::Decode("empty eth_call result".into()));
    }
    U256::from_str_radix(digits, 16)
        .map_err(|e| LedgerError::Decode(format!("bad eth_call result {result:?}: {e}")))
}

// =============================================================================
// Deploy relay
// =============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RelayDeployRequest<'a> {
    token_config: &'a TokenConfig,
    deployed_by: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RelayDeployResponse {
    token_address: String,
    tx_hash: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RelaySimulateResponse {
    estimated_address: Option<String>,
    gas_estimate: Option<String>,
}

/// Deploys tokens through the operator's HTTP deploy relay, which holds
/// the deployer key and submits the creation transaction.
#[derive(Debug, Clone)]
pub struct RelayTokenDeployer {
    client: Client,
    deploy_url: Url,
    simulate_url: Url,
}

impl RelayTokenDeployer {
    pub fn new(config: RelayConfig) -> Result<Self, DeployerError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| DeployerError::Transport(format!("failed to build relay client: {e}")))?;
        let deploy_url = config
            .base_url
            .join("deploy")
            .map_err(|e| DeployerError::Transport(format!("bad relay URL: {e}")))?;
        let simulate_url = config
            .base_url
            .join("simulate")
            .map_err(|e| DeployerError::Transport(format!("bad relay URL: {e}")))?;
        Ok(Self {
            client,
            deploy_url,
            simulate_url,
        })
    }

    async fn post_relay<T: serde::de::DeserializeOwned>(
        &self,
        url: &Url,
        request: &RelayDeployRequest<'_>,
    ) -> Result<T, DeployerError> {
        let resp = self
            .client
            .post(url.clone())
            .json(request)
            .send()
            .await
            .map_err(|e| DeployerError::Transport(format!("relay request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp
                .text()
                .await
                .unwrap_or_else(|_| "<no body>".to_string());
            return Err(DeployerError::Rejected(format!("{status}: {body}")));
        }

        resp.json()
            .await
            .map_err(|e| DeployerError::Decode(format!("relay response parse error: {e}")))
    }
}

#[async_trait]
impl TokenDeployer for RelayTokenDeployer {
    async fn submit(
        &self,
        config: &TokenConfig,
        deployed_by: Address,
    ) -> Result<Deployed, DeployerError> {
        let request = RelayDeployRequest {
            token_config: config,
            deployed_by: deployed_by.to_string(),
        };
        let body: RelayDeployResponse = self.post_relay(&self.deploy_url, &request).await?;

        let token_address = body
            .token_address
            .parse::<Address>()
            .map_err(|e| DeployerError::Decode(format!("bad token address from relay: {e}")))?;
        let tx_hash = body
            .tx_hash
            .parse::<B256>()
            .map_err(|e| DeployerError::Decode(format!("bad tx hash from relay: {e}")))?;
        Ok(Deployed {
            token_address,
            tx_hash,
        })
    }

    async fn simulate(
        &self,
        config: &TokenConfig,
        deployed_by: Address,
    ) -> Result<SimulatedDeployment, DeployerError> {
        let request = RelayDeployRequest {
            token_config: config,
            deployed_by: deployed_by.to_string(),
        };
        let body: RelaySimulateResponse = self.post_relay(&self.simulate_url, &request).await?;

        let estimated_address = body
            .estimated_address
            .map(|raw| raw.parse::<Address>())
            .transpose()
            .map_err(|e| DeployerError::Decode(format!("bad estimated address from relay: {e}")))?;
        Ok(SimulatedDeployment {
            estimated_address,
            gas_estimate: body.gas_estimate,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selectors_match_the_erc20_abi() {
        assert_eq!(hex::encode(SELECTOR_BALANCE_OF), "70a08231");
        assert_eq!(hex::encode(SELECTOR_DECIMALS), "313ce567");
    }

    #[test]
    fn encodes_balance_call_with_left_padded_address() {
        let holder: Address = "0x52908400098527886E0F7030069857D2E4169EE7"
            .parse()
            .unwrap();
        let calldata = encode_address_call(SELECTOR_BALANCE_OF, holder);
        assert_eq!(
            calldata,
            "0x70a0823100000000000000000000000052908400098527886e0f7030069857d2e4169ee7"
        );
        // 4 selector bytes + one 32-byte word, as "0x" + hex digits.
        assert_eq!(calldata.len(), 2 + 2 * 36);
    }

    #[test]
    fn decodes_result_words() {
        assert_eq!(decode_word("0x0").unwrap(), U256::ZERO);
        assert_eq!(
            decode_word("0x0000000000000000000000000000000000000000000000000000000000000012")
                .unwrap(),
            U256::from(18u8)
        );
        // Some endpoints omit the prefix.
        assert_eq!(decode_word("ff").unwrap(), U256::from(255u16));
    }

    #[test]
    fn rejects_malformed_result_words() {
        assert!(matches!(decode_word(""), Err(LedgerError::Decode(_))));
        assert!(matches!(decode_word("0x"), Err(LedgerError::Decode(_))));
        assert!(matches!(
            decode_word("0xnothex"),
            Err(LedgerError::Decode(_))
        ));
    }

    #[test]
    fn relay_endpoints_extend_the_base_path() {
        let config = RelayConfig::new("https://relay.example.com/api/v1").unwrap();
        let deployer = RelayTokenDeployer::new(config).unwrap();
        assert_eq!(
            deployer.deploy_url.as_str(),
            "https://relay.example.com/api/v1/deploy"
        );
        assert_eq!(
            deployer.simulate_url.as_str(),
            "https://relay.example.com/api/v1/simulate"
        );
    }
}
