use std::collections::BTreeMap;

use aliyun_common::{config::CloudConfig, time};
use async_trait::async_trait;
use serde::{Deserialize, de::DeserializeOwned};
use tracing::debug;

use crate::{
    error::{CloudError, Result},
    signature::{SIGNATURE_METHOD, SIGNATURE_VERSION, signed_query_string},
};

/// One ACS RPC-style call: `Action` + `Version` against a product endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct RpcRequest {
    pub endpoint: String,
    pub action: &'static str,
    pub version: &'static str,
    pub params: BTreeMap<String, String>,
}

impl RpcRequest {
    pub fn new(endpoint: impl Into<String>, action: &'static str, version: &'static str) -> Self {
        Self {
            endpoint: endpoint.into(),
            action,
            version,
            params: BTreeMap::new(),
        }
    }

    pub fn param(mut self, key: &str, value: impl Into<String>) -> Self {
        self.params.insert(key.to_string(), value.into());
        self
    }

    pub fn param_str(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }
}

/// Sends a signed RPC request and hands back the raw JSON body of a 2xx
/// response. Non-2xx responses are turned into [`CloudError::Http`].
#[async_trait]
pub trait RpcTransport: Send + Sync {
    async fn call(&self, request: &RpcRequest) -> Result<String>;
}

#[derive(Debug, Default, Deserialize)]
struct RpcErrorBody {
    #[serde(rename = "Code", default)]
    code: Option<String>,
    #[serde(rename = "Message", default)]
    message: Option<String>,
}

pub struct AcsClient {
    config: CloudConfig,
    client: reqwest::Client,
}

impl AcsClient {
    pub fn new(config: CloudConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .use_rustls_tls()
            .timeout(config.request_timeout)
            .build()
            .map_err(CloudError::Network)?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &CloudConfig {
        &self.config
    }

    fn signed_url(&self, request: &RpcRequest) -> Result<String> {
        let credentials = &self.config.credentials;
        let mut params = request.params.clone();
        params.insert("Format".to_string(), "JSON".to_string());
        params.insert("Version".to_string(), request.version.to_string());
        params.insert("Action".to_string(), request.action.to_string());
        params.insert("AccessKeyId".to_string(), credentials.access_key_id.clone());
        params.insert("SignatureMethod".to_string(), SIGNATURE_METHOD.to_string());
        params.insert("SignatureVersion".to_string(), SIGNATURE_VERSION.to_string());
        params.insert(
            "SignatureNonce".to_string(),
            uuid::Uuid::new_v4().to_string(),
        );
        params.insert(
            "Timestamp".to_string(),
            time::format_acs_timestamp(&time::now()),
        );

        let query = signed_query_string("GET", &params, &credentials.access_key_secret)?;
        Ok(format!("https://{}/?{query}", request.endpoint))
    }
}

#[async_trait]
impl RpcTransport for AcsClient {
    async fn call(&self, request: &RpcRequest) -> Result<String> {
        let url = self.signed_url(request)?;
        debug!(
            endpoint = %request.endpoint,
            action = request.action,
            "calling ACS API"
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(CloudError::Network)?;
        let status = response.status();
        let body = response.text().await.map_err(CloudError::Network)?;

        if !status.is_success() {
            let error: RpcErrorBody = serde_json::from_str(&body).unwrap_or_default();
            return Err(CloudError::Http {
                action: request.action.to_string(),
                status: status.as_u16(),
                code: error.code.unwrap_or_else(|| status.as_u16().to_string()),
                message: error.message.unwrap_or(body),
            });
        }

        Ok(body)
    }
}

pub(crate) fn decode_body<T: DeserializeOwned>(action: &str, body: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|source| CloudError::Decode {
        action: action.to_string(),
        source,
    })
}
