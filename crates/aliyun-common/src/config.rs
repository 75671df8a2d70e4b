use std::{fmt, time::Duration};

use base64::Engine;

use crate::error::{ExporterError, Result};

pub const DEFAULT_MONITORING_ENDPOINT: &str = "metrics.cn-hangzhou.aliyuncs.com";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub struct Credentials {
    pub access_key_id: String,
    pub access_key_secret: String,
}

impl Credentials {
    pub fn new(
        access_key_id: impl Into<String>,
        access_key_secret: impl Into<String>,
    ) -> Result<Self> {
        let access_key_id = access_key_id.into();
        let access_key_secret = access_key_secret.into();

        if access_key_id.trim().is_empty() {
            return Err(ExporterError::InvalidCredentials(
                "access key id is empty".to_string(),
            ));
        }
        if access_key_secret.trim().is_empty() {
            return Err(ExporterError::InvalidCredentials(
                "access key secret is empty".to_string(),
            ));
        }

        Ok(Self {
            access_key_id,
            access_key_secret,
        })
    }

    /// Both values are expected in standard base64, the way operators pass
    /// them on the command line.
    pub fn from_base64(access_key_id: &str, access_key_secret: &str) -> Result<Self> {
        Self::new(
            decode_base64_field("access key id", access_key_id)?,
            decode_base64_field("access key secret", access_key_secret)?,
        )
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("access_key_secret", &"<redacted>")
            .finish()
    }
}

fn decode_base64_field(field: &str, value: &str) -> Result<String> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(value.trim())
        .map_err(|err| ExporterError::InvalidCredentials(format!("{field} is not base64: {err}")))?;

    String::from_utf8(bytes)
        .map(|decoded| decoded.trim().to_string())
        .map_err(|_| ExporterError::InvalidCredentials(format!("{field} is not valid utf-8")))
}

#[derive(Debug, Clone)]
pub struct CloudConfig {
    pub credentials: Credentials,
    pub region_id: String,
    pub monitoring_endpoint: String,
    pub request_timeout: Duration,
}

impl CloudConfig {
    pub fn new(credentials: Credentials, region_id: impl Into<String>) -> Result<Self> {
        let region_id = region_id.into().trim().to_string();
        if region_id.is_empty() || region_id.contains(['/', ' ', '.']) {
            return Err(ExporterError::InvalidArgument(format!(
                "invalid region id: {region_id:?}"
            )));
        }

        Ok(Self {
            credentials,
            region_id,
            monitoring_endpoint: DEFAULT_MONITORING_ENDPOINT.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        })
    }

    pub fn with_monitoring_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.monitoring_endpoint = normalize_endpoint(&endpoint.into());
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn slb_endpoint(&self) -> String {
        format!("slb.{}.aliyuncs.com", self.region_id)
    }

    pub fn vpc_endpoint(&self) -> String {
        format!("vpc.{}.aliyuncs.com", self.region_id)
    }
}

fn normalize_endpoint(endpoint: &str) -> String {
    let trimmed = endpoint.trim();
    let without_scheme = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .unwrap_or(trimmed);
    without_scheme.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_base64_credentials() {
        // "LTAIexample" / "s3cr3t"
        let credentials = Credentials::from_base64("TFRBSWV4YW1wbGU=", "czNjcjN0").unwrap();
        assert_eq!(credentials.access_key_id, "LTAIexample");
        assert_eq!(credentials.access_key_secret, "s3cr3t");
    }

    #[test]
    fn rejects_non_base64_credentials() {
        let err = Credentials::from_base64("not base64!", "czNjcjN0").unwrap_err();
        assert!(matches!(err, ExporterError::InvalidCredentials(_)));
    }

    #[test]
    fn rejects_empty_secret() {
        assert!(Credentials::new("id", "  ").is_err());
    }

    #[test]
    fn debug_output_redacts_secret() {
        let credentials = Credentials::new("id", "very-secret").unwrap();
        let rendered = format!("{credentials:?}");
        assert!(rendered.contains("id"));
        assert!(!rendered.contains("very-secret"));
    }

    #[test]
    fn regional_endpoints_follow_region_id() {
        let config = CloudConfig::new(Credentials::new("id", "secret").unwrap(), "cn-zhangjiakou")
            .unwrap()
            .with_monitoring_endpoint("https://metrics.cn-zhangjiakou.aliyuncs.com/");

        assert_eq!(config.slb_endpoint(), "slb.cn-zhangjiakou.aliyuncs.com");
        assert_eq!(config.vpc_endpoint(), "vpc.cn-zhangjiakou.aliyuncs.com");
        assert_eq!(config.monitoring_endpoint, "metrics.cn-zhangjiakou.aliyuncs.com");
    }

    #[test]
    fn rejects_placeholder_region() {
        let credentials = Credentials::new("id", "secret").unwrap();
        assert!(CloudConfig::new(credentials, "Default, like cn-zhangjiakou").is_err());
    }
}
