use std::sync::Arc;

use aliyun_common::config::CloudConfig;
use async_trait::async_trait;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::{debug, warn};

use crate::{
    client::{RpcRequest, RpcTransport, decode_body},
    error::{CloudError, Result},
};

const CMS_API_VERSION: &str = "2019-01-01";
const DESCRIBE_METRIC_LAST: &str = "DescribeMetricLast";
const PERIOD_SECONDS: &str = "60";
const PAGE_LENGTH: &str = "1000";
const MAX_PAGES: usize = 100;
const SUCCESS_CODE: &str = "200";

/// Raw datapoints as returned by the monitoring API, one JSON object per
/// resource. Field validation happens when the points are translated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DatapointBatch {
    pub points: Vec<Value>,
}

impl DatapointBatch {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[async_trait]
pub trait MonitoringClient: Send + Sync {
    async fn fetch_latest(&self, metric_name: &str, namespace: &str) -> Result<DatapointBatch>;
}

#[derive(Debug, Deserialize)]
struct MetricLastResponse {
    #[serde(rename = "Code", default, deserialize_with = "deserialize_code")]
    code: Option<String>,
    #[serde(rename = "Message", default)]
    message: Option<String>,
    #[serde(rename = "Datapoints", default)]
    datapoints: Option<String>,
    #[serde(rename = "NextToken", default)]
    next_token: Option<String>,
}

fn deserialize_code<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum CodeInput {
        Text(String),
        Number(i64),
    }

    Ok(Option::<CodeInput>::deserialize(deserializer)?.map(|code| match code {
        CodeInput::Text(text) => text,
        CodeInput::Number(number) => number.to_string(),
    }))
}

pub struct AcsMonitoringClient {
    transport: Arc<dyn RpcTransport>,
    endpoint: String,
}

impl AcsMonitoringClient {
    pub fn new(transport: Arc<dyn RpcTransport>, config: &CloudConfig) -> Self {
        Self {
            transport,
            endpoint: config.monitoring_endpoint.clone(),
        }
    }

    fn request(&self, metric_name: &str, namespace: &str, next_token: Option<&str>) -> RpcRequest {
        let request = RpcRequest::new(self.endpoint.as_str(), DESCRIBE_METRIC_LAST, CMS_API_VERSION)
            .param("Namespace", namespace)
            .param("MetricName", metric_name)
            .param("Period", PERIOD_SECONDS)
            .param("Length", PAGE_LENGTH);

        match next_token {
            Some(token) => request.param("NextToken", token),
            None => request,
        }
    }
}

#[async_trait]
impl MonitoringClient for AcsMonitoringClient {
    async fn fetch_latest(&self, metric_name: &str, namespace: &str) -> Result<DatapointBatch> {
        let mut batch = DatapointBatch::default();
        let mut next_token: Option<String> = None;

        for page in 1..=MAX_PAGES {
            let request = self.request(metric_name, namespace, next_token.as_deref());
            let body = self.transport.call(&request).await?;
            let response: MetricLastResponse = decode_body(DESCRIBE_METRIC_LAST, &body)?;

            let code = response.code.unwrap_or_default();
            if code != SUCCESS_CODE {
                return Err(CloudError::Api {
                    action: DESCRIBE_METRIC_LAST.to_string(),
                    code,
                    message: response.message.unwrap_or_default(),
                });
            }

            batch
                .points
                .extend(parse_datapoints(response.datapoints.as_deref())?);

            match response.next_token.filter(|token| !token.is_empty()) {
                Some(token) if next_token.as_deref() != Some(token.as_str()) => {
                    if page == MAX_PAGES {
                        warn!(
                            metric = metric_name,
                            namespace,
                            pages = MAX_PAGES,
                            points = batch.len(),
                            "monitoring API page limit reached, batch truncated"
                        );
                    }
                    next_token = Some(token);
                }
                Some(_) => {
                    warn!(metric = metric_name, namespace, "monitoring API repeated its page token");
                    break;
                }
                None => break,
            }
        }

        debug!(
            metric = metric_name,
            namespace,
            points = batch.len(),
            "fetched latest datapoints"
        );
        Ok(batch)
    }
}

/// `Datapoints` is itself a JSON document encoded as a string.
fn parse_datapoints(raw: Option<&str>) -> Result<Vec<Value>> {
    let raw = raw.map(str::trim).unwrap_or_default();
    if raw.is_empty() {
        return Ok(Vec::new());
    }

    decode_body(DESCRIBE_METRIC_LAST, raw)
}

#[cfg(test)]
mod tests {
    use aliyun_common::config::Credentials;
    use serde_json::json;

    use super::*;
    use crate::client::testing::ScriptedTransport;

    fn client(transport: &Arc<ScriptedTransport>) -> AcsMonitoringClient {
        let config = CloudConfig::new(Credentials::new("id", "secret").unwrap(), "cn-hangzhou")
            .unwrap()
            .with_monitoring_endpoint("metrics.cn-zhangjiakou.aliyuncs.com");
        AcsMonitoringClient::new(transport.clone(), &config)
    }

    fn envelope(code: Value, datapoints: Option<Value>, next_token: Option<&str>) -> String {
        let mut body = json!({ "RequestId": "req", "Code": code, "Message": "", "Period": "60" });
        if let Some(points) = datapoints {
            body["Datapoints"] = Value::String(points.to_string());
        }
        if let Some(token) = next_token {
            body["NextToken"] = Value::String(token.to_string());
        }
        body.to_string()
    }

    #[tokio::test]
    async fn decodes_string_encoded_datapoints() {
        let points = json!([
            { "timestamp": 1, "userId": "1234", "instanceId": "lb-1", "port": "80", "Average": 3.0 },
            { "timestamp": 1, "userId": "1234", "instanceId": "lb-2", "Average": 1.5 },
        ]);
        let transport = Arc::new(ScriptedTransport::new(vec![Ok(envelope(
            json!("200"),
            Some(points),
            None,
        ))]));

        let batch = client(&transport)
            .fetch_latest("ActiveConnection", "acs_slb_dashboard")
            .await
            .unwrap();

        assert_eq!(batch.len(), 2);
        assert_eq!(batch.points[1]["instanceId"], "lb-2");

        let request = &transport.requests()[0];
        assert_eq!(request.endpoint, "metrics.cn-zhangjiakou.aliyuncs.com");
        assert_eq!(request.action, "DescribeMetricLast");
        assert_eq!(request.param_str("Namespace"), Some("acs_slb_dashboard"));
        assert_eq!(request.param_str("MetricName"), Some("ActiveConnection"));
        assert_eq!(request.param_str("Period"), Some("60"));
    }

    #[tokio::test]
    async fn non_success_code_is_a_fetch_failure() {
        let transport = Arc::new(ScriptedTransport::new(vec![Ok(envelope(json!(500), None, None))]));

        let err = client(&transport)
            .fetch_latest("net_rx.rate", "acs_vpc_eip")
            .await
            .unwrap_err();

        assert!(err.is_logical());
        assert_eq!(err.code(), Some("500"));
    }

    #[tokio::test]
    async fn success_without_datapoints_is_an_empty_batch() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            Ok(envelope(json!("200"), None, None)),
            Ok(envelope(json!("200"), Some(json!([])), None)),
        ]));
        let client = client(&transport);

        assert!(client.fetch_latest("a", "acs_nat_gateway").await.unwrap().is_empty());
        assert!(client.fetch_latest("b", "acs_nat_gateway").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn follows_next_token() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            Ok(envelope(json!("200"), Some(json!([{ "instanceId": "a" }])), Some("t1"))),
            Ok(envelope(json!("200"), Some(json!([{ "instanceId": "b" }])), Some(""))),
        ]));

        let batch = client(&transport)
            .fetch_latest("SessionNewConnection", "acs_nat_gateway")
            .await
            .unwrap();

        assert_eq!(batch.len(), 2);
        let requests = transport.requests();
        assert_eq!(requests[0].param_str("NextToken"), None);
        assert_eq!(requests[1].param_str("NextToken"), Some("t1"));
    }

    #[tokio::test]
    async fn stops_following_tokens_at_page_limit() {
        let responses = (0..MAX_PAGES + 5)
            .map(|page| {
                Ok(envelope(
                    json!("200"),
                    Some(json!([{ "instanceId": format!("ngw-{page}") }])),
                    Some(format!("t{page}").as_str()),
                ))
            })
            .collect();
        let transport = Arc::new(ScriptedTransport::new(responses));

        let batch = client(&transport)
            .fetch_latest("SnatConnection", "acs_nat_gateway")
            .await
            .unwrap();

        assert_eq!(batch.len(), MAX_PAGES);
        assert_eq!(transport.requests().len(), MAX_PAGES);
    }

    #[tokio::test]
    async fn garbled_datapoints_text_is_a_decode_failure() {
        let body = json!({ "Code": "200", "Datapoints": "[{\"instanceId\":" }).to_string();
        let transport = Arc::new(ScriptedTransport::new(vec![Ok(body)]));

        let err = client(&transport)
            .fetch_latest("PacketRX", "acs_slb_dashboard")
            .await
            .unwrap_err();
        assert!(matches!(err, CloudError::Decode { .. }));
    }
}
