use serde::Deserialize;
use serde_json::Value;

use crate::error::MalformedDatapoint;

/// One monitoring datapoint after validation.
#[derive(Debug, Clone, PartialEq)]
pub struct DataPoint {
    pub value: f64,
    pub owner_id: String,
    pub resource_id: String,
    pub port: Option<String>,
    pub vip: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawDatapoint {
    #[serde(rename = "Average", default)]
    average: Option<Value>,
    #[serde(rename = "Value", default)]
    value: Option<Value>,
    #[serde(rename = "userId", default)]
    user_id: Option<Value>,
    #[serde(rename = "instanceId", default)]
    instance_id: Option<Value>,
    #[serde(default)]
    port: Option<Value>,
    #[serde(default)]
    vip: Option<Value>,
}

impl DataPoint {
    pub fn from_value(raw: Value) -> Result<Self, MalformedDatapoint> {
        if !raw.is_object() {
            return Err(MalformedDatapoint::NotAnObject);
        }
        let raw: RawDatapoint =
            serde_json::from_value(raw).map_err(|_| MalformedDatapoint::NotAnObject)?;

        // `Average` wins when it holds a number; some namespaces only send `Value`.
        let value = raw
            .average
            .as_ref()
            .and_then(as_number)
            .or_else(|| raw.value.as_ref().and_then(as_number))
            .ok_or(MalformedDatapoint::MissingField("Average|Value"))?;

        let owner_id = raw
            .user_id
            .as_ref()
            .and_then(as_identifier)
            .ok_or(MalformedDatapoint::MissingField("userId"))?;
        let resource_id = raw
            .instance_id
            .as_ref()
            .and_then(as_identifier)
            .ok_or(MalformedDatapoint::MissingField("instanceId"))?;

        Ok(Self {
            value,
            owner_id,
            resource_id,
            port: raw.port.as_ref().and_then(as_identifier),
            vip: raw.vip.as_ref().and_then(as_identifier),
        })
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn as_identifier(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn prefers_average_over_value() {
        let point = DataPoint::from_value(json!({
            "timestamp": 1700000000000_i64,
            "userId": "1234",
            "instanceId": "eip-1",
            "Average": 12.5,
            "Value": 99.0,
        }))
        .unwrap();

        assert_eq!(point.value, 12.5);
        assert_eq!(point.owner_id, "1234");
        assert_eq!(point.resource_id, "eip-1");
        assert_eq!(point.port, None);
    }

    #[test]
    fn falls_back_to_value_field() {
        let point = DataPoint::from_value(json!({
            "userId": "1234",
            "instanceId": "ngw-1",
            "Value": 7,
        }))
        .unwrap();
        assert_eq!(point.value, 7.0);
    }

    #[test]
    fn accepts_numeric_strings_and_numeric_ports() {
        let point = DataPoint::from_value(json!({
            "userId": 1234,
            "instanceId": "lb-1",
            "port": 443,
            "vip": "10.0.0.8",
            "Average": "0.25",
        }))
        .unwrap();

        assert_eq!(point.value, 0.25);
        assert_eq!(point.owner_id, "1234");
        assert_eq!(point.port.as_deref(), Some("443"));
        assert_eq!(point.vip.as_deref(), Some("10.0.0.8"));
    }

    #[test]
    fn missing_identifiers_are_malformed() {
        let err = DataPoint::from_value(json!({ "instanceId": "lb-1", "Average": 1.0 })).unwrap_err();
        assert_eq!(err, MalformedDatapoint::MissingField("userId"));

        let err = DataPoint::from_value(json!({ "userId": "1", "Average": 1.0 })).unwrap_err();
        assert_eq!(err, MalformedDatapoint::MissingField("instanceId"));
    }

    #[test]
    fn missing_value_is_malformed() {
        let err = DataPoint::from_value(json!({
            "userId": "1",
            "instanceId": "lb-1",
            "Average": null,
        }))
        .unwrap_err();
        assert_eq!(err, MalformedDatapoint::MissingField("Average|Value"));
    }

    #[test]
    fn non_object_is_malformed() {
        assert_eq!(
            DataPoint::from_value(json!([1, 2])).unwrap_err(),
            MalformedDatapoint::NotAnObject
        );
    }
}
