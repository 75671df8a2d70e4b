use std::collections::BTreeMap;

use base64::Engine;
use hmac::{Hmac, Mac};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use sha1::Sha1;

use crate::error::{CloudError, Result};

type HmacSha1 = Hmac<Sha1>;

/// RFC 3986 unreserved characters stay literal, everything else is encoded.
const ACS_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

pub const SIGNATURE_METHOD: &str = "HMAC-SHA1";
pub const SIGNATURE_VERSION: &str = "1.0";

pub fn percent_encode(value: &str) -> String {
    utf8_percent_encode(value, ACS_ENCODE_SET).to_string()
}

pub fn canonical_query_string(params: &BTreeMap<String, String>) -> String {
    params
        .iter()
        .map(|(key, value)| format!("{}={}", percent_encode(key), percent_encode(value)))
        .collect::<Vec<_>>()
        .join("&")
}

pub fn get_string_to_sign(method: &str, canonical_query: &str) -> String {
    format!(
        "{method}&{}&{}",
        percent_encode("/"),
        percent_encode(canonical_query)
    )
}

pub fn get_signature(access_key_secret: &str, string_to_sign: &str) -> Result<String> {
    let key = format!("{access_key_secret}&");
    let mut mac = HmacSha1::new_from_slice(key.as_bytes())
        .map_err(|err| CloudError::Signing(err.to_string()))?;
    mac.update(string_to_sign.as_bytes());
    Ok(base64::engine::general_purpose::STANDARD.encode(mac.finalize().into_bytes()))
}

/// Signs `params` (which must already hold every common parameter) and
/// returns the final query string with `Signature` appended.
pub fn signed_query_string(
    method: &str,
    params: &BTreeMap<String, String>,
    access_key_secret: &str,
) -> Result<String> {
    let canonical_query = canonical_query_string(params);
    let string_to_sign = get_string_to_sign(method, &canonical_query);
    let signature = get_signature(access_key_secret, &string_to_sign)?;
    Ok(format!(
        "{canonical_query}&Signature={}",
        percent_encode(&signature)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn describe_regions_params() -> BTreeMap<String, String> {
        [
            ("AccessKeyId", "testid"),
            ("Action", "DescribeRegions"),
            ("Format", "XML"),
            ("SignatureMethod", SIGNATURE_METHOD),
            ("SignatureNonce", "3ee8c1b8-83d3-44af-a94f-4e0ad82fd6cf"),
            ("SignatureVersion", SIGNATURE_VERSION),
            ("Timestamp", "2016-02-23T12:46:24Z"),
            ("Version", "2014-05-26"),
        ]
        .into_iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
    }

    #[test]
    fn encodes_reserved_characters() {
        assert_eq!(percent_encode("hello world"), "hello%20world");
        assert_eq!(percent_encode("a+b*c~d"), "a%2Bb%2Ac~d");
        assert_eq!(percent_encode("net_rx.rate"), "net_rx.rate");
        assert_eq!(percent_encode("key=value&foo=bar"), "key%3Dvalue%26foo%3Dbar");
    }

    #[test]
    fn builds_documented_string_to_sign() {
        let canonical = canonical_query_string(&describe_regions_params());
        assert!(canonical.starts_with("AccessKeyId=testid&Action=DescribeRegions"));
        assert!(canonical.contains("Timestamp=2016-02-23T12%3A46%3A24Z"));

        let string_to_sign = get_string_to_sign("GET", &canonical);
        assert!(string_to_sign.starts_with("GET&%2F&AccessKeyId%3Dtestid%26Action"));
        assert!(string_to_sign.contains("12%253A46%253A24Z"));
    }

    #[test]
    fn matches_documented_signature() {
        let canonical = canonical_query_string(&describe_regions_params());
        let signature = get_signature("testsecret", &get_string_to_sign("GET", &canonical)).unwrap();
        assert_eq!(signature, "OLeaidS1JvxuMvnyHOwuJ+uX5qY=");
    }

    #[test]
    fn signed_query_appends_encoded_signature() {
        let query = signed_query_string("GET", &describe_regions_params(), "testsecret").unwrap();
        assert!(query.ends_with("&Signature=OLeaidS1JvxuMvnyHOwuJ%2BuX5qY%3D"));
    }
}
