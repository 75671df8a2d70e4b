use chrono::{DateTime, Utc};

pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// UTC timestamp in the ISO 8601 form the ACS RPC `Timestamp` parameter expects.
pub fn format_acs_timestamp(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn acs_timestamp_is_second_precision_utc() {
        let dt = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).single().unwrap();
        assert_eq!(format_acs_timestamp(&dt), "2024-03-09T07:05:01Z");
    }
}
