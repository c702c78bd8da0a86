use anyhow::Result;
use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};
use serde::Deserialize;
use sha2::{Digest, Sha512};

use crate::domain::value_objects::{
    enums::transaction_statuses::TransactionStatus, payment_transactions::TransactionUpdateModel,
};

/// The gateway reports wall-clock times in Jakarta time.
const GATEWAY_UTC_OFFSET_SECS: i32 = 7 * 3600;
const GATEWAY_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// HTTP notification body posted by the gateway. Every field is optional so a
/// partial payload still parses; required fields are checked by the caller.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MidtransNotification {
    pub transaction_id: Option<String>,
    pub order_id: Option<String>,
    pub status_code: Option<String>,
    pub gross_amount: Option<String>,
    pub signature_key: Option<String>,
    pub transaction_status: Option<String>,
    pub fraud_status: Option<String>,
    pub payment_type: Option<String>,
    pub status_message: Option<String>,
    pub transaction_time: Option<String>,
    pub settlement_time: Option<String>,
    pub expiry_time: Option<String>,
}

impl MidtransNotification {
    pub fn parse(body: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(body)?)
    }

    pub fn canonical_status(&self) -> Option<TransactionStatus> {
        self.transaction_status
            .as_deref()
            .map(|status| TransactionStatus::from_provider(status, self.fraud_status.as_deref()))
    }

    /// Builds the partial update this notification carries. Unparsable
    /// timestamps are dropped instead of failing the notification.
    pub fn to_update_model(&self) -> TransactionUpdateModel {
        TransactionUpdateModel {
            status: self.canonical_status(),
            fraud_status: non_empty(&self.fraud_status),
            transaction_time: parse_gateway_time(self.transaction_time.as_deref()),
            settlement_time: parse_gateway_time(self.settlement_time.as_deref()),
            expiry_time: parse_gateway_time(self.expiry_time.as_deref()),
            signature_key: non_empty(&self.signature_key),
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

pub fn parse_gateway_time(value: Option<&str>) -> Option<DateTime<Utc>> {
    let value = value?.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }

    let naive = NaiveDateTime::parse_from_str(value, GATEWAY_TIME_FORMAT).ok()?;
    let offset = FixedOffset::east_opt(GATEWAY_UTC_OFFSET_SECS)?;
    offset
        .from_local_datetime(&naive)
        .single()
        .map(|local| local.with_timezone(&Utc))
}

/// `hex(SHA-512(order_id + status_code + gross_amount + server_key))`.
pub fn notification_signature(
    order_id: &str,
    status_code: &str,
    gross_amount: &str,
    server_key: &str,
) -> String {
    let mut hasher = Sha512::new();
    hasher.update(order_id.as_bytes());
    hasher.update(status_code.as_bytes());
    hasher.update(gross_amount.as_bytes());
    hasher.update(server_key.as_bytes());
    hex::encode(hasher.finalize())
}

/// Compares without short-circuiting on the first differing byte.
pub fn signatures_match(expected: &str, provided: &str) -> bool {
    let expected = expected.as_bytes();
    let provided = provided.trim().to_ascii_lowercase();
    let provided = provided.as_bytes();

    if expected.len() != provided.len() {
        return false;
    }

    expected
        .iter()
        .zip(provided)
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn gateway_time_is_read_as_jakarta_time() {
        let parsed = parse_gateway_time(Some("2025-03-01 16:30:00")).unwrap();

        assert_eq!(parsed, Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 0).unwrap());
    }

    #[test]
    fn rfc3339_is_accepted() {
        let parsed = parse_gateway_time(Some("2025-03-01T09:30:00Z")).unwrap();
        assert_eq!(parsed.hour(), 9);
    }

    #[test]
    fn bad_timestamps_degrade_to_none() {
        assert_eq!(parse_gateway_time(None), None);
        assert_eq!(parse_gateway_time(Some("")), None);
        assert_eq!(parse_gateway_time(Some("yesterday")), None);
        assert_eq!(parse_gateway_time(Some("2025-13-40 99:00:00")), None);
    }

    #[test]
    fn update_model_skips_bad_fields() {
        let notification = MidtransNotification {
            transaction_id: Some("abc123".to_string()),
            transaction_status: Some("settlement".to_string()),
            fraud_status: Some("".to_string()),
            settlement_time: Some("not a time".to_string()),
            transaction_time: Some("2025-03-01 15:00:00".to_string()),
            ..Default::default()
        };

        let update = notification.to_update_model();

        assert_eq!(update.status, Some(TransactionStatus::Settled));
        assert_eq!(update.fraud_status, None);
        assert_eq!(update.settlement_time, None);
        assert!(update.transaction_time.is_some());
    }

    #[test]
    fn signature_matches_known_digest() {
        let signature = notification_signature("order-1", "200", "150000.00", "server-key");

        assert_eq!(signature.len(), 128);
        assert!(signatures_match(&signature, &signature.to_uppercase()));
        assert!(!signatures_match(
            &signature,
            &notification_signature("order-1", "200", "150001.00", "server-key")
        ));
        assert!(!signatures_match(&signature, ""));
    }

    #[test]
    fn payload_parses_with_missing_fields() {
        let notification =
            MidtransNotification::parse(br#"{"transaction_id":"abc123","transaction_status":"pending"}"#)
                .unwrap();

        assert_eq!(notification.transaction_id.as_deref(), Some("abc123"));
        assert_eq!(notification.signature_key, None);
        assert!(MidtransNotification::parse(b"{not json").is_err());
    }
}
