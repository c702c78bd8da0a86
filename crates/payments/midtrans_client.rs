use std::time::Duration;

use anyhow::{Result, anyhow, bail};
use reqwest::header::ACCEPT;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{error, warn};
use url::Url;

use super::notifications::{notification_signature, signatures_match};

pub const SANDBOX_BASE_URL: &str = "https://api.sandbox.midtrans.com";

/// Minimal Midtrans Core API client built on reqwest.
pub struct MidtransClient {
    http: reqwest::Client,
    server_key: String,
    base_url: Url,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CustomerDetails {
    pub first_name: String,
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChargeRequest {
    /// Local transaction id, sent as the gateway `order_id`.
    pub order_id: String,
    pub gross_amount: i64,
    pub payment_type: String,
    pub channel: String,
    pub customer: CustomerDetails,
}

impl ChargeRequest {
    pub fn to_body(&self) -> Result<Value> {
        let mut body = json!({
            "payment_type": self.payment_type,
            "transaction_details": {
                "order_id": self.order_id,
                "gross_amount": self.gross_amount,
            },
            "customer_details": {
                "first_name": self.customer.first_name,
                "email": self.customer.email,
                "phone": self.customer.phone,
            },
        });

        let block = match self.payment_type.as_str() {
            "bank_transfer" => json!({ "bank": self.channel }),
            "echannel" => json!({
                "bill_info1": "Payment:",
                "bill_info2": "Subscription",
            }),
            "cstore" => json!({ "store": self.channel }),
            "qris" => json!({ "acquirer": "gopay" }),
            "gopay" | "shopeepay" => json!({}),
            other => bail!("unsupported payment type {}", other),
        };

        if let Some(map) = body.as_object_mut() {
            map.insert(self.payment_type.clone(), block);
        }

        Ok(body)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct VaNumber {
    pub bank: Option<String>,
    pub va_number: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ChargeAction {
    pub name: Option<String>,
    pub method: Option<String>,
    pub url: Option<String>,
}

/// Synchronous charge result. Payment instructions (VA number, bill key,
/// store code, deeplinks) are returned to the payer as the receipt.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ChargeResponse {
    pub status_code: Option<String>,
    pub status_message: Option<String>,
    pub transaction_id: Option<String>,
    pub order_id: Option<String>,
    pub gross_amount: Option<String>,
    pub currency: Option<String>,
    pub payment_type: Option<String>,
    pub transaction_status: Option<String>,
    pub fraud_status: Option<String>,
    pub transaction_time: Option<String>,
    pub settlement_time: Option<String>,
    pub expiry_time: Option<String>,
    #[serde(default)]
    pub va_numbers: Vec<VaNumber>,
    pub permata_va_number: Option<String>,
    pub bill_key: Option<String>,
    pub biller_code: Option<String>,
    pub payment_code: Option<String>,
    pub store: Option<String>,
    #[serde(default)]
    pub actions: Vec<ChargeAction>,
}

fn is_success_code(status_code: Option<&str>) -> bool {
    status_code.is_some_and(|code| code.trim().starts_with('2'))
}

impl MidtransClient {
    pub fn new(server_key: String, base_url: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        let base_url = Url::parse(base_url)?;

        Ok(Self {
            http,
            server_key,
            base_url,
        })
    }

    pub async fn charge(&self, request: &ChargeRequest) -> Result<ChargeResponse> {
        let url = self.base_url.join("v2/charge")?;
        let body = request.to_body()?;

        let resp = self
            .http
            .post(url)
            .basic_auth(&self.server_key, Some(""))
            .header(ACCEPT, "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    warn!(order_id = %request.order_id, "midtrans: charge timed out");
                    anyhow!("payment gateway timed out")
                } else {
                    anyhow!(err).context("payment gateway request failed")
                }
            })?;

        let status = resp.status();
        let text = match resp.text().await {
            Ok(text) if !text.is_empty() => text,
            Ok(_) => "<empty response body>".to_string(),
            Err(err) => format!("<failed to read response body: {err}>"),
        };

        let parsed = serde_json::from_str::<ChargeResponse>(&text);

        let charge = match parsed {
            Ok(charge) if status.is_success() && is_success_code(charge.status_code.as_deref()) => {
                charge
            }
            Ok(charge) => {
                error!(
                    status = %status,
                    order_id = %request.order_id,
                    gateway_status_code = ?charge.status_code,
                    gateway_status_message = ?charge.status_message,
                    "midtrans: charge rejected"
                );
                bail!(
                    "payment gateway rejected charge (status {}, code {:?})",
                    status,
                    charge.status_code
                );
            }
            Err(err) => {
                error!(
                    status = %status,
                    order_id = %request.order_id,
                    response_body = %text,
                    parse_error = %err,
                    "midtrans: unreadable charge response"
                );
                bail!("payment gateway returned an unreadable response (status {})", status);
            }
        };

        if charge.transaction_id.as_deref().is_none_or(str::is_empty) {
            error!(
                order_id = %request.order_id,
                gateway_status_code = ?charge.status_code,
                "midtrans: charge response has no transaction_id"
            );
            bail!("payment gateway response is missing transaction_id");
        }

        Ok(charge)
    }

    pub fn verify_notification_signature(
        &self,
        order_id: &str,
        status_code: &str,
        gross_amount: &str,
        signature_key: &str,
    ) -> bool {
        let expected = notification_signature(order_id, status_code, gross_amount, &self.server_key);
        signatures_match(&expected, signature_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(payment_type: &str, channel: &str) -> ChargeRequest {
        ChargeRequest {
            order_id: "0b7a4c1e-order".to_string(),
            gross_amount: 150_000,
            payment_type: payment_type.to_string(),
            channel: channel.to_string(),
            customer: CustomerDetails {
                first_name: "Sari".to_string(),
                email: "sari@example.com".to_string(),
                phone: "08123456789".to_string(),
            },
        }
    }

    #[test]
    fn bank_transfer_body_names_the_bank() {
        let body = request("bank_transfer", "bca").to_body().unwrap();

        assert_eq!(body["payment_type"], "bank_transfer");
        assert_eq!(body["bank_transfer"]["bank"], "bca");
        assert_eq!(body["transaction_details"]["gross_amount"], 150_000);
        assert_eq!(body["transaction_details"]["order_id"], "0b7a4c1e-order");
        assert_eq!(body["customer_details"]["phone"], "08123456789");
    }

    #[test]
    fn cstore_body_names_the_store() {
        let body = request("cstore", "alfamart").to_body().unwrap();
        assert_eq!(body["cstore"]["store"], "alfamart");
    }

    #[test]
    fn unsupported_type_is_rejected() {
        assert!(request("credit_card", "visa").to_body().is_err());
    }

    #[test]
    fn body_status_code_must_be_2xx() {
        assert!(is_success_code(Some("201")));
        assert!(is_success_code(Some("200")));
        assert!(!is_success_code(Some("406")));
        assert!(!is_success_code(None));
    }

    #[test]
    fn client_verifies_its_own_signature() {
        let client =
            MidtransClient::new("server-key".to_string(), SANDBOX_BASE_URL, Duration::from_secs(5))
                .unwrap();
        let signature = notification_signature("order-1", "200", "150000.00", "server-key");

        assert!(client.verify_notification_signature("order-1", "200", "150000.00", &signature));
        assert!(!client.verify_notification_signature("order-1", "201", "150000.00", &signature));
    }
}
