//! Stripe REST gateway and webhook signature verification.
//!
//! Talks to `api.stripe.com/v1` with form-encoded requests. Webhooks are
//! verified against the `Stripe-Signature` header (`t=<unix>,v1=<hex>`).

use std::time::Duration;

use chrono::Utc;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use sha2::Sha256;
use tracing::{debug, warn};

use casework_core::service::billing::{BillingGateway, CheckoutParams};
use casework_types::error::BillingError;
use casework_types::subscription::CheckoutSession;
use casework_types::user::UserId;
use casework_types::webhook::WebhookEvent;

type HmacSha256 = Hmac<Sha256>;

pub const STRIPE_API_BASE: &str = "https://api.stripe.com/v1";

/// Maximum age of a webhook timestamp, in seconds.
pub const SIGNATURE_TOLERANCE_SECS: i64 = 300;

pub struct StripeGateway {
    client: reqwest::Client,
    secret_key: SecretString,
    webhook_secret: Option<SecretString>,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct IdObject {
    id: String,
}

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetail {
    message: Option<String>,
}

impl StripeGateway {
    pub fn new(
        secret_key: SecretString,
        webhook_secret: Option<SecretString>,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            secret_key,
            webhook_secret,
            base_url: STRIPE_API_BASE.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    async fn send<T: serde::de::DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, BillingError> {
        let response = request
            .bearer_auth(self.secret_key.expose_secret())
            .send()
            .await
            .map_err(|e| BillingError::Provider(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| BillingError::Provider(e.to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_str::<StripeErrorBody>(&body)
                .ok()
                .and_then(|b| b.error.message)
                .unwrap_or(body);
            warn!(status = status.as_u16(), %message, "stripe request failed");
            return Err(BillingError::Provider(message));
        }

        serde_json::from_str(&body).map_err(|e| BillingError::Provider(format!("bad response: {e}")))
    }
}

/// Form fields for a subscription-mode checkout session.
fn checkout_form(params: &CheckoutParams) -> Vec<(&'static str, String)> {
    vec![
        ("mode", "subscription".to_string()),
        ("customer", params.customer_id.clone()),
        ("line_items[0][price]", params.price_id.clone()),
        ("line_items[0][quantity]", "1".to_string()),
        ("success_url", params.success_url.clone()),
        ("cancel_url", params.cancel_url.clone()),
        ("metadata[user_id]", params.user_id.to_string()),
    ]
}

impl BillingGateway for StripeGateway {
    async fn create_customer(
        &self,
        user_id: &UserId,
        email: Option<&str>,
    ) -> Result<String, BillingError> {
        let mut form = vec![("metadata[user_id]", user_id.to_string())];
        if let Some(email) = email {
            form.push(("email", email.to_string()));
        }

        let customer: IdObject = self
            .send(self.client.post(format!("{}/customers", self.base_url)).form(&form))
            .await?;
        Ok(customer.id)
    }

    async fn create_checkout_session(
        &self,
        params: &CheckoutParams,
    ) -> Result<CheckoutSession, BillingError> {
        let request = self
            .client
            .post(format!("{}/checkout/sessions", self.base_url))
            .form(&checkout_form(params));
        self.send(request).await
    }

    async fn cancel_subscription(&self, subscription_id: &str) -> Result<(), BillingError> {
        let _: IdObject = self
            .send(
                self.client
                    .delete(format!("{}/subscriptions/{subscription_id}", self.base_url)),
            )
            .await?;
        Ok(())
    }

    fn construct_event(&self, payload: &str, signature: &str) -> Result<WebhookEvent, BillingError> {
        let secret = self
            .webhook_secret
            .as_ref()
            .ok_or(BillingError::NotConfigured)?;
        verify_signature(
            payload,
            signature,
            secret.expose_secret().as_bytes(),
            Utc::now().timestamp(),
        )?;

        let event: WebhookEvent = serde_json::from_str(payload)
            .map_err(|e| BillingError::InvalidPayload(e.to_string()))?;
        debug!(event_id = %event.id, "webhook signature verified");
        Ok(event)
    }
}

/// Check a `Stripe-Signature` header against the raw payload.
///
/// Valid when HMAC-SHA256(secret, "{t}.{payload}") equals any `v1` entry and
/// `t` is within [`SIGNATURE_TOLERANCE_SECS`] of `now`.
pub fn verify_signature(
    payload: &str,
    header: &str,
    secret: &[u8],
    now: i64,
) -> Result<(), BillingError> {
    let mut timestamp: Option<i64> = None;
    let mut candidates: Vec<&str> = Vec::new();
    for item in header.split(',') {
        match item.trim().split_once('=') {
            Some(("t", value)) => timestamp = value.parse().ok(),
            Some(("v1", value)) => candidates.push(value),
            _ => {}
        }
    }

    let timestamp = timestamp
        .ok_or_else(|| BillingError::InvalidSignature("missing timestamp".to_string()))?;
    if candidates.is_empty() {
        return Err(BillingError::InvalidSignature("no v1 signature".to_string()));
    }
    if (now - timestamp).abs() > SIGNATURE_TOLERANCE_SECS {
        return Err(BillingError::InvalidSignature(
            "timestamp outside tolerance".to_string(),
        ));
    }

    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| BillingError::InvalidSignature(e.to_string()))?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload.as_bytes());

    let matched = candidates.iter().any(|candidate| {
        hex_decode(candidate)
            .map(|expected| mac.clone().verify_slice(&expected).is_ok())
            .unwrap_or(false)
    });
    if matched {
        Ok(())
    } else {
        Err(BillingError::InvalidSignature("signature mismatch".to_string()))
    }
}

fn hex_decode(hex: &str) -> Option<Vec<u8>> {
    if hex.len() % 2 != 0 || !hex.is_ascii() {
        return None;
    }
    (0..hex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&hex[i..i + 2], 16).ok())
        .collect()
}
