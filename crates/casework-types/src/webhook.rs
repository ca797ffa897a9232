//! Billing provider webhook payloads.
//!
//! Only the fields the subscription mirror reads are modelled; everything else
//! in the provider's objects is ignored during deserialization.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A webhook event envelope. `data.object` is decoded per event type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub data: EventData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventData {
    pub object: serde_json::Value,
}

/// A reference that may arrive as a bare id or as an expanded object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Expandable {
    Id(String),
    Object { id: String },
}

impl Expandable {
    pub fn id(&self) -> &str {
        match self {
            Expandable::Id(id) => id,
            Expandable::Object { id } => id,
        }
    }
}

/// `checkout.session.completed` payload.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSessionObject {
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    /// Only a bare id links a subscription; expanded objects are ignored.
    #[serde(default)]
    pub subscription: Option<serde_json::Value>,
}

/// `customer.subscription.*` payload.
#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionObject {
    pub id: String,
    #[serde(default)]
    pub customer: Option<Expandable>,
    pub status: String,
    #[serde(default)]
    pub items: SubscriptionItems,
    /// Legacy top-level period end, still sent on deletions.
    #[serde(default)]
    pub current_period_end: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubscriptionItems {
    #[serde(default)]
    pub data: Vec<SubscriptionItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionItem {
    #[serde(default)]
    pub price: Option<PriceRef>,
    #[serde(default)]
    pub current_period_start: Option<i64>,
    #[serde(default)]
    pub current_period_end: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PriceRef {
    pub id: String,
}

/// `invoice.payment_*` payload.
#[derive(Debug, Clone, Deserialize)]
pub struct InvoiceObject {
    #[serde(default)]
    pub customer: Option<Expandable>,
    #[serde(default)]
    pub parent: Option<InvoiceParent>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InvoiceParent {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub subscription_details: Option<SubscriptionDetails>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionDetails {
    #[serde(default)]
    pub subscription: Option<Expandable>,
}

impl InvoiceObject {
    /// The subscription this invoice bills, if it is a subscription invoice.
    pub fn subscription_id(&self) -> Option<&str> {
        let parent = self.parent.as_ref()?;
        if parent.kind != "subscription_details" {
            return None;
        }
        parent
            .subscription_details
            .as_ref()?
            .subscription
            .as_ref()
            .map(Expandable::id)
    }
}
