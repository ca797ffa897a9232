//! Subscription billing: checkout, cancellation and the provider webhook.
//!
//! The payment provider is the source of truth. This service only starts
//! checkouts, forwards cancellations and mirrors provider events into the
//! subscriptions table.

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use casework_types::error::BillingError;
use casework_types::subscription::{
    CancelSubscriptionRequest, CheckoutSession, CreateCheckoutRequest, Plan, Subscription,
    SubscriptionStatus, SubscriptionSync,
};
use casework_types::user::{User, UserId};
use casework_types::webhook::{
    CheckoutSessionObject, InvoiceObject, SubscriptionObject, WebhookEvent,
};

use crate::repository::subscription::SubscriptionRepository;

/// Parameters for a hosted subscription checkout.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutParams {
    pub customer_id: String,
    pub price_id: String,
    pub user_id: UserId,
    pub success_url: String,
    pub cancel_url: String,
}

/// Abstraction over the payment provider's API.
///
/// The `StripeGateway` adapter lives in casework-infra.
pub trait BillingGateway: Send + Sync {
    /// Create a provider customer tagged with our user id. Returns its id.
    fn create_customer(
        &self,
        user_id: &UserId,
        email: Option<&str>,
    ) -> impl std::future::Future<Output = Result<String, BillingError>> + Send;

    fn create_checkout_session(
        &self,
        params: &CheckoutParams,
    ) -> impl std::future::Future<Output = Result<CheckoutSession, BillingError>> + Send;

    fn cancel_subscription(
        &self,
        subscription_id: &str,
    ) -> impl std::future::Future<Output = Result<(), BillingError>> + Send;

    /// Verify a webhook signature and decode the event.
    fn construct_event(&self, payload: &str, signature: &str) -> Result<WebhookEvent, BillingError>;
}

/// Orchestrates billing flows over a gateway and the subscription mirror.
///
/// `gateway` and `price_id` are optional; without them every billing call
/// fails with `BillingError::NotConfigured`.
pub struct BillingService<S: SubscriptionRepository, G: BillingGateway> {
    subscriptions: S,
    gateway: Option<G>,
    price_id: Option<String>,
    public_url: String,
}

impl<S: SubscriptionRepository, G: BillingGateway> BillingService<S, G> {
    pub fn new(
        subscriptions: S,
        gateway: Option<G>,
        price_id: Option<String>,
        public_url: String,
    ) -> Self {
        Self {
            subscriptions,
            gateway,
            price_id,
            public_url,
        }
    }

    fn gateway(&self) -> Result<&G, BillingError> {
        self.gateway.as_ref().ok_or(BillingError::NotConfigured)
    }

    /// The caller's subscription, creating the free row if it is missing.
    pub async fn subscription(&self, user_id: &UserId) -> Result<Subscription, BillingError> {
        if let Some(existing) = self.subscriptions.get_by_user(user_id).await? {
            return Ok(existing);
        }
        let row = Subscription::free(*user_id);
        self.subscriptions.create(&row).await?;
        Ok(row)
    }

    /// Start a hosted checkout for the Pro plan.
    ///
    /// `origin` is the request's `Origin` header; redirects fall back to the
    /// configured public URL.
    pub async fn create_checkout(
        &self,
        user: &User,
        request: &CreateCheckoutRequest,
        origin: Option<&str>,
    ) -> Result<CheckoutSession, BillingError> {
        let gateway = self.gateway()?;
        let price_id = self.price_id.as_deref().ok_or(BillingError::NotConfigured)?;

        let requested: UserId = request
            .user_id
            .parse()
            .map_err(|_| BillingError::InvalidRequest("userId must be a UUID".to_string()))?;
        if request.price_id != price_id {
            return Err(BillingError::InvalidPrice);
        }
        if requested != user.id {
            warn!(user_id = %user.id, requested = %requested, "checkout for another user refused");
            return Err(BillingError::Forbidden);
        }

        let subscription = self.subscription(&user.id).await?;
        let customer_id = match subscription.stripe_customer_id {
            Some(id) => id,
            None => {
                let id = gateway.create_customer(&user.id, user.email.as_deref()).await?;
                self.subscriptions.set_customer(&user.id, &id).await?;
                info!(user_id = %user.id, customer_id = %id, "billing customer created");
                id
            }
        };

        let base = origin
            .filter(|o| !o.is_empty())
            .unwrap_or(self.public_url.as_str())
            .trim_end_matches('/');
        let params = CheckoutParams {
            customer_id,
            price_id: price_id.to_string(),
            user_id: user.id,
            success_url: format!("{base}/pricing?success=true"),
            cancel_url: format!("{base}/pricing?canceled=true"),
        };

        let session = gateway.create_checkout_session(&params).await?;
        info!(user_id = %user.id, session_id = %session.id, "checkout session created");
        Ok(session)
    }

    /// Cancel the caller's provider subscription.
    pub async fn cancel(
        &self,
        user_id: &UserId,
        request: &CancelSubscriptionRequest,
    ) -> Result<(), BillingError> {
        let gateway = self.gateway()?;

        let subscription = self
            .subscriptions
            .get_by_user(user_id)
            .await?
            .filter(|s| s.stripe_subscription_id.as_deref() == Some(request.subscription_id.as_str()))
            .ok_or(BillingError::SubscriptionNotFound)?;

        gateway.cancel_subscription(&request.subscription_id).await?;
        self.subscriptions
            .set_status(&subscription.user_id, SubscriptionStatus::Canceled)
            .await?;

        info!(%user_id, subscription_id = %request.subscription_id, "subscription canceled");
        Ok(())
    }

    /// Verify and apply a provider webhook.
    ///
    /// Events we do not mirror are acknowledged and ignored.
    pub async fn handle_webhook(&self, payload: &str, signature: &str) -> Result<(), BillingError> {
        let event = self.gateway()?.construct_event(payload, signature)?;
        info!(event_id = %event.id, event_type = %event.kind, "billing webhook received");
        self.apply_event(&event).await
    }

    /// Apply an already-verified event to the subscription mirror.
    pub async fn apply_event(&self, event: &WebhookEvent) -> Result<(), BillingError> {
        match event.kind.as_str() {
            "checkout.session.completed" => {
                self.on_checkout_completed(decode(event)?).await
            }
            "customer.subscription.created" | "customer.subscription.updated" => {
                self.on_subscription_updated(decode(event)?).await
            }
            "customer.subscription.deleted" => {
                self.on_subscription_deleted(decode(event)?).await
            }
            "invoice.payment_succeeded" => {
                self.on_invoice(decode(event)?, SubscriptionStatus::Active).await
            }
            "invoice.payment_failed" => {
                self.on_invoice(decode(event)?, SubscriptionStatus::PastDue).await
            }
            other => {
                info!(event_type = other, "unhandled billing webhook event");
                Ok(())
            }
        }
    }

    async fn on_checkout_completed(&self, session: CheckoutSessionObject) -> Result<(), BillingError> {
        let Some(user_id) = session.metadata.get("user_id") else {
            warn!("checkout session without user_id metadata");
            return Ok(());
        };
        let Ok(user_id) = user_id.parse::<UserId>() else {
            warn!(user_id = %user_id, "checkout session with malformed user_id");
            return Ok(());
        };
        if let Some(serde_json::Value::String(subscription_id)) = &session.subscription {
            self.subscriptions
                .link_subscription(&user_id, subscription_id)
                .await
                .or_else(ignore_missing)?;
            info!(%user_id, %subscription_id, "checkout completed");
        }
        Ok(())
    }

    async fn on_subscription_updated(&self, object: SubscriptionObject) -> Result<(), BillingError> {
        let Some(customer_id) = object.customer.as_ref().map(|c| c.id().to_string()) else {
            warn!(subscription_id = %object.id, "subscription event without customer");
            return Ok(());
        };
        let Some(row) = self.subscriptions.get_by_customer(&customer_id).await? else {
            warn!(%customer_id, "no subscription row for customer");
            return Ok(());
        };
        let Ok(status) = object.status.parse::<SubscriptionStatus>() else {
            warn!(%customer_id, status = %object.status, "unknown provider subscription status");
            return Ok(());
        };

        let item = object.items.data.first();
        let sync = SubscriptionSync {
            plan: if status == SubscriptionStatus::Active { Plan::Pro } else { Plan::Free },
            status,
            stripe_subscription_id: object.id.clone(),
            stripe_price_id: item.and_then(|i| i.price.as_ref()).map(|p| p.id.clone()),
            current_period_start: item.and_then(|i| i.current_period_start).and_then(from_unix),
            current_period_end: item.and_then(|i| i.current_period_end).and_then(from_unix),
        };

        self.subscriptions.sync(&row.user_id, &sync).await?;
        info!(user_id = %row.user_id, plan = %sync.plan, %status, "subscription synced");
        Ok(())
    }

    async fn on_subscription_deleted(&self, object: SubscriptionObject) -> Result<(), BillingError> {
        let Some(customer_id) = object.customer.as_ref().map(|c| c.id().to_string()) else {
            warn!(subscription_id = %object.id, "subscription event without customer");
            return Ok(());
        };
        let period_end = object.current_period_end.and_then(from_unix);
        self.subscriptions
            .cancel_by_customer(&customer_id, period_end)
            .await
            .or_else(ignore_missing)?;
        info!(%customer_id, "subscription deleted, downgraded to free");
        Ok(())
    }

    async fn on_invoice(
        &self,
        invoice: InvoiceObject,
        status: SubscriptionStatus,
    ) -> Result<(), BillingError> {
        if invoice.subscription_id().is_none() {
            return Ok(());
        }
        let Some(customer) = invoice.customer.as_ref() else {
            warn!("invoice event without customer");
            return Ok(());
        };
        self.subscriptions
            .set_status_by_customer(customer.id(), status)
            .await
            .or_else(ignore_missing)?;
        info!(customer_id = %customer.id(), %status, "invoice applied");
        Ok(())
    }
}

fn decode<T: serde::de::DeserializeOwned>(event: &WebhookEvent) -> Result<T, BillingError> {
    serde_json::from_value(event.data.object.clone())
        .map_err(|e| BillingError::InvalidPayload(format!("{}: {e}", event.kind)))
}

fn from_unix(secs: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0)
}

/// Webhooks for rows we do not have are acknowledged, not retried.
fn ignore_missing(err: casework_types::error::RepositoryError) -> Result<(), BillingError> {
    match err {
        casework_types::error::RepositoryError::NotFound => {
            warn!("billing webhook matched no subscription row");
            Ok(())
        }
        other => Err(other.into()),
    }
}
