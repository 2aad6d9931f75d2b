use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::warn;
use uuid::Uuid;

/// A charge registered with the payment gateway for an order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayCharge {
    pub order_ref: String, // Provider's order id (e.g. gw_ord_123)
    pub order_id: Uuid,
    pub amount: i64,
    pub currency: String,
    pub created_at: DateTime<Utc>,
}

/// Seam to the payment provider. The webhook receiver feeding signatures
/// into `verify_signature` lives outside this core.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Register a charge with the provider before collecting payment
    async fn create_charge(
        &self,
        order_id: Uuid,
        amount: i64,
        currency: &str,
    ) -> Result<GatewayCharge, Box<dyn std::error::Error + Send + Sync>>;

    /// Check a callback signature against the order and payment references
    fn verify_signature(&self, order_ref: &str, payment_ref: &str, signature: &str) -> bool;
}

/// Keyed-SHA-256 gateway: signs `order_ref|payment_ref` with a shared
/// secret, mirroring how provider callbacks are verified in production.
pub struct Sha256Gateway {
    secret: String,
}

impl Sha256Gateway {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Compute the signature the provider would attach to a callback.
    /// Exposed so callers can simulate gateway callbacks in tests.
    pub fn sign(&self, order_ref: &str, payment_ref: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.secret.as_bytes());
        hasher.update(b"|");
        hasher.update(order_ref.as_bytes());
        hasher.update(b"|");
        hasher.update(payment_ref.as_bytes());
        hasher
            .finalize()
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect()
    }
}

#[async_trait]
impl PaymentGateway for Sha256Gateway {
    async fn create_charge(
        &self,
        order_id: Uuid,
        amount: i64,
        currency: &str,
    ) -> Result<GatewayCharge, Box<dyn std::error::Error + Send + Sync>> {
        Ok(GatewayCharge {
            order_ref: format!("gw_ord_{}", order_id.simple()),
            order_id,
            amount,
            currency: currency.to_string(),
            created_at: Utc::now(),
        })
    }

    fn verify_signature(&self, order_ref: &str, payment_ref: &str, signature: &str) -> bool {
        let expected = self.sign(order_ref, payment_ref);
        if expected != signature {
            warn!(order_ref, payment_ref, "gateway signature mismatch");
            return false;
        }
        true
    }
}
