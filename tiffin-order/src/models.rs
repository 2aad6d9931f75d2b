use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tiffin_shared::Address;
use uuid::Uuid;

/// Order status in the delivery lifecycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Preparing,
    OutForDelivery,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Delivered and Cancelled are absorbing
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }
}

/// Payment state, independent of the delivery status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
    Refunded,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Cod,
    Online,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    OrderPayment,
    Refund,
    PartnerPayout,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Pending,
    Success,
    Failed,
}

/// An order's embedded reference to a menu item. `unit_price` is the
/// price snapshot taken at placement; later menu edits never touch it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItem {
    pub menu_item_id: Uuid,
    pub quantity: u32,
    pub unit_price: i64,
    pub customizations: Option<String>,
}

impl LineItem {
    pub fn line_total(&self) -> i64 {
        self.unit_price * self.quantity as i64
    }
}

/// Unvalidated order input as assembled at checkout
#[derive(Debug, Clone, Deserialize)]
pub struct OrderDraft {
    pub user_id: Uuid,
    pub partner_id: Uuid,
    pub items: Vec<LineItem>,
    pub subtotal: i64,
    #[serde(default)]
    pub tax: i64,
    #[serde(default)]
    pub delivery_fee: i64,
    #[serde(default)]
    pub discount: i64,
    pub total_amount: i64,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub delivery_address: Address,
    pub estimated_delivery_time: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

/// A purchase. Created once at checkout; only `status`, `payment_status`,
/// the gateway references, delivery timestamps and the post-delivery
/// rating/review ever change afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub partner_id: Uuid,
    pub items: Vec<LineItem>,
    pub subtotal: i64,
    pub tax: i64,
    pub delivery_fee: i64,
    pub discount: i64,
    pub total_amount: i64,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub payment_method: PaymentMethod,
    pub gateway_order_ref: Option<String>,
    pub gateway_payment_ref: Option<String>,
    pub delivery_address: Address,
    pub estimated_delivery_time: Option<DateTime<Utc>>,
    pub actual_delivery_time: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub rating: Option<u8>,
    pub review: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Validate a draft into an order. Enforces what the storage schema
    /// never did: non-empty items, positive quantities and prices,
    /// non-negative charge components, and the total identity
    /// `total_amount == subtotal + tax + delivery_fee - discount`.
    pub fn try_new(draft: OrderDraft) -> Result<Self, OrderError> {
        if draft.items.is_empty() {
            return Err(OrderError::Validation(
                "order must contain at least one item".into(),
            ));
        }
        for item in &draft.items {
            if item.quantity == 0 {
                return Err(OrderError::Validation(format!(
                    "quantity for item {} must be at least 1",
                    item.menu_item_id
                )));
            }
            if item.unit_price <= 0 {
                return Err(OrderError::Validation(format!(
                    "unit price for item {} must be positive",
                    item.menu_item_id
                )));
            }
        }
        if draft.subtotal < 0 || draft.tax < 0 || draft.delivery_fee < 0 || draft.discount < 0 {
            return Err(OrderError::Validation(
                "charge components must be non-negative".into(),
            ));
        }

        let expected = draft.subtotal + draft.tax + draft.delivery_fee - draft.discount;
        if draft.total_amount != expected {
            return Err(OrderError::TotalMismatch {
                expected,
                actual: draft.total_amount,
            });
        }

        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            user_id: draft.user_id,
            partner_id: draft.partner_id,
            items: draft.items,
            subtotal: draft.subtotal,
            tax: draft.tax,
            delivery_fee: draft.delivery_fee,
            discount: draft.discount,
            total_amount: draft.total_amount,
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Pending,
            payment_method: draft.payment_method,
            gateway_order_ref: None,
            gateway_payment_ref: None,
            delivery_address: draft.delivery_address,
            estimated_delivery_time: draft.estimated_delivery_time,
            actual_delivery_time: None,
            notes: draft.notes,
            rating: None,
            review: None,
            created_at: now,
            updated_at: now,
        })
    }
}

/// A financial record tied to one order. Append-only except for
/// `status` moving Pending → Success/Failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub order_id: Uuid,
    pub user_id: Uuid,
    pub partner_id: Uuid,
    pub amount: i64,
    pub tx_type: TransactionType,
    pub status: TransactionStatus,
    pub payment_method: Option<PaymentMethod>,
    pub gateway_order_ref: Option<String>,
    pub gateway_payment_ref: Option<String>,
    pub gateway_signature: Option<String>,
    pub description: Option<String>,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    /// New pending transaction for an order. The user and partner ids
    /// are write-time copies of the order's; they exist for query
    /// convenience and must never be set from anywhere else.
    pub fn for_order(order: &Order, tx_type: TransactionType, amount: i64) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            order_id: order.id,
            user_id: order.user_id,
            partner_id: order.partner_id,
            amount,
            tx_type,
            status: TransactionStatus::Pending,
            payment_method: Some(order.payment_method),
            gateway_order_ref: None,
            gateway_payment_ref: None,
            gateway_signature: None,
            description: None,
            metadata: serde_json::Value::Null,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Total mismatch: expected {expected}, got {actual}")]
    TotalMismatch { expected: i64, actual: i64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(total_amount: i64) -> OrderDraft {
        OrderDraft {
            user_id: Uuid::new_v4(),
            partner_id: Uuid::new_v4(),
            items: vec![LineItem {
                menu_item_id: Uuid::new_v4(),
                quantity: 2,
                unit_price: 100,
                customizations: None,
            }],
            subtotal: 200,
            tax: 10,
            delivery_fee: 20,
            discount: 0,
            total_amount,
            payment_method: PaymentMethod::Online,
            delivery_address: Address::default(),
            estimated_delivery_time: None,
            notes: None,
        }
    }

    #[test]
    fn test_total_identity_holds() {
        let order = Order::try_new(draft(230)).unwrap();

        assert_eq!(order.total_amount, 230);
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.payment_status, PaymentStatus::Pending);
    }

    #[test]
    fn test_total_mismatch_rejected() {
        let result = Order::try_new(draft(240));

        assert!(matches!(
            result,
            Err(OrderError::TotalMismatch {
                expected: 230,
                actual: 240
            })
        ));
    }

    #[test]
    fn test_empty_order_rejected() {
        let mut d = draft(230);
        d.items.clear();

        assert!(matches!(Order::try_new(d), Err(OrderError::Validation(_))));
    }

    #[test]
    fn test_zero_quantity_rejected() {
        let mut d = draft(230);
        d.items[0].quantity = 0;

        assert!(matches!(Order::try_new(d), Err(OrderError::Validation(_))));
    }

    #[test]
    fn test_transaction_copies_order_parties() {
        let order = Order::try_new(draft(230)).unwrap();
        let txn = Transaction::for_order(&order, TransactionType::OrderPayment, 230);

        assert_eq!(txn.order_id, order.id);
        assert_eq!(txn.user_id, order.user_id);
        assert_eq!(txn.partner_id, order.partner_id);
        assert_eq!(txn.status, TransactionStatus::Pending);
    }
}
