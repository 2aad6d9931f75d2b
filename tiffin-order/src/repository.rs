use crate::models::{Order, OrderStatus, PaymentStatus, Transaction, TransactionStatus};
use async_trait::async_trait;
use uuid::Uuid;

/// Repository trait for order data access. Implementations must apply
/// status and payment updates under a per-order serialization guarantee
/// (row lock or equivalent) so concurrent lifecycle and payment calls
/// cannot interleave into an inconsistent (status, payment_status) pair.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn create_order(
        &self,
        order: &Order,
    ) -> Result<Uuid, Box<dyn std::error::Error + Send + Sync>>;

    async fn get_order(
        &self,
        id: Uuid,
    ) -> Result<Option<Order>, Box<dyn std::error::Error + Send + Sync>>;

    async fn update_order_status(
        &self,
        id: Uuid,
        status: OrderStatus,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    async fn update_payment_status(
        &self,
        id: Uuid,
        payment_status: PaymentStatus,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    /// Orders for a user, newest first (covers the (user, created_at
    /// desc) index shape)
    async fn list_orders_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<Order>, Box<dyn std::error::Error + Send + Sync>>;

    /// Orders for a partner filtered by status (covers the (partner,
    /// status) index shape)
    async fn list_orders_for_partner(
        &self,
        partner_id: Uuid,
        status: Option<OrderStatus>,
    ) -> Result<Vec<Order>, Box<dyn std::error::Error + Send + Sync>>;
}

/// Repository trait for transaction data access
#[async_trait]
pub trait TransactionRepository: Send + Sync {
    async fn create_transaction(
        &self,
        txn: &Transaction,
    ) -> Result<Uuid, Box<dyn std::error::Error + Send + Sync>>;

    async fn get_transaction(
        &self,
        id: Uuid,
    ) -> Result<Option<Transaction>, Box<dyn std::error::Error + Send + Sync>>;

    async fn update_transaction_status(
        &self,
        id: Uuid,
        status: TransactionStatus,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    async fn list_transactions_for_order(
        &self,
        order_id: Uuid,
    ) -> Result<Vec<Transaction>, Box<dyn std::error::Error + Send + Sync>>;
}
