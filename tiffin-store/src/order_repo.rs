use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tiffin_core::CoreError;
use tiffin_order::models::{
    LineItem, Order, OrderStatus, PaymentMethod, PaymentStatus, Transaction, TransactionStatus,
    TransactionType,
};
use tiffin_order::repository::{OrderRepository, TransactionRepository};
use tracing::info;
use uuid::Uuid;

type RepoError = Box<dyn std::error::Error + Send + Sync>;

pub struct StoreOrderRepository {
    pool: PgPool,
}

impl StoreOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Internal structs for type-safe querying
#[derive(sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    user_id: Uuid,
    partner_id: Uuid,
    subtotal: i64,
    tax: i64,
    delivery_fee: i64,
    discount: i64,
    total_amount: i64,
    status: String,
    payment_status: String,
    payment_method: String,
    gateway_order_ref: Option<String>,
    gateway_payment_ref: Option<String>,
    delivery_address: serde_json::Value,
    estimated_delivery_time: Option<DateTime<Utc>>,
    actual_delivery_time: Option<DateTime<Utc>>,
    notes: Option<String>,
    rating: Option<i16>,
    review: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct OrderItemRow {
    menu_item_id: Uuid,
    quantity: i32,
    unit_price: i64,
    customizations: Option<String>,
}

const SELECT_ORDER: &str = "SELECT id, user_id, partner_id, subtotal, tax, delivery_fee, \
     discount, total_amount, status, payment_status, payment_method, gateway_order_ref, \
     gateway_payment_ref, delivery_address, estimated_delivery_time, actual_delivery_time, \
     notes, rating, review, created_at, updated_at FROM orders";

impl OrderRow {
    fn into_order(self, items: Vec<OrderItemRow>) -> Result<Order, RepoError> {
        Ok(Order {
            id: self.id,
            user_id: self.user_id,
            partner_id: self.partner_id,
            items: items
                .into_iter()
                .map(|row| LineItem {
                    menu_item_id: row.menu_item_id,
                    quantity: row.quantity as u32,
                    unit_price: row.unit_price,
                    customizations: row.customizations,
                })
                .collect(),
            subtotal: self.subtotal,
            tax: self.tax,
            delivery_fee: self.delivery_fee,
            discount: self.discount,
            total_amount: self.total_amount,
            status: parse_order_status(&self.status)?,
            payment_status: parse_payment_status(&self.payment_status)?,
            payment_method: parse_payment_method(&self.payment_method)?,
            gateway_order_ref: self.gateway_order_ref,
            gateway_payment_ref: self.gateway_payment_ref,
            delivery_address: serde_json::from_value(self.delivery_address)?,
            estimated_delivery_time: self.estimated_delivery_time,
            actual_delivery_time: self.actual_delivery_time,
            notes: self.notes,
            rating: self.rating.map(|r| r as u8),
            review: self.review,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[async_trait]
impl OrderRepository for StoreOrderRepository {
    async fn create_order(&self, order: &Order) -> Result<Uuid, RepoError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO orders (id, user_id, partner_id, subtotal, tax, delivery_fee, \
             discount, total_amount, status, payment_status, payment_method, \
             gateway_order_ref, gateway_payment_ref, delivery_address, \
             estimated_delivery_time, actual_delivery_time, notes, rating, review, \
             created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, \
             $16, $17, $18, $19, $20, $21)",
        )
        .bind(order.id)
        .bind(order.user_id)
        .bind(order.partner_id)
        .bind(order.subtotal)
        .bind(order.tax)
        .bind(order.delivery_fee)
        .bind(order.discount)
        .bind(order.total_amount)
        .bind(order_status_str(order.status))
        .bind(payment_status_str(order.payment_status))
        .bind(payment_method_str(order.payment_method))
        .bind(order.gateway_order_ref.as_deref())
        .bind(order.gateway_payment_ref.as_deref())
        .bind(serde_json::to_value(&order.delivery_address)?)
        .bind(order.estimated_delivery_time)
        .bind(order.actual_delivery_time)
        .bind(order.notes.as_deref())
        .bind(order.rating.map(|r| r as i16))
        .bind(order.review.as_deref())
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *tx)
        .await?;

        for item in &order.items {
            sqlx::query(
                "INSERT INTO order_items (id, order_id, menu_item_id, quantity, unit_price, \
                 customizations) VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(Uuid::new_v4())
            .bind(order.id)
            .bind(item.menu_item_id)
            .bind(item.quantity as i32)
            .bind(item.unit_price)
            .bind(item.customizations.as_deref())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        info!(order_id = %order.id, "order persisted");
        Ok(order.id)
    }

    async fn get_order(&self, id: Uuid) -> Result<Option<Order>, RepoError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!("{} WHERE id = $1", SELECT_ORDER))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let items = sqlx::query_as::<_, OrderItemRow>(
                    "SELECT menu_item_id, quantity, unit_price, customizations \
                     FROM order_items WHERE order_id = $1",
                )
                .bind(id)
                .fetch_all(&self.pool)
                .await?;
                Ok(Some(row.into_order(items)?))
            }
            None => Ok(None),
        }
    }

    // The row lock serializes concurrent status and payment updates for
    // the same order.
    async fn update_order_status(&self, id: Uuid, status: OrderStatus) -> Result<(), RepoError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("SELECT id FROM orders WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| CoreError::ReferentialIntegrityError(format!("order {}", id)))?;

        sqlx::query("UPDATE orders SET status = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(order_status_str(status))
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn update_payment_status(
        &self,
        id: Uuid,
        payment_status: PaymentStatus,
    ) -> Result<(), RepoError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("SELECT id FROM orders WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| CoreError::ReferentialIntegrityError(format!("order {}", id)))?;

        sqlx::query("UPDATE orders SET payment_status = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(payment_status_str(payment_status))
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn list_orders_for_user(&self, user_id: Uuid) -> Result<Vec<Order>, RepoError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "{} WHERE user_id = $1 ORDER BY created_at DESC",
            SELECT_ORDER
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        self.hydrate_orders(rows).await
    }

    async fn list_orders_for_partner(
        &self,
        partner_id: Uuid,
        status: Option<OrderStatus>,
    ) -> Result<Vec<Order>, RepoError> {
        let rows = match status {
            Some(status) => {
                sqlx::query_as::<_, OrderRow>(&format!(
                    "{} WHERE partner_id = $1 AND status = $2 ORDER BY created_at DESC",
                    SELECT_ORDER
                ))
                .bind(partner_id)
                .bind(order_status_str(status))
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, OrderRow>(&format!(
                    "{} WHERE partner_id = $1 ORDER BY created_at DESC",
                    SELECT_ORDER
                ))
                .bind(partner_id)
                .fetch_all(&self.pool)
                .await?
            }
        };

        self.hydrate_orders(rows).await
    }
}

impl StoreOrderRepository {
    async fn hydrate_orders(&self, rows: Vec<OrderRow>) -> Result<Vec<Order>, RepoError> {
        let mut orders = Vec::with_capacity(rows.len());
        for row in rows {
            let items = sqlx::query_as::<_, OrderItemRow>(
                "SELECT menu_item_id, quantity, unit_price, customizations \
                 FROM order_items WHERE order_id = $1",
            )
            .bind(row.id)
            .fetch_all(&self.pool)
            .await?;
            orders.push(row.into_order(items)?);
        }
        Ok(orders)
    }
}

pub struct StoreTransactionRepository {
    pool: PgPool,
}

impl StoreTransactionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct TransactionRow {
    id: Uuid,
    order_id: Uuid,
    user_id: Uuid,
    partner_id: Uuid,
    amount: i64,
    tx_type: String,
    status: String,
    payment_method: Option<String>,
    gateway_order_ref: Option<String>,
    gateway_payment_ref: Option<String>,
    gateway_signature: Option<String>,
    description: Option<String>,
    metadata: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

const SELECT_TRANSACTION: &str = "SELECT id, order_id, user_id, partner_id, amount, tx_type, \
     status, payment_method, gateway_order_ref, gateway_payment_ref, gateway_signature, \
     description, metadata, created_at, updated_at FROM transactions";

impl TransactionRow {
    fn into_transaction(self) -> Result<Transaction, RepoError> {
        Ok(Transaction {
            id: self.id,
            order_id: self.order_id,
            user_id: self.user_id,
            partner_id: self.partner_id,
            amount: self.amount,
            tx_type: parse_tx_type(&self.tx_type)?,
            status: parse_tx_status(&self.status)?,
            payment_method: self
                .payment_method
                .as_deref()
                .map(parse_payment_method)
                .transpose()?,
            gateway_order_ref: self.gateway_order_ref,
            gateway_payment_ref: self.gateway_payment_ref,
            gateway_signature: self.gateway_signature,
            description: self.description,
            metadata: self.metadata,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[async_trait]
impl TransactionRepository for StoreTransactionRepository {
    async fn create_transaction(&self, txn: &Transaction) -> Result<Uuid, RepoError> {
        sqlx::query(
            "INSERT INTO transactions (id, order_id, user_id, partner_id, amount, tx_type, \
             status, payment_method, gateway_order_ref, gateway_payment_ref, \
             gateway_signature, description, metadata, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)",
        )
        .bind(txn.id)
        .bind(txn.order_id)
        .bind(txn.user_id)
        .bind(txn.partner_id)
        .bind(txn.amount)
        .bind(tx_type_str(txn.tx_type))
        .bind(tx_status_str(txn.status))
        .bind(txn.payment_method.map(payment_method_str))
        .bind(txn.gateway_order_ref.as_deref())
        .bind(txn.gateway_payment_ref.as_deref())
        .bind(txn.gateway_signature.as_deref())
        .bind(txn.description.as_deref())
        .bind(&txn.metadata)
        .bind(txn.created_at)
        .bind(txn.updated_at)
        .execute(&self.pool)
        .await?;

        info!(transaction_id = %txn.id, order_id = %txn.order_id, "transaction persisted");
        Ok(txn.id)
    }

    async fn get_transaction(&self, id: Uuid) -> Result<Option<Transaction>, RepoError> {
        let row =
            sqlx::query_as::<_, TransactionRow>(&format!("{} WHERE id = $1", SELECT_TRANSACTION))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(TransactionRow::into_transaction).transpose()
    }

    async fn update_transaction_status(
        &self,
        id: Uuid,
        status: TransactionStatus,
    ) -> Result<(), RepoError> {
        let result =
            sqlx::query("UPDATE transactions SET status = $2, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .bind(tx_status_str(status))
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::ReferentialIntegrityError(format!("transaction {}", id)).into());
        }
        Ok(())
    }

    async fn list_transactions_for_order(
        &self,
        order_id: Uuid,
    ) -> Result<Vec<Transaction>, RepoError> {
        let rows = sqlx::query_as::<_, TransactionRow>(&format!(
            "{} WHERE order_id = $1 ORDER BY created_at ASC",
            SELECT_TRANSACTION
        ))
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(TransactionRow::into_transaction)
            .collect()
    }
}

fn order_status_str(status: OrderStatus) -> &'static str {
    match status {
        OrderStatus::Pending => "PENDING",
        OrderStatus::Confirmed => "CONFIRMED",
        OrderStatus::Preparing => "PREPARING",
        OrderStatus::OutForDelivery => "OUT_FOR_DELIVERY",
        OrderStatus::Delivered => "DELIVERED",
        OrderStatus::Cancelled => "CANCELLED",
    }
}

fn parse_order_status(s: &str) -> Result<OrderStatus, RepoError> {
    match s {
        "PENDING" => Ok(OrderStatus::Pending),
        "CONFIRMED" => Ok(OrderStatus::Confirmed),
        "PREPARING" => Ok(OrderStatus::Preparing),
        "OUT_FOR_DELIVERY" => Ok(OrderStatus::OutForDelivery),
        "DELIVERED" => Ok(OrderStatus::Delivered),
        "CANCELLED" => Ok(OrderStatus::Cancelled),
        other => Err(CoreError::InternalError(format!("unknown order status: {}", other)).into()),
    }
}

fn payment_status_str(status: PaymentStatus) -> &'static str {
    match status {
        PaymentStatus::Pending => "PENDING",
        PaymentStatus::Completed => "COMPLETED",
        PaymentStatus::Failed => "FAILED",
        PaymentStatus::Refunded => "REFUNDED",
    }
}

fn parse_payment_status(s: &str) -> Result<PaymentStatus, RepoError> {
    match s {
        "PENDING" => Ok(PaymentStatus::Pending),
        "COMPLETED" => Ok(PaymentStatus::Completed),
        "FAILED" => Ok(PaymentStatus::Failed),
        "REFUNDED" => Ok(PaymentStatus::Refunded),
        other => Err(CoreError::InternalError(format!("unknown payment status: {}", other)).into()),
    }
}

fn payment_method_str(method: PaymentMethod) -> &'static str {
    match method {
        PaymentMethod::Cod => "COD",
        PaymentMethod::Online => "ONLINE",
    }
}

fn parse_payment_method(s: &str) -> Result<PaymentMethod, RepoError> {
    match s {
        "COD" => Ok(PaymentMethod::Cod),
        "ONLINE" => Ok(PaymentMethod::Online),
        other => Err(CoreError::InternalError(format!("unknown payment method: {}", other)).into()),
    }
}

fn tx_type_str(tx_type: TransactionType) -> &'static str {
    match tx_type {
        TransactionType::OrderPayment => "ORDER_PAYMENT",
        TransactionType::Refund => "REFUND",
        TransactionType::PartnerPayout => "PARTNER_PAYOUT",
    }
}

fn parse_tx_type(s: &str) -> Result<TransactionType, RepoError> {
    match s {
        "ORDER_PAYMENT" => Ok(TransactionType::OrderPayment),
        "REFUND" => Ok(TransactionType::Refund),
        "PARTNER_PAYOUT" => Ok(TransactionType::PartnerPayout),
        other => {
            Err(CoreError::InternalError(format!("unknown transaction type: {}", other)).into())
        }
    }
}

fn tx_status_str(status: TransactionStatus) -> &'static str {
    match status {
        TransactionStatus::Pending => "PENDING",
        TransactionStatus::Success => "SUCCESS",
        TransactionStatus::Failed => "FAILED",
    }
}

fn parse_tx_status(s: &str) -> Result<TransactionStatus, RepoError> {
    match s {
        "PENDING" => Ok(TransactionStatus::Pending),
        "SUCCESS" => Ok(TransactionStatus::Success),
        "FAILED" => Ok(TransactionStatus::Failed),
        other => {
            Err(CoreError::InternalError(format!("unknown transaction status: {}", other)).into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_db_value_surfaces_as_core_error() {
        let err = parse_order_status("SHIPPED").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CoreError>(),
            Some(CoreError::InternalError(_))
        ));

        let err = parse_tx_type("CHARGEBACK").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CoreError>(),
            Some(CoreError::InternalError(_))
        ));
    }

    #[test]
    fn test_status_strings_round_trip() {
        for status in [
            tiffin_order::OrderStatus::Pending,
            tiffin_order::OrderStatus::Confirmed,
            tiffin_order::OrderStatus::Preparing,
            tiffin_order::OrderStatus::OutForDelivery,
            tiffin_order::OrderStatus::Delivered,
            tiffin_order::OrderStatus::Cancelled,
        ] {
            assert_eq!(parse_order_status(order_status_str(status)).unwrap(), status);
        }
    }
}
