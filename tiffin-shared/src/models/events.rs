use uuid::Uuid;

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct OrderPlacedEvent {
    pub order_id: Uuid,
    pub user_id: Uuid,
    pub partner_id: Uuid,
    pub total_amount: i64,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct OrderStatusChangedEvent {
    pub order_id: Uuid,
    pub from: String,
    pub to: String,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct PaymentConfirmedEvent {
    pub order_id: Uuid,
    pub transaction_id: Uuid,
    pub amount: i64,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct RefundIssuedEvent {
    pub order_id: Uuid,
    pub transaction_id: Uuid,
    pub amount: i64,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct PayoutRecordedEvent {
    pub order_id: Uuid,
    pub partner_id: Uuid,
    pub net_amount: i64,
    pub timestamp: i64,
}
