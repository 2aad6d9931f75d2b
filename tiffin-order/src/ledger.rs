use crate::models::{
    Order, OrderStatus, PaymentMethod, PaymentStatus, Transaction, TransactionStatus,
    TransactionType,
};
use crate::settlement;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tiffin_catalog::Partner;
use tiffin_core::payment::PaymentGateway;
use tiffin_shared::models::events::{PaymentConfirmedEvent, PayoutRecordedEvent, RefundIssuedEvent};
use uuid::Uuid;

/// Financial events raised by ledger operations
#[derive(Debug, Clone)]
pub enum LedgerEvent {
    PaymentConfirmed(PaymentConfirmedEvent),
    RefundIssued(RefundIssuedEvent),
    PayoutRecorded(PayoutRecordedEvent),
}

/// Keeps `Order.payment_status` and the order's transactions from ever
/// diverging. Transactions are append-only; only their status moves
/// Pending → Success/Failed. Operations are idempotent keyed on
/// (order id, transaction type): a Failed attempt may be retried with a
/// fresh transaction, anything else is a duplicate.
pub struct PaymentLedger {
    gateway: Arc<dyn PaymentGateway>,
    transactions: HashMap<Uuid, Transaction>,
    by_order_type: HashMap<(Uuid, TransactionType), Uuid>,
    events: Vec<LedgerEvent>,
}

impl PaymentLedger {
    pub fn new(gateway: Arc<dyn PaymentGateway>) -> Self {
        Self {
            gateway,
            transactions: HashMap::new(),
            by_order_type: HashMap::new(),
            events: Vec::new(),
        }
    }

    /// Open a payment for an order. The amount must match the order
    /// total exactly; an existing non-Failed payment transaction for the
    /// order makes this a duplicate charge attempt.
    pub async fn record_payment(
        &mut self,
        order: &mut Order,
        amount: i64,
        method: PaymentMethod,
    ) -> Result<Uuid, LedgerError> {
        if amount != order.total_amount {
            return Err(LedgerError::AmountMismatch {
                expected: order.total_amount,
                actual: amount,
            });
        }
        if method != order.payment_method {
            return Err(LedgerError::MethodMismatch(order.id.to_string()));
        }
        self.ensure_no_live_transaction(order.id, TransactionType::OrderPayment)?;

        let mut txn = Transaction::for_order(order, TransactionType::OrderPayment, amount);

        if method == PaymentMethod::Online {
            let charge = self
                .gateway
                .create_charge(order.id, amount, "INR")
                .await
                .map_err(|e| LedgerError::Gateway(e.to_string()))?;
            order.gateway_order_ref = Some(charge.order_ref.clone());
            order.updated_at = Utc::now();
            txn.gateway_order_ref = Some(charge.order_ref);
        }

        Ok(self.insert(txn))
    }

    /// Apply a gateway callback to a pending payment transaction. A
    /// valid signature completes the payment; an invalid one fails both
    /// the transaction and the order's payment, so the caller must not
    /// advance the order past Confirmed.
    pub fn confirm_payment(
        &mut self,
        order: &mut Order,
        transaction_id: Uuid,
        payment_ref: &str,
        signature: &str,
    ) -> Result<TransactionStatus, LedgerError> {
        let txn = self
            .transactions
            .get_mut(&transaction_id)
            .filter(|t| t.order_id == order.id && t.tx_type == TransactionType::OrderPayment)
            .ok_or_else(|| LedgerError::TransactionNotFound(transaction_id.to_string()))?;
        if txn.status != TransactionStatus::Pending {
            return Err(LedgerError::AlreadySettled(transaction_id.to_string()));
        }
        let order_ref = txn
            .gateway_order_ref
            .clone()
            .ok_or_else(|| LedgerError::MissingGatewayRef(transaction_id.to_string()))?;

        let now = Utc::now();
        if self.gateway.verify_signature(&order_ref, payment_ref, signature) {
            txn.status = TransactionStatus::Success;
            txn.gateway_payment_ref = Some(payment_ref.to_string());
            txn.gateway_signature = Some(signature.to_string());
            txn.updated_at = now;
            order.payment_status = PaymentStatus::Completed;
            order.gateway_payment_ref = Some(payment_ref.to_string());
            order.updated_at = now;
            self.events.push(LedgerEvent::PaymentConfirmed(PaymentConfirmedEvent {
                order_id: order.id,
                transaction_id,
                amount: order.total_amount,
                timestamp: now.timestamp(),
            }));
            Ok(TransactionStatus::Success)
        } else {
            txn.status = TransactionStatus::Failed;
            txn.updated_at = now;
            order.payment_status = PaymentStatus::Failed;
            order.updated_at = now;
            Ok(TransactionStatus::Failed)
        }
    }

    /// Settle a cash-on-delivery collection at handover. Marks the
    /// pending payment transaction Success, or records one if the COD
    /// order never had a payment opened up front.
    pub fn settle_cod(&mut self, order: &mut Order) -> Result<Uuid, LedgerError> {
        if order.payment_method != PaymentMethod::Cod {
            return Err(LedgerError::MethodMismatch(order.id.to_string()));
        }
        if order.status != OrderStatus::Delivered {
            return Err(LedgerError::NotDelivered(order.id.to_string()));
        }
        if matches!(
            order.payment_status,
            PaymentStatus::Completed | PaymentStatus::Refunded
        ) {
            return Err(LedgerError::AlreadySettled(order.id.to_string()));
        }

        let now = Utc::now();
        let id = match self.live_transaction(order.id, TransactionType::OrderPayment) {
            Some(id) => {
                if let Some(txn) = self.transactions.get_mut(&id) {
                    txn.status = TransactionStatus::Success;
                    txn.updated_at = now;
                }
                id
            }
            None => {
                let mut txn =
                    Transaction::for_order(order, TransactionType::OrderPayment, order.total_amount);
                txn.status = TransactionStatus::Success;
                txn.description = Some("Cash collected on delivery".to_string());
                self.insert(txn)
            }
        };

        order.payment_status = PaymentStatus::Completed;
        order.updated_at = now;
        self.events.push(LedgerEvent::PaymentConfirmed(PaymentConfirmedEvent {
            order_id: order.id,
            transaction_id: id,
            amount: order.total_amount,
            timestamp: now.timestamp(),
        }));
        Ok(id)
    }

    /// Open a full refund. Only a captured payment can be refunded;
    /// partial refunds are not supported.
    pub fn refund(&mut self, order: &mut Order) -> Result<Uuid, LedgerError> {
        if order.payment_status != PaymentStatus::Completed {
            return Err(LedgerError::RefundNotAllowed(format!(
                "{:?}",
                order.payment_status
            )));
        }
        self.ensure_no_live_transaction(order.id, TransactionType::Refund)?;

        let mut txn = Transaction::for_order(order, TransactionType::Refund, order.total_amount);
        txn.gateway_order_ref = order.gateway_order_ref.clone();
        txn.gateway_payment_ref = order.gateway_payment_ref.clone();
        txn.description = Some(format!("Full refund for order {}", order.id));
        Ok(self.insert(txn))
    }

    /// Resolve a pending refund once the gateway reports back. Success
    /// flips the order's payment status to Refunded.
    pub fn settle_refund(
        &mut self,
        order: &mut Order,
        transaction_id: Uuid,
        succeeded: bool,
    ) -> Result<(), LedgerError> {
        let txn = self
            .transactions
            .get_mut(&transaction_id)
            .filter(|t| t.order_id == order.id && t.tx_type == TransactionType::Refund)
            .ok_or_else(|| LedgerError::TransactionNotFound(transaction_id.to_string()))?;
        if txn.status != TransactionStatus::Pending {
            return Err(LedgerError::AlreadySettled(transaction_id.to_string()));
        }

        let now = Utc::now();
        if succeeded {
            txn.status = TransactionStatus::Success;
            txn.updated_at = now;
            order.payment_status = PaymentStatus::Refunded;
            order.updated_at = now;
            self.events.push(LedgerEvent::RefundIssued(RefundIssuedEvent {
                order_id: order.id,
                transaction_id,
                amount: txn.amount,
                timestamp: now.timestamp(),
            }));
        } else {
            txn.status = TransactionStatus::Failed;
            txn.updated_at = now;
        }
        Ok(())
    }

    /// Open the partner payout for a delivered, fully paid order. The
    /// payout nets out the platform commission; one payout per order.
    pub fn record_payout(
        &mut self,
        order: &Order,
        partner: &Partner,
    ) -> Result<Uuid, LedgerError> {
        if order.status != OrderStatus::Delivered
            || order.payment_status != PaymentStatus::Completed
        {
            return Err(LedgerError::PayoutNotAllowed(order.id.to_string()));
        }
        self.ensure_no_live_transaction(order.id, TransactionType::PartnerPayout)?;

        let net = settlement::net_payout(order.total_amount, partner.commission);
        let mut txn = Transaction::for_order(order, TransactionType::PartnerPayout, net);
        txn.payment_method = None;
        txn.description = Some(format!(
            "Payout to {} ({}% commission withheld)",
            partner.name, partner.commission
        ));
        Ok(self.insert(txn))
    }

    /// Resolve a pending payout transfer
    pub fn settle_payout(&mut self, transaction_id: Uuid, succeeded: bool) -> Result<(), LedgerError> {
        let txn = self
            .transactions
            .get_mut(&transaction_id)
            .filter(|t| t.tx_type == TransactionType::PartnerPayout)
            .ok_or_else(|| LedgerError::TransactionNotFound(transaction_id.to_string()))?;
        if txn.status != TransactionStatus::Pending {
            return Err(LedgerError::AlreadySettled(transaction_id.to_string()));
        }

        let now = Utc::now();
        txn.status = if succeeded {
            TransactionStatus::Success
        } else {
            TransactionStatus::Failed
        };
        txn.updated_at = now;
        if succeeded {
            self.events.push(LedgerEvent::PayoutRecorded(PayoutRecordedEvent {
                order_id: txn.order_id,
                partner_id: txn.partner_id,
                net_amount: txn.amount,
                timestamp: now.timestamp(),
            }));
        }
        Ok(())
    }

    pub fn transaction(&self, id: &Uuid) -> Option<&Transaction> {
        self.transactions.get(id)
    }

    /// All transactions recorded for an order, oldest first
    pub fn transactions_for_order(&self, order_id: &Uuid) -> Vec<&Transaction> {
        let mut txns: Vec<&Transaction> = self
            .transactions
            .values()
            .filter(|t| t.order_id == *order_id)
            .collect();
        txns.sort_by_key(|t| t.created_at);
        txns
    }

    /// Drain buffered financial events for publishing
    pub fn drain_events(&mut self) -> Vec<LedgerEvent> {
        std::mem::take(&mut self.events)
    }

    /// The current non-Failed transaction of a type for an order, if any
    fn live_transaction(&self, order_id: Uuid, tx_type: TransactionType) -> Option<Uuid> {
        self.by_order_type
            .get(&(order_id, tx_type))
            .filter(|id| {
                self.transactions
                    .get(id)
                    .map(|t| t.status != TransactionStatus::Failed)
                    .unwrap_or(false)
            })
            .copied()
    }

    fn ensure_no_live_transaction(
        &self,
        order_id: Uuid,
        tx_type: TransactionType,
    ) -> Result<(), LedgerError> {
        match self.live_transaction(order_id, tx_type) {
            Some(_) => Err(LedgerError::DuplicatePayment(order_id.to_string())),
            None => Ok(()),
        }
    }

    fn insert(&mut self, txn: Transaction) -> Uuid {
        let id = txn.id;
        self.by_order_type.insert((txn.order_id, txn.tx_type), id);
        self.transactions.insert(id, txn);
        id
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("Amount mismatch: expected {expected}, got {actual}")]
    AmountMismatch { expected: i64, actual: i64 },

    #[error("A live transaction of this type already exists for order {0}")]
    DuplicatePayment(String),

    #[error("Refund not allowed with payment status {0}")]
    RefundNotAllowed(String),

    #[error("Payout not allowed for order {0}")]
    PayoutNotAllowed(String),

    #[error("Order not delivered: {0}")]
    NotDelivered(String),

    #[error("Transaction not found: {0}")]
    TransactionNotFound(String),

    #[error("Transaction already settled: {0}")]
    AlreadySettled(String),

    #[error("No gateway reference on transaction {0}")]
    MissingGatewayRef(String),

    #[error("Payment method does not match order {0}")]
    MethodMismatch(String),

    #[error("Gateway error: {0}")]
    Gateway(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LineItem, OrderDraft};
    use tiffin_catalog::partner::PartnerDraft;
    use tiffin_catalog::BusinessType;
    use tiffin_core::payment::Sha256Gateway;
    use tiffin_shared::Address;

    fn order(method: PaymentMethod) -> Order {
        Order::try_new(OrderDraft {
            user_id: Uuid::new_v4(),
            partner_id: Uuid::new_v4(),
            items: vec![LineItem {
                menu_item_id: Uuid::new_v4(),
                quantity: 1,
                unit_price: 20000,
                customizations: None,
            }],
            subtotal: 20000,
            tax: 1000,
            delivery_fee: 2000,
            discount: 0,
            total_amount: 23000,
            payment_method: method,
            delivery_address: Address::default(),
            estimated_delivery_time: None,
            notes: None,
        })
        .unwrap()
    }

    fn ledger() -> (PaymentLedger, Arc<Sha256Gateway>) {
        let gateway = Arc::new(Sha256Gateway::new("test_secret"));
        (PaymentLedger::new(gateway.clone()), gateway)
    }

    #[tokio::test]
    async fn test_amount_must_match_order_total() {
        let (mut ledger, _) = ledger();
        let mut order = order(PaymentMethod::Online);

        let result = ledger
            .record_payment(&mut order, 24000, PaymentMethod::Online)
            .await;
        assert!(matches!(
            result,
            Err(LedgerError::AmountMismatch {
                expected: 23000,
                actual: 24000
            })
        ));
    }

    #[tokio::test]
    async fn test_duplicate_payment_rejected() {
        let (mut ledger, _) = ledger();
        let mut order = order(PaymentMethod::Online);

        ledger
            .record_payment(&mut order, 23000, PaymentMethod::Online)
            .await
            .unwrap();
        let result = ledger
            .record_payment(&mut order, 23000, PaymentMethod::Online)
            .await;

        assert!(matches!(result, Err(LedgerError::DuplicatePayment(_))));
    }

    #[tokio::test]
    async fn test_failed_payment_may_be_retried() {
        let (mut ledger, _) = ledger();
        let mut order = order(PaymentMethod::Online);

        let txn_id = ledger
            .record_payment(&mut order, 23000, PaymentMethod::Online)
            .await
            .unwrap();
        let status = ledger
            .confirm_payment(&mut order, txn_id, "gw_pay_1", "forged")
            .unwrap();
        assert_eq!(status, TransactionStatus::Failed);
        assert_eq!(order.payment_status, PaymentStatus::Failed);

        // A fresh transaction is allowed after the failure
        let retry = ledger
            .record_payment(&mut order, 23000, PaymentMethod::Online)
            .await;
        assert!(retry.is_ok());
    }

    #[tokio::test]
    async fn test_valid_signature_completes_payment() {
        let (mut ledger, gateway) = ledger();
        let mut order = order(PaymentMethod::Online);

        let txn_id = ledger
            .record_payment(&mut order, 23000, PaymentMethod::Online)
            .await
            .unwrap();
        let order_ref = order.gateway_order_ref.clone().unwrap();
        let signature = gateway.sign(&order_ref, "gw_pay_1");

        let status = ledger
            .confirm_payment(&mut order, txn_id, "gw_pay_1", &signature)
            .unwrap();

        assert_eq!(status, TransactionStatus::Success);
        assert_eq!(order.payment_status, PaymentStatus::Completed);
        assert_eq!(
            ledger.transaction(&txn_id).unwrap().status,
            TransactionStatus::Success
        );
    }

    #[tokio::test]
    async fn test_refund_requires_completed_payment() {
        let (mut ledger, _) = ledger();
        let mut order = order(PaymentMethod::Online);

        let result = ledger.refund(&mut order);
        assert!(matches!(result, Err(LedgerError::RefundNotAllowed(_))));
    }

    #[tokio::test]
    async fn test_refund_round_trip() {
        let (mut ledger, gateway) = ledger();
        let mut order = order(PaymentMethod::Online);

        let txn_id = ledger
            .record_payment(&mut order, 23000, PaymentMethod::Online)
            .await
            .unwrap();
        let order_ref = order.gateway_order_ref.clone().unwrap();
        let signature = gateway.sign(&order_ref, "gw_pay_1");
        ledger
            .confirm_payment(&mut order, txn_id, "gw_pay_1", &signature)
            .unwrap();

        let refund_id = ledger.refund(&mut order).unwrap();
        assert_eq!(
            ledger.transaction(&refund_id).unwrap().status,
            TransactionStatus::Pending
        );
        // Second refund while the first is live is a duplicate
        assert!(matches!(
            ledger.refund(&mut order),
            Err(LedgerError::DuplicatePayment(_))
        ));

        ledger.settle_refund(&mut order, refund_id, true).unwrap();
        assert_eq!(order.payment_status, PaymentStatus::Refunded);
        assert_eq!(
            ledger.transaction(&refund_id).unwrap().amount,
            order.total_amount
        );
    }

    #[tokio::test]
    async fn test_cod_settles_at_delivery() {
        let (mut ledger, _) = ledger();
        let mut order = order(PaymentMethod::Cod);

        // Cash cannot be marked collected before handover
        assert!(matches!(
            ledger.settle_cod(&mut order),
            Err(LedgerError::NotDelivered(_))
        ));
        assert_eq!(order.payment_status, PaymentStatus::Pending);

        order.status = OrderStatus::Delivered;
        let txn_id = ledger.settle_cod(&mut order).unwrap();

        assert_eq!(order.payment_status, PaymentStatus::Completed);
        assert_eq!(
            ledger.transaction(&txn_id).unwrap().status,
            TransactionStatus::Success
        );
        assert!(matches!(
            ledger.settle_cod(&mut order),
            Err(LedgerError::AlreadySettled(_))
        ));
    }

    #[tokio::test]
    async fn test_payout_requires_delivered_and_paid() {
        let (mut ledger, _) = ledger();
        let mut order = order(PaymentMethod::Cod);
        let partner = Partner::try_new(PartnerDraft {
            name: "Biryani House".to_string(),
            owner_name: "R. Iyer".to_string(),
            email: "kitchen@example.com".to_string(),
            phone: "+91-9811002200".to_string(),
            business_type: BusinessType::CloudKitchen,
            cuisine: vec![],
            address: Address::default(),
            opening_hours: None,
            bank_details: None,
            documents: Default::default(),
            commission: Some(20.0),
        })
        .unwrap();

        assert!(matches!(
            ledger.record_payout(&order, &partner),
            Err(LedgerError::PayoutNotAllowed(_))
        ));

        order.status = OrderStatus::Delivered;
        ledger.settle_cod(&mut order).unwrap();

        let payout_id = ledger.record_payout(&order, &partner).unwrap();
        // 20% of 23000 withheld
        assert_eq!(ledger.transaction(&payout_id).unwrap().amount, 18400);

        // One payout per order
        assert!(matches!(
            ledger.record_payout(&order, &partner),
            Err(LedgerError::DuplicatePayment(_))
        ));

        ledger.settle_payout(payout_id, true).unwrap();
        assert_eq!(
            ledger.transaction(&payout_id).unwrap().status,
            TransactionStatus::Success
        );
    }
}
