use crate::models::{
    LineItem, Order, OrderDraft, OrderError, OrderStatus, PaymentMethod, PaymentStatus,
};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tiffin_catalog::{CatalogError, CatalogManager};
use tiffin_shared::models::events::{OrderPlacedEvent, OrderStatusChangedEvent};
use tiffin_shared::Address;
use uuid::Uuid;

/// One item of a checkout request, before price snapshotting
#[derive(Debug, Clone)]
pub struct ItemRequest {
    pub menu_item_id: Uuid,
    pub quantity: u32,
    pub customizations: Option<String>,
}

/// Checkout input. Charge components come from the pricing layer;
/// item prices are snapshotted from the catalog here.
#[derive(Debug, Clone)]
pub struct PlaceOrderRequest {
    pub user_id: Uuid,
    pub partner_id: Uuid,
    pub items: Vec<ItemRequest>,
    pub tax: i64,
    pub delivery_fee: i64,
    pub discount: i64,
    pub payment_method: PaymentMethod,
    pub delivery_address: Address,
    pub estimated_delivery_time: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

/// What a delivery transition asks of the caller
#[derive(Debug, Clone, Copy)]
pub struct DeliveryOutcome {
    pub delivered_at: DateTime<Utc>,
    /// COD order delivered with payment still pending: the ledger must
    /// settle the cash collection
    pub cod_collection_due: bool,
}

/// What a cancellation asks of the caller
#[derive(Debug, Clone, Copy)]
pub struct CancelOutcome {
    /// A captured payment needs a refund transaction; the manager never
    /// creates it itself
    pub refund_required: bool,
}

/// Domain events raised by lifecycle operations, drained by the outer
/// layer for publishing
#[derive(Debug, Clone)]
pub enum OrderEvent {
    Placed(OrderPlacedEvent),
    StatusChanged(OrderStatusChangedEvent),
}

/// Manages order lifecycle and state transitions
pub struct OrderManager {
    orders: HashMap<Uuid, Order>,
    events: Vec<OrderEvent>,
}

impl OrderManager {
    pub fn new() -> Self {
        Self {
            orders: HashMap::new(),
            events: Vec::new(),
        }
    }

    /// Create an order at checkout. Every line item is resolved through
    /// the catalog (partner orderable, item available and owned by the
    /// partner) and its effective price is captured into the line item.
    pub fn place_order(
        &mut self,
        catalog: &CatalogManager,
        request: PlaceOrderRequest,
    ) -> Result<&Order, LifecycleError> {
        let mut items = Vec::with_capacity(request.items.len());
        for entry in &request.items {
            let menu_item = catalog.orderable_item(&request.partner_id, &entry.menu_item_id)?;
            items.push(LineItem {
                menu_item_id: menu_item.id,
                quantity: entry.quantity,
                unit_price: menu_item.effective_price(),
                customizations: entry.customizations.clone(),
            });
        }

        let subtotal: i64 = items.iter().map(LineItem::line_total).sum();
        let total_amount = subtotal + request.tax + request.delivery_fee - request.discount;

        let order = Order::try_new(OrderDraft {
            user_id: request.user_id,
            partner_id: request.partner_id,
            items,
            subtotal,
            tax: request.tax,
            delivery_fee: request.delivery_fee,
            discount: request.discount,
            total_amount,
            payment_method: request.payment_method,
            delivery_address: request.delivery_address,
            estimated_delivery_time: request.estimated_delivery_time,
            notes: request.notes,
        })?;

        let id = order.id;
        self.events.push(OrderEvent::Placed(OrderPlacedEvent {
            order_id: id,
            user_id: order.user_id,
            partner_id: order.partner_id,
            total_amount: order.total_amount,
            timestamp: order.created_at.timestamp(),
        }));
        self.orders.insert(id, order);
        Ok(&self.orders[&id])
    }

    pub fn order(&self, id: &Uuid) -> Option<&Order> {
        self.orders.get(id)
    }

    /// Mutable access for the payment ledger, which updates
    /// `payment_status` and the gateway references in step with its
    /// transactions
    pub fn order_mut(&mut self, id: &Uuid) -> Result<&mut Order, LifecycleError> {
        self.orders
            .get_mut(id)
            .ok_or_else(|| LifecycleError::NotFound(id.to_string()))
    }

    /// Transition: Pending → Confirmed (partner accepted the order)
    pub fn confirm(&mut self, id: &Uuid) -> Result<(), LifecycleError> {
        self.transition(id, OrderStatus::Pending, OrderStatus::Confirmed)
    }

    /// Transition: Confirmed → Preparing. An Online order may only
    /// proceed once its payment is captured; a Failed payment blocks
    /// progress past Confirmed for either method.
    pub fn start_preparing(&mut self, id: &Uuid) -> Result<(), LifecycleError> {
        {
            let order = self.order_mut(id)?;
            Self::guard_step(order, OrderStatus::Confirmed, OrderStatus::Preparing)?;
            if order.payment_status == PaymentStatus::Failed {
                return Err(LifecycleError::PaymentIncomplete(id.to_string()));
            }
            if order.payment_method == PaymentMethod::Online
                && order.payment_status != PaymentStatus::Completed
            {
                return Err(LifecycleError::PaymentIncomplete(id.to_string()));
            }
        }
        self.apply_status(id, OrderStatus::Preparing)
    }

    /// Transition: Preparing → OutForDelivery
    pub fn dispatch(&mut self, id: &Uuid) -> Result<(), LifecycleError> {
        self.transition(id, OrderStatus::Preparing, OrderStatus::OutForDelivery)
    }

    /// Transition: OutForDelivery → Delivered. Stamps
    /// `actual_delivery_time` when unset and reports whether a COD cash
    /// collection still needs settling in the ledger.
    pub fn mark_delivered(&mut self, id: &Uuid) -> Result<DeliveryOutcome, LifecycleError> {
        {
            let order = self.order_mut(id)?;
            Self::guard_step(order, OrderStatus::OutForDelivery, OrderStatus::Delivered)?;
            if order.payment_method == PaymentMethod::Online
                && order.payment_status != PaymentStatus::Completed
            {
                return Err(LifecycleError::PaymentIncomplete(id.to_string()));
            }
            if order.payment_status == PaymentStatus::Failed {
                return Err(LifecycleError::PaymentIncomplete(id.to_string()));
            }
        }

        self.apply_status(id, OrderStatus::Delivered)?;

        let order = self.order_mut(id)?;
        let delivered_at = match order.actual_delivery_time {
            Some(t) => t,
            None => {
                let now = Utc::now();
                order.actual_delivery_time = Some(now);
                now
            }
        };
        let cod_collection_due = order.payment_method == PaymentMethod::Cod
            && order.payment_status == PaymentStatus::Pending;

        Ok(DeliveryOutcome {
            delivered_at,
            cod_collection_due,
        })
    }

    /// Cancel an order. Allowed from Pending, Confirmed and Preparing
    /// only; once dispatched, cancellation goes through the separate
    /// return/refund flow instead.
    pub fn cancel(&mut self, id: &Uuid) -> Result<CancelOutcome, LifecycleError> {
        {
            let order = self.order_mut(id)?;
            if order.status.is_terminal() {
                return Err(LifecycleError::TerminalState(format!("{:?}", order.status)));
            }
            if order.status == OrderStatus::OutForDelivery {
                return Err(LifecycleError::InvalidTransition {
                    from: format!("{:?}", order.status),
                    to: "CANCELLED".to_string(),
                });
            }
        }

        self.apply_status(id, OrderStatus::Cancelled)?;

        let order = self.order_mut(id)?;
        let refund_required = !matches!(
            order.payment_status,
            PaymentStatus::Pending | PaymentStatus::Refunded
        );

        Ok(CancelOutcome { refund_required })
    }

    /// Record the customer's post-delivery rating and review
    pub fn rate(
        &mut self,
        id: &Uuid,
        score: u8,
        review: Option<String>,
    ) -> Result<(), LifecycleError> {
        let order = self.order_mut(id)?;
        if order.status != OrderStatus::Delivered {
            return Err(LifecycleError::NotDelivered(id.to_string()));
        }
        if !(1..=5).contains(&score) {
            return Err(LifecycleError::InvalidRating(score));
        }
        order.rating = Some(score);
        order.review = review;
        order.updated_at = Utc::now();
        Ok(())
    }

    /// Drain buffered domain events for publishing
    pub fn drain_events(&mut self) -> Vec<OrderEvent> {
        std::mem::take(&mut self.events)
    }

    /// Guarded single-step transition: the order must currently sit in
    /// `from`, terminal states absorb everything
    fn transition(
        &mut self,
        id: &Uuid,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<(), LifecycleError> {
        let order = self.order_mut(id)?;
        Self::guard_step(order, from, to)?;
        self.apply_status(id, to)
    }

    /// The state check runs before any payment gate so a skipped step
    /// always surfaces as InvalidTransition, whatever the payment state.
    fn guard_step(order: &Order, from: OrderStatus, to: OrderStatus) -> Result<(), LifecycleError> {
        if order.status.is_terminal() {
            return Err(LifecycleError::TerminalState(format!("{:?}", order.status)));
        }
        if order.status != from {
            return Err(LifecycleError::InvalidTransition {
                from: format!("{:?}", order.status),
                to: format!("{:?}", to),
            });
        }
        Ok(())
    }

    fn apply_status(&mut self, id: &Uuid, to: OrderStatus) -> Result<(), LifecycleError> {
        let order = self.order_mut(id)?;
        let from = order.status;
        order.status = to;
        order.updated_at = Utc::now();
        let event = OrderStatusChangedEvent {
            order_id: *id,
            from: format!("{:?}", from),
            to: format!("{:?}", to),
            timestamp: order.updated_at.timestamp(),
        };
        self.events.push(OrderEvent::StatusChanged(event));
        Ok(())
    }
}

impl Default for OrderManager {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error("Order not found: {0}")]
    NotFound(String),

    #[error("Invalid state transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Order is in terminal state {0}")]
    TerminalState(String),

    #[error("Payment incomplete for order {0}")]
    PaymentIncomplete(String),

    #[error("Order {0} has not been delivered")]
    NotDelivered(String),

    #[error("Rating must be between 1 and 5, got {0}")]
    InvalidRating(u8),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Order(#[from] OrderError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LineItem, Order, OrderDraft};

    fn seed_order(manager: &mut OrderManager, method: PaymentMethod) -> Uuid {
        let order = Order::try_new(OrderDraft {
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
        .unwrap();
        let id = order.id;
        manager.orders.insert(id, order);
        id
    }

    #[test]
    fn test_full_forward_path() {
        let mut manager = OrderManager::new();
        let id = seed_order(&mut manager, PaymentMethod::Cod);

        manager.confirm(&id).unwrap();
        manager.start_preparing(&id).unwrap();
        manager.dispatch(&id).unwrap();
        let outcome = manager.mark_delivered(&id).unwrap();

        let order = manager.order(&id).unwrap();
        assert_eq!(order.status, OrderStatus::Delivered);
        assert!(order.actual_delivery_time.is_some());
        assert!(outcome.cod_collection_due);
    }

    #[test]
    fn test_skipping_a_state_rejected() {
        let mut manager = OrderManager::new();
        let id = seed_order(&mut manager, PaymentMethod::Cod);

        // Pending → Preparing skips Confirmed
        let result = manager.start_preparing(&id);
        assert!(matches!(
            result,
            Err(LifecycleError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_skip_rejected_even_with_payment_pending() {
        let mut manager = OrderManager::new();
        let id = seed_order(&mut manager, PaymentMethod::Online);

        // The skipped step, not the unpaid charge, is the error here
        let result = manager.start_preparing(&id);
        assert!(matches!(
            result,
            Err(LifecycleError::InvalidTransition { .. })
        ));

        manager.confirm(&id).unwrap();

        // Confirmed → Delivered skips two states; same rule applies
        let result = manager.mark_delivered(&id);
        assert!(matches!(
            result,
            Err(LifecycleError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_cancel_allowed_before_dispatch_only() {
        let mut manager = OrderManager::new();
        let id = seed_order(&mut manager, PaymentMethod::Cod);

        manager.confirm(&id).unwrap();
        manager.start_preparing(&id).unwrap();
        manager.dispatch(&id).unwrap();

        let result = manager.cancel(&id);
        assert!(matches!(
            result,
            Err(LifecycleError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_terminal_states_absorb() {
        let mut manager = OrderManager::new();
        let id = seed_order(&mut manager, PaymentMethod::Cod);

        let outcome = manager.cancel(&id).unwrap();
        assert!(!outcome.refund_required); // payment still pending

        assert!(matches!(
            manager.confirm(&id),
            Err(LifecycleError::TerminalState(_))
        ));
        assert!(matches!(
            manager.cancel(&id),
            Err(LifecycleError::TerminalState(_))
        ));
    }

    #[test]
    fn test_online_order_cannot_prepare_unpaid() {
        let mut manager = OrderManager::new();
        let id = seed_order(&mut manager, PaymentMethod::Online);

        manager.confirm(&id).unwrap();

        let result = manager.start_preparing(&id);
        assert!(matches!(result, Err(LifecycleError::PaymentIncomplete(_))));
    }

    #[test]
    fn test_cancel_after_capture_requires_refund() {
        let mut manager = OrderManager::new();
        let id = seed_order(&mut manager, PaymentMethod::Online);

        manager.confirm(&id).unwrap();
        manager.order_mut(&id).unwrap().payment_status = PaymentStatus::Completed;

        let outcome = manager.cancel(&id).unwrap();
        assert!(outcome.refund_required);
    }

    #[test]
    fn test_rating_only_after_delivery() {
        let mut manager = OrderManager::new();
        let id = seed_order(&mut manager, PaymentMethod::Cod);

        assert!(matches!(
            manager.rate(&id, 5, None),
            Err(LifecycleError::NotDelivered(_))
        ));

        manager.confirm(&id).unwrap();
        manager.start_preparing(&id).unwrap();
        manager.dispatch(&id).unwrap();
        manager.mark_delivered(&id).unwrap();

        assert!(matches!(
            manager.rate(&id, 6, None),
            Err(LifecycleError::InvalidRating(6))
        ));
        manager.rate(&id, 5, Some("Great biryani".to_string())).unwrap();
        assert_eq!(manager.order(&id).unwrap().rating, Some(5));
    }

    #[test]
    fn test_status_events_recorded_in_order() {
        let mut manager = OrderManager::new();
        let id = seed_order(&mut manager, PaymentMethod::Cod);

        manager.confirm(&id).unwrap();
        manager.start_preparing(&id).unwrap();

        let events = manager.drain_events();
        let transitions: Vec<(String, String)> = events
            .iter()
            .filter_map(|e| match e {
                OrderEvent::StatusChanged(ev) => Some((ev.from.clone(), ev.to.clone())),
                _ => None,
            })
            .collect();
        assert_eq!(
            transitions,
            vec![
                ("Pending".to_string(), "Confirmed".to_string()),
                ("Confirmed".to_string(), "Preparing".to_string()),
            ]
        );
        assert!(manager.drain_events().is_empty());
    }
}
