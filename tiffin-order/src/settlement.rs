use crate::models::{Order, OrderStatus, PaymentStatus};
use chrono::Utc;
use serde_json::{json, Value};
use tiffin_catalog::Partner;

/// Platform commission withheld from an order total, rounded to the
/// nearest minor unit
pub fn commission_amount(total: i64, commission_pct: f64) -> i64 {
    (total as f64 * commission_pct / 100.0).round() as i64
}

/// What the partner is owed for an order after commission
pub fn net_payout(total: i64, commission_pct: f64) -> i64 {
    total - commission_amount(total, commission_pct)
}

/// Builds per-partner settlement summaries over a slice of orders.
/// Only delivered orders with a captured payment count towards the
/// payable amount; refunded orders are reported separately.
pub struct SettlementReporter;

impl SettlementReporter {
    pub fn new() -> Self {
        Self
    }

    pub fn partner_report(&self, partner: &Partner, orders: &[Order]) -> Value {
        let mut gross = 0i64;
        let mut refunded = 0i64;
        let mut settled_orders = 0u32;
        let mut refunded_orders = 0u32;

        for order in orders {
            if order.partner_id != partner.id || order.status != OrderStatus::Delivered {
                continue;
            }
            match order.payment_status {
                PaymentStatus::Completed => {
                    gross += order.total_amount;
                    settled_orders += 1;
                }
                PaymentStatus::Refunded => {
                    refunded += order.total_amount;
                    refunded_orders += 1;
                }
                _ => {}
            }
        }

        let commission = commission_amount(gross, partner.commission);

        json!({
            "partner_id": partner.id,
            "partner_name": partner.name,
            "report_date": Utc::now().to_rfc3339(),
            "commission_pct": partner.commission,
            "metrics": {
                "settled_orders": settled_orders,
                "refunded_orders": refunded_orders,
                "gross_amount": gross,
                "commission_withheld": commission,
                "net_payable": gross - commission,
                "refunded_amount": refunded,
            }
        })
    }
}

impl Default for SettlementReporter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LineItem, OrderDraft, PaymentMethod};
    use tiffin_catalog::partner::PartnerDraft;
    use tiffin_catalog::BusinessType;
    use tiffin_shared::Address;
    use uuid::Uuid;

    fn partner() -> Partner {
        Partner::try_new(PartnerDraft {
            name: "Dosa Corner".to_string(),
            owner_name: "K. Rao".to_string(),
            email: "dosa@example.com".to_string(),
            phone: "+91-9700112233".to_string(),
            business_type: BusinessType::Cafe,
            cuisine: vec![],
            address: Address::default(),
            opening_hours: None,
            bank_details: None,
            documents: Default::default(),
            commission: Some(10.0),
        })
        .unwrap()
    }

    fn delivered_order(partner_id: Uuid, total: i64, payment: PaymentStatus) -> Order {
        let mut order = Order::try_new(OrderDraft {
            user_id: Uuid::new_v4(),
            partner_id,
            items: vec![LineItem {
                menu_item_id: Uuid::new_v4(),
                quantity: 1,
                unit_price: total,
                customizations: None,
            }],
            subtotal: total,
            tax: 0,
            delivery_fee: 0,
            discount: 0,
            total_amount: total,
            payment_method: PaymentMethod::Online,
            delivery_address: Address::default(),
            estimated_delivery_time: None,
            notes: None,
        })
        .unwrap();
        order.status = OrderStatus::Delivered;
        order.payment_status = payment;
        order
    }

    #[test]
    fn test_commission_rounding() {
        assert_eq!(commission_amount(23000, 20.0), 4600);
        assert_eq!(commission_amount(999, 12.5), 125); // 124.875 rounds up
        assert_eq!(net_payout(23000, 20.0), 18400);
    }

    #[test]
    fn test_report_aggregates_delivered_orders_only() {
        let partner = partner();
        let reporter = SettlementReporter::new();

        let mut pending = delivered_order(partner.id, 5000, PaymentStatus::Completed);
        pending.status = OrderStatus::Preparing; // not delivered yet

        let orders = vec![
            delivered_order(partner.id, 10000, PaymentStatus::Completed),
            delivered_order(partner.id, 20000, PaymentStatus::Completed),
            delivered_order(partner.id, 7000, PaymentStatus::Refunded),
            delivered_order(Uuid::new_v4(), 9000, PaymentStatus::Completed),
            pending,
        ];

        let report = reporter.partner_report(&partner, &orders);
        let metrics = &report["metrics"];

        assert_eq!(metrics["settled_orders"], 2);
        assert_eq!(metrics["refunded_orders"], 1);
        assert_eq!(metrics["gross_amount"], 30000);
        assert_eq!(metrics["commission_withheld"], 3000);
        assert_eq!(metrics["net_payable"], 27000);
        assert_eq!(metrics["refunded_amount"], 7000);
    }
}
