pub mod ledger;
pub mod lifecycle;
pub mod models;
pub mod repository;
pub mod settlement;

pub use ledger::{LedgerError, PaymentLedger};
pub use lifecycle::{ItemRequest, LifecycleError, OrderManager, PlaceOrderRequest};
pub use models::{
    LineItem, Order, OrderStatus, PaymentMethod, PaymentStatus, Transaction, TransactionStatus,
    TransactionType,
};
pub use repository::{OrderRepository, TransactionRepository};
pub use settlement::SettlementReporter;
