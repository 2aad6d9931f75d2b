pub mod app_config;
pub mod catalog_repo;
pub mod database;
pub mod locks;
pub mod order_repo;

pub use app_config::Config;
pub use catalog_repo::StoreCatalogRepository;
pub use database::DbClient;
pub use locks::OrderLocks;
pub use order_repo::{StoreOrderRepository, StoreTransactionRepository};
