pub mod menu;
pub mod partner;
pub mod registry;
pub mod repository;
pub mod search;

pub use menu::{Category, MenuItem, MenuItemDraft, SpiceLevel};
pub use partner::{BusinessType, Partner, PartnerDraft};
pub use registry::{CatalogError, CatalogManager};
pub use repository::CatalogRepository;
