use crate::menu::{Category, MenuItem};
use crate::registry::CatalogManager;
use uuid::Uuid;

/// Query paths matching the storage layer's secondary indexes:
/// (partner, category) listing and text search over name/description.
impl CatalogManager {
    /// All available items a partner lists under a category
    pub fn items_by_category(&self, partner_id: &Uuid, category: Category) -> Vec<&MenuItem> {
        let mut items: Vec<&MenuItem> = self
            .items
            .values()
            .filter(|item| {
                item.partner_id == *partner_id && item.category == category && item.is_available
            })
            .collect();
        items.sort_by(|a, b| a.name.cmp(&b.name));
        items
    }

    /// Case-insensitive search over item names and descriptions
    pub fn search_items(&self, query: &str) -> Vec<&MenuItem> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }

        let mut items: Vec<&MenuItem> = self
            .items
            .values()
            .filter(|item| {
                item.is_available
                    && (item.name.to_lowercase().contains(&needle)
                        || item.description.to_lowercase().contains(&needle))
            })
            .collect();
        items.sort_by(|a, b| a.name.cmp(&b.name));
        items
    }
}
