use crate::menu::{MenuItem, MenuItemDraft};
use crate::partner::{Partner, PartnerDraft};
use chrono::Utc;
use std::collections::HashMap;
use uuid::Uuid;

/// In-memory catalog of partners and their menu items. Enforces the
/// referential and gating rules the storage layer does not: a menu item
/// must reference an existing partner, emails are unique, and retired
/// records are soft-flagged rather than deleted.
pub struct CatalogManager {
    pub(crate) partners: HashMap<Uuid, Partner>,
    pub(crate) items: HashMap<Uuid, MenuItem>,
    email_index: HashMap<String, Uuid>,
}

impl CatalogManager {
    pub fn new() -> Self {
        Self {
            partners: HashMap::new(),
            items: HashMap::new(),
            email_index: HashMap::new(),
        }
    }

    /// Register a new partner account (inactive until reviewed)
    pub fn onboard_partner(&mut self, draft: PartnerDraft) -> Result<&Partner, CatalogError> {
        let partner = Partner::try_new(draft)?;

        if self.email_index.contains_key(&partner.email) {
            return Err(CatalogError::DuplicateEmail(partner.email));
        }

        let id = partner.id;
        self.email_index.insert(partner.email.clone(), id);
        self.partners.insert(id, partner);
        Ok(&self.partners[&id])
    }

    pub fn partner(&self, id: &Uuid) -> Result<&Partner, CatalogError> {
        self.partners
            .get(id)
            .ok_or_else(|| CatalogError::PartnerNotFound(id.to_string()))
    }

    /// Mark a partner's documents as reviewed and accepted
    pub fn verify_partner(&mut self, id: &Uuid) -> Result<(), CatalogError> {
        let partner = self.partner_mut(id)?;
        partner.is_verified = true;
        partner.updated_at = Utc::now();
        Ok(())
    }

    pub fn activate_partner(&mut self, id: &Uuid) -> Result<(), CatalogError> {
        let partner = self.partner_mut(id)?;
        partner.is_active = true;
        partner.updated_at = Utc::now();
        Ok(())
    }

    /// Soft retirement: the partner stops receiving orders but keeps
    /// its history.
    pub fn deactivate_partner(&mut self, id: &Uuid) -> Result<(), CatalogError> {
        let partner = self.partner_mut(id)?;
        partner.is_active = false;
        partner.updated_at = Utc::now();
        Ok(())
    }

    pub fn set_commission(&mut self, id: &Uuid, commission: f64) -> Result<(), CatalogError> {
        if !(0.0..=100.0).contains(&commission) {
            return Err(CatalogError::Validation(format!(
                "commission must be within 0-100, got {}",
                commission
            )));
        }
        let partner = self.partner_mut(id)?;
        partner.commission = commission;
        partner.updated_at = Utc::now();
        Ok(())
    }

    /// Add a menu item; the referenced partner must already exist
    pub fn add_menu_item(&mut self, draft: MenuItemDraft) -> Result<&MenuItem, CatalogError> {
        if !self.partners.contains_key(&draft.partner_id) {
            return Err(CatalogError::PartnerNotFound(draft.partner_id.to_string()));
        }

        let item = MenuItem::try_new(draft)?;
        let id = item.id;
        self.items.insert(id, item);
        Ok(&self.items[&id])
    }

    pub fn menu_item(&self, id: &Uuid) -> Result<&MenuItem, CatalogError> {
        self.items
            .get(id)
            .ok_or_else(|| CatalogError::MenuItemNotFound(id.to_string()))
    }

    pub fn set_price(
        &mut self,
        id: &Uuid,
        price: i64,
        discount_price: Option<i64>,
    ) -> Result<(), CatalogError> {
        if price <= 0 {
            return Err(CatalogError::Validation(format!(
                "price must be positive, got {}",
                price
            )));
        }
        if let Some(discounted) = discount_price {
            if discounted <= 0 || discounted >= price {
                return Err(CatalogError::Validation(format!(
                    "discount price {} must be positive and below price {}",
                    discounted, price
                )));
            }
        }
        let item = self.menu_item_mut(id)?;
        item.price = price;
        item.discount_price = discount_price;
        item.updated_at = Utc::now();
        Ok(())
    }

    /// Soft retirement for menu items
    pub fn set_availability(&mut self, id: &Uuid, available: bool) -> Result<(), CatalogError> {
        let item = self.menu_item_mut(id)?;
        item.is_available = available;
        item.updated_at = Utc::now();
        Ok(())
    }

    /// Resolve an item for ordering: the partner must be able to receive
    /// orders, the item must exist, belong to that partner, and be
    /// available. Returns the item so callers can snapshot its price.
    pub fn orderable_item(
        &self,
        partner_id: &Uuid,
        item_id: &Uuid,
    ) -> Result<&MenuItem, CatalogError> {
        let partner = self.partner(partner_id)?;
        if !partner.can_receive_orders() {
            return Err(CatalogError::PartnerNotOrderable(partner_id.to_string()));
        }

        let item = self.menu_item(item_id)?;
        if item.partner_id != *partner_id {
            return Err(CatalogError::WrongPartner {
                item: item_id.to_string(),
                partner: partner_id.to_string(),
            });
        }
        if !item.is_available {
            return Err(CatalogError::MenuItemUnavailable(item_id.to_string()));
        }
        Ok(item)
    }

    /// Fold a delivered order into the partner's lifetime counters
    pub fn record_delivered_order(
        &mut self,
        partner_id: &Uuid,
        amount: i64,
    ) -> Result<(), CatalogError> {
        let partner = self.partner_mut(partner_id)?;
        partner.total_orders += 1;
        partner.total_revenue += amount;
        partner.updated_at = Utc::now();
        Ok(())
    }

    pub fn rate_partner(&mut self, partner_id: &Uuid, score: f64) -> Result<(), CatalogError> {
        let partner = self.partner_mut(partner_id)?;
        partner.rating.add(score);
        partner.updated_at = Utc::now();
        Ok(())
    }

    pub fn rate_menu_item(&mut self, item_id: &Uuid, score: f64) -> Result<(), CatalogError> {
        let item = self.menu_item_mut(item_id)?;
        item.rating.add(score);
        item.updated_at = Utc::now();
        Ok(())
    }

    fn partner_mut(&mut self, id: &Uuid) -> Result<&mut Partner, CatalogError> {
        self.partners
            .get_mut(id)
            .ok_or_else(|| CatalogError::PartnerNotFound(id.to_string()))
    }

    fn menu_item_mut(&mut self, id: &Uuid) -> Result<&mut MenuItem, CatalogError> {
        self.items
            .get_mut(id)
            .ok_or_else(|| CatalogError::MenuItemNotFound(id.to_string()))
    }
}

impl Default for CatalogManager {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Partner email already registered: {0}")]
    DuplicateEmail(String),

    #[error("Partner not found: {0}")]
    PartnerNotFound(String),

    #[error("Menu item not found: {0}")]
    MenuItemNotFound(String),

    #[error("Partner cannot receive orders: {0}")]
    PartnerNotOrderable(String),

    #[error("Menu item not available: {0}")]
    MenuItemUnavailable(String),

    #[error("Menu item {item} does not belong to partner {partner}")]
    WrongPartner { item: String, partner: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::menu::Category;
    use crate::partner::BusinessType;
    use tiffin_shared::Address;

    fn partner_draft(email: &str) -> PartnerDraft {
        PartnerDraft {
            name: "Biryani House".to_string(),
            owner_name: "R. Iyer".to_string(),
            email: email.to_string(),
            phone: "+91-9811002200".to_string(),
            business_type: BusinessType::CloudKitchen,
            cuisine: vec!["Hyderabadi".to_string()],
            address: Address::default(),
            opening_hours: None,
            bank_details: None,
            documents: Default::default(),
            commission: Some(18.0),
        }
    }

    fn item_draft(partner_id: Uuid) -> MenuItemDraft {
        MenuItemDraft {
            name: "Chicken Biryani".to_string(),
            description: "Dum-cooked basmati with raita".to_string(),
            category: Category::MainCourse,
            price: 32000,
            discount_price: None,
            image: None,
            ingredients: vec![],
            tags: vec![],
            is_veg: Some(false),
            preparation_time_minutes: Some(35),
            partner_id,
            nutrition_info: None,
            spice_level: None,
        }
    }

    fn orderable_partner(catalog: &mut CatalogManager, email: &str) -> Uuid {
        let id = catalog.onboard_partner(partner_draft(email)).unwrap().id;
        catalog.verify_partner(&id).unwrap();
        catalog.activate_partner(&id).unwrap();
        id
    }

    #[test]
    fn test_duplicate_email_rejected() {
        let mut catalog = CatalogManager::new();
        catalog.onboard_partner(partner_draft("kitchen@example.com")).unwrap();

        let result = catalog.onboard_partner(partner_draft("KITCHEN@example.com"));
        assert!(matches!(result, Err(CatalogError::DuplicateEmail(_))));
    }

    #[test]
    fn test_menu_item_requires_existing_partner() {
        let mut catalog = CatalogManager::new();

        let result = catalog.add_menu_item(item_draft(Uuid::new_v4()));
        assert!(matches!(result, Err(CatalogError::PartnerNotFound(_))));
    }

    #[test]
    fn test_unverified_partner_not_orderable() {
        let mut catalog = CatalogManager::new();
        let partner_id = catalog
            .onboard_partner(partner_draft("kitchen@example.com"))
            .unwrap()
            .id;
        catalog.activate_partner(&partner_id).unwrap();
        let item_id = catalog.add_menu_item(item_draft(partner_id)).unwrap().id;

        let result = catalog.orderable_item(&partner_id, &item_id);
        assert!(matches!(result, Err(CatalogError::PartnerNotOrderable(_))));
    }

    #[test]
    fn test_retired_item_not_orderable() {
        let mut catalog = CatalogManager::new();
        let partner_id = orderable_partner(&mut catalog, "kitchen@example.com");
        let item_id = catalog.add_menu_item(item_draft(partner_id)).unwrap().id;

        catalog.set_availability(&item_id, false).unwrap();

        let result = catalog.orderable_item(&partner_id, &item_id);
        assert!(matches!(result, Err(CatalogError::MenuItemUnavailable(_))));
    }

    #[test]
    fn test_item_must_belong_to_partner() {
        let mut catalog = CatalogManager::new();
        let partner_a = orderable_partner(&mut catalog, "a@example.com");
        let partner_b = orderable_partner(&mut catalog, "b@example.com");
        let item_id = catalog.add_menu_item(item_draft(partner_a)).unwrap().id;

        let result = catalog.orderable_item(&partner_b, &item_id);
        assert!(matches!(result, Err(CatalogError::WrongPartner { .. })));
    }

    #[test]
    fn test_delivered_order_updates_counters() {
        let mut catalog = CatalogManager::new();
        let partner_id = orderable_partner(&mut catalog, "kitchen@example.com");

        catalog.record_delivered_order(&partner_id, 32000).unwrap();
        catalog.record_delivered_order(&partner_id, 18000).unwrap();

        let partner = catalog.partner(&partner_id).unwrap();
        assert_eq!(partner.total_orders, 2);
        assert_eq!(partner.total_revenue, 50000);
    }
}
