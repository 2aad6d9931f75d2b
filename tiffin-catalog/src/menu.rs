use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tiffin_shared::Rating;
use uuid::Uuid;

use crate::registry::CatalogError;

/// Closed set of menu categories
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    Appetizers,
    MainCourse,
    Desserts,
    Beverages,
    Specials,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SpiceLevel {
    Mild,
    Medium,
    Hot,
    ExtraHot,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct NutritionInfo {
    pub calories: Option<f64>,
    pub protein: Option<f64>,
    pub carbs: Option<f64>,
    pub fat: Option<f64>,
}

pub const PLACEHOLDER_IMAGE: &str = "https://via.placeholder.com/300";
pub const DEFAULT_PREPARATION_MINUTES: u32 = 20;

/// Catalog entry owned by a partner. Prices are integer minor units.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub category: Category,
    pub price: i64,
    pub discount_price: Option<i64>,
    pub image: String,
    pub ingredients: Vec<String>,
    pub tags: Vec<String>,
    pub is_veg: bool,
    pub is_available: bool,
    pub preparation_time_minutes: u32,
    pub partner_id: Uuid,
    pub rating: Rating,
    pub nutrition_info: Option<NutritionInfo>,
    pub spice_level: Option<SpiceLevel>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Unvalidated menu item input
#[derive(Debug, Clone, Deserialize)]
pub struct MenuItemDraft {
    pub name: String,
    pub description: String,
    pub category: Category,
    pub price: i64,
    pub discount_price: Option<i64>,
    pub image: Option<String>,
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub is_veg: Option<bool>,
    pub preparation_time_minutes: Option<u32>,
    pub partner_id: Uuid,
    pub nutrition_info: Option<NutritionInfo>,
    pub spice_level: Option<SpiceLevel>,
}

impl MenuItem {
    pub fn try_new(draft: MenuItemDraft) -> Result<Self, CatalogError> {
        if draft.name.trim().is_empty() {
            return Err(CatalogError::Validation("item name is required".into()));
        }
        if draft.description.trim().is_empty() {
            return Err(CatalogError::Validation("description is required".into()));
        }
        if draft.price <= 0 {
            return Err(CatalogError::Validation(format!(
                "price must be positive, got {}",
                draft.price
            )));
        }
        if let Some(discounted) = draft.discount_price {
            if discounted <= 0 || discounted >= draft.price {
                return Err(CatalogError::Validation(format!(
                    "discount price {} must be positive and below price {}",
                    discounted, draft.price
                )));
            }
        }

        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            name: draft.name,
            description: draft.description,
            category: draft.category,
            price: draft.price,
            discount_price: draft.discount_price,
            image: draft.image.unwrap_or_else(|| PLACEHOLDER_IMAGE.to_string()),
            ingredients: draft.ingredients,
            tags: draft.tags,
            is_veg: draft.is_veg.unwrap_or(true),
            is_available: true,
            preparation_time_minutes: draft
                .preparation_time_minutes
                .unwrap_or(DEFAULT_PREPARATION_MINUTES),
            partner_id: draft.partner_id,
            rating: Rating::new(),
            nutrition_info: draft.nutrition_info,
            spice_level: draft.spice_level,
            created_at: now,
            updated_at: now,
        })
    }

    /// Price charged at order time: the discount price when one is set
    pub fn effective_price(&self) -> i64 {
        self.discount_price.unwrap_or(self.price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(partner_id: Uuid) -> MenuItemDraft {
        MenuItemDraft {
            name: "Paneer Tikka".to_string(),
            description: "Char-grilled cottage cheese skewers".to_string(),
            category: Category::Appetizers,
            price: 24000,
            discount_price: None,
            image: None,
            ingredients: vec![],
            tags: vec![],
            is_veg: None,
            preparation_time_minutes: None,
            partner_id,
            nutrition_info: None,
            spice_level: Some(SpiceLevel::Medium),
        }
    }

    #[test]
    fn test_defaults_applied() {
        let item = MenuItem::try_new(draft(Uuid::new_v4())).unwrap();

        assert!(item.is_available);
        assert!(item.is_veg);
        assert_eq!(item.image, PLACEHOLDER_IMAGE);
        assert_eq!(item.preparation_time_minutes, DEFAULT_PREPARATION_MINUTES);
    }

    #[test]
    fn test_non_positive_price_rejected() {
        let mut d = draft(Uuid::new_v4());
        d.price = 0;

        assert!(MenuItem::try_new(d).is_err());
    }

    #[test]
    fn test_discount_must_undercut_price() {
        let mut d = draft(Uuid::new_v4());
        d.discount_price = Some(30000);

        assert!(MenuItem::try_new(d).is_err());
    }

    #[test]
    fn test_effective_price_prefers_discount() {
        let mut d = draft(Uuid::new_v4());
        d.discount_price = Some(20000);

        let item = MenuItem::try_new(d).unwrap();
        assert_eq!(item.effective_price(), 20000);
    }
}
