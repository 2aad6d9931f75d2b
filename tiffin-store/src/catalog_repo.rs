use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tiffin_core::CoreError;
use tiffin_catalog::repository::CatalogRepository;
use tiffin_catalog::{BusinessType, Category, MenuItem, Partner, SpiceLevel};
use tiffin_shared::Rating;
use tracing::info;
use uuid::Uuid;

type RepoError = Box<dyn std::error::Error + Send + Sync>;

pub struct StoreCatalogRepository {
    pool: PgPool,
}

impl StoreCatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct PartnerRow {
    id: Uuid,
    name: String,
    owner_name: String,
    email: String,
    phone: String,
    business_type: String,
    cuisine: Vec<String>,
    address: serde_json::Value,
    opening_hours: Option<serde_json::Value>,
    is_active: bool,
    is_verified: bool,
    rating_average: f64,
    rating_count: i32,
    bank_details: Option<serde_json::Value>,
    documents: serde_json::Value,
    commission: f64,
    total_orders: i64,
    total_revenue: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

const SELECT_PARTNER: &str = "SELECT id, name, owner_name, email, phone, business_type, \
     cuisine, address, opening_hours, is_active, is_verified, rating_average, rating_count, \
     bank_details, documents, commission, total_orders, total_revenue, created_at, updated_at \
     FROM partners";

impl PartnerRow {
    fn into_partner(self) -> Result<Partner, RepoError> {
        Ok(Partner {
            id: self.id,
            name: self.name,
            owner_name: self.owner_name,
            email: self.email,
            phone: self.phone,
            business_type: parse_business_type(&self.business_type)?,
            cuisine: self.cuisine,
            address: serde_json::from_value(self.address)?,
            opening_hours: self
                .opening_hours
                .map(serde_json::from_value)
                .transpose()?,
            is_active: self.is_active,
            is_verified: self.is_verified,
            rating: Rating {
                average: self.rating_average,
                count: self.rating_count as u32,
            },
            bank_details: self.bank_details.map(serde_json::from_value).transpose()?,
            documents: serde_json::from_value(self.documents)?,
            commission: self.commission,
            total_orders: self.total_orders as u64,
            total_revenue: self.total_revenue,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct MenuItemRow {
    id: Uuid,
    name: String,
    description: String,
    category: String,
    price: i64,
    discount_price: Option<i64>,
    image: String,
    ingredients: Vec<String>,
    tags: Vec<String>,
    is_veg: bool,
    is_available: bool,
    preparation_time_minutes: i32,
    partner_id: Uuid,
    rating_average: f64,
    rating_count: i32,
    nutrition_info: Option<serde_json::Value>,
    spice_level: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

const SELECT_MENU_ITEM: &str = "SELECT id, name, description, category, price, \
     discount_price, image, ingredients, tags, is_veg, is_available, \
     preparation_time_minutes, partner_id, rating_average, rating_count, nutrition_info, \
     spice_level, created_at, updated_at FROM menu_items";

impl MenuItemRow {
    fn into_menu_item(self) -> Result<MenuItem, RepoError> {
        Ok(MenuItem {
            id: self.id,
            name: self.name,
            description: self.description,
            category: parse_category(&self.category)?,
            price: self.price,
            discount_price: self.discount_price,
            image: self.image,
            ingredients: self.ingredients,
            tags: self.tags,
            is_veg: self.is_veg,
            is_available: self.is_available,
            preparation_time_minutes: self.preparation_time_minutes as u32,
            partner_id: self.partner_id,
            rating: Rating {
                average: self.rating_average,
                count: self.rating_count as u32,
            },
            nutrition_info: self
                .nutrition_info
                .map(serde_json::from_value)
                .transpose()?,
            spice_level: self.spice_level.as_deref().map(parse_spice_level).transpose()?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[async_trait]
impl CatalogRepository for StoreCatalogRepository {
    async fn create_partner(&self, partner: &Partner) -> Result<Uuid, RepoError> {
        sqlx::query(
            "INSERT INTO partners (id, name, owner_name, email, phone, business_type, \
             cuisine, address, opening_hours, is_active, is_verified, rating_average, \
             rating_count, bank_details, documents, commission, total_orders, \
             total_revenue, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, \
             $16, $17, $18, $19, $20)",
        )
        .bind(partner.id)
        .bind(&partner.name)
        .bind(&partner.owner_name)
        .bind(&partner.email)
        .bind(&partner.phone)
        .bind(business_type_str(partner.business_type))
        .bind(&partner.cuisine)
        .bind(serde_json::to_value(&partner.address)?)
        .bind(
            partner
                .opening_hours
                .as_ref()
                .map(serde_json::to_value)
                .transpose()?,
        )
        .bind(partner.is_active)
        .bind(partner.is_verified)
        .bind(partner.rating.average)
        .bind(partner.rating.count as i32)
        .bind(
            partner
                .bank_details
                .as_ref()
                .map(serde_json::to_value)
                .transpose()?,
        )
        .bind(serde_json::to_value(&partner.documents)?)
        .bind(partner.commission)
        .bind(partner.total_orders as i64)
        .bind(partner.total_revenue)
        .bind(partner.created_at)
        .bind(partner.updated_at)
        .execute(&self.pool)
        .await?;

        info!(partner_id = %partner.id, name = %partner.name, "partner persisted");
        Ok(partner.id)
    }

    async fn get_partner(&self, id: Uuid) -> Result<Option<Partner>, RepoError> {
        let row = sqlx::query_as::<_, PartnerRow>(&format!("{} WHERE id = $1", SELECT_PARTNER))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(PartnerRow::into_partner).transpose()
    }

    async fn update_partner(&self, partner: &Partner) -> Result<(), RepoError> {
        let result = sqlx::query(
            "UPDATE partners SET name = $2, owner_name = $3, phone = $4, cuisine = $5, \
             address = $6, opening_hours = $7, is_active = $8, is_verified = $9, \
             rating_average = $10, rating_count = $11, bank_details = $12, documents = $13, \
             commission = $14, total_orders = $15, total_revenue = $16, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(partner.id)
        .bind(&partner.name)
        .bind(&partner.owner_name)
        .bind(&partner.phone)
        .bind(&partner.cuisine)
        .bind(serde_json::to_value(&partner.address)?)
        .bind(
            partner
                .opening_hours
                .as_ref()
                .map(serde_json::to_value)
                .transpose()?,
        )
        .bind(partner.is_active)
        .bind(partner.is_verified)
        .bind(partner.rating.average)
        .bind(partner.rating.count as i32)
        .bind(
            partner
                .bank_details
                .as_ref()
                .map(serde_json::to_value)
                .transpose()?,
        )
        .bind(serde_json::to_value(&partner.documents)?)
        .bind(partner.commission)
        .bind(partner.total_orders as i64)
        .bind(partner.total_revenue)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::ReferentialIntegrityError(format!("partner {}", partner.id)).into());
        }
        Ok(())
    }

    async fn create_menu_item(&self, item: &MenuItem) -> Result<Uuid, RepoError> {
        sqlx::query(
            "INSERT INTO menu_items (id, name, description, category, price, \
             discount_price, image, ingredients, tags, is_veg, is_available, \
             preparation_time_minutes, partner_id, rating_average, rating_count, \
             nutrition_info, spice_level, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, \
             $16, $17, $18, $19)",
        )
        .bind(item.id)
        .bind(&item.name)
        .bind(&item.description)
        .bind(category_str(item.category))
        .bind(item.price)
        .bind(item.discount_price)
        .bind(&item.image)
        .bind(&item.ingredients)
        .bind(&item.tags)
        .bind(item.is_veg)
        .bind(item.is_available)
        .bind(item.preparation_time_minutes as i32)
        .bind(item.partner_id)
        .bind(item.rating.average)
        .bind(item.rating.count as i32)
        .bind(
            item.nutrition_info
                .as_ref()
                .map(serde_json::to_value)
                .transpose()?,
        )
        .bind(item.spice_level.map(spice_level_str))
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&self.pool)
        .await?;

        info!(menu_item_id = %item.id, partner_id = %item.partner_id, "menu item persisted");
        Ok(item.id)
    }

    async fn get_menu_item(&self, id: Uuid) -> Result<Option<MenuItem>, RepoError> {
        let row = sqlx::query_as::<_, MenuItemRow>(&format!("{} WHERE id = $1", SELECT_MENU_ITEM))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(MenuItemRow::into_menu_item).transpose()
    }

    async fn list_menu_items(
        &self,
        partner_id: Uuid,
        category: Option<&str>,
    ) -> Result<Vec<MenuItem>, RepoError> {
        let rows = match category {
            Some(category) => {
                sqlx::query_as::<_, MenuItemRow>(&format!(
                    "{} WHERE partner_id = $1 AND category = $2 ORDER BY name ASC",
                    SELECT_MENU_ITEM
                ))
                .bind(partner_id)
                .bind(category)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, MenuItemRow>(&format!(
                    "{} WHERE partner_id = $1 ORDER BY name ASC",
                    SELECT_MENU_ITEM
                ))
                .bind(partner_id)
                .fetch_all(&self.pool)
                .await?
            }
        };

        rows.into_iter().map(MenuItemRow::into_menu_item).collect()
    }

    async fn search_menu_items(&self, query: &str) -> Result<Vec<MenuItem>, RepoError> {
        let pattern = format!("%{}%", query);
        let rows = sqlx::query_as::<_, MenuItemRow>(&format!(
            "{} WHERE is_available AND (name ILIKE $1 OR description ILIKE $1) \
             ORDER BY name ASC",
            SELECT_MENU_ITEM
        ))
        .bind(pattern)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(MenuItemRow::into_menu_item).collect()
    }
}

fn business_type_str(business_type: BusinessType) -> &'static str {
    match business_type {
        BusinessType::Restaurant => "RESTAURANT",
        BusinessType::CloudKitchen => "CLOUD_KITCHEN",
        BusinessType::Cafe => "CAFE",
        BusinessType::Bakery => "BAKERY",
    }
}

fn parse_business_type(s: &str) -> Result<BusinessType, RepoError> {
    match s {
        "RESTAURANT" => Ok(BusinessType::Restaurant),
        "CLOUD_KITCHEN" => Ok(BusinessType::CloudKitchen),
        "CAFE" => Ok(BusinessType::Cafe),
        "BAKERY" => Ok(BusinessType::Bakery),
        other => Err(CoreError::InternalError(format!("unknown business type: {}", other)).into()),
    }
}

fn category_str(category: Category) -> &'static str {
    match category {
        Category::Appetizers => "APPETIZERS",
        Category::MainCourse => "MAIN_COURSE",
        Category::Desserts => "DESSERTS",
        Category::Beverages => "BEVERAGES",
        Category::Specials => "SPECIALS",
    }
}

fn parse_category(s: &str) -> Result<Category, RepoError> {
    match s {
        "APPETIZERS" => Ok(Category::Appetizers),
        "MAIN_COURSE" => Ok(Category::MainCourse),
        "DESSERTS" => Ok(Category::Desserts),
        "BEVERAGES" => Ok(Category::Beverages),
        "SPECIALS" => Ok(Category::Specials),
        other => Err(CoreError::InternalError(format!("unknown category: {}", other)).into()),
    }
}

fn spice_level_str(level: SpiceLevel) -> &'static str {
    match level {
        SpiceLevel::Mild => "MILD",
        SpiceLevel::Medium => "MEDIUM",
        SpiceLevel::Hot => "HOT",
        SpiceLevel::ExtraHot => "EXTRA_HOT",
    }
}

fn parse_spice_level(s: &str) -> Result<SpiceLevel, RepoError> {
    match s {
        "MILD" => Ok(SpiceLevel::Mild),
        "MEDIUM" => Ok(SpiceLevel::Medium),
        "HOT" => Ok(SpiceLevel::Hot),
        "EXTRA_HOT" => Ok(SpiceLevel::ExtraHot),
        other => Err(CoreError::InternalError(format!("unknown spice level: {}", other)).into()),
    }
}
