use crate::menu::MenuItem;
use crate::partner::Partner;
use async_trait::async_trait;
use uuid::Uuid;

/// Repository trait for partner and menu data access
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    async fn create_partner(
        &self,
        partner: &Partner,
    ) -> Result<Uuid, Box<dyn std::error::Error + Send + Sync>>;

    async fn get_partner(
        &self,
        id: Uuid,
    ) -> Result<Option<Partner>, Box<dyn std::error::Error + Send + Sync>>;

    async fn update_partner(
        &self,
        partner: &Partner,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    async fn create_menu_item(
        &self,
        item: &MenuItem,
    ) -> Result<Uuid, Box<dyn std::error::Error + Send + Sync>>;

    async fn get_menu_item(
        &self,
        id: Uuid,
    ) -> Result<Option<MenuItem>, Box<dyn std::error::Error + Send + Sync>>;

    async fn list_menu_items(
        &self,
        partner_id: Uuid,
        category: Option<&str>,
    ) -> Result<Vec<MenuItem>, Box<dyn std::error::Error + Send + Sync>>;

    async fn search_menu_items(
        &self,
        query: &str,
    ) -> Result<Vec<MenuItem>, Box<dyn std::error::Error + Send + Sync>>;
}
