use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tiffin_shared::{Address, Masked, OpeningHours, Rating};
use uuid::Uuid;

use crate::registry::CatalogError;

/// Kinds of vendor accounts that can list menu items
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BusinessType {
    Restaurant,
    CloudKitchen,
    Cafe,
    Bakery,
}

/// Settlement account for partner payouts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankDetails {
    pub account_number: Masked<String>,
    pub ifsc_code: String,
    pub account_holder_name: String,
}

/// Compliance documents captured at onboarding
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PartnerDocuments {
    pub fssai: Option<Masked<String>>,
    pub gst: Option<Masked<String>>,
    pub pan: Option<Masked<String>>,
}

/// A vendor account; owns menu items and fulfils orders
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Partner {
    pub id: Uuid,
    pub name: String,
    pub owner_name: String,
    pub email: String,
    pub phone: String,
    pub business_type: BusinessType,
    pub cuisine: Vec<String>,
    pub address: Address,
    pub opening_hours: Option<OpeningHours>,
    pub is_active: bool,
    pub is_verified: bool,
    pub rating: Rating,
    pub bank_details: Option<BankDetails>,
    pub documents: PartnerDocuments,
    pub commission: f64,
    pub total_orders: u64,
    pub total_revenue: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Unvalidated partner input, as submitted at onboarding
#[derive(Debug, Clone, Deserialize)]
pub struct PartnerDraft {
    pub name: String,
    pub owner_name: String,
    pub email: String,
    pub phone: String,
    pub business_type: BusinessType,
    #[serde(default)]
    pub cuisine: Vec<String>,
    #[serde(default)]
    pub address: Address,
    pub opening_hours: Option<OpeningHours>,
    pub bank_details: Option<BankDetails>,
    #[serde(default)]
    pub documents: PartnerDocuments,
    pub commission: Option<f64>,
}

pub const DEFAULT_COMMISSION: f64 = 20.0;

impl Partner {
    /// Validate a draft into a partner record. New partners start
    /// inactive and unverified; onboarding review flips both flags.
    pub fn try_new(draft: PartnerDraft) -> Result<Self, CatalogError> {
        if draft.name.trim().is_empty() {
            return Err(CatalogError::Validation("partner name is required".into()));
        }
        if draft.owner_name.trim().is_empty() {
            return Err(CatalogError::Validation("owner name is required".into()));
        }
        if draft.phone.trim().is_empty() {
            return Err(CatalogError::Validation("phone is required".into()));
        }

        let email = draft.email.trim().to_lowercase();
        if !email.contains('@') || !email.contains('.') {
            return Err(CatalogError::Validation(format!(
                "invalid email: {}",
                draft.email
            )));
        }

        let commission = draft.commission.unwrap_or(DEFAULT_COMMISSION);
        if !(0.0..=100.0).contains(&commission) {
            return Err(CatalogError::Validation(format!(
                "commission must be within 0-100, got {}",
                commission
            )));
        }

        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            name: draft.name,
            owner_name: draft.owner_name,
            email,
            phone: draft.phone,
            business_type: draft.business_type,
            cuisine: draft.cuisine,
            address: draft.address,
            opening_hours: draft.opening_hours,
            is_active: false,
            is_verified: false,
            rating: Rating::new(),
            bank_details: draft.bank_details,
            documents: draft.documents,
            commission,
            total_orders: 0,
            total_revenue: 0,
            created_at: now,
            updated_at: now,
        })
    }

    /// Whether the partner may receive new orders
    pub fn can_receive_orders(&self) -> bool {
        self.is_active && self.is_verified
    }
}
