pub mod events;

use serde::{Deserialize, Serialize};

/// Geographic coordinates for delivery routing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

/// Postal address shared by partners and order deliveries
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Address {
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub coordinates: Option<GeoPoint>,
}

/// Partner opening hours (local time, "HH:MM")
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpeningHours {
    pub open: String,
    pub close: String,
}

/// Running average rating, bounded to [0, 5]
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Rating {
    pub average: f64,
    pub count: u32,
}

impl Rating {
    pub fn new() -> Self {
        Self {
            average: 0.0,
            count: 0,
        }
    }

    /// Fold a new score into the running average, clamping into bounds
    pub fn add(&mut self, score: f64) {
        let score = score.clamp(0.0, 5.0);
        let total = self.average * self.count as f64 + score;
        self.count += 1;
        self.average = total / self.count as f64;
    }
}

impl Default for Rating {
    fn default() -> Self {
        Self::new()
    }
}
