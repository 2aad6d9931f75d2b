pub mod models;
pub mod pii;

pub use models::{Address, GeoPoint, OpeningHours, Rating};
pub use pii::Masked;
