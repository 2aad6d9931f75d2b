use serde::Deserialize;
use std::env;
use tiffin_core::Sha256Gateway;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub gateway: GatewayConfig,
    pub business_rules: BusinessRules,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GatewayConfig {
    /// Shared secret for verifying gateway callback signatures
    pub key_secret: String,
}

impl GatewayConfig {
    pub fn build_gateway(&self) -> Sha256Gateway {
        Sha256Gateway::new(self.key_secret.clone())
    }
}

/// Checkout pricing knobs applied by the layer assembling orders
#[derive(Debug, Deserialize, Clone)]
pub struct BusinessRules {
    pub tax_rate: f64,
    pub delivery_fee: i64,
    /// Orders at or above this subtotal ship free
    pub free_delivery_above: Option<i64>,
    #[serde(default = "default_commission")]
    pub default_commission: f64,
}

fn default_commission() -> f64 {
    20.0
}

impl BusinessRules {
    /// Tax on a subtotal, rounded to the nearest minor unit
    pub fn tax_for(&self, subtotal: i64) -> i64 {
        (subtotal as f64 * self.tax_rate).round() as i64
    }

    /// Delivery fee for a subtotal, honouring the free-delivery threshold
    pub fn delivery_fee_for(&self, subtotal: i64) -> i64 {
        match self.free_delivery_above {
            Some(threshold) if subtotal >= threshold => 0,
            _ => self.delivery_fee,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            // Start off by merging in the "default" configuration file
            .add_source(config::File::with_name("config/default"))
            // Add in the current environment file (optional)
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Local overrides, not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // Eg. `TIFFIN__SERVER__PORT=8080` sets server.port
            .add_source(config::Environment::with_prefix("TIFFIN").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
