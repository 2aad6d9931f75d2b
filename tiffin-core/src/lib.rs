pub mod payment;

pub use payment::{GatewayCharge, PaymentGateway, Sha256Gateway};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error("Referential integrity violated: {0}")]
    ReferentialIntegrityError(String),
    #[error("Internal service error: {0}")]
    InternalError(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
