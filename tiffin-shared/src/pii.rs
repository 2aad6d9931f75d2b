use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Wrapper for sensitive values (bank account numbers, tax document ids)
/// that masks its contents in Debug and Display output.
#[derive(Clone, Deserialize)]
pub struct Masked<T>(pub T);

impl<T: fmt::Display> fmt::Debug for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "********")
    }
}

impl<T: fmt::Display> fmt::Display for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "********")
    }
}

impl<T: Serialize> Serialize for Masked<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        // Serialization keeps the real value: payout processing needs it.
        // The wrapper exists to stop leakage through log macros like
        // tracing::info!("{:?}", partner).
        self.0.serialize(serializer)
    }
}

impl<T> Masked<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl Masked<String> {
    /// Last four characters for receipts ("xxxx-1234" style display)
    pub fn last4(&self) -> &str {
        let start = self
            .0
            .char_indices()
            .rev()
            .take(4)
            .last()
            .map(|(i, _)| i)
            .unwrap_or(0);
        &self.0[start..]
    }
}
