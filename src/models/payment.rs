use serde::{Deserialize, Serialize};

use super::SparseUpdate;

pub const COLLECTION: &str = "payments";
pub const OWNER_COLUMN: &str = "created_by";

/// `POST /api/payments/update` body. Payment status is free-form in the store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaymentUpdate {
    #[serde(skip_serializing)]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl SparseUpdate for PaymentUpdate {}
