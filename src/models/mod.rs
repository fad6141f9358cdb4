//! Collections in the hosted store and the typed sparse updates applied to them.

pub mod dentist;
pub mod lead;
pub mod payment;

use serde::Serialize;
use serde_json::Value;

use crate::backend::Row;

pub use dentist::{DentistProfileUpdate, NewDentist, PublishUpdate};
pub use lead::{LeadCapture, LeadStatus, LeadUpdate};
pub use payment::PaymentUpdate;

/// A partial update: only the fields that are `Some` end up in the change set.
pub trait SparseUpdate: Serialize {
    /// Fields left out of the request are left out of the map, never nulled.
    fn changes(&self) -> Row {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Row::new(),
        }
    }
}

/// Blank strings count as missing for required fields.
pub(crate) fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
