use serde::{Deserialize, Serialize};

use super::SparseUpdate;

pub const COLLECTION: &str = "leads";
pub const OWNER_COLUMN: &str = "created_by";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeadStatus {
    New,
    Open,
    Closed,
}

impl LeadStatus {
    pub const ALL: [LeadStatus; 3] = [LeadStatus::New, LeadStatus::Open, LeadStatus::Closed];

    pub fn as_str(&self) -> &'static str {
        match self {
            LeadStatus::New => "new",
            LeadStatus::Open => "open",
            LeadStatus::Closed => "closed",
        }
    }
}

/// `POST /api/leads/update` body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeadUpdate {
    #[serde(skip_serializing)]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<LeadStatus>,
}

impl SparseUpdate for LeadUpdate {}

/// `POST /api/leads/capture` body, submitted from a published provider microsite.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LeadCapture {
    pub provider_id: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub message: Option<String>,
    pub source: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn only_provided_fields_are_changed() {
        let update: LeadUpdate = serde_json::from_value(json!({"id": "L1", "status": "closed"})).unwrap();
        assert_eq!(serde_json::Value::Object(update.changes()), json!({"status": "closed"}));
    }

    #[test]
    fn no_fields_means_empty_change_set() {
        let update: LeadUpdate = serde_json::from_value(json!({"id": "L1"})).unwrap();
        assert!(update.changes().is_empty());

        let nulls: LeadUpdate = serde_json::from_value(json!({"id": "L1", "note": null, "status": null})).unwrap();
        assert!(nulls.changes().is_empty());
    }

    #[test]
    fn empty_note_is_still_a_change() {
        let update: LeadUpdate = serde_json::from_value(json!({"id": "L1", "note": ""})).unwrap();
        assert_eq!(serde_json::Value::Object(update.changes()), json!({"note": ""}));
    }

    #[test]
    fn unknown_status_is_rejected() {
        assert!(serde_json::from_value::<LeadUpdate>(json!({"id": "L1", "status": "won"})).is_err());
    }
}
