use serde::{Deserialize, Serialize};

use super::{non_blank, SparseUpdate};
use crate::backend::Row;

pub const COLLECTION: &str = "dentists";
pub const OWNER_COLUMN: &str = "user_id";

/// Public microsite path for a provider slug.
pub fn page_path(slug: &str) -> String {
    format!("/dentists/{}", slug)
}

/// Slugs are chosen during onboarding: lowercase letters, digits and single dashes.
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug.len() <= 80
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && !slug.contains("--")
        && slug.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

/// `POST /api/dentists/update` body. Slug and publication are not editable here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DentistProfileUpdate {
    #[serde(skip_serializing)]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub practice_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accepting_new_patients: Option<bool>,
}

impl SparseUpdate for DentistProfileUpdate {}

/// `POST /api/dentists/publish` body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PublishUpdate {
    #[serde(skip_serializing)]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published: Option<bool>,
}

impl SparseUpdate for PublishUpdate {}

/// `POST /api/onboarding` body: the caller's first provider profile.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewDentist {
    pub slug: Option<String>,
    pub display_name: Option<String>,
    pub practice_name: Option<String>,
    pub bio: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub website: Option<String>,
}

impl NewDentist {
    /// Row to insert for `user_id`; new profiles start unpublished.
    pub fn into_row(self, user_id: &str) -> Row {
        let mut row = Row::new();
        row.insert("user_id".to_string(), user_id.into());
        row.insert("published".to_string(), false.into());
        row.insert("accepting_new_patients".to_string(), true.into());

        let fields = [
            ("slug", non_blank(&self.slug).map(str::to_string)),
            ("display_name", non_blank(&self.display_name).map(str::to_string)),
            ("practice_name", self.practice_name),
            ("bio", self.bio),
            ("phone", self.phone),
            ("email", self.email),
            ("address", self.address),
            ("city", self.city),
            ("website", self.website),
        ];
        for (key, value) in fields {
            if let Some(value) = value {
                row.insert(key.to_string(), value.into());
            }
        }
        row
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn profile_update_is_sparse() {
        let update: DentistProfileUpdate = serde_json::from_value(json!({
            "id": "D1",
            "bio": "Family dentistry since 1998",
            "accepting_new_patients": false
        }))
        .unwrap();
        assert_eq!(
            serde_json::Value::Object(update.changes()),
            json!({"bio": "Family dentistry since 1998", "accepting_new_patients": false})
        );
    }

    #[test]
    fn slug_rules() {
        assert!(is_valid_slug("smile-studio-austin"));
        assert!(is_valid_slug("dr-lee-2"));
        assert!(!is_valid_slug(""));
        assert!(!is_valid_slug("Smile"));
        assert!(!is_valid_slug("-smile"));
        assert!(!is_valid_slug("smile--studio"));
        assert!(!is_valid_slug("smile/studio"));
    }

    #[test]
    fn onboarding_row_is_owned_and_unpublished() {
        let row = NewDentist {
            slug: Some("smile-studio".to_string()),
            display_name: Some("Dr. Lee".to_string()),
            city: Some("Austin".to_string()),
            ..NewDentist::default()
        }
        .into_row("u1");
        assert_eq!(row["user_id"], "u1");
        assert_eq!(row["published"], false);
        assert_eq!(row["slug"], "smile-studio");
        assert_eq!(row["city"], "Austin");
        assert!(!row.contains_key("bio"));
    }
}
