use crate::backend::Row;
use crate::error::ApiError;
use crate::filter::Condition;
use crate::middleware::CurrentUser;
use crate::models::non_blank;
use crate::state::AppState;

/// A record id from the request body; missing or blank ids are rejected before any backend call.
pub fn require_id(id: &Option<String>) -> Result<String, ApiError> {
    non_blank(id)
        .map(str::to_string)
        .ok_or_else(|| ApiError::missing_field("id"))
}

/// Update one record of `collection`, scoped by record id AND the caller's id in `owner_column`.
///
/// Exactly one backend call. An empty change set is still sent (a no-op write),
/// and a record owned by someone else simply matches zero rows.
pub async fn update_owned(
    state: &AppState,
    current: &CurrentUser,
    collection: &str,
    owner_column: &str,
    id: &str,
    changes: Row,
) -> Result<Vec<Row>, ApiError> {
    let conditions = [
        Condition::eq("id", id),
        Condition::eq(owner_column, current.id()),
    ];

    let updated = state
        .backend
        .update(collection, &changes, &conditions, Some(&current.session))
        .await?;

    tracing::debug!(
        "Updated {} {} for user {}: {} field(s), {} row(s)",
        collection,
        id,
        current.id(),
        changes.len(),
        updated.len()
    );
    Ok(updated)
}
