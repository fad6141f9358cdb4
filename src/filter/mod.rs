pub mod types;
pub mod filter_where;
pub mod filter_order;
pub mod error;

pub use types::*;
pub use error::FilterError;
pub use filter_order::FilterOrder;
pub use filter_where::FilterWhere;

/// Collection and column names are plain identifiers: `[A-Za-z_][A-Za-z0-9_]*`.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

pub fn validate_collection(name: &str) -> Result<(), FilterError> {
    if is_identifier(name) {
        Ok(())
    } else {
        Err(FilterError::InvalidCollection(name.to_string()))
    }
}
