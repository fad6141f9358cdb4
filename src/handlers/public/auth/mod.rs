pub mod callback;
pub mod logout;
pub mod magic_link;

pub use callback::callback;
pub use logout::logout;
pub use magic_link::magic_link;

/// Post-login destinations must stay on this site.
pub fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') => path,
        _ => "/dashboard",
    }
}
