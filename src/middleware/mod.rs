pub mod auth;
pub mod body;
pub mod response;
pub mod session_gate;

pub use auth::CurrentUser;
pub use body::JsonOrForm;
pub use response::{ApiResponse, ApiResult};
pub use session_gate::{is_public_path, session_gate, LOGIN_PATH};
