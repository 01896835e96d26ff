pub mod admin;
pub mod gate;
pub mod response;
pub mod session;

pub use admin::require_admin;
pub use gate::{challenge_location, gate_middleware};
pub use response::{ApiResponse, ApiResult};
pub use session::{expired_session_cookie, SessionHandle};
