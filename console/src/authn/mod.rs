//! Session authentication and permissions

pub mod permissions;
pub mod session;
pub mod session_token;
