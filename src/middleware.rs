pub mod auth;
pub mod forbidden;
