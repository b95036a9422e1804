pub mod auth;
pub mod crm;
pub mod movie;
pub mod school;
