pub mod auth;
pub mod crm;
pub mod movies;
pub mod school;
