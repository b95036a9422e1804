pub mod auth;
pub mod crm_service;
pub mod movie_service;
pub mod school_service;
