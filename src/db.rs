pub mod user_repo;
pub use user_repo::{PgUserRepository, UserRepository};
pub mod crm_repo;
pub use crm_repo::{CrmRepository, CustomerQuery, PgCrmRepository};
pub mod movie_repo;
pub use movie_repo::{MovieRepository, PgMovieRepository};
pub mod school_repo;
pub use school_repo::{PgSchoolRepository, SchoolRepository};
pub mod memory;
pub use memory::MemoryStore;

use crate::common::error::AppError;

/// Converte violação de chave única no erro amigável; o resto vira DatabaseError.
pub(crate) fn unique_violation_or(e: sqlx::Error, friendly: AppError) -> AppError {
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() {
            return friendly;
        }
    }
    e.into()
}
