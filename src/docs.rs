// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::register,
        handlers::auth::login,

        // --- Users ---
        handlers::auth::get_me,

        // --- CRM ---
        handlers::crm::list_customers,
        handlers::crm::get_customer,
        handlers::crm::create_customer,
        handlers::crm::update_customer,
        handlers::crm::delete_customer,
        handlers::crm::list_commissions,
        handlers::crm::get_commission,
        handlers::crm::create_commission,
        handlers::crm::update_commission,
        handlers::crm::delete_commission,

        // --- Movies ---
        handlers::movies::list_movies,
        handlers::movies::get_good_movies,
        handlers::movies::get_movie,
        handlers::movies::create_movie,
        handlers::movies::update_movie,
        handlers::movies::delete_movie,
        handlers::movies::list_categories,
        handlers::movies::get_category,
        handlers::movies::create_category,
        handlers::movies::update_category,
        handlers::movies::delete_category,

        // --- School ---
        handlers::school::list_students,
        handlers::school::all_students,
        handlers::school::get_student,
        handlers::school::create_student,
        handlers::school::update_student,
        handlers::school::delete_student,
        handlers::school::list_classrooms,
        handlers::school::get_classroom,
        handlers::school::create_classroom,
        handlers::school::update_classroom,
        handlers::school::delete_classroom,
        handlers::school::list_grades,
        handlers::school::get_grade,
        handlers::school::list_classes,
        handlers::school::get_class,
        handlers::school::create_class,
        handlers::school::update_class,
        handlers::school::delete_class,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::Role,
            models::auth::UserProfile,
            models::auth::PrincipalView,
            models::auth::RegisterUserPayload,
            models::auth::LoginUserPayload,
            models::auth::AuthResponse,

            // --- CRM ---
            models::crm::CustomerView,
            models::crm::Commission,
            models::crm::Group,
            models::crm::UserRef,
            models::crm::NewUserPayload,
            models::crm::UserPatch,
            models::crm::CustomerCreatePayload,
            models::crm::CustomerUpdatePayload,
            models::crm::CommissionPayload,
            models::crm::CommissionPatch,

            // --- Movies ---
            models::movie::Category,
            models::movie::MovieView,
            models::movie::CategoryPayload,
            models::movie::MovieCreatePayload,
            models::movie::MovieUpdatePayload,

            // --- School ---
            models::school::Student,
            models::school::StudentRegistration,
            models::school::StudentPayload,
            models::school::StudentUpdatePayload,
            models::school::ClassroomView,
            models::school::ClassroomPayload,
            models::school::ClassroomPatch,
            models::school::Grade,
            models::school::Class,
            models::school::ClassAddPayload,
            models::school::ClassUpdatePayload,
        )
    ),
    tags(
        (name = "Auth", description = "Autenticação e Registro"),
        (name = "Users", description = "Dados do Usuário e Papéis"),
        (name = "CRM", description = "Clientes e Comissões"),
        (name = "Movies", description = "Filmes e Categorias"),
        (name = "School", description = "Alunos, Salas, Notas e Aulas")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_scoped_paths() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/v1/customers/{id}/"));
        assert!(doc.paths.paths.contains_key("/api/v1/movies/get_good_movies/"));
    }
}
