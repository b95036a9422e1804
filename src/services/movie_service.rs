// src/services/movie_service.rs

use std::sync::Arc;

use crate::{
    common::{error::AppError, scope::DeletePolicy},
    db::MovieRepository,
    models::{
        auth::Principal,
        movie::{
            is_placeholder_title, Category, CategoryChange, CategoryPayload, MovieCreatePayload,
            MovieRecord, MovieUpdatePayload, MovieView, NewMovie, GOOD_MOVIE_RATING,
        },
    },
};

const CENSURED: &str = "Este filme não é permitido para este perfil.";
const MOVIE_DELETE: DeletePolicy = DeletePolicy::Forbidden("Nenhum registro pode ser deletado.");

#[derive(Clone)]
pub struct MovieService {
    repo: Arc<dyn MovieRepository>,
}

impl MovieService {
    pub fn new(repo: Arc<dyn MovieRepository>) -> Self {
        Self { repo }
    }

    // =========================================================================
    //  FILMES
    // =========================================================================

    /// A listagem não aplica a censura; só o detalhe.
    pub async fn list_movies(&self) -> Result<Vec<MovieView>, AppError> {
        let records = self.repo.list_movies(None).await?;
        Ok(records.into_iter().map(MovieView::from).collect())
    }

    pub async fn good_movies(&self) -> Result<Vec<MovieView>, AppError> {
        let records = self.repo.list_movies(Some(GOOD_MOVIE_RATING)).await?;
        Ok(records.into_iter().map(MovieView::from).collect())
    }

    pub async fn get_movie(&self, principal: &Principal, id: i64) -> Result<MovieView, AppError> {
        let record = self.find_watchable(principal, id).await?;
        Ok(MovieView::from(record))
    }

    pub async fn create_movie(&self, payload: MovieCreatePayload) -> Result<MovieView, AppError> {
        reject_placeholder(payload.title.as_deref())?;

        let record = self
            .repo
            .create_movie(NewMovie {
                title: payload.title,
                sinopse: payload.sinopse,
                rating: payload.rating,
                censure: payload.censure,
                like: payload.like,
                category: payload.category,
            })
            .await?;

        tracing::info!(movie_id = record.movie.id, "Filme criado");
        Ok(MovieView::from(record))
    }

    /// Categoria primeiro (criada se o filme não tinha), depois os campos do filme.
    pub async fn update_movie(
        &self,
        principal: &Principal,
        id: i64,
        payload: MovieUpdatePayload,
    ) -> Result<MovieView, AppError> {
        let MovieRecord { mut movie, category } = self.find_watchable(principal, id).await?;
        reject_placeholder(payload.title.as_deref())?;

        let category_change = match (&payload.category, category) {
            (None, _) => CategoryChange::Keep,
            (Some(patch), Some(mut current)) => {
                patch.apply_to(&mut current);
                CategoryChange::Update(current)
            }
            (Some(patch), None) => CategoryChange::Create(patch.clone()),
        };

        payload.apply_to(&mut movie);

        let record = self.repo.save_movie(&movie, category_change).await?;
        Ok(MovieView::from(record))
    }

    /// Nenhum filme pode ser removido, por nenhum perfil.
    pub async fn delete_movie(&self, _id: i64) -> Result<(), AppError> {
        MOVIE_DELETE.check()
    }

    async fn find_watchable(&self, principal: &Principal, id: i64) -> Result<MovieRecord, AppError> {
        let record = self
            .repo
            .find_movie(id)
            .await?
            .ok_or(AppError::NotFound("Filme"))?;

        if !principal.may_watch(record.movie.censure) {
            return Err(AppError::permission_denied(CENSURED));
        }
        Ok(record)
    }

    // =========================================================================
    //  CATEGORIAS
    // =========================================================================

    pub async fn list_categories(&self) -> Result<Vec<Category>, AppError> {
        self.repo.list_categories().await
    }

    pub async fn get_category(&self, id: i64) -> Result<Category, AppError> {
        self.repo.find_category(id).await?.ok_or(AppError::NotFound("Categoria"))
    }

    pub async fn create_category(&self, payload: CategoryPayload) -> Result<Category, AppError> {
        self.repo.create_category(payload).await
    }

    pub async fn update_category(&self, id: i64, payload: CategoryPayload) -> Result<Category, AppError> {
        let mut category = self.get_category(id).await?;
        payload.apply_to(&mut category);
        self.repo.save_category(&category).await
    }

    pub async fn delete_category(&self, id: i64) -> Result<(), AppError> {
        if !self.repo.delete_category(id).await? {
            return Err(AppError::NotFound("Categoria"));
        }
        Ok(())
    }
}

fn reject_placeholder(title: Option<&str>) -> Result<(), AppError> {
    if is_placeholder_title(title) {
        return Err(AppError::field("non_field_errors", "Lorem não pode."));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    use crate::db::MemoryStore;
    use crate::models::auth::Role;

    fn service() -> MovieService {
        MovieService::new(Arc::new(MemoryStore::new()))
    }

    fn principal(roles: &[Role]) -> Principal {
        Principal {
            id: 1,
            username: "jordan".into(),
            roles: roles.iter().copied().collect::<BTreeSet<_>>(),
        }
    }

    fn movie(title: &str, rating: i32, censure: i32) -> MovieCreatePayload {
        serde_json::from_value(serde_json::json!({
            "title": title,
            "rating": rating,
            "censure": censure,
            "like": true,
            "category": { "title": "Drama" }
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn child_cannot_open_censured_movie() {
        let service = service();
        let created = service.create_movie(movie("Coringa", 5, 16)).await.unwrap();

        let child = principal(&[Role::Child]);
        assert!(matches!(
            service.get_movie(&child, created.id).await,
            Err(AppError::PermissionDenied(_))
        ));
        // Na listagem o filme continua aparecendo
        assert_eq!(service.list_movies().await.unwrap().len(), 1);

        let adult = principal(&[]);
        assert_eq!(service.get_movie(&adult, created.id).await.unwrap().id, created.id);
    }

    #[tokio::test]
    async fn good_movies_have_rating_of_at_least_four() {
        let service = service();
        service.create_movie(movie("Bom", 4, 0)).await.unwrap();
        service.create_movie(movie("Ruim", 3, 0)).await.unwrap();

        let good = service.good_movies().await.unwrap();
        assert_eq!(good.len(), 1);
        assert_eq!(good[0].title.as_deref(), Some("Bom"));
    }

    #[tokio::test]
    async fn lorem_title_is_rejected() {
        let service = service();
        match service.create_movie(movie("LOREM", 1, 0)).await {
            Err(AppError::FieldErrors(errors)) => {
                assert_eq!(errors["non_field_errors"], vec!["Lorem não pode.".to_string()]);
            }
            other => panic!("esperava erro de validação, veio {:?}", other.map(|m| m.id)),
        }
    }

    #[tokio::test]
    async fn update_patches_nested_category() {
        let service = service();
        let created = service.create_movie(movie("Matrix", 5, 0)).await.unwrap();
        let category_id = created.category.as_ref().map(|c| c.id);

        let patch: MovieUpdatePayload = serde_json::from_value(serde_json::json!({
            "rating": 4,
            "category": { "title": "Ficção" }
        }))
        .unwrap();
        let updated = service
            .update_movie(&principal(&[]), created.id, patch)
            .await
            .unwrap();

        assert_eq!(updated.rating, 4);
        assert_eq!(updated.category.as_ref().map(|c| c.id), category_id);
        assert_eq!(
            updated.category.and_then(|c| c.title).as_deref(),
            Some("Ficção")
        );
    }

    #[tokio::test]
    async fn movies_are_never_deleted() {
        let service = service();
        assert!(matches!(
            service.delete_movie(12345).await,
            Err(AppError::PermissionDenied(_))
        ));
    }
}
