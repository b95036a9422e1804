// src/models/movie.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Nota mínima para um filme entrar em "bons filmes".
pub const GOOD_MOVIE_RATING: i32 = 4;

#[derive(Debug, Clone, PartialEq, Serialize, FromRow, ToSchema)]
pub struct Category {
    pub id: i64,
    pub title: Option<String>,
    pub create_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Movie {
    pub id: i64,
    pub title: Option<String>,
    pub sinopse: Option<String>,
    pub rating: i32,
    pub censure: i32,
    #[sqlx(rename = "liked")]
    pub like: bool,
    pub category_id: Option<i64>,
    pub create_date: DateTime<Utc>,
}

/// Filme com a categoria (sub-recurso) carregada.
#[derive(Debug, Clone, PartialEq)]
pub struct MovieRecord {
    pub movie: Movie,
    pub category: Option<Category>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MovieView {
    pub id: i64,
    pub title: Option<String>,
    pub sinopse: Option<String>,
    pub rating: i32,
    pub censure: i32,
    pub like: bool,
    pub category: Option<Category>,
    pub create_date: DateTime<Utc>,
}

impl From<MovieRecord> for MovieView {
    fn from(record: MovieRecord) -> Self {
        let MovieRecord { movie, category } = record;
        Self {
            id: movie.id,
            title: movie.title,
            sinopse: movie.sinopse,
            rating: movie.rating,
            censure: movie.censure,
            like: movie.like,
            category,
            create_date: movie.create_date,
        }
    }
}

// --- PAYLOADS ---

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct CategoryPayload {
    #[validate(length(max = 255))]
    #[schema(example = "Drama")]
    pub title: Option<String>,
}

impl CategoryPayload {
    /// Atualização parcial da categoria aninhada.
    pub fn apply_to(&self, category: &mut Category) {
        if let Some(title) = &self.title {
            category.title = Some(title.clone());
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct MovieCreatePayload {
    #[validate(length(max = 255))]
    #[schema(example = "O Lobo de Wall Street")]
    pub title: Option<String>,
    #[validate(length(max = 255))]
    pub sinopse: Option<String>,
    #[validate(range(min = 0, message = "A nota não pode ser negativa."))]
    #[schema(example = 5)]
    pub rating: i32,
    #[validate(range(min = 0, message = "A censura não pode ser negativa."))]
    #[serde(default)]
    #[schema(example = 18)]
    pub censure: i32,
    pub like: bool,
    #[validate(nested)]
    pub category: Option<CategoryPayload>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct MovieUpdatePayload {
    #[validate(length(max = 255))]
    pub title: Option<String>,
    #[validate(length(max = 255))]
    pub sinopse: Option<String>,
    #[validate(range(min = 0, message = "A nota não pode ser negativa."))]
    pub rating: Option<i32>,
    #[validate(range(min = 0, message = "A censura não pode ser negativa."))]
    pub censure: Option<i32>,
    pub like: Option<bool>,
    #[validate(nested)]
    pub category: Option<CategoryPayload>,
}

impl MovieUpdatePayload {
    pub fn apply_to(&self, movie: &mut Movie) {
        if let Some(title) = &self.title {
            movie.title = Some(title.clone());
        }
        if let Some(sinopse) = &self.sinopse {
            movie.sinopse = Some(sinopse.clone());
        }
        if let Some(rating) = self.rating {
            movie.rating = rating;
        }
        if let Some(censure) = self.censure {
            movie.censure = censure;
        }
        if let Some(like) = self.like {
            movie.like = like;
        }
    }
}

/// Títulos de teste não são aceitos.
pub fn is_placeholder_title(title: Option<&str>) -> bool {
    title.is_some_and(|t| t.trim().eq_ignore_ascii_case("lorem"))
}

// --- ENTRADAS DO REPOSITÓRIO ---

#[derive(Debug, Clone)]
pub struct NewMovie {
    pub title: Option<String>,
    pub sinopse: Option<String>,
    pub rating: i32,
    pub censure: i32,
    pub like: bool,
    pub category: Option<CategoryPayload>,
}

/// O que fazer com a categoria ao salvar um filme.
#[derive(Debug, Clone)]
pub enum CategoryChange {
    Keep,
    Update(Category),
    Create(CategoryPayload),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_title_is_case_insensitive() {
        assert!(is_placeholder_title(Some("lorem")));
        assert!(is_placeholder_title(Some("Lorem ")));
        assert!(!is_placeholder_title(Some("Lorem ipsum")));
        assert!(!is_placeholder_title(None));
    }

    #[test]
    fn update_payload_keeps_absent_fields() {
        let mut movie = Movie {
            id: 1,
            title: Some("Matrix".into()),
            sinopse: Some("Neo".into()),
            rating: 5,
            censure: 14,
            like: true,
            category_id: None,
            create_date: Utc::now(),
        };
        let patch: MovieUpdatePayload =
            serde_json::from_value(serde_json::json!({ "rating": 3 })).unwrap();

        patch.apply_to(&mut movie);

        assert_eq!(movie.rating, 3);
        assert_eq!(movie.title.as_deref(), Some("Matrix"));
        assert_eq!(movie.censure, 14);
    }
}
