// src/db/movie_repo.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use crate::{
    common::error::AppError,
    models::movie::{Category, CategoryChange, CategoryPayload, Movie, MovieRecord, NewMovie},
};

#[async_trait]
pub trait MovieRepository: Send + Sync {
    /// Filmes por ordem de criação; `min_rating` filtra os "bons filmes".
    async fn list_movies(&self, min_rating: Option<i32>) -> Result<Vec<MovieRecord>, AppError>;

    async fn find_movie(&self, id: i64) -> Result<Option<MovieRecord>, AppError>;

    /// Cria a categoria aninhada (se houver) e o filme na mesma transação.
    async fn create_movie(&self, movie: NewMovie) -> Result<MovieRecord, AppError>;

    /// Aplica a mudança da categoria e depois grava o filme, tudo ou nada.
    async fn save_movie(&self, movie: &Movie, category: CategoryChange) -> Result<MovieRecord, AppError>;

    async fn list_categories(&self) -> Result<Vec<Category>, AppError>;

    async fn find_category(&self, id: i64) -> Result<Option<Category>, AppError>;

    async fn create_category(&self, category: CategoryPayload) -> Result<Category, AppError>;

    async fn save_category(&self, category: &Category) -> Result<Category, AppError>;

    async fn delete_category(&self, id: i64) -> Result<bool, AppError>;
}

#[derive(Debug, FromRow)]
struct MovieRow {
    #[sqlx(flatten)]
    movie: Movie,
    category_title: Option<String>,
    category_create_date: Option<DateTime<Utc>>,
}

impl From<MovieRow> for MovieRecord {
    fn from(row: MovieRow) -> Self {
        let category = match (row.movie.category_id, row.category_create_date) {
            (Some(id), Some(create_date)) => Some(Category {
                id,
                title: row.category_title,
                create_date,
            }),
            _ => None,
        };
        MovieRecord {
            movie: row.movie,
            category,
        }
    }
}

const MOVIE_SELECT: &str = r#"
    SELECT
        m.id, m.title, m.sinopse, m.rating, m.censure, m.liked, m.category_id, m.create_date,
        c.title AS category_title, c.create_date AS category_create_date
    FROM movies m
    LEFT JOIN categories c ON c.id = m.category_id
"#;

#[derive(Clone)]
pub struct PgMovieRepository {
    pool: PgPool,
}

impl PgMovieRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MovieRepository for PgMovieRepository {
    async fn list_movies(&self, min_rating: Option<i32>) -> Result<Vec<MovieRecord>, AppError> {
        let sql = format!(
            "{} WHERE ($1::INTEGER IS NULL OR m.rating >= $1) ORDER BY m.id ASC",
            MOVIE_SELECT
        );
        let rows = sqlx::query_as::<_, MovieRow>(&sql)
            .bind(min_rating)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(MovieRecord::from).collect())
    }

    async fn find_movie(&self, id: i64) -> Result<Option<MovieRecord>, AppError> {
        let sql = format!("{} WHERE m.id = $1", MOVIE_SELECT);
        let row = sqlx::query_as::<_, MovieRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(MovieRecord::from))
    }

    async fn create_movie(&self, movie: NewMovie) -> Result<MovieRecord, AppError> {
        let mut tx = self.pool.begin().await?;

        let category_id = match &movie.category {
            Some(category) => Some(
                sqlx::query_scalar::<_, i64>("INSERT INTO categories (title) VALUES ($1) RETURNING id")
                    .bind(&category.title)
                    .fetch_one(&mut *tx)
                    .await?,
            ),
            None => None,
        };

        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO movies (title, sinopse, rating, censure, liked, category_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(&movie.title)
        .bind(&movie.sinopse)
        .bind(movie.rating)
        .bind(movie.censure)
        .bind(movie.like)
        .bind(category_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        self.find_movie(id).await?.ok_or(AppError::NotFound("Filme"))
    }

    async fn save_movie(&self, movie: &Movie, category: CategoryChange) -> Result<MovieRecord, AppError> {
        let mut tx = self.pool.begin().await?;

        let category_id = match category {
            CategoryChange::Keep => movie.category_id,
            CategoryChange::Update(category) => {
                sqlx::query("UPDATE categories SET title = $2 WHERE id = $1")
                    .bind(category.id)
                    .bind(&category.title)
                    .execute(&mut *tx)
                    .await?;
                Some(category.id)
            }
            CategoryChange::Create(payload) => Some(
                sqlx::query_scalar::<_, i64>("INSERT INTO categories (title) VALUES ($1) RETURNING id")
                    .bind(&payload.title)
                    .fetch_one(&mut *tx)
                    .await?,
            ),
        };

        sqlx::query(
            r#"
            UPDATE movies
            SET title = $2, sinopse = $3, rating = $4, censure = $5, liked = $6, category_id = $7
            WHERE id = $1
            "#,
        )
        .bind(movie.id)
        .bind(&movie.title)
        .bind(&movie.sinopse)
        .bind(movie.rating)
        .bind(movie.censure)
        .bind(movie.like)
        .bind(category_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        self.find_movie(movie.id).await?.ok_or(AppError::NotFound("Filme"))
    }

    async fn list_categories(&self) -> Result<Vec<Category>, AppError> {
        let categories = sqlx::query_as::<_, Category>("SELECT * FROM categories ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await?;
        Ok(categories)
    }

    async fn find_category(&self, id: i64) -> Result<Option<Category>, AppError> {
        let category = sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(category)
    }

    async fn create_category(&self, category: CategoryPayload) -> Result<Category, AppError> {
        let created = sqlx::query_as::<_, Category>(
            "INSERT INTO categories (title) VALUES ($1) RETURNING *",
        )
        .bind(&category.title)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    async fn save_category(&self, category: &Category) -> Result<Category, AppError> {
        sqlx::query_as::<_, Category>("UPDATE categories SET title = $2 WHERE id = $1 RETURNING *")
            .bind(category.id)
            .bind(&category.title)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AppError::NotFound("Categoria"))
    }

    async fn delete_category(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
