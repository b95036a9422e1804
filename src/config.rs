// src/config.rs

use std::{env, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;

use crate::{
    db::{
        CrmRepository, MemoryStore, MovieRepository, PgCrmRepository, PgMovieRepository,
        PgSchoolRepository, PgUserRepository, SchoolRepository, UserRepository,
    },
    services::{
        auth::{AuthService, IdentityProvider},
        crm_service::CrmService,
        movie_service::MovieService,
        school_service::SchoolService,
    },
};

/// Valor de DATABASE_URL que liga o armazenamento em memória.
pub const MEMORY_DATABASE: &str = "memory";

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_addr: String,
    pub db_max_connections: u32,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").context("DATABASE_URL deve ser definida")?;
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET deve ser definido")?;
        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let db_max_connections = match env::var("DB_MAX_CONNECTIONS") {
            Ok(value) => value
                .parse()
                .context("DB_MAX_CONNECTIONS deve ser um número inteiro")?,
            Err(_) => 5,
        };

        Ok(Self {
            database_url,
            jwt_secret,
            bind_addr,
            db_max_connections,
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub identity: Arc<dyn IdentityProvider>,
    pub auth_service: AuthService,
    pub crm_service: CrmService,
    pub movie_service: MovieService,
    pub school_service: SchoolService,
}

impl AppState {
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        if config.database_url == MEMORY_DATABASE {
            tracing::warn!("Usando armazenamento em memória; os dados somem ao reiniciar.");
            let store = Arc::new(MemoryStore::new());
            return Ok(Self::from_repositories(
                store.clone(),
                store.clone(),
                store.clone(),
                store,
                config.jwt_secret.clone(),
            ));
        }

        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.database_url)
            .await
            .context("Falha ao conectar no banco de dados")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        sqlx::migrate!()
            .run(&db_pool)
            .await
            .context("Falha ao rodar as migrações do banco de dados")?;

        tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

        Ok(Self::from_repositories(
            Arc::new(PgUserRepository::new(db_pool.clone())),
            Arc::new(PgCrmRepository::new(db_pool.clone())),
            Arc::new(PgMovieRepository::new(db_pool.clone())),
            Arc::new(PgSchoolRepository::new(db_pool)),
            config.jwt_secret.clone(),
        ))
    }

    // --- Monta o gráfico de dependências ---
    pub fn from_repositories(
        users: Arc<dyn UserRepository>,
        crm: Arc<dyn CrmRepository>,
        movies: Arc<dyn MovieRepository>,
        school: Arc<dyn SchoolRepository>,
        jwt_secret: String,
    ) -> Self {
        let auth_service = AuthService::new(users.clone(), jwt_secret);
        Self::with_auth(auth_service, users, crm, movies, school)
    }

    /// Igual a `from_repositories`, mas com um `AuthService` já configurado
    /// (ex.: custo de hash reduzido nos testes).
    pub fn with_auth(
        auth_service: AuthService,
        users: Arc<dyn UserRepository>,
        crm: Arc<dyn CrmRepository>,
        movies: Arc<dyn MovieRepository>,
        school: Arc<dyn SchoolRepository>,
    ) -> Self {
        Self {
            identity: Arc::new(auth_service.clone()),
            crm_service: CrmService::new(users.clone(), crm),
            movie_service: MovieService::new(movies),
            school_service: SchoolService::new(users, school),
            auth_service,
        }
    }
}
