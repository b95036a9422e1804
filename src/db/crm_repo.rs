// src/db/crm_repo.rs

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};

use crate::{
    common::{error::AppError, scope::OwnerScope},
    db::unique_violation_or,
    models::{
        auth::UserProfile,
        crm::{Commission, Customer, CustomerRecord, Group, NewCustomer, NewCustomerUser},
    },
};

/// Consulta de clientes já com o escopo do principal resolvido.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomerQuery {
    pub scope: OwnerScope,
    pub active: Option<bool>,
    pub search: Option<String>,
}

impl CustomerQuery {
    /// Mesma regra do SQL de `list_customers`, para os repositórios em memória.
    pub fn matches(&self, record: &CustomerRecord) -> bool {
        if !self.scope.admits(record.customer.seller_id) {
            return false;
        }
        if let Some(active) = self.active {
            if record.customer.active != active {
                return false;
            }
        }
        match self.search.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(term) => {
                let term = term.to_lowercase();
                let customer = &record.customer;
                let mut haystack = vec![
                    record.user.first_name.as_str(),
                    record.user.last_name.as_str(),
                    record.user.email.as_str(),
                ];
                if let Some(seller) = &record.seller {
                    haystack.extend([
                        seller.first_name.as_str(),
                        seller.last_name.as_str(),
                        seller.email.as_str(),
                    ]);
                }
                haystack.extend(
                    [&customer.rg, &customer.cpf, &customer.cep, &customer.address]
                        .into_iter()
                        .filter_map(|v| v.as_deref()),
                );
                haystack.iter().any(|v| v.to_lowercase().contains(&term))
            }
        }
    }
}

#[async_trait]
pub trait CrmRepository: Send + Sync {
    async fn list_customers(&self, query: &CustomerQuery) -> Result<Vec<CustomerRecord>, AppError>;

    async fn find_customer(&self, id: i64) -> Result<Option<CustomerRecord>, AppError>;

    /// Cria o cliente e, se for o caso, o usuário aninhado na mesma transação.
    async fn create_customer(&self, customer: NewCustomer) -> Result<CustomerRecord, AppError>;

    /// Grava o usuário aninhado e depois o cliente, tudo ou nada.
    async fn save_customer(
        &self,
        customer: &Customer,
        user: &UserProfile,
    ) -> Result<CustomerRecord, AppError>;

    async fn delete_customer(&self, id: i64) -> Result<bool, AppError>;

    async fn find_group(&self, id: i64) -> Result<Option<Group>, AppError>;

    async fn list_commissions(&self) -> Result<Vec<Commission>, AppError>;

    async fn find_commission(&self, id: i64) -> Result<Option<Commission>, AppError>;

    async fn create_commission(&self, group_id: i64, percentage: Decimal) -> Result<Commission, AppError>;

    async fn save_commission(&self, commission: &Commission) -> Result<Commission, AppError>;

    async fn delete_commission(&self, id: i64) -> Result<bool, AppError>;
}

// Linha "achatada" do JOIN clientes + usuário + vendedor
#[derive(Debug, FromRow)]
struct CustomerRow {
    id: i64,
    user_id: i64,
    seller_id: Option<i64>,
    rg: Option<String>,
    cpf: Option<String>,
    cep: Option<String>,
    address: Option<String>,
    active: bool,
    user_username: String,
    user_first_name: String,
    user_last_name: String,
    user_email: String,
    seller_username: Option<String>,
    seller_first_name: Option<String>,
    seller_last_name: Option<String>,
    seller_email: Option<String>,
}

impl From<CustomerRow> for CustomerRecord {
    fn from(row: CustomerRow) -> Self {
        let seller = match (row.seller_id, row.seller_username) {
            (Some(id), Some(username)) => Some(UserProfile {
                id,
                username,
                first_name: row.seller_first_name.unwrap_or_default(),
                last_name: row.seller_last_name.unwrap_or_default(),
                email: row.seller_email.unwrap_or_default(),
            }),
            _ => None,
        };

        CustomerRecord {
            customer: Customer {
                id: row.id,
                user_id: row.user_id,
                seller_id: row.seller_id,
                rg: row.rg,
                cpf: row.cpf,
                cep: row.cep,
                address: row.address,
                active: row.active,
            },
            user: UserProfile {
                id: row.user_id,
                username: row.user_username,
                first_name: row.user_first_name,
                last_name: row.user_last_name,
                email: row.user_email,
            },
            seller,
        }
    }
}

const CUSTOMER_SELECT: &str = r#"
    SELECT
        c.id, c.user_id, c.seller_id, c.rg, c.cpf, c.cep, c.address, c.active,
        u.username AS user_username, u.first_name AS user_first_name,
        u.last_name AS user_last_name, u.email AS user_email,
        s.username AS seller_username, s.first_name AS seller_first_name,
        s.last_name AS seller_last_name, s.email AS seller_email
    FROM customers c
    JOIN users u ON u.id = c.user_id
    LEFT JOIN users s ON s.id = c.seller_id
"#;

#[derive(Clone)]
pub struct PgCrmRepository {
    pool: PgPool,
}

impl PgCrmRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// O termo de busca é literal: '%' e '_' não podem virar curingas
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for ch in term.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

#[async_trait]
impl CrmRepository for PgCrmRepository {
    async fn list_customers(&self, query: &CustomerQuery) -> Result<Vec<CustomerRecord>, AppError> {
        let search = query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", escape_like(s)));

        let sql = format!(
            r#"{}
            WHERE ($1::BIGINT IS NULL OR c.seller_id = $1)
              AND ($2::BOOLEAN IS NULL OR c.active = $2)
              AND ($3::TEXT IS NULL
                   OR u.first_name ILIKE $3 ESCAPE '\' OR u.last_name ILIKE $3 ESCAPE '\'
                   OR u.email ILIKE $3 ESCAPE '\' OR s.first_name ILIKE $3 ESCAPE '\'
                   OR s.last_name ILIKE $3 ESCAPE '\' OR s.email ILIKE $3 ESCAPE '\'
                   OR c.rg ILIKE $3 ESCAPE '\' OR c.cpf ILIKE $3 ESCAPE '\'
                   OR c.cep ILIKE $3 ESCAPE '\' OR c.address ILIKE $3 ESCAPE '\')
            ORDER BY u.first_name ASC, c.id ASC
            "#,
            CUSTOMER_SELECT
        );

        let rows = sqlx::query_as::<_, CustomerRow>(&sql)
            .bind(query.scope.owner_id())
            .bind(query.active)
            .bind(search)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(CustomerRecord::from).collect())
    }

    async fn find_customer(&self, id: i64) -> Result<Option<CustomerRecord>, AppError> {
        let sql = format!("{} WHERE c.id = $1", CUSTOMER_SELECT);
        let row = sqlx::query_as::<_, CustomerRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(CustomerRecord::from))
    }

    async fn create_customer(&self, customer: NewCustomer) -> Result<CustomerRecord, AppError> {
        let mut tx = self.pool.begin().await?;

        // 1. Resolve (ou cria) o usuário aninhado
        let user_id = match customer.user {
            NewCustomerUser::Existing(id) => id,
            NewCustomerUser::Create(user) => sqlx::query_scalar::<_, i64>(
                r#"
                INSERT INTO users (username, first_name, last_name, email, password_hash)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id
                "#,
            )
            .bind(&user.username)
            .bind(&user.first_name)
            .bind(&user.last_name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| unique_violation_or(e, AppError::UsernameAlreadyExists))?,
        };

        // 2. Cria o cliente
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO customers (user_id, seller_id, rg, cpf, cep, address)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(customer.seller_id)
        .bind(&customer.rg)
        .bind(&customer.cpf)
        .bind(&customer.cep)
        .bind(&customer.address)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        self.find_customer(id).await?.ok_or(AppError::NotFound("Cliente"))
    }

    async fn save_customer(
        &self,
        customer: &Customer,
        user: &UserProfile,
    ) -> Result<CustomerRecord, AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            UPDATE users
            SET username = $2, first_name = $3, last_name = $4, email = $5
            WHERE id = $1
            "#,
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email)
        .execute(&mut *tx)
        .await
        .map_err(|e| unique_violation_or(e, AppError::UsernameAlreadyExists))?;

        sqlx::query(
            r#"
            UPDATE customers
            SET seller_id = $2, rg = $3, cpf = $4, cep = $5, address = $6, active = $7
            WHERE id = $1
            "#,
        )
        .bind(customer.id)
        .bind(customer.seller_id)
        .bind(&customer.rg)
        .bind(&customer.cpf)
        .bind(&customer.cep)
        .bind(&customer.address)
        .bind(customer.active)
        .execute(&mut *tx)
        .await?;

        // Se qualquer UPDATE falhar, o drop do `tx` faz rollback
        tx.commit().await?;

        self.find_customer(customer.id)
            .await?
            .ok_or(AppError::NotFound("Cliente"))
    }

    async fn delete_customer(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM customers WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_group(&self, id: i64) -> Result<Option<Group>, AppError> {
        let group = sqlx::query_as::<_, Group>("SELECT id, name FROM groups WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(group)
    }

    async fn list_commissions(&self) -> Result<Vec<Commission>, AppError> {
        let commissions = sqlx::query_as::<_, Commission>(
            r#"
            SELECT c.id, c.group_id, c.percentage
            FROM comissions c
            JOIN groups g ON g.id = c.group_id
            ORDER BY g.name ASC, c.id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(commissions)
    }

    async fn find_commission(&self, id: i64) -> Result<Option<Commission>, AppError> {
        let commission = sqlx::query_as::<_, Commission>(
            "SELECT id, group_id, percentage FROM comissions WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(commission)
    }

    async fn create_commission(&self, group_id: i64, percentage: Decimal) -> Result<Commission, AppError> {
        let commission = sqlx::query_as::<_, Commission>(
            r#"
            INSERT INTO comissions (group_id, percentage)
            VALUES ($1, $2)
            RETURNING id, group_id, percentage
            "#,
        )
        .bind(group_id)
        .bind(percentage)
        .fetch_one(&self.pool)
        .await?;
        Ok(commission)
    }

    async fn save_commission(&self, commission: &Commission) -> Result<Commission, AppError> {
        let saved = sqlx::query_as::<_, Commission>(
            r#"
            UPDATE comissions SET group_id = $2, percentage = $3
            WHERE id = $1
            RETURNING id, group_id, percentage
            "#,
        )
        .bind(commission.id)
        .bind(commission.group_id)
        .bind(commission.percentage)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::NotFound("Comissão"))?;
        Ok(saved)
    }

    async fn delete_commission(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM comissions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(seller_id: Option<i64>, active: bool) -> CustomerRecord {
        CustomerRecord {
            customer: Customer {
                id: 1,
                user_id: 2,
                seller_id,
                rg: Some("207629010".into()),
                cpf: Some("35703019079".into()),
                cep: None,
                address: Some("Rua Cubatão, 220".into()),
                active,
            },
            user: UserProfile {
                id: 2,
                username: "huguinho".into(),
                first_name: "Huguinho".into(),
                last_name: "Donald".into(),
                email: "huguinho@email.com".into(),
            },
            seller: None,
        }
    }

    #[test]
    fn query_respects_scope_and_active_flag() {
        let query = CustomerQuery {
            scope: OwnerScope::OwnedBy(5),
            active: Some(true),
            search: None,
        };
        assert!(query.matches(&record(Some(5), true)));
        assert!(!query.matches(&record(Some(6), true)));
        assert!(!query.matches(&record(Some(5), false)));
    }

    #[test]
    fn search_is_case_insensitive_over_documents_and_names() {
        let mut query = CustomerQuery {
            scope: OwnerScope::All,
            active: None,
            search: Some("cubatão".into()),
        };
        assert!(query.matches(&record(None, true)));

        query.search = Some("HUGUINHO".into());
        assert!(query.matches(&record(None, true)));

        query.search = Some("357030".into());
        assert!(query.matches(&record(None, true)));

        query.search = Some("zezinho".into());
        assert!(!query.matches(&record(None, true)));
    }

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(escape_like("50%_off"), "50\\%\\_off");
        assert_eq!(escape_like("a\\b"), "a\\\\b");
        assert_eq!(escape_like("Zezinho"), "Zezinho");
    }

    #[test]
    fn search_wildcards_match_literally() {
        let query = CustomerQuery {
            scope: OwnerScope::All,
            active: None,
            search: Some("%".into()),
        };
        assert!(!query.matches(&record(None, true)));
    }
}
