// src/services/crm_service.rs

use std::sync::Arc;

use rust_decimal::Decimal;
use validator::{Validate, ValidationErrors};

use crate::{
    common::{error::AppError, scope::OwnerScope},
    db::{CrmRepository, CustomerQuery, UserRepository},
    models::{
        auth::{Principal, Role},
        crm::{
            Commission, CommissionPatch, CommissionPayload, CustomerCreatePayload, CustomerFilter,
            CustomerRecord, CustomerUpdatePayload, CustomerView, NewCustomer, NewCustomerUser,
            UserRef,
        },
    },
};

const EDIT_DENIED: &str = "Você não tem permissão para editar este registro.";
const DELETE_DENIED: &str = "Você não tem permissão para deletar este registro.";
const COMMISSION_DENIED: &str = "Você não tem permissão para visualizar este registro.";
const USER_NOT_FOUND: &str = "Usuário não encontrado.";

/// Limite de NUMERIC(5, 2)
const MAX_PERCENTAGE: Decimal = Decimal::from_parts(99_999, 0, 0, false, 2);

#[derive(Clone)]
pub struct CrmService {
    users: Arc<dyn UserRepository>,
    repo: Arc<dyn CrmRepository>,
}

impl CrmService {
    pub fn new(users: Arc<dyn UserRepository>, repo: Arc<dyn CrmRepository>) -> Self {
        Self { users, repo }
    }

    // =========================================================================
    //  CLIENTES
    // =========================================================================

    /// Vendedor só pode ver os seus clientes.
    pub async fn list_customers(
        &self,
        principal: &Principal,
        filter: CustomerFilter,
    ) -> Result<Vec<CustomerView>, AppError> {
        let query = CustomerQuery {
            scope: OwnerScope::restricted_by(principal, Role::Seller),
            active: filter.active,
            search: filter.search,
        };

        let records = self.repo.list_customers(&query).await?;
        Ok(records.iter().map(CustomerView::from).collect())
    }

    pub async fn get_customer(&self, principal: &Principal, id: i64) -> Result<CustomerView, AppError> {
        let record = self.find_visible_customer(principal, id).await?;
        Ok(CustomerView::from(&record))
    }

    /// Se quem cria é Vendedor, o vendedor do cliente é sempre ele mesmo,
    /// independentemente do que veio no payload.
    pub async fn create_customer(
        &self,
        principal: &Principal,
        payload: CustomerCreatePayload,
    ) -> Result<CustomerView, AppError> {
        let user = match payload.user {
            None => return Err(AppError::field("user", "Este campo é obrigatório.")),
            Some(UserRef::Existing(user_id)) => {
                self.ensure_user_exists("user", user_id).await?;
                NewCustomerUser::Existing(user_id)
            }
            Some(UserRef::New(new_user)) => {
                // Erros do usuário aninhado saem como "user.email"
                ValidationErrors::merge(Ok(()), "user", new_user.validate())?;
                NewCustomerUser::Create(new_user.into())
            }
        };

        let seller_id = if principal.is_seller() {
            Some(principal.id)
        } else {
            match payload.seller {
                Some(seller_id) => {
                    self.ensure_user_exists("seller", seller_id).await?;
                    Some(seller_id)
                }
                None => None,
            }
        };

        let record = self
            .repo
            .create_customer(NewCustomer {
                user,
                seller_id,
                rg: payload.rg,
                cpf: payload.cpf,
                cep: payload.cep,
                address: payload.address,
            })
            .await?;

        tracing::info!(
            customer_id = record.customer.id,
            seller_id = ?record.customer.seller_id,
            "Cliente criado"
        );

        Ok(CustomerView::from(&record))
    }

    /// Vendedor só pode editar os clientes dele; cliente de um vendedor só
    /// pode ser editado pelo próprio vendedor.
    pub async fn update_customer(
        &self,
        principal: &Principal,
        id: i64,
        payload: CustomerUpdatePayload,
    ) -> Result<CustomerView, AppError> {
        let CustomerRecord {
            mut customer,
            mut user,
            ..
        } = self.find_customer(id).await?;

        self.ensure_may_mutate(principal, customer.seller_id, EDIT_DENIED).await?;
        payload.validate()?;

        // 1. Sub-recurso aninhado: só os campos presentes
        if let Some(user_patch) = &payload.user {
            user_patch.apply_to(&mut user);
        }

        // 2. Vendedor não repassa o cliente para outro
        if !principal.is_seller() {
            if let Some(seller_id) = payload.seller {
                self.ensure_user_exists("seller", seller_id).await?;
                customer.seller_id = Some(seller_id);
            }
        }

        // 3. Demais campos
        payload.apply_to(&mut customer);

        // 4. Usuário + cliente na mesma transação
        let record = self.repo.save_customer(&customer, &user).await?;
        Ok(CustomerView::from(&record))
    }

    pub async fn delete_customer(&self, principal: &Principal, id: i64) -> Result<(), AppError> {
        let record = self.find_customer(id).await?;
        self.ensure_may_mutate(principal, record.customer.seller_id, DELETE_DENIED)
            .await?;

        if !self.repo.delete_customer(id).await? {
            return Err(AppError::NotFound("Cliente"));
        }
        tracing::info!(customer_id = id, "Cliente removido");
        Ok(())
    }

    async fn find_customer(&self, id: i64) -> Result<CustomerRecord, AppError> {
        self.repo.find_customer(id).await?.ok_or(AppError::NotFound("Cliente"))
    }

    // Fora do escopo é 404, como se o registro não existisse
    async fn find_visible_customer(&self, principal: &Principal, id: i64) -> Result<CustomerRecord, AppError> {
        let scope = OwnerScope::restricted_by(principal, Role::Seller);
        match self.repo.find_customer(id).await? {
            Some(record) if scope.admits(record.customer.seller_id) => Ok(record),
            _ => Err(AppError::NotFound("Cliente")),
        }
    }

    async fn ensure_may_mutate(
        &self,
        principal: &Principal,
        owner_id: Option<i64>,
        reason: &str,
    ) -> Result<(), AppError> {
        let is_owner = owner_id == Some(principal.id);
        if is_owner {
            return Ok(());
        }

        if principal.is_seller() {
            return Err(AppError::permission_denied(reason));
        }

        if let Some(owner_id) = owner_id {
            let owner_roles = self.users.roles_of(owner_id).await?;
            if owner_roles.contains(&Role::Seller) {
                return Err(AppError::permission_denied(reason));
            }
        }

        Ok(())
    }

    async fn ensure_user_exists(&self, field: &str, user_id: i64) -> Result<(), AppError> {
        match self.users.find_by_id(user_id).await? {
            Some(_) => Ok(()),
            None => Err(AppError::field(field, USER_NOT_FOUND)),
        }
    }

    // =========================================================================
    //  COMISSÕES (vedadas ao Vendedor em qualquer verbo)
    // =========================================================================

    pub fn ensure_not_seller(principal: &Principal) -> Result<(), AppError> {
        if principal.is_seller() {
            return Err(AppError::permission_denied(COMMISSION_DENIED));
        }
        Ok(())
    }

    pub async fn list_commissions(&self, principal: &Principal) -> Result<Vec<Commission>, AppError> {
        Self::ensure_not_seller(principal)?;
        self.repo.list_commissions().await
    }

    pub async fn get_commission(&self, principal: &Principal, id: i64) -> Result<Commission, AppError> {
        Self::ensure_not_seller(principal)?;
        self.repo.find_commission(id).await?.ok_or(AppError::NotFound("Comissão"))
    }

    pub async fn create_commission(
        &self,
        principal: &Principal,
        payload: CommissionPayload,
    ) -> Result<Commission, AppError> {
        Self::ensure_not_seller(principal)?;
        self.ensure_group_exists(payload.group).await?;
        let percentage = Self::checked_percentage(payload.percentage)?;

        self.repo.create_commission(payload.group, percentage).await
    }

    pub async fn update_commission(
        &self,
        principal: &Principal,
        id: i64,
        payload: CommissionPatch,
    ) -> Result<Commission, AppError> {
        Self::ensure_not_seller(principal)?;
        let mut commission = self
            .repo
            .find_commission(id)
            .await?
            .ok_or(AppError::NotFound("Comissão"))?;

        if let Some(group_id) = payload.group {
            self.ensure_group_exists(group_id).await?;
            commission.group_id = group_id;
        }
        if let Some(percentage) = payload.percentage {
            commission.percentage = Self::checked_percentage(percentage)?;
        }

        self.repo.save_commission(&commission).await
    }

    pub async fn delete_commission(&self, principal: &Principal, id: i64) -> Result<(), AppError> {
        Self::ensure_not_seller(principal)?;
        if !self.repo.delete_commission(id).await? {
            return Err(AppError::NotFound("Comissão"));
        }
        Ok(())
    }

    async fn ensure_group_exists(&self, group_id: i64) -> Result<(), AppError> {
        match self.repo.find_group(group_id).await? {
            Some(_) => Ok(()),
            None => Err(AppError::field("group", "Grupo não encontrado.")),
        }
    }

    fn checked_percentage(percentage: Decimal) -> Result<Decimal, AppError> {
        let rounded = percentage.round_dp(2);
        if rounded.abs() > MAX_PERCENTAGE {
            return Err(AppError::field(
                "percentage",
                "Certifique-se de que não haja mais de 5 dígitos no total.",
            ));
        }
        Ok(rounded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    use crate::db::MemoryStore;
    use crate::models::auth::NewUser;

    struct Fixture {
        store: Arc<MemoryStore>,
        service: CrmService,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let service = CrmService::new(store.clone(), store.clone());
        Fixture { store, service }
    }

    async fn principal(store: &MemoryStore, username: &str, roles: &[Role]) -> Principal {
        let user = store
            .create_user(NewUser {
                username: username.into(),
                ..NewUser::default()
            })
            .await
            .unwrap();
        for role in roles {
            store.add_user_to_group(user.id, role.group_name()).await;
        }
        Principal {
            id: user.id,
            username: user.username,
            roles: roles.iter().copied().collect::<BTreeSet<_>>(),
        }
    }

    fn new_customer(username: &str) -> CustomerCreatePayload {
        serde_json::from_value(serde_json::json!({
            "user": { "username": username, "first_name": "Huguinho" },
            "cpf": "35703019079"
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn seller_creates_customer_for_itself() {
        let Fixture { store, service } = fixture();
        let seller = principal(&store, "vendedor", &[Role::Seller]).await;
        let other = principal(&store, "outro", &[]).await;

        let mut payload = new_customer("huguinho");
        payload.seller = Some(other.id);
        let view = service.create_customer(&seller, payload).await.unwrap();

        assert_eq!(view.seller.as_ref().map(|s| s.id), Some(seller.id));
        assert_eq!(view.cpf.as_deref(), Some("357.030.190-79"));
    }

    #[tokio::test]
    async fn seller_only_sees_own_customers() {
        let Fixture { store, service } = fixture();
        let seller = principal(&store, "vendedor", &[Role::Seller]).await;
        let manager = principal(&store, "gerente", &[]).await;

        let own = service.create_customer(&seller, new_customer("a")).await.unwrap();
        let foreign = service.create_customer(&manager, new_customer("b")).await.unwrap();

        let listed = service
            .list_customers(&seller, CustomerFilter::default())
            .await
            .unwrap();
        assert_eq!(listed.iter().map(|c| c.id).collect::<Vec<_>>(), vec![own.id]);

        assert!(matches!(
            service.get_customer(&seller, foreign.id).await,
            Err(AppError::NotFound(_))
        ));
        assert_eq!(service.list_customers(&manager, CustomerFilter::default()).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn customer_of_a_seller_is_only_editable_by_that_seller() {
        let Fixture { store, service } = fixture();
        let seller = principal(&store, "vendedor", &[Role::Seller]).await;
        let manager = principal(&store, "gerente", &[]).await;

        let customer = service.create_customer(&seller, new_customer("a")).await.unwrap();

        let denied = service
            .update_customer(&manager, customer.id, CustomerUpdatePayload::default())
            .await;
        assert!(matches!(denied, Err(AppError::PermissionDenied(_))));

        let deleted = service.delete_customer(&manager, customer.id).await;
        assert!(matches!(deleted, Err(AppError::PermissionDenied(_))));

        let patch: CustomerUpdatePayload = serde_json::from_value(serde_json::json!({
            "user": { "first_name": "Zezinho" },
            "active": false
        }))
        .unwrap();
        let updated = service.update_customer(&seller, customer.id, patch).await.unwrap();
        assert_eq!(updated.user.first_name, "Zezinho");
        assert!(!updated.active);
    }

    #[tokio::test]
    async fn customer_without_user_is_rejected() {
        let Fixture { store, service } = fixture();
        let manager = principal(&store, "gerente", &[]).await;

        let payload: CustomerCreatePayload =
            serde_json::from_value(serde_json::json!({ "rg": "207629010" })).unwrap();
        assert!(matches!(
            service.create_customer(&manager, payload).await,
            Err(AppError::FieldErrors(_))
        ));
    }

    #[tokio::test]
    async fn commissions_are_closed_to_sellers() {
        let Fixture { store, service } = fixture();
        let seller = principal(&store, "vendedor", &[Role::Seller]).await;
        let manager = principal(&store, "gerente", &[]).await;
        let group = store.ensure_group("Vendedor").await;

        let payload = CommissionPayload {
            group,
            percentage: Decimal::new(550, 2),
        };
        let created = service.create_commission(&manager, payload).await.unwrap();
        assert_eq!(created.percentage, Decimal::new(550, 2));

        assert!(matches!(
            service.list_commissions(&seller).await,
            Err(AppError::PermissionDenied(_))
        ));
        assert!(matches!(
            service.delete_commission(&seller, created.id).await,
            Err(AppError::PermissionDenied(_))
        ));
    }

    #[tokio::test]
    async fn commission_for_unknown_group_is_rejected() {
        let Fixture { store, service } = fixture();
        let manager = principal(&store, "gerente", &[]).await;

        let payload = CommissionPayload {
            group: 999,
            percentage: Decimal::ONE,
        };
        assert!(matches!(
            service.create_commission(&manager, payload).await,
            Err(AppError::FieldErrors(_))
        ));
    }
}
