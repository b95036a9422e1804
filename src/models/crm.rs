// src/models/crm.rs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

use crate::common::masks::{mask_cep, mask_cpf, mask_rg};
use crate::models::auth::{NewUser, UserProfile};

// RG, CPF e CEP só aceitam dígitos
pub fn only_digits(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        let mut err = ValidationError::new("only_digits");
        err.message = Some("Digitar somente números.".into());
        return Err(err);
    }
    Ok(())
}

// --- REGISTROS DO BANCO ---

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Customer {
    pub id: i64,
    pub user_id: i64,
    pub seller_id: Option<i64>,
    pub rg: Option<String>,
    pub cpf: Option<String>,
    pub cep: Option<String>,
    pub address: Option<String>,
    pub active: bool,
}

/// Cliente com o usuário (sub-recurso) e o vendedor já carregados.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomerRecord {
    pub customer: Customer,
    pub user: UserProfile,
    pub seller: Option<UserProfile>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow, ToSchema)]
pub struct Group {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow, ToSchema)]
pub struct Commission {
    pub id: i64,
    #[serde(rename = "group")]
    pub group_id: i64,
    #[schema(value_type = f64, example = 5.5)]
    pub percentage: Decimal,
}

// --- PROJEÇÃO DE LEITURA ---

/// Representação de saída do cliente, com RG/CPF/CEP mascarados.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CustomerView {
    pub id: i64,
    #[schema(example = "20.762.901-0")]
    pub rg: Option<String>,
    #[schema(example = "357.030.190-79")]
    pub cpf: Option<String>,
    #[schema(example = "04013-000")]
    pub cep: Option<String>,
    pub address: Option<String>,
    pub active: bool,
    pub user: UserProfile,
    pub seller: Option<UserProfile>,
}

impl From<&CustomerRecord> for CustomerView {
    fn from(record: &CustomerRecord) -> Self {
        let customer = &record.customer;
        Self {
            id: customer.id,
            rg: customer.rg.as_deref().map(mask_rg),
            cpf: customer.cpf.as_deref().map(mask_cpf),
            cep: customer.cep.as_deref().map(mask_cep),
            address: customer.address.clone(),
            active: customer.active,
            user: record.user.clone(),
            seller: record.seller.clone(),
        }
    }
}

// --- FILTROS ---

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CustomerFilter {
    /// Filtra por clientes ativos/inativos
    pub active: Option<bool>,
    /// Busca parcial em nome, e-mail, documentos e endereço
    pub search: Option<String>,
}

// --- PAYLOADS ---

/// Usuário do cliente: um ID existente ou um usuário novo aninhado.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum UserRef {
    Existing(i64),
    New(NewUserPayload),
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct NewUserPayload {
    #[validate(length(min = 1, max = 150, message = "Informe um nome de usuário de até 150 caracteres."))]
    #[schema(example = "huguinho")]
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    #[serde(default)]
    pub email: Option<String>,
}

impl From<NewUserPayload> for NewUser {
    fn from(payload: NewUserPayload) -> Self {
        NewUser {
            username: payload.username,
            first_name: payload.first_name,
            last_name: payload.last_name,
            email: payload.email.unwrap_or_default(),
            password_hash: None,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CustomerCreatePayload {
    #[schema(example = 1)]
    pub user: Option<UserRef>,
    pub seller: Option<i64>,
    #[validate(length(max = 10), custom(function = "only_digits"))]
    #[schema(example = "207629010")]
    pub rg: Option<String>,
    #[validate(length(max = 11), custom(function = "only_digits"))]
    #[schema(example = "35703019079")]
    pub cpf: Option<String>,
    #[validate(length(max = 8), custom(function = "only_digits"))]
    #[schema(example = "04013000")]
    pub cep: Option<String>,
    #[validate(length(max = 100))]
    #[schema(example = "Rua Cubatão, 220 - São Paulo - SP")]
    pub address: Option<String>,
}

/// Atualização parcial do usuário aninhado: só os campos presentes são aplicados.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UserPatch {
    #[validate(length(min = 1, max = 150))]
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: Option<String>,
}

impl UserPatch {
    pub fn apply_to(&self, user: &mut UserProfile) {
        if let Some(username) = &self.username {
            user.username = username.clone();
        }
        if let Some(first_name) = &self.first_name {
            user.first_name = first_name.clone();
        }
        if let Some(last_name) = &self.last_name {
            user.last_name = last_name.clone();
        }
        if let Some(email) = &self.email {
            user.email = email.clone();
        }
    }
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct CustomerUpdatePayload {
    #[validate(nested)]
    pub user: Option<UserPatch>,
    pub seller: Option<i64>,
    #[validate(length(max = 10), custom(function = "only_digits"))]
    pub rg: Option<String>,
    #[validate(length(max = 11), custom(function = "only_digits"))]
    pub cpf: Option<String>,
    #[validate(length(max = 8), custom(function = "only_digits"))]
    pub cep: Option<String>,
    #[validate(length(max = 100))]
    pub address: Option<String>,
    pub active: Option<bool>,
}

impl CustomerUpdatePayload {
    /// Campos de topo (o vendedor é decidido pelo serviço).
    pub fn apply_to(&self, customer: &mut Customer) {
        if let Some(rg) = &self.rg {
            customer.rg = Some(rg.clone());
        }
        if let Some(cpf) = &self.cpf {
            customer.cpf = Some(cpf.clone());
        }
        if let Some(cep) = &self.cep {
            customer.cep = Some(cep.clone());
        }
        if let Some(address) = &self.address {
            customer.address = Some(address.clone());
        }
        if let Some(active) = self.active {
            customer.active = active;
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CommissionPayload {
    pub group: i64,
    #[schema(value_type = f64, example = 5.5)]
    pub percentage: Decimal,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CommissionPatch {
    pub group: Option<i64>,
    #[schema(value_type = Option<f64>)]
    pub percentage: Option<Decimal>,
}

// --- ENTRADAS DO REPOSITÓRIO ---

#[derive(Debug, Clone)]
pub enum NewCustomerUser {
    Existing(i64),
    Create(NewUser),
}

#[derive(Debug, Clone)]
pub struct NewCustomer {
    pub user: NewCustomerUser,
    pub seller_id: Option<i64>,
    pub rg: Option<String>,
    pub cpf: Option<String>,
    pub cep: Option<String>,
    pub address: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> CustomerRecord {
        CustomerRecord {
            customer: Customer {
                id: 1,
                user_id: 10,
                seller_id: Some(20),
                rg: Some("207629010".into()),
                cpf: Some("35703019079".into()),
                cep: Some("04013000".into()),
                address: Some("Rua Cubatão, 220".into()),
                active: true,
            },
            user: UserProfile {
                id: 10,
                username: "huguinho".into(),
                first_name: "A".into(),
                last_name: "Donald".into(),
                email: "a@x.com".into(),
            },
            seller: None,
        }
    }

    #[test]
    fn view_masks_documents_without_touching_the_record() {
        let record = record();
        let view = CustomerView::from(&record);

        assert_eq!(view.rg.as_deref(), Some("20.762.901-0"));
        assert_eq!(view.cpf.as_deref(), Some("357.030.190-79"));
        assert_eq!(view.cep.as_deref(), Some("04013-000"));
        assert_eq!(record.customer.cpf.as_deref(), Some("35703019079"));
    }

    #[test]
    fn user_patch_only_overwrites_present_fields() {
        let mut user = record().user;
        let patch: UserPatch = serde_json::from_value(serde_json::json!({ "email": "b@x.com" })).unwrap();

        patch.apply_to(&mut user);

        assert_eq!(user.first_name, "A");
        assert_eq!(user.email, "b@x.com");
        assert_eq!(user.username, "huguinho");
    }

    #[test]
    fn digits_validator_rejects_letters_and_masks() {
        assert!(only_digits("35703019079").is_ok());
        assert!(only_digits("357.030.190-79").is_err());
        assert!(only_digits("abc").is_err());
    }

    #[test]
    fn update_payload_rejects_formatted_cpf() {
        let payload = CustomerUpdatePayload {
            cpf: Some("357.030.190-79".into()),
            ..Default::default()
        };
        let errors = payload.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("cpf"));
    }

    #[test]
    fn user_ref_accepts_id_or_nested_object() {
        let by_id: UserRef = serde_json::from_value(serde_json::json!(3)).unwrap();
        assert!(matches!(by_id, UserRef::Existing(3)));

        let nested: UserRef =
            serde_json::from_value(serde_json::json!({ "username": "novo" })).unwrap();
        assert!(matches!(nested, UserRef::New(ref p) if p.username == "novo"));
    }
}
