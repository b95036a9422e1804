// src/models/school.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Tamanho da matrícula exibida (completada com zeros à esquerda).
pub const REGISTRATION_WIDTH: usize = 7;

// --- ALUNOS ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow, ToSchema)]
pub struct Student {
    pub id: i64,
    pub registration: String,
    pub first_name: String,
    pub last_name: String,
}

impl Student {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct StudentRegistration {
    #[schema(example = "0000042")]
    pub registration: String,
    pub full_name: String,
}

impl From<&Student> for StudentRegistration {
    fn from(student: &Student) -> Self {
        Self {
            registration: format!("{:0>width$}", student.registration, width = REGISTRATION_WIDTH),
            full_name: student.full_name(),
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct StudentPayload {
    #[validate(length(min = 1, max = 7, message = "A matrícula deve ter de 1 a 7 caracteres."))]
    #[schema(example = "42")]
    pub registration: String,
    #[validate(length(min = 1, max = 30))]
    pub first_name: String,
    #[validate(length(min = 1, max = 30))]
    pub last_name: String,
}

/// Na atualização só o nome pode mudar; a matrícula é fixa.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct StudentUpdatePayload {
    #[validate(length(min = 1, max = 30))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 30))]
    pub last_name: Option<String>,
}

impl StudentUpdatePayload {
    pub fn apply_to(&self, student: &mut Student) {
        if let Some(first_name) = &self.first_name {
            student.first_name = first_name.clone();
        }
        if let Some(last_name) = &self.last_name {
            student.last_name = last_name.clone();
        }
    }
}

// --- SALAS ---

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Classroom {
    pub id: i64,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ClassroomView {
    pub id: i64,
    pub title: String,
    pub students: Vec<Student>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ClassroomPayload {
    #[validate(length(min = 1, max = 30))]
    #[schema(example = "Sala 1")]
    pub title: String,
    #[serde(default)]
    pub students: Vec<i64>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct ClassroomPatch {
    #[validate(length(min = 1, max = 30))]
    pub title: Option<String>,
    pub students: Option<Vec<i64>>,
}

// --- NOTAS ---

#[derive(Debug, Clone, PartialEq, Serialize, FromRow, ToSchema)]
pub struct Grade {
    pub id: i64,
    #[serde(rename = "student")]
    pub student_id: Option<i64>,
    #[schema(value_type = Option<f64>)]
    pub note: Option<Decimal>,
    pub created: DateTime<Utc>,
}

// --- AULAS ---

#[derive(Debug, Clone, PartialEq, Serialize, FromRow, ToSchema)]
pub struct Class {
    pub id: i64,
    #[serde(rename = "classroom")]
    pub classroom_id: i64,
    #[serde(rename = "teacher")]
    pub teacher_id: i64,
    pub created: DateTime<Utc>,
}

/// Na criação só se informa a sala; o professor é quem está logado.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ClassAddPayload {
    pub classroom: i64,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ClassUpdatePayload {
    pub classroom: Option<i64>,
    pub teacher: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_is_zero_padded() {
        let student = Student {
            id: 1,
            registration: "42".into(),
            first_name: "Ana".into(),
            last_name: "Souza".into(),
        };
        let view = StudentRegistration::from(&student);
        assert_eq!(view.registration, "0000042");
        assert_eq!(view.full_name, "Ana Souza");
    }

    #[test]
    fn full_width_registration_is_kept() {
        let student = Student {
            id: 1,
            registration: "1234567".into(),
            first_name: "Bia".into(),
            last_name: "Lima".into(),
        };
        assert_eq!(StudentRegistration::from(&student).registration, "1234567");
    }
}
