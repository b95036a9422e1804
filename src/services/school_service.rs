// src/services/school_service.rs

use std::sync::Arc;

use crate::{
    common::{
        error::AppError,
        scope::{DeletePolicy, OwnerScope},
    },
    db::{SchoolRepository, UserRepository},
    models::{
        auth::Principal,
        school::{
            Class, ClassAddPayload, ClassUpdatePayload, Classroom, ClassroomPatch, ClassroomPayload,
            ClassroomView, Grade, Student, StudentPayload, StudentRegistration, StudentUpdatePayload,
        },
    },
};

const CLASS_DELETE: DeletePolicy = DeletePolicy::Forbidden("Nenhuma aula pode ser deletada.");
const FOREIGN_TEACHER: &str = "Você não tem permissão para esta operação.";

#[derive(Clone)]
pub struct SchoolService {
    users: Arc<dyn UserRepository>,
    repo: Arc<dyn SchoolRepository>,
}

impl SchoolService {
    pub fn new(users: Arc<dyn UserRepository>, repo: Arc<dyn SchoolRepository>) -> Self {
        Self { users, repo }
    }

    // =========================================================================
    //  ALUNOS
    // =========================================================================

    pub async fn list_students(&self) -> Result<Vec<Student>, AppError> {
        self.repo.list_students().await
    }

    /// Matrícula com zeros à esquerda + nome completo.
    pub async fn all_students(&self) -> Result<Vec<StudentRegistration>, AppError> {
        let students = self.repo.list_students().await?;
        Ok(students.iter().map(StudentRegistration::from).collect())
    }

    pub async fn get_student(&self, id: i64) -> Result<Student, AppError> {
        self.repo.find_student(id).await?.ok_or(AppError::NotFound("Aluno"))
    }

    pub async fn create_student(&self, payload: StudentPayload) -> Result<Student, AppError> {
        self.repo
            .create_student(&payload.registration, &payload.first_name, &payload.last_name)
            .await
    }

    pub async fn update_student(&self, id: i64, payload: StudentUpdatePayload) -> Result<Student, AppError> {
        let mut student = self.get_student(id).await?;
        payload.apply_to(&mut student);
        self.repo.save_student(&student).await
    }

    pub async fn delete_student(&self, id: i64) -> Result<(), AppError> {
        if !self.repo.delete_student(id).await? {
            return Err(AppError::NotFound("Aluno"));
        }
        tracing::info!(student_id = id, "Aluno removido");
        Ok(())
    }

    // =========================================================================
    //  SALAS
    // =========================================================================

    pub async fn list_classrooms(&self) -> Result<Vec<ClassroomView>, AppError> {
        self.repo.list_classrooms().await
    }

    pub async fn get_classroom(&self, id: i64) -> Result<ClassroomView, AppError> {
        self.repo
            .find_classroom(id)
            .await?
            .ok_or(AppError::NotFound("Sala de aula"))
    }

    pub async fn create_classroom(&self, payload: ClassroomPayload) -> Result<ClassroomView, AppError> {
        self.ensure_students_exist(&payload.students).await?;
        self.repo.create_classroom(&payload.title, &payload.students).await
    }

    pub async fn update_classroom(&self, id: i64, payload: ClassroomPatch) -> Result<ClassroomView, AppError> {
        let current = self.get_classroom(id).await?;

        if let Some(students) = &payload.students {
            self.ensure_students_exist(students).await?;
        }

        let classroom = Classroom {
            id: current.id,
            title: payload.title.unwrap_or(current.title),
        };
        self.repo
            .save_classroom(&classroom, payload.students.as_deref())
            .await
    }

    pub async fn delete_classroom(&self, id: i64) -> Result<(), AppError> {
        if !self.repo.delete_classroom(id).await? {
            return Err(AppError::NotFound("Sala de aula"));
        }
        Ok(())
    }

    async fn ensure_students_exist(&self, student_ids: &[i64]) -> Result<(), AppError> {
        for student_id in student_ids {
            if self.repo.find_student(*student_id).await?.is_none() {
                return Err(AppError::field(
                    "students",
                    &format!("Aluno {} não encontrado.", student_id),
                ));
            }
        }
        Ok(())
    }

    // =========================================================================
    //  NOTAS (somente leitura)
    // =========================================================================

    pub async fn list_grades(&self) -> Result<Vec<Grade>, AppError> {
        self.repo.list_grades().await
    }

    pub async fn get_grade(&self, id: i64) -> Result<Grade, AppError> {
        self.repo.find_grade(id).await?.ok_or(AppError::NotFound("Nota"))
    }

    // =========================================================================
    //  AULAS (o dono é sempre o professor)
    // =========================================================================

    pub async fn list_classes(&self, principal: &Principal) -> Result<Vec<Class>, AppError> {
        self.repo.list_classes(OwnerScope::owner(principal)).await
    }

    pub async fn get_class(&self, principal: &Principal, id: i64) -> Result<Class, AppError> {
        let scope = OwnerScope::owner(principal);
        match self.repo.find_class(id).await? {
            Some(class) if scope.admits(Some(class.teacher_id)) => Ok(class),
            _ => Err(AppError::NotFound("Aula")),
        }
    }

    /// O professor da aula é quem está logado.
    pub async fn create_class(&self, principal: &Principal, payload: ClassAddPayload) -> Result<Class, AppError> {
        self.ensure_classroom_exists(payload.classroom).await?;

        let class = self.repo.create_class(payload.classroom, principal.id).await?;
        tracing::info!(class_id = class.id, teacher_id = principal.id, "Aula criada");
        Ok(class)
    }

    pub async fn update_class(
        &self,
        principal: &Principal,
        id: i64,
        payload: ClassUpdatePayload,
    ) -> Result<Class, AppError> {
        let mut class = self.get_class(principal, id).await?;

        if let Some(teacher_id) = payload.teacher {
            if self.users.find_by_id(teacher_id).await?.is_none() {
                return Err(AppError::field("teacher", "Usuário não encontrado."));
            }
            if teacher_id != principal.id {
                return Err(AppError::permission_denied(FOREIGN_TEACHER));
            }
            class.teacher_id = teacher_id;
        }

        if let Some(classroom_id) = payload.classroom {
            self.ensure_classroom_exists(classroom_id).await?;
            class.classroom_id = classroom_id;
        }

        self.repo.save_class(&class).await
    }

    /// Aula fora do escopo é 404; dentro do escopo, sempre 403.
    pub async fn delete_class(&self, principal: &Principal, id: i64) -> Result<(), AppError> {
        self.get_class(principal, id).await?;
        CLASS_DELETE.check()
    }

    async fn ensure_classroom_exists(&self, classroom_id: i64) -> Result<(), AppError> {
        match self.repo.find_classroom(classroom_id).await? {
            Some(_) => Ok(()),
            None => Err(AppError::field("classroom", "Sala de aula não encontrada.")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    use crate::db::MemoryStore;
    use crate::models::auth::NewUser;

    fn service(store: &Arc<MemoryStore>) -> SchoolService {
        SchoolService::new(store.clone(), store.clone())
    }

    async fn teacher(store: &MemoryStore, username: &str) -> Principal {
        let user = store
            .create_user(NewUser {
                username: username.into(),
                ..NewUser::default()
            })
            .await
            .unwrap();
        Principal {
            id: user.id,
            username: user.username,
            roles: BTreeSet::new(),
        }
    }

    async fn classroom(service: &SchoolService) -> ClassroomView {
        service
            .create_classroom(ClassroomPayload {
                title: "Sala 1".into(),
                students: vec![],
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn all_students_pads_registration() {
        let store = Arc::new(MemoryStore::new());
        let service = service(&store);
        service
            .create_student(StudentPayload {
                registration: "42".into(),
                first_name: "Ana".into(),
                last_name: "Souza".into(),
            })
            .await
            .unwrap();

        let all = service.all_students().await.unwrap();
        assert_eq!(all[0].registration, "0000042");
        assert_eq!(all[0].full_name, "Ana Souza");
    }

    #[tokio::test]
    async fn deleted_student_is_gone() {
        let store = Arc::new(MemoryStore::new());
        let service = service(&store);
        let student = service
            .create_student(StudentPayload {
                registration: "1".into(),
                first_name: "Bia".into(),
                last_name: "Lima".into(),
            })
            .await
            .unwrap();

        service.delete_student(student.id).await.unwrap();
        assert!(matches!(service.get_student(student.id).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn classroom_rejects_unknown_students() {
        let store = Arc::new(MemoryStore::new());
        let service = service(&store);
        let result = service
            .create_classroom(ClassroomPayload {
                title: "Sala 2".into(),
                students: vec![999],
            })
            .await;
        assert!(matches!(result, Err(AppError::FieldErrors(_))));
        assert!(service.list_classrooms().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn classes_are_stamped_and_scoped_to_teacher() {
        let store = Arc::new(MemoryStore::new());
        let service = service(&store);
        let alice = teacher(&store, "alice").await;
        let bob = teacher(&store, "bob").await;
        let room = classroom(&service).await;

        let class = service
            .create_class(&alice, ClassAddPayload { classroom: room.id })
            .await
            .unwrap();
        assert_eq!(class.teacher_id, alice.id);

        assert_eq!(service.list_classes(&alice).await.unwrap().len(), 1);
        assert!(service.list_classes(&bob).await.unwrap().is_empty());
        assert!(matches!(service.get_class(&bob, class.id).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn class_cannot_be_handed_to_another_teacher() {
        let store = Arc::new(MemoryStore::new());
        let service = service(&store);
        let alice = teacher(&store, "alice").await;
        let bob = teacher(&store, "bob").await;
        let room = classroom(&service).await;
        let class = service
            .create_class(&alice, ClassAddPayload { classroom: room.id })
            .await
            .unwrap();

        let to_bob = ClassUpdatePayload {
            classroom: None,
            teacher: Some(bob.id),
        };
        assert!(matches!(
            service.update_class(&alice, class.id, to_bob).await,
            Err(AppError::PermissionDenied(_))
        ));

        let to_nobody = ClassUpdatePayload {
            classroom: None,
            teacher: Some(999),
        };
        assert!(matches!(
            service.update_class(&alice, class.id, to_nobody).await,
            Err(AppError::FieldErrors(_))
        ));
    }

    #[tokio::test]
    async fn classes_are_never_deleted() {
        let store = Arc::new(MemoryStore::new());
        let service = service(&store);
        let alice = teacher(&store, "alice").await;
        let bob = teacher(&store, "bob").await;
        let room = classroom(&service).await;
        let class = service
            .create_class(&alice, ClassAddPayload { classroom: room.id })
            .await
            .unwrap();

        assert!(matches!(
            service.delete_class(&alice, class.id).await,
            Err(AppError::PermissionDenied(_))
        ));
        assert!(matches!(service.delete_class(&bob, class.id).await, Err(AppError::NotFound(_))));
    }
}
