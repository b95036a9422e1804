// src/db/school_repo.rs

use async_trait::async_trait;
use sqlx::{FromRow, PgPool, Postgres, Transaction};

use crate::{
    common::{error::AppError, scope::OwnerScope},
    models::school::{Class, Classroom, ClassroomView, Grade, Student},
};

#[async_trait]
pub trait SchoolRepository: Send + Sync {
    // --- Alunos ---
    async fn list_students(&self) -> Result<Vec<Student>, AppError>;
    async fn find_student(&self, id: i64) -> Result<Option<Student>, AppError>;
    async fn create_student(
        &self,
        registration: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<Student, AppError>;
    async fn save_student(&self, student: &Student) -> Result<Student, AppError>;
    async fn delete_student(&self, id: i64) -> Result<bool, AppError>;

    // --- Salas ---
    async fn list_classrooms(&self) -> Result<Vec<ClassroomView>, AppError>;
    async fn find_classroom(&self, id: i64) -> Result<Option<ClassroomView>, AppError>;
    /// Cria a sala e os vínculos com os alunos na mesma transação.
    async fn create_classroom(&self, title: &str, student_ids: &[i64]) -> Result<ClassroomView, AppError>;
    /// `student_ids = None` mantém os alunos atuais.
    async fn save_classroom(
        &self,
        classroom: &Classroom,
        student_ids: Option<&[i64]>,
    ) -> Result<ClassroomView, AppError>;
    async fn delete_classroom(&self, id: i64) -> Result<bool, AppError>;

    // --- Notas ---
    async fn list_grades(&self) -> Result<Vec<Grade>, AppError>;
    async fn find_grade(&self, id: i64) -> Result<Option<Grade>, AppError>;

    // --- Aulas ---
    async fn list_classes(&self, scope: OwnerScope) -> Result<Vec<Class>, AppError>;
    async fn find_class(&self, id: i64) -> Result<Option<Class>, AppError>;
    async fn create_class(&self, classroom_id: i64, teacher_id: i64) -> Result<Class, AppError>;
    async fn save_class(&self, class: &Class) -> Result<Class, AppError>;
}

#[derive(Debug, FromRow)]
struct ClassroomStudentRow {
    classroom_id: i64,
    #[sqlx(flatten)]
    student: Student,
}

#[derive(Clone)]
pub struct PgSchoolRepository {
    pool: PgPool,
}

impl PgSchoolRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // Monta as salas com seus alunos (uma consulta para todas as salas)
    async fn with_students(&self, classrooms: Vec<Classroom>) -> Result<Vec<ClassroomView>, AppError> {
        let ids: Vec<i64> = classrooms.iter().map(|c| c.id).collect();

        let rows = sqlx::query_as::<_, ClassroomStudentRow>(
            r#"
            SELECT cs.classroom_id, s.id, s.registration, s.first_name, s.last_name
            FROM classroom_students cs
            JOIN students s ON s.id = cs.student_id
            WHERE cs.classroom_id = ANY($1)
            ORDER BY s.id ASC
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(classrooms
            .into_iter()
            .map(|classroom| ClassroomView {
                students: rows
                    .iter()
                    .filter(|row| row.classroom_id == classroom.id)
                    .map(|row| row.student.clone())
                    .collect(),
                id: classroom.id,
                title: classroom.title,
            })
            .collect())
    }

    async fn replace_students(
        tx: &mut Transaction<'_, Postgres>,
        classroom_id: i64,
        student_ids: &[i64],
    ) -> Result<(), AppError> {
        sqlx::query("DELETE FROM classroom_students WHERE classroom_id = $1")
            .bind(classroom_id)
            .execute(&mut **tx)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO classroom_students (classroom_id, student_id)
            SELECT $1, UNNEST($2::BIGINT[])
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(classroom_id)
        .bind(student_ids)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl SchoolRepository for PgSchoolRepository {
    async fn list_students(&self) -> Result<Vec<Student>, AppError> {
        let students = sqlx::query_as::<_, Student>("SELECT * FROM students ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await?;
        Ok(students)
    }

    async fn find_student(&self, id: i64) -> Result<Option<Student>, AppError> {
        let student = sqlx::query_as::<_, Student>("SELECT * FROM students WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(student)
    }

    async fn create_student(
        &self,
        registration: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<Student, AppError> {
        let student = sqlx::query_as::<_, Student>(
            r#"
            INSERT INTO students (registration, first_name, last_name)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(registration)
        .bind(first_name)
        .bind(last_name)
        .fetch_one(&self.pool)
        .await?;
        Ok(student)
    }

    async fn save_student(&self, student: &Student) -> Result<Student, AppError> {
        sqlx::query_as::<_, Student>(
            r#"
            UPDATE students SET registration = $2, first_name = $3, last_name = $4
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(student.id)
        .bind(&student.registration)
        .bind(&student.first_name)
        .bind(&student.last_name)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::NotFound("Aluno"))
    }

    async fn delete_student(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM students WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_classrooms(&self) -> Result<Vec<ClassroomView>, AppError> {
        let classrooms = sqlx::query_as::<_, Classroom>("SELECT * FROM classrooms ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await?;
        self.with_students(classrooms).await
    }

    async fn find_classroom(&self, id: i64) -> Result<Option<ClassroomView>, AppError> {
        let classroom = sqlx::query_as::<_, Classroom>("SELECT * FROM classrooms WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match classroom {
            Some(classroom) => Ok(self.with_students(vec![classroom]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn create_classroom(&self, title: &str, student_ids: &[i64]) -> Result<ClassroomView, AppError> {
        let mut tx = self.pool.begin().await?;

        let id = sqlx::query_scalar::<_, i64>("INSERT INTO classrooms (title) VALUES ($1) RETURNING id")
            .bind(title)
            .fetch_one(&mut *tx)
            .await?;

        Self::replace_students(&mut tx, id, student_ids).await?;

        tx.commit().await?;

        self.find_classroom(id).await?.ok_or(AppError::NotFound("Sala de aula"))
    }

    async fn save_classroom(
        &self,
        classroom: &Classroom,
        student_ids: Option<&[i64]>,
    ) -> Result<ClassroomView, AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE classrooms SET title = $2 WHERE id = $1")
            .bind(classroom.id)
            .bind(&classroom.title)
            .execute(&mut *tx)
            .await?;

        if let Some(student_ids) = student_ids {
            Self::replace_students(&mut tx, classroom.id, student_ids).await?;
        }

        tx.commit().await?;

        self.find_classroom(classroom.id)
            .await?
            .ok_or(AppError::NotFound("Sala de aula"))
    }

    async fn delete_classroom(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM classrooms WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_grades(&self) -> Result<Vec<Grade>, AppError> {
        let grades = sqlx::query_as::<_, Grade>("SELECT * FROM grades ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await?;
        Ok(grades)
    }

    async fn find_grade(&self, id: i64) -> Result<Option<Grade>, AppError> {
        let grade = sqlx::query_as::<_, Grade>("SELECT * FROM grades WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(grade)
    }

    async fn list_classes(&self, scope: OwnerScope) -> Result<Vec<Class>, AppError> {
        let classes = sqlx::query_as::<_, Class>(
            r#"
            SELECT * FROM classes
            WHERE ($1::BIGINT IS NULL OR teacher_id = $1)
            ORDER BY id ASC
            "#,
        )
        .bind(scope.owner_id())
        .fetch_all(&self.pool)
        .await?;
        Ok(classes)
    }

    async fn find_class(&self, id: i64) -> Result<Option<Class>, AppError> {
        let class = sqlx::query_as::<_, Class>("SELECT * FROM classes WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(class)
    }

    async fn create_class(&self, classroom_id: i64, teacher_id: i64) -> Result<Class, AppError> {
        let class = sqlx::query_as::<_, Class>(
            r#"
            INSERT INTO classes (classroom_id, teacher_id)
            VALUES ($1, $2)
            RETURNING *
            "#,
        )
        .bind(classroom_id)
        .bind(teacher_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(class)
    }

    async fn save_class(&self, class: &Class) -> Result<Class, AppError> {
        sqlx::query_as::<_, Class>(
            r#"
            UPDATE classes SET classroom_id = $2, teacher_id = $3
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(class.id)
        .bind(class.classroom_id)
        .bind(class.teacher_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::NotFound("Aula"))
    }
}
