// src/db/memory.rs

// Repositórios em memória: servem para rodar a API sem Postgres
// (DATABASE_URL=memory) e para os testes de integração.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::RwLock;

use crate::{
    common::{error::AppError, scope::OwnerScope},
    db::{CrmRepository, CustomerQuery, MovieRepository, SchoolRepository, UserRepository},
    models::{
        auth::{NewUser, Role, User, UserProfile},
        crm::{Commission, Customer, CustomerRecord, Group, NewCustomer, NewCustomerUser},
        movie::{Category, CategoryChange, CategoryPayload, Movie, MovieRecord, NewMovie},
        school::{Class, Classroom, ClassroomView, Grade, Student},
    },
};

#[derive(Debug, Default)]
struct Tables {
    next_id: i64,
    users: BTreeMap<i64, User>,
    groups: BTreeMap<i64, Group>,
    memberships: BTreeSet<(i64, i64)>,
    customers: BTreeMap<i64, Customer>,
    commissions: BTreeMap<i64, Commission>,
    categories: BTreeMap<i64, Category>,
    movies: BTreeMap<i64, Movie>,
    students: BTreeMap<i64, Student>,
    classrooms: BTreeMap<i64, Classroom>,
    classroom_students: BTreeSet<(i64, i64)>,
    grades: BTreeMap<i64, Grade>,
    classes: BTreeMap<i64, Class>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn insert_user(&mut self, user: NewUser) -> Result<User, AppError> {
        if self.users.values().any(|u| u.username == user.username) {
            return Err(AppError::UsernameAlreadyExists);
        }
        let id = self.next_id();
        let user = User {
            id,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            password_hash: user.password_hash,
        };
        self.users.insert(id, user.clone());
        Ok(user)
    }

    fn profile(&self, id: i64) -> Option<UserProfile> {
        self.users.get(&id).map(UserProfile::from)
    }

    fn customer_record(&self, customer: &Customer) -> Option<CustomerRecord> {
        Some(CustomerRecord {
            customer: customer.clone(),
            user: self.profile(customer.user_id)?,
            seller: customer.seller_id.and_then(|id| self.profile(id)),
        })
    }

    fn movie_record(&self, movie: &Movie) -> MovieRecord {
        MovieRecord {
            movie: movie.clone(),
            category: movie.category_id.and_then(|id| self.categories.get(&id).cloned()),
        }
    }

    fn insert_category(&mut self, payload: &CategoryPayload) -> Category {
        let id = self.next_id();
        let category = Category {
            id,
            title: payload.title.clone(),
            create_date: Utc::now(),
        };
        self.categories.insert(id, category.clone());
        category
    }

    fn classroom_view(&self, classroom: &Classroom) -> ClassroomView {
        let students = self
            .classroom_students
            .iter()
            .filter(|(classroom_id, _)| *classroom_id == classroom.id)
            .filter_map(|(_, student_id)| self.students.get(student_id).cloned())
            .collect();
        ClassroomView {
            id: classroom.id,
            title: classroom.title.clone(),
            students,
        }
    }

    fn replace_students(&mut self, classroom_id: i64, student_ids: &[i64]) -> Result<(), AppError> {
        if let Some(missing) = student_ids.iter().find(|id| !self.students.contains_key(*id)) {
            return Err(AppError::field("students", &format!("Aluno {} não encontrado.", missing)));
        }
        self.classroom_students.retain(|(c, _)| *c != classroom_id);
        for student_id in student_ids {
            self.classroom_students.insert((classroom_id, *student_id));
        }
        Ok(())
    }
}

/// Implementa todos os repositórios sobre um único lock, então cada
/// operação (inclusive as aninhadas) é atômica.
#[derive(Debug)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Já nasce com os grupos conhecidos, como a migração inicial.
    pub fn new() -> Self {
        let mut tables = Tables::default();
        for role in [Role::Seller, Role::Child] {
            let id = tables.next_id();
            tables.groups.insert(
                id,
                Group {
                    id,
                    name: role.group_name().to_string(),
                },
            );
        }
        Self {
            tables: RwLock::new(tables),
        }
    }

    /// Cria (se preciso) o grupo e retorna seu ID.
    pub async fn ensure_group(&self, name: &str) -> i64 {
        let mut tables = self.tables.write().await;
        if let Some(group) = tables.groups.values().find(|g| g.name == name) {
            return group.id;
        }
        let id = tables.next_id();
        tables.groups.insert(
            id,
            Group {
                id,
                name: name.to_string(),
            },
        );
        id
    }

    pub async fn add_user_to_group(&self, user_id: i64, group_name: &str) {
        let group_id = self.ensure_group(group_name).await;
        self.tables.write().await.memberships.insert((user_id, group_id));
    }

    /// Notas não têm endpoint de escrita; isto alimenta o repositório.
    pub async fn insert_grade(&self, student_id: Option<i64>, note: Decimal) -> Grade {
        let mut tables = self.tables.write().await;
        let id = tables.next_id();
        let grade = Grade {
            id,
            student_id,
            note: Some(note),
            created: Utc::now(),
        };
        tables.grades.insert(id, grade.clone());
        grade
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.username == username).cloned())
    }

    async fn create_user(&self, user: NewUser) -> Result<User, AppError> {
        self.tables.write().await.insert_user(user)
    }

    async fn roles_of(&self, user_id: i64) -> Result<BTreeSet<Role>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .memberships
            .iter()
            .filter(|(u, _)| *u == user_id)
            .filter_map(|(_, g)| tables.groups.get(g))
            .filter_map(|g| Role::from_group_name(&g.name))
            .collect())
    }
}

#[async_trait]
impl CrmRepository for MemoryStore {
    async fn list_customers(&self, query: &CustomerQuery) -> Result<Vec<CustomerRecord>, AppError> {
        let tables = self.tables.read().await;
        let mut records: Vec<CustomerRecord> = tables
            .customers
            .values()
            .filter_map(|c| tables.customer_record(c))
            .filter(|r| query.matches(r))
            .collect();
        records.sort_by(|a, b| {
            a.user
                .first_name
                .cmp(&b.user.first_name)
                .then(a.customer.id.cmp(&b.customer.id))
        });
        Ok(records)
    }

    async fn find_customer(&self, id: i64) -> Result<Option<CustomerRecord>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.customers.get(&id).and_then(|c| tables.customer_record(c)))
    }

    async fn create_customer(&self, customer: NewCustomer) -> Result<CustomerRecord, AppError> {
        let mut tables = self.tables.write().await;

        let user_id = match customer.user {
            NewCustomerUser::Existing(id) if tables.users.contains_key(&id) => id,
            NewCustomerUser::Existing(_) => return Err(AppError::NotFound("Usuário")),
            NewCustomerUser::Create(user) => tables.insert_user(user)?.id,
        };

        let id = tables.next_id();
        let created = Customer {
            id,
            user_id,
            seller_id: customer.seller_id,
            rg: customer.rg,
            cpf: customer.cpf,
            cep: customer.cep,
            address: customer.address,
            active: true,
        };
        tables.customers.insert(id, created.clone());

        tables.customer_record(&created).ok_or(AppError::NotFound("Usuário"))
    }

    async fn save_customer(
        &self,
        customer: &Customer,
        user: &UserProfile,
    ) -> Result<CustomerRecord, AppError> {
        let mut tables = self.tables.write().await;

        if tables
            .users
            .values()
            .any(|u| u.username == user.username && u.id != user.id)
        {
            return Err(AppError::UsernameAlreadyExists);
        }
        if !tables.customers.contains_key(&customer.id) {
            return Err(AppError::NotFound("Cliente"));
        }

        let stored_user = tables.users.get_mut(&user.id).ok_or(AppError::NotFound("Usuário"))?;
        stored_user.username = user.username.clone();
        stored_user.first_name = user.first_name.clone();
        stored_user.last_name = user.last_name.clone();
        stored_user.email = user.email.clone();

        tables.customers.insert(customer.id, customer.clone());

        tables.customer_record(customer).ok_or(AppError::NotFound("Cliente"))
    }

    async fn delete_customer(&self, id: i64) -> Result<bool, AppError> {
        Ok(self.tables.write().await.customers.remove(&id).is_some())
    }

    async fn find_group(&self, id: i64) -> Result<Option<Group>, AppError> {
        Ok(self.tables.read().await.groups.get(&id).cloned())
    }

    async fn list_commissions(&self) -> Result<Vec<Commission>, AppError> {
        let tables = self.tables.read().await;
        let mut commissions: Vec<Commission> = tables.commissions.values().cloned().collect();
        commissions.sort_by_key(|c| {
            (
                tables.groups.get(&c.group_id).map(|g| g.name.clone()).unwrap_or_default(),
                c.id,
            )
        });
        Ok(commissions)
    }

    async fn find_commission(&self, id: i64) -> Result<Option<Commission>, AppError> {
        Ok(self.tables.read().await.commissions.get(&id).cloned())
    }

    async fn create_commission(&self, group_id: i64, percentage: Decimal) -> Result<Commission, AppError> {
        let mut tables = self.tables.write().await;
        let id = tables.next_id();
        let commission = Commission {
            id,
            group_id,
            percentage,
        };
        tables.commissions.insert(id, commission.clone());
        Ok(commission)
    }

    async fn save_commission(&self, commission: &Commission) -> Result<Commission, AppError> {
        let mut tables = self.tables.write().await;
        match tables.commissions.get_mut(&commission.id) {
            Some(stored) => {
                *stored = commission.clone();
                Ok(commission.clone())
            }
            None => Err(AppError::NotFound("Comissão")),
        }
    }

    async fn delete_commission(&self, id: i64) -> Result<bool, AppError> {
        Ok(self.tables.write().await.commissions.remove(&id).is_some())
    }
}

#[async_trait]
impl MovieRepository for MemoryStore {
    async fn list_movies(&self, min_rating: Option<i32>) -> Result<Vec<MovieRecord>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .movies
            .values()
            .filter(|m| min_rating.is_none_or(|min| m.rating >= min))
            .map(|m| tables.movie_record(m))
            .collect())
    }

    async fn find_movie(&self, id: i64) -> Result<Option<MovieRecord>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.movies.get(&id).map(|m| tables.movie_record(m)))
    }

    async fn create_movie(&self, movie: NewMovie) -> Result<MovieRecord, AppError> {
        let mut tables = self.tables.write().await;

        let category_id = movie.category.as_ref().map(|c| tables.insert_category(c).id);

        let id = tables.next_id();
        let created = Movie {
            id,
            title: movie.title,
            sinopse: movie.sinopse,
            rating: movie.rating,
            censure: movie.censure,
            like: movie.like,
            category_id,
            create_date: Utc::now(),
        };
        tables.movies.insert(id, created.clone());

        Ok(tables.movie_record(&created))
    }

    async fn save_movie(&self, movie: &Movie, category: CategoryChange) -> Result<MovieRecord, AppError> {
        let mut tables = self.tables.write().await;

        if !tables.movies.contains_key(&movie.id) {
            return Err(AppError::NotFound("Filme"));
        }

        let mut saved = movie.clone();
        match category {
            CategoryChange::Keep => {}
            CategoryChange::Update(category) => {
                saved.category_id = Some(category.id);
                tables.categories.insert(category.id, category);
            }
            CategoryChange::Create(payload) => {
                saved.category_id = Some(tables.insert_category(&payload).id);
            }
        }
        tables.movies.insert(saved.id, saved.clone());

        Ok(tables.movie_record(&saved))
    }

    async fn list_categories(&self) -> Result<Vec<Category>, AppError> {
        Ok(self.tables.read().await.categories.values().cloned().collect())
    }

    async fn find_category(&self, id: i64) -> Result<Option<Category>, AppError> {
        Ok(self.tables.read().await.categories.get(&id).cloned())
    }

    async fn create_category(&self, category: CategoryPayload) -> Result<Category, AppError> {
        Ok(self.tables.write().await.insert_category(&category))
    }

    async fn save_category(&self, category: &Category) -> Result<Category, AppError> {
        let mut tables = self.tables.write().await;
        match tables.categories.get_mut(&category.id) {
            Some(stored) => {
                stored.title = category.title.clone();
                Ok(stored.clone())
            }
            None => Err(AppError::NotFound("Categoria")),
        }
    }

    async fn delete_category(&self, id: i64) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        let removed = tables.categories.remove(&id).is_some();
        // ON DELETE SET NULL
        for movie in tables.movies.values_mut() {
            if movie.category_id == Some(id) {
                movie.category_id = None;
            }
        }
        Ok(removed)
    }
}

#[async_trait]
impl SchoolRepository for MemoryStore {
    async fn list_students(&self) -> Result<Vec<Student>, AppError> {
        Ok(self.tables.read().await.students.values().cloned().collect())
    }

    async fn find_student(&self, id: i64) -> Result<Option<Student>, AppError> {
        Ok(self.tables.read().await.students.get(&id).cloned())
    }

    async fn create_student(
        &self,
        registration: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<Student, AppError> {
        let mut tables = self.tables.write().await;
        let id = tables.next_id();
        let student = Student {
            id,
            registration: registration.to_string(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
        };
        tables.students.insert(id, student.clone());
        Ok(student)
    }

    async fn save_student(&self, student: &Student) -> Result<Student, AppError> {
        let mut tables = self.tables.write().await;
        match tables.students.get_mut(&student.id) {
            Some(stored) => {
                *stored = student.clone();
                Ok(student.clone())
            }
            None => Err(AppError::NotFound("Aluno")),
        }
    }

    async fn delete_student(&self, id: i64) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        tables.classroom_students.retain(|(_, s)| *s != id);
        Ok(tables.students.remove(&id).is_some())
    }

    async fn list_classrooms(&self) -> Result<Vec<ClassroomView>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.classrooms.values().map(|c| tables.classroom_view(c)).collect())
    }

    async fn find_classroom(&self, id: i64) -> Result<Option<ClassroomView>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.classrooms.get(&id).map(|c| tables.classroom_view(c)))
    }

    async fn create_classroom(&self, title: &str, student_ids: &[i64]) -> Result<ClassroomView, AppError> {
        let mut tables = self.tables.write().await;
        let id = tables.next_id();
        let classroom = Classroom {
            id,
            title: title.to_string(),
        };
        // Valida os alunos antes de inserir a sala: tudo ou nada
        tables.replace_students(id, student_ids)?;
        tables.classrooms.insert(id, classroom.clone());
        Ok(tables.classroom_view(&classroom))
    }

    async fn save_classroom(
        &self,
        classroom: &Classroom,
        student_ids: Option<&[i64]>,
    ) -> Result<ClassroomView, AppError> {
        let mut tables = self.tables.write().await;
        if !tables.classrooms.contains_key(&classroom.id) {
            return Err(AppError::NotFound("Sala de aula"));
        }
        if let Some(student_ids) = student_ids {
            tables.replace_students(classroom.id, student_ids)?;
        }
        tables.classrooms.insert(classroom.id, classroom.clone());
        Ok(tables.classroom_view(classroom))
    }

    async fn delete_classroom(&self, id: i64) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        tables.classroom_students.retain(|(c, _)| *c != id);
        tables.classes.retain(|_, class| class.classroom_id != id);
        Ok(tables.classrooms.remove(&id).is_some())
    }

    async fn list_grades(&self) -> Result<Vec<Grade>, AppError> {
        Ok(self.tables.read().await.grades.values().cloned().collect())
    }

    async fn find_grade(&self, id: i64) -> Result<Option<Grade>, AppError> {
        Ok(self.tables.read().await.grades.get(&id).cloned())
    }

    async fn list_classes(&self, scope: OwnerScope) -> Result<Vec<Class>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .classes
            .values()
            .filter(|c| scope.admits(Some(c.teacher_id)))
            .cloned()
            .collect())
    }

    async fn find_class(&self, id: i64) -> Result<Option<Class>, AppError> {
        Ok(self.tables.read().await.classes.get(&id).cloned())
    }

    async fn create_class(&self, classroom_id: i64, teacher_id: i64) -> Result<Class, AppError> {
        let mut tables = self.tables.write().await;
        let id = tables.next_id();
        let class = Class {
            id,
            classroom_id,
            teacher_id,
            created: Utc::now(),
        };
        tables.classes.insert(id, class.clone());
        Ok(class)
    }

    async fn save_class(&self, class: &Class) -> Result<Class, AppError> {
        let mut tables = self.tables.write().await;
        match tables.classes.get_mut(&class.id) {
            Some(stored) => {
                *stored = class.clone();
                Ok(class.clone())
            }
            None => Err(AppError::NotFound("Aula")),
        }
    }
}
