use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{types::Json, FromRow, PgPool};
use uuid::Uuid;

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::{Answer, Form, FormStats, Question, Response, User};
use crate::database::repository::Repository;
use crate::types::Role;

const USER_COLUMNS: &str = "id, username, password_hash, name, email, role, created_at";
const FORM_COLUMNS: &str =
    "id, owner_id, title, description, questions, assigned_patient_ids, created_at, updated_at, deleted_at";
const RESPONSE_COLUMNS: &str = "id, form_id, patient_id, form_title, answers, submitted_at";

#[derive(FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    password_hash: String,
    name: String,
    email: String,
    role: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = DatabaseError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role: Role = row
            .role
            .parse()
            .map_err(|e| DatabaseError::CorruptRow(format!("user {}: {}", row.id, e)))?;
        Ok(User {
            id: row.id,
            username: row.username,
            password_hash: row.password_hash,
            name: row.name,
            email: row.email,
            role,
            created_at: row.created_at,
        })
    }
}

#[derive(FromRow)]
struct FormRow {
    id: Uuid,
    owner_id: Uuid,
    title: String,
    description: String,
    questions: Json<Vec<Question>>,
    assigned_patient_ids: Vec<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl From<FormRow> for Form {
    fn from(row: FormRow) -> Self {
        Form {
            id: row.id,
            owner_id: row.owner_id,
            title: row.title,
            description: row.description,
            questions: row.questions.0,
            assigned_patient_ids: row.assigned_patient_ids,
            created_at: row.created_at,
            updated_at: row.updated_at,
            deleted_at: row.deleted_at,
        }
    }
}

#[derive(FromRow)]
struct FormStatsRow {
    #[sqlx(flatten)]
    form: FormRow,
    response_count: i64,
}

#[derive(FromRow)]
struct ResponseRow {
    id: Uuid,
    form_id: Uuid,
    patient_id: Uuid,
    form_title: String,
    answers: Json<Vec<Answer>>,
    submitted_at: DateTime<Utc>,
}

impl From<ResponseRow> for Response {
    fn from(row: ResponseRow) -> Self {
        Response {
            id: row.id,
            form_id: row.form_id,
            patient_id: row.patient_id,
            form_title: row.form_title,
            answers: row.answers.0,
            submitted_at: row.submitted_at,
        }
    }
}

fn users_from_rows(rows: Vec<UserRow>) -> Result<Vec<User>, DatabaseError> {
    rows.into_iter().map(User::try_from).collect()
}

/// PostgreSQL-backed store. Uniqueness is enforced by table constraints.
pub struct PgRepository {
    pool: PgPool,
}

impl PgRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository for PgRepository {
    async fn insert_user(&self, user: User) -> Result<User, DatabaseError> {
        sqlx::query(
            "INSERT INTO users (id, username, password_hash, name, email, role, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.role.as_str())
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| DatabaseError::from_insert(e, "Username already exists"))?;

        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, DatabaseError> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let row: Option<UserRow> = sqlx::query_as(&sql).bind(id).fetch_optional(&self.pool).await?;
        row.map(User::try_from).transpose()
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, DatabaseError> {
        let sql = format!("SELECT {} FROM users WHERE username = $1", USER_COLUMNS);
        let row: Option<UserRow> = sqlx::query_as(&sql).bind(username).fetch_optional(&self.pool).await?;
        row.map(User::try_from).transpose()
    }

    async fn find_users(&self, ids: &[Uuid]) -> Result<Vec<User>, DatabaseError> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        let sql = format!("SELECT {} FROM users WHERE id = ANY($1)", USER_COLUMNS);
        let rows: Vec<UserRow> = sqlx::query_as(&sql).bind(ids.to_vec()).fetch_all(&self.pool).await?;
        users_from_rows(rows)
    }

    async fn list_users_by_role(&self, role: Role) -> Result<Vec<User>, DatabaseError> {
        // Legacy rows may still carry the misspelled patient role.
        let accepted: Vec<String> = match role {
            Role::Patient => vec!["patient".to_string(), "patiente".to_string()],
            Role::Psychologist => vec!["psychologist".to_string()],
        };
        let sql = format!(
            "SELECT {} FROM users WHERE lower(role) = ANY($1) ORDER BY name, username",
            USER_COLUMNS
        );
        let rows: Vec<UserRow> = sqlx::query_as(&sql).bind(accepted).fetch_all(&self.pool).await?;
        users_from_rows(rows)
    }

    async fn insert_form(&self, form: Form) -> Result<Form, DatabaseError> {
        sqlx::query(
            "INSERT INTO forms (id, owner_id, title, description, questions, assigned_patient_ids, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(form.id)
        .bind(form.owner_id)
        .bind(&form.title)
        .bind(&form.description)
        .bind(Json(&form.questions))
        .bind(&form.assigned_patient_ids)
        .bind(form.created_at)
        .bind(form.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| DatabaseError::from_insert(e, "Form already exists"))?;

        Ok(form)
    }

    async fn find_form(&self, id: Uuid) -> Result<Option<Form>, DatabaseError> {
        let sql = format!("SELECT {} FROM forms WHERE id = $1", FORM_COLUMNS);
        let row: Option<FormRow> = sqlx::query_as(&sql).bind(id).fetch_optional(&self.pool).await?;
        Ok(row.map(Form::from))
    }

    async fn list_forms_by_owner(&self, owner_id: Uuid) -> Result<Vec<FormStats>, DatabaseError> {
        let sql = format!(
            "SELECT {}, (SELECT COUNT(*) FROM responses r WHERE r.form_id = forms.id) AS response_count \
             FROM forms WHERE owner_id = $1 AND deleted_at IS NULL ORDER BY created_at DESC",
            FORM_COLUMNS
        );
        let rows: Vec<FormStatsRow> = sqlx::query_as(&sql).bind(owner_id).fetch_all(&self.pool).await?;
        Ok(rows
            .into_iter()
            .map(|row| FormStats {
                form: row.form.into(),
                response_count: row.response_count,
            })
            .collect())
    }

    async fn list_forms_visible_to(&self, patient_id: Uuid) -> Result<Vec<Form>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM forms \
             WHERE deleted_at IS NULL \
             AND (cardinality(assigned_patient_ids) = 0 OR $1 = ANY(assigned_patient_ids)) \
             ORDER BY created_at DESC",
            FORM_COLUMNS
        );
        let rows: Vec<FormRow> = sqlx::query_as(&sql).bind(patient_id).fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(Form::from).collect())
    }

    async fn update_form(&self, form: Form) -> Result<Form, DatabaseError> {
        let result = sqlx::query(
            "UPDATE forms SET title = $2, description = $3, questions = $4, \
             assigned_patient_ids = $5, updated_at = $6 WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(form.id)
        .bind(&form.title)
        .bind(&form.description)
        .bind(Json(&form.questions))
        .bind(&form.assigned_patient_ids)
        .bind(form.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("Form {}", form.id)));
        }
        Ok(form)
    }

    async fn tombstone_form(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), DatabaseError> {
        let result = sqlx::query("UPDATE forms SET deleted_at = $2, updated_at = $2 WHERE id = $1")
            .bind(id)
            .bind(at)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("Form {}", id)));
        }
        Ok(())
    }

    async fn insert_response(&self, response: Response) -> Result<Response, DatabaseError> {
        sqlx::query(
            "INSERT INTO responses (id, form_id, patient_id, form_title, answers, submitted_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(response.id)
        .bind(response.form_id)
        .bind(response.patient_id)
        .bind(&response.form_title)
        .bind(Json(&response.answers))
        .bind(response.submitted_at)
        .execute(&self.pool)
        .await
        .map_err(|e| DatabaseError::from_insert(e, "A response to this form was already submitted"))?;

        Ok(response)
    }

    async fn list_responses_for_form(&self, form_id: Uuid) -> Result<Vec<Response>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM responses WHERE form_id = $1 ORDER BY submitted_at DESC",
            RESPONSE_COLUMNS
        );
        let rows: Vec<ResponseRow> = sqlx::query_as(&sql).bind(form_id).fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(Response::from).collect())
    }

    async fn list_responses_for_patient(&self, patient_id: Uuid) -> Result<Vec<Response>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM responses WHERE patient_id = $1 ORDER BY submitted_at DESC",
            RESPONSE_COLUMNS
        );
        let rows: Vec<ResponseRow> = sqlx::query_as(&sql).bind(patient_id).fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(Response::from).collect())
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        DatabaseManager::health_check(&self.pool).await
    }
}
