//! DB Repository abstractions

use crate::error::AppError;
use crate::infrastructure::database::DatabaseConnection;
use crate::infrastructure::entities::{Language, Roleplay, Teacher};
use crate::infrastructure::traits::{RoleplayRepository, TeacherRepository};
use async_trait::async_trait;
use di::{Ref, injectable};
use log::error;
use uuid::Uuid;

fn db_err(e: sqlx::Error) -> AppError {
    error!("{e}");
    AppError::Database(e)
}

#[injectable(TeacherRepository)]
pub struct DbTeacherRepository {
    connection: Ref<DatabaseConnection>,
}

#[async_trait]
impl TeacherRepository for DbTeacherRepository {
    async fn get_teacher(&self, teacher_id: Uuid) -> Result<Option<Teacher>, AppError> {
        sqlx::query_as("SELECT * FROM teachers WHERE id = ?")
            .bind(teacher_id)
            .fetch_optional(&**self.connection)
            .await
            .map_err(db_err)
    }

    async fn create_teacher(&self, teacher: Teacher) -> Result<Teacher, AppError> {
        sqlx::query_as(
            "INSERT INTO teachers (id, language_id, created_at) VALUES (?, ?, ?) RETURNING *",
        )
        .bind(teacher.id)
        .bind(teacher.language_id)
        .bind(teacher.created_at)
        .fetch_one(&**self.connection)
        .await
        .map_err(db_err)
    }

    async fn set_teacher_language(
        &self,
        teacher_id: Uuid,
        language_id: Uuid,
    ) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE teachers SET language_id = ? WHERE id = ?")
            .bind(language_id)
            .bind(teacher_id)
            .execute(&**self.connection)
            .await
            .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("teacher {teacher_id}")));
        }
        Ok(())
    }

    async fn list_languages(&self) -> Result<Vec<Language>, AppError> {
        sqlx::query_as("SELECT * FROM languages ORDER BY name ASC")
            .fetch_all(&**self.connection)
            .await
            .map_err(db_err)
    }

    async fn get_language(&self, language_id: Uuid) -> Result<Option<Language>, AppError> {
        sqlx::query_as("SELECT * FROM languages WHERE id = ?")
            .bind(language_id)
            .fetch_optional(&**self.connection)
            .await
            .map_err(db_err)
    }
}

#[injectable(RoleplayRepository)]
pub struct DbRoleplayRepository {
    connection: Ref<DatabaseConnection>,
}

#[async_trait]
impl RoleplayRepository for DbRoleplayRepository {
    async fn list_roleplays(&self, owner_id: Uuid) -> Result<Vec<Roleplay>, AppError> {
        sqlx::query_as(
            "SELECT * FROM roleplays WHERE owner_id = ? ORDER BY datetime(created_at) DESC",
        )
        .bind(owner_id)
        .fetch_all(&**self.connection)
        .await
        .map_err(db_err)
    }

    async fn create_roleplay(&self, roleplay: Roleplay) -> Result<Roleplay, AppError> {
        sqlx::query_as(
            "INSERT INTO roleplays (id, owner_id, name, scenario, image_path, first_prompt, agent_id, code, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?) RETURNING *",
        )
        .bind(roleplay.id)
        .bind(roleplay.owner_id)
        .bind(roleplay.name)
        .bind(roleplay.scenario)
        .bind(roleplay.image_path)
        .bind(roleplay.first_prompt)
        .bind(roleplay.agent_id)
        .bind(roleplay.code)
        .bind(roleplay.created_at)
        .fetch_one(&**self.connection)
        .await
        .map_err(db_err)
    }

    async fn get_roleplay(
        &self,
        owner_id: Uuid,
        roleplay_id: Uuid,
    ) -> Result<Option<Roleplay>, AppError> {
        sqlx::query_as("SELECT * FROM roleplays WHERE id = ? AND owner_id = ?")
            .bind(roleplay_id)
            .bind(owner_id)
            .fetch_optional(&**self.connection)
            .await
            .map_err(db_err)
    }

    async fn get_roleplay_by_code(&self, code: &str) -> Result<Option<Roleplay>, AppError> {
        sqlx::query_as("SELECT * FROM roleplays WHERE code = ?")
            .bind(code)
            .fetch_optional(&**self.connection)
            .await
            .map_err(db_err)
    }

    async fn set_roleplay_agent(&self, roleplay_id: Uuid, agent_id: &str) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE roleplays SET agent_id = ? WHERE id = ?")
            .bind(agent_id)
            .bind(roleplay_id)
            .execute(&**self.connection)
            .await
            .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("roleplay {roleplay_id}")));
        }
        Ok(())
    }
}
