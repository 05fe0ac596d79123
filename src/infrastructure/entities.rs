//! Database entities

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Immutable reference data; seeded by migration, never created by the app.
#[derive(Debug, Clone, FromRow)]
pub struct Language {
    pub id: Uuid,
    pub name: String,
    pub code: String,
    /// Proficiency level names, stored as a JSON array.
    pub levels: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct Teacher {
    /// Equal to the authenticated user's id.
    pub id: Uuid,
    pub language_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct Roleplay {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub scenario: String,
    pub image_path: Option<String>,
    pub first_prompt: Option<String>,
    pub agent_id: Option<String>,
    /// Short human-shareable join code students use to open the roleplay.
    pub code: String,
    pub created_at: DateTime<Utc>,
}
