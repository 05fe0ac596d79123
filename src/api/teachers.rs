//! Teacher onboarding and language preference endpoints

use crate::api::ExtractUser;
use crate::api::teachers::schemas::{LanguageList, Onboard, SetLanguage};
use crate::core::traits::TeacherService;
use crate::error::AppError;
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use di_axum::Inject;

pub fn router() -> Router {
    Router::new()
        .route("/", post(onboard))
        .route("/me", get(me))
        .route("/me/language", put(set_language))
}

async fn onboard(
    Inject(teacher_service): Inject<dyn TeacherService>,
    ExtractUser(current_user): ExtractUser,
    Json(request): Json<Onboard>,
) -> Result<(StatusCode, Json<schemas::Teacher>), AppError> {
    let teacher = teacher_service
        .onboard(current_user, request.language_id)
        .await?;
    let language = teacher_service.language(current_user).await?;

    Ok((
        StatusCode::CREATED,
        Json(schemas::Teacher::new(teacher, language)),
    ))
}

async fn me(
    Inject(teacher_service): Inject<dyn TeacherService>,
    ExtractUser(current_user): ExtractUser,
) -> Result<(StatusCode, Json<schemas::Teacher>), AppError> {
    let (teacher, language) = teacher_service
        .get_teacher(current_user)
        .await?
        .ok_or_else(|| AppError::NotFound("teacher not onboarded".to_owned()))?;

    Ok((
        StatusCode::OK,
        Json(schemas::Teacher::new(teacher, language)),
    ))
}

async fn set_language(
    Inject(teacher_service): Inject<dyn TeacherService>,
    ExtractUser(current_user): ExtractUser,
    Json(request): Json<SetLanguage>,
) -> Result<(StatusCode, Json<schemas::Language>), AppError> {
    let language = teacher_service
        .set_language(current_user, request.language_id)
        .await?;

    Ok((StatusCode::OK, Json(schemas::Language::from(language))))
}

pub async fn list_languages(
    Inject(teacher_service): Inject<dyn TeacherService>,
) -> Result<(StatusCode, Json<LanguageList>), AppError> {
    let languages = teacher_service.list_languages().await?;

    Ok((
        StatusCode::OK,
        Json(LanguageList {
            languages: languages.into_iter().map(schemas::Language::from).collect(),
        }),
    ))
}

pub mod schemas {
    use crate::infrastructure::entities;
    use chrono::{DateTime, Utc};
    use log::warn;
    use serde::{Deserialize, Serialize};
    use uuid::Uuid;

    #[derive(Deserialize, Debug)]
    pub struct Onboard {
        pub language_id: Uuid,
    }

    #[derive(Deserialize, Debug)]
    pub struct SetLanguage {
        pub language_id: Uuid,
    }

    #[derive(Serialize, Debug)]
    pub struct Language {
        pub id: Uuid,
        pub name: String,
        pub code: String,
        pub levels: Vec<String>,
    }

    impl From<entities::Language> for Language {
        fn from(language: entities::Language) -> Self {
            let levels = serde_json::from_str(&language.levels).unwrap_or_else(|e| {
                warn!("malformed levels for language {}: {e}", language.id);
                Vec::new()
            });

            Language {
                id: language.id,
                name: language.name,
                code: language.code,
                levels,
            }
        }
    }

    #[derive(Serialize, Debug)]
    pub struct LanguageList {
        pub languages: Vec<Language>,
    }

    #[derive(Serialize, Debug)]
    pub struct Teacher {
        pub id: Uuid,
        pub language: Option<Language>,
        pub created_at: DateTime<Utc>,
    }

    impl Teacher {
        pub fn new(teacher: entities::Teacher, language: Option<entities::Language>) -> Self {
            Teacher {
                id: teacher.id,
                language: language.map(Language::from),
                created_at: teacher.created_at,
            }
        }
    }
}
