//! Cached teacher language preference.
//!
//! Lazily filled on first read, and only ever written by
//! `TeacherService::set_language` after the database write succeeds. There is
//! no invalidation on external changes; a session sees its own writes.

use crate::infrastructure::entities::Language;
use di::{inject, injectable};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

pub struct PreferenceCache {
    languages: RwLock<HashMap<Uuid, Language>>,
}

#[injectable]
impl PreferenceCache {
    #[inject]
    pub fn create() -> PreferenceCache {
        PreferenceCache {
            languages: RwLock::new(HashMap::new()),
        }
    }
}

impl PreferenceCache {
    pub async fn get(&self, teacher_id: Uuid) -> Option<Language> {
        self.languages.read().await.get(&teacher_id).cloned()
    }

    pub async fn put(&self, teacher_id: Uuid, language: Language) {
        self.languages.write().await.insert(teacher_id, language);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn language(name: &str) -> Language {
        Language {
            id: Uuid::new_v4(),
            name: name.to_owned(),
            code: "EN".to_owned(),
            levels: "[]".to_owned(),
        }
    }

    #[tokio::test]
    async fn test_cache_starts_empty() {
        let cache = PreferenceCache::create();
        assert!(cache.get(Uuid::new_v4()).await.is_none());
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let cache = PreferenceCache::create();
        let teacher_id = Uuid::new_v4();

        cache.put(teacher_id, language("English")).await;

        let cached = cache.get(teacher_id).await.expect("cached language");
        assert_eq!(cached.name, "English");
    }

    #[tokio::test]
    async fn test_put_replaces_previous_value() {
        let cache = PreferenceCache::create();
        let teacher_id = Uuid::new_v4();

        cache.put(teacher_id, language("English")).await;
        cache.put(teacher_id, language("Korean")).await;

        let cached = cache.get(teacher_id).await.expect("cached language");
        assert_eq!(cached.name, "Korean");
    }
}
