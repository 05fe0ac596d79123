//! Static vocabulary listing

use axum::Json;
use axum::http::StatusCode;
use serde::Serialize;

#[derive(Serialize, Debug, Clone, Copy)]
pub struct VocabularyEntry {
    pub word: &'static str,
    pub meaning: &'static str,
    pub difficulty: &'static str,
    pub source: &'static str,
}

#[derive(Serialize, Debug)]
pub struct VocabularyList {
    pub entries: &'static [VocabularyEntry],
}

const VOCABULARY: &[VocabularyEntry] = &[
    VocabularyEntry { word: "안녕하세요", meaning: "Hello", difficulty: "TOPIK 1", source: "https://example.com/word1" },
    VocabularyEntry { word: "감사합니다", meaning: "Thank you", difficulty: "TOPIK 1", source: "https://example.com/word2" },
    VocabularyEntry { word: "안녕히 가세요", meaning: "Goodbye", difficulty: "TOPIK 1", source: "https://example.com/word3" },
    VocabularyEntry { word: "공부하다", meaning: "To study", difficulty: "TOPIK 2", source: "https://example.com/word4" },
    VocabularyEntry { word: "일하다", meaning: "To work", difficulty: "TOPIK 2", source: "https://example.com/word5" },
    VocabularyEntry { word: "친구", meaning: "Friend", difficulty: "TOPIK 2", source: "https://example.com/word6" },
    VocabularyEntry { word: "문화", meaning: "Culture", difficulty: "TOPIK 3", source: "https://example.com/word7" },
    VocabularyEntry { word: "역사", meaning: "History", difficulty: "TOPIK 3", source: "https://example.com/word8" },
    VocabularyEntry { word: "경제", meaning: "Economy", difficulty: "TOPIK 4", source: "https://example.com/word9" },
    VocabularyEntry { word: "정치", meaning: "Politics", difficulty: "TOPIK 4", source: "https://example.com/word10" },
    VocabularyEntry { word: "철학", meaning: "Philosophy", difficulty: "TOPIK 5", source: "https://example.com/word11" },
    VocabularyEntry { word: "심리학", meaning: "Psychology", difficulty: "TOPIK 5", source: "https://example.com/word12" },
    VocabularyEntry { word: "지속가능한 발전", meaning: "Sustainable development", difficulty: "TOPIK 6", source: "https://example.com/word13" },
    VocabularyEntry { word: "인공지능", meaning: "Artificial intelligence", difficulty: "TOPIK 6", source: "https://example.com/word14" },
];

pub async fn list_vocabulary() -> (StatusCode, Json<VocabularyList>) {
    (
        StatusCode::OK,
        Json(VocabularyList {
            entries: VOCABULARY,
        }),
    )
}
