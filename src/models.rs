// src/models.rs

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

pub const MAX_QUESTION_LENGTH: usize = 200;
pub const MAX_ANSWER_LENGTH: usize = 2000;
pub const MAX_CATEGORY_LENGTH: usize = 50;
pub const MAX_KEYWORD_LENGTH: usize = 30;
pub const MAX_KEYWORDS: usize = 10;

/// 未指定分类时的默认值
pub const DEFAULT_CATEGORY: &str = "其他";

/// 一条知识点，序列化字段名与导出文件保持一致 (camelCase)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub id: String,
    pub question: String,
    pub answer: String,
    pub category: String,
    pub keywords: Vec<String>,
    pub favorite: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entry {
    /// 分类为空时按默认分类处理
    pub fn category_or_default(&self) -> &str {
        if self.category.is_empty() {
            DEFAULT_CATEGORY
        } else {
            &self.category
        }
    }

    /// 刷新 updated_at，保证严格递增
    pub fn touch(&mut self) {
        let now = Utc::now();
        self.updated_at = if now > self.updated_at {
            now
        } else {
            self.updated_at + Duration::microseconds(1)
        };
    }
}

/// 表单提交的原始字段，尚未校验
#[derive(Debug, Clone, Default)]
pub struct EntryDraft {
    pub question: String,
    pub answer: String,
    pub category: Option<String>,
    pub keywords: Vec<String>,
    /// 显式指定收藏状态；None 表示编辑时沿用原值
    pub favorite: Option<bool>,
}

impl EntryDraft {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        EntryDraft {
            question: question.into(),
            answer: answer.into(),
            ..Default::default()
        }
    }

    /// 从已有知识点生成草稿，用于编辑
    pub fn from_entry(entry: &Entry) -> Self {
        EntryDraft {
            question: entry.question.clone(),
            answer: entry.answer.clone(),
            category: Some(entry.category.clone()),
            keywords: entry.keywords.clone(),
            favorite: None,
        }
    }
}

/// 生成 ID：毫秒时间戳 + 9 位 base36 随机后缀
pub fn generate_id() -> String {
    const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut rng = rand::thread_rng();
    let suffix: String = (0..9)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect();
    format!("{}{}", Utc::now().timestamp_millis(), suffix)
}
