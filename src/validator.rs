// src/validator.rs

use crate::error::{Field, ValidationErrors};
use crate::models::{
    generate_id, Entry, EntryDraft, DEFAULT_CATEGORY, MAX_ANSWER_LENGTH, MAX_CATEGORY_LENGTH,
    MAX_KEYWORDS, MAX_KEYWORD_LENGTH, MAX_QUESTION_LENGTH,
};
use chrono::{DateTime, TimeZone, Utc};
use serde_json::{Map, Value};
use std::collections::HashSet;
use tracing::debug;

/// 去除首尾空白并截断到 max 个字符
pub fn sanitize_text(text: &str, max: usize) -> String {
    text.trim().chars().take(max).collect()
}

/// 清洗来自存储或导入的原始数据，丢弃无法修复的记录
pub fn clean_collection(raw: &Value) -> Vec<Entry> {
    let Some(items) = raw.as_array() else {
        debug!("raw collection is not an array, treating as empty");
        return Vec::new();
    };

    let now = Utc::now();
    let mut seen = HashSet::new();
    let cleaned: Vec<Entry> = items
        .iter()
        .filter_map(|item| clean_entry(item, now))
        .map(|mut entry| {
            // 同一批数据中重复的 id 重新生成
            if !seen.insert(entry.id.clone()) {
                debug!("duplicate id {}, assigning a fresh one", entry.id);
                entry.id = generate_id();
                seen.insert(entry.id.clone());
            }
            entry
        })
        .collect();

    let dropped = items.len() - cleaned.len();
    if dropped > 0 {
        debug!("dropped {} malformed records out of {}", dropped, items.len());
    }
    cleaned
}

fn clean_entry(item: &Value, now: DateTime<Utc>) -> Option<Entry> {
    let obj = item.as_object()?;
    let question = non_blank_str(obj.get("question"))?;
    let answer = non_blank_str(obj.get("answer"))?;

    Some(Entry {
        id: clean_id(obj.get("id")),
        question: sanitize_text(question, MAX_QUESTION_LENGTH),
        answer: sanitize_text(answer, MAX_ANSWER_LENGTH),
        category: clean_category(obj),
        keywords: clean_keywords(obj.get("keywords")),
        favorite: obj.get("favorite").map_or(false, is_truthy),
        created_at: obj.get("createdAt").and_then(parse_timestamp).unwrap_or(now),
        updated_at: now,
    })
}

fn non_blank_str(value: Option<&Value>) -> Option<&str> {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

fn clean_id(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Number(n)) if n.as_f64() != Some(0.0) => n.to_string(),
        _ => generate_id(),
    }
}

fn clean_category(obj: &Map<String, Value>) -> String {
    let category = obj
        .get("category")
        .and_then(Value::as_str)
        .map(|c| sanitize_text(c, MAX_CATEGORY_LENGTH))
        .unwrap_or_default();
    if category.is_empty() {
        DEFAULT_CATEGORY.to_string()
    } else {
        category
    }
}

fn clean_keywords(value: Option<&Value>) -> Vec<String> {
    let Some(raw) = value.and_then(Value::as_array) else {
        return Vec::new();
    };
    let mut keywords: Vec<String> = Vec::new();
    for kw in raw.iter().take(MAX_KEYWORDS) {
        let Some(s) = non_blank_str(Some(kw)) else {
            continue;
        };
        let kw = sanitize_text(s, MAX_KEYWORD_LENGTH);
        if !keywords.contains(&kw) {
            keywords.push(kw);
        }
    }
    keywords
}

// 与浏览器端 Boolean(x) 的语义一致
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Value::Number(n) => n
            .as_i64()
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
        _ => None,
    }
}

/// 通过校验的表单字段
#[derive(Debug, Clone, PartialEq)]
pub struct ValidDraft {
    pub question: String,
    pub answer: String,
    pub category: String,
    pub keywords: Vec<String>,
    pub favorite: Option<bool>,
}

/// 校验表单草稿，所有字段错误一次性返回
pub fn validate_draft(draft: &EntryDraft) -> Result<ValidDraft, ValidationErrors> {
    let mut errors = ValidationErrors::default();

    let question = draft.question.trim();
    if question.is_empty() {
        errors.push(Field::Question, "问题不能为空");
    } else if question.chars().count() > MAX_QUESTION_LENGTH {
        errors.push(
            Field::Question,
            format!("问题长度不能超过{}个字符", MAX_QUESTION_LENGTH),
        );
    }

    let answer = draft.answer.trim();
    if answer.is_empty() {
        errors.push(Field::Answer, "答案不能为空");
    } else if answer.chars().count() > MAX_ANSWER_LENGTH {
        errors.push(
            Field::Answer,
            format!("答案长度不能超过{}个字符", MAX_ANSWER_LENGTH),
        );
    }

    let mut keywords: Vec<String> = Vec::new();
    for kw in draft.keywords.iter().map(|k| k.trim()).filter(|k| !k.is_empty()) {
        if kw.chars().count() > MAX_KEYWORD_LENGTH {
            errors.push(
                Field::Keywords,
                format!("关键词 \"{}\" 长度不能超过{}个字符", kw, MAX_KEYWORD_LENGTH),
            );
            continue;
        }
        // 重复的关键词直接忽略
        if !keywords.iter().any(|k| k == kw) {
            keywords.push(kw.to_string());
        }
    }
    if keywords.len() > MAX_KEYWORDS {
        errors.push(
            Field::Keywords,
            format!("关键词数量不能超过{}个", MAX_KEYWORDS),
        );
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    let category = draft
        .category
        .as_deref()
        .map(|c| sanitize_text(c, MAX_CATEGORY_LENGTH))
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());

    Ok(ValidDraft {
        question: question.to_string(),
        answer: answer.to_string(),
        category,
        keywords,
        favorite: draft.favorite,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn non_array_input_yields_empty() {
        for raw in [
            json!(null),
            json!(42),
            json!("[]"),
            json!({"data": []}),
            json!(true),
        ] {
            assert!(clean_collection(&raw).is_empty(), "input: {}", raw);
        }
    }

    #[test]
    fn drops_records_without_question_or_answer() {
        let raw = json!([
            {"question": "", "answer": "x"},
            {"question": "q", "answer": "   "},
            {"question": 5, "answer": "a"},
            "not an object",
            null,
            {"question": " Keep me ", "answer": " yes "}
        ]);
        let cleaned = clean_collection(&raw);
        assert_eq!(cleaned.len(), 1);
        assert_eq!(cleaned[0].question, "Keep me");
        assert_eq!(cleaned[0].answer, "yes");
        assert_eq!(cleaned[0].category, DEFAULT_CATEGORY);
        assert!(!cleaned[0].favorite);
        assert!(!cleaned[0].id.is_empty());
    }

    #[test]
    fn truncates_fields_to_limits() {
        let long_kw = "k".repeat(40);
        let mut keywords: Vec<Value> = (0..15).map(|i| json!(format!("kw{}", i))).collect();
        keywords[0] = json!(long_kw);
        let raw = json!([{
            "question": "问".repeat(250),
            "answer": "a".repeat(2500),
            "category": "c".repeat(60),
            "keywords": keywords,
        }]);
        let entry = &clean_collection(&raw)[0];
        assert_eq!(entry.question.chars().count(), MAX_QUESTION_LENGTH);
        assert_eq!(entry.answer.chars().count(), MAX_ANSWER_LENGTH);
        assert_eq!(entry.category.chars().count(), MAX_CATEGORY_LENGTH);
        assert_eq!(entry.keywords.len(), MAX_KEYWORDS);
        assert!(entry.keywords.iter().all(|k| k.chars().count() <= MAX_KEYWORD_LENGTH));
        assert_eq!(entry.keywords[0], "k".repeat(MAX_KEYWORD_LENGTH));
    }

    #[test]
    fn keywords_drop_non_strings_and_duplicates() {
        let raw = json!([{
            "question": "q",
            "answer": "a",
            "keywords": ["tcp", 3, " ", "tcp ", "udp", null]
        }]);
        assert_eq!(clean_collection(&raw)[0].keywords, vec!["tcp", "udp"]);

        let raw = json!([{"question": "q", "answer": "a", "keywords": "tcp,udp"}]);
        assert!(clean_collection(&raw)[0].keywords.is_empty());
    }

    #[test]
    fn preserves_id_and_created_at_but_refreshes_updated_at() {
        let raw = json!([{
            "id": "abc",
            "question": "q",
            "answer": "a",
            "favorite": 1,
            "createdAt": "2020-01-02T03:04:05Z",
            "updatedAt": "2020-01-02T03:04:05Z"
        }, {
            "id": 17,
            "question": "q2",
            "answer": "a2",
            "favorite": "",
            "createdAt": "not a date"
        }]);
        let before = Utc::now();
        let cleaned = clean_collection(&raw);
        assert_eq!(cleaned[0].id, "abc");
        assert!(cleaned[0].favorite);
        assert_eq!(cleaned[0].created_at.to_rfc3339(), "2020-01-02T03:04:05+00:00");
        assert!(cleaned[0].updated_at >= before);

        assert_eq!(cleaned[1].id, "17");
        assert!(!cleaned[1].favorite);
        assert!(cleaned[1].created_at >= before);
    }

    #[test]
    fn repeated_ids_get_fresh_ones() {
        let raw = json!([
            {"id": 1, "question": "q1", "answer": "a"},
            {"id": 1, "question": "q2", "answer": "a"},
            {"id": "1", "question": "q3", "answer": "a"},
            {"id": "x", "question": "q4", "answer": "a"}
        ]);
        let cleaned = clean_collection(&raw);
        assert_eq!(cleaned.len(), 4);
        assert_eq!(cleaned[0].id, "1");
        assert_eq!(cleaned[3].id, "x");
        let ids: HashSet<&str> = cleaned.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids.len(), 4);
    }

    #[test]
    fn validate_draft_reports_each_field() {
        let draft = EntryDraft {
            question: "  ".into(),
            answer: "a".repeat(MAX_ANSWER_LENGTH + 1),
            keywords: vec!["x".repeat(31)],
            ..Default::default()
        };
        let errs = validate_draft(&draft).unwrap_err();
        assert!(errs.has(Field::Question));
        assert!(errs.has(Field::Answer));
        assert!(errs.has(Field::Keywords));
        assert_eq!(errs.0[0].message, "问题不能为空");
    }

    #[test]
    fn validate_draft_normalizes_fields() {
        let draft = EntryDraft {
            question: " What is TCP ".into(),
            answer: " transport ".into(),
            category: Some("   ".into()),
            keywords: vec!["net".into(), " net ".into(), "".into(), "tcp".into()],
            favorite: None,
        };
        let valid = validate_draft(&draft).unwrap();
        assert_eq!(valid.question, "What is TCP");
        assert_eq!(valid.answer, "transport");
        assert_eq!(valid.category, DEFAULT_CATEGORY);
        assert_eq!(valid.keywords, vec!["net", "tcp"]);
    }

    #[test]
    fn validate_draft_rejects_too_many_keywords() {
        let draft = EntryDraft {
            question: "q".into(),
            answer: "a".into(),
            keywords: (0..11).map(|i| format!("k{}", i)).collect(),
            ..Default::default()
        };
        let errs = validate_draft(&draft).unwrap_err();
        assert_eq!(errs.0.len(), 1);
        assert_eq!(errs.0[0].field, Field::Keywords);
    }
}
