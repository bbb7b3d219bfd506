// src/transfer.rs

use crate::error::{KpError, Result};
use crate::models::Entry;
use crate::validator::clean_collection;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

pub const EXPORT_VERSION: &str = "2.0";

/// 导出文件格式
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument<'a> {
    pub version: &'static str,
    pub export_time: DateTime<Utc>,
    pub total_count: usize,
    pub data: &'a [Entry],
}

pub fn export_document(entries: &[Entry]) -> ExportDocument<'_> {
    ExportDocument {
        version: EXPORT_VERSION,
        export_time: Utc::now(),
        total_count: entries.len(),
        data: entries,
    }
}

/// 生成缩进为 2 的 JSON 文本
pub fn render_export(entries: &[Entry]) -> Result<String> {
    Ok(serde_json::to_string_pretty(&export_document(entries))?)
}

/// 默认导出文件名 knowledge-points-YYYY-MM-DD.json
pub fn default_export_file_name(now: DateTime<Utc>) -> String {
    format!("knowledge-points-{}.json", now.format("%Y-%m-%d"))
}

/// 解析导入文本：接受导出格式或直接的数组，清洗后至少要剩一条
pub fn parse_import(text: &str) -> Result<Vec<Entry>> {
    let value: Value = serde_json::from_str(text)?;
    let records = match &value {
        Value::Array(_) => &value,
        Value::Object(obj) => match obj.get("data") {
            Some(data) if data.is_array() => data,
            _ => return Err(KpError::InvalidFormat),
        },
        _ => return Err(KpError::InvalidFormat),
    };

    let cleaned = clean_collection(records);
    debug!("import yielded {} usable records", cleaned.len());
    if cleaned.is_empty() {
        return Err(KpError::NoUsableData);
    }
    Ok(cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EntryDraft;
    use crate::storage::MemoryStorage;
    use crate::store::KnowledgeStore;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn sample_store() -> KnowledgeStore {
        let mut store = KnowledgeStore::new(Box::new(MemoryStorage::default()));
        let mut draft = EntryDraft::new("What is TCP", "A transport protocol");
        draft.category = Some("Networking".into());
        draft.keywords = vec!["tcp".into(), "transport".into()];
        store.upsert(&draft, None).unwrap();
        let id = store
            .upsert(&EntryDraft::new("What is OSPF", "A link-state IGP"), None)
            .unwrap()
            .value
            .id;
        store.toggle_favorite(&id);
        store
    }

    #[test]
    fn export_wraps_collection_with_metadata() {
        let store = sample_store();
        let text = render_export(store.entries()).unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["version"], "2.0");
        assert_eq!(value["totalCount"], 2);
        assert!(value["exportTime"].is_string());
        assert_eq!(value["data"][0]["question"], "What is OSPF");
        assert_eq!(value["data"][0]["favorite"], true);
        assert!(value["data"][1]["createdAt"].is_string());
        assert!(text.contains("\n  \"version\""));
    }

    #[test]
    fn export_then_import_round_trips_content() {
        let store = sample_store();
        let imported = parse_import(&render_export(store.entries()).unwrap()).unwrap();
        assert_eq!(imported.len(), store.entries().len());
        for (orig, back) in store.entries().iter().zip(&imported) {
            let mut back = back.clone();
            back.updated_at = orig.updated_at;
            assert_eq!(&back, orig);
        }
    }

    #[test]
    fn bare_array_is_accepted() {
        let imported = parse_import(r#"[{"question":"Q","answer":"A"}]"#).unwrap();
        assert_eq!(imported.len(), 1);
    }

    #[test]
    fn other_shapes_are_rejected() {
        assert!(matches!(parse_import("{\"items\": []}"), Err(KpError::InvalidFormat)));
        assert!(matches!(parse_import("{\"data\": {}}"), Err(KpError::InvalidFormat)));
        assert!(matches!(parse_import("\"text\""), Err(KpError::InvalidFormat)));
        assert!(matches!(parse_import("{oops"), Err(KpError::Json(_))));
    }

    #[test]
    fn import_without_usable_records_is_rejected() {
        let text = r#"{"version":"2.0","data":[{"question":"","answer":"x"}]}"#;
        assert!(matches!(parse_import(text), Err(KpError::NoUsableData)));
        assert!(matches!(parse_import("[]"), Err(KpError::NoUsableData)));
    }

    #[test]
    fn export_file_name_uses_date() {
        let now = Utc.with_ymd_and_hms(2024, 3, 9, 12, 0, 0).unwrap();
        assert_eq!(default_export_file_name(now), "knowledge-points-2024-03-09.json");
    }
}
