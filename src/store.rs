// src/store.rs

use crate::error::{KpError, Result};
use crate::models::{generate_id, Entry, EntryDraft};
use crate::storage::Storage;
use crate::validator::{clean_collection, validate_draft};
use chrono::Utc;
use tracing::{debug, info, warn};

/// 持久化数据使用的键
pub const STORAGE_KEY: &str = "knowledge_app_custom_v2";

/// 加载结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatus {
    /// 尚无持久化数据
    Fresh,
    Loaded(usize),
    /// 数据无法读取或解析，已重置为空
    Reset(String),
}

/// 一次修改的结果，以及是否已成功写入存储
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome<T> {
    pub value: T,
    pub persisted: bool,
}

/// 知识点集合，每次修改后同步写入存储
pub struct KnowledgeStore {
    entries: Vec<Entry>,
    storage: Box<dyn Storage>,
}

impl KnowledgeStore {
    pub fn new(storage: Box<dyn Storage>) -> Self {
        KnowledgeStore {
            entries: Vec::new(),
            storage,
        }
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn get(&self, id: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// 从存储读取数据；任何失败都只重置为空，不向上抛错
    pub fn load(&mut self) -> LoadStatus {
        let raw = match self.storage.get(STORAGE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                self.entries.clear();
                return LoadStatus::Fresh;
            }
            Err(e) => return self.reset(e),
        };

        match serde_json::from_str::<serde_json::Value>(&raw) {
            Ok(value) => {
                self.entries = clean_collection(&value);
                info!("loaded {} entries", self.entries.len());
                LoadStatus::Loaded(self.entries.len())
            }
            Err(e) => self.reset(KpError::Json(e)),
        }
    }

    fn reset(&mut self, err: KpError) -> LoadStatus {
        warn!("failed to load entries, resetting to empty: {}", err);
        self.entries.clear();
        LoadStatus::Reset(err.to_string())
    }

    /// 写入存储；失败时保留内存中的数据并返回 false
    pub fn save(&mut self) -> bool {
        let result = serde_json::to_string(&self.entries)
            .map_err(KpError::from)
            .and_then(|blob| self.storage.set(STORAGE_KEY, &blob));
        match result {
            Ok(()) => true,
            Err(e) => {
                warn!("failed to save {} entries: {}", self.entries.len(), e);
                false
            }
        }
    }

    fn committed<T>(&mut self, value: T) -> Outcome<T> {
        let persisted = self.save();
        Outcome { value, persisted }
    }

    /// 新建或更新知识点。校验失败时不做任何修改
    pub fn upsert(&mut self, draft: &EntryDraft, editing_id: Option<&str>) -> Result<Outcome<Entry>> {
        let valid = validate_draft(draft)?;

        let index = editing_id.and_then(|id| self.entries.iter().position(|e| e.id == id));
        let entry = match index {
            Some(i) => {
                let existing = &mut self.entries[i];
                existing.question = valid.question;
                existing.answer = valid.answer;
                existing.category = valid.category;
                existing.keywords = valid.keywords;
                if let Some(fav) = valid.favorite {
                    existing.favorite = fav;
                }
                existing.touch();
                debug!("updated entry {}", existing.id);
                existing.clone()
            }
            None => {
                let now = Utc::now();
                let entry = Entry {
                    id: generate_id(),
                    question: valid.question,
                    answer: valid.answer,
                    category: valid.category,
                    keywords: valid.keywords,
                    favorite: valid.favorite.unwrap_or(false),
                    created_at: now,
                    updated_at: now,
                };
                debug!("created entry {}", entry.id);
                self.entries.insert(0, entry.clone());
                entry
            }
        };
        Ok(self.committed(entry))
    }

    /// 删除知识点；id 不存在时什么也不做
    pub fn delete(&mut self, id: &str) -> Outcome<bool> {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        if self.entries.len() == before {
            return Outcome {
                value: false,
                persisted: true,
            };
        }
        self.committed(true)
    }

    /// 切换收藏状态，返回新的状态
    pub fn toggle_favorite(&mut self, id: &str) -> Outcome<Option<bool>> {
        let Some(entry) = self.entries.iter_mut().find(|e| e.id == id) else {
            return Outcome {
                value: None,
                persisted: true,
            };
        };
        entry.favorite = !entry.favorite;
        entry.touch();
        let favorite = entry.favorite;
        self.committed(Some(favorite))
    }

    /// 整体替换，用于导入。调用方负责校验并取得用户确认
    pub fn replace_all(&mut self, entries: Vec<Entry>) -> Outcome<usize> {
        self.entries = entries;
        info!("replaced collection with {} entries", self.entries.len());
        let count = self.entries.len();
        self.committed(count)
    }
}
