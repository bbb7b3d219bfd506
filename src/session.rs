// src/session.rs

use crate::error::Result;
use crate::models::{Entry, EntryDraft};
use crate::query::{self, CategoryFilter, Filter, Stats};
use crate::selector;
use crate::store::KnowledgeStore;
use tracing::debug;

/// 界面事件对应的命令，按顺序同步执行
#[derive(Debug, Clone)]
pub enum Command {
    CreateEntry(EntryDraft),
    UpdateEntry { id: String, draft: EntryDraft },
    DeleteEntry(String),
    ToggleFavorite(String),
    /// 导入：调用方已完成校验和确认
    ReplaceAll(Vec<Entry>),
    /// 切换分类标签，同时按是否为“收藏”设置只看收藏
    SetCategory(CategoryFilter),
    SetOnlyFavorites(bool),
    ToggleOnlyFavorites,
    SetSearch(String),
    ClearSearch,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Saved {
        entry: Entry,
        created: bool,
        persisted: bool,
    },
    Deleted {
        removed: bool,
        persisted: bool,
    },
    FavoriteToggled {
        favorite: Option<bool>,
        persisted: bool,
    },
    Replaced {
        count: usize,
        persisted: bool,
    },
    ViewChanged,
}

impl Event {
    /// 修改是否已写入存储；纯视图变化视为已写入
    pub fn persisted(&self) -> bool {
        match self {
            Event::Saved { persisted, .. }
            | Event::Deleted { persisted, .. }
            | Event::FavoriteToggled { persisted, .. }
            | Event::Replaced { persisted, .. } => *persisted,
            Event::ViewChanged => true,
        }
    }
}

/// 应用上下文：知识点集合 + 当前筛选条件
pub struct Session {
    store: KnowledgeStore,
    view: Filter,
}

impl Session {
    pub fn new(store: KnowledgeStore) -> Self {
        Session {
            store,
            view: Filter::default(),
        }
    }

    pub fn store(&self) -> &KnowledgeStore {
        &self.store
    }

    pub fn view(&self) -> &Filter {
        &self.view
    }

    pub fn apply(&mut self, command: Command) -> Result<Event> {
        debug!("apply {:?}", command);
        let event = match command {
            Command::CreateEntry(draft) => {
                let out = self.store.upsert(&draft, None)?;
                Event::Saved {
                    entry: out.value,
                    created: true,
                    persisted: out.persisted,
                }
            }
            Command::UpdateEntry { id, draft } => {
                let existed = self.store.get(&id).is_some();
                let out = self.store.upsert(&draft, Some(&id))?;
                Event::Saved {
                    entry: out.value,
                    created: !existed,
                    persisted: out.persisted,
                }
            }
            Command::DeleteEntry(id) => {
                let out = self.store.delete(&id);
                Event::Deleted {
                    removed: out.value,
                    persisted: out.persisted,
                }
            }
            Command::ToggleFavorite(id) => {
                let out = self.store.toggle_favorite(&id);
                Event::FavoriteToggled {
                    favorite: out.value,
                    persisted: out.persisted,
                }
            }
            Command::ReplaceAll(entries) => {
                let out = self.store.replace_all(entries);
                Event::Replaced {
                    count: out.value,
                    persisted: out.persisted,
                }
            }
            Command::SetCategory(category) => {
                self.view.only_favorites = category == CategoryFilter::Favorites;
                self.view.category = category;
                Event::ViewChanged
            }
            Command::SetOnlyFavorites(flag) => {
                self.view.only_favorites = flag;
                Event::ViewChanged
            }
            Command::ToggleOnlyFavorites => {
                self.view.only_favorites = !self.view.only_favorites;
                Event::ViewChanged
            }
            Command::SetSearch(text) => {
                self.view.search = text;
                Event::ViewChanged
            }
            Command::ClearSearch => {
                self.view.search.clear();
                Event::ViewChanged
            }
        };
        Ok(event)
    }

    /// 当前筛选条件下可见的知识点
    pub fn visible(&self) -> Vec<&Entry> {
        query::filter(self.store.entries(), &self.view)
    }

    /// 从当前可见的知识点中随机抽一题
    pub fn random_pick(&self) -> Option<&Entry> {
        selector::pick_random(&self.visible())
    }

    pub fn stats(&self) -> Stats {
        query::stats(self.store.entries(), &self.view)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::KpError;
    use crate::storage::MemoryStorage;
    use crate::transfer::parse_import;
    use pretty_assertions::assert_eq;

    fn session() -> Session {
        Session::new(KnowledgeStore::new(Box::new(MemoryStorage::default())))
    }

    fn create(s: &mut Session, q: &str, category: &str) -> Entry {
        let mut draft = EntryDraft::new(q, "answer");
        draft.category = Some(category.into());
        match s.apply(Command::CreateEntry(draft)).unwrap() {
            Event::Saved { entry, created, .. } => {
                assert!(created);
                entry
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn favorites_tab_sets_flag_and_other_tabs_clear_it() {
        let mut s = session();
        s.apply(Command::SetCategory(CategoryFilter::Favorites)).unwrap();
        assert!(s.view().only_favorites);
        s.apply(Command::SetCategory(CategoryFilter::Specific("Rust".into())))
            .unwrap();
        assert!(!s.view().only_favorites);
        s.apply(Command::ToggleOnlyFavorites).unwrap();
        assert!(s.view().only_favorites);
    }

    #[test]
    fn visible_follows_view_and_mutations() {
        let mut s = session();
        let tcp = create(&mut s, "What is TCP", "Networking");
        let ospf = create(&mut s, "What is OSPF", "Networking");
        create(&mut s, "Borrowing", "Rust");

        s.apply(Command::ToggleFavorite(ospf.id.clone())).unwrap();
        s.apply(Command::SetCategory(CategoryFilter::Specific("Networking".into())))
            .unwrap();
        s.apply(Command::SetOnlyFavorites(true)).unwrap();
        let visible: Vec<String> = s.visible().iter().map(|e| e.id.clone()).collect();
        assert_eq!(visible, vec![ospf.id.clone()]);
        assert_eq!(s.random_pick().map(|e| e.id.clone()), Some(ospf.id.clone()));
        assert_eq!(s.stats(), Stats { total: 3, visible: 1 });

        s.apply(Command::SetOnlyFavorites(false)).unwrap();
        s.apply(Command::SetSearch("tcp".into())).unwrap();
        assert_eq!(s.visible()[0].id, tcp.id);
        s.apply(Command::ClearSearch).unwrap();
        assert_eq!(s.visible().len(), 2);

        let event = s.apply(Command::DeleteEntry(tcp.id.clone())).unwrap();
        assert_eq!(
            event,
            Event::Deleted {
                removed: true,
                persisted: true
            }
        );
        assert_eq!(s.visible().len(), 1);
    }

    #[test]
    fn empty_view_has_no_random_pick() {
        let mut s = session();
        create(&mut s, "Q", "Rust");
        s.apply(Command::SetCategory(CategoryFilter::Favorites)).unwrap();
        assert!(s.random_pick().is_none());
    }

    #[test]
    fn update_of_existing_entry_is_not_a_creation() {
        let mut s = session();
        let e = create(&mut s, "Q", "Rust");
        let event = s
            .apply(Command::UpdateEntry {
                id: e.id.clone(),
                draft: EntryDraft::new("Q2", "A2"),
            })
            .unwrap();
        match event {
            Event::Saved { entry, created, .. } => {
                assert!(!created);
                assert_eq!(entry.id, e.id);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn failed_import_leaves_store_unchanged() {
        let mut s = session();
        create(&mut s, "Keep", "Rust");
        let before = s.store().entries().to_vec();

        let text = r#"{"version":"2.0","data":[{"question":"","answer":"x"}]}"#;
        match parse_import(text) {
            Ok(entries) => {
                s.apply(Command::ReplaceAll(entries)).unwrap();
            }
            Err(e) => assert!(matches!(e, KpError::NoUsableData)),
        }
        assert_eq!(s.store().entries(), before.as_slice());
    }

    #[test]
    fn validation_error_surfaces_from_apply() {
        let mut s = session();
        let err = s
            .apply(Command::CreateEntry(EntryDraft::new("", "")))
            .unwrap_err();
        assert!(matches!(err, KpError::Validation(_)));
        assert!(s.store().entries().is_empty());
    }
}
