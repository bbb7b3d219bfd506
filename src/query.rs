// src/query.rs

use crate::models::{Entry, DEFAULT_CATEGORY};
use std::fmt;

pub const ALL_LABEL: &str = "全部";
pub const FAVORITES_LABEL: &str = "收藏";

/// 分类标签的选择
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Favorites,
    Specific(String),
}

impl CategoryFilter {
    /// 将标签文本解析为分类选择
    pub fn from_label(label: &str) -> Self {
        match label.trim() {
            ALL_LABEL => CategoryFilter::All,
            FAVORITES_LABEL => CategoryFilter::Favorites,
            other => CategoryFilter::Specific(other.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            CategoryFilter::All => ALL_LABEL,
            CategoryFilter::Favorites => FAVORITES_LABEL,
            CategoryFilter::Specific(name) => name.as_str(),
        }
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// 筛选参数
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Filter {
    pub category: CategoryFilter,
    pub only_favorites: bool,
    pub search: String,
}

/// 按 搜索 -> 分类 -> 只看收藏 的顺序依次筛选，保持原有顺序
pub fn filter<'a>(entries: &'a [Entry], params: &Filter) -> Vec<&'a Entry> {
    let query = params.search.trim().to_lowercase();

    entries
        .iter()
        .filter(|e| query.is_empty() || matches_search(e, &query))
        .filter(|e| match &params.category {
            CategoryFilter::All => true,
            CategoryFilter::Favorites => e.favorite,
            CategoryFilter::Specific(name) => e.category_or_default() == name.as_str(),
        })
        .filter(|e| !params.only_favorites || e.favorite)
        .collect()
}

fn matches_search(entry: &Entry, query: &str) -> bool {
    entry.question.to_lowercase().contains(query)
        || entry.answer.to_lowercase().contains(query)
        || entry
            .keywords
            .iter()
            .any(|k| k.to_lowercase().contains(query))
        || entry.category.to_lowercase().contains(query)
}

/// 分类标签：全部、收藏在前，其余按首次出现的顺序
pub fn categories(entries: &[Entry]) -> Vec<CategoryFilter> {
    let mut tabs = vec![CategoryFilter::All, CategoryFilter::Favorites];
    for entry in entries {
        if entry.category.is_empty() {
            continue;
        }
        // 与 全部/收藏 同名的分类并入对应标签
        if !tabs.iter().any(|t| t.label() == entry.category) {
            tabs.push(CategoryFilter::Specific(entry.category.clone()));
        }
    }
    tabs
}

/// 分类输入提示，不含默认分类
pub fn suggested_categories(entries: &[Entry]) -> Vec<&str> {
    let mut names: Vec<&str> = Vec::new();
    for entry in entries {
        let name = entry.category.as_str();
        if !name.is_empty() && name != DEFAULT_CATEGORY && !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stats {
    pub total: usize,
    pub visible: usize,
}

pub fn stats(entries: &[Entry], params: &Filter) -> Stats {
    Stats {
        total: entries.len(),
        visible: filter(entries, params).len(),
    }
}
