// src/commands.rs

use crate::cli::FilterArgs;
use crate::error::{Field, KpError, Result};
use crate::models::{Entry, EntryDraft};
use crate::query::{self, CategoryFilter, Filter};
use crate::session::{Command, Event, Session};
use crate::storage::{self, SqliteStorage};
use crate::store::{KnowledgeStore, LoadStatus};
use crate::transfer;
use chrono::Utc;
use std::env;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::Command as Process;

/// 打开数据库并加载知识点
fn open_store(db: Option<&Path>) -> Result<(KnowledgeStore, LoadStatus, PathBuf)> {
    let db_path = storage::get_db_path(db)?;
    let storage = SqliteStorage::open(&db_path)?;
    let mut store = KnowledgeStore::new(Box::new(storage));
    let status = store.load();
    if let LoadStatus::Reset(reason) = &status {
        eprintln!("Warning: Failed to load stored data, starting from an empty collection ({})", reason);
    }
    Ok((store, status, db_path))
}

pub fn open_session(db: Option<&Path>) -> Result<Session> {
    let (store, _, _) = open_store(db)?;
    Ok(Session::new(store))
}

/// 存储写入失败时提醒用户
fn warn_if_unsaved(event: &Event) {
    if !event.persisted() {
        eprintln!("Warning: Failed to save. Check available storage; the last change may not survive a restart.");
    }
}

/// 解析逗号分隔的关键词
fn parse_keywords(s: &str) -> Vec<String> {
    s.split(',')
        .map(|k| k.trim())
        .filter(|k| !k.is_empty())
        .map(String::from)
        .collect()
}

/// 在默认编辑器中编辑文本
fn edit_in_editor(initial: &str) -> Result<String> {
    let mut temp_file = tempfile::NamedTempFile::new()?;
    temp_file.write_all(initial.as_bytes())?;
    temp_file.flush()?;

    let editor = env::var("EDITOR").unwrap_or_else(|_| "vi".to_string());
    let status = Process::new(&editor).arg(temp_file.path()).status()?;
    if !status.success() {
        return Err(KpError::EditorError);
    }

    let mut buf = String::new();
    temp_file.reopen()?.read_to_string(&mut buf)?;
    Ok(buf)
}

/// (y/N) 确认提示
fn confirm(message: &str) -> Result<bool> {
    print!("{} (y/N): ", message);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().eq_ignore_ascii_case("y"))
}

/// 读取一行输入，EOF 时返回 None
fn prompt_line(message: &str) -> Result<Option<String>> {
    print!("{}", message);
    io::stdout().flush()?;

    let mut input = String::new();
    if io::stdin().read_line(&mut input)? == 0 {
        return Ok(None);
    }
    Ok(Some(input.trim().to_string()))
}

/// 把命令行筛选参数转换为命令
fn apply_filter(session: &mut Session, args: &FilterArgs) -> Result<()> {
    if let Some(c) = &args.category {
        session.apply(Command::SetCategory(CategoryFilter::from_label(c)))?;
    }
    if args.favorites {
        session.apply(Command::SetOnlyFavorites(true))?;
    }
    match args.search.as_deref() {
        Some(s) if s.trim().is_empty() => {
            session.apply(Command::ClearSearch)?;
        }
        Some(s) => {
            session.apply(Command::SetSearch(s.to_string()))?;
        }
        None => {}
    }
    Ok(())
}

fn describe_filter(view: &Filter) -> String {
    let mut parts = vec![format!("Category: {}", view.category)];
    if view.only_favorites {
        parts.push("Favorites only".to_string());
    }
    if !view.search.trim().is_empty() {
        parts.push(format!("Search: \"{}\"", view.search.trim()));
    }
    parts.join(" | ")
}

fn print_card(entry: &Entry, show_answer: bool) {
    let star = if entry.favorite { "⭐" } else { "☆" };
    let keywords = if entry.keywords.is_empty() {
        String::new()
    } else {
        format!(" | Keywords: {}", entry.keywords.join(", "))
    };
    println!(
        "[{}] {} | Category: {} | Created: {}{}",
        entry.id,
        star,
        entry.category_or_default(),
        entry.created_at.format("%Y-%m-%d"),
        keywords
    );
    println!("Q: {}", entry.question);
    if show_answer {
        println!("A: {}", entry.answer.trim_end());
    }
    println!("{}", "─".repeat(40));
}

/// 处理 'init' 命令
pub fn handle_init(db: Option<&Path>) -> Result<()> {
    let (store, status, db_path) = open_store(db)?;
    println!("✓ Database initialized successfully at: {:?}", db_path);
    match status {
        LoadStatus::Fresh => println!("✓ No knowledge points yet. Add one with `kpoint add`."),
        LoadStatus::Loaded(n) => println!("✓ Loaded {} knowledge points.", n),
        LoadStatus::Reset(_) => println!("Stored data was unreadable; starting from an empty collection."),
    }
    let tabs = query::categories(store.entries());
    println!("Categories: {}", tabs.iter().map(|t| t.label()).collect::<Vec<_>>().join(", "));
    Ok(())
}

/// 处理 'add' 命令
pub fn handle_add(
    session: &mut Session,
    question: String,
    answer: Option<String>,
    category: Option<String>,
    keywords: Option<String>,
    favorite: bool,
) -> Result<()> {
    let from_editor = answer.is_none();
    let answer = match answer {
        Some(a) => a,
        None => edit_in_editor("")?,
    };

    // 新分类时给出已有分类作为参考
    if let Some(c) = category.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
        let existing = query::suggested_categories(session.store().entries());
        if !existing.is_empty() && !existing.contains(&c) {
            println!("New category \"{}\" (existing: {})", c, existing.join(", "));
        }
    }

    let mut draft = EntryDraft::new(question, answer);
    draft.category = category;
    draft.keywords = keywords.as_deref().map(parse_keywords).unwrap_or_default();
    draft.favorite = favorite.then_some(true);

    let event = match session.apply(Command::CreateEntry(draft)) {
        Err(KpError::Validation(errs)) if from_editor && errs.has(Field::Answer) => {
            eprintln!("The answer written in the editor was rejected, nothing was saved.");
            return Err(KpError::Validation(errs));
        }
        other => other?,
    };
    if let Event::Saved { entry, .. } = &event {
        println!("✓ Entry added. ID: {}", entry.id);
    }
    warn_if_unsaved(&event);
    Ok(())
}

/// 处理 'edit' 命令
pub fn handle_edit(
    session: &mut Session,
    id: String,
    question: Option<String>,
    answer: Option<String>,
    category: Option<String>,
    keywords: Option<String>,
) -> Result<()> {
    let existing = session
        .store()
        .get(&id)
        .ok_or_else(|| KpError::EntryNotFound(id.clone()))?;
    let mut draft = EntryDraft::from_entry(existing);

    if question.is_none() && answer.is_none() && category.is_none() && keywords.is_none() {
        let new_answer = edit_in_editor(&existing.answer)?;
        if new_answer.trim() == existing.answer.trim() {
            return Err(KpError::NoChangesMade);
        }
        draft.answer = new_answer;
    } else {
        if let Some(q) = question {
            draft.question = q;
        }
        if let Some(a) = answer {
            draft.answer = a;
        }
        if category.is_some() {
            draft.category = category;
        }
        if let Some(k) = keywords {
            draft.keywords = parse_keywords(&k);
        }
    }

    let event = session.apply(Command::UpdateEntry { id: id.clone(), draft })?;
    println!("✓ Entry #{} updated.", id);
    warn_if_unsaved(&event);
    Ok(())
}

/// 处理 'list' 命令
pub fn handle_list(session: &mut Session, filter: &FilterArgs, show_answers: bool) -> Result<()> {
    apply_filter(session, filter)?;
    let visible = session.visible();

    println!("{}", describe_filter(session.view()));
    println!("{}", "─".repeat(40));
    if visible.is_empty() {
        println!("No entries found. Add one with `kpoint add`.");
    }
    for entry in &visible {
        print_card(entry, show_answers);
    }

    let stats = session.stats();
    println!("Total: {} | Visible: {}", stats.total, stats.visible);
    Ok(())
}

/// 处理 'tabs' 命令
pub fn handle_tabs(session: &Session) -> Result<()> {
    let entries = session.store().entries();
    for tab in query::categories(entries) {
        let params = Filter {
            category: tab.clone(),
            ..Default::default()
        };
        println!("{} ({})", tab, query::filter(entries, &params).len());
    }
    Ok(())
}

/// 处理 'fav' 命令
pub fn handle_fav(session: &mut Session, id: String) -> Result<()> {
    let event = session.apply(Command::ToggleFavorite(id.clone()))?;
    match &event {
        Event::FavoriteToggled { favorite: Some(true), .. } => println!("✓ Added to favorites."),
        Event::FavoriteToggled { favorite: Some(false), .. } => println!("✓ Removed from favorites."),
        _ => return Err(KpError::EntryNotFound(id)),
    }
    warn_if_unsaved(&event);
    Ok(())
}

/// 处理 'del' 命令
pub fn handle_del(session: &mut Session, ids: Vec<String>, yes: bool) -> Result<()> {
    let mut targets = Vec::new();
    for id in ids {
        match session.store().get(&id) {
            Some(entry) => {
                if !targets.contains(&id) {
                    println!("- [{}] {}", entry.id, entry.question);
                    targets.push(id);
                }
            }
            None => eprintln!("Entry {} not found, skipped.", id),
        }
    }

    if targets.is_empty() {
        println!("No matching entries to delete.");
        return Ok(());
    }

    let message = format!("Permanently delete the {} entries above?", targets.len());
    if !yes && !confirm(&message)? {
        println!("Cancelled.");
        return Ok(());
    }

    let mut deleted = 0;
    let mut all_saved = true;
    for id in targets {
        let event = session.apply(Command::DeleteEntry(id))?;
        all_saved &= event.persisted();
        if let Event::Deleted { removed: true, .. } = event {
            deleted += 1;
        }
    }
    println!("✓ Successfully deleted {} entry(s).", deleted);
    if !all_saved {
        warn_if_unsaved(&Event::Deleted {
            removed: true,
            persisted: false,
        });
    }
    Ok(())
}

/// 处理 'test' 命令：随机抽题，回车显示答案
pub fn handle_test(session: &mut Session, filter: &FilterArgs) -> Result<()> {
    apply_filter(session, filter)?;

    loop {
        let Some(entry) = session.random_pick() else {
            println!("No entries available for a quiz with the current filters.");
            return Ok(());
        };

        println!("\n📝 {}", entry.question);
        if prompt_line("Press Enter to show the answer...")?.is_none() {
            break;
        }
        println!("\n✅ {}", entry.answer.trim_end());

        match prompt_line("\n[n]ext question / [f]avorites only on/off / [q]uit: ")? {
            Some(choice) if choice.eq_ignore_ascii_case("q") => break,
            Some(choice) if choice.eq_ignore_ascii_case("f") => {
                session.apply(Command::ToggleOnlyFavorites)?;
                println!("{}", describe_filter(session.view()));
            }
            Some(_) => continue,
            None => break,
        }
    }
    Ok(())
}

/// 处理 'export' 命令
pub fn handle_export(session: &Session, path: Option<PathBuf>) -> Result<()> {
    let path = path.unwrap_or_else(|| PathBuf::from(transfer::default_export_file_name(Utc::now())));
    let text = transfer::render_export(session.store().entries())?;
    std::fs::write(&path, text)?;
    println!(
        "✓ Exported {} entries to {}",
        session.store().entries().len(),
        path.display()
    );
    Ok(())
}

/// 处理 'import' 命令：读取、清洗、确认之后整体替换
pub fn handle_import(session: &mut Session, path: &Path, yes: bool) -> Result<()> {
    let text = std::fs::read_to_string(path)?;
    let entries = transfer::parse_import(&text)?;

    let message = format!(
        "About to import {} entries. This replaces all current data. Continue?",
        entries.len()
    );
    if !yes && !confirm(&message)? {
        println!("Cancelled. No data was imported.");
        return Ok(());
    }

    let event = session.apply(Command::ReplaceAll(entries))?;
    if let Event::Replaced { count, .. } = &event {
        println!("✓ Imported {} entries.", count);
    }
    warn_if_unsaved(&event);
    Ok(())
}

/// 处理 'stats' 命令
pub fn handle_stats(session: &mut Session, filter: &FilterArgs) -> Result<()> {
    apply_filter(session, filter)?;
    let stats = session.stats();
    println!("{}", describe_filter(session.view()));
    println!("Total: {}", stats.total);
    println!("Visible: {}", stats.visible);
    Ok(())
}
