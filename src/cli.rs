// src/cli.rs

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "kpoint - A knowledge flashcard manager for the command line",
    long_about = "kpoint keeps question/answer knowledge points tagged with a category and keywords. Browse, filter and search them, mark favorites, and quiz yourself with random questions. Everything is stored locally and can be moved around with JSON export/import."
)]
pub struct Cli {
    /// Path to the database file. Overrides the KPOINT_DB environment variable.
    #[arg(long, global = true, value_name = "PATH")]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// 列表、测试和统计共用的筛选参数
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    #[arg(
        short,
        long,
        help = "Category tab to show: 全部, 收藏 or a category name"
    )]
    pub category: Option<String>,

    #[arg(short, long, help = "Only include favorite entries")]
    pub favorites: bool,

    #[arg(
        short,
        long,
        help = "Case-insensitive search in question, answer, keywords and category"
    )]
    pub search: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initializes the database and reports the state of the stored collection.
    Init,

    /// Adds a new knowledge point.
    /// If no answer is provided via -a, it opens the default editor.
    Add {
        #[arg(short, long, help = "The question (max 200 characters)")]
        question: String,
        #[arg(short, long, help = "The answer (max 2000 characters)")]
        answer: Option<String>,
        #[arg(short, long, help = "Category, defaults to 其他")]
        category: Option<String>,
        #[arg(short, long, help = "Comma-separated keywords (max 10, 30 characters each)")]
        keywords: Option<String>,
        #[arg(long, help = "Mark the new entry as a favorite")]
        fav: bool,
    },

    /// Edits an existing knowledge point.
    /// Without any field flags, it opens the answer in the default editor.
    Edit {
        #[arg(help = "The ID of the entry to edit")]
        id: String,
        #[arg(short, long)]
        question: Option<String>,
        #[arg(short, long)]
        answer: Option<String>,
        #[arg(short, long)]
        category: Option<String>,
        #[arg(short, long, help = "Comma-separated keywords, replaces the existing list")]
        keywords: Option<String>,
    },

    /// Lists knowledge points matching the current filters.
    List {
        #[command(flatten)]
        filter: FilterArgs,

        #[arg(short = 'a', long, help = "Print answers as well as questions")]
        show_answers: bool,
    },

    /// Shows the category tabs with their entry counts.
    Tabs,

    /// Toggles the favorite flag of an entry.
    Fav {
        #[arg(help = "The ID of the entry")]
        id: String,
    },

    /// Deletes one or more entries after confirmation.
    Del {
        #[arg(required = true, value_name = "ID")]
        ids: Vec<String>,

        #[arg(short, long, help = "Skip the confirmation prompt")]
        yes: bool,
    },

    /// Starts an interactive random quiz over the filtered entries.
    Test {
        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Exports all entries to a JSON file.
    Export {
        /// Output file. Defaults to knowledge-points-YYYY-MM-DD.json
        path: Option<PathBuf>,
    },

    /// Imports entries from a JSON file, replacing the current collection.
    Import {
        path: PathBuf,

        #[arg(short, long, help = "Skip the confirmation prompt")]
        yes: bool,
    },

    /// Shows total and visible entry counts.
    Stats {
        #[command(flatten)]
        filter: FilterArgs,
    },
}
