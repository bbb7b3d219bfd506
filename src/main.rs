// src/main.rs

mod cli;
mod commands;
mod error;
mod models;
mod query;
mod selector;
mod session;
mod storage;
mod store;
mod transfer;
mod validator;

use clap::Parser;
use cli::{Cli, Commands};
use error::Result;
use tracing_subscriber::EnvFilter;

fn main() {
    // 诊断日志输出到 stderr，默认只显示错误；用 RUST_LOG 调整
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("error")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let db = cli.db.as_deref();
    if let Commands::Init = cli.command {
        return commands::handle_init(db);
    }

    let mut session = commands::open_session(db)?;
    match cli.command {
        Commands::Init => Ok(()),
        Commands::Add {
            question,
            answer,
            category,
            keywords,
            fav,
        } => commands::handle_add(&mut session, question, answer, category, keywords, fav),
        Commands::Edit {
            id,
            question,
            answer,
            category,
            keywords,
        } => commands::handle_edit(&mut session, id, question, answer, category, keywords),
        Commands::List {
            filter,
            show_answers,
        } => commands::handle_list(&mut session, &filter, show_answers),
        Commands::Tabs => commands::handle_tabs(&session),
        Commands::Fav { id } => commands::handle_fav(&mut session, id),
        Commands::Del { ids, yes } => commands::handle_del(&mut session, ids, yes),
        Commands::Test { filter } => commands::handle_test(&mut session, &filter),
        Commands::Export { path } => commands::handle_export(&session, path),
        Commands::Import { path, yes } => commands::handle_import(&mut session, &path, yes),
        Commands::Stats { filter } => commands::handle_stats(&mut session, &filter),
    }
}
