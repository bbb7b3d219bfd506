// src/storage.rs

use crate::error::{KpError, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::env;
use std::path::{Path, PathBuf};
use tracing::debug;

/// 数据库路径的环境变量覆盖
pub const DB_PATH_ENV: &str = "KPOINT_DB";

/// 键值存储，语义对应浏览器的 localStorage
pub trait Storage {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

/// 获取数据库文件路径：--db 参数 > KPOINT_DB > ~/.config/kpoint/kpoint.db
pub fn get_db_path(override_path: Option<&Path>) -> Result<PathBuf> {
    if let Some(p) = override_path {
        return Ok(p.to_path_buf());
    }
    if let Ok(p) = env::var(DB_PATH_ENV) {
        if !p.trim().is_empty() {
            return Ok(PathBuf::from(p));
        }
    }
    let home_dir = dirs::home_dir().ok_or(KpError::HomeDirNotFound)?;
    Ok(home_dir.join(".config/kpoint/kpoint.db"))
}

/// 基于 SQLite 的键值存储
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// 打开数据库，必要时创建目录和表
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(db_path)?;
        Self::with_connection(conn)
    }

    pub fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
            [],
        )?;
        Ok(SqliteStorage { conn })
    }
}

impl Storage for SqliteStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?", [key], |row| row.get(0))
            .optional()?;
        Ok(value)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        debug!("wrote {} bytes under key {}", value.len(), key);
        Ok(())
    }
}

/// 测试用内存存储，可模拟写入失败（如配额不足）
#[cfg(test)]
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    pub values: std::collections::HashMap<String, String>,
    pub fail_reads: bool,
    pub fail_writes: bool,
}

#[cfg(test)]
impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        if self.fail_reads {
            return Err(std::io::Error::new(std::io::ErrorKind::Other, "storage unavailable").into());
        }
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        if self.fail_writes {
            return Err(std::io::Error::new(std::io::ErrorKind::Other, "quota exceeded").into());
        }
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
