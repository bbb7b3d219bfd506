// src/error.rs

use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum KpError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database Error: {0}")]
    Sql(#[from] rusqlite::Error),

    #[error("JSON Error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Home directory not found")]
    HomeDirNotFound,

    #[error("Editor exited with a non-zero status")]
    EditorError,

    #[error("Entry {0} not found")]
    EntryNotFound(String),

    #[error("No changes detected in entry")]
    NoChangesMade,

    #[error("Validation failed:\n{0}")]
    Validation(ValidationErrors),

    #[error("无效的数据格式")]
    InvalidFormat,

    #[error("没有可用的数据")]
    NoUsableData,
}

pub type Result<T> = std::result::Result<T, KpError>;

/// 表单字段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Question,
    Answer,
    Keywords,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::Question => "question",
            Field::Answer => "answer",
            Field::Keywords => "keywords",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct FieldError {
    pub field: Field,
    pub message: String,
}

/// 按字段收集的校验错误
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(pub Vec<FieldError>);

impl ValidationErrors {
    pub fn push(&mut self, field: Field, message: impl Into<String>) {
        self.0.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn has(&self, field: Field) -> bool {
        self.0.iter().any(|e| e.field == field)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "  - {}", err)?;
        }
        Ok(())
    }
}

impl From<ValidationErrors> for KpError {
    fn from(errs: ValidationErrors) -> Self {
        KpError::Validation(errs)
    }
}
